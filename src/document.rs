//! Data types for records, chunks, queries, retrieved candidates, and qrels.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form key-value metadata carried alongside records, chunks, and queries.
pub type Metadata = HashMap<String, Value>;

/// A source document as loaded from a corpus file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawRecord {
    /// Unique, stable identifier for the document.
    pub id: String,
    /// Document title. May be empty.
    pub title: String,
    /// Document body text.
    pub body: String,
    /// Key-value metadata associated with the document.
    #[serde(default)]
    pub metadata: Metadata,
}

/// One contiguous text window of a [`RawRecord`].
///
/// Chunk IDs are deterministic: `{record_id}_{chunk_index}`. Re-ingesting the
/// same record produces the same chunk IDs, so upserts converge instead of
/// appending duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, `{record_id}_{chunk_index}`.
    pub chunk_id: String,
    /// Identifier of the owning [`RawRecord`].
    pub record_id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Metadata carrying at least `original_id` and `chunk_index`.
    pub metadata: Metadata,
    /// Creation timestamp, stamped when the chunk is produced.
    pub created_at: DateTime<Utc>,
}

/// A search or evaluation request.
///
/// Queries used for evaluation must carry a `query_id` entry in their
/// metadata so they can be matched against qrels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    /// The query text.
    pub text: String,
    /// Key-value metadata; `query_id` when used for evaluation.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Query {
    /// Create a query with no metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), metadata: Metadata::new() }
    }

    /// Return the `query_id` metadata entry, if present.
    pub fn query_id(&self) -> Option<&str> {
        self.metadata.get("query_id").and_then(Value::as_str)
    }
}

/// A scored candidate returned by a retriever or reranker.
///
/// The score direction depends on the stage that produced it: raw retrieval
/// scores are vector distances (lower is more similar), while reranked scores
/// are relevance scores (higher is more relevant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Identifier of the retrieved chunk.
    pub chunk_id: String,
    /// The chunk text.
    pub text: String,
    /// Distance (retriever) or relevance (reranker) score.
    pub score: f64,
    /// Stored metadata; carries the owning record's `original_id`.
    pub metadata: Metadata,
}

impl RetrievedChunk {
    /// Return the owning document's original identifier from metadata.
    pub fn original_id(&self) -> Option<&str> {
        self.metadata.get("original_id").and_then(Value::as_str)
    }
}

/// Ground-truth relevance judgments.
///
/// Maps a query identifier to the set of *document* identifiers judged
/// relevant for it. Judgments are keyed by document, not chunk: retrieved
/// chunks are mapped back to their owning document before scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Qrels {
    judgments: HashMap<String, HashSet<String>>,
}

impl Qrels {
    /// Create an empty qrels set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `record_id` is relevant for `query_id`.
    pub fn insert(&mut self, query_id: impl Into<String>, record_id: impl Into<String>) {
        self.judgments.entry(query_id.into()).or_default().insert(record_id.into());
    }

    /// Return the relevant document set for a query, if any judgments exist.
    pub fn relevant_for(&self, query_id: &str) -> Option<&HashSet<String>> {
        self.judgments.get(query_id)
    }

    /// Number of queries with at least one judgment.
    pub fn len(&self) -> usize {
        self.judgments.len()
    }

    /// Whether no judgments are loaded.
    pub fn is_empty(&self) -> bool {
        self.judgments.is_empty()
    }
}

/// Per-query metric values, keyed by metric name. Values are in `[0, 1]`.
pub type MetricResult = HashMap<String, f64>;
