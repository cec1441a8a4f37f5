//! First-stage retrieval: embed the query, ask storage for the k nearest.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::document::{Query, RetrievedChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::store::VectorStore;

/// A retriever that returns scored candidate chunks for a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` candidates ordered by ascending distance
    /// (nearest first). `k == 0` returns an empty vector; finding nothing
    /// is not an error.
    async fn search(&self, query: &Query, k: usize) -> Result<Vec<RetrievedChunk>>;
}

/// A [`Retriever`] backed by an embedding provider and a vector store.
///
/// `search` makes exactly one embedding call and one nearest-neighbor query.
/// Embedding or storage failures propagate to the caller without retries.
pub struct VectorRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl VectorRetriever {
    /// Create a retriever from its collaborators.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn search(&self, query: &Query, k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(&query.text).await?;
        let rows = self.store.nearest(&query_vector, k).await?;

        debug!(k, result_count = rows.len(), "vector search");

        Ok(rows
            .into_iter()
            .map(|row| RetrievedChunk {
                chunk_id: row.chunk_id,
                text: row.text,
                score: row.distance,
                metadata: row.metadata,
            })
            .collect())
    }
}
