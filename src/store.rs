//! Vector store trait: keyed upsert plus nearest-neighbor search.

use async_trait::async_trait;

use crate::document::{Chunk, Metadata};
use crate::error::Result;

/// One row returned by a nearest-neighbor query.
///
/// `distance` follows the store's metric: smaller means more similar.
#[derive(Debug, Clone)]
pub struct StoredRow {
    /// Identifier of the stored chunk.
    pub chunk_id: String,
    /// The stored chunk text.
    pub text: String,
    /// The stored metadata, deserialized.
    pub metadata: Metadata,
    /// Distance between the query vector and the stored vector.
    pub distance: f64,
}

/// A storage backend for embedded chunks.
///
/// Rows are keyed by chunk ID with overwrite-on-conflict semantics, so
/// re-ingesting the same chunk converges instead of duplicating. Each
/// [`upsert`](VectorStore::upsert) call is one all-or-nothing transaction:
/// a failure mid-batch must not leave partial rows visible.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upsert a batch of chunks with their embedding vectors.
    ///
    /// `chunks` and `embeddings` correspond 1:1 by position; a length
    /// mismatch is an integrity error. On key conflict the stored text,
    /// vector, and metadata are overwritten.
    async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()>;

    /// Return the `k` stored rows nearest to `embedding`, ascending by
    /// distance. Fewer than `k` stored rows returns all of them; an empty
    /// store returns an empty vector, not an error.
    async fn nearest(&self, embedding: &[f32], k: usize) -> Result<Vec<StoredRow>>;

    /// Return the number of stored rows.
    async fn count(&self) -> Result<usize>;
}
