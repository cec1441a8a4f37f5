//! In-memory vector store using cosine distance.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency store
//! backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is suitable
//! for development, testing, and small corpora.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::Chunk;
use crate::error::{RagError, Result};
use crate::store::{StoredRow, VectorStore};

/// An in-memory [`VectorStore`] keyed by chunk ID.
///
/// Search uses cosine distance (`1 - cosine similarity`), ascending, so
/// smaller distances mean more similar vectors. All operations are
/// async-safe via `tokio::sync::RwLock`; a whole `upsert` batch lands under
/// one write lock, so readers never observe a partial batch.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    rows: RwLock<HashMap<String, (Chunk, Vec<f32>)>>,
}

impl InMemoryVectorStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(RagError::Integrity(format!(
                "upsert batch has {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut rows = self.rows.write().await;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            rows.insert(chunk.chunk_id.clone(), (chunk.clone(), embedding.clone()));
        }
        Ok(())
    }

    async fn nearest(&self, embedding: &[f32], k: usize) -> Result<Vec<StoredRow>> {
        let rows = self.rows.read().await;

        let mut scored: Vec<StoredRow> = rows
            .values()
            .map(|(chunk, stored)| StoredRow {
                chunk_id: chunk.chunk_id.clone(),
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                distance: f64::from(1.0 - cosine_similarity(stored, embedding)),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.rows.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::document::Metadata;

    fn chunk(id: &str) -> Chunk {
        Chunk {
            chunk_id: id.to_string(),
            record_id: id.split('_').next().unwrap_or(id).to_string(),
            text: format!("text of {id}"),
            metadata: Metadata::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_by_chunk_id() {
        let store = InMemoryVectorStore::new();
        store.upsert(&[chunk("d1_0")], &[vec![1.0, 0.0]]).await.unwrap();
        store.upsert(&[chunk("d1_0")], &[vec![0.0, 1.0]]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_rejects_length_mismatch() {
        let store = InMemoryVectorStore::new();
        let err = store.upsert(&[chunk("d1_0")], &[]).await.unwrap_err();
        assert!(matches!(err, RagError::Integrity(_)));
    }

    #[tokio::test]
    async fn nearest_orders_ascending_by_distance() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(
                &[chunk("d1_0"), chunk("d2_0"), chunk("d3_0")],
                &[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
            )
            .await
            .unwrap();

        let rows = store.nearest(&[1.0, 0.0], 3).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].chunk_id, "d1_0");
        for pair in rows.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[tokio::test]
    async fn nearest_on_empty_store_returns_empty() {
        let store = InMemoryVectorStore::new();
        let rows = store.nearest(&[1.0, 0.0], 5).await.unwrap();
        assert!(rows.is_empty());
    }
}
