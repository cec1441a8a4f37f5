//! Second-stage reranking of retrieval candidates.
//!
//! A [`Reranker`] rescores an initial candidate set with a more precise
//! signal and returns the top-k by new score. Unlike raw retrieval
//! distances (smaller is better), rerank scores are relevance scores:
//! output is ordered by **descending** score.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::document::{Query, RetrievedChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::inmemory::cosine_similarity;
use crate::scoring::PairScorer;

/// A second-stage scorer that reorders retrieval candidates.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Rescore `candidates` against `query` and return the top `k` by
    /// descending score.
    ///
    /// Empty candidate input returns an empty vector without invoking any
    /// scoring capability. Asking for more than are available returns all
    /// candidates sorted. Inputs are not mutated; the output holds new
    /// scored copies.
    async fn rerank(
        &self,
        query: &Query,
        candidates: &[RetrievedChunk],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>>;
}

/// Sort descending by score and keep the top `k`.
fn top_k_descending(mut scored: Vec<RetrievedChunk>, k: usize) -> Vec<RetrievedChunk> {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}

/// Reranks by cosine similarity between the freshly embedded query and each
/// candidate's cached embedding vector.
///
/// Every candidate must carry its previously computed vector under the
/// `embedding` metadata key; a candidate without one is a fatal
/// [`RagError::Data`].
pub struct EmbeddingReranker {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingReranker {
    /// Create a reranker from an embedding provider.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl Reranker for EmbeddingReranker {
    async fn rerank(
        &self,
        query: &Query,
        candidates: &[RetrievedChunk],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(&query.text).await?;

        let mut scored = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let cached = candidate.metadata.get("embedding").ok_or_else(|| {
                RagError::Data(format!(
                    "candidate '{}' has no cached embedding vector",
                    candidate.chunk_id
                ))
            })?;
            let candidate_vector: Vec<f32> =
                serde_json::from_value(cached.clone()).map_err(|e| {
                    RagError::Data(format!(
                        "candidate '{}' has a malformed cached embedding: {e}",
                        candidate.chunk_id
                    ))
                })?;

            let score = f64::from(cosine_similarity(&query_vector, &candidate_vector));
            scored.push(RetrievedChunk { score, ..candidate.clone() });
        }

        debug!(candidate_count = candidates.len(), k, "cosine rerank");
        Ok(top_k_descending(scored, k))
    }
}

/// Reranks with a pairwise cross-encoder scorer.
///
/// Builds one (query, candidate) pair per candidate and obtains all scores
/// in a single batched call; pair order matches candidate order 1:1.
pub struct CrossEncoderReranker {
    scorer: Arc<dyn PairScorer>,
}

impl CrossEncoderReranker {
    /// Create a reranker from a pairwise scorer.
    pub fn new(scorer: Arc<dyn PairScorer>) -> Self {
        Self { scorer }
    }
}

#[async_trait]
impl Reranker for CrossEncoderReranker {
    async fn rerank(
        &self,
        query: &Query,
        candidates: &[RetrievedChunk],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let pairs: Vec<(&str, &str)> =
            candidates.iter().map(|c| (query.text.as_str(), c.text.as_str())).collect();
        let scores = self.scorer.score_pairs(&pairs).await?;

        if scores.len() != candidates.len() {
            return Err(RagError::Integrity(format!(
                "scorer returned {} scores for {} candidates",
                scores.len(),
                candidates.len()
            )));
        }

        let scored = candidates
            .iter()
            .zip(scores)
            .map(|(candidate, score)| RetrievedChunk {
                score: f64::from(score),
                ..candidate.clone()
            })
            .collect();

        debug!(candidate_count = candidates.len(), k, "cross-encoder rerank");
        Ok(top_k_descending(scored, k))
    }
}
