//! Pairwise relevance scoring trait (cross-encoder capability).

use async_trait::async_trait;

use crate::error::Result;

/// A capability that scores (query, document) text pairs for relevance.
///
/// Implementations wrap cross-encoder models or similar pairwise scorers.
/// Contract: one score per input pair, in input order, higher meaning more
/// relevant. Callers treat a length mismatch as an integrity error.
#[async_trait]
pub trait PairScorer: Send + Sync {
    /// Score a batch of (query, document) text pairs.
    async fn score_pairs(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>>;
}
