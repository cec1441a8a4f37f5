//! Explicit configuration values passed into pipeline constructors.
//!
//! Each config is a plain value with a validating builder. Construction
//! fails with [`RagError::Config`] before any work begins, never mid-run.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration for chunking and ingestion batching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkingConfig {
    /// Window size in words per chunk.
    pub max_tokens: usize,
    /// Words shared between consecutive chunks. Must be less than `max_tokens`.
    pub overlap: usize,
    /// Chunks per embedding call and per storage transaction.
    pub batch_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_tokens: 150, overlap: 20, batch_size: 32 }
    }
}

impl ChunkingConfig {
    /// Create a new builder for constructing a [`ChunkingConfig`].
    pub fn builder() -> ChunkingConfigBuilder {
        ChunkingConfigBuilder::default()
    }
}

/// Builder for a validated [`ChunkingConfig`].
#[derive(Debug, Clone, Default)]
pub struct ChunkingConfigBuilder {
    config: ChunkingConfig,
}

impl ChunkingConfigBuilder {
    /// Set the window size in words.
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set the overlap between consecutive windows in words.
    pub fn overlap(mut self, overlap: usize) -> Self {
        self.config.overlap = overlap;
        self
    }

    /// Set the number of chunks per persist batch.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Build the [`ChunkingConfig`], validating parameter consistency.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `max_tokens == 0`
    /// - `overlap >= max_tokens` (the window could never advance)
    /// - `batch_size == 0`
    pub fn build(self) -> Result<ChunkingConfig> {
        if self.config.max_tokens == 0 {
            return Err(RagError::Config("max_tokens must be greater than zero".to_string()));
        }
        if self.config.overlap >= self.config.max_tokens {
            return Err(RagError::Config(format!(
                "overlap ({}) must be less than max_tokens ({})",
                self.config.overlap, self.config.max_tokens
            )));
        }
        if self.config.batch_size == 0 {
            return Err(RagError::Config("batch_size must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

/// Policy for queries whose identifier has no entry in the qrels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MissingQrelsPolicy {
    /// Evaluate against an empty relevant set; metrics degrade to 0 and the
    /// query still counts toward the mean.
    #[default]
    ScoreAsZero,
    /// Exclude the query from evaluation and from the mean's denominator.
    Skip,
}

/// Configuration for an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalConfig {
    /// Final number of results scored per query.
    pub top_k: usize,
    /// Candidate pool requested from the retriever when a reranker is
    /// configured. Must be at least `top_k`.
    pub retrieval_k: usize,
    /// How to treat queries absent from the qrels.
    pub missing_qrels: MissingQrelsPolicy,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self { top_k: 5, retrieval_k: 25, missing_qrels: MissingQrelsPolicy::default() }
    }
}

impl EvalConfig {
    /// Create a new builder for constructing an [`EvalConfig`].
    pub fn builder() -> EvalConfigBuilder {
        EvalConfigBuilder::default()
    }
}

/// Builder for a validated [`EvalConfig`].
#[derive(Debug, Clone, Default)]
pub struct EvalConfigBuilder {
    config: EvalConfig,
}

impl EvalConfigBuilder {
    /// Set the final number of results scored per query.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.top_k = top_k;
        self
    }

    /// Set the first-stage candidate pool size used before reranking.
    pub fn retrieval_k(mut self, retrieval_k: usize) -> Self {
        self.config.retrieval_k = retrieval_k;
        self
    }

    /// Set the policy for queries absent from the qrels.
    pub fn missing_qrels(mut self, policy: MissingQrelsPolicy) -> Self {
        self.config.missing_qrels = policy;
        self
    }

    /// Build the [`EvalConfig`], validating parameter consistency.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `top_k == 0` or
    /// `retrieval_k < top_k`.
    pub fn build(self) -> Result<EvalConfig> {
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.config.retrieval_k < self.config.top_k {
            return Err(RagError::Config(format!(
                "retrieval_k ({}) must be at least top_k ({})",
                self.config.retrieval_k, self.config.top_k
            )));
        }
        Ok(self.config)
    }
}
