//! Error types for the `ragbench` crate.

use thiserror::Error;

/// Errors that can occur in ingestion, retrieval, reranking, or evaluation.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration validation error. Raised before any work begins.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An internal consistency violation, such as an embedding batch whose
    /// length does not match the chunk batch it was computed for.
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// An error from the embedding capability.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error from the vector storage backend.
    #[error("Vector store error ({backend}): {message}")]
    Store {
        /// The storage backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error from the pairwise scoring capability.
    #[error("Scoring error ({scorer}): {message}")]
    Scoring {
        /// The scorer that produced the error.
        scorer: String,
        /// A description of the failure.
        message: String,
    },

    /// Bad input data: a malformed line in a record file, or a candidate
    /// missing the cached vector a reranker requires.
    #[error("Data error: {0}")]
    Data(String),

    /// An error in pipeline or evaluator orchestration.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// A convenience result type for ragbench operations.
pub type Result<T> = std::result::Result<T, RagError>;
