//! Chunk ingestion, two-stage retrieval, and qrels-driven evaluation for
//! retrieval-augmented pipelines.
//!
//! The crate covers three coupled workflows:
//!
//! - **Ingestion**: [`IngestionPipeline`] loads raw records, cleans and
//!   chunks them into overlapping word windows, embeds each batch once, and
//!   idempotently upserts the results into a [`VectorStore`], mirroring
//!   every batch to an append-only inspection log.
//! - **Retrieval**: [`VectorRetriever`] embeds a query and returns the k
//!   nearest chunks by vector distance; an optional [`Reranker`]
//!   ([`EmbeddingReranker`] or [`CrossEncoderReranker`]) rescores the
//!   candidates with a more precise signal.
//! - **Evaluation**: [`QrelsEvaluator`] drives retrieve → rerank →
//!   [`MetricSuite`] over a labeled query set and reports mean
//!   [`RecallAtK`] and [`Mrr`].
//!
//! Embedding models, cross-encoders, and storage engines are external
//! capabilities behind the [`EmbeddingProvider`], [`PairScorer`], and
//! [`VectorStore`] traits. [`InMemoryVectorStore`] ships by default; a
//! PostgreSQL/pgvector backend is available behind the `pgvector` feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragbench::{
//!     ChunkingConfig, EvalConfig, IngestionPipeline, InMemoryVectorStore,
//!     MetricSuite, Mrr, QrelsEvaluator, RecallAtK, VectorRetriever,
//! };
//!
//! let store = Arc::new(InMemoryVectorStore::new());
//! let pipeline =
//!     IngestionPipeline::new(ChunkingConfig::default(), embedder.clone(), store.clone())?;
//! pipeline.run(raw_dir, output_dir).await?;
//!
//! let retriever = Arc::new(VectorRetriever::new(embedder, store));
//! let suite = MetricSuite::new(vec![Box::new(RecallAtK::new(5)), Box::new(Mrr)]);
//! let evaluator =
//!     QrelsEvaluator::from_dir(data_dir, retriever, None, suite, EvalConfig::default())?;
//! let report = evaluator.evaluate().await?;
//! ```

pub mod chunking;
pub mod cleaning;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod ingest;
pub mod inmemory;
pub mod io;
pub mod metrics;
#[cfg(feature = "pgvector")]
pub mod pgvector;
pub mod rerank;
pub mod retriever;
pub mod scoring;
pub mod store;

pub use chunking::WordChunker;
pub use cleaning::clean_text;
pub use config::{ChunkingConfig, EvalConfig, MissingQrelsPolicy};
pub use document::{Chunk, Metadata, MetricResult, Qrels, Query, RawRecord, RetrievedChunk};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use eval::{EvalReport, QrelsEvaluator};
pub use ingest::IngestionPipeline;
pub use inmemory::InMemoryVectorStore;
pub use io::{InspectionLog, read_jsonl};
pub use metrics::{Metric, MetricSuite, Mrr, RecallAtK};
#[cfg(feature = "pgvector")]
pub use pgvector::PgVectorStore;
pub use rerank::{CrossEncoderReranker, EmbeddingReranker, Reranker};
pub use retriever::{Retriever, VectorRetriever};
pub use scoring::PairScorer;
pub use store::{StoredRow, VectorStore};
