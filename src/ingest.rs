//! Ingestion pipeline: load → clean → chunk → embed → persist.
//!
//! [`IngestionPipeline`] turns a directory of raw corpus records into
//! embedded chunks in a [`VectorStore`], batched for throughput, with every
//! persisted chunk mirrored to an append-only inspection log.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::chunking::WordChunker;
use crate::cleaning::clean_text;
use crate::config::ChunkingConfig;
use crate::document::{Chunk, Metadata, RawRecord};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::io::{InspectionLog, read_jsonl};
use crate::store::VectorStore;

/// File name of the raw corpus inside a source directory.
pub const CORPUS_FILE: &str = "corpus.jsonl";

/// File name of the inspection log inside an output directory.
pub const INSPECTION_LOG_FILE: &str = "chunks.jsonl";

/// One line of a corpus file.
#[derive(Debug, Deserialize)]
struct CorpusLine {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "text", default)]
    body: String,
    #[serde(default)]
    metadata: Metadata,
}

/// Drives the offline ingestion workflow.
///
/// Each batch of `batch_size` chunks is embedded in one call and persisted
/// in one storage transaction, then appended to the inspection log.
/// Re-running ingestion on the same source converges: chunk IDs are
/// deterministic and the store overwrites on conflict.
pub struct IngestionPipeline {
    config: ChunkingConfig,
    chunker: WordChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl IngestionPipeline {
    /// Create a pipeline from a validated config and its collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the chunking parameters are invalid.
    pub fn new(
        config: ChunkingConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let chunker = WordChunker::from_config(&config)?;
        Ok(Self { config, chunker, embedder, store })
    }

    /// Load raw records from `{raw_dir}/corpus.jsonl`, sorted by identifier.
    ///
    /// The sort gives re-runs a stable, deterministic order so idempotent
    /// upserts are order-independent in effect.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Data`] on a missing file or any malformed line.
    pub fn load(&self, raw_dir: &Path) -> Result<Vec<RawRecord>> {
        let lines: Vec<CorpusLine> = read_jsonl(&raw_dir.join(CORPUS_FILE))?;
        let mut records: Vec<RawRecord> = lines
            .into_iter()
            .map(|line| RawRecord {
                id: line.id,
                title: line.title,
                body: line.body,
                metadata: line.metadata,
            })
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    /// Produce the chunk stream for a slice of records.
    ///
    /// For each record: concatenate title and body with a blank line, clean,
    /// chunk, and emit one [`Chunk`] per window with `original_id` and
    /// `chunk_index` metadata. Single-pass; re-invoke on the same input to
    /// restart.
    pub fn transform<'a>(
        &'a self,
        records: &'a [RawRecord],
    ) -> impl Iterator<Item = Chunk> + 'a {
        records.iter().flat_map(move |record| {
            let text = clean_text(&format!("{}\n\n{}", record.title, record.body));
            let windows = self.chunker.split(&text);
            let record_id = record.id.clone();
            let base_metadata = record.metadata.clone();
            windows.into_iter().enumerate().map(move |(i, window)| {
                let mut metadata = base_metadata.clone();
                metadata.insert("original_id".to_string(), Value::from(record_id.clone()));
                metadata.insert("chunk_index".to_string(), Value::from(i));
                Chunk {
                    chunk_id: format!("{record_id}_{i}"),
                    record_id: record_id.clone(),
                    text: window,
                    metadata,
                    created_at: Utc::now(),
                }
            })
        })
    }

    /// Embed and persist one batch of chunks, then mirror it to the log.
    ///
    /// No-op on an empty batch. The embedding capability is called once for
    /// the whole batch; a vector/chunk count mismatch is a fatal
    /// [`RagError::Integrity`]. The upsert is one atomic transaction.
    pub async fn persist(&self, batch: &[Chunk], log: &InspectionLog) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != batch.len() {
            return Err(RagError::Integrity(format!(
                "embedding capability returned {} vectors for {} chunks",
                embeddings.len(),
                batch.len()
            )));
        }

        self.store.upsert(batch, &embeddings).await?;
        log.append(batch)?;
        Ok(())
    }

    /// Run the full pipeline: load, transform, persist in batches.
    ///
    /// Returns the total number of chunks persisted. A failure aborts the
    /// current batch and propagates with its batch index; prior batches
    /// remain durable.
    pub async fn run(&self, raw_dir: &Path, output_dir: &Path) -> Result<usize> {
        std::fs::create_dir_all(output_dir).map_err(|e| {
            RagError::Pipeline(format!("cannot create {}: {e}", output_dir.display()))
        })?;
        let log = InspectionLog::new(output_dir.join(INSPECTION_LOG_FILE));

        let records = self.load(raw_dir)?;
        info!(record_count = records.len(), "loaded raw records");

        let mut batch: Vec<Chunk> = Vec::with_capacity(self.config.batch_size);
        let mut batch_index = 0usize;
        let mut total = 0usize;

        for chunk in self.transform(&records) {
            batch.push(chunk);
            if batch.len() >= self.config.batch_size {
                self.persist_numbered(&batch, &log, batch_index).await?;
                total += batch.len();
                batch.clear();
                batch_index += 1;
            }
        }
        if !batch.is_empty() {
            self.persist_numbered(&batch, &log, batch_index).await?;
            total += batch.len();
        }

        info!(chunk_count = total, "ingestion complete");
        Ok(total)
    }

    async fn persist_numbered(
        &self,
        batch: &[Chunk],
        log: &InspectionLog,
        batch_index: usize,
    ) -> Result<()> {
        self.persist(batch, log).await.map_err(|e| {
            error!(batch_index, error = %e, "persist failed");
            RagError::Pipeline(format!("batch {batch_index}: {e}"))
        })?;
        info!(batch_index, chunk_count = batch.len(), "persisted batch");
        Ok(())
    }
}
