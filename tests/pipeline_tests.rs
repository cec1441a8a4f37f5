//! End-to-end ingestion pipeline tests against the in-memory store.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ragbench::config::ChunkingConfig;
use ragbench::embedding::EmbeddingProvider;
use ragbench::error::{RagError, Result};
use ragbench::ingest::{INSPECTION_LOG_FILE, IngestionPipeline};
use ragbench::inmemory::InMemoryVectorStore;
use ragbench::store::VectorStore;
use serde_json::Value;

/// Deterministic embedding derived from the text bytes.
struct HashEmbedder;

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = [1.0f32; 4];
        for (i, b) in text.bytes().enumerate() {
            v[i % 4] += f32::from(b) / 251.0;
        }
        Ok(v.to_vec())
    }

    fn dimensions(&self) -> usize {
        4
    }
}

/// Fails on the nth `embed_batch` call; earlier batches succeed.
struct FlakyEmbedder {
    fail_on_call: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        HashEmbedder.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == self.fail_on_call {
            return Err(RagError::Embedding {
                provider: "flaky".to_string(),
                message: "model unavailable".to_string(),
            });
        }
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        4
    }
}

/// Returns one vector too few, violating the 1:1 contract.
struct ShortBatchEmbedder;

#[async_trait]
impl EmbeddingProvider for ShortBatchEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        HashEmbedder.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::new();
        for text in &texts[..texts.len().saturating_sub(1)] {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        4
    }
}

fn write_corpus(dir: &Path, records: &[(&str, &str, &str)]) {
    let lines: Vec<String> = records
        .iter()
        .map(|(id, title, body)| {
            serde_json::to_string(
                &serde_json::json!({"_id": id, "title": title, "text": body}),
            )
            .unwrap()
        })
        .collect();
    std::fs::write(dir.join("corpus.jsonl"), lines.join("\n") + "\n").unwrap();
}

/// 9 words per record (1 title + 8 body) with max_tokens=5, overlap=1
/// gives windows at 0, 4, 8: three chunks per record.
fn config() -> ChunkingConfig {
    ChunkingConfig::builder().max_tokens(5).overlap(1).batch_size(4).build().unwrap()
}

fn body(marker: &str) -> String {
    format!("{marker} two three four five six seven eight")
}

#[tokio::test]
async fn run_chunks_embeds_and_persists_in_batches() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_corpus(raw.path(), &[("doc1", "alpha", &body("one")), ("doc2", "beta", &body("uno"))]);

    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = IngestionPipeline::new(config(), Arc::new(HashEmbedder), store.clone()).unwrap();

    let total = pipeline.run(raw.path(), out.path()).await.unwrap();
    assert_eq!(total, 6);
    assert_eq!(store.count().await.unwrap(), 6);

    let log = std::fs::read_to_string(out.path().join(INSPECTION_LOG_FILE)).unwrap();
    assert_eq!(log.lines().count(), 6);

    // Every log line is valid JSON carrying the chunk identity.
    for line in log.lines() {
        let value: Value = serde_json::from_str(line).unwrap();
        assert!(value["chunk_id"].as_str().unwrap().contains('_'));
        assert_eq!(
            value["metadata"]["original_id"].as_str().unwrap(),
            value["record_id"].as_str().unwrap()
        );
    }
}

#[tokio::test]
async fn rerunning_ingestion_is_idempotent() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_corpus(raw.path(), &[("doc1", "alpha", &body("one")), ("doc2", "beta", &body("uno"))]);

    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = IngestionPipeline::new(config(), Arc::new(HashEmbedder), store.clone()).unwrap();

    pipeline.run(raw.path(), out.path()).await.unwrap();
    pipeline.run(raw.path(), out.path()).await.unwrap();

    // Same chunk ids, so row count is unchanged.
    assert_eq!(store.count().await.unwrap(), 6);

    // The inspection log is append-only: both runs are recorded.
    let log = std::fs::read_to_string(out.path().join(INSPECTION_LOG_FILE)).unwrap();
    assert_eq!(log.lines().count(), 12);
}

#[tokio::test]
async fn updated_record_overwrites_rather_than_duplicates() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_corpus(raw.path(), &[("doc1", "alpha", &body("legacy"))]);

    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = IngestionPipeline::new(config(), Arc::new(HashEmbedder), store.clone()).unwrap();
    pipeline.run(raw.path(), out.path()).await.unwrap();

    write_corpus(raw.path(), &[("doc1", "alpha", &body("revised"))]);
    pipeline.run(raw.path(), out.path()).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 3);
    let rows = store.nearest(&[1.0, 1.0, 1.0, 1.0], 10).await.unwrap();
    assert!(rows.iter().any(|r| r.text.contains("revised")));
    assert!(rows.iter().all(|r| !r.text.contains("legacy")));
}

#[tokio::test]
async fn transform_produces_deterministic_chunk_ids() {
    let raw = tempfile::tempdir().unwrap();
    write_corpus(raw.path(), &[("doc1", "alpha", &body("one"))]);

    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = IngestionPipeline::new(config(), Arc::new(HashEmbedder), store).unwrap();

    let records = pipeline.load(raw.path()).unwrap();
    let chunks: Vec<_> = pipeline.transform(&records).collect();

    assert_eq!(chunks.len(), 3);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_id, format!("doc1_{i}"));
        assert_eq!(chunk.record_id, "doc1");
        assert_eq!(chunk.metadata["original_id"], Value::from("doc1"));
        assert_eq!(chunk.metadata["chunk_index"], Value::from(i));
    }
    assert!(chunks[0].text.starts_with("alpha"));
}

#[tokio::test]
async fn load_sorts_records_by_identifier() {
    let raw = tempfile::tempdir().unwrap();
    write_corpus(raw.path(), &[("doc2", "beta", "b"), ("doc1", "alpha", "a")]);

    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = IngestionPipeline::new(config(), Arc::new(HashEmbedder), store).unwrap();

    let records = pipeline.load(raw.path()).unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["doc1", "doc2"]);
}

#[tokio::test]
async fn empty_record_still_yields_one_chunk() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_corpus(raw.path(), &[("doc1", "", "")]);

    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = IngestionPipeline::new(config(), Arc::new(HashEmbedder), store.clone()).unwrap();

    let total = pipeline.run(raw.path(), out.path()).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn embedding_failure_aborts_batch_but_keeps_prior_batches() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_corpus(raw.path(), &[("doc1", "alpha", &body("one")), ("doc2", "beta", &body("uno"))]);

    let store = Arc::new(InMemoryVectorStore::new());
    let embedder = Arc::new(FlakyEmbedder { fail_on_call: 1, calls: AtomicUsize::new(0) });
    let pipeline = IngestionPipeline::new(config(), embedder, store.clone()).unwrap();

    let err = pipeline.run(raw.path(), out.path()).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("batch 1"), "missing batch context: {message}");

    // First batch of 4 committed and logged; failed batch left no rows.
    assert_eq!(store.count().await.unwrap(), 4);
    let log = std::fs::read_to_string(out.path().join(INSPECTION_LOG_FILE)).unwrap();
    assert_eq!(log.lines().count(), 4);
}

#[tokio::test]
async fn embedding_count_mismatch_is_an_integrity_error() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_corpus(raw.path(), &[("doc1", "alpha", &body("one"))]);

    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline =
        IngestionPipeline::new(config(), Arc::new(ShortBatchEmbedder), store.clone()).unwrap();

    let err = pipeline.run(raw.path(), out.path()).await.unwrap_err();
    assert!(err.to_string().contains("Integrity"), "unexpected error: {err}");
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn malformed_corpus_line_is_fatal() {
    let raw = tempfile::tempdir().unwrap();
    std::fs::write(raw.path().join("corpus.jsonl"), "{\"_id\":\"doc1\",\"text\":\"a\"}\n{oops\n")
        .unwrap();

    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = IngestionPipeline::new(config(), Arc::new(HashEmbedder), store).unwrap();

    let err = pipeline.load(raw.path()).unwrap_err();
    assert!(matches!(err, RagError::Data(_)));
}
