//! Per-query retrieval metrics and their aggregation suite.

use std::collections::HashSet;

use crate::document::{MetricResult, Query, RetrievedChunk};

/// A per-query retrieval quality metric. Values are in `[0, 1]`.
pub trait Metric: Send + Sync {
    /// The metric's reporting name, e.g. `recall@5` or `mrr`.
    fn name(&self) -> &str;

    /// Compute the metric for one query's ranked results against the set of
    /// relevant *document* identifiers.
    fn compute(
        &self,
        query: &Query,
        retrieved: &[RetrievedChunk],
        relevant: &HashSet<String>,
    ) -> f64;
}

/// Recall@K: fraction of relevant documents found in the top K results.
///
/// Retrieved chunks are truncated to the first K, mapped to their owning
/// document via `original_id` metadata, and deduplicated: multiple chunks of
/// one document count as a single hit. An empty relevant set scores 0.0, not
/// NaN; excluding such degenerate queries from reporting is the caller's
/// choice.
pub struct RecallAtK {
    k: usize,
    name: String,
}

impl RecallAtK {
    /// Create a Recall@K metric for the given cutoff.
    pub fn new(k: usize) -> Self {
        Self { k, name: format!("recall@{k}") }
    }
}

impl Metric for RecallAtK {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(
        &self,
        _query: &Query,
        retrieved: &[RetrievedChunk],
        relevant: &HashSet<String>,
    ) -> f64 {
        if relevant.is_empty() {
            return 0.0;
        }

        let top_k = &retrieved[..retrieved.len().min(self.k)];
        let retrieved_ids: HashSet<&str> =
            top_k.iter().filter_map(|c| c.original_id()).collect();

        let hits = retrieved_ids.iter().filter(|id| relevant.contains(**id)).count();
        hits as f64 / relevant.len() as f64
    }
}

/// Mean reciprocal rank: `1/rank` of the first relevant result.
///
/// Scans the full ranked list (1-indexed, no truncation) and does *not*
/// deduplicate by document: rank position is literal, so a second chunk of
/// an already-seen document still occupies its rank. Returns 0.0 when no
/// retrieved chunk's document is relevant.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mrr;

impl Metric for Mrr {
    fn name(&self) -> &str {
        "mrr"
    }

    fn compute(
        &self,
        _query: &Query,
        retrieved: &[RetrievedChunk],
        relevant: &HashSet<String>,
    ) -> f64 {
        for (rank, chunk) in retrieved.iter().enumerate() {
            if let Some(id) = chunk.original_id() {
                if relevant.contains(id) {
                    return 1.0 / (rank + 1) as f64;
                }
            }
        }
        0.0
    }
}

/// Runs every configured metric for one query.
#[derive(Default)]
pub struct MetricSuite {
    metrics: Vec<Box<dyn Metric>>,
}

impl MetricSuite {
    /// Create a suite from a set of metrics.
    pub fn new(metrics: Vec<Box<dyn Metric>>) -> Self {
        Self { metrics }
    }

    /// The names of the configured metrics, in order.
    pub fn names(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.name()).collect()
    }

    /// Evaluate all metrics for one query. Zero configured metrics returns
    /// an empty mapping.
    pub fn evaluate(
        &self,
        query: &Query,
        retrieved: &[RetrievedChunk],
        relevant: &HashSet<String>,
    ) -> MetricResult {
        self.metrics
            .iter()
            .map(|m| (m.name().to_string(), m.compute(query, retrieved, relevant)))
            .collect()
    }
}
