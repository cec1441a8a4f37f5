//! Qrels-driven evaluation of the retrieve → rerank pipeline.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::config::{EvalConfig, MissingQrelsPolicy};
use crate::document::{Metadata, Qrels, Query, RetrievedChunk};
use crate::error::{RagError, Result};
use crate::io::read_jsonl;
use crate::metrics::MetricSuite;
use crate::rerank::Reranker;
use crate::retriever::Retriever;

/// File name of the query set inside a data directory.
pub const QUERIES_FILE: &str = "queries.jsonl";

/// File name of the relevance judgments inside a data directory.
pub const QRELS_FILE: &str = "qrels.jsonl";

#[derive(Debug, Deserialize)]
struct QueryLine {
    #[serde(rename = "_id")]
    id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct QrelLine {
    #[serde(rename = "query-id")]
    query_id: String,
    #[serde(rename = "corpus-id")]
    corpus_id: String,
}

/// Aggregated results of one evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    /// Mean value per metric name across evaluated queries. A metric with
    /// no observations reports 0.0.
    pub means: HashMap<String, f64>,
    /// Number of queries that contributed to the means.
    pub queries_evaluated: usize,
    /// Number of queries excluded by [`MissingQrelsPolicy::Skip`].
    pub queries_skipped: usize,
}

/// Drives retrieval (and optional reranking) over a fixed query set and
/// scores the results against relevance judgments.
///
/// When a reranker is configured, retrieval requests `retrieval_k`
/// candidates before reranking down to `top_k`; without one, retrieval
/// requests `top_k` directly. Queries without qrels entries are evaluated
/// against an empty relevant set or skipped, per the configured policy.
pub struct QrelsEvaluator {
    retriever: Arc<dyn Retriever>,
    reranker: Option<Arc<dyn Reranker>>,
    suite: MetricSuite,
    config: EvalConfig,
    queries: Vec<Query>,
    qrels: Qrels,
}

impl std::fmt::Debug for QrelsEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrelsEvaluator")
            .field("config", &self.config)
            .field("queries", &self.queries)
            .field("qrels", &self.qrels)
            .finish_non_exhaustive()
    }
}

impl QrelsEvaluator {
    /// Create an evaluator over an already-loaded query set and qrels.
    pub fn new(
        queries: Vec<Query>,
        qrels: Qrels,
        retriever: Arc<dyn Retriever>,
        reranker: Option<Arc<dyn Reranker>>,
        suite: MetricSuite,
        config: EvalConfig,
    ) -> Self {
        Self { retriever, reranker, suite, config, queries, qrels }
    }

    /// Create an evaluator by loading `queries.jsonl` and `qrels.jsonl`
    /// from `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Data`] on missing files or malformed lines.
    pub fn from_dir(
        data_dir: &Path,
        retriever: Arc<dyn Retriever>,
        reranker: Option<Arc<dyn Reranker>>,
        suite: MetricSuite,
        config: EvalConfig,
    ) -> Result<Self> {
        let queries = load_queries(&data_dir.join(QUERIES_FILE))?;
        let qrels = load_qrels(&data_dir.join(QRELS_FILE))?;
        Ok(Self::new(queries, qrels, retriever, reranker, suite, config))
    }

    /// The loaded evaluation queries.
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Run the evaluation and aggregate mean scores per metric.
    ///
    /// Per-query steps are independent; the mean is insensitive to query
    /// order. The first retrieval or reranking failure aborts the run,
    /// carrying the offending query's identifier.
    pub async fn evaluate(&self) -> Result<EvalReport> {
        let mut accumulator: HashMap<String, Vec<f64>> = HashMap::new();
        let mut evaluated = 0usize;
        let mut skipped = 0usize;
        let empty_relevant = HashSet::new();

        for query in &self.queries {
            let query_id = query.query_id().unwrap_or("<unknown>");
            let relevant = query.query_id().and_then(|id| self.qrels.relevant_for(id));

            if relevant.is_none() && self.config.missing_qrels == MissingQrelsPolicy::Skip {
                skipped += 1;
                continue;
            }
            let relevant = relevant.unwrap_or(&empty_relevant);

            let retrieved = self.run_query(query).await.map_err(|e| {
                error!(query_id, error = %e, "evaluation query failed");
                RagError::Pipeline(format!("query '{query_id}': {e}"))
            })?;

            let scores = self.suite.evaluate(query, &retrieved, relevant);
            for (name, value) in scores {
                accumulator.entry(name).or_default().push(value);
            }
            evaluated += 1;
        }

        let mut means = HashMap::new();
        for name in self.suite.names() {
            let values = accumulator.get(name).map(Vec::as_slice).unwrap_or(&[]);
            let mean = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            info!(metric = name, mean, "evaluation metric");
            means.insert(name.to_string(), mean);
        }

        info!(queries_evaluated = evaluated, queries_skipped = skipped, "evaluation complete");
        Ok(EvalReport { means, queries_evaluated: evaluated, queries_skipped: skipped })
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<RetrievedChunk>> {
        match &self.reranker {
            Some(reranker) => {
                let candidates = self.retriever.search(query, self.config.retrieval_k).await?;
                reranker.rerank(query, &candidates, self.config.top_k).await
            }
            None => self.retriever.search(query, self.config.top_k).await,
        }
    }
}

/// Load evaluation queries; each gets a `query_id` metadata entry.
fn load_queries(path: &Path) -> Result<Vec<Query>> {
    let lines: Vec<QueryLine> = read_jsonl(path)?;
    Ok(lines
        .into_iter()
        .map(|line| {
            let mut metadata = Metadata::new();
            metadata.insert("query_id".to_string(), Value::from(line.id));
            Query { text: line.text, metadata }
        })
        .collect())
}

/// Load relevance judgments keyed by query identifier.
fn load_qrels(path: &Path) -> Result<Qrels> {
    let lines: Vec<QrelLine> = read_jsonl(path)?;
    let mut qrels = Qrels::new();
    for line in lines {
        qrels.insert(line.query_id, line.corpus_id);
    }
    Ok(qrels)
}
