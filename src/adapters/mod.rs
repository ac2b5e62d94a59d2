//! Search engine adapters.
//!
//! The `Indexer` trait is the uniform contract the benchmark driver runs
//! against. Each adapter wraps one engine, owns that engine's index for
//! the duration of a run, and tracks how many documents are currently
//! indexed.

mod solr;
mod sqlite;

pub use solr::{SolrIndexer, TIMES_QUERY_METRIC};
pub use sqlite::{RankingModel, SqliteFtsIndexer};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{DocumentRef, QueryTimings, SolrConfig, SqliteConfig};

/// Engine-specific wrapper exposing timed index and query operations.
pub trait Indexer {
    /// Short engine name used in logs and default run labels.
    fn engine(&self) -> &str;

    /// Add `batch` to the index and return the elapsed indexing seconds.
    ///
    /// After the call `n_rows` reports every document indexed so far.
    fn index(&mut self, batch: &[DocumentRef]) -> Result<f64>;

    /// Run every query against the current index, limiting results to
    /// `n_rows`, and return the mean latency in seconds per metric.
    fn query(&self, queries: &[String]) -> Result<QueryTimings>;

    /// Total documents currently indexed. Never decreases.
    fn n_rows(&self) -> u64;
}

impl<I: Indexer + ?Sized> Indexer for Box<I> {
    fn engine(&self) -> &str {
        (**self).engine()
    }

    fn index(&mut self, batch: &[DocumentRef]) -> Result<f64> {
        (**self).index(batch)
    }

    fn query(&self, queries: &[String]) -> Result<QueryTimings> {
        (**self).query(queries)
    }

    fn n_rows(&self) -> u64 {
        (**self).n_rows()
    }
}

/// Engines the CLI knows how to benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Solr,
    Sqlite,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Solr => "solr",
            EngineKind::Sqlite => "sqlite",
        }
    }
}

/// Adapter configuration, one variant per engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineConfig {
    Solr(SolrConfig),
    Sqlite(SqliteConfig),
}

impl EngineConfig {
    pub fn kind(&self) -> EngineKind {
        match self {
            EngineConfig::Solr(_) => EngineKind::Solr,
            EngineConfig::Sqlite(_) => EngineKind::Sqlite,
        }
    }
}

/// Connect to (or open) the engine described by `config`, leaving it with
/// an empty index.
pub fn open_indexer(config: &EngineConfig) -> Result<Box<dyn Indexer>> {
    match config {
        EngineConfig::Solr(solr) => Ok(Box::new(SolrIndexer::connect(solr)?)),
        EngineConfig::Sqlite(sqlite) => Ok(Box::new(SqliteFtsIndexer::open(sqlite)?)),
    }
}

/// Arithmetic mean, or `None` for an empty sample.
pub(crate) fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

/// Collapse per-query latency samples into one mean per metric. Metrics
/// without samples are left out.
pub(crate) fn timings_from_samples<'a, I>(samples: I) -> QueryTimings
where
    I: IntoIterator<Item = (&'a str, Vec<f64>)>,
{
    samples
        .into_iter()
        .filter_map(|(name, values)| mean(&values).map(|m| (name.to_string(), m)))
        .collect()
}
