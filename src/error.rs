//! Error taxonomy shared by the corpus, adapter, driver, store, and
//! reporting layers.
//!
//! Nothing in the library retries or recovers: every variant is meant to
//! abort the current run and surface to the invoking process.

use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, BenchError>;

#[derive(Debug, Error)]
pub enum BenchError {
    /// I/O failure tied to a concrete path.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corpus directory not found: {}", .0.display())]
    CorpusNotFound(PathBuf),

    #[error("corpus path is not a directory: {}", .0.display())]
    CorpusNotADirectory(PathBuf),

    #[error("corpus directory contains no regular files: {}", .0.display())]
    EmptyCorpus(PathBuf),

    #[error("corpus has {found} documents, fewer than the {partitions} partitions requested")]
    CorpusTooSmall { found: usize, partitions: usize },

    #[error("partition count must be at least 1")]
    NoPartitions,

    #[error("duplicate document id {id}: {} and {}", first.display(), second.display())]
    DuplicateDocument {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("invalid corpus glob: {0}")]
    InvalidGlob(#[from] globset::Error),

    #[error("results directory does not exist: {}", .0.display())]
    ResultsDirMissing(PathBuf),

    #[error("malformed results record: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "round {round} reported metrics {found:?}, expected {expected:?} from the first round"
    )]
    MetricSetChanged {
        round: usize,
        expected: BTreeSet<String>,
        found: BTreeSet<String>,
    },

    #[error("search engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("search engine error: {0}")]
    Engine(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("results table has no rounds to plot")]
    EmptyResults,

    #[error("unsupported chart format {0:?}; only .svg is supported")]
    UnsupportedChartFormat(String),

    #[error("chart rendering failed: {0}")]
    Chart(String),
}

impl BenchError {
    /// Wrap an `io::Error` with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BenchError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error belongs to the filesystem class.
    pub fn is_filesystem(&self) -> bool {
        matches!(
            self,
            BenchError::Io { .. }
                | BenchError::CorpusNotFound(_)
                | BenchError::CorpusNotADirectory(_)
                | BenchError::ResultsDirMissing(_)
        )
    }
}
