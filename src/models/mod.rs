//! Shared data models: document references, the results table, and the
//! configuration structs handed to the partitioner, adapters, and driver.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Number of partitions (and therefore rounds) in a standard run.
pub const N_PARTITIONS: usize = 20;

/// Seed applied before shuffling the corpus.
pub const SEED: u64 = 42;

/// Default cap on the number of documents used by a run.
pub const DEFAULT_N_DOCS: usize = 10_000;

/// Default number of characters of each book sent to an engine.
pub const DEFAULT_MAX_CHARS: usize = 100_000;

/// Results-table key holding per-round indexing seconds.
pub const INDEX_TIMES_KEY: &str = "index_times";

/// Results-table key holding the indexed document count after each round.
pub const N_DOCS_KEY: &str = "n_docs";

/// Query terms sent to every engine. The Spanish terms cover the
/// Spanish-language books present in the collection.
pub const QUERIES: [&str; 20] = [
    "lion",
    "Spain",
    "whale",
    "part",
    "the",
    "bird",
    "nightmare",
    "country",
    "mountain",
    "Alice",
    "master",
    "with",
    "main",
    "event",
    "red",
    "perro",
    "casa",
    "caballo",
    "molinos",
    "ascendencia",
];

/// Owned copy of the default query set.
pub fn default_queries() -> Vec<String> {
    QUERIES.iter().map(|q| q.to_string()).collect()
}

/// A single document of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    /// File-name prefix before the first `.`.
    pub id: String,
    pub path: PathBuf,
}

impl DocumentRef {
    /// Build a reference from a path, deriving the id from its file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let id = document_id(&path)?;
        Some(Self { id, path })
    }

    /// Read the document text, keeping at most `max_chars` characters.
    pub fn read_text(&self, max_chars: usize) -> Result<String> {
        let bytes = fs::read(&self.path).map_err(|e| BenchError::io(&self.path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(truncate_chars(&text, max_chars).to_string())
    }
}

/// Derive a document id from a file name: everything before the first `.`.
///
/// Returns `None` for names with an empty prefix (e.g. `.hidden`).
pub fn document_id(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let id = name.split('.').next().unwrap_or(name);
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// One equal-size slice of the shuffled corpus.
pub type Partition = Vec<DocumentRef>;

/// Mean seconds per query metric for a single round.
pub type QueryTimings = BTreeMap<String, f64>;

/// Per-round timing series for a whole benchmark run.
///
/// Serialized as a flat JSON object: `index_times`, `n_docs`, and one key
/// per query metric. Entry *i* of every series describes round *i*.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsTable {
    pub index_times: Vec<f64>,
    pub n_docs: Vec<u64>,
    #[serde(flatten)]
    pub queries: BTreeMap<String, Vec<f64>>,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed rounds.
    pub fn rounds(&self) -> usize {
        self.n_docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_docs.is_empty()
    }

    /// Names of the query-metric series, in table order.
    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    /// Length of every series keyed by name, including the two fixed ones.
    pub fn series_lengths(&self) -> BTreeMap<&str, usize> {
        let mut lengths = BTreeMap::new();
        lengths.insert(INDEX_TIMES_KEY, self.index_times.len());
        lengths.insert(N_DOCS_KEY, self.n_docs.len());
        for (name, series) in &self.queries {
            lengths.insert(name.as_str(), series.len());
        }
        lengths
    }
}

/// How the corpus is discovered and split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusConfig {
    pub root: PathBuf,
    /// Optional include glob applied to candidate files (e.g. `*.txt`).
    pub glob: Option<String>,
    /// Cap applied after shuffling; `None` uses every document.
    pub max_documents: Option<usize>,
    pub seed: u64,
    pub partitions: usize,
}

impl CorpusConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            glob: None,
            max_documents: None,
            seed: SEED,
            partitions: N_PARTITIONS,
        }
    }
}

/// Connection settings for the Solr adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolrConfig {
    /// Core URL, e.g. `http://127.0.0.1:8984/solr/gutenberg`.
    pub url: String,
    /// Field that stores document text and is targeted by queries.
    pub field: String,
    pub max_chars: usize,
    /// Request timeout; `None` blocks until the engine answers.
    pub timeout_secs: Option<u64>,
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8984/solr/gutenberg".to_string(),
            field: "text".to_string(),
            max_chars: DEFAULT_MAX_CHARS,
            timeout_secs: None,
        }
    }
}

/// Settings for the SQLite FTS5 adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
    pub index_path: PathBuf,
    pub max_chars: usize,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("bookbench_index").join("index.sqlite"),
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// Everything a single benchmark run needs besides the adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub corpus: CorpusConfig,
    pub queries: Vec<String>,
    pub results_dir: PathBuf,
    pub label: String,
}

impl BenchConfig {
    /// Location of the results record for this run.
    pub fn results_path(&self) -> PathBuf {
        crate::results::results_path(&self.results_dir, &self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_uses_prefix_before_first_dot() {
        assert_eq!(
            document_id(Path::new("/data/1342.txt")).as_deref(),
            Some("1342")
        );
        assert_eq!(
            document_id(Path::new("84.txt.utf-8")).as_deref(),
            Some("84")
        );
        assert_eq!(document_id(Path::new("README")).as_deref(), Some("README"));
        assert_eq!(document_id(Path::new(".hidden")), None);
    }

    #[test]
    fn read_text_truncates_on_char_boundary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("7.txt");
        fs::write(&path, "caña de azúcar").expect("write");

        let doc = DocumentRef::from_path(&path).expect("doc ref");
        assert_eq!(doc.id, "7");
        assert_eq!(doc.read_text(4).expect("read"), "caña");
        assert_eq!(doc.read_text(1_000).expect("read"), "caña de azúcar");
    }

    #[test]
    fn results_table_serializes_as_flat_object() {
        let mut table = ResultsTable::new();
        table.index_times.push(0.5);
        table.n_docs.push(10);
        table.queries.insert("bm25".to_string(), vec![0.25]);

        let value = serde_json::to_value(&table).expect("to json");
        assert_eq!(value["index_times"][0], 0.5);
        assert_eq!(value["n_docs"][0], 10);
        assert_eq!(value["bm25"][0], 0.25);
        assert_eq!(value.as_object().map(|o| o.len()), Some(3));
    }

    #[test]
    fn default_queries_are_fixed() {
        let queries = default_queries();
        assert_eq!(queries.len(), 20);
        assert_eq!(queries.first().map(String::as_str), Some("lion"));
        assert_eq!(queries.last().map(String::as_str), Some("ascendencia"));
    }
}
