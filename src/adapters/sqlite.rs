//! SQLite FTS5 adapter.
//!
//! The index lives in a single database file holding one FTS5 table:
//!
//! - `docs(doc_id UNINDEXED, text)` tokenized with `unicode61`
//!   (diacritics folded so the Spanish queries match accented text).
//!
//! Each round drops the table and rebuilds it from the cumulative
//! document set inside one write transaction, so the measured time is a
//! full index build. Queries run once per ranking model.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info};

use crate::adapters::{timings_from_samples, Indexer};
use crate::error::{BenchError, Result};
use crate::models::{DocumentRef, QueryTimings, SqliteConfig};

const CREATE_DOCS_TABLE: &str = r#"
    DROP TABLE IF EXISTS docs;
    CREATE VIRTUAL TABLE docs USING fts5(
        doc_id UNINDEXED,
        text,
        tokenize = 'unicode61 remove_diacritics 2'
    );
"#;

/// Result ordering used for a query; each model is reported as its own
/// metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingModel {
    /// Matches in storage order, no scoring.
    Unranked,
    /// Okapi BM25 via the built-in `bm25()` auxiliary function.
    Bm25,
}

impl RankingModel {
    pub const ALL: [RankingModel; 2] = [RankingModel::Unranked, RankingModel::Bm25];

    /// Metric name written to the results table.
    pub fn name(self) -> &'static str {
        match self {
            RankingModel::Unranked => "unranked",
            RankingModel::Bm25 => "bm25",
        }
    }

    fn sql(self) -> &'static str {
        match self {
            RankingModel::Unranked => "SELECT doc_id FROM docs WHERE docs MATCH ?1 LIMIT ?2",
            RankingModel::Bm25 => {
                "SELECT doc_id FROM docs WHERE docs MATCH ?1 ORDER BY bm25(docs) LIMIT ?2"
            }
        }
    }
}

/// Embedded full-text index rebuilt from scratch every round.
pub struct SqliteFtsIndexer {
    path: PathBuf,
    conn: Connection,
    max_chars: usize,
    models: Vec<RankingModel>,
    documents: Vec<DocumentRef>,
    n_rows: u64,
}

impl SqliteFtsIndexer {
    /// Open (or create) the database and start from an empty index.
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        let index_path = &config.index_path;
        if let Some(parent) = index_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
            }
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let conn = Connection::open_with_flags(index_path, flags)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let indexer = Self {
            path: index_path.clone(),
            conn,
            max_chars: config.max_chars,
            models: RankingModel::ALL.to_vec(),
            documents: Vec::new(),
            n_rows: 0,
        };
        indexer.reset()?;

        info!(path = %indexer.path.display(), "opened sqlite fts5 index");
        Ok(indexer)
    }

    /// Restrict queries to a subset of ranking models.
    pub fn with_models(mut self, models: &[RankingModel]) -> Self {
        self.models = models.to_vec();
        self
    }

    /// Drop any indexed rows, leaving an empty `docs` table.
    pub fn reset(&self) -> Result<()> {
        self.conn.execute_batch(CREATE_DOCS_TABLE)?;
        Ok(())
    }

    fn rebuild(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(CREATE_DOCS_TABLE)?;
        {
            let mut stmt = tx.prepare("INSERT INTO docs (doc_id, text) VALUES (?1, ?2)")?;
            for doc in &self.documents {
                let text = doc.read_text(self.max_chars)?;
                stmt.execute(params![doc.id, text])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn count_hits(&self, model: RankingModel, phrase: &str, limit: i64) -> Result<u64> {
        let mut stmt = self.conn.prepare_cached(model.sql())?;
        let mut rows = stmt.query(params![phrase, limit])?;
        let mut hits = 0;
        while rows.next()?.is_some() {
            hits += 1;
        }
        Ok(hits)
    }
}

impl Indexer for SqliteFtsIndexer {
    fn engine(&self) -> &str {
        "sqlite"
    }

    fn index(&mut self, batch: &[DocumentRef]) -> Result<f64> {
        self.documents.extend_from_slice(batch);

        let start = Instant::now();
        self.rebuild()?;
        let elapsed = start.elapsed().as_secs_f64();

        self.n_rows = self.documents.len() as u64;
        debug!(rows = self.n_rows, elapsed, "rebuilt fts5 index");
        Ok(elapsed)
    }

    fn query(&self, queries: &[String]) -> Result<QueryTimings> {
        let limit = i64::try_from(self.n_rows).unwrap_or(i64::MAX);
        let mut samples: Vec<(&str, Vec<f64>)> = self
            .models
            .iter()
            .map(|m| (m.name(), Vec::with_capacity(queries.len())))
            .collect();

        for term in queries {
            let phrase = fts_phrase(term);
            for (model, (_, times)) in self.models.iter().zip(samples.iter_mut()) {
                let start = Instant::now();
                let hits = self.count_hits(*model, &phrase, limit)?;
                times.push(start.elapsed().as_secs_f64());
                debug!(query = %term, model = model.name(), hits, "fts5 query");
            }
        }

        Ok(timings_from_samples(samples))
    }

    fn n_rows(&self) -> u64 {
        self.n_rows
    }
}

/// Quote a term as an FTS5 phrase so its characters are never parsed as
/// query syntax.
fn fts_phrase(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}
