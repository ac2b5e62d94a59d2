//! Benchmark driver.
//!
//! Runs one round per partition: index the partition as an incremental
//! batch, run the query set, then record the indexer's row count. The
//! results table grows by exactly one entry per series each round.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::info;

use crate::adapters::Indexer;
use crate::error::{BenchError, Result};
use crate::models::{Partition, QueryTimings, ResultsTable};

/// What happened in a single round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    /// Zero-based round number.
    pub round: usize,
    pub batch_size: usize,
    pub index_time: f64,
    pub query_times: QueryTimings,
    pub n_docs: u64,
}

/// State machine over the partitions of one run.
///
/// The first round fixes the set of query metrics; a later round that
/// reports a different set fails with `MetricSetChanged`. A failed round
/// records nothing, so every series in `results()` has the same length.
pub struct BenchmarkDriver<'a, I: Indexer + ?Sized> {
    indexer: &'a mut I,
    partitions: &'a [Partition],
    queries: &'a [String],
    next_round: usize,
    metrics: Option<BTreeSet<String>>,
    results: ResultsTable,
}

impl<'a, I: Indexer + ?Sized> BenchmarkDriver<'a, I> {
    pub fn new(indexer: &'a mut I, partitions: &'a [Partition], queries: &'a [String]) -> Self {
        Self {
            indexer,
            partitions,
            queries,
            next_round: 0,
            metrics: None,
            results: ResultsTable::new(),
        }
    }

    /// Rounds completed so far.
    pub fn completed_rounds(&self) -> usize {
        self.next_round
    }

    pub fn is_finished(&self) -> bool {
        self.next_round >= self.partitions.len()
    }

    /// Results accumulated so far.
    pub fn results(&self) -> &ResultsTable {
        &self.results
    }

    /// Run the next round, or return `None` once every partition has been
    /// indexed.
    pub fn step(&mut self) -> Result<Option<RoundSummary>> {
        let round = self.next_round;
        let partitions = self.partitions;
        let Some(batch) = partitions.get(round) else {
            return Ok(None);
        };
        let total = partitions.len();

        info!(round = round + 1, total, engine = self.indexer.engine(), "indexing");
        let index_time = self.indexer.index(batch)?;

        info!(round = round + 1, total, "querying");
        let query_times = self.indexer.query(self.queries)?;
        self.check_metrics(round, &query_times)?;
        let n_docs = self.indexer.n_rows();

        // A round is recorded only once it has fully succeeded.
        self.results.index_times.push(index_time);
        for (name, value) in &query_times {
            self.results
                .queries
                .entry(name.clone())
                .or_default()
                .push(*value);
        }
        self.results.n_docs.push(n_docs);
        self.next_round += 1;

        info!(round = round + 1, total, n_docs, index_time, "round done");

        Ok(Some(RoundSummary {
            round,
            batch_size: batch.len(),
            index_time,
            query_times,
            n_docs,
        }))
    }

    /// Drive every remaining round and return the finished table.
    pub fn run(mut self) -> Result<ResultsTable> {
        while self.step()?.is_some() {}
        Ok(self.results)
    }

    fn check_metrics(&mut self, round: usize, timings: &QueryTimings) -> Result<()> {
        let found: BTreeSet<String> = timings.keys().cloned().collect();
        match &self.metrics {
            None => {
                self.metrics = Some(found);
                Ok(())
            }
            Some(expected) if *expected == found => Ok(()),
            Some(expected) => Err(BenchError::MetricSetChanged {
                round,
                expected: expected.clone(),
                found,
            }),
        }
    }
}

/// Run a full benchmark of `indexer` over `partitions`.
pub fn run_benchmark<I: Indexer + ?Sized>(
    indexer: &mut I,
    partitions: &[Partition],
    queries: &[String],
) -> Result<ResultsTable> {
    BenchmarkDriver::new(indexer, partitions, queries).run()
}
