//! Indexing and query latency benchmarks for full-text search engines
//! over a growing corpus of books.

pub mod adapters;
pub mod bench;
pub mod cli;
pub mod corpus;
pub mod error;
pub mod models;
pub mod report;
pub mod results;
