use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::adapters::EngineKind;
use crate::models::{
    default_queries, BenchConfig, CorpusConfig, SolrConfig, SqliteConfig, DEFAULT_MAX_CHARS,
    DEFAULT_N_DOCS, N_PARTITIONS, SEED,
};

/// Top-level CLI entrypoint for `bookbench`.
#[derive(Parser, Debug)]
#[command(
    name = "bookbench",
    about = "Indexing and query latency benchmarks for full-text search engines",
    author = "bookbench developers",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    /// Log more detail (debug level) to stderr.
    #[arg(short = 'v', long = "verbose", global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors.
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Benchmark a Solr core over HTTP.
    Solr(SolrArgs),
    /// Benchmark an embedded SQLite FTS5 index.
    Sqlite(SqliteArgs),
    /// Re-render the chart of a saved results record.
    Plot(PlotArgs),
    /// Show how the corpus would be partitioned without running a benchmark.
    Partitions(PartitionsArgs),
}

/// Corpus selection shared by every benchmark subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct CorpusArgs {
    /// Directory holding one `<id>.<ext>` text file per book
    /// (defaults to `$HOME/gutenberg_data`).
    #[arg(long = "corpus", env = "BOOKBENCH_CORPUS")]
    pub corpus: Option<PathBuf>,

    /// Maximum number of documents to use; `0` uses the whole corpus.
    #[arg(long = "n-docs")]
    pub n_docs: Option<usize>,

    /// Inclusion glob applied to corpus files (e.g. "*.txt").
    #[arg(long = "glob")]
    pub glob: Option<String>,

    /// Seed for the corpus shuffle.
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Number of partitions, and therefore rounds.
    #[arg(long = "partitions")]
    pub partitions: Option<usize>,
}

/// Where and how a run's results are written.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Run label; the record is written to `<results-dir>/<label>.json`.
    #[arg(long = "label")]
    pub label: Option<String>,

    /// Directory for results records (must already exist).
    #[arg(long = "results-dir")]
    pub results_dir: Option<PathBuf>,

    /// Chart output path (`.svg`); defaults to `<results-dir>/<label>.svg`.
    #[arg(long = "chart")]
    pub chart: Option<PathBuf>,

    /// Skip rendering the chart.
    #[arg(long = "no-chart")]
    pub no_chart: bool,

    /// Force a legend on the query-time panel.
    #[arg(long = "legend", conflicts_with = "no_legend")]
    pub legend: bool,

    /// Omit the legend on the query-time panel.
    #[arg(long = "no-legend")]
    pub no_legend: bool,

    /// Print the results table to stdout after the run.
    #[arg(long = "show")]
    pub show: bool,
}

/// Arguments specific to the `solr` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct SolrArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Solr core URL.
    #[arg(long = "url", env = "BOOKBENCH_SOLR_URL")]
    pub url: Option<String>,

    /// Field that stores document text.
    #[arg(long = "field")]
    pub field: Option<String>,

    /// Characters of each document sent to Solr.
    #[arg(long = "max-chars")]
    pub max_chars: Option<usize>,

    /// HTTP request timeout in seconds (no timeout when omitted).
    #[arg(long = "timeout-secs")]
    pub timeout_secs: Option<u64>,
}

/// Arguments specific to the `sqlite` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct SqliteArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Database file for the FTS5 index.
    #[arg(long = "index-path")]
    pub index_path: Option<PathBuf>,

    /// Characters of each document inserted into the index.
    #[arg(long = "max-chars")]
    pub max_chars: Option<usize>,
}

/// Arguments specific to the `plot` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct PlotArgs {
    /// Label of the results record to plot.
    pub label: String,

    /// Directory holding results records.
    #[arg(long = "results-dir")]
    pub results_dir: Option<PathBuf>,

    /// Chart output path (`.svg`); defaults to `<results-dir>/<label>.svg`.
    #[arg(long = "output")]
    pub output: Option<PathBuf>,

    /// Omit the legend on the query-time panel.
    #[arg(long = "no-legend")]
    pub no_legend: bool,

    /// Print the results table to stdout.
    #[arg(long = "show")]
    pub show: bool,
}

/// Arguments specific to the `partitions` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct PartitionsArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Output format (text or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Output format for inspection commands.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Default results directory, relative to the working directory.
pub fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

/// Default corpus location: `$HOME/gutenberg_data`.
pub fn default_corpus_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join("gutenberg_data")
}

/// Default run label for an engine, e.g. `results_solr`.
pub fn default_label(engine: EngineKind) -> String {
    format!("results_{}", engine.as_str())
}

/// Build a core `CorpusConfig` from CLI `CorpusArgs`.
pub fn corpus_config_from_args(args: &CorpusArgs) -> Result<CorpusConfig> {
    let partitions = args.partitions.unwrap_or(N_PARTITIONS);
    if partitions == 0 {
        bail!("--partitions must be at least 1");
    }

    let max_documents = match args.n_docs.unwrap_or(DEFAULT_N_DOCS) {
        0 => None,
        n => Some(n),
    };

    Ok(CorpusConfig {
        root: args.corpus.clone().unwrap_or_else(default_corpus_dir),
        glob: args.glob.clone(),
        max_documents,
        seed: args.seed.unwrap_or(SEED),
        partitions,
    })
}

/// Build a core `BenchConfig` for `engine` from corpus and output args.
pub fn bench_config_from_args(
    engine: EngineKind,
    corpus: &CorpusArgs,
    output: &OutputArgs,
    queries: Option<&[String]>,
) -> Result<BenchConfig> {
    let label = output.label.clone().unwrap_or_else(|| default_label(engine));
    if label.is_empty() || label.contains(['/', '\\']) {
        bail!("invalid run label {label:?}: must be a non-empty file name");
    }

    let queries = match queries {
        Some(q) if !q.is_empty() => q.to_vec(),
        _ => default_queries(),
    };

    Ok(BenchConfig {
        corpus: corpus_config_from_args(corpus)?,
        queries,
        results_dir: output.results_dir.clone().unwrap_or_else(default_results_dir),
        label,
    })
}

/// Resolve the chart path for a run, honoring `--chart`.
pub fn chart_path_for(output: &OutputArgs, config: &BenchConfig) -> PathBuf {
    output
        .chart
        .clone()
        .unwrap_or_else(|| config.results_dir.join(format!("{}.svg", config.label)))
}

/// Whether the query panel gets a legend. Engines that report several
/// ranking metrics default to showing one.
pub fn legend_for(output: &OutputArgs, engine: EngineKind) -> bool {
    if output.no_legend {
        false
    } else if output.legend {
        true
    } else {
        matches!(engine, EngineKind::Sqlite)
    }
}

/// Build a `SolrConfig` from CLI `SolrArgs`.
pub fn solr_config_from_args(args: &SolrArgs) -> SolrConfig {
    let defaults = SolrConfig::default();
    SolrConfig {
        url: args.url.clone().unwrap_or(defaults.url),
        field: args.field.clone().unwrap_or(defaults.field),
        max_chars: args.max_chars.unwrap_or(DEFAULT_MAX_CHARS),
        timeout_secs: args.timeout_secs,
    }
}

/// Build a `SqliteConfig` from CLI `SqliteArgs`.
pub fn sqlite_config_from_args(args: &SqliteArgs) -> SqliteConfig {
    let defaults = SqliteConfig::default();
    SqliteConfig {
        index_path: args.index_path.clone().unwrap_or(defaults.index_path),
        max_chars: args.max_chars.unwrap_or(DEFAULT_MAX_CHARS),
    }
}
