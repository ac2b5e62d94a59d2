use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::args::OutputFormat;
use crate::cli::{CorpusArgs, OutputArgs, PartitionsArgs, PlotArgs, SolrArgs, SqliteArgs};

/// Top-level representation of `.bookbench/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub corpus: Option<CorpusSection>,

    #[serde(default)]
    pub bench: Option<BenchSection>,

    #[serde(default)]
    pub results: Option<ResultsSection>,

    #[serde(default)]
    pub solr: Option<SolrSection>,

    #[serde(default)]
    pub sqlite: Option<SqliteSection>,

    #[serde(default)]
    pub partitions: Option<PartitionsSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CorpusSection {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub glob: Option<String>,
    #[serde(default)]
    pub n_docs: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub partitions: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BenchSection {
    #[serde(default)]
    pub queries: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultsSection {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SolrSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub max_chars: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SqliteSection {
    #[serde(default)]
    pub index_path: Option<PathBuf>,
    #[serde(default)]
    pub max_chars: Option<usize>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartitionsSection {
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

impl CliConfig {
    /// Query terms configured under `[bench]`, if any.
    pub fn queries(&self) -> Option<&[String]> {
        self.bench
            .as_ref()
            .map(|b| b.queries.as_slice())
            .filter(|q| !q.is_empty())
    }
}

/// Discover and load a project-local `.bookbench/config.toml` (or
/// `.bookbench/bookbench.toml`) starting from the current working
/// directory and walking up parent directories.
pub fn load_cli_config() -> Result<Option<CliConfig>> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let config_path = find_project_config(&cwd);

    let Some(path) = config_path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse TOML config at {}", path.display()))?;

    Ok(Some(config))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);

    while let Some(current) = dir {
        let bookbench_dir = current.join(".bookbench");
        let config_toml = bookbench_dir.join("config.toml");
        if config_toml.is_file() {
            return Some(config_toml);
        }

        let bookbench_toml = bookbench_dir.join("bookbench.toml");
        if bookbench_toml.is_file() {
            return Some(bookbench_toml);
        }

        dir = current.parent();
    }

    None
}

fn apply_corpus_config_defaults(config: &CliConfig, args: &mut CorpusArgs) {
    let Some(corpus) = &config.corpus else {
        return;
    };

    if args.corpus.is_none() {
        args.corpus = corpus.path.clone();
    }

    if args.glob.is_none() {
        args.glob = corpus.glob.clone();
    }

    if args.n_docs.is_none() {
        args.n_docs = corpus.n_docs;
    }

    if args.seed.is_none() {
        args.seed = corpus.seed;
    }

    if args.partitions.is_none() {
        args.partitions = corpus.partitions;
    }
}

fn apply_output_config_defaults(config: &CliConfig, label: Option<&String>, args: &mut OutputArgs) {
    if args.label.is_none() {
        args.label = label.cloned();
    }

    if args.results_dir.is_none() {
        if let Some(results) = &config.results {
            args.results_dir = results.dir.clone();
        }
    }
}

pub fn apply_solr_config_defaults(config: &CliConfig, args: &mut SolrArgs) {
    apply_corpus_config_defaults(config, &mut args.corpus);

    let solr = config.solr.as_ref();
    apply_output_config_defaults(config, solr.and_then(|s| s.label.as_ref()), &mut args.output);

    if let Some(solr) = solr {
        if args.url.is_none() {
            args.url = solr.url.clone();
        }

        if args.field.is_none() {
            args.field = solr.field.clone();
        }

        if args.max_chars.is_none() {
            args.max_chars = solr.max_chars;
        }

        if args.timeout_secs.is_none() {
            args.timeout_secs = solr.timeout_secs;
        }
    }
}

pub fn apply_sqlite_config_defaults(config: &CliConfig, args: &mut SqliteArgs) {
    apply_corpus_config_defaults(config, &mut args.corpus);

    let sqlite = config.sqlite.as_ref();
    apply_output_config_defaults(
        config,
        sqlite.and_then(|s| s.label.as_ref()),
        &mut args.output,
    );

    if let Some(sqlite) = sqlite {
        if args.index_path.is_none() {
            args.index_path = sqlite.index_path.clone();
        }

        if args.max_chars.is_none() {
            args.max_chars = sqlite.max_chars;
        }
    }
}

pub fn apply_plot_config_defaults(config: &CliConfig, args: &mut PlotArgs) {
    if args.results_dir.is_none() {
        if let Some(results) = &config.results {
            args.results_dir = results.dir.clone();
        }
    }
}

pub fn apply_partitions_config_defaults(config: &CliConfig, args: &mut PartitionsArgs) {
    apply_corpus_config_defaults(config, &mut args.corpus);

    if matches!(args.format, OutputFormat::Text) {
        if let Some(format) = config.partitions.as_ref().and_then(|p| p.format) {
            args.format = format;
        }
    }
}
