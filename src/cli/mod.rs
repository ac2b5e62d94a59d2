use std::path::Path;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapters::{open_indexer, EngineConfig, EngineKind};
use crate::bench;
use crate::corpus;
use crate::models::BenchConfig;
use crate::report::{self, ChartOptions};
use crate::results;

mod args;
mod config;
mod format;

pub use args::{
    Cli, Commands, CorpusArgs, OutputArgs, OutputFormat, PartitionsArgs, PlotArgs, SolrArgs,
    SqliteArgs,
};

use config::{
    apply_partitions_config_defaults, apply_plot_config_defaults, apply_solr_config_defaults,
    apply_sqlite_config_defaults, load_cli_config,
};

/// Entry point for the CLI binary.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let cli_config = load_cli_config()?;
    let queries = cli_config.as_ref().and_then(|c| c.queries());

    match cli.command {
        Some(Commands::Solr(mut solr_args)) => {
            if let Some(ref config) = cli_config {
                apply_solr_config_defaults(config, &mut solr_args);
            }

            let config = args::bench_config_from_args(
                EngineKind::Solr,
                &solr_args.corpus,
                &solr_args.output,
                queries,
            )?;
            let engine = EngineConfig::Solr(args::solr_config_from_args(&solr_args));
            run_engine(&config, &engine, &solr_args.output)
        }
        Some(Commands::Sqlite(mut sqlite_args)) => {
            if let Some(ref config) = cli_config {
                apply_sqlite_config_defaults(config, &mut sqlite_args);
            }

            let config = args::bench_config_from_args(
                EngineKind::Sqlite,
                &sqlite_args.corpus,
                &sqlite_args.output,
                queries,
            )?;
            let engine = EngineConfig::Sqlite(args::sqlite_config_from_args(&sqlite_args));
            run_engine(&config, &engine, &sqlite_args.output)
        }
        Some(Commands::Plot(mut plot_args)) => {
            if let Some(ref config) = cli_config {
                apply_plot_config_defaults(config, &mut plot_args);
            }

            let results_dir = plot_args
                .results_dir
                .clone()
                .unwrap_or_else(args::default_results_dir);
            let record = results::results_path(&results_dir, &plot_args.label);
            let table = results::load(&record)
                .with_context(|| format!("failed to load results record {}", record.display()))?;

            let output = plot_args
                .output
                .clone()
                .unwrap_or_else(|| results_dir.join(format!("{}.svg", plot_args.label)));
            let options = ChartOptions {
                legend: !plot_args.no_legend,
            };
            let written = report::render_chart(&table, &output, &options)?;
            println!("Wrote chart to {}", written.display());

            if plot_args.show {
                format::print_results_table(&table)?;
            }
            Ok(())
        }
        Some(Commands::Partitions(mut partitions_args)) => {
            if let Some(ref config) = cli_config {
                apply_partitions_config_defaults(config, &mut partitions_args);
            }

            let config = args::corpus_config_from_args(&partitions_args.corpus)?;
            let summary = corpus::summarize(&config)?;

            match partitions_args.format {
                OutputFormat::Text => format::print_partition_summary_text(&summary),
                OutputFormat::Json => {
                    serde_json::to_writer(std::io::stdout(), &summary)?;
                    println!();
                    Ok(())
                }
            }
        }
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Partition the corpus, run every round against the engine, then persist
/// and plot the results.
fn run_engine(config: &BenchConfig, engine: &EngineConfig, output: &OutputArgs) -> Result<()> {
    let kind = engine.kind();
    let results_path = config.results_path();
    ensure_results_dir(&config.results_dir)?;

    let partitions = corpus::get_partitions(&config.corpus)?;
    let mut indexer = open_indexer(engine)
        .with_context(|| format!("failed to open {} engine", kind.as_str()))?;

    info!(
        engine = kind.as_str(),
        rounds = partitions.len(),
        queries = config.queries.len(),
        "starting benchmark"
    );
    let table = bench::run_benchmark(&mut indexer, &partitions, &config.queries)?;

    results::save(&results_path, &table)?;
    println!(
        "Benchmarked {} over {} rounds ({} documents); results written to {}",
        kind.as_str(),
        table.rounds(),
        table.n_docs.last().copied().unwrap_or(0),
        results_path.display()
    );

    if !output.no_chart {
        let chart = args::chart_path_for(output, config);
        let options = ChartOptions {
            legend: args::legend_for(output, kind),
        };
        let written = report::render_chart(&table, &chart, &options)?;
        println!("Wrote chart to {}", written.display());
    }

    if output.show {
        format::print_results_table(&table)?;
    }

    Ok(())
}

/// The results directory must exist before the first round starts.
fn ensure_results_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(crate::error::BenchError::ResultsDirMissing(dir.to_path_buf()).into());
    }
    Ok(())
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let filter = if verbose || quiet {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
