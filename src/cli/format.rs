use std::cmp;
use std::io::{self, Write};

use anyhow::Result;

use crate::corpus::PartitionSummary;
use crate::models::ResultsTable;

/// Render a `PartitionSummary` in human-readable text form.
pub fn print_partition_summary_text(summary: &PartitionSummary) -> Result<()> {
    println!("partitions     : {}", summary.partitions);
    println!("partition_size : {}", summary.partition_size);
    println!("documents      : {}", summary.documents_found);
    println!("used           : {}", summary.documents_used);
    println!("dropped        : {}", summary.documents_dropped);
    Ok(())
}

/// Print a results table with one row per round.
pub fn print_results_table(results: &ResultsTable) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_results_table(&mut out, results)?;
    out.flush()?;
    Ok(())
}

/// Write a results table as aligned columns: round, `n_docs`,
/// `index_times`, then one column per query metric.
pub fn write_results_table<W: Write>(out: &mut W, results: &ResultsTable) -> io::Result<()> {
    let mut header = vec![
        "round".to_string(),
        "n_docs".to_string(),
        "index_times".to_string(),
    ];
    header.extend(results.metric_names().map(str::to_string));

    let mut rows = Vec::with_capacity(results.rounds());
    for round in 0..results.rounds() {
        let mut row = vec![
            (round + 1).to_string(),
            results.n_docs[round].to_string(),
            format_seconds(results.index_times.get(round).copied()),
        ];
        for series in results.queries.values() {
            row.push(format_seconds(series.get(round).copied()));
        }
        rows.push(row);
    }

    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = cmp::max(widths[i], cell.len());
        }
    }

    write_row(out, &header, &widths)?;
    for row in &rows {
        write_row(out, row, &widths)?;
    }

    Ok(())
}

fn write_row<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:>width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end())
}

fn format_seconds(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.6}"),
        None => "-".to_string(),
    }
}
