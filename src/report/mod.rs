//! Chart rendering for results tables.
//!
//! Produces two stacked panels: indexing time against corpus size, and
//! one line per query metric against corpus size.

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::info;

use crate::error::{BenchError, Result};
use crate::models::ResultsTable;

const CHART_SIZE: (u32, u32) = (800, 1000);

/// Rendering switches for `render_chart`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    /// Draw a legend naming each query metric.
    pub legend: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self { legend: true }
    }
}

/// Resolve the output path of a chart: `.svg` is appended when the path
/// has no extension, and any other extension is rejected.
pub fn chart_path(path: &Path) -> Result<PathBuf> {
    match path.extension().and_then(|e| e.to_str()) {
        None => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".svg");
            Ok(PathBuf::from(name))
        }
        Some(ext) if ext.eq_ignore_ascii_case("svg") => Ok(path.to_path_buf()),
        Some(ext) => Err(BenchError::UnsupportedChartFormat(ext.to_string())),
    }
}

/// Render `results` to an SVG file and return the path written.
pub fn render_chart(results: &ResultsTable, path: &Path, options: &ChartOptions) -> Result<PathBuf> {
    if results.is_empty() {
        return Err(BenchError::EmptyResults);
    }

    let path = chart_path(path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(BenchError::ResultsDirMissing(parent.to_path_buf()));
        }
    }

    draw(results, &path, options).map_err(|e| BenchError::Chart(e.to_string()))?;

    info!(path = %path.display(), "rendered chart");
    Ok(path)
}

fn draw(
    results: &ResultsTable,
    path: &Path,
    options: &ChartOptions,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(CHART_SIZE.1 / 2);

    let x_range = 0f64..axis_max(results.n_docs.iter().map(|n| *n as f64));

    let mut index_chart = ChartBuilder::on(&upper)
        .caption("Indexing times", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), 0f64..axis_max(results.index_times.iter().copied()))?;
    index_chart.configure_mesh().y_desc("Time (s)").draw()?;
    index_chart.draw_series(LineSeries::new(
        points(&results.n_docs, &results.index_times),
        BLUE.stroke_width(2),
    ))?;

    let query_max = axis_max(results.queries.values().flatten().copied());
    let mut query_chart = ChartBuilder::on(&lower)
        .caption("Query time", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, 0f64..query_max)?;
    query_chart
        .configure_mesh()
        .y_desc("Time (s)")
        .x_desc("Number of documents")
        .draw()?;

    for (i, (name, series)) in results.queries.iter().enumerate() {
        let style = Palette99::pick(i).stroke_width(2);
        query_chart
            .draw_series(LineSeries::new(points(&results.n_docs, series), style))?
            .label(name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    if options.legend && !results.queries.is_empty() {
        query_chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

fn points(n_docs: &[u64], values: &[f64]) -> Vec<(f64, f64)> {
    n_docs
        .iter()
        .zip(values)
        .map(|(n, v)| (*n as f64, *v))
        .collect()
}

/// Upper bound for an axis with a little headroom; never zero.
fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.filter(|v| v.is_finite()).fold(0f64, f64::max);
    if max > 0.0 {
        max * 1.05
    } else {
        1.0
    }
}
