//! Results store.
//!
//! A results record is a pretty-printed JSON object at
//! `<results-dir>/<label>.json` holding the results table.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::info;

use crate::error::{BenchError, Result};
use crate::models::ResultsTable;

/// Path of the record for `label` under `dir`.
pub fn results_path(dir: &Path, label: &str) -> PathBuf {
    dir.join(format!("{label}.json"))
}

/// Write `results` to `path`.
///
/// The parent directory must already exist. The record is written to a
/// sibling temporary file and renamed into place, so a failed save never
/// leaves a partial record behind.
pub fn save(path: &Path, results: &ResultsTable) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.is_dir() {
        return Err(BenchError::ResultsDirMissing(dir));
    }

    let tmp_path = temporary_path(path);
    if let Err(err) = write_record(&tmp_path, results) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        BenchError::io(path, e)
    })?;

    info!(path = %path.display(), rounds = results.rounds(), "saved results");
    Ok(())
}

/// Read a results record back from `path`.
pub fn load(path: &Path) -> Result<ResultsTable> {
    let file = File::open(path).map_err(|e| BenchError::io(path, e))?;
    let results = serde_json::from_reader(BufReader::new(file))?;
    Ok(results)
}

fn write_record(path: &Path, results: &ResultsTable) -> Result<()> {
    let file = File::create(path).map_err(|e| BenchError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut writer, formatter);
    results.serialize(&mut serializer)?;

    writer.write_all(b"\n").map_err(|e| BenchError::io(path, e))?;
    writer.flush().map_err(|e| BenchError::io(path, e))?;
    Ok(())
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
