use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const TERRIER_STYLE_RECORD: &str = r#"{
    "index_times": [1.25, 2.5, 4.0],
    "n_docs": [500, 1000, 1500],
    "BM25": [0.012, 0.019, 0.031],
    "PL2": [0.013, 0.021, 0.035],
    "TF_IDF": [0.011, 0.018, 0.029]
}
"#;

fn write_record(root: &Path, label: &str, contents: &str) -> PathBuf {
    let results_dir = root.join("results");
    fs::create_dir_all(&results_dir).expect("create results dir");
    fs::write(results_dir.join(format!("{label}.json")), contents).expect("write record");
    results_dir
}

#[test]
fn cli_plot_renders_chart_from_label() {
    let tmp = tempdir().expect("tempdir");
    let results_dir = write_record(tmp.path(), "results_terrier", TERRIER_STYLE_RECORD);

    let mut cmd = cargo_bin_cmd!("bookbench");
    cmd.current_dir(tmp.path());
    cmd.args(["plot", "results_terrier"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("results_terrier.svg"));

    let svg = fs::read_to_string(results_dir.join("results_terrier.svg")).expect("chart");
    assert!(svg.contains("Query time"));
    assert!(svg.contains("TF_IDF"));
}

#[test]
fn cli_plot_honors_output_path_and_show() {
    let tmp = tempdir().expect("tempdir");
    write_record(tmp.path(), "run", TERRIER_STYLE_RECORD);
    let output = tmp.path().join("charts");
    fs::create_dir_all(&output).expect("create chart dir");

    let mut cmd = cargo_bin_cmd!("bookbench");
    cmd.current_dir(tmp.path());
    cmd.args([
        "plot",
        "run",
        "--output",
        output.join("run_chart").to_str().unwrap(),
        "--no-legend",
        "--show",
    ]);

    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf-8");
    assert!(stdout.contains("1500"));
    assert!(stdout.contains("PL2"));

    let svg = fs::read_to_string(output.join("run_chart.svg")).expect("chart");
    assert!(!svg.contains("TF_IDF"));
}

#[test]
fn cli_plot_fails_on_record_without_required_keys() {
    let tmp = tempdir().expect("tempdir");
    write_record(tmp.path(), "broken", r#"{"index_times": [1.0], "BM25": [0.1]}"#);

    let mut cmd = cargo_bin_cmd!("bookbench");
    cmd.current_dir(tmp.path());
    cmd.args(["plot", "broken"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("n_docs"));
    assert!(!tmp.path().join("results").join("broken.svg").exists());
}

#[test]
fn cli_plot_fails_on_unknown_label() {
    let tmp = tempdir().expect("tempdir");
    fs::create_dir_all(tmp.path().join("results")).expect("create results dir");

    let mut cmd = cargo_bin_cmd!("bookbench");
    cmd.current_dir(tmp.path());
    cmd.args(["plot", "missing"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to load results record"));
}

#[test]
fn cli_plot_rejects_unsupported_image_format() {
    let tmp = tempdir().expect("tempdir");
    write_record(tmp.path(), "run", TERRIER_STYLE_RECORD);

    let mut cmd = cargo_bin_cmd!("bookbench");
    cmd.current_dir(tmp.path());
    cmd.args(["plot", "run", "--output", "chart.png"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unsupported chart format"));
}
