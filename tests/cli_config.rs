use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_corpus(dir: &Path, n: usize) {
    fs::create_dir_all(dir).expect("create corpus dir");
    for i in 1..=n {
        fs::write(dir.join(format!("{i}.txt")), format!("the lion number {i}")).expect("write book");
    }
}

#[test]
fn cli_partitions_uses_project_config_defaults() {
    let tmp = tempdir().expect("tempdir");
    let project = tmp.path().join("project");
    write_corpus(&project.join("books"), 120);
    fs::write(project.join("books").join("notes.md"), "not a book").expect("write notes");

    let config_dir = project.join(".bookbench");
    fs::create_dir_all(&config_dir).expect("create .bookbench directory");
    let config_toml = r#"
[corpus]
path = "books"
glob = "*.txt"
n_docs = 100
partitions = 10

[partitions]
format = "json"
"#;
    fs::write(config_dir.join("config.toml"), config_toml).expect("write config.toml");

    let mut cmd = cargo_bin_cmd!("bookbench");
    cmd.current_dir(&project);
    cmd.env_remove("BOOKBENCH_CORPUS");
    cmd.arg("partitions");

    let assert = cmd.assert().success();
    let value: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid json output");

    assert_eq!(value["partitions"], 10);
    assert_eq!(value["partition_size"], 10);
    assert_eq!(value["documents_found"], 120);
    assert_eq!(value["documents_used"], 100);
}

#[test]
fn cli_flags_override_project_config() {
    let tmp = tempdir().expect("tempdir");
    let project = tmp.path().join("project");
    write_corpus(&project.join("books"), 80);

    let config_dir = project.join(".bookbench");
    fs::create_dir_all(&config_dir).expect("create .bookbench directory");
    fs::write(
        config_dir.join("config.toml"),
        "[corpus]\npath = \"books\"\npartitions = 10\n",
    )
    .expect("write config.toml");

    let mut cmd = cargo_bin_cmd!("bookbench");
    cmd.current_dir(&project);
    cmd.env_remove("BOOKBENCH_CORPUS");
    cmd.args(["partitions", "--partitions", "20", "--format", "json"]);

    let assert = cmd.assert().success();
    let value: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid json output");

    assert_eq!(value["partitions"], 20);
    assert_eq!(value["partition_size"], 4);
}

#[test]
fn cli_sqlite_uses_configured_queries_and_label() {
    let tmp = tempdir().expect("tempdir");
    let project = tmp.path().join("project");
    write_corpus(&project.join("books"), 40);
    fs::create_dir_all(project.join("out")).expect("create results dir");

    let config_dir = project.join(".bookbench");
    fs::create_dir_all(&config_dir).expect("create .bookbench directory");
    let config_toml = r#"
[corpus]
path = "books"

[bench]
queries = ["lion", "whale"]

[results]
dir = "out"

[sqlite]
index_path = "index/fts.sqlite"
label = "configured"
"#;
    fs::write(config_dir.join("config.toml"), config_toml).expect("write config.toml");

    let mut cmd = cargo_bin_cmd!("bookbench");
    cmd.current_dir(&project);
    cmd.env_remove("BOOKBENCH_CORPUS");
    cmd.args(["sqlite", "--no-chart"]);
    cmd.assert().success();

    let text = fs::read_to_string(project.join("out").join("configured.json")).expect("record");
    let value: Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(value["n_docs"].as_array().map(Vec::len), Some(20));
    assert!(project.join("index").join("fts.sqlite").is_file());
}
