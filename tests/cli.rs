use std::path::Path;
use std::process::{Command, Output};

const LOG: &str = "\
source,target,weight,start_date,end_date,year
A,Crash,5,2021-01-04,2021-03-30,2021
A,UI,2,2021-01-04,2021-03-30,2021
B,Crash,10,2021-02-01,2021-02-28,2021
";

fn triage(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_triage"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn with_log() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("commits.csv"), LOG).unwrap();
    dir
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "triage failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn graph_json_applies_thresholds() {
    let dir = with_log();
    let output = triage(
        dir.path(),
        &[
            "graph",
            "--data",
            "commits.csv",
            "--min-edge-weight",
            "3",
            "--max-edge-weight",
            "100",
            "--min-total-contribs",
            "0",
            "--format",
            "json",
        ],
    );
    let graph = stdout_json(&output);

    let labels: Vec<&str> = graph["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["A", "B", "Crash"]);

    let edges: Vec<(u64, u64)> = graph["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["from"].as_u64().unwrap(), e["to"].as_u64().unwrap()))
        .collect();
    assert_eq!(edges, vec![(1, 3), (2, 3)]);
}

#[test]
fn data_path_comes_from_config() {
    let dir = with_log();
    std::fs::write(
        dir.path().join(".triage.toml"),
        "[data]\npath = \"commits.csv\"\n",
    )
    .unwrap();

    let output = triage(dir.path(), &["matrix", "--format", "json"]);
    let matrix = stdout_json(&output);
    assert_eq!(matrix["categories"], serde_json::json!(["Crash", "UI"]));
    assert_eq!(matrix["grandTotal"], 17);
}

#[test]
fn diversity_json_matches_gini_simpson() {
    let dir = with_log();
    let output = triage(
        dir.path(),
        &["diversity", "--data", "commits.csv", "--format", "json"],
    );
    let diversity = stdout_json(&output);
    let a = &diversity[0];
    assert_eq!(a["contributor"], "A");
    assert_eq!(a["frequency"], 7);
    let index = a["diversityIndex"].as_f64().unwrap();
    assert!((index - 20.0 / 49.0).abs() < 1e-9);
}

#[test]
fn breakdown_of_unknown_contributor_fails() {
    let dir = with_log();
    let output = triage(dir.path(), &["breakdown", "nobody", "--data", "commits.csv"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nobody"));
}

#[test]
fn missing_log_fails_with_hint() {
    let dir = tempfile::tempdir().unwrap();
    let output = triage(dir.path(), &["records", "--data", "absent.csv"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.csv"));
}

#[test]
fn malformed_log_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.csv"), "source,target\nA,Crash\n").unwrap();
    let output = triage(dir.path(), &["records", "--data", "bad.csv"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing column"));
}

#[test]
fn report_text_summarizes() {
    let dir = with_log();
    let output = triage(dir.path(), &["report", "--data", "commits.csv"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Records:             3"));
    assert!(stdout.contains("Most diverse contributors:"));
}
