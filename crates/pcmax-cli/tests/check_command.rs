//! End-to-end tests for the `check` subcommand

use std::io::Write;
use std::process::{Command, Output};

use tempfile::NamedTempFile;

const FIVE_JOBS: &str = "\
5 1
4
3  1  1  4
8  1  2  3 5
10 1  0
2  1  0
10 1  0
";

fn write_instance(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp instance");
    file.write_all(content.as_bytes())
        .expect("failed to write temp instance");
    file
}

fn pcmax(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pcmax"))
        .args(args)
        .output()
        .expect("failed to execute pcmax")
}

#[test]
fn check_prints_graph_statistics() {
    let instance = write_instance(FIVE_JOBS);
    let path = instance.path().to_str().unwrap();

    let output = pcmax(&["check", path]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("jobs           5"), "stdout: {stdout}");
    assert!(stdout.contains("critical path  18"), "stdout: {stdout}");
}

#[test]
fn check_json_counts_every_edge() {
    let instance = write_instance(FIVE_JOBS);
    let path = instance.path().to_str().unwrap();

    let output = pcmax(&["check", path, "--format", "json"]);
    assert_eq!(output.status.code(), Some(0));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["jobs"], 5);
    assert_eq!(report["critical_path"], 18);
    // source->1, source->2, 1->4, 2->3, 2->5, 3->sink, 4->sink, 5->sink
    assert_eq!(report["edges"], 8);
    assert_eq!(report["capacities"][0], 4);
}

#[test]
fn unknown_format_is_rejected() {
    let instance = write_instance(FIVE_JOBS);
    let path = instance.path().to_str().unwrap();

    let output = pcmax(&["check", path, "--format", "yaml"]);
    assert_eq!(output.status.code(), Some(1));
}
