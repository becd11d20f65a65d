//! CLI integration tests.
//!
//! These tests exercise the CLI commands end-to-end against temporary projects.

use rvsn_test_utils::{BuiltTestProject, TestProject};
use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

fn rvsn(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rvsn"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn rvsn_json(project: &BuiltTestProject, args: &[&str]) -> Value {
    let output = rvsn(project.path(), args);
    assert!(
        output.status.success(),
        "rvsn {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("Output should be JSON")
}

#[test]
fn test_version_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_rvsn"))
        .arg("version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("rvsn"));
}

#[test]
fn test_help_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_rvsn"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Lightweight version control"));
    assert!(stdout.contains("commit"));
    assert!(stdout.contains("revert"));
}

#[test]
fn test_commit_and_log() {
    let project = TestProject::new().with_file("a.txt", "hello").build();

    let commit = rvsn_json(&project, &["commit", "first", "--comment", "details"]);
    assert_eq!(commit["title"], "first");
    assert_eq!(commit["comment"], "details");
    assert_eq!(commit["previous_commit_id"], "none");
    let id = commit["id"].as_str().unwrap().to_string();

    let log = rvsn_json(&project, &["log"]);
    assert_eq!(log.as_array().unwrap().len(), 1);
    assert_eq!(log[0]["id"], id.as_str());

    let shown = rvsn_json(&project, &["show", &id]);
    assert_eq!(shown["title"], "first");

    let after = rvsn_json(&project, &["log", "--after", &id]);
    assert!(after.as_array().unwrap().is_empty());
}

#[test]
fn test_cat_at_older_commit() {
    let project = TestProject::new().with_file("a.txt", "hello").build();
    let commit = rvsn_json(&project, &["commit", "first"]);
    let id = commit["id"].as_str().unwrap().to_string();
    project.write_file("a.txt", "hello world");
    rvsn_json(&project, &["commit", "second"]);

    let content = rvsn_json(&project, &["cat", "a.txt", "--at", &id]);
    assert_eq!(content["content"], "hello");
    assert_eq!(content["base64"], false);
    assert_eq!(content["type"], "file");

    let changes = rvsn_json(&project, &["changes", "--from", &id, "--to", "latest"]);
    assert_eq!(changes["modified"][0]["path"], "a.txt");
}

#[test]
fn test_ls_include_root() {
    let project = TestProject::new()
        .with_file("a.txt", "a")
        .with_dir("d")
        .build();

    let nodes = rvsn_json(&project, &["ls", "--include-root"]);
    assert_eq!(nodes[0]["id"], "/");
    let children = nodes[0]["children"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[1]["type"], "folder");
}

#[test]
fn test_revert_command() {
    let project = TestProject::new().with_file("a.txt", "hello").build();
    let commit = rvsn_json(&project, &["commit", "first"]);
    let id = commit["id"].as_str().unwrap().to_string();
    project.write_file("a.txt", "edited");
    project.write_file("b.txt", "new");

    let stats = rvsn_json(&project, &["revert", "--to", &id]);
    assert_eq!(stats["removed"], 1);

    assert_eq!(project.read_file("a.txt"), "hello");
    assert!(!project.file_exists("b.txt"));
}

#[test]
fn test_diff_command() {
    let project = TestProject::new().with_file("a.txt", "hello\n").build();
    rvsn_json(&project, &["commit", "first"]);
    project.write_file("a.txt", "hello world\n");

    let output = rvsn(project.path(), &["diff", "a.txt"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("+hello world"));
}

#[test]
fn test_download_to_file() {
    let project = TestProject::new().with_file("a.txt", "payload").build();
    rvsn_json(&project, &["commit", "first"]);
    let out = project.path().join("out.bin");

    let download = rvsn_json(
        &project,
        &["download", "a.txt", "--at", "latest", "--output", out.to_str().unwrap()],
    );
    assert_eq!(download["name"], "a.txt");
    assert_eq!(std::fs::read(&out).unwrap(), b"payload");
}

#[test]
fn test_unknown_commit_exit_code() {
    let project = TestProject::new().with_file("a.txt", "hello").build();

    let output = rvsn(project.path(), &["show", "0123456789"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let project = TestProject::new()
        .with_config(r#"{"version_control_folder": ""}"#)
        .build();

    let output = rvsn(project.path(), &["log"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot initialize version control"));
}
