//! CLI surface tests for the toolgate binary
//!
//! These exercise argument parsing and the failure paths that need no live
//! MCP server. End-to-end flows against a real server live in
//! toolgate-mcp's integration tests.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn toolgate() -> Command {
    Command::cargo_bin("toolgate").expect("toolgate binary should build")
}

#[test]
fn test_help_lists_subcommands() {
    toolgate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("review"))
        .stdout(predicate::str::contains("compare"))
        .stdout(predicate::str::contains("webserver"));
}

#[test]
fn test_version_flag() {
    toolgate()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("toolgate"));
}

#[test]
fn test_review_requires_server() {
    toolgate()
        .arg("review")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--server"));
}

#[test]
fn test_review_rejects_invalid_scheme() {
    toolgate()
        .args(["review", "--server", "ftp://host/tools", "--yes"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid scheme"));
}

#[test]
fn test_review_fails_for_missing_stdio_executable() {
    toolgate()
        .args([
            "review",
            "--server",
            "stdio:definitely-not-a-real-binary-4x9",
            "--yes",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not reachable"));
}

#[test]
fn test_compare_reports_missing_config_file() {
    toolgate()
        .args([
            "compare",
            "--server",
            "stdio:whatever",
            "--config",
            "/nonexistent/toolgate_config.yaml",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to load policy"));
}

#[test]
fn test_compare_rejects_malformed_config() {
    let mut file = NamedTempFile::new().expect("temp file");
    // Section present but not a mapping
    writeln!(file, "config_version: 1").unwrap();
    writeln!(file, "allowed_tools: []").unwrap();
    writeln!(file, "malicious_tools: {{}}").unwrap();
    writeln!(file, "denied_tools: {{}}").unwrap();

    toolgate()
        .args([
            "compare",
            "--server",
            "stdio:whatever",
            "--config",
            file.path().to_str().unwrap(),
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must be a mapping"));
}

#[test]
fn test_compare_rejects_config_missing_section() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "config_version: 1").unwrap();
    writeln!(file, "allowed_tools: {{}}").unwrap();
    writeln!(file, "malicious_tools: {{}}").unwrap();

    toolgate()
        .args([
            "compare",
            "--server",
            "stdio:whatever",
            "--config",
            file.path().to_str().unwrap(),
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Missing required section: 'denied_tools'",
        ));
}
