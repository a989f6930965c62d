//! CLI argument validation tests.
//!
//! Tests command-line argument parsing, validation, and error handling.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated from the caller's environment and config files.
fn iqa(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("iqa").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("DATABASE_URL");
    cmd
}

// === Help and Version ===

#[test]
fn test_help_lists_subcommands() {
    let home = tempfile::tempdir().unwrap();
    iqa(&home).arg("--help").assert().success().stdout(
        predicate::str::contains("run")
            .and(predicate::str::contains("pending"))
            .and(predicate::str::contains("score"))
            .and(predicate::str::contains("stats")),
    );
}

#[test]
fn test_run_help_mentions_env() {
    let home = tempfile::tempdir().unwrap();
    iqa(&home)
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--database-url")
                .and(predicate::str::contains("DATABASE_URL")),
        );
}

#[test]
fn test_version() {
    let home = tempfile::tempdir().unwrap();
    iqa(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// === Store Selection ===

#[test]
fn test_missing_store_is_fatal() {
    let home = tempfile::tempdir().unwrap();
    iqa(&home)
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No store configured"));
}

#[test]
fn test_default_command_without_store_is_fatal() {
    let home = tempfile::tempdir().unwrap();
    iqa(&home)
        .assert()
        .code(2)
        .stderr(predicate::str::starts_with("error:"));
}

#[test]
fn test_unsupported_store_scheme() {
    let home = tempfile::tempdir().unwrap();
    iqa(&home)
        .args(["pending", "--database-url", "mysql://db/app"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unsupported store URL"));
}

#[test]
fn test_invalid_table_name() {
    let home = tempfile::tempdir().unwrap();
    let db = home.path().join("photos.db");
    iqa(&home)
        .args(["stats", "--database-url", db.to_str().unwrap()])
        .args(["--table", "photos; DROP TABLE photos"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid table name"));
}

// === Format and Flag Validation ===

#[test]
fn test_invalid_format_rejected() {
    let home = tempfile::tempdir().unwrap();
    iqa(&home)
        .args(["run", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("json").or(predicate::str::contains("jsonl")));
}

#[test]
fn test_zero_timeout_rejected() {
    let home = tempfile::tempdir().unwrap();
    iqa(&home)
        .args(["run", "--timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 1 second"));
}

#[test]
fn test_non_numeric_limit_rejected() {
    let home = tempfile::tempdir().unwrap();
    iqa(&home)
        .args(["run", "--limit", "all"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid"));
}

#[test]
fn test_score_requires_two_paths() {
    let home = tempfile::tempdir().unwrap();
    iqa(&home)
        .args(["score", "only-one.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ENHANCED"));
}

#[test]
fn test_unknown_subcommand_rejected() {
    let home = tempfile::tempdir().unwrap();
    iqa(&home).arg("check").assert().failure();
}

// === Verbosity ===

#[test]
fn test_verbosity_levels_accepted() {
    let home = tempfile::tempdir().unwrap();
    for flag in ["-v", "-vv", "-vvv"] {
        iqa(&home)
            .args(["pending", flag, "--database-url", "sqlite::memory:"])
            .assert()
            .success();
    }
}

#[test]
fn test_debug_logging_goes_to_stderr() {
    let home = tempfile::tempdir().unwrap();
    iqa(&home)
        .args(["-vv", "pending", "--database-url", "sqlite::memory:"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("DEBUG"));
}
