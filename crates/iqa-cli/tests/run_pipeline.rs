//! End-to-end runs against a SQLite store and a local image server.

#![allow(clippy::unwrap_used, clippy::float_cmp, deprecated)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use iqa_test_support::{png_bytes, StaticHttpServer, SyntheticImageBuilder};
use predicates::prelude::*;
use rusqlite::{params, Connection};
use serde_json::Value;
use tempfile::TempDir;

fn iqa(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("iqa").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("DATABASE_URL");
    cmd
}

struct Fixture {
    home: TempDir,
    db: PathBuf,
    server: StaticHttpServer,
}

impl Fixture {
    /// Store with `count` eligible rows, each pointing at served images.
    fn new(count: usize) -> Self {
        let home = tempfile::tempdir().unwrap();
        let db = home.path().join("photos.db");
        let server = StaticHttpServer::start().unwrap();

        let conn = Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE photos (
                id INTEGER PRIMARY KEY,
                cloudinary_url TEXT,
                enhanced_url TEXT,
                ssim_score REAL,
                brisque_score REAL
            )",
        )
        .unwrap();

        let original = png_bytes(&SyntheticImageBuilder::noise(48, 48, 5));
        let enhanced = png_bytes(&SyntheticImageBuilder::noise(48, 48, 6));
        for n in 1..=count {
            let orig_path = format!("/orig/{n}.png");
            let enh_path = format!("/enh/{n}.png");
            server.serve(&orig_path, original.clone());
            server.serve(&enh_path, enhanced.clone());
            conn.execute(
                "INSERT INTO photos (id, cloudinary_url, enhanced_url) VALUES (?1, ?2, ?3)",
                params![n as i64, server.url(&orig_path), server.url(&enh_path)],
            )
            .unwrap();
        }

        Self { home, db, server }
    }

    fn db_url(&self) -> &str {
        self.db.to_str().unwrap()
    }

    fn scratch(&self) -> PathBuf {
        self.home.path().join("scratch")
    }

    fn run(&self) -> Command {
        let mut cmd = iqa(&self.home);
        cmd.args(["run", "--quiet", "--database-url", self.db_url()])
            .arg("--scratch-dir")
            .arg(self.scratch());
        cmd
    }

    fn scores(&self, id: i64) -> (Option<f64>, Option<f64>) {
        let conn = Connection::open(&self.db).unwrap();
        conn.query_row(
            "SELECT ssim_score, brisque_score FROM photos WHERE id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap()
    }
}

fn json_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn dir_is_empty(path: &Path) -> bool {
    !path.exists() || std::fs::read_dir(path).unwrap().next().is_none()
}

#[test]
fn test_run_scores_every_item() {
    let fx = Fixture::new(3);

    let output = fx.run().output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let reports = json_lines(&output.stdout);
    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r["status"] == "scored"));
    assert_eq!(reports[0]["id"], "1");

    for id in 1..=3 {
        let (similarity, distortion) = fx.scores(id);
        assert!(similarity.is_some());
        assert!(distortion.is_some());
    }
}

#[test]
fn test_failed_download_is_skipped_and_retried_later() {
    let fx = Fixture::new(3);
    fx.server.respond("/enh/2.png", 404, Vec::new());

    let output = fx.run().output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let reports = json_lines(&output.stdout);
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[1]["status"], "skipped");
    assert!(reports[1]["reason"].as_str().unwrap().contains("enh/2.png"));
    assert_eq!(fx.scores(2), (None, None));
    assert!(fx.scores(3).0.is_some());

    fx.server
        .serve("/enh/2.png", png_bytes(&SyntheticImageBuilder::noise(48, 48, 6)));
    let output = fx.run().output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let reports = json_lines(&output.stdout);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["id"], "2");
}

#[test]
fn test_second_run_has_nothing_to_do() {
    let fx = Fixture::new(2);
    fx.run().assert().success();

    fx.run().assert().success().stdout(predicate::str::is_empty());
}

#[test]
fn test_dry_run_fetches_nothing() {
    let fx = Fixture::new(2);

    let output = fx.run().arg("--dry-run").output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let reports = json_lines(&output.stdout);
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r["status"] == "pending"));
    assert!(fx.server.hits().is_empty());
    assert_eq!(fx.scores(1), (None, None));
}

#[test]
fn test_limit_caps_selection() {
    let fx = Fixture::new(4);

    let output = fx.run().args(["--limit", "2"]).output().unwrap();

    assert_eq!(json_lines(&output.stdout).len(), 2);
    assert_eq!(fx.scores(4), (None, None));
}

#[test]
fn test_json_format_prints_summary() {
    let fx = Fixture::new(2);

    let output = fx.run().args(["--format", "json"]).output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["selected"], 2);
    assert_eq!(summary["scored"], 2);
    assert_eq!(summary["skipped"], 0);
    assert_eq!(summary["items"].as_array().unwrap().len(), 2);
}

#[test]
fn test_scratch_directory_left_empty() {
    let fx = Fixture::new(2);
    fx.server.respond("/orig/1.png", 500, Vec::new());

    fx.run().assert().code(1);

    assert!(dir_is_empty(&fx.scratch()));
}

#[test]
fn test_missing_table_is_fatal() {
    let fx = Fixture::new(1);

    fx.run()
        .args(["--table", "enhancements"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("store unavailable"));
}

#[test]
fn test_default_command_runs_pipeline() {
    let fx = Fixture::new(1);

    iqa(&fx.home)
        .args(["--quiet", "--database-url", fx.db_url()])
        .arg("--scratch-dir")
        .arg(fx.scratch())
        .assert()
        .success();

    assert!(fx.scores(1).0.is_some());
}

#[test]
fn test_database_url_from_environment() {
    let fx = Fixture::new(1);

    iqa(&fx.home)
        .env("DATABASE_URL", fx.db_url())
        .args(["run", "--quiet"])
        .arg("--scratch-dir")
        .arg(fx.scratch())
        .assert()
        .success();

    assert!(fx.scores(1).0.is_some());
}

#[test]
fn test_progress_lines_on_stderr() {
    let fx = Fixture::new(1);

    iqa(&fx.home)
        .args(["run", "--database-url", fx.db_url()])
        .arg("--scratch-dir")
        .arg(fx.scratch())
        .assert()
        .success()
        .stderr(
            predicate::str::contains("Found 1 items to evaluate")
                .and(predicate::str::contains("Done: 1 scored, 0 skipped")),
        );
}

#[test]
fn test_pending_lists_eligible_items() {
    let fx = Fixture::new(3);
    fx.run().args(["--limit", "1"]).assert().success();

    let output = iqa(&fx.home)
        .args(["pending", "--database-url", fx.db_url()])
        .output()
        .unwrap();

    assert!(output.status.success());
    let items = json_lines(&output.stdout);
    let ids: Vec<_> = items.iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["2", "3"]);
}

#[test]
fn test_stats_reports_progress() {
    let fx = Fixture::new(3);
    fx.run().args(["--limit", "2"]).assert().success();

    let output = iqa(&fx.home)
        .args(["stats", "--database-url", fx.db_url()])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stats: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["scored"], 2);
    assert_eq!(stats["pending"], 1);
}
