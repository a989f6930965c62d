//! Tests for scoring local image pairs.

#![allow(clippy::unwrap_used, clippy::float_cmp, deprecated)]

use std::path::PathBuf;

use assert_cmd::Command;
use iqa_test_support::SyntheticImageBuilder;
use predicates::prelude::*;
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

fn save(dir: &TempDir, name: &str, img: &image::DynamicImage) -> PathBuf {
    let path = dir.path().join(name);
    img.save(&path).unwrap();
    path
}

fn score(home: &TempDir, original: &PathBuf, enhanced: &PathBuf) -> Value {
    let output = iqa(home)
        .arg("score")
        .arg(original)
        .arg(enhanced)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_identical_pair_scores_one() {
    let dir = tempfile::tempdir().unwrap();
    let img = SyntheticImageBuilder::rgb_ramp(64, 48);
    let a = save(&dir, "a.png", &img);
    let b = save(&dir, "b.png", &img);

    let result = score(&dir, &a, &b);

    assert_eq!(result["similarity"], 1.0);
    assert_eq!(result["resized"], false);
}

#[test]
fn test_uniform_enhanced_scores_reference_distortion() {
    let dir = tempfile::tempdir().unwrap();
    let a = save(&dir, "orig.png", &SyntheticImageBuilder::checkerboard(32, 32));
    let b = save(&dir, "enh.png", &SyntheticImageBuilder::uniform_gray(32, 32, 90));

    let result = score(&dir, &a, &b);

    assert_eq!(result["distortion"], 40.0);
}

#[test]
fn test_mismatched_dimensions_are_reconciled() {
    let dir = tempfile::tempdir().unwrap();
    let a = save(&dir, "orig.png", &SyntheticImageBuilder::horizontal_gradient(100, 100));
    let b = save(&dir, "enh.png", &SyntheticImageBuilder::horizontal_gradient(120, 130));

    let result = score(&dir, &a, &b);

    assert_eq!(result["resized"], true);
    let similarity = result["similarity"].as_f64().unwrap();
    assert!((-1.0..=1.0).contains(&similarity));
}

#[test]
fn test_output_names_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let img = SyntheticImageBuilder::noise(40, 40, 11);
    let a = save(&dir, "left.png", &img);
    let b = save(&dir, "right.png", &img);

    let result = score(&dir, &a, &b);

    assert!(result["original"].as_str().unwrap().ends_with("left.png"));
    assert!(result["enhanced"].as_str().unwrap().ends_with("right.png"));
}

#[test]
fn test_pretty_output() {
    let dir = tempfile::tempdir().unwrap();
    let img = SyntheticImageBuilder::checkerboard(16, 16);
    let a = save(&dir, "a.png", &img);

    iqa(&dir)
        .arg("score")
        .arg(&a)
        .arg(&a)
        .arg("--pretty")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{\n"));
}

#[test]
fn test_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let a = save(&dir, "a.png", &SyntheticImageBuilder::checkerboard(16, 16));

    iqa(&dir)
        .arg("score")
        .arg(&a)
        .arg(dir.path().join("missing.png"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to compare"));
}

#[test]
fn test_image_smaller_than_window_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let tiny = SyntheticImageBuilder::uniform_gray(4, 4, 128);
    let a = save(&dir, "a.png", &tiny);
    let b = save(&dir, "b.png", &tiny);

    iqa(&dir).arg("score").arg(&a).arg(&b).assert().code(2);
}

#[test]
fn test_config_window_size_applies() {
    let dir = tempfile::tempdir().unwrap();
    let small = SyntheticImageBuilder::uniform_gray(5, 5, 128);
    let a = save(&dir, "a.png", &small);
    std::fs::write(dir.path().join(".iqa.toml"), "[similarity]\nwindow_size = 3\n").unwrap();

    // A 5x5 image fails with the default 7x7 window but fits a 3x3 one.
    let result = score(&dir, &a, &a);

    assert_eq!(result["similarity"], 1.0);
}
