//! Corruption recovery tests for the flexflow binary.
//!
//! These tests verify the system can handle:
//! - Corrupted slot files
//! - Empty slot files
//! - Slots holding the wrong JSON shape

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("flexflow"))
}

fn setup_test_dir() -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(
        temp_dir.path().join("config.toml"),
        "[training]\ntick_millis = 0\nsound = false\n",
    )
    .unwrap();
    (temp_dir, data_dir)
}

fn cli_in(temp_dir: &TempDir, data_dir: &Path) -> Command {
    let mut cmd = cli();
    cmd.arg("--data-dir")
        .arg(data_dir)
        .arg("--config")
        .arg(temp_dir.path().join("config.toml"));
    cmd
}

#[test]
fn test_corrupted_plans_file_reseeds() {
    let (temp_dir, data_dir) = setup_test_dir();
    fs::write(data_dir.join("plans.json"), "{ invalid json }}}}").unwrap();

    cli_in(&temp_dir, &data_dir)
        .arg("plans")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan-chest"));

    let contents = fs::read_to_string(data_dir.join("plans.json")).unwrap();
    let plans: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(plans.as_array().unwrap().len(), 3);
}

#[test]
fn test_corrupted_records_file() {
    let (temp_dir, data_dir) = setup_test_dir();
    fs::write(data_dir.join("records.json"), "[{\"id\": 1, \"date\": ").unwrap();

    cli_in(&temp_dir, &data_dir)
        .arg("records")
        .assert()
        .success()
        .stdout(predicate::str::contains("no workouts"));

    // A finished session starts a fresh list
    cli_in(&temp_dir, &data_dir)
        .args(["train", "plan-legs-core", "--auto"])
        .assert()
        .success();

    let contents = fs::read_to_string(data_dir.join("records.json")).unwrap();
    let records: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1);
}

#[test]
fn test_empty_files_treated_as_missing() {
    let (temp_dir, data_dir) = setup_test_dir();
    for file in ["actions.json", "plans.json", "records.json", "profile.json"] {
        fs::write(data_dir.join(file), "").unwrap();
    }

    cli_in(&temp_dir, &data_dir)
        .args(["actions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("act-squat"));

    cli_in(&temp_dir, &data_dir)
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Theme:    default"));
}

#[test]
fn test_wrong_shape_profile() {
    let (temp_dir, data_dir) = setup_test_dir();
    fs::write(data_dir.join("profile.json"), "[1, 2, 3]").unwrap();

    cli_in(&temp_dir, &data_dir)
        .args(["profile", "set", "--body-fat", "18.5"])
        .assert()
        .success();

    let contents = fs::read_to_string(data_dir.join("profile.json")).unwrap();
    let profile: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(profile["bodyFat"], 18.5);
    assert!(profile["height"].is_null());
}

#[test]
fn test_invalid_config_fails() {
    let (temp_dir, data_dir) = setup_test_dir();
    let bad_config = temp_dir.path().join("bad.toml");
    fs::write(&bad_config, "[share]\norigin = \"ftp://nowhere\"\n").unwrap();

    cli()
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&bad_config)
        .arg("plans")
        .assert()
        .failure();
}
