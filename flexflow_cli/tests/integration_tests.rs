//! Integration tests for the flexflow binary.
//!
//! These tests verify end-to-end behavior including:
//! - Seeding and listing plans
//! - Creating and editing plans
//! - Share links and import
//! - Training sessions and the records calendar

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("flexflow"))
}

/// Command with an isolated data dir and a silent, instant-tick config
fn cli_in(temp_dir: &TempDir) -> Command {
    let config_path = temp_dir.path().join("config.toml");
    if !config_path.exists() {
        fs::write(&config_path, "[training]\ntick_millis = 0\nsound = false\n")
            .expect("Failed to write config");
    }
    let mut cmd = cli();
    cmd.arg("--data-dir")
        .arg(data_dir(temp_dir))
        .arg("--config")
        .arg(config_path);
    cmd
}

fn data_dir(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("data")
}

fn read_slot(temp_dir: &TempDir, file: &str) -> Value {
    let path = data_dir(temp_dir).join(file);
    let contents = fs::read_to_string(&path).expect("Failed to read slot");
    serde_json::from_str(&contents).expect("Slot is not valid JSON")
}

fn plan_ids(temp_dir: &TempDir) -> Vec<String> {
    read_slot(temp_dir, "plans.json")
        .as_array()
        .expect("plans.json is not an array")
        .iter()
        .map(|p| p["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout planning"));
}

#[test]
fn test_plans_seeds_starter_data() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .arg("plans")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan-chest"))
        .stdout(predicate::str::contains("周一胸部强化训练"))
        .stdout(predicate::str::contains("~18 min"));

    assert!(data_dir(&temp_dir).join("plans.json").exists());
    assert_eq!(plan_ids(&temp_dir), vec!["plan-chest", "plan-legs-core", "plan-full"]);
}

#[test]
fn test_show_plan() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .arg("show")
        .arg("plan-legs-core")
        .assert()
        .success()
        .stdout(predicate::str::contains("深蹲"))
        .stdout(predicate::str::contains("4 x 10次 @ 60kg, rest 90s"));
}

#[test]
fn test_create_plan_prepends() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .args(["create-plan", "--name", "Arms", "--action", "act-curl", "--action", "act-pushup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created plan Arms"));

    let plans = read_slot(&temp_dir, "plans.json");
    assert_eq!(plans.as_array().unwrap().len(), 4);
    assert_eq!(plans[0]["name"], "Arms");
    assert_eq!(plans[0]["actions"][0]["actionId"], "act-curl");
    assert_eq!(plans[0]["actions"][0]["reps"], "12次");
    assert_eq!(plans[0]["actions"][0]["sets"], 3);
    assert_eq!(plans[0]["actions"][0]["restSeconds"], 60);
    assert_eq!(plans[0]["actions"][0]["weight"], "—");
}

#[test]
fn test_create_plan_blank_name_is_rejected() {
    let temp_dir = setup_test_dir();
    cli_in(&temp_dir).arg("plans").assert().success();

    cli_in(&temp_dir)
        .args(["create-plan", "--name", "   ", "--action", "act-curl"])
        .assert()
        .success()
        .stderr(predicate::str::contains("plan name is required"));

    assert_eq!(plan_ids(&temp_dir).len(), 3);
}

#[test]
fn test_create_plan_unknown_action_is_rejected() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .args(["create-plan", "--name", "X", "--action", "act-nope"])
        .assert()
        .success()
        .stderr(predicate::str::contains("unknown action id act-nope"));
}

#[test]
fn test_edit_plan_updates_in_place() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .args([
            "edit-plan", "plan-chest", "--name", "Chest v2", "--step", "act-bench", "--sets", "5",
            "--rest", "5", "--remove", "act-pushup", "--move", "2:1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved plan Chest v2 (2 actions)"));

    let plans = read_slot(&temp_dir, "plans.json");
    let chest = &plans[0];
    assert_eq!(chest["id"], "plan-chest");
    assert_eq!(chest["name"], "Chest v2");
    assert_eq!(chest["actions"][0]["actionId"], "act-row");
    assert_eq!(chest["actions"][1]["actionId"], "act-bench");
    assert_eq!(chest["actions"][1]["sets"], 5);
    // Rest below the floor is clamped on save
    assert_eq!(chest["actions"][1]["restSeconds"], 10);
    assert_eq!(chest["actions"][0]["sets"], 4);
    assert_eq!(plan_ids(&temp_dir).len(), 3);
}

#[test]
fn test_delete_plan() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .args(["delete-plan", "plan-full", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted plan"));

    assert_eq!(plan_ids(&temp_dir), vec!["plan-chest", "plan-legs-core"]);
}

#[test]
fn test_delete_plan_cancelled() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .args(["delete-plan", "plan-full"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled"));

    assert_eq!(plan_ids(&temp_dir).len(), 3);
}

#[test]
fn test_share_then_import() {
    let temp_dir = setup_test_dir();

    let output = cli_in(&temp_dir)
        .args(["share", "plan-chest"])
        .output()
        .expect("Failed to run share");
    assert!(output.status.success());
    let link = String::from_utf8(output.stdout).unwrap().trim().to_string();
    assert!(link.starts_with("https://flexflow.app/import?data="));

    cli_in(&temp_dir)
        .arg("import")
        .arg(&link)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported plan 周一胸部强化训练"));

    let plans = read_slot(&temp_dir, "plans.json");
    assert_eq!(plans.as_array().unwrap().len(), 4);
    assert_eq!(plans[0]["name"], "周一胸部强化训练");
    assert_ne!(plans[0]["id"], "plan-chest");
    assert_eq!(plans[0]["actions"], plans[1]["actions"]);
}

#[test]
fn test_import_garbage_link() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .args(["import", "https://flexflow.app/import?data=%%%not-base64"])
        .assert()
        .success()
        .stderr(predicate::str::contains("link is invalid"));

    cli_in(&temp_dir)
        .args(["import", "definitely not a link"])
        .assert()
        .success()
        .stderr(predicate::str::contains("link is invalid"));

    assert_eq!(plan_ids(&temp_dir).len(), 3);
}

fn link_for(name: &str, sets: u32, rest_seconds: u32) -> String {
    let plan = flexflow_core::WorkoutPlan {
        id: "shared".into(),
        name: name.into(),
        actions: vec![flexflow_core::WorkoutActionStep {
            action_id: "act-squat".into(),
            weight: String::new(),
            reps: String::new(),
            sets,
            rest_seconds,
        }],
    };
    flexflow_core::share_link("https://flexflow.app", &plan).expect("Failed to build link")
}

#[test]
fn test_import_blank_name_is_rejected() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .arg("import")
        .arg(link_for("   ", 3, 60))
        .assert()
        .success()
        .stderr(predicate::str::contains("shared plan has no name"));

    assert_eq!(plan_ids(&temp_dir).len(), 3);
}

#[test]
fn test_import_coerces_out_of_range_steps() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .arg("import")
        .arg(link_for("Crafted", 0, 0))
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported plan Crafted"));

    let plans = read_slot(&temp_dir, "plans.json");
    let step = &plans[0]["actions"][0];
    assert_eq!(plans[0]["name"], "Crafted");
    assert_ne!(plans[0]["id"], "shared");
    assert_eq!(step["sets"], 1);
    assert_eq!(step["restSeconds"], 30);
    assert_eq!(step["weight"], "—");
    assert_eq!(step["reps"], "10次");
}

#[test]
fn test_plans_lists_extreme_import() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .arg("import")
        .arg(link_for("Marathon", u32::MAX, u32::MAX))
        .assert()
        .success();

    cli_in(&temp_dir)
        .arg("plans")
        .assert()
        .success()
        .stdout(predicate::str::contains("Marathon"));
}

#[test]
fn test_import_missing_data_param() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .args(["import", "https://flexflow.app/import?other=1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("missing data parameter"));
}

#[test]
fn test_train_auto_writes_one_record() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .args(["train", "plan-chest", "--auto"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout complete"));

    let records = read_slot(&temp_dir, "records.json");
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["planId"], "plan-chest");
    assert_eq!(records[0]["planName"], "周一胸部强化训练");
    assert!(records[0]["date"].as_str().unwrap().len() == 10);
}

#[test]
fn test_train_quit_records_nothing() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .args(["train", "plan-chest"])
        .write_stdin("\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing recorded"));

    assert!(!data_dir(&temp_dir).join("records.json").exists());
}

#[test]
fn test_train_unknown_plan() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .args(["train", "no-such-plan", "--auto"])
        .assert()
        .success()
        .stderr(predicate::str::contains("plan not found"));
}

#[test]
fn test_records_calendar_and_export() {
    let temp_dir = setup_test_dir();
    cli_in(&temp_dir)
        .args(["train", "plan-full", "--auto"])
        .assert()
        .success();

    let csv_path: PathBuf = temp_dir.path().join("export").join("records.csv");
    cli_in(&temp_dir)
        .arg("records")
        .arg("--export")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("周五全身循环"))
        .stdout(predicate::str::contains("Exported 1 records"));

    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("id,planId,planName,date"));
    assert!(csv.contains("plan-full"));
}

#[test]
fn test_records_month_grid() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .args(["records", "--month", "2024-06", "--date", "2024-06-15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-06"))
        .stdout(predicate::str::contains("Su  Mo  Tu  We  Th  Fr  Sa"))
        .stdout(predicate::str::contains("2024-06-15: no workouts"));

    cli_in(&temp_dir)
        .args(["records", "--month", "June"])
        .assert()
        .success()
        .stderr(predicate::str::contains("invalid date"));
}

#[test]
fn test_actions_add_and_delete() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .args(["actions", "add", "--name", "Lunge"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added action Lunge"));

    let actions = read_slot(&temp_dir, "actions.json");
    let lunge = actions
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["name"] == "Lunge")
        .expect("Lunge not saved");
    assert_eq!(lunge["targetPart"], "未设定");

    cli_in(&temp_dir)
        .args(["actions", "delete", "act-bench"])
        .assert()
        .success()
        .stdout(predicate::str::contains("still list it"));

    // Plans keep the dangling step and still render
    cli_in(&temp_dir)
        .args(["show", "plan-chest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown action"));
}

#[test]
fn test_profile_set_and_show() {
    let temp_dir = setup_test_dir();

    cli_in(&temp_dir)
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Theme:    default"));

    cli_in(&temp_dir)
        .args(["profile", "set", "--height", "175", "--theme", "dark"])
        .assert()
        .success();

    cli_in(&temp_dir)
        .args(["profile", "set", "--weight", "70.5"])
        .assert()
        .success();

    let profile = read_slot(&temp_dir, "profile.json");
    assert_eq!(profile["height"], 175.0);
    assert_eq!(profile["weight"], 70.5);
    assert!(profile["bodyFat"].is_null());
    assert_eq!(profile["theme"], "dark");
}

#[test]
fn test_custom_share_origin() {
    let temp_dir = setup_test_dir();
    let config_path: &Path = &temp_dir.path().join("custom.toml");
    fs::write(config_path, "[share]\norigin = \"http://localhost:5173/\"\n").unwrap();

    cli()
        .arg("--data-dir")
        .arg(data_dir(&temp_dir))
        .arg("--config")
        .arg(config_path)
        .args(["share", "plan-legs-core"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("http://localhost:5173/import?data="));
}
