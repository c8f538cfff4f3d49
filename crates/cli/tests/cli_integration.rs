//! CLI integration tests.
//!
//! Uses `assert_cmd` to spawn the `ecoquest` binary against a temporary data
//! directory and verify exit codes, stdout and stderr.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper: an `ecoquest` command bound to `data_dir`, with a seeded RNG.
fn ecoquest(data_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("ecoquest");
    cmd.arg("--data-dir")
        .arg(data_dir)
        .env_remove("RUST_LOG")
        .env_remove("ECOQUEST_UNLOCK_DELAY_MS");
    cmd
}

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("ecoquest.toml"), "impact_seed = 11\n").unwrap();
    dir
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

// ──────────────────────────────────────────────
// 1. Help and catalog
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    let dir = data_dir();
    ecoquest(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "EcoQuest sustainability challenge tracker",
        ));
}

#[test]
fn challenges_lists_both_catalog_entries() {
    let dir = data_dir();
    ecoquest(dir.path())
        .arg("challenges")
        .assert()
        .success()
        .stdout(predicate::str::contains("water-conservation"))
        .stdout(predicate::str::contains("zero-waste"));
}

#[test]
fn show_fresh_challenge_has_day_one_open() {
    let dir = data_dir();
    let v = json_stdout(
        ecoquest(dir.path()).args(["--output", "json", "show", "water-conservation"]),
    );
    assert_eq!(v["status"], "not-started");
    assert_eq!(v["percentage"], 0.0);
    assert_eq!(v["progress"]["current_day"], 1);
    assert_eq!(v["progress"]["tasks"][0]["locked"], false);
    assert_eq!(v["progress"]["tasks"][1]["locked"], true);
}

#[test]
fn show_unknown_challenge_fails() {
    let dir = data_dir();
    ecoquest(dir.path())
        .args(["show", "ocean-cleanup"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown challenge"));
}

// ──────────────────────────────────────────────
// 2. Completing tasks
// ──────────────────────────────────────────────

#[test]
fn complete_first_task_persists_across_runs() {
    let dir = data_dir();
    ecoquest(dir.path())
        .args(["complete", "water-conservation", "tooth-brushing", "--photo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task Completed!"))
        .stdout(predicate::str::contains("You earned 30 points!"));

    let v = json_stdout(ecoquest(dir.path()).args(["--output", "json", "account"]));
    assert_eq!(v["points"], 30);
    assert_eq!(v["level"], 1);
    assert_eq!(v["activeChallenges"][0], "water-conservation");

    let v = json_stdout(
        ecoquest(dir.path()).args(["--output", "json", "show", "water-conservation"]),
    );
    assert_eq!(v["progress"]["current_day"], 2);
    assert_eq!(v["progress"]["tasks"][1]["locked"], false);
}

#[test]
fn locked_task_is_rejected() {
    let dir = data_dir();
    ecoquest(dir.path())
        .args(["complete", "zero-waste", "trash-audit", "--proof", "2kg"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Task Locked"))
        .stderr(predicate::str::contains("is locked (day 3)"));
}

#[test]
fn missing_photo_ack_is_rejected() {
    let dir = data_dir();
    ecoquest(dir.path())
        .args(["complete", "zero-waste", "refuse-plastic"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Data Required"))
        .stderr(predicate::str::contains("requires photo proof"));
}

#[test]
fn full_zero_waste_run_earns_badge() {
    let dir = data_dir();
    let tasks = [
        ("refuse-plastic", None),
        ("start-composting", None),
        ("trash-audit", Some("3.2 kg")),
        ("upcycling-project", None),
        ("buy-nothing", Some("borrowed a drill")),
        ("clothing-swap", None),
        ("zero-waste-kit", None),
    ];
    let mut last = serde_json::Value::Null;
    for (task, proof) in tasks {
        let mut cmd = ecoquest(dir.path());
        cmd.args(["--output", "json", "complete", "zero-waste", task]);
        match proof {
            Some(text) => cmd.args(["--proof", text]),
            None => cmd.arg("--photo"),
        };
        last = json_stdout(&mut cmd);
    }
    assert_eq!(last["challengeComplete"], true);
    assert_eq!(last["badge"], "zero-waste-complete");

    let v = json_stdout(ecoquest(dir.path()).args(["--output", "json", "account"]));
    assert_eq!(v["points"], 301);
    assert_eq!(v["impact"]["co2Saved"], 25);
    assert_eq!(v["badges"], serde_json::json!(["zero-waste-complete"]));
    assert_eq!(v["completedChallenges"], serde_json::json!(["zero-waste"]));

    ecoquest(dir.path())
        .args(["complete", "zero-waste", "refuse-plastic", "--photo"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Already Completed"));
}

// ──────────────────────────────────────────────
// 3. Account operations
// ──────────────────────────────────────────────

#[test]
fn start_then_reset() {
    let dir = data_dir();
    ecoquest(dir.path())
        .args(["start", "zero-waste"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Started zero-waste"));
    ecoquest(dir.path())
        .args(["start", "zero-waste"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already"));

    ecoquest(dir.path())
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    ecoquest(dir.path())
        .args(["reset", "--yes"])
        .assert()
        .success();

    let v = json_stdout(ecoquest(dir.path()).args(["--output", "json", "account"]));
    assert_eq!(v["activeChallenges"], serde_json::json!([]));
}

#[test]
fn start_unknown_challenge_fails_with_json_error() {
    let dir = data_dir();
    ecoquest(dir.path())
        .args(["--output", "json", "start", "ocean-cleanup"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""))
        .stderr(predicate::str::contains("unknown challenge: ocean-cleanup"));
}

#[test]
fn invalid_config_fails() {
    let dir = data_dir();
    fs::write(
        dir.path().join("ecoquest.toml"),
        "[persistence]\nmode = \"remote\"\n",
    )
    .unwrap();
    ecoquest(dir.path())
        .arg("account")
        .assert()
        .failure()
        .stderr(predicate::str::contains("user_id"));
}

#[test]
fn remote_mode_creates_profile_store() {
    let dir = data_dir();
    fs::write(
        dir.path().join("ecoquest.toml"),
        "impact_seed = 3\n[persistence]\nmode = \"remote\"\nuser_id = \"u-42\"\nstudent_number = \"s42\"\n",
    )
    .unwrap();
    ecoquest(dir.path())
        .args(["complete", "water-conservation", "tooth-brushing", "--photo"])
        .assert()
        .success();

    let v = json_stdout(ecoquest(dir.path()).args(["--output", "json", "account"]));
    assert_eq!(v["points"], 30);
    assert!(dir.path().join("profiles").is_dir());
}
