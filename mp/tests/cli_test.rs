//! CLI tests for the `mp` binary
//!
//! Only commands that work without a backend are exercised here.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `mp` with config, data and log locations pointed into a temp dir
fn mp(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mp").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_plan_from_file_lays_out_days() {
    let home = TempDir::new().unwrap();
    let plan = home.path().join("plan.txt");
    std::fs::write(&plan, "Day 1: Walk 20 minutes\nDay 2: Cut sugar\nDay 3: Sleep early\n").unwrap();

    mp(&home)
        .args(["plan", "--file"])
        .arg(&plan)
        .args(["--start", "2025-01-06"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mon Jan 06 2025 Plan:"))
        .stdout(predicate::str::contains("Tue Jan 07 2025 Plan:"))
        .stdout(predicate::str::contains("Wed Jan 08 2025 Plan:"))
        .stdout(predicate::str::contains("Day 2: Cut sugar"));
}

#[test]
fn test_plan_without_vitals_or_file_fails() {
    let home = TempDir::new().unwrap();

    mp(&home)
        .args(["plan", "--age", "40"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--bmi"));
}

#[test]
fn test_ask_list_shows_quick_questions() {
    let home = TempDir::new().unwrap();

    mp(&home)
        .args(["ask", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("What are the symptoms of diabetes?"))
        .stdout(predicate::str::contains("What vitamins are essential for immune health?"));
}

#[test]
fn test_blank_document_question_fails_before_any_request() {
    let home = TempDir::new().unwrap();

    mp(&home)
        .args(["--base-url", "http://127.0.0.1:9", "docs", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter a question"));
}

#[test]
fn test_broken_local_config_falls_back_but_explicit_fails() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".medprompt.yml"), "backend: [broken\n").unwrap();

    mp(&home)
        .args(["ask", "--list"])
        .assert()
        .success();

    let explicit = home.path().join("bad.yml");
    std::fs::write(&explicit, "backend: [broken\n").unwrap();
    mp(&home)
        .arg("--config")
        .arg(&explicit)
        .args(["ask", "--list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
