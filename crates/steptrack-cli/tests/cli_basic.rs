//! Basic CLI E2E tests.
//!
//! Each test runs the binary against its own temporary data directory.

use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_steptrack"))
        .args(args)
        .env("STEPTRACK_DATA_DIR", data_dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &TempDir, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout should be JSON")
}

#[test]
fn test_config_list_shows_defaults() {
    let dir = TempDir::new().unwrap();
    let config = run_json(&dir, &["config", "list"]);
    assert_eq!(config["goal"]["default_steps"], 10000);
    assert_eq!(config["notifications"]["reminder_hour"], 10);
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_then_get() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["config", "set", "goal.default_steps", "7500"]);
    assert_eq!(code, 0, "config set failed: {stderr}");

    let (stdout, _, code) = run_cli(&dir, &["config", "get", "goal.default_steps"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "7500");
}

#[test]
fn test_config_rejects_unknown_key_and_bad_goal() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["config", "set", "goal.nope", "1"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));

    let (_, _, code) = run_cli(&dir, &["config", "set", "goal.default_steps", "0"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_path_points_into_data_dir() {
    let dir = TempDir::new().unwrap();
    let paths = run_json(&dir, &["config", "path"]);
    let config = dir.path().join("config.toml");
    let store = dir.path().join("samples.db");
    assert_eq!(paths["config"], config.display().to_string());
    assert_eq!(paths["sample_store"], store.display().to_string());
    assert_eq!(paths["sample_store_exists"], false);
}

#[test]
fn test_config_get_unknown_key_lists_sections() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["config", "get", "goal.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("sections: goal, source, notifications"), "{stderr}");
}

#[test]
fn test_config_set_goal_reports_range() {
    let dir = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(&dir, &["config", "set", "goal.default_steps", "8000"]);
    assert_eq!(code, 0, "{stderr}");
    assert_eq!(stdout.trim(), "ok (goal 8000 of 1..=100000)");
}

#[test]
fn test_today_without_sample_store_falls_back() {
    let dir = TempDir::new().unwrap();
    let today = run_json(&dir, &["today"]);
    assert_eq!(today["source"], "fallback");
    assert_eq!(today["steps"], 0);
    assert_eq!(today["progress"], 0.0);
}

#[test]
fn test_recorded_sample_counts_towards_today() {
    let dir = TempDir::new().unwrap();
    let added = run_json(&dir, &["samples", "add", "4000"]);
    assert!(added["id"].as_i64().unwrap() > 0);

    let today = run_json(&dir, &["today", "--goal", "8000"]);
    assert_eq!(today["source"], "primary");
    assert_eq!(today["steps"], 4000);
    assert_eq!(today["goal"], 8000);
    assert_eq!(today["progress"], 0.5);

    let samples = run_json(&dir, &["samples", "list"]);
    assert_eq!(samples.as_array().unwrap().len(), 1);
}

#[test]
fn test_today_rejects_out_of_range_goal() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["today", "--goal", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("goal"));
}

#[test]
fn test_week_reports_seven_days() {
    let dir = TempDir::new().unwrap();
    run_json(&dir, &["samples", "add", "1200"]);

    let week = run_json(&dir, &["week"]);
    assert_eq!(week["days"].as_object().unwrap().len(), 7);
    assert_eq!(week["summary"]["days"], 7);
    assert_eq!(week["summary"]["total"], 1200);
    assert_eq!(week["summary"]["best"], 1200);
}

#[test]
fn test_pedometer_deltas_accumulate() {
    let dir = TempDir::new().unwrap();
    let today = run_json(&dir, &["samples", "pedometer", "100", "250"]);
    assert_eq!(today["source"], "fallback");
    assert_eq!(today["steps"], 350);
}
