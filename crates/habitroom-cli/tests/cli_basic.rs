//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a temporary data directory and
//! verify outputs and the files left behind.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command against `dir` and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_habitroom"))
        .arg("--data-dir")
        .arg(dir)
        .args(args)
        .env_remove("HABITROOM_BOT_TOKEN")
        .env_remove("HABITROOM_ADMIN_CHAT")
        .env_remove("HABITROOM_DATA_DIR")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_habits_list_defaults() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["habits", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Wake up (wake): 07:00-07:10, fallback until 07:30, 3/1 points"));
    assert!(stdout.contains("Daily summary at 21:00"));
}

#[test]
fn test_habits_add_persists() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(
        dir.path(),
        &["habits", "add", "read", "21:00", "21:30", "22:00", "2", "1", "Read", "20", "pages"],
    );
    assert_eq!(code, 0, "add failed");
    assert!(stdout.starts_with("Added: Read 20 pages (read)"));

    let (stdout, _, code) = run_cli(dir.path(), &["habits", "list", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let ids: Vec<&str> = parsed["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["wake", "workout", "read"]);
    assert_eq!(parsed["tasks"][2]["fallbackEnd"], "22:00");
}

#[test]
fn test_habits_set_rejects_bad_order() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["habits", "set", "wake", "07:00", "07:05", "07:04"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Times must satisfy"), "{stderr}");

    let (stdout, _, _) = run_cli(dir.path(), &["habits", "list"]);
    assert!(stdout.contains("07:00-07:10"));
}

#[test]
fn test_habits_del_then_list() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["habits", "del", "workout"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["habits", "list"]);
    assert!(!stdout.contains("(workout)"));

    let (_, stderr, code) = run_cli(dir.path(), &["habits", "del", "workout"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("No habit with id 'workout'"));
}

#[test]
fn test_score_empty_day() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["score", "--date", "2026-10-19"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("📊 Summary for 2026-10-19\nTotal: 0 points"));

    let (stdout, _, code) = run_cli(dir.path(), &["score", "--date", "2026-10-19", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["total"], 0);
}

#[test]
fn test_score_rejects_bad_date() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["score", "--date", "19/10/2026"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid --date"));
}

#[test]
fn test_run_requires_token() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["run"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("bot_token"), "{stderr}");
    assert!(dir.path().join("settings.toml").exists());
}
