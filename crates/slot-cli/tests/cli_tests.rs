//! Integration tests for the `slots` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to run the free, suggest,
//! conflicts and plan subcommands through the actual binary against the
//! JSON fixtures, including error handling and log output.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// `slots` with the calendar and profile fixtures and a quiet logger.
fn slots() -> Command {
    let mut cmd = Command::cargo_bin("slots").unwrap();
    cmd.env_remove("RUST_LOG")
        .args(["--calendar", &fixture("calendar.json")])
        .args(["--profile", &fixture("profile.json")])
        .args(["--log-level", "error"]);
    cmd
}

fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout must be JSON")
}

fn starts(slots: &Value) -> Vec<String> {
    slots
        .as_array()
        .expect("array")
        .iter()
        .map(|s| s["start"].as_str().unwrap().to_string())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// free
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn free_lists_gaps_between_entries() {
    let out = run_json(slots().args([
        "free",
        "--from",
        "2026-03-02T09:00:00Z",
        "--to",
        "2026-03-02T18:00:00Z",
    ]));

    assert_eq!(
        starts(&out["free_slots"]),
        vec![
            "2026-03-02T09:00:00Z",
            "2026-03-02T11:00:00Z",
            "2026-03-02T12:00:00Z",
            "2026-03-02T15:00:00Z",
        ]
    );
    assert_eq!(out["free_slots"][2]["end"], "2026-03-02T14:00:00Z");
    assert_eq!(out["free_slots"][3]["duration_minutes"], 180);
}

#[test]
fn free_honours_minimum_length() {
    let out = run_json(slots().args([
        "free",
        "--from",
        "2026-03-02T09:00:00Z",
        "--to",
        "2026-03-02T18:00:00Z",
        "--min-minutes",
        "90",
    ]));

    assert_eq!(
        starts(&out["free_slots"]),
        vec!["2026-03-02T12:00:00Z", "2026-03-02T15:00:00Z"]
    );
}

#[test]
fn free_without_calendar_is_the_whole_window() {
    let out = run_json(
        Command::cargo_bin("slots")
            .unwrap()
            .env_remove("RUST_LOG")
            .args(["free", "--from", "2026-03-02T09:00:00Z", "--to", "2026-03-02T10:00:00Z"]),
    );

    assert_eq!(starts(&out["free_slots"]), vec!["2026-03-02T09:00:00Z"]);
    assert_eq!(out["free_slots"][0]["end"], "2026-03-02T10:00:00Z");
}

#[test]
fn malformed_entries_are_logged_to_stderr() {
    Command::cargo_bin("slots")
        .unwrap()
        .env_remove("RUST_LOG")
        .args(["--calendar", &fixture("calendar.json")])
        .args(["--log-level", "warn"])
        .args([
            "free",
            "--from",
            "2026-03-02T09:00:00Z",
            "--to",
            "2026-03-02T18:00:00Z",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("skipping malformed calendar entry"))
        .stdout(predicate::str::contains("free_slots"));
}

// ─────────────────────────────────────────────────────────────────────────────
// suggest
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn suggest_prefers_high_energy_morning() {
    let out = run_json(slots().args([
        "suggest",
        "--title",
        "Write report",
        "--type",
        "focus",
        "--duration",
        "60",
        "--from",
        "2026-03-02T00:00:00Z",
        "--days",
        "1",
        "--alternatives",
        "2",
    ]));

    assert_eq!(out["slot"]["start"], "2026-03-02T09:00:00Z");
    assert_eq!(out["slot"]["end"], "2026-03-02T10:00:00Z");
    assert_eq!(out["alternatives"].as_array().unwrap().len(), 2);
    assert_eq!(out["event"]["title"], "Write report");
}

#[test]
fn suggest_respects_time_of_day() {
    let out = run_json(slots().args([
        "suggest",
        "--title",
        "Write report",
        "--duration",
        "60",
        "--from",
        "2026-03-02T00:00:00Z",
        "--days",
        "1",
        "--period",
        "afternoon",
    ]));

    assert_eq!(out["slot"]["start"], "2026-03-02T12:00:00Z");
}

#[test]
fn suggest_reports_null_when_nothing_fits() {
    let out = run_json(slots().args([
        "suggest",
        "--title",
        "Offsite",
        "--duration",
        "600",
        "--from",
        "2026-03-02T00:00:00Z",
        "--days",
        "3",
    ]));

    assert!(out["slot"].is_null());
    assert!(out["alternatives"].as_array().unwrap().is_empty());
}

#[test]
fn config_changes_the_candidate_step() {
    let args = [
        "suggest",
        "--title",
        "Inbox",
        "--duration",
        "30",
        "--from",
        "2026-03-02T09:10:00Z",
        "--days",
        "1",
    ];

    let default_step = run_json(slots().args(args));
    assert_eq!(default_step["slot"]["start"], "2026-03-02T09:30:00Z");

    let quarter_step = run_json(slots().args(["--config", &fixture("engine.toml")]).args(args));
    assert_eq!(quarter_step["slot"]["start"], "2026-03-02T09:15:00Z");
}

// ─────────────────────────────────────────────────────────────────────────────
// conflicts
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn conflicts_lists_overlaps_and_an_alternative() {
    let out = run_json(slots().args([
        "conflicts",
        "--title",
        "Vendor call",
        "--start",
        "2026-03-02T10:30:00Z",
        "--end",
        "2026-03-02T11:45:00Z",
    ]));

    let conflicts = out["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 2);
    assert_eq!(conflicts[0]["event"]["summary"], "Design review");
    assert_eq!(conflicts[0]["overlap_minutes"], 30);
    assert_eq!(conflicts[1]["event"]["summary"], "Coffee with Sam");
    assert_eq!(conflicts[1]["overlap_minutes"], 15);
    assert_eq!(conflicts[0]["severity"], "high");

    assert_eq!(out["alternative"]["start"], "2026-03-02T12:00:00Z");
    assert_eq!(out["alternative"]["end"], "2026-03-02T13:15:00Z");
}

#[test]
fn conflicts_detects_recurring_occurrences() {
    let out = run_json(slots().args([
        "conflicts",
        "--title",
        "Dentist",
        "--start",
        "2026-03-04T14:30:00Z",
        "--end",
        "2026-03-04T15:30:00Z",
    ]));

    let conflicts = out["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["event"]["summary"], "Team sync");
    assert_eq!(conflicts[0]["start"], "2026-03-04T14:00:00Z");
}

#[test]
fn free_time_has_no_conflicts() {
    let out = run_json(slots().args([
        "conflicts",
        "--title",
        "Lunch",
        "--start",
        "2026-03-03T10:00:00Z",
        "--end",
        "2026-03-03T11:00:00Z",
    ]));

    assert!(out["conflicts"].as_array().unwrap().is_empty());
    assert!(out["alternative"].is_null());
}

#[test]
fn strict_policy_drops_end_before_start() {
    // 10:30 → 10:00 is promoted to 22:00 by default; strict rejects it.
    let args = [
        "conflicts",
        "--title",
        "Late one",
        "--start",
        "2026-03-02T10:30:00Z",
        "--end",
        "2026-03-02T10:00:00Z",
    ];

    let promoted = run_json(slots().args(args));
    assert_eq!(promoted["conflicts"].as_array().unwrap().len(), 3);

    let strict = run_json(slots().args(["--config", &fixture("engine.toml")]).args(args));
    assert!(strict["conflicts"].as_array().unwrap().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// plan
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn plan_dry_run_fills_free_time() {
    let out = run_json(slots().args([
        "plan",
        "--summary",
        "Thesis",
        "--total-hours",
        "3",
        "--chunk-hours",
        "2",
        "--now",
        "2026-03-02T09:00:00Z",
        "--dry-run",
    ]));

    assert_eq!(out["complete"], true);
    let chunks = out["outcome"]["chunks"].as_array().unwrap();
    assert_eq!(starts(&out["outcome"]["chunks"]), vec![
        "2026-03-02T12:00:00Z",
        "2026-03-02T15:00:00Z",
    ]);
    assert_eq!(chunks[0]["end"], "2026-03-02T14:00:00Z");
    assert_eq!(chunks[1]["end"], "2026-03-02T16:00:00Z");
    assert_eq!(chunks[0]["source"]["kind"], "dry_run");
    assert_eq!(out["outcome"]["scheduled_hours"], 3.0);
    assert_eq!(out["outcome"]["remaining_hours"], 0.0);
}

#[test]
fn plan_writes_chunks_to_the_calendar() {
    let out = run_json(slots().args([
        "plan",
        "--summary",
        "Thesis",
        "--total-hours",
        "2",
        "--chunk-hours",
        "2",
        "--now",
        "2026-03-02T09:00:00Z",
    ]));

    let chunk = &out["outcome"]["chunks"][0];
    assert_eq!(chunk["source"]["kind"], "event");
    assert!(chunk["source"]["id"].as_str().unwrap().starts_with("mem-"));
    assert_eq!(out["outcome"]["failed_writes"], 0);
}

#[test]
fn plan_reports_remainder_when_horizon_is_too_small() {
    let out = run_json(slots().args([
        "plan",
        "--summary",
        "Thesis",
        "--total-hours",
        "200",
        "--chunk-hours",
        "3",
        "--weeks",
        "1",
        "--window",
        "09:00-12:00",
        "--now",
        "2026-03-02T09:00:00Z",
        "--dry-run",
    ]));

    assert_eq!(out["complete"], false);
    assert!(out["outcome"]["remaining_hours"].as_f64().unwrap() > 170.0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Error handling
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn unknown_event_type_is_rejected() {
    slots()
        .args(["suggest", "--title", "Nap", "--type", "siesta"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown event type"));
}

#[test]
fn bad_timestamp_is_rejected() {
    slots()
        .args(["free", "--from", "monday", "--to", "2026-03-02T18:00:00Z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timestamp: monday"));
}

#[test]
fn inverted_plan_window_is_rejected() {
    slots()
        .args([
            "plan",
            "--summary",
            "Thesis",
            "--total-hours",
            "2",
            "--chunk-hours",
            "1",
            "--window",
            "18:00-09:00",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must start before it ends"));
}

#[test]
fn zero_chunk_size_is_an_error() {
    slots()
        .args([
            "plan",
            "--summary",
            "Thesis",
            "--total-hours",
            "2",
            "--chunk-hours",
            "0",
            "--dry-run",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chunk_hours must be positive"));
}

#[test]
fn missing_calendar_file_is_reported() {
    Command::cargo_bin("slots")
        .unwrap()
        .args(["--calendar", "/nonexistent/calendar.json"])
        .args(["free", "--from", "2026-03-02T09:00:00Z", "--to", "2026-03-02T18:00:00Z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read calendar"));
}

#[test]
fn unknown_profile_time_zone_is_reported() {
    let dir = std::env::temp_dir().join("slots-cli-bad-profile");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("profile.json");
    std::fs::write(&path, r#"{ "timezone": "Mars/Olympus_Mons" }"#).unwrap();

    Command::cargo_bin("slots")
        .unwrap()
        .args(["--profile", path.to_str().unwrap()])
        .args(["free", "--from", "2026-03-02T09:00:00Z", "--to", "2026-03-02T18:00:00Z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Mars/Olympus_Mons"));
}
