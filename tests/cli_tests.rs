/// End-to-end tests of the chat-role-audit binary
mod common;

use assert_cmd::Command;
use common::{arg, message, read_rows, row, write_export};
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_extract_roles_writes_report() {
    let dir = TempDir::new().unwrap();
    write_export(dir.path(), "a.json", &[&message("1", "alice", &[("10", "mod")])]);
    write_export(dir.path(), "b.json", &[&message("2", "bob", &[])]);
    let output = dir.path().join("roles.csv");

    Command::cargo_bin("chat-role-audit")
        .unwrap()
        .args(["extract-roles", "--sort", "-j", "2", "-o"])
        .arg(&output)
        .arg(arg(&dir.path().join("*.json")))
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains("unique user-role entries"));

    assert_eq!(
        read_rows(&output),
        vec![
            row(["1", "alice", "alice", "10", "mod"]),
            row(["2", "bob", "bob", "", ""]),
        ]
    );
}

#[test]
fn test_no_usable_inputs_fails() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("roles.csv");

    Command::cargo_bin("chat-role-audit")
        .unwrap()
        .args(["extract-roles", "-o"])
        .arg(&output)
        .arg(arg(&dir.path().join("missing.json")))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No valid input JSON files"));

    assert!(!output.exists());
}

#[test]
fn test_skips_and_missing_target_are_logged() {
    let dir = TempDir::new().unwrap();
    let good = write_export(dir.path(), "good.json", &[&message("1", "alice", &[])]);
    let no_messages = dir.path().join("metadata.json");
    std::fs::write(&no_messages, r#"{"guild": {"id": "900"}, "messageCount": 0}"#).unwrap();
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "not an export").unwrap();
    let output = dir.path().join("roles.csv");

    Command::cargo_bin("chat-role-audit")
        .unwrap()
        .args(["extract-roles", "-o"])
        .arg(&output)
        .arg(&good)
        .arg(&no_messages)
        .arg(&notes)
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains(format!(
            "'messages' key not found in {}",
            no_messages.display()
        )))
        .stderr(predicate::str::contains(format!(
            "Skipping non-JSON file: {}",
            notes.display()
        )));

    assert_eq!(read_rows(&output), vec![row(["1", "alice", "alice", "", ""])]);
}

#[test]
fn test_quiet_keeps_warnings_only() {
    let dir = TempDir::new().unwrap();
    let no_messages = dir.path().join("metadata.json");
    std::fs::write(&no_messages, r#"{"guild": {"id": "900"}}"#).unwrap();
    let output = dir.path().join("roles.csv");

    Command::cargo_bin("chat-role-audit")
        .unwrap()
        .args(["-q", "extract-roles", "-o"])
        .arg(&output)
        .arg(&no_messages)
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains("'messages' key not found"))
        .stderr(predicate::str::contains("Processing file").not());
}

#[test]
fn test_inputs_are_required() {
    Command::cargo_bin("chat-role-audit")
        .unwrap()
        .arg("extract-roles")
        .assert()
        .failure();
}

#[test]
fn test_zero_jobs_rejected() {
    Command::cargo_bin("chat-role-audit")
        .unwrap()
        .args(["extract-roles", "--jobs", "0", "a.json"])
        .assert()
        .failure();
}

#[test]
fn test_generate_completion_bash() {
    Command::cargo_bin("chat-role-audit")
        .unwrap()
        .args(["generate-completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_chat__role__audit()"))
        .stdout(predicate::str::contains("extract-roles"))
        .stdout(predicate::str::contains("generate-completion"));
}
