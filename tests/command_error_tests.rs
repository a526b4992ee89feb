/// Run-level failures: these abort the command and leave no report behind.
mod common;

use chat_role_audit::commands::extract_roles;
use common::{arg, message, write_export};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_no_inputs() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");

    let result = extract_roles::run(&[], &arg(&output), "messages", None, false);

    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("No input JSON files provided"));
    assert!(!output.exists());
}

#[test]
fn test_inputs_that_do_not_exist() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");

    let result = extract_roles::run(
        &["/nonexistent/export.json".to_string(), arg(&dir.path().join("*.json"))],
        &arg(&output),
        "messages",
        None,
        false,
    );

    assert!(result.is_err());
    assert!(!output.exists());
}

#[test]
fn test_only_non_json_inputs() {
    let dir = TempDir::new().unwrap();
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "{}").unwrap();
    let output = dir.path().join("out.csv");

    let result = extract_roles::run(
        &[arg(&notes), arg(dir.path())],
        &arg(&output),
        "messages",
        None,
        false,
    );

    assert!(result.is_err());
    assert!(!output.exists());
}

#[test]
fn test_output_cannot_be_created() {
    let dir = TempDir::new().unwrap();
    let export = write_export(dir.path(), "a.json", &[&message("1", "a", &[])]);
    // A regular file where the output directory should be
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let output = blocker.join("out.csv");

    let result = extract_roles::run(&[arg(&export)], &arg(&output), "messages", None, false);

    assert!(result.is_err());
    assert!(!output.exists());
}

#[test]
fn test_all_files_failing_still_writes_header() {
    let dir = TempDir::new().unwrap();
    let broken = dir.path().join("broken.json");
    fs::write(&broken, "not json at all").unwrap();
    let output = dir.path().join("out.csv");

    let report =
        extract_roles::run(&[arg(&broken)], &arg(&output), "messages", None, false).unwrap();

    assert_eq!(report.files_failed, 1);
    assert_eq!(report.unique_rows, 0);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "UserID,Username,DisplayName,RoleID,RoleName\n"
    );
}
