//! Integration tests for the `plotboard` CLI.
//!
//! Each test points the binary at a temp data directory and a missing config
//! file, runs one command per process, and checks stdout and the files left
//! on disk.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_plotboard"))
        .arg("--data-dir")
        .arg(dir.join("data"))
        .arg("--config")
        .arg(dir.join("missing-config.json"))
        .args(args)
        .output()
        .unwrap()
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = run(dir, args);
    assert!(
        output.status.success(),
        "plotboard {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn board_file(dir: &Path) -> Value {
    let content = fs::read_to_string(dir.join("data").join("kanban_board.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn add_and_move_card() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();

    let id = run_ok(dir, &["add-card", "To Do", "Write Chapter 1"]);
    run_ok(dir, &["move-between", "To Do", "Done", "0"]);

    let board = board_file(dir);
    assert_eq!(board["To Do"], serde_json::json!([]));
    assert_eq!(board["Done"][0]["title"], "Write Chapter 1");
    assert_eq!(board["Done"][0]["metadata"]["id"], id.trim());

    let summary = run_ok(dir, &["show", "--summary"]);
    let summary: Value = serde_json::from_str(&summary).unwrap();
    assert_eq!(
        summary,
        serde_json::json!({"To Do": [], "In Progress": [], "Done": ["Write Chapter 1"]})
    );
}

#[test]
fn unknown_column_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let output = run(tmp.path(), &["add-card", "Nowhere", "Lost card"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: column not found: Nowhere"));
}

#[test]
fn delete_column_with_yes() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    run_ok(dir, &["add-card", "In Progress", "Draft"]);
    run_ok(dir, &["delete-column", "In Progress", "--yes"]);

    let board = board_file(dir);
    let names: Vec<&String> = board.as_object().unwrap().keys().collect();
    assert_eq!(names, vec!["To Do", "Done"]);
}

#[test]
fn edit_card_fields() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    run_ok(dir, &["add-card", "To Do", "Draft"]);
    run_ok(
        dir,
        &[
            "edit-card", "To Do", "0", "--title", "Final", "--notes", "tighten", "--tag", "act-1",
            "--color", "#ff0000",
        ],
    );

    let meta = &board_file(dir)["To Do"][0]["metadata"];
    assert_eq!(meta["title"], "Final");
    assert_eq!(meta["notes"], "tighten");
    assert_eq!(meta["tags"], serde_json::json!(["act-1"]));
    assert_eq!(meta["color"], "#ff0000");
}

#[test]
fn history_lists_saved_versions() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    run_ok(dir, &["add-column", "Ideas"]);

    let history = run_ok(dir, &["history"]);
    let versions: Vec<&str> = history.lines().collect();
    assert_eq!(versions.len(), 1);
    assert!(versions[0].starts_with("kanban_"));

    run_ok(dir, &["restore", versions[0]]);
    let board = board_file(dir);
    assert!(board.get("Ideas").is_some());
}

#[test]
fn sync_and_list_timeline() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    run_ok(dir, &["add-card", "To Do", "Opening"]);
    run_ok(dir, &["add-card", "Done", "Premise"]);

    let report: Value = serde_json::from_str(&run_ok(dir, &["sync-timeline"])).unwrap();
    assert_eq!(report["created"], 2);

    let listing = run_ok(dir, &["timeline"]);
    assert!(listing.contains("Opening"));
    assert!(listing.contains("Premise"));
    assert!(dir.join("data").join("timeline_board.json").exists());

    let report: Value =
        serde_json::from_str(&run_ok(dir, &["sync-timeline", "--column", "To Do"])).unwrap();
    assert_eq!(report["unchanged"], 1);
    assert_eq!(report["removed"], 0);

    let report: Value = serde_json::from_str(&run_ok(dir, &["pull-timeline"])).unwrap();
    assert_eq!(report["unchanged"], 2);
}

#[test]
fn legacy_board_keeps_ids_across_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    let data = dir.join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(
        data.join("kanban_board.json"),
        r#"{"To Do": ["Write Chapter 1", "Outline"], "Done": []}"#,
    )
    .unwrap();

    let report: Value = serde_json::from_str(&run_ok(dir, &["sync-timeline"])).unwrap();
    assert_eq!(report["created"], 2);
    let report: Value = serde_json::from_str(&run_ok(dir, &["sync-timeline"])).unwrap();
    assert_eq!(report["created"], 0);
    assert_eq!(report["removed"], 0);

    let report: Value = serde_json::from_str(&run_ok(dir, &["pull-timeline"])).unwrap();
    assert_eq!(report["created"], 0);

    let summary: Value = serde_json::from_str(&run_ok(dir, &["show", "--summary"])).unwrap();
    assert_eq!(summary["To Do"], serde_json::json!(["Write Chapter 1", "Outline"]));
}
