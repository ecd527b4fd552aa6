//! End-to-end tests driving the `za` binary against a JSON zone fixture.

use std::path::Path;
use std::process::Command;

use chrono::{SecondsFormat, TimeDelta, Utc};
use tempfile::TempDir;

fn za_binary() -> String {
    env!("CARGO_BIN_EXE_za").to_string()
}

fn write_fixture(dir: &Path) -> std::path::PathBuf {
    let twenty_min_ago = (Utc::now() - TimeDelta::minutes(20)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let json = format!(
        r#"[
            {{"id": "home", "name": "Home"}},
            {{"id": "floor1", "name": "First floor", "parent": "home"}},
            {{"id": "bedroom", "name": "Bedroom", "parent": "floor1",
              "active": true, "activeLastUpdated": "{twenty_min_ago}"}},
            {{"id": "kitchen", "name": "Kitchen", "parent": "home"}}
        ]"#
    );
    let path = dir.join("zones.json");
    std::fs::write(&path, json).unwrap();
    path
}

fn run_za(fixture: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(za_binary())
        .arg("--zones")
        .arg(fixture)
        .args(args)
        .output()
        .expect("failed to run za");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

#[test]
fn tree_prints_the_hierarchy() {
    let temp = TempDir::new().unwrap();
    let fixture = write_fixture(temp.path());

    let (stdout, stderr, ok) = run_za(&fixture, &["tree"]);
    assert!(ok, "za tree failed: {stderr}");
    assert_eq!(
        stdout,
        "Home\n  First floor\n    Bedroom [active]\n  Kitchen\n"
    );
}

#[test]
fn parents_lists_ancestors_nearest_first() {
    let temp = TempDir::new().unwrap();
    let fixture = write_fixture(temp.path());

    let (stdout, stderr, ok) = run_za(&fixture, &["parents", "bedroom"]);
    assert!(ok, "za parents failed: {stderr}");
    assert_eq!(stdout, "First floor\nHome\n");
}

#[test]
fn children_lists_descendants() {
    let temp = TempDir::new().unwrap();
    let fixture = write_fixture(temp.path());

    let (stdout, _, ok) = run_za(&fixture, &["children", "home"]);
    assert!(ok);
    assert_eq!(
        stdout,
        "Home > First floor\nHome > First floor > Bedroom\nHome > Kitchen\n"
    );

    let (stdout, _, ok) = run_za(&fixture, &["children", "home", "--direct"]);
    assert!(ok);
    assert_eq!(stdout, "Home > First floor\nHome > Kitchen\n");
}

#[test]
fn unknown_zone_fails_with_an_error() {
    let temp = TempDir::new().unwrap();
    let fixture = write_fixture(temp.path());

    let (_, stderr, ok) = run_za(&fixture, &["parents", "ghost"]);
    assert!(!ok);
    assert!(stderr.contains("zone not found"), "stderr was: {stderr}");
}

#[test]
fn window_evaluates_active_duration() {
    let temp = TempDir::new().unwrap();
    let fixture = write_fixture(temp.path());

    // Bedroom flipped active 20 minutes ago.
    let (stdout, stderr, ok) =
        run_za(&fixture, &["window", "bedroom", "--minutes", "15"]);
    assert!(ok, "za window failed: {stderr}");
    assert_eq!(stdout.trim(), "true");

    let (stdout, _, ok) = run_za(&fixture, &["window", "bedroom", "--minutes", "25"]);
    assert!(ok);
    assert_eq!(stdout.trim(), "false");

    // Kitchen has never been active.
    let (stdout, _, ok) = run_za(
        &fixture,
        &["window", "kitchen", "--minutes", "60", "--state", "inactive"],
    );
    assert!(ok);
    assert_eq!(stdout.trim(), "true");
}

#[test]
fn complete_filters_by_substring() {
    let temp = TempDir::new().unwrap();
    let fixture = write_fixture(temp.path());

    let (stdout, _, ok) = run_za(&fixture, &["complete", "floor"]);
    assert!(ok);
    assert_eq!(stdout, "First floor (Home)\n");
}
