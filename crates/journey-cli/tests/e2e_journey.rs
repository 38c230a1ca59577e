//! E2E CLI tests for the happy path:
//! - `journey init`, `grant`, `complete 1..=8`, `choose`, `open response`
//! - fragments, reflection answers and notes surviving between runs
//! - `sync --from` merging a second data directory
//!
//! Each test runs the `journey` binary as a subprocess in a temp directory.

use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the journey binary, rooted in `dir`.
fn journey_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("journey"));
    cmd.current_dir(dir);
    cmd.env("JOURNEY_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join(".xdg"));
    cmd.env_remove("FORMAT");
    cmd.env_remove("JOURNEY_NOW");
    cmd
}

fn init_project(dir: &Path) {
    journey_cmd(dir).args(["init"]).assert().success();
}

/// Run a command with `--json`, require success and parse stdout.
fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = journey_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

fn status(dir: &Path) -> Value {
    run_json(dir, &["status"])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn init_creates_project_layout() {
    let dir = TempDir::new().unwrap();
    let json = run_json(dir.path(), &["init"]);
    assert_eq!(json["ok"], true);
    assert!(dir.path().join(".journey/config.toml").is_file());
    assert!(dir.path().join(".journey/data").is_dir());
}

#[test]
fn fresh_project_starts_at_entry() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());

    let json = status(dir.path());
    assert_eq!(json["phase"], "entry");
    assert_eq!(json["access_granted"], false);
    assert_eq!(json["completed"], 0);
    assert_eq!(json["total"], 8);
    assert_eq!(json["chapters"][0]["state"], "unlocked");
    assert_eq!(json["chapters"][1]["state"], "locked");
    assert_eq!(json["sound_enabled"], false);
}

#[test]
fn grant_starts_the_clock_once() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());

    let first = run_json(dir.path(), &["grant"]);
    assert_eq!(first["change"], "applied");
    assert_eq!(first["access_granted"], true);
    let started = first["start_time"].clone();
    assert!(started.is_string());

    let second = run_json(dir.path(), &["grant"]);
    assert_eq!(second["change"], "unchanged");
    assert_eq!(second["start_time"], started);
}

#[test]
fn full_journey_reaches_response() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    run_json(dir.path(), &["grant"]);

    for chapter in 1..=8 {
        let number = chapter.to_string();
        let json = run_json(dir.path(), &["complete", &number]);
        assert_eq!(json["change"], "applied");
        assert_eq!(json["completed"], chapter);
    }

    let final_gate = run_json(dir.path(), &["open", "final"]);
    assert_eq!(final_gate["allowed"], true);
    let response_gate = run_json(dir.path(), &["open", "response"]);
    assert_eq!(response_gate["allowed"], false);
    assert_eq!(response_gate["redirect"], "final");

    let choice = run_json(dir.path(), &["choose", "accept"]);
    assert_eq!(choice["choice"], "accept");
    assert_eq!(choice["change"], "applied");

    let response_gate = run_json(dir.path(), &["open", "response"]);
    assert_eq!(response_gate["allowed"], true);

    let json = status(dir.path());
    assert_eq!(json["phase"], "choice_made");
    assert_eq!(json["final_choice"], "accept");
}

#[test]
fn repeating_the_same_choice_is_unchanged() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    run_json(dir.path(), &["grant"]);
    for chapter in 1..=8 {
        run_json(dir.path(), &["complete", &chapter.to_string()]);
    }
    run_json(dir.path(), &["choose", "also-accept"]);

    let again = run_json(dir.path(), &["choose", "also-accept"]);
    assert_eq!(again["change"], "unchanged");
}

#[test]
fn completing_twice_is_unchanged() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    run_json(dir.path(), &["grant"]);

    let first = run_json(dir.path(), &["complete", "1"]);
    assert_eq!(first["unlocked"], 2);
    let second = run_json(dir.path(), &["complete", "1"]);
    assert_eq!(second["change"], "unchanged");
    assert_eq!(second["completed"], 1);
    assert!(second.get("unlocked").is_none());
}

#[test]
fn gates_redirect_before_access() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());

    let entry = run_json(dir.path(), &["open", "entry"]);
    assert_eq!(entry["allowed"], true);

    for route in ["hub", "chapter:1", "final", "response"] {
        let json = run_json(dir.path(), &["open", route]);
        assert_eq!(json["allowed"], false, "{route} should be gated");
        assert_eq!(json["redirect"], "entry");
    }
}

#[test]
fn locked_chapter_redirects_to_hub() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    run_json(dir.path(), &["grant"]);

    let json = run_json(dir.path(), &["open", "chapter:3"]);
    assert_eq!(json["allowed"], false);
    assert_eq!(json["redirect"], "hub");
}

#[test]
fn fragments_and_answers_persist() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    run_json(dir.path(), &["grant"]);

    let egg = run_json(dir.path(), &["egg", "1"]);
    assert_eq!(egg["change"], "applied");
    let egg_again = run_json(dir.path(), &["egg", "1"]);
    assert_eq!(egg_again["change"], "unchanged");

    let answer = run_json(
        dir.path(),
        &["answer", "chapter1", "7", "--question", "2", "--kind", "scale"],
    );
    assert_eq!(answer["key"], "chapter1_2");
    assert_eq!(answer["change"], "applied");

    let json = status(dir.path());
    assert_eq!(json["easter_eggs"], 1);
    assert_eq!(json["reflection_answers"], 1);
    assert_eq!(json["chapters"][0]["easter_egg"], true);
}

#[test]
fn notes_round_trip_through_cli() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());

    journey_cmd(dir.path())
        .args(["notes", "set", "hope", "more mornings like this"])
        .assert()
        .success();

    let json = run_json(dir.path(), &["notes", "get", "hope"]);
    assert_eq!(json["answer"], "more mornings like this");

    let list = run_json(dir.path(), &["notes", "list"]);
    assert_eq!(list["answered"], 1);

    journey_cmd(dir.path())
        .args(["notes", "clear", "hope"])
        .assert()
        .success();
    journey_cmd(dir.path())
        .args(["notes", "get", "hope"])
        .assert()
        .failure();

    assert_eq!(status(dir.path())["notes_answered"], 0);
}

#[test]
fn sound_preference_toggles() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());

    let on = run_json(dir.path(), &["sound"]);
    assert_eq!(on["sound_enabled"], true);
    let still_on = run_json(dir.path(), &["sound", "on"]);
    assert_eq!(still_on["change"], "unchanged");
    let off = run_json(dir.path(), &["sound", "off"]);
    assert_eq!(off["sound_enabled"], false);
}

#[test]
fn reset_returns_to_entry_and_bumps_epoch() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    run_json(dir.path(), &["grant"]);
    run_json(dir.path(), &["complete", "1"]);

    journey_cmd(dir.path())
        .args(["reset", "--yes"])
        .assert()
        .success();

    let json = status(dir.path());
    assert_eq!(json["phase"], "entry");
    assert_eq!(json["completed"], 0);
    assert_eq!(json["epoch"], 1);
}

#[test]
fn sync_from_merges_other_data_dir() {
    let main = TempDir::new().unwrap();
    let other = TempDir::new().unwrap();
    init_project(main.path());
    init_project(other.path());

    run_json(main.path(), &["grant"]);
    run_json(main.path(), &["complete", "1"]);

    run_json(other.path(), &["grant"]);
    run_json(other.path(), &["egg", "1"]);

    let other_data = other.path().join(".journey/data");
    let json = run_json(
        main.path(),
        &["sync", "--from", other_data.to_str().unwrap()],
    );
    assert_eq!(json["change"], "applied");
    assert_eq!(json["completed"], 1);
    assert_eq!(json["easter_eggs"], 1);

    let again = run_json(
        main.path(),
        &["sync", "--from", other_data.to_str().unwrap()],
    );
    assert_eq!(again["change"], "unchanged");
}

#[test]
fn sync_from_own_data_dir_is_unchanged() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    run_json(dir.path(), &["grant"]);

    let own = dir.path().join(".journey/data");
    let json = run_json(dir.path(), &["sync", "--from", own.to_str().unwrap()]);
    assert_eq!(json["change"], "unchanged");
}

#[test]
fn parallel_runs_do_not_lose_answers() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    run_json(dir.path(), &["grant"]);

    let children: Vec<_> = (1..=4)
        .map(|question| {
            let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin!("journey"));
            cmd.current_dir(dir.path())
                .env("JOURNEY_LOG", "error")
                .env("XDG_CONFIG_HOME", dir.path().join(".xdg"))
                .env_remove("JOURNEY_NOW")
                .args(["answer", &format!("chapter1_{question}"), "yes", "--json"])
                .stdout(std::process::Stdio::null())
                .spawn()
                .unwrap()
        })
        .collect();
    for mut child in children {
        assert!(child.wait().unwrap().success());
    }

    assert_eq!(status(dir.path())["reflection_answers"], 4);
}

#[test]
fn text_output_is_line_oriented() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());

    let output = journey_cmd(dir.path())
        .args(["status"])
        .env("FORMAT", "text")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("phase=entry"), "unexpected output: {stdout}");
}
