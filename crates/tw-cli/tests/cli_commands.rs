//! Integration tests for the tw-cli binary.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tw() -> Command {
    Command::cargo_bin("tw").unwrap()
}

// ---------------------------------------------------------------------------
// tw tiles
// ---------------------------------------------------------------------------

#[test]
fn tiles_lists_the_catalogue() {
    tw().arg("tiles")
        .assert()
        .success()
        .stdout(predicate::str::contains("Grass"))
        .stdout(predicate::str::contains("Stairs Down"))
        .stdout(predicate::str::contains("Infinite Fall"))
        .stdout(predicate::str::contains("28 tiles"));
}

// ---------------------------------------------------------------------------
// tw simulate
// ---------------------------------------------------------------------------

#[test]
fn simulate_prints_every_level() {
    tw().args(["simulate", "--ticks", "5", "--seed", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Simulation"))
        .stdout(predicate::str::contains("The Void"))
        .stdout(predicate::str::contains("Surface *"))
        .stdout(predicate::str::contains("Dungeon"));
}

#[test]
fn simulate_starts_on_requested_depth() {
    tw().args(["simulate", "--ticks", "2", "--depth", "-2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Gold *"));
}

#[test]
fn simulate_verbose_shows_event_log() {
    tw().args(["simulate", "--ticks", "1", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Event Log"))
        .stdout(predicate::str::contains("Heaven generated"));
}

#[test]
fn simulate_rejects_unknown_difficulty() {
    tw().args(["simulate", "--difficulty", "Nightmare"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: unknown difficulty \"Nightmare\""));
}

#[test]
fn simulate_rejects_missing_depth() {
    tw().args(["simulate", "--ticks", "1", "--depth", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no level at depth 5"));
}

#[test]
fn simulate_rejects_tiny_worlds() {
    tw().args(["simulate", "--size", "8"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("world generation failed"));
}

// ---------------------------------------------------------------------------
// tw inspect
// ---------------------------------------------------------------------------

#[test]
fn saved_level_can_be_inspected() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("surface.json");

    tw().args(["simulate", "--ticks", "3", "--save"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved depth 0"));
    assert!(file.exists());

    tw().arg("inspect")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Surface"))
        .stdout(predicate::str::contains("player"))
        .stdout(predicate::str::contains("Grass"));
}

#[test]
fn saved_dungeon_keeps_its_chests() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("dungeon.json");

    tw().args(["simulate", "--ticks", "1", "--depth", "-4", "--save"])
        .arg(&file)
        .assert()
        .success();

    tw().arg("inspect")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dungeon"))
        .stdout(predicate::str::contains("dungeon_chest"))
        .stdout(predicate::str::contains("10 locked dungeon chests"));
}

#[test]
fn inspect_missing_file_fails() {
    tw().args(["inspect", "/nonexistent/level.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: cannot read"));
}

#[test]
fn inspect_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("broken.json");
    fs::write(&file, "{ \"depth\": 0 }").unwrap();

    tw().arg("inspect")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("persistence error"));
}
