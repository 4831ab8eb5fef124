//! Integration tests for the wt CLI commands.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const END_NOTICE: &str = "The Waaagh! is over. Your story ends here.";

const GROT_RESPONSE: &str = "STORY: You smash a grot.
CHOICES:
1) Run
2) Loot
3) Taunt
4) Flee";

/// A script with two custom replies.
fn boots_script(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("boots.txt");
    fs::write(
        &path,
        "STORY: Da grot steals yer boots.
CHOICES:
1) Chase him
2) Ignore it
3) Eat a squig
4) Shout at da sky
---
STORY: Ya catch da grot and get yer boots back.
CHOICES:
1) Put dem on
2) Kick da grot
3) Wave at da Nob
4) Go back to sleep
",
    )
    .unwrap();
    path
}

fn wt() -> Command {
    let mut cmd = Command::cargo_bin("wt").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("WT_LOG");
    cmd
}

// ---------------------------------------------------------------------------
// genres
// ---------------------------------------------------------------------------

#[test]
fn genres_lists_all_tags() {
    wt().arg("genres").assert().success().stdout(
        predicate::str::contains("horror")
            .and(predicate::str::contains("funny"))
            .and(predicate::str::contains("adventure"))
            .and(predicate::str::contains("epic"))
            .and(predicate::str::contains("default"))
            .and(predicate::str::contains("grim, brutal and chaotic")),
    );
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[test]
fn parse_file_prints_story_and_choices() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reply.txt");
    fs::write(&path, GROT_RESPONSE).unwrap();

    wt().args(["parse", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("You smash a grot.")
                .and(predicate::str::contains("1) Run"))
                .and(predicate::str::contains("4) Flee"))
                .and(predicate::str::contains("STORY:").not()),
        );
}

#[test]
fn parse_stdin_pads_missing_choices() {
    wt().arg("parse")
        .write_stdin("STORY: Lonely grot.\nCHOICES:\n1) Cry")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Lonely grot.")
                .and(predicate::str::contains("1) Cry"))
                .and(predicate::str::contains("4) Choice 4")),
        );
}

#[test]
fn parse_missing_file_fails() {
    wt().args(["parse", "/nonexistent/reply.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: failed to read"));
}

#[test]
fn parse_empty_input_fails() {
    wt().arg("parse")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty response"));
}

// ---------------------------------------------------------------------------
// play
// ---------------------------------------------------------------------------

#[test]
fn play_two_turns_ends_after_second_choice() {
    wt().args([
        "play", "--engine", "scripted", "--genre", "funny", "--turns", "2",
    ])
    .write_stdin("1\n1\n")
    .assert()
    .success()
    .stdout(
        predicate::str::contains("funny tale, 2 turns")
            .and(predicate::str::contains("You charge through da smoke"))
            .and(predicate::str::contains("Da Chimera goes up"))
            .and(predicate::str::contains(END_NOTICE))
            .and(predicate::str::contains("Da Warboss stomps over").not()),
    );
}

#[test]
fn play_one_turn_ends_on_first_choice() {
    wt().args(["play", "--engine", "scripted", "--turns", "1"])
        .write_stdin("3\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains(END_NOTICE)
                .and(predicate::str::contains("Da Chimera goes up").not()),
        );
}

#[test]
fn play_invalid_turns_defaults_to_five() {
    wt().args(["play", "--engine", "scripted", "--turns", "lots"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("5 turns")
                .and(predicate::str::contains("The story was cut short.")),
        );
}

#[test]
fn play_zero_turns_defaults_to_five() {
    wt().args(["play", "--engine", "scripted", "--turns", "0"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("5 turns"));
}

#[test]
fn play_unknown_genre_falls_back_to_default() {
    wt().args(["play", "--engine", "scripted", "--genre", "romance"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("default tale"));
}

#[test]
fn play_rejects_out_of_range_choice() {
    wt().args(["play", "--engine", "scripted"])
        .write_stdin("7\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pick a choice from 1 to 4"));
}

#[test]
fn play_eof_ends_quietly() {
    wt().args(["play", "--engine", "scripted"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("You charge through da smoke"));
}

#[test]
fn play_custom_script() {
    let dir = TempDir::new().unwrap();
    let script = boots_script(&dir);

    wt().args([
        "play",
        "--engine",
        "scripted",
        "--turns",
        "3",
        "--script",
        script.to_str().unwrap(),
    ])
    .write_stdin("1\nq\n")
    .assert()
    .success()
    .stdout(
        predicate::str::contains("Da grot steals yer boots.")
            .and(predicate::str::contains("Chase him"))
            .and(predicate::str::contains("Ya catch da grot")),
    );
}

#[test]
fn play_writes_transcript() {
    let dir = TempDir::new().unwrap();
    let script = boots_script(&dir);
    let transcript = dir.path().join("tale.md");

    wt().args([
        "play",
        "--engine",
        "scripted",
        "--turns",
        "1",
        "--script",
        script.to_str().unwrap(),
        "--transcript",
        transcript.to_str().unwrap(),
    ])
    .write_stdin("2\n")
    .assert()
    .success()
    .stdout(predicate::str::contains("Transcript written"));

    let content = fs::read_to_string(&transcript).unwrap();
    assert!(content.starts_with("# Waaagh Tale"));
    assert!(content.contains("Da grot steals yer boots."));
    assert!(content.contains("**You chose:** Ignore it"));
    assert!(content.contains(END_NOTICE));
}

#[test]
fn play_writes_plain_text_transcript() {
    let dir = TempDir::new().unwrap();
    let script = boots_script(&dir);
    let transcript = dir.path().join("tale.txt");

    wt().args([
        "play",
        "--engine",
        "scripted",
        "--turns",
        "1",
        "--script",
        script.to_str().unwrap(),
        "--transcript",
        transcript.to_str().unwrap(),
    ])
    .write_stdin("1\n")
    .assert()
    .success();

    let content = fs::read_to_string(&transcript).unwrap();
    assert!(content.starts_with("Waaagh Tale\n"));
    assert!(content.contains("> Chase him"));
    assert!(content.contains(&format!("-- {END_NOTICE} --")));
    assert!(!content.contains("**"));
}

#[test]
fn play_eof_closes_transcript() {
    let dir = TempDir::new().unwrap();
    let script = boots_script(&dir);
    let transcript = dir.path().join("tale.md");

    wt().args([
        "play",
        "--engine",
        "scripted",
        "--script",
        script.to_str().unwrap(),
        "--transcript",
        transcript.to_str().unwrap(),
    ])
    .write_stdin("")
    .assert()
    .success()
    .stdout(predicate::str::contains("The story was cut short."));

    let content = fs::read_to_string(&transcript).unwrap();
    assert!(content.contains("## The story was cut short."));
}

#[test]
fn play_missing_script_fails() {
    wt().args([
        "play",
        "--engine",
        "scripted",
        "--script",
        "/nonexistent/script.txt",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn play_unreachable_server_fails() {
    wt().args(["play", "--base-url", "http://127.0.0.1:1"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: failed to load model"));
}

#[test]
fn play_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("wt.json");
    fs::write(&config, "{ not json").unwrap();

    wt().args(["play", "--config", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}

// ---------------------------------------------------------------------------
// models
// ---------------------------------------------------------------------------

#[test]
fn models_unreachable_server_fails() {
    wt().args(["models", "--base-url", "http://127.0.0.1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to list models"));
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

#[test]
fn help_lists_subcommands() {
    wt().arg("--help").assert().success().stdout(
        predicate::str::contains("play")
            .and(predicate::str::contains("tui"))
            .and(predicate::str::contains("models"))
            .and(predicate::str::contains("parse"))
            .and(predicate::str::contains("genres")),
    );
}
