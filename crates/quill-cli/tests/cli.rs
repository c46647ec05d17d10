// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Smoke tests for the `quill` binary.

use std::process::{Command, Output};

use quill_synth::Unit;

fn quill(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_quill"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("QUILL_HOLDER")
        .env_remove("QUILL_LOG")
        .output()
        .expect("failed to run quill")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ── Basics ─────────────────────────────────────────────────────

#[test]
fn version_and_help() {
    let out = quill(&["version"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), format!("quill {}", env!("CARGO_PKG_VERSION")));

    let out = quill(&["help"]);
    assert!(out.status.success());
    for command in ["species", "shape", "pregen", "modes"] {
        assert!(stdout(&out).contains(command), "help is missing {command}");
    }
}

#[test]
fn unknown_command_fails() {
    let out = quill(&["frobnicate"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("unknown command `frobnicate`"));
}

// ── Species ────────────────────────────────────────────────────

#[test]
fn species_layout() {
    let out = quill(&["species", "LI"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Species_LI"));
    assert!(text.contains("extends Species_L"));
    assert!(text.contains("argL0"));
    assert!(text.contains("argI1"));
}

#[test]
fn species_json() {
    let out = quill(&["species", "LJ", "--json"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["class"], "Species_LJ");
    assert_eq!(json["fields"].as_array().map(|f| f.len()), Some(2));
    assert_eq!(json["fields"][1]["slot"], 1);
}

#[test]
fn species_rejects_bad_keys() {
    let out = quill(&["species", "LX"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("error"));
}

#[test]
fn species_emits_layout_unit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.quil");
    let out = quill(&["species", "IL", "--emit", path.to_str().unwrap()]);
    assert!(out.status.success(), "{}", stderr(&out));
    let unit = Unit::from_bytes(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(unit.name(), "Species_IL");
    assert!(unit.entry("argI0").is_some());
    assert!(unit.entry("argL1").is_some());
}

// ── Shapes ─────────────────────────────────────────────────────

#[test]
fn shape_prints_form_and_code() {
    let out = quill(&["shape", "II_I", "add"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("add_II_I"));
    assert!(text.contains("Code:"));
}

#[test]
fn access_invoker_shape_needs_a_mode() {
    let out = quill(&["shape", "LL_I", "invoke_vh", "--mode", "getAcquire"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("invoke_vh_getAcquire_LL_I"));

    let out = quill(&["shape", "LL_I", "invoke_vh"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn unresolvable_shape_fails() {
    let out = quill(&["shape", "LL_L", "add"]);
    assert_eq!(out.status.code(), Some(1));
}

// ── Pregeneration ──────────────────────────────────────────────

#[test]
fn pregenerated_holder_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("holder.quil");
    let out = quill(&["pregen", path.to_str().unwrap()]);
    assert!(out.status.success(), "{}", stderr(&out));

    let unit = Unit::from_bytes(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(unit.name(), "holder");
    assert!(unit.entry("add_II_I").is_some());
    assert!(unit.entry("invoke_vh_get_LL_I").is_some());

    // A runtime started with the holder still serves shapes.
    let out = Command::new(env!("CARGO_BIN_EXE_quill"))
        .args(["shape", "JJ_J", "sub"])
        .env("NO_COLOR", "1")
        .env("QUILL_HOLDER", &path)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", stderr(&out));
}

// ── Modes ──────────────────────────────────────────────────────

#[test]
fn modes_table() {
    let out = quill(&["modes", "int"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("31 of 31 modes"));

    let out = quill(&["modes", "String", "--read-only"]);
    assert!(stdout(&out).contains("4 of 31 modes"));

    let out = quill(&["modes", "boolean", "--memory"]);
    assert!(stdout(&out).contains("0 of 31 modes"));
}
