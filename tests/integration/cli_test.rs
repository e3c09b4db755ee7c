//! CLI behavior: output placement, atomicity, failure modes.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn flattex() -> Command {
    Command::cargo_bin("flattex").unwrap()
}

#[test]
fn flattens_a_file_next_to_the_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("paper.tex");
    fs::write(
        &input,
        "\\begin{document}\nHello $x$ world.\n\\end{document}\n",
    )
    .unwrap();

    flattex()
        .arg(&input)
        .arg("--no-cache")
        .assert()
        .success()
        .stdout(predicate::str::contains("processing completed"));

    let output = fs::read_to_string(dir.path().join("paper.txt")).unwrap();
    assert!(output.contains("Hello"));
    assert!(output.contains("world."));
}

#[test]
fn respects_explicit_output_path() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("frag.tex");
    let output = dir.path().join("result.txt");
    fs::write(&input, "Just a fragment paragraph.\n").unwrap();

    flattex()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--no-cache")
        .assert()
        .success();

    assert!(output.exists());
}

#[test]
fn directory_input_discovers_the_main_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("macros.tex"), "% macros only\n").unwrap();
    fs::write(
        dir.path().join("main.tex"),
        "\\begin{document}\nDiscovered body.\n\\end{document}\n",
    )
    .unwrap();

    flattex()
        .arg(dir.path())
        .arg("--no-cache")
        .assert()
        .success();

    let output = fs::read_to_string(dir.path().join("main.txt")).unwrap();
    assert!(output.contains("Discovered body."));
}

#[test]
fn fatal_budget_violation_leaves_no_output_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("long.tex");
    fs::write(&input, format!("{}\n", "x ".repeat(200))).unwrap();

    flattex()
        .arg(&input)
        .arg("--no-cache")
        .arg("--char-limit")
        .arg("50")
        .assert()
        .failure();

    assert!(!dir.path().join("long.txt").exists());
}

#[test]
fn init_config_writes_the_config_file() {
    let dir = TempDir::new().unwrap();

    flattex()
        .env("XDG_CONFIG_HOME", dir.path())
        .arg("--init-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration saved"));

    let saved = fs::read_to_string(dir.path().join("flattex/config.toml")).unwrap();
    assert!(saved.contains("char_limit"));
}

#[test]
fn debug_mode_emits_object_side_file_with_scan_tokens() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("paper.tex"),
        "\\begin{document}\nMasked $x+y$ here.\n\\end{document}\n",
    )
    .unwrap();

    flattex()
        .current_dir(dir.path())
        .arg("paper.tex")
        .arg("--no-cache")
        .arg("--debug")
        .assert()
        .success();

    let objs = fs::read_to_string(dir.path().join("objs")).unwrap();
    assert!(objs.contains("$x+y$"), "objs was: {objs}");
}

#[test]
fn missing_input_fails_cleanly() {
    flattex()
        .arg("/nonexistent/paper.tex")
        .arg("--no-cache")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input not found"));
}
