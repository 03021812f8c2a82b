//! Integration tests for the command-line interface
//!
//! Runs the built binary against temporary Dart trees.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_opacity-migrate"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("OPACITY_MIGRATE_ROOT")
        .output()
        .unwrap()
}

fn run_on(root: &Path) -> Output {
    run_cli(&[root.to_str().unwrap()])
}

/// `a.dart` and `b.txt` with the same deprecated call
fn setup_mixed_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.dart"), "Colors.red.withOpacity(0.8)").unwrap();
    fs::write(dir.path().join("b.txt"), "Colors.red.withOpacity(0.8)").unwrap();
    dir
}

#[test]
fn test_help() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("withValues(alpha: x)"));
}

#[test]
fn test_fixes_only_dart_files() {
    let root = setup_mixed_tree();

    let output = run_on(root.path());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Fixed: "));
    assert!(stdout.contains("a.dart"));
    assert!(!stdout.contains("b.txt"));
    assert!(stdout.contains("\n\nTotal files fixed: 1\n"));

    assert_eq!(
        fs::read_to_string(root.path().join("a.dart")).unwrap(),
        "Colors.red.withValues(alpha: 0.8)"
    );
    assert_eq!(
        fs::read_to_string(root.path().join("b.txt")).unwrap(),
        "Colors.red.withOpacity(0.8)"
    );
}

#[test]
fn test_second_run_fixes_nothing() {
    let root = setup_mixed_tree();

    run_on(root.path());
    let output = run_on(root.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Fixed: "));
    assert!(stdout.contains("Total files fixed: 0"));
    assert_eq!(
        fs::read_to_string(root.path().join("a.dart")).unwrap(),
        "Colors.red.withValues(alpha: 0.8)"
    );
}

#[test]
fn test_root_from_environment() {
    let root = setup_mixed_tree();

    let output = Command::new(env!("CARGO_BIN_EXE_opacity-migrate"))
        .env("NO_COLOR", "1")
        .env("OPACITY_MIGRATE_ROOT", root.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total files fixed: 1"));
}

#[test]
fn test_diff_output() {
    let root = setup_mixed_tree();

    let output = run_cli(&[root.path().to_str().unwrap(), "--diff"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-Colors.red.withOpacity(0.8)"));
    assert!(stdout.contains("+Colors.red.withValues(alpha: 0.8)"));
}

#[test]
fn test_bad_file_is_skipped_and_fails_the_run() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("a_bad.dart"), b"\xff\xfe.withOpacity(0.5)").unwrap();
    fs::write(root.path().join("b_good.dart"), "x.withOpacity(0.5)").unwrap();

    let output = run_on(root.path());
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("b_good.dart"));
    assert!(stdout.contains("Total files fixed: 1"));
    assert!(stdout.contains("1 skipped"));
    assert!(stderr.contains("a_bad.dart"));

    assert_eq!(
        fs::read_to_string(root.path().join("b_good.dart")).unwrap(),
        "x.withValues(alpha: 0.5)"
    );
}

#[test]
fn test_missing_root() {
    let output = run_cli(&["/nonexistent/flutter/lib"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid root directory"));
}

#[test]
fn test_root_must_be_directory() {
    let root = setup_mixed_tree();
    let output = run_on(&root.path().join("a.dart"));
    assert!(!output.status.success());
    assert_eq!(
        fs::read_to_string(root.path().join("a.dart")).unwrap(),
        "Colors.red.withOpacity(0.8)"
    );
}

#[test]
fn test_root_is_required() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
}
