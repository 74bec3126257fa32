//! Integration tests for the Y2K interpreter
//!
//! Tests the whole path from program files to output:
//! - Raw and timestamp sourcing
//! - Execution in both modes
//! - Argument injection
//! - Fatal error reporting

use insta::assert_snapshot;
use std::fs;
use y2k::interp::{Context, ExecMode, Interpreter, Outcome, RunOptions};
use y2k::source;

/// Helper to run a digit stream in one mode and return its output
fn run_in(mode: ExecMode, window: usize, digits: &str) -> (String, Interpreter<Vec<u8>>) {
    let mut interp = Interpreter::with_writer(Context::new(window, false), Vec::new())
        .with_options(RunOptions { mode });
    interp.run(digits).unwrap();
    let out = String::from_utf8(interp.writer().clone()).unwrap();
    (out, interp)
}

/// Helper to run in both modes, checking they agree
fn output(window: usize, digits: &str) -> String {
    let (recursive, _) = run_in(ExecMode::Recursive, window, digits);
    let (iterative, _) = run_in(ExecMode::Iterative, window, digits);
    assert_eq!(recursive, iterative, "modes disagree on {digits}");
    recursive
}

/// Helper to strip spaces used to group instructions in test programs
fn program(text: &str) -> String {
    text.replace(' ', "")
}

const HELLO_RAW: &str = "\
# hello world, two digits per group
09 01 22                          : print text, 22 digits
08 05 12 12 15 00 23 15 18 12 04  : h e l l o _ w o r l d
";

// ============================================
// Programs
// ============================================

#[test]
fn test_counter_loop() {
    let out = output(1, &program("81210 612115 711011 9211 1999"));
    assert_eq!(out, "1\n2\n3\n4\n5\n");
}

#[test]
fn test_even_numbers() {
    let out = output(1, &program("81210 612116 711011 614012 9211 2000 1999"));
    assert_eq!(out, "2\n4\n6\n");
}

#[test]
fn test_deeply_nested_ifs() {
    let mut digits = program("81211");
    for _ in 0..2000 {
        digits.push_str("611011");
    }
    digits.push_str("9211");
    assert_eq!(output(1, &digits), "1\n");
}

#[test]
fn test_runs_are_isolated() {
    let (_, first) = run_in(ExecMode::Recursive, 1, "81231009211");
    assert!(first.variables().contains(1));
    let (out, second) = run_in(ExecMode::Recursive, 1, "9211");
    assert_eq!(out, "\n");
    assert_eq!(second.variables().len(), 1);
}

#[test]
fn test_continue_stops_everything() {
    let mut interp = Interpreter::with_writer(Context::default(), Vec::new());
    let outcome = interp.run(&program("91289 4 91289")).unwrap();
    assert_eq!(outcome, Outcome::Aborted);
    assert_eq!(interp.writer().as_slice(), b"hi\n");
}

// ============================================
// Sourcing
// ============================================

#[test]
fn test_raw_file_window_two() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hello.y2k");
    fs::write(&path, HELLO_RAW).unwrap();

    let digits = source::load(&path, 2).unwrap();
    assert_snapshot!(digits, @"0901220805121215002315181204");
    assert_eq!(output(2, &digits), "hello world\n");
}

#[test]
fn test_exported_directory_runs() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("hello.txt");
    fs::write(&raw, HELLO_RAW).unwrap();
    let outdir = dir.path().join("hello");

    let digits = source::read_raw(&raw).unwrap();
    let files = source::export(&digits, &outdir, 2).unwrap();
    assert_eq!(files.len(), 2);

    let loaded = source::load(&outdir, 2).unwrap();
    assert!(loaded.starts_with(&digits));
    assert_eq!(output(2, &loaded), "hello world\n");
}

#[test]
fn test_exported_files_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    let files = source::export("91289", dir.path(), 1).unwrap();
    for file in files {
        assert_eq!(fs::metadata(&file).unwrap().len(), 0);
        assert!(source::file_timestamp(&file, 1).unwrap().is_some());
    }
}

// ============================================
// Arguments and state
// ============================================

#[test]
fn test_args_are_readable() {
    let mut interp = Interpreter::with_writer(Context::default(), Vec::new());
    interp.inject_arg("hello");
    interp.inject_arg("41");
    interp.run(&program("9219 7810118 9218")).unwrap();
    assert_eq!(interp.writer().as_slice(), b"hello\n42\n");
}

#[test]
fn test_variables_dump_as_json() {
    let (_, interp) = run_in(ExecMode::Recursive, 1, &program("81231009211 821289"));
    let json = serde_json::to_string(interp.variables()).unwrap();
    assert_snapshot!(json, @r#"{"1":{"id":1,"kind":"number","size":3,"text":"100","number":100.0},"2":{"id":2,"kind":"text","size":2,"text":"hi","number":0.0}}"#);
}

// ============================================
// Errors
// ============================================

#[test]
fn test_fatal_print_error_message() {
    let mut interp = Interpreter::with_writer(Context::default(), Vec::new());
    let err = interp.run("90119211").unwrap_err();
    assert_snapshot!(err.to_string(), @"Runtime error at digit 1: print instruction has no type selected");
}

#[test]
fn test_fatal_error_converts() {
    let mut interp = Interpreter::with_writer(Context::default(), Vec::new());
    let err: y2k::Error = interp.run("97119211").unwrap_err().into();
    assert!(err.to_string().contains("unknown print type: 7"));
}
