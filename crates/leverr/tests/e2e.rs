//! End-to-end integration tests for the `leverr` CLI's `run` subcommand.
//!
//! Each test writes a source file, invokes the compiled `leverr` binary
//! against it, and asserts on stdout/exit status.

use std::process::Command;

fn run(source: &str) -> std::process::Output {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let file = dir.path().join("main.lv");
    std::fs::write(&file, source).expect("failed to write source file");

    Command::new(env!("CARGO_BIN_EXE_leverr"))
        .args(["run", file.to_str().unwrap()])
        .output()
        .expect("failed to invoke leverr")
}

fn run_ok(source: &str) -> String {
    let output = run(source);
    assert!(
        output.status.success(),
        "leverr run failed:\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim_end().to_string()
}

#[test]
fn evaluates_arithmetic() {
    assert_eq!(run_ok("1 + 2 * 3"), "7");
}

#[test]
fn recursive_fibonacci() {
    let source = r#"
let rec fib = fn(n) -> if n < 2 { n } { fib(n - 1) + fib(n - 2) }
in fib(10)
"#;
    assert_eq!(run_ok(source), "55");
}

#[test]
fn pipeline_through_builtins() {
    let source = r#"[1, 2, 3, 4] |> filter(fn(x) -> x % 2 == 0) |> map(fn(x) -> x * 10) |> fold(0, fn(a) -> fn(b) -> a + b)"#;
    assert_eq!(run_ok(source), "60");
}

#[test]
fn record_literal_and_field_access() {
    assert_eq!(run_ok(r#"{ name: "leverr", version: 1 }.version"#), "1");
}

#[test]
fn tag_match_computes_area() {
    let source = r#"
let area = fn(shape) -> match shape {
  Circle(r) -> r * r,
  Square(s) -> s * s
} in area(Circle(3))
"#;
    assert_eq!(run_ok(source), "9");
}

#[test]
fn recovery_binder_swallows_an_early_return() {
    let source = r#"
let divide = fn(a) -> fn(b) -> if b == 0 { Err("division by zero") } { Ok(a / b) }
in divide(10)(0)? |> catch e -> 0
"#;
    assert_eq!(run_ok(source), "0");
}

#[test]
fn print_writes_to_stdout_unquoted() {
    let output = run_ok(r#"print("hello")"#);
    assert!(output.contains("hello"), "stdout was: {output}");
}

#[test]
fn parse_error_exits_nonzero() {
    let output = run("let x =");
    assert!(!output.status.success());
}

#[test]
fn type_error_exits_nonzero() {
    let output = run(r#"1 + "a""#);
    assert!(!output.status.success());
}

#[test]
fn runtime_error_exits_nonzero() {
    let output = run("1 / 0");
    assert!(!output.status.success());
}

#[test]
fn missing_file_exits_nonzero() {
    let output = Command::new(env!("CARGO_BIN_EXE_leverr"))
        .args(["run", "/nonexistent/path/does-not-exist.lv"])
        .output()
        .expect("failed to invoke leverr");
    assert!(!output.status.success());
}
