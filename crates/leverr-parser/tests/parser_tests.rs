//! Parser integration tests covering representative Leverr programs.

use leverr_parser::{parse_source, Expr};

#[test]
fn fibonacci_program_parses() {
    let expr = parse_source(
        "let rec fib = fn(n) -> match n <= 1 { true -> n, false -> fib(n-1) + fib(n-2) } in fib(10)",
    )
    .unwrap();
    match expr {
        Expr::Let { name, is_rec, .. } => {
            assert_eq!(name, "fib");
            assert!(is_rec);
        }
        other => panic!("expected Let, got {other:?}"),
    }
}

#[test]
fn pipeline_program_parses() {
    let expr = parse_source(
        "[1, 2, 3, 4, 5] |> filter(fn(x) -> x > 2) |> map(fn(x) -> x * 10) |> fold(0, fn(acc, x) -> acc + x)",
    )
    .unwrap();
    assert!(matches!(expr, Expr::Pipe { .. }));
}

#[test]
fn unwrap_and_pipe_program_parses() {
    let expr = parse_source(
        r#"let parse = fn(s) -> match s { "42" -> Ok(42), _ -> Err("bad") } in "42" |> parse? |> fn n -> n * 2"#,
    )
    .unwrap();
    assert!(matches!(expr, Expr::Let { .. }));
}

#[test]
fn catch_recovery_program_parses() {
    let expr = parse_source(
        r#"let parse = fn(s) -> match s { "1" -> Ok(1), _ -> Err("bad") } in "bad" |> parse? |> fn n -> n * 2 |> catch e -> 0"#,
    )
    .unwrap();
    assert!(matches!(expr, Expr::Let { .. }));
}

#[test]
fn tag_construction_and_match_program_parses() {
    let expr = parse_source(
        "let area = fn(s) -> match s { Circle(r) -> r * r * 3, Rect(w, h) -> w * h } in area(Rect(3, 4))",
    )
    .unwrap();
    assert!(matches!(expr, Expr::Let { .. }));
}

#[test]
fn partial_application_program_parses() {
    let expr = parse_source("let add = fn(a, b) -> a + b in [1, 2, 3] |> map(add(10))").unwrap();
    assert!(matches!(expr, Expr::Let { .. }));
}

#[test]
fn unparenthesized_call_without_parens_is_not_a_call() {
    // `fib` alone, with no argument list, is a plain identifier reference.
    let expr = parse_source("fib").unwrap();
    assert!(matches!(expr, Expr::Ident(ref n, _) if n == "fib"));
}
