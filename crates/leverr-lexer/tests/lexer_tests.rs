use leverr_common::token::TokenKind;
use leverr_lexer::lex;

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).expect("fixture must lex cleanly").into_iter().map(|t| t.kind).collect()
}

#[test]
fn test_keywords() {
    assert_eq!(
        kinds("let rec fn match catch in if true false"),
        vec![
            TokenKind::Let,
            TokenKind::Rec,
            TokenKind::Fn,
            TokenKind::Match,
            TokenKind::Catch,
            TokenKind::In,
            TokenKind::If,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Eoi,
        ]
    );
}

#[test]
fn test_pipeline_program_lexes_cleanly() {
    let tokens = lex(
        "[1, 2, 3, 4, 5] |> filter(fn(x) -> x > 2) |> map(fn(x) -> x * 10) |> fold(0, fn(acc, x) -> acc + x)",
    )
    .unwrap();
    assert_eq!(tokens.last().unwrap().kind, TokenKind::Eoi);
    assert!(tokens.iter().filter(|t| t.kind == TokenKind::PipeOp).count() == 3);
}

#[test]
fn test_recovery_binder_program_lexes_cleanly() {
    let source = r#"let parse = fn(s) -> match s { "42" -> Ok(42), _ -> Err("bad") } in "42" |> parse? |> fn n -> n * 2"#;
    let tokens = lex(source).unwrap();
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Question));
    assert!(tokens.iter().any(|t| t.kind == TokenKind::TagIdent && t.lexeme == "Ok"));
}
