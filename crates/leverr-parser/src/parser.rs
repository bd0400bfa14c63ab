//! Pratt/precedence-climbing parser for Leverr.
//!
//! Builds the [`crate::ast::Expr`]/[`crate::ast::Pattern`] tree directly
//! from a token stream using a binding-power table, following the
//! `expr_bp(min_bp)` shape of a standard Pratt parser. Multi-parameter
//! lambdas and multi-argument calls are desugared here into nested
//! single-param/single-arg nodes, so every later stage only ever sees
//! that shape.

use leverr_common::token::{Token, TokenKind};
use leverr_common::Span;

use crate::ast::{BinOp, Expr, Pattern, UnOp};
use crate::error::ParseError;

/// Parse a full token stream (including the trailing `Eoi`) into a single
/// expression.
pub fn parse(tokens: Vec<Token>) -> Result<Expr, ParseError> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr_bp(0)?;
    parser.expect(TokenKind::Eoi)?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn span(&self) -> Span {
        self.current().span
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(ParseError::new(
                format!("expected {kind:?}, found {:?}", self.kind()),
                self.span(),
            ))
        }
    }

    // ── Core Pratt loop ──────────────────────────────────────────────

    fn expr_bp(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let kind = self.kind();

            if kind == TokenKind::Question && POSTFIX_UNWRAP_BP >= min_bp {
                let q = self.bump();
                let span = lhs.span().merge(q.span);
                lhs = Expr::Unwrap {
                    inner: Box::new(lhs),
                    span,
                };
                continue;
            }

            if kind == TokenKind::Dot && FIELD_ACCESS_BP.0 >= min_bp {
                self.bump();
                let field_tok = self.expect(TokenKind::Ident)?;
                let span = lhs.span().merge(field_tok.span);
                lhs = Expr::FieldAccess {
                    record: Box::new(lhs),
                    field: field_tok.lexeme,
                    span,
                };
                continue;
            }

            if let Some((l_bp, r_bp)) = infix_binding_power(kind) {
                if l_bp < min_bp {
                    break;
                }
                self.bump();
                let rhs = self.expr_bp(r_bp)?;
                let span = lhs.span().merge(rhs.span());
                lhs = if kind == TokenKind::PipeOp {
                    Expr::Pipe {
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        span,
                    }
                } else {
                    Expr::BinaryOp {
                        op: bin_op(kind),
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        span,
                    }
                };
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    // ── Prefix / atoms ───────────────────────────────────────────────

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        match self.kind() {
            TokenKind::Minus | TokenKind::Bang => {
                let op_tok = self.bump();
                let operand = self.expr_bp(PREFIX_BP)?;
                let span = op_tok.span.merge(operand.span());
                let op = if op_tok.kind == TokenKind::Minus {
                    UnOp::Neg
                } else {
                    UnOp::Not
                };
                Ok(Expr::UnaryOp {
                    op,
                    operand: Box::new(operand),
                    span,
                })
            }
            TokenKind::IntLiteral => {
                let tok = self.bump();
                let value: i64 = tok.lexeme.parse().map_err(|_| {
                    ParseError::new(format!("invalid integer literal `{}`", tok.lexeme), tok.span)
                })?;
                Ok(Expr::Int(value, tok.span))
            }
            TokenKind::FloatLiteral => {
                let tok = self.bump();
                let value: f64 = tok.lexeme.parse().map_err(|_| {
                    ParseError::new(format!("invalid float literal `{}`", tok.lexeme), tok.span)
                })?;
                Ok(Expr::Float(value, tok.span))
            }
            TokenKind::StringLiteral => {
                let tok = self.bump();
                Ok(Expr::Str(unescape(&tok.lexeme), tok.span))
            }
            TokenKind::True => {
                let tok = self.bump();
                Ok(Expr::Bool(true, tok.span))
            }
            TokenKind::False => {
                let tok = self.bump();
                Ok(Expr::Bool(false, tok.span))
            }
            TokenKind::LParen => self.parse_paren_group_or_tuple(),
            TokenKind::LBracket => self.parse_list(),
            TokenKind::LBrace => self.parse_record(),
            TokenKind::Let => self.parse_let(),
            TokenKind::Fn => self.parse_lambda(),
            TokenKind::Match => self.parse_match(),
            TokenKind::If => self.parse_conditional(),
            TokenKind::Catch => self.parse_catch(),
            TokenKind::Ident => self.parse_ident_or_call(),
            TokenKind::TagIdent => self.parse_tag(),
            _ => Err(ParseError::new(
                format!("expected expression, found {:?}", self.kind()),
                self.span(),
            )),
        }
    }

    fn parse_paren_group_or_tuple(&mut self) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::LParen)?;
        if self.at(TokenKind::RParen) {
            let close = self.bump();
            return Ok(Expr::Unit(open.span.merge(close.span)));
        }
        let first = self.expr_bp(0)?;
        if self.at(TokenKind::Comma) {
            let mut elems = vec![first];
            while self.eat(TokenKind::Comma) {
                if self.at(TokenKind::RParen) {
                    break;
                }
                elems.push(self.expr_bp(0)?);
            }
            let close = self.expect(TokenKind::RParen)?;
            Ok(Expr::Tuple(elems, open.span.merge(close.span)))
        } else {
            self.expect(TokenKind::RParen)?;
            Ok(first)
        }
    }

    fn parse_list(&mut self) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::LBracket)?;
        let mut elems = Vec::new();
        if !self.at(TokenKind::RBracket) {
            elems.push(self.expr_bp(0)?);
            while self.eat(TokenKind::Comma) {
                if self.at(TokenKind::RBracket) {
                    break;
                }
                elems.push(self.expr_bp(0)?);
            }
        }
        let close = self.expect(TokenKind::RBracket)?;
        Ok(Expr::List(elems, open.span.merge(close.span)))
    }

    fn parse_record(&mut self) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        if !self.at(TokenKind::RBrace) {
            fields.push(self.parse_record_field()?);
            while self.eat(TokenKind::Comma) {
                if self.at(TokenKind::RBrace) {
                    break;
                }
                fields.push(self.parse_record_field()?);
            }
        }
        let close = self.expect(TokenKind::RBrace)?;
        Ok(Expr::Record(fields, open.span.merge(close.span)))
    }

    fn parse_record_field(&mut self) -> Result<(String, Expr), ParseError> {
        let name_tok = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::Colon)?;
        let value = self.expr_bp(0)?;
        Ok((name_tok.lexeme, value))
    }

    fn parse_let(&mut self) -> Result<Expr, ParseError> {
        let let_tok = self.expect(TokenKind::Let)?;
        let is_rec = self.eat(TokenKind::Rec);
        let name_tok = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::Eq)?;
        let value = self.expr_bp(0)?;
        self.expect(TokenKind::In)?;
        let body = self.expr_bp(0)?;
        let span = let_tok.span.merge(body.span());
        Ok(Expr::Let {
            name: name_tok.lexeme,
            is_rec,
            value: Box::new(value),
            body: Box::new(body),
            span,
        })
    }

    fn parse_lambda(&mut self) -> Result<Expr, ParseError> {
        let fn_tok = self.expect(TokenKind::Fn)?;
        let params = if self.eat(TokenKind::LParen) {
            let mut params = Vec::new();
            if !self.at(TokenKind::RParen) {
                params.push(self.expect(TokenKind::Ident)?.lexeme);
                while self.eat(TokenKind::Comma) {
                    params.push(self.expect(TokenKind::Ident)?.lexeme);
                }
            }
            self.expect(TokenKind::RParen)?;
            params
        } else {
            vec![self.expect(TokenKind::Ident)?.lexeme]
        };
        self.expect(TokenKind::Arrow)?;
        let body = self.expr_bp(LAMBDA_BODY_MIN_BP)?;
        let whole_span = fn_tok.span.merge(body.span());

        // Desugar multi-param lambdas into nested single-param lambdas,
        // right-associative: fn(a, b) -> e  ==  fn a -> fn b -> e
        let mut result = body;
        for param in params.into_iter().rev() {
            result = Expr::Lambda {
                param,
                body: Box::new(result),
                span: whole_span,
            };
        }
        Ok(result)
    }

    fn parse_match(&mut self) -> Result<Expr, ParseError> {
        let match_tok = self.expect(TokenKind::Match)?;
        let subject = self.expr_bp(0)?;
        self.expect(TokenKind::LBrace)?;
        let mut cases = Vec::new();
        if !self.at(TokenKind::RBrace) {
            cases.push(self.parse_match_case()?);
            while self.eat(TokenKind::Comma) {
                if self.at(TokenKind::RBrace) {
                    break;
                }
                cases.push(self.parse_match_case()?);
            }
        }
        let close = self.expect(TokenKind::RBrace)?;
        let span = match_tok.span.merge(close.span);
        Ok(Expr::Match {
            subject: Box::new(subject),
            cases,
            span,
        })
    }

    fn parse_match_case(&mut self) -> Result<(Pattern, Expr), ParseError> {
        let pattern = self.parse_pattern()?;
        self.expect(TokenKind::Arrow)?;
        let body = self.expr_bp(0)?;
        Ok((pattern, body))
    }

    /// `if cond { then } { else }`. Leverr has no `then`/`else` keyword, so
    /// both branches are delimited by braces, matching the brace-delimited
    /// shape `match` already uses for its arms.
    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let if_tok = self.expect(TokenKind::If)?;
        let cond = self.expr_bp(0)?;
        self.expect(TokenKind::LBrace)?;
        let then_branch = self.expr_bp(0)?;
        self.expect(TokenKind::RBrace)?;
        self.expect(TokenKind::LBrace)?;
        let else_branch = self.expr_bp(0)?;
        let close = self.expect(TokenKind::RBrace)?;
        let span = if_tok.span.merge(close.span);
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            span,
        })
    }

    fn parse_catch(&mut self) -> Result<Expr, ParseError> {
        let catch_tok = self.expect(TokenKind::Catch)?;
        let err_name = self.expect(TokenKind::Ident)?.lexeme;
        self.expect(TokenKind::Arrow)?;
        let fallback = self.expr_bp(0)?;
        let span = catch_tok.span.merge(fallback.span());
        Ok(Expr::RecoveryBinder {
            protected: None,
            err_name,
            fallback: Box::new(fallback),
            span,
        })
    }

    fn parse_ident_or_call(&mut self) -> Result<Expr, ParseError> {
        let tok = self.bump();
        let mut expr = Expr::Ident(tok.lexeme, tok.span);
        while self.at(TokenKind::LParen) {
            expr = self.parse_call_args(expr)?;
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self, func: Expr) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            args.push(self.expr_bp(0)?);
            while self.eat(TokenKind::Comma) {
                if self.at(TokenKind::RParen) {
                    break;
                }
                args.push(self.expr_bp(0)?);
            }
        }
        let close = self.expect(TokenKind::RParen)?;
        let whole_span = func.span().merge(open.span.merge(close.span));

        if args.is_empty() {
            // `f()` applies f to unit.
            return Ok(Expr::App {
                func: Box::new(func),
                arg: Box::new(Expr::Unit(open.span.merge(close.span))),
                span: whole_span,
            });
        }

        // Desugar multi-arg calls into nested single-arg applications,
        // left-associative: f(a, b) == (f(a))(b)
        let mut result = func;
        for arg in args {
            result = Expr::App {
                func: Box::new(result),
                arg: Box::new(arg),
                span: whole_span,
            };
        }
        Ok(result)
    }

    fn parse_tag(&mut self) -> Result<Expr, ParseError> {
        let tok = self.bump();
        let mut span = tok.span;
        let mut args = Vec::new();
        if self.eat(TokenKind::LParen) {
            if !self.at(TokenKind::RParen) {
                args.push(self.expr_bp(0)?);
                while self.eat(TokenKind::Comma) {
                    if self.at(TokenKind::RParen) {
                        break;
                    }
                    args.push(self.expr_bp(0)?);
                }
            }
            let close = self.expect(TokenKind::RParen)?;
            span = span.merge(close.span);
        }
        Ok(Expr::Tag {
            name: tok.lexeme,
            args,
            span,
        })
    }

    // ── Patterns ─────────────────────────────────────────────────────

    fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        match self.kind() {
            TokenKind::IntLiteral => {
                let tok = self.bump();
                let value: i64 = tok.lexeme.parse().map_err(|_| {
                    ParseError::new(format!("invalid integer literal `{}`", tok.lexeme), tok.span)
                })?;
                Ok(Pattern::Int(value, tok.span))
            }
            TokenKind::FloatLiteral => {
                let tok = self.bump();
                let value: f64 = tok.lexeme.parse().map_err(|_| {
                    ParseError::new(format!("invalid float literal `{}`", tok.lexeme), tok.span)
                })?;
                Ok(Pattern::Float(value, tok.span))
            }
            TokenKind::StringLiteral => {
                let tok = self.bump();
                Ok(Pattern::Str(unescape(&tok.lexeme), tok.span))
            }
            TokenKind::True => {
                let tok = self.bump();
                Ok(Pattern::Bool(true, tok.span))
            }
            TokenKind::False => {
                let tok = self.bump();
                Ok(Pattern::Bool(false, tok.span))
            }
            TokenKind::Underscore => {
                let tok = self.bump();
                Ok(Pattern::Wildcard(tok.span))
            }
            TokenKind::Ident => {
                let tok = self.bump();
                Ok(Pattern::Ident(tok.lexeme, tok.span))
            }
            TokenKind::TagIdent => {
                let tok = self.bump();
                let mut span = tok.span;
                let mut subpatterns = Vec::new();
                if self.eat(TokenKind::LParen) {
                    if !self.at(TokenKind::RParen) {
                        subpatterns.push(self.parse_pattern()?);
                        while self.eat(TokenKind::Comma) {
                            if self.at(TokenKind::RParen) {
                                break;
                            }
                            subpatterns.push(self.parse_pattern()?);
                        }
                    }
                    let close = self.expect(TokenKind::RParen)?;
                    span = span.merge(close.span);
                }
                Ok(Pattern::Tag {
                    name: tok.lexeme,
                    subpatterns,
                    span,
                })
            }
            TokenKind::LParen => {
                let open = self.expect(TokenKind::LParen)?;
                let first = self.parse_pattern()?;
                if self.at(TokenKind::Comma) {
                    let mut elems = vec![first];
                    while self.eat(TokenKind::Comma) {
                        if self.at(TokenKind::RParen) {
                            break;
                        }
                        elems.push(self.parse_pattern()?);
                    }
                    let close = self.expect(TokenKind::RParen)?;
                    Ok(Pattern::Tuple(elems, open.span.merge(close.span)))
                } else {
                    self.expect(TokenKind::RParen)?;
                    Ok(first)
                }
            }
            TokenKind::LBrace => {
                let open = self.expect(TokenKind::LBrace)?;
                let mut fields = Vec::new();
                if !self.at(TokenKind::RBrace) {
                    fields.push(self.parse_record_pattern_field()?);
                    while self.eat(TokenKind::Comma) {
                        if self.at(TokenKind::RBrace) {
                            break;
                        }
                        fields.push(self.parse_record_pattern_field()?);
                    }
                }
                let close = self.expect(TokenKind::RBrace)?;
                Ok(Pattern::Record(fields, open.span.merge(close.span)))
            }
            _ => Err(ParseError::new(
                format!("expected pattern, found {:?}", self.kind()),
                self.span(),
            )),
        }
    }

    fn parse_record_pattern_field(&mut self) -> Result<(String, Pattern), ParseError> {
        let name_tok = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::Colon)?;
        let pattern = self.parse_pattern()?;
        Ok((name_tok.lexeme, pattern))
    }
}

// ── Binding power table (spec-pinned) ────────────────────────────────

const LAMBDA_BODY_MIN_BP: u8 = 6;
const PREFIX_BP: u8 = 80;
const POSTFIX_UNWRAP_BP: u8 = 90;
const FIELD_ACCESS_BP: (u8, u8) = (95, 96);

fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
    match kind {
        TokenKind::PipeOp => Some((5, 6)),
        TokenKind::PipePipe => Some((10, 11)),
        TokenKind::AmpAmp => Some((20, 21)),
        TokenKind::EqEq | TokenKind::NotEq => Some((30, 31)),
        TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => Some((40, 41)),
        TokenKind::PlusPlus => Some((50, 51)),
        TokenKind::Plus | TokenKind::Minus => Some((60, 61)),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some((70, 71)),
        _ => None,
    }
}

fn bin_op(kind: TokenKind) -> BinOp {
    match kind {
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,
        TokenKind::Percent => BinOp::Mod,
        TokenKind::PlusPlus => BinOp::Concat,
        TokenKind::EqEq => BinOp::Eq,
        TokenKind::NotEq => BinOp::NotEq,
        TokenKind::Lt => BinOp::Lt,
        TokenKind::Gt => BinOp::Gt,
        TokenKind::LtEq => BinOp::LtEq,
        TokenKind::GtEq => BinOp::GtEq,
        TokenKind::AmpAmp => BinOp::And,
        TokenKind::PipePipe => BinOp::Or,
        other => unreachable!("{other:?} is not a binary operator"),
    }
}

/// Strip the surrounding quotes from a string lexeme and resolve the
/// minimal escape set (`\"`, `\\`, `\n`, `\t`).
fn unescape(lexeme: &str) -> String {
    let inner = &lexeme[1..lexeme.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_source(source: &str) -> Expr {
        let tokens = leverr_lexer::lex(source).expect("source must lex cleanly");
        parse(tokens).expect("source must parse cleanly")
    }

    #[test]
    fn parses_integer_literal() {
        assert_eq!(parse_source("42"), Expr::Int(42, Span::new(0, 2)));
    }

    #[test]
    fn parses_let_rec() {
        match parse_source("let rec fib = fn(n) -> n in fib") {
            Expr::Let { name, is_rec, .. } => {
                assert_eq!(name, "fib");
                assert!(is_rec);
            }
            other => panic!("expected Let, got {other:?}"),
        }
    }

    #[test]
    fn multi_param_lambda_desugars_right_associative() {
        match parse_source("fn(a, b) -> a") {
            Expr::Lambda { param, body, .. } => {
                assert_eq!(param, "a");
                assert!(matches!(*body, Expr::Lambda { .. }));
            }
            other => panic!("expected Lambda, got {other:?}"),
        }
    }

    #[test]
    fn multi_arg_call_desugars_left_associative() {
        match parse_source("f(1, 2)") {
            Expr::App { func, arg, .. } => {
                assert_eq!(*arg, Expr::Int(2, Span::new(5, 6)));
                assert!(matches!(*func, Expr::App { .. }));
            }
            other => panic!("expected App, got {other:?}"),
        }
    }

    #[test]
    fn pipe_binds_looser_than_lambda_body() {
        // x |> fn n -> n * 2 |> g  ==  x |> (fn n -> n * 2) |> g
        let expr = parse_source("x |> fn n -> n * 2 |> g");
        match expr {
            Expr::Pipe { lhs, rhs, .. } => {
                // outer pipe is left-associative: (x |> (fn ...)) |> g
                assert!(matches!(*rhs, Expr::Ident(ref n, _) if n == "g"));
                match *lhs {
                    Expr::Pipe { rhs: inner_rhs, .. } => {
                        assert!(matches!(*inner_rhs, Expr::Lambda { .. }));
                    }
                    other => panic!("expected nested Pipe, got {other:?}"),
                }
            }
            other => panic!("expected Pipe, got {other:?}"),
        }
    }

    #[test]
    fn postfix_unwrap_then_pipe() {
        let expr = parse_source(r#""42" |> parse?"#);
        match expr {
            Expr::Pipe { rhs, .. } => {
                assert!(matches!(*rhs, Expr::Unwrap { .. }));
            }
            other => panic!("expected Pipe, got {other:?}"),
        }
    }

    #[test]
    fn zero_arg_tag_has_no_args() {
        match parse_source("Circle") {
            Expr::Tag { name, args, .. } => {
                assert_eq!(name, "Circle");
                assert!(args.is_empty());
            }
            other => panic!("expected Tag, got {other:?}"),
        }
    }

    #[test]
    fn tuple_requires_comma() {
        assert_eq!(parse_source("(1)"), Expr::Int(1, Span::new(1, 2)));
        assert!(matches!(parse_source("(1, 2)"), Expr::Tuple(elems, _) if elems.len() == 2));
    }

    #[test]
    fn unit_literal() {
        assert!(matches!(parse_source("()"), Expr::Unit(_)));
    }

    #[test]
    fn match_with_tag_patterns() {
        let expr = parse_source(
            "match s { Circle(r) -> r, Rect(w, h) -> w, _ -> 0 }",
        );
        match expr {
            Expr::Match { cases, .. } => assert_eq!(cases.len(), 3),
            other => panic!("expected Match, got {other:?}"),
        }
    }

    #[test]
    fn field_access_binds_tighter_than_unwrap() {
        let expr = parse_source("a.b?");
        assert!(matches!(expr, Expr::Unwrap { .. }));
    }

    #[test]
    fn string_escape_unescaping() {
        assert_eq!(unescape(r#""a\"b\n""#), "a\"b\n");
    }
}
