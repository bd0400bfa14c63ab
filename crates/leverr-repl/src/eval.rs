//! Line-level evaluation: the shell's `eval(line)` collaborator from
//! spec.md §6, grounded on `mesh-repl::jit::jit_eval`'s definition/
//! expression dispatch with the JIT step replaced by a direct call into
//! `leverr_eval::evaluate`.

use leverr_common::diagnostic::render;
use leverr_common::token::TokenKind;
use leverr_eval::Sink;

use crate::session::Session;

/// The result of evaluating one line at the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The line evaluated to a value; this is its rendered form.
    Value(String),
    /// The line was a `let [rec] name = rhs` definition with no `in`;
    /// it has been stored in the session and type-checks to `ty`.
    Defined { name: String, ty: String },
    /// The line's type, requested via `:type`.
    TypeInfo(String),
    /// The names currently bound in the session, requested via `:env`.
    EnvListing(Vec<String>),
    /// A lex, parse, type, or runtime diagnostic.
    Diagnostic(String),
    /// An empty line; nothing to do.
    Empty,
    /// `:quit` or `:exit` was entered.
    Quit,
}

/// Evaluate one line of input against `session`, writing anything the
/// `print` built-in emits to `sink`.
pub fn eval_line(session: &mut Session, line: &str, sink: &mut dyn Sink) -> Outcome {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Outcome::Empty;
    }

    if let Some(rest) = trimmed.strip_prefix(':') {
        return eval_command(session, rest.trim());
    }

    if let Some((name, is_rec, rhs)) = definition_header(trimmed) {
        return eval_definition(session, &name, is_rec, &rhs);
    }

    eval_expression(session, trimmed, sink)
}

fn eval_command(session: &Session, command: &str) -> Outcome {
    let (verb, arg) = match command.split_once(char::is_whitespace) {
        Some((v, a)) => (v, a.trim()),
        None => (command, ""),
    };

    match verb {
        "quit" | "exit" | "q" => Outcome::Quit,
        "env" => Outcome::EnvListing(session.definition_names().iter().map(|s| s.to_string()).collect()),
        "type" => {
            let source = session.wrap(arg);
            match leverr_parser::parse_source(&source) {
                Err(e) => Outcome::Diagnostic(render(&source, &e)),
                Ok(expr) => {
                    let result = leverr_typeck::check(&expr);
                    match result.ty {
                        Some(ty) if result.errors.is_empty() => Outcome::TypeInfo(ty.to_string()),
                        _ => Outcome::Diagnostic(render_type_errors(&source, &result.errors)),
                    }
                }
            }
        }
        _ => Outcome::Diagnostic(format!("unknown command `:{command}`")),
    }
}

fn eval_definition(session: &mut Session, name: &str, is_rec: bool, rhs: &str) -> Outcome {
    let probe = session.wrap(&format!("let {}{} = {} in {}", if is_rec { "rec " } else { "" }, name, rhs, name));
    match leverr_parser::parse_source(&probe) {
        Err(e) => Outcome::Diagnostic(render(&probe, &e)),
        Ok(expr) => {
            let result = leverr_typeck::check(&expr);
            if !result.errors.is_empty() {
                return Outcome::Diagnostic(render_type_errors(&probe, &result.errors));
            }
            let ty = result.ty.map(|t| t.to_string()).unwrap_or_default();
            session.add_definition(name, is_rec, rhs);
            Outcome::Defined { name: name.to_string(), ty }
        }
    }
}

fn eval_expression(session: &mut Session, line: &str, sink: &mut dyn Sink) -> Outcome {
    let source = session.wrap(line);

    let expr = match leverr_parser::parse_source(&source) {
        Ok(expr) => expr,
        Err(e) => return Outcome::Diagnostic(render(&source, &e)),
    };

    let typeck = leverr_typeck::check(&expr);
    if !typeck.errors.is_empty() {
        return Outcome::Diagnostic(render_type_errors(&source, &typeck.errors));
    }

    let env = leverr_eval::default_env();
    match leverr_eval::evaluate(&expr, &env, sink) {
        Ok(value) => Outcome::Value(value.to_string()),
        Err(e) => Outcome::Diagnostic(render(&source, &e)),
    }
}

fn render_type_errors(source: &str, errors: &[leverr_typeck::TypeError]) -> String {
    errors
        .iter()
        .map(|e| render(source, e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Detect a `let [rec] name = rhs` definition with no `in` anywhere in the
/// line (an `in`-terminated `let` is a complete expression and is handled
/// by the normal expression path instead). Returns `(name, is_rec, rhs)`.
fn definition_header(line: &str) -> Option<(String, bool, String)> {
    let tokens = leverr_lexer::lex(line).ok()?;
    if tokens.iter().any(|t| t.kind == TokenKind::In) {
        return None;
    }

    let mut iter = tokens.iter();
    if iter.next()?.kind != TokenKind::Let {
        return None;
    }

    let mut next = iter.next()?;
    let is_rec = next.kind == TokenKind::Rec;
    if is_rec {
        next = iter.next()?;
    }
    if next.kind != TokenKind::Ident {
        return None;
    }
    let name = next.lexeme.clone();

    let eq_tok = iter.next()?;
    if eq_tok.kind != TokenKind::Eq {
        return None;
    }

    let rhs = line[eq_tok.span.end as usize..].trim().to_string();
    if rhs.is_empty() {
        return None;
    }
    Some((name, is_rec, rhs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use leverr_eval::CapturingSink;

    #[test]
    fn blank_line_is_empty() {
        let mut session = Session::new();
        let mut sink = CapturingSink::default();
        assert_eq!(eval_line(&mut session, "   ", &mut sink), Outcome::Empty);
    }

    #[test]
    fn plain_expression_evaluates_to_its_rendered_value() {
        let mut session = Session::new();
        let mut sink = CapturingSink::default();
        assert_eq!(
            eval_line(&mut session, "1 + 2", &mut sink),
            Outcome::Value("3".to_string())
        );
    }

    #[test]
    fn let_without_in_becomes_a_definition_visible_to_later_lines() {
        let mut session = Session::new();
        let mut sink = CapturingSink::default();
        let defined = eval_line(&mut session, "let x = 5", &mut sink);
        assert_eq!(
            defined,
            Outcome::Defined { name: "x".to_string(), ty: "Int".to_string() }
        );
        assert_eq!(
            eval_line(&mut session, "x + 1", &mut sink),
            Outcome::Value("6".to_string())
        );
    }

    #[test]
    fn let_rec_definition_supports_recursive_reference() {
        let mut session = Session::new();
        let mut sink = CapturingSink::default();
        eval_line(
            &mut session,
            "let rec fact = fn(n) -> if n == 0 {1} {n * fact(n - 1)}",
            &mut sink,
        );
        assert_eq!(
            eval_line(&mut session, "fact(5)", &mut sink),
            Outcome::Value("120".to_string())
        );
    }

    #[test]
    fn let_with_in_is_treated_as_a_complete_expression() {
        let mut session = Session::new();
        let mut sink = CapturingSink::default();
        assert_eq!(
            eval_line(&mut session, "let x = 1 in x + 1", &mut sink),
            Outcome::Value("2".to_string())
        );
        assert!(session.definition_names().is_empty());
    }

    #[test]
    fn type_command_reports_the_inferred_type() {
        let mut session = Session::new();
        assert_eq!(
            eval_command(&session, "type 1 + 1"),
            Outcome::TypeInfo("Int".to_string())
        );
    }

    #[test]
    fn env_command_lists_definition_names_in_order() {
        let mut session = Session::new();
        let mut sink = CapturingSink::default();
        eval_line(&mut session, "let x = 1", &mut sink);
        eval_line(&mut session, "let y = 2", &mut sink);
        assert_eq!(
            eval_line(&mut session, ":env", &mut sink),
            Outcome::EnvListing(vec!["x".to_string(), "y".to_string()])
        );
    }

    #[test]
    fn quit_and_exit_commands_request_termination() {
        let mut session = Session::new();
        let mut sink = CapturingSink::default();
        assert_eq!(eval_line(&mut session, ":quit", &mut sink), Outcome::Quit);
        assert_eq!(eval_line(&mut session, ":exit", &mut sink), Outcome::Quit);
    }

    #[test]
    fn unknown_command_is_a_diagnostic() {
        let mut session = Session::new();
        let mut sink = CapturingSink::default();
        assert!(matches!(
            eval_line(&mut session, ":bogus", &mut sink),
            Outcome::Diagnostic(_)
        ));
    }

    #[test]
    fn type_mismatch_is_a_diagnostic() {
        let mut session = Session::new();
        let mut sink = CapturingSink::default();
        assert!(matches!(
            eval_line(&mut session, "1 + \"a\"", &mut sink),
            Outcome::Diagnostic(_)
        ));
    }

    #[test]
    fn print_builtin_writes_through_the_sink() {
        let mut session = Session::new();
        let mut sink = CapturingSink::default();
        eval_line(&mut session, "print(\"hi\")", &mut sink);
        assert_eq!(sink.lines, vec!["hi".to_string()]);
    }
}
