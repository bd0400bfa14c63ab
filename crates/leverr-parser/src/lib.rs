//! Parser for the Leverr programming language: turns a token stream into
//! the expression/pattern tree consumed by `leverr-typeck` and `leverr-eval`.

pub mod ast;
pub mod error;
pub mod parser;

pub use ast::{BinOp, Expr, Pattern, UnOp};
pub use error::ParseError;
pub use parser::parse;

/// Convenience: lex and parse source text in one call.
pub fn parse_source(source: &str) -> Result<Expr, ParseSourceError> {
    log::trace!("parsing {} bytes", source.len());
    let tokens = leverr_lexer::lex(source).map_err(ParseSourceError::Lex)?;
    parse(tokens).map_err(ParseSourceError::Parse)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseSourceError {
    Lex(leverr_lexer::LexError),
    Parse(ParseError),
}

impl std::fmt::Display for ParseSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseSourceError::Lex(e) => write!(f, "{e}"),
            ParseSourceError::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ParseSourceError {}

impl leverr_common::diagnostic::Diagnostic for ParseSourceError {
    fn message(&self) -> String {
        self.to_string()
    }

    fn span(&self) -> Option<leverr_common::Span> {
        match self {
            ParseSourceError::Lex(e) => leverr_common::diagnostic::Diagnostic::span(e),
            ParseSourceError::Parse(e) => leverr_common::diagnostic::Diagnostic::span(e),
        }
    }
}
