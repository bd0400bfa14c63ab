use std::fmt;

use leverr_common::diagnostic::Diagnostic;
use leverr_common::span::Span;

/// A failure while parsing a token stream into an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl Diagnostic for ParseError {
    fn message(&self) -> String {
        self.message.clone()
    }

    fn span(&self) -> Option<Span> {
        Some(self.span)
    }
}
