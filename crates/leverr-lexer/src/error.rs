use std::fmt;

use leverr_common::diagnostic::Diagnostic;
use leverr_common::span::Span;

/// A failure during lexical analysis. The lexer stops at the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LexErrorKind {
    UnexpectedCharacter(char),
    UnterminatedString,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LexErrorKind::UnexpectedCharacter(c) => {
                write!(f, "unexpected character `{c}`")
            }
            LexErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
        }
    }
}

impl std::error::Error for LexError {}

impl Diagnostic for LexError {
    fn message(&self) -> String {
        self.to_string()
    }

    fn span(&self) -> Option<Span> {
        Some(self.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unexpected_character() {
        let err = LexError::new(LexErrorKind::UnexpectedCharacter('@'), Span::new(0, 1));
        assert_eq!(err.to_string(), "unexpected character `@`");
    }

    #[test]
    fn display_unterminated_string() {
        let err = LexError::new(LexErrorKind::UnterminatedString, Span::new(0, 5));
        assert_eq!(err.to_string(), "unterminated string literal");
    }
}
