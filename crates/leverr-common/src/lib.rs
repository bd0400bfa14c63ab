//! Shared types used by every stage of the Leverr pipeline: source spans,
//! the lexer's token vocabulary, and plain-text diagnostic rendering.

pub mod diagnostic;
pub mod span;
pub mod token;

pub use diagnostic::{render, Diagnostic};
pub use span::{LineIndex, Span};
pub use token::{keyword_from_str, Token, TokenKind};
