//! Leverr lexer -- tokenizes source text into a flat stream of [`Token`]s.
//!
//! A single left-to-right pass over the source, tracking a byte offset as it
//! goes (line/column are derived later, on demand, via `leverr_common::LineIndex`).
//! Unlike an error-recovery lexer, [`lex`] stops at the first lexical error
//! instead of emitting an error token and continuing.

pub mod cursor;
pub mod error;

use cursor::Cursor;
use leverr_common::token::{keyword_from_str, Token, TokenKind};

pub use error::{LexError, LexErrorKind};

/// Tokenize `source` into a vector of tokens, ending with [`TokenKind::Eoi`].
///
/// Returns the first [`LexError`] encountered, at which point lexing stops.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    log::trace!("lexing {} bytes", source.len());
    Lexer::new(source).run()
}

struct Lexer<'src> {
    cursor: Cursor<'src>,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eoi = tok.kind == TokenKind::Eoi;
            tokens.push(tok);
            if is_eoi {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();
        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            return Ok(Token::new(TokenKind::Eoi, "", start, start));
        };

        match c {
            '(' => Ok(self.single(TokenKind::LParen, start)),
            ')' => Ok(self.single(TokenKind::RParen, start)),
            '{' => Ok(self.single(TokenKind::LBrace, start)),
            '}' => Ok(self.single(TokenKind::RBrace, start)),
            '[' => Ok(self.single(TokenKind::LBracket, start)),
            ']' => Ok(self.single(TokenKind::RBracket, start)),
            ',' => Ok(self.single(TokenKind::Comma, start)),
            '.' => Ok(self.single(TokenKind::Dot, start)),
            ':' => Ok(self.single(TokenKind::Colon, start)),
            '*' => Ok(self.single(TokenKind::Star, start)),
            '/' => Ok(self.single(TokenKind::Slash, start)),
            '%' => Ok(self.single(TokenKind::Percent, start)),
            '?' => Ok(self.single(TokenKind::Question, start)),

            '+' => self.two_char(start, '+', TokenKind::PlusPlus, TokenKind::Plus),
            '-' => self.two_char(start, '>', TokenKind::Arrow, TokenKind::Minus),
            '=' => self.two_char(start, '=', TokenKind::EqEq, TokenKind::Eq),
            '!' => self.two_char(start, '=', TokenKind::NotEq, TokenKind::Bang),
            '<' => self.two_char(start, '=', TokenKind::LtEq, TokenKind::Lt),
            '>' => self.two_char(start, '=', TokenKind::GtEq, TokenKind::Gt),

            '&' => self.require_two_char(start, '&', TokenKind::AmpAmp),
            '|' => self.lex_pipe(start),

            '"' => self.lex_string(start),
            '0'..='9' => Ok(self.lex_number(start)),
            c if is_ident_start(c) => Ok(self.lex_ident(start)),

            other => {
                self.cursor.advance();
                Err(LexError::new(
                    LexErrorKind::UnexpectedCharacter(other),
                    leverr_common::Span::new(start, self.cursor.pos()),
                ))
            }
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            self.cursor.eat_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
            if self.cursor.peek() == Some('-') && self.cursor.peek_next() == Some('-') {
                self.cursor.eat_while(|c| c != '\n');
            } else {
                break;
            }
        }
    }

    fn single(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        let lexeme = self.cursor.slice(start, self.cursor.pos());
        Token::new(kind, lexeme, start, self.cursor.pos())
    }

    /// Consume the current char; if the next char matches `second`, consume
    /// it too and emit `wide`, otherwise emit `narrow`.
    fn two_char(
        &mut self,
        start: u32,
        second: char,
        wide: TokenKind,
        narrow: TokenKind,
    ) -> Result<Token, LexError> {
        self.cursor.advance();
        let kind = if self.cursor.peek() == Some(second) {
            self.cursor.advance();
            wide
        } else {
            narrow
        };
        let lexeme = self.cursor.slice(start, self.cursor.pos());
        Ok(Token::new(kind, lexeme, start, self.cursor.pos()))
    }

    /// Like [`two_char`], but the second character is mandatory: a bare
    /// `&` is not part of Leverr's vocabulary.
    fn require_two_char(&mut self, start: u32, second: char, wide: TokenKind) -> Result<Token, LexError> {
        self.cursor.advance();
        if self.cursor.peek() == Some(second) {
            self.cursor.advance();
            let lexeme = self.cursor.slice(start, self.cursor.pos());
            Ok(Token::new(wide, lexeme, start, self.cursor.pos()))
        } else {
            Err(LexError::new(
                LexErrorKind::UnexpectedCharacter('&'),
                leverr_common::Span::new(start, self.cursor.pos()),
            ))
        }
    }

    fn lex_pipe(&mut self, start: u32) -> Result<Token, LexError> {
        self.cursor.advance();
        match self.cursor.peek() {
            Some('>') => {
                self.cursor.advance();
                let lexeme = self.cursor.slice(start, self.cursor.pos());
                Ok(Token::new(TokenKind::PipeOp, lexeme, start, self.cursor.pos()))
            }
            Some('|') => {
                self.cursor.advance();
                let lexeme = self.cursor.slice(start, self.cursor.pos());
                Ok(Token::new(TokenKind::PipePipe, lexeme, start, self.cursor.pos()))
            }
            _ => Err(LexError::new(
                LexErrorKind::UnexpectedCharacter('|'),
                leverr_common::Span::new(start, self.cursor.pos()),
            )),
        }
    }

    fn lex_string(&mut self, start: u32) -> Result<Token, LexError> {
        self.cursor.advance(); // opening quote
        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        leverr_common::Span::new(start, self.cursor.pos()),
                    ))
                }
                Some('\n') => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        leverr_common::Span::new(start, self.cursor.pos()),
                    ))
                }
                Some('"') => {
                    self.cursor.advance();
                    break;
                }
                Some('\\') => {
                    self.cursor.advance();
                    // Minimal escape handling: whatever follows the backslash
                    // is consumed as part of the string, unexamined.
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
        let lexeme = self.cursor.slice(start, self.cursor.pos());
        Ok(Token::new(TokenKind::StringLiteral, lexeme, start, self.cursor.pos()))
    }

    fn lex_number(&mut self, start: u32) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        let mut kind = TokenKind::IntLiteral;
        if self.cursor.peek() == Some('.') {
            if let Some(next) = self.cursor.peek_next() {
                if next.is_ascii_digit() {
                    self.cursor.advance(); // '.'
                    self.cursor.eat_while(|c| c.is_ascii_digit());
                    kind = TokenKind::FloatLiteral;
                }
            }
        }
        let lexeme = self.cursor.slice(start, self.cursor.pos());
        Token::new(kind, lexeme, start, self.cursor.pos())
    }

    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.advance();
        self.cursor.eat_while(is_ident_continue);
        let lexeme = self.cursor.slice(start, self.cursor.pos());

        let kind = if let Some(kw) = keyword_from_str(lexeme) {
            kw
        } else if lexeme == "_" {
            TokenKind::Underscore
        } else if lexeme.starts_with(|c: char| c.is_ascii_uppercase()) {
            TokenKind::TagIdent
        } else {
            TokenKind::Ident
        };

        Token::new(kind, lexeme, start, self.cursor.pos())
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
