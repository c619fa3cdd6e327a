//! Lexer for program text
//!
//! Wraps the logos-generated lexer, adding float literals (which need one
//! byte of lookahead past the `.`) and string bodies.

use logos::Logos;

use crate::error::ParseError;
use crate::span::{SourceMap, Span};
use crate::token::Token;

/// A token with its span
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken<'a> {
    pub token: Token,
    pub span: Span,
    pub text: &'a str,
}

/// Program lexer
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    source_map: SourceMap,
    peeked: Option<Option<Result<SpannedToken<'a>, ParseError>>>,
    /// Offset of `inner`'s input within `source` (non-zero after a restart)
    offset: usize,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("offset", &self.offset)
            .field("peeked", &self.peeked)
            .finish()
    }
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            source_map: SourceMap::new(source),
            peeked: None,
            offset: 0,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> Option<&Result<SpannedToken<'a>, ParseError>> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_token_internal());
        }
        self.peeked.as_ref().and_then(|p| p.as_ref())
    }

    pub fn next_token(&mut self) -> Option<Result<SpannedToken<'a>, ParseError>> {
        match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.next_token_internal(),
        }
    }

    /// Span of the (empty) end of input.
    pub fn eof_span(&self) -> Span {
        self.source_map.span(self.source.len(), self.source.len())
    }

    fn spanned(&self, token: Token, start: usize, end: usize) -> SpannedToken<'a> {
        SpannedToken {
            token,
            span: self.source_map.span(start, end),
            text: &self.source[start..end],
        }
    }

    fn next_token_internal(&mut self) -> Option<Result<SpannedToken<'a>, ParseError>> {
        let result = self.inner.next()?;
        let range = self.inner.span();
        let start = self.offset + range.start;
        let end = self.offset + range.end;

        match result {
            Ok(Token::Integer) => {
                let float_end = self.scan_fraction(end);
                if float_end == end {
                    return Some(Ok(self.spanned(Token::Integer, start, end)));
                }
                self.restart_from(float_end);
                Some(Ok(self.spanned(Token::Float, start, float_end)))
            }

            Ok(Token::DoubleQuote) => {
                // No escapes: the body runs to the next quote
                let bytes = self.source.as_bytes();
                match memchr::memchr(b'"', &bytes[end..]) {
                    Some(offset) => {
                        let close = end + offset + 1;
                        self.restart_from(close);
                        Some(Ok(self.spanned(Token::Str, start, close)))
                    }
                    None => {
                        self.restart_from(self.source.len());
                        Some(Err(ParseError::UnterminatedString {
                            span: self.source_map.span(start, self.source.len()),
                        }))
                    }
                }
            }

            Ok(token) => Some(Ok(self.spanned(token, start, end))),

            Err(()) => Some(Err(ParseError::LexerError {
                span: self.source_map.span(start, end),
            })),
        }
    }

    /// End of a `.digits` fraction directly after an integer at `pos`, or
    /// `pos` itself when there is none.
    fn scan_fraction(&self, pos: usize) -> usize {
        let bytes = self.source.as_bytes();
        if bytes.get(pos) != Some(&b'.') || !bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) {
            return pos;
        }
        let mut end = pos + 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
        end
    }

    /// Restart the logos lexer at an absolute byte position.
    pub fn restart_from(&mut self, pos: usize) {
        self.peeked = None;
        let pos = pos.min(self.source.len());
        self.inner = Token::lexer(&self.source[pos..]);
        self.offset = pos;
    }
}

/// Tokenize a whole program.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken<'_>, ParseError>> {
    let mut lexer = Lexer::new(source);
    std::iter::from_fn(|| lexer.next_token()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .into_iter()
            .map(|t| t.map(|t| t.token).unwrap_or(Token::Dot))
            .collect()
    }

    #[test]
    fn test_float_and_field() {
        assert_eq!(
            kinds("2.5 2.x"),
            vec![Token::Float, Token::Integer, Token::Dot, Token::Identifier]
        );
        let tokens = tokenize("12.25");
        assert_eq!(tokens[0].as_ref().map(|t| t.text), Ok("12.25"));
    }

    #[test]
    fn test_string_literal() {
        let tokens = tokenize(r#"(str "a b") x"#);
        let texts: Vec<&str> = tokens.iter().filter_map(|t| t.as_ref().ok()).map(|t| t.text).collect();
        assert_eq!(texts, vec!["(", "str", "\"a b\"", ")", "x"]);
        let string = tokens[2].as_ref().ok();
        assert_eq!(string.map(|t| t.token), Some(Token::Str));
        assert_eq!(string.map(|t| t.span.column), Some(6));
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = tokenize("\"abc");
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0], Err(ParseError::UnterminatedString { .. })));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("x 1");
        let peeked = lexer.peek().cloned();
        let next = lexer.next_token();
        assert_eq!(peeked, next);
        assert_eq!(lexer.next_token().and_then(|t| t.ok()).map(|t| t.token), Some(Token::Integer));
        assert!(lexer.next_token().is_none());
    }

    #[test]
    fn test_spans_after_restart() {
        let tokens = tokenize("\"s\"\n  1.5 y");
        let y = tokens[2].as_ref().ok();
        assert_eq!(y.map(|t| (t.span.line, t.span.column)), Some((2, 7)));
    }
}
