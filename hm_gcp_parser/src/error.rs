//! Parse error types

use crate::span::Span;
use thiserror::Error;

/// Parse error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Unexpected token
    #[error("unexpected '{found}' at {span}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },

    /// Unexpected end of input
    #[error("unexpected end of input at {span}, expected {expected}")]
    UnexpectedEof { expected: String, span: Span },

    /// Unterminated string
    #[error("unterminated string literal starting at {span}")]
    UnterminatedString { span: Span },

    /// Number literal that does not fit the target type
    #[error("invalid number literal '{literal}' at {span}")]
    InvalidNumber { literal: String, span: Span },

    /// Input left over after a complete program
    #[error("junk at end of program at {span}: '{rest}'")]
    TrailingInput { rest: String, span: Span },

    /// Lexer error
    #[error("unrecognized character at {span}")]
    LexerError { span: Span },
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::UnterminatedString { span }
            | ParseError::InvalidNumber { span, .. }
            | ParseError::TrailingInput { span, .. }
            | ParseError::LexerError { span } => span,
        }
    }

    pub fn unexpected_token(
        found: impl Into<String>,
        expected: impl Into<String>,
        span: Span,
    ) -> Self {
        ParseError::UnexpectedToken {
            found: found.into(),
            expected: expected.into(),
            span,
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        ParseError::UnexpectedEof {
            expected: expected.into(),
            span,
        }
    }

    /// Format error with source context
    ///
    /// Returns the offending source line with a caret marker under the span.
    pub fn format_with_context(&self, source: &str) -> String {
        let span = self.span();
        let Some(line) = source.lines().nth(span.line.saturating_sub(1)) else {
            return String::new();
        };
        let col = span.column.saturating_sub(1).min(line.len());
        let width = span.len().clamp(1, line.len().saturating_sub(col).max(1));
        let gutter = span.line.to_string();

        format!(
            "  {} | {}\n  {} | {}{}",
            gutter,
            line,
            " ".repeat(gutter.len()),
            " ".repeat(col),
            "^".repeat(width)
        )
    }
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_token_message() {
        let err = ParseError::unexpected_token(";", "'}'", Span::new(4, 5, 1, 5));
        assert_eq!(err.to_string(), "unexpected ';' at 1:5, expected '}'");
        assert_eq!(err.span().start, 4);
    }

    #[test]
    fn test_format_with_context() {
        let source = "x = 3;\n(pair x ";
        let err = ParseError::unexpected_eof("')'", Span::new(14, 14, 2, 8));
        let rendered = err.format_with_context(source);
        assert_eq!(rendered, "  2 | (pair x \n    |        ^");
    }

    #[test]
    fn test_context_past_end_is_empty() {
        let err = ParseError::LexerError {
            span: Span::new(40, 41, 9, 1),
        };
        assert!(err.format_with_context("1").is_empty());
    }
}
