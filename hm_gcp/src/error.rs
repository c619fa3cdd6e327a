//! Errors that stop an analysis.
//!
//! Type conflicts are not errors: they are recorded in the type graph and
//! reported with the result. What remains here is bad input (parse errors,
//! unbound names, bad configuration) and internal invariant violations of
//! the fixed point.

use hm_gcp_parser::{ParseError, Span};
use thiserror::Error;

/// Analysis error
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The program text did not parse
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A name that is neither bound nor a primitive
    #[error("Unknown ref '{name}' at line {}, column {}", span.line, span.column)]
    UnboundIdentifier { name: String, span: Span },

    /// The worklist did not drain within the configured number of pops
    #[error("Fixed point did not settle within {limit} iterations")]
    IterationCapExceeded { limit: usize },

    /// A node whose value would still fall was not on the worklist
    #[error("Stale {kind} node at line {}, column {}: {old} would fall to {new}", span.line, span.column)]
    StaleNode {
        kind: &'static str,
        span: Span,
        old: String,
        new: String,
    },

    /// Configuration text is not valid TOML for [`crate::AnalysisConfig`]
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Source location of the error, when it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            AnalysisError::Parse(err) => Some(*err.span()),
            AnalysisError::UnboundIdentifier { span, .. } | AnalysisError::StaleNode { span, .. } => Some(*span),
            _ => None,
        }
    }

    /// Format the error with a source excerpt when a location is known.
    pub fn format_with_context(&self, source: &str) -> String {
        match self {
            AnalysisError::Parse(err) => err.format_with_context(source),
            _ => match self.span() {
                Some(span) => {
                    let line = source.lines().nth(span.line.saturating_sub(1)).unwrap_or("");
                    let caret = " ".repeat(span.column.saturating_sub(1));
                    format!("error: {}\n  |\n  | {}\n  | {}^", self, line, caret)
                }
                None => format!("error: {}", self),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_identifier_message() {
        let err = AnalysisError::UnboundIdentifier {
            name: "frob".to_string(),
            span: Span::new(1, 5, 1, 2),
        };
        assert_eq!(err.to_string(), "Unknown ref 'frob' at line 1, column 2");
        assert_eq!(
            err.format_with_context("(frob 1)"),
            "error: Unknown ref 'frob' at line 1, column 2\n  |\n  | (frob 1)\n  |  ^"
        );
    }

    #[test]
    fn test_iteration_cap_has_no_span() {
        let err = AnalysisError::IterationCapExceeded { limit: 10 };
        assert!(err.span().is_none());
        assert_eq!(err.format_with_context("x"), "error: Fixed point did not settle within 10 iterations");
    }
}
