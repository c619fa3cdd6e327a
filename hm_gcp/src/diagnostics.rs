//! Analysis diagnostics.
//!
//! Diagnostics are notes about places where the analysis lost precision or
//! found a problem without failing: a unification conflict inlined in a type,
//! a struct value that had to be chopped instead of folded, a function whose
//! arguments were widened because it escapes the program.
//!
//! Each [`crate::Analysis`] owns one [`Diagnostics`] collector, so concurrent
//! or repeated analyses never see each other's notes.

use hm_gcp_parser::Span;
use serde::Serialize;
use std::fmt;

/// What a diagnostic is about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticReason {
    /// A transfer function produced a value not below the stored one.
    /// Contains the stored and the computed value.
    NonMonotone { old: String, new: String },

    /// Folding a recursive struct did not settle and deep pointers were
    /// replaced by `scalar`. Contains the allocation site.
    ApproximationFallback(u32),

    /// A function reachable from the program result had its arguments
    /// widened to `scalar`. Contains the function identity.
    EscapedFunctionWidened(u32),

    /// A node's type holds a unification conflict. Contains the rendered type.
    UnificationError(String),
}

impl fmt::Display for DiagnosticReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticReason::NonMonotone { old, new } => {
                write!(f, "value {} is not below {}", new, old)
            }
            DiagnosticReason::ApproximationFallback(alias) => {
                write!(f, "struct allocated at site {} was chopped", alias)
            }
            DiagnosticReason::EscapedFunctionWidened(fidx) => {
                write!(f, "function {} escapes; arguments widened", fidx)
            }
            DiagnosticReason::UnificationError(ty) => write!(f, "type error: {}", ty),
        }
    }
}

/// A single diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub reason: DiagnosticReason,
    /// Source location of the node concerned, if any.
    pub span: Option<Span>,
    /// Short description of the node concerned.
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn new(reason: DiagnosticReason) -> Self {
        Self {
            reason,
            span: None,
            context: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)?;
        if let Some(span) = &self.span {
            write!(f, " at line {}, column {}", span.line, span.column)?;
        }
        if let Some(ctx) = &self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

/// Session-owned diagnostics collector.
#[derive(Debug, Default)]
pub struct Diagnostics {
    enabled: bool,
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            items: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record a diagnostic. Identical diagnostics are kept once.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        if self.enabled && !self.items.contains(&diagnostic) {
            self.items.push(diagnostic);
        }
    }

    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove and return everything collected so far.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_collector_drops_everything() {
        let mut diags = Diagnostics::new(false);
        diags.record(Diagnostic::new(DiagnosticReason::EscapedFunctionWidened(1)));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_duplicates_are_kept_once() {
        let mut diags = Diagnostics::new(true);
        let d = Diagnostic::new(DiagnosticReason::ApproximationFallback(3)).with_context("struct");
        diags.record(d.clone());
        diags.record(d);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.take().len(), 1);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_display_includes_location() {
        let d = Diagnostic::new(DiagnosticReason::UnificationError("Cannot unify int64 and *str".into()))
            .with_span(Span::new(4, 9, 2, 3))
            .with_context("apply");
        assert_eq!(
            d.to_string(),
            "type error: Cannot unify int64 and *str at line 2, column 3 (apply)"
        );
    }
}
