//! hm_gcp_parser
//!
//! Lexer and recursive-descent parser for the small functional language
//! analyzed by `hm_gcp`: integer, float, string and nil literals, lambdas,
//! applications, let bindings, struct literals and field loads.
//!
//! # Example
//!
//! ```
//! use hm_gcp_parser::{parse, Expr};
//!
//! let program = parse("id = {x -> x}; (pair (id 1) (id \"s\"))").expect("parse failed");
//! assert!(matches!(program, Expr::Let { .. }));
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

// Re-exports
pub use ast::{Expr, Literal};
pub use error::{ParseError, ParseResult};
pub use lexer::{Lexer, SpannedToken};
pub use parser::Parser;
pub use span::{SourceMap, Span};
pub use token::Token;

/// Parse a complete program into an expression tree.
pub fn parse(source: &str) -> ParseResult<Expr> {
    parser::parse(source)
}

/// Tokenize program text
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken<'_>, ParseError>> {
    lexer::tokenize(source)
}

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reprints() {
        let program = parse("x = @{a = 1, b = \"s\"}; x.b").unwrap();
        assert_eq!(program.to_string(), "x = @{ a = 1, b = \"s\" }; x.b");
    }

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
