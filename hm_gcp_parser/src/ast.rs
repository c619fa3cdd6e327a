//! Syntax tree produced by the parser.
//!
//! The tree owns its children exclusively; consumers that need parent links
//! build their own indexed representation.

use crate::span::Span;
use serde::Serialize;
use std::fmt;

/// Literal constants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    /// The literal `0`
    Nil,
    Int(i64),
    Float(f64),
    Str(String),
}

/// One expression of the language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Lit {
        value: Literal,
        span: Span,
    },
    Ident {
        name: String,
        span: Span,
    },
    /// `{x y -> body}`
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
        span: Span,
    },
    /// `name = def; body`
    Let {
        name: String,
        def: Box<Expr>,
        body: Box<Expr>,
        span: Span,
    },
    /// `(fun args...)`
    Apply {
        fun: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    /// `@{a = e, b = e}`
    Struct {
        fields: Vec<(String, Expr)>,
        span: Span,
    },
    /// `rec.name`
    Field {
        rec: Box<Expr>,
        name: String,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Lit { span, .. }
            | Expr::Ident { span, .. }
            | Expr::Lambda { span, .. }
            | Expr::Let { span, .. }
            | Expr::Apply { span, .. }
            | Expr::Struct { span, .. }
            | Expr::Field { span, .. } => *span,
        }
    }

    /// Number of expression nodes in the tree.
    pub fn size(&self) -> usize {
        1 + match self {
            Expr::Lit { .. } | Expr::Ident { .. } => 0,
            Expr::Lambda { body, .. } => body.size(),
            Expr::Let { def, body, .. } => def.size() + body.size(),
            Expr::Apply { fun, args, .. } => fun.size() + args.iter().map(Expr::size).sum::<usize>(),
            Expr::Struct { fields, .. } => fields.iter().map(|(_, e)| e.size()).sum(),
            Expr::Field { rec, .. } => rec.size(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Nil => write!(f, "0"),
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{:?}", v),
            Literal::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Reprints the program in surface syntax.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Lit { value, .. } => write!(f, "{}", value),
            Expr::Ident { name, .. } => write!(f, "{}", name),
            Expr::Lambda { params, body, .. } => write!(f, "{{ {} -> {} }}", params.join(" "), body),
            Expr::Let { name, def, body, .. } => write!(f, "{} = {}; {}", name, def, body),
            Expr::Apply { fun, args, .. } => {
                write!(f, "({}", fun)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Struct { fields, .. } => {
                write!(f, "@{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    let sep = if i + 1 < fields.len() { "," } else { "" };
                    write!(f, " {} = {}{}", name, value, sep)?;
                }
                write!(f, " }}")
            }
            Expr::Field { rec, name, .. } => write!(f, "{}.{}", rec, name),
        }
    }
}
