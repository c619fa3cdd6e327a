//! Indexed syntax tree.
//!
//! The parser's [`hm_gcp_parser::Expr`] owns its children; the analysis needs
//! parent links, per-node type variables and values, so it lowers the tree
//! into a flat arena of [`SyntaxNode`]s addressed by [`SyntaxId`]. Parent
//! links are plain ids, used only to find which nodes to revisit.

pub mod prims;

pub use prims::Prim;

use crate::lattice::{Alias, Fidx, Value};
use crate::tvar::{TVarId, VStack};
use hm_gcp_parser::Span;
use std::rc::Rc;

/// Handle to a syntax node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyntaxId(pub(crate) u32);

impl SyntaxId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where an identifier is bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    /// Parameter `idx` of the lambda `def`.
    Lambda { def: SyntaxId, idx: usize },
    /// The name bound by the let `def`.
    Let { def: SyntaxId },
}

/// Per-function state shared by lambdas and primitives.
#[derive(Clone, Debug)]
pub struct FunInfo {
    pub fidx: Fidx,
    /// One type variable per parameter.
    pub targs: Vec<TVarId>,
    /// Meet of the argument values seen at every known call site.
    pub types: Vec<Value>,
    /// Identifiers referring to each parameter.
    pub refs: Vec<Vec<SyntaxId>>,
    /// Call sites known to reach this function.
    pub applys: Vec<SyntaxId>,
}

impl FunInfo {
    pub fn new(fidx: Fidx, targs: Vec<TVarId>, refs: Vec<Vec<SyntaxId>>) -> Self {
        let nargs = targs.len();
        Self {
            fidx,
            targs,
            types: vec![Value::Any; nargs],
            refs,
            applys: Vec::new(),
        }
    }

    pub fn nargs(&self) -> usize {
        self.targs.len()
    }
}

#[derive(Clone, Debug)]
pub enum SyntaxKind {
    Constant(Value),
    Ident {
        name: String,
        binding: Binding,
        /// Uses a fresh instance of the binding's type.
        fresh: bool,
    },
    Lambda {
        params: Vec<String>,
        body: SyntaxId,
        fun: FunInfo,
    },
    Let {
        name: String,
        /// Type variable of the bound name.
        targ: TVarId,
        def: SyntaxId,
        body: SyntaxId,
        refs: Vec<SyntaxId>,
    },
    Apply {
        fun: SyntaxId,
        args: Vec<SyntaxId>,
    },
    Struct {
        alias: Alias,
        fields: Vec<(String, SyntaxId)>,
    },
    Field {
        rec: SyntaxId,
        name: String,
    },
    Prim {
        prim: Prim,
        /// Allocation site for constructors.
        alias: Option<Alias>,
        fun: FunInfo,
    },
    Root {
        body: SyntaxId,
    },
}

impl SyntaxKind {
    pub fn name(&self) -> &'static str {
        match self {
            SyntaxKind::Constant(_) => "constant",
            SyntaxKind::Ident { .. } => "ident",
            SyntaxKind::Lambda { .. } => "lambda",
            SyntaxKind::Let { .. } => "let",
            SyntaxKind::Apply { .. } => "apply",
            SyntaxKind::Struct { .. } => "struct",
            SyntaxKind::Field { .. } => "field",
            SyntaxKind::Prim { .. } => "prim",
            SyntaxKind::Root { .. } => "root",
        }
    }

    /// Function state for lambdas and primitives.
    pub fn fun_info(&self) -> Option<&FunInfo> {
        match self {
            SyntaxKind::Lambda { fun, .. } | SyntaxKind::Prim { fun, .. } => Some(fun),
            _ => None,
        }
    }

    pub fn fun_info_mut(&mut self) -> Option<&mut FunInfo> {
        match self {
            SyntaxKind::Lambda { fun, .. } | SyntaxKind::Prim { fun, .. } => Some(fun),
            _ => None,
        }
    }

    /// Children in evaluation order.
    pub fn children(&self) -> Vec<SyntaxId> {
        match self {
            SyntaxKind::Constant(_) | SyntaxKind::Ident { .. } | SyntaxKind::Prim { .. } => Vec::new(),
            SyntaxKind::Lambda { body, .. } | SyntaxKind::Root { body } => vec![*body],
            SyntaxKind::Let { def, body, .. } => vec![*def, *body],
            SyntaxKind::Apply { fun, args } => std::iter::once(*fun).chain(args.iter().copied()).collect(),
            SyntaxKind::Struct { fields, .. } => fields.iter().map(|(_, id)| *id).collect(),
            SyntaxKind::Field { rec, .. } => vec![*rec],
        }
    }
}

#[derive(Clone, Debug)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    pub parent: Option<SyntaxId>,
    pub tvar: TVarId,
    /// Current value; starts at `Any` and only falls.
    pub flow: Value,
    /// Variables not generalized at this node.
    pub nongen: Option<Rc<VStack>>,
    pub span: Span,
}

impl SyntaxNode {
    /// Short label for reports: the name for identifiers, primitives and
    /// field loads, the parameter list for lambdas.
    pub fn label(&self) -> String {
        match &self.kind {
            SyntaxKind::Constant(v) => v.to_string(),
            SyntaxKind::Ident { name, .. } => name.clone(),
            SyntaxKind::Lambda { params, .. } => format!("{{{} -> ...}}", params.join(" ")),
            SyntaxKind::Let { name, .. } => format!("{} = ...", name),
            SyntaxKind::Apply { .. } => "(...)".to_string(),
            SyntaxKind::Struct { fields, .. } => {
                let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
                format!("@{{{}}}", names.join(", "))
            }
            SyntaxKind::Field { name, .. } => format!(".{}", name),
            SyntaxKind::Prim { prim, .. } => prim.name().to_string(),
            SyntaxKind::Root { .. } => "root".to_string(),
        }
    }
}
