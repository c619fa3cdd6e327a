//! Type variables for Hindley-Milner inference.
//!
//! Type variables live in an arena and form a union-find forest: a variable
//! either carries a [`TKind`] or links to the variable it was unified with.
//! Structure may be cyclic (recursive types), so every traversal tracks the
//! nodes it has visited.
//!
//! - `unify`: destructive unification
//! - `fresh`: instantiation of let-bound types at a use site
//! - `display`: printing with generated variable names

mod display;
mod fresh;
mod unify;

use crate::lattice::{Aliases, Fidxs, Value};
use crate::syntax::SyntaxId;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

/// Handle to a type variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TVarId(pub(crate) u32);

impl TVarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Shape of a type variable.
#[derive(Clone, Debug, PartialEq)]
pub enum TKind {
    /// Unconstrained.
    Leaf,
    /// Ground type: a widened constant such as `int64` or `*str`.
    Base(Value),
    /// Function from `args` to `ret`, known to be one of `fidxs`.
    Fun {
        fidxs: Fidxs,
        args: Vec<TVarId>,
        ret: TVarId,
    },
    /// Record. An open record may gain fields through unification.
    Struct {
        aliases: Aliases,
        open: bool,
        fields: BTreeMap<String, TVarId>,
    },
    /// Possibly-nil wrapper around a non-nil type.
    Nil(TVarId),
    Error(Box<TError>),
}

impl TKind {
    fn tag(&self) -> &'static str {
        match self {
            TKind::Leaf => "leaf",
            TKind::Base(_) => "base",
            TKind::Fun { .. } => "fun",
            TKind::Struct { .. } => "struct",
            TKind::Nil(_) => "nil",
            TKind::Error(_) => "error",
        }
    }

    /// Child variables, in a fixed order.
    pub fn children(&self) -> Vec<TVarId> {
        match self {
            TKind::Leaf | TKind::Base(_) => Vec::new(),
            TKind::Fun { args, ret, .. } => args.iter().copied().chain(Some(*ret)).collect(),
            TKind::Struct { fields, .. } => fields.values().copied().collect(),
            TKind::Nil(child) => vec![*child],
            TKind::Error(err) => err.alts.iter().flat_map(TKind::children).collect(),
        }
    }
}

/// A unification failure. Keeps every shape that was forced together, at
/// most one per kind of shape, so later unifications add to the report
/// instead of replacing it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TError {
    pub alts: Vec<TKind>,
    pub msg: Option<String>,
}

impl TError {
    pub fn with_msg(msg: impl Into<String>) -> Self {
        Self {
            alts: Vec::new(),
            msg: Some(msg.into()),
        }
    }
}

#[derive(Clone, Debug)]
struct TNode {
    kind: TKind,
    link: Option<TVarId>,
    /// Syntax nodes to revisit when this variable changes.
    deps: Vec<SyntaxId>,
}

/// Stack of type variables that are not generalized at a program point:
/// the parameters of enclosing lambdas and the variables of enclosing let
/// definitions.
#[derive(Debug)]
pub struct VStack {
    pub parent: Option<Rc<VStack>>,
    pub tvar: TVarId,
}

impl VStack {
    pub fn push(parent: Option<Rc<VStack>>, tvar: TVarId) -> Rc<VStack> {
        Rc::new(VStack { parent, tvar })
    }

    pub fn iter(&self) -> impl Iterator<Item = TVarId> + '_ {
        std::iter::successors(Some(self), |frame| frame.parent.as_deref()).map(|frame| frame.tvar)
    }
}

/// Arena of type variables.
#[derive(Debug, Default)]
pub struct TVarArena {
    nodes: Vec<TNode>,
}

impl TVarArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn alloc(&mut self, kind: TKind) -> TVarId {
        let id = TVarId(self.nodes.len() as u32);
        self.nodes.push(TNode {
            kind,
            link: None,
            deps: Vec::new(),
        });
        id
    }

    pub fn leaf(&mut self) -> TVarId {
        self.alloc(TKind::Leaf)
    }

    pub fn base(&mut self, value: Value) -> TVarId {
        self.alloc(TKind::Base(value))
    }

    /// Representative of `id`'s class, compressing the path on the way.
    pub fn find(&mut self, id: TVarId) -> TVarId {
        let mut root = id;
        while let Some(next) = self.nodes[root.index()].link {
            root = next;
        }
        let mut cur = id;
        while let Some(next) = self.nodes[cur.index()].link {
            if next != root {
                self.nodes[cur.index()].link = Some(root);
            }
            cur = next;
        }
        root
    }

    /// Representative of `id`'s class without mutating the arena.
    pub fn root(&self, id: TVarId) -> TVarId {
        let mut root = id;
        while let Some(next) = self.nodes[root.index()].link {
            root = next;
        }
        root
    }

    /// Kind of `id`'s representative.
    pub fn kind(&self, id: TVarId) -> &TKind {
        &self.nodes[self.root(id).index()].kind
    }

    pub fn is_leaf(&self, id: TVarId) -> bool {
        matches!(self.kind(id), TKind::Leaf)
    }

    pub fn is_error(&self, id: TVarId) -> bool {
        matches!(self.kind(id), TKind::Error(_))
    }

    pub(crate) fn set_kind(&mut self, id: TVarId, kind: TKind) {
        let root = self.find(id);
        self.nodes[root.index()].kind = kind;
    }

    /// Register `dep` to be revisited when `id` changes.
    pub fn add_dep(&mut self, id: TVarId, dep: SyntaxId) {
        let root = self.find(id);
        let deps = &mut self.nodes[root.index()].deps;
        if !deps.contains(&dep) {
            deps.push(dep);
        }
    }

    pub fn deps(&self, id: TVarId) -> &[SyntaxId] {
        &self.nodes[self.root(id).index()].deps
    }

    /// True if `id` is reachable from any variable on `nongen`.
    pub fn occurs_in(&self, id: TVarId, nongen: Option<&VStack>) -> bool {
        let Some(stack) = nongen else {
            return false;
        };
        let target = self.root(id);
        let mut visited = HashSet::new();
        stack.iter().any(|tvar| self.reaches(tvar, target, &mut visited))
    }

    fn reaches(&self, from: TVarId, target: TVarId, visited: &mut HashSet<TVarId>) -> bool {
        let from = self.root(from);
        if from == target {
            return true;
        }
        if !visited.insert(from) {
            return false;
        }
        self.nodes[from.index()]
            .kind
            .children()
            .into_iter()
            .any(|child| self.reaches(child, target, visited))
    }

    /// True if an error node is reachable from `id`.
    pub fn has_error(&self, id: TVarId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let id = self.root(id);
            if !visited.insert(id) {
                continue;
            }
            let kind = &self.nodes[id.index()].kind;
            if matches!(kind, TKind::Error(_)) {
                return true;
            }
            stack.extend(kind.children());
        }
        false
    }
}

#[cfg(test)]
mod tests;
