//! Let-polymorphism: unifying a fresh instance of a definition's type.
//!
//! Instantiation is fused with unification. Rather than copy the whole
//! definition type and unify the copy, [`TVarArena::fresh_unify`] walks the
//! definition and the use site together and only copies where the shapes
//! diverge. Variables reachable from the non-generic stack are shared, not
//! copied.

use super::{TKind, TVarArena, TVarId, VStack};
use crate::lattice::StructLattice;
use crate::syntax::SyntaxId;
use crate::worklist::Worklist;
use std::collections::HashMap;

/// Per-instantiation map from definition variables to their instances.
pub type FreshVars = HashMap<TVarId, TVarId>;

impl TVarArena {
    /// Unify a fresh instance of `def` with `use_`. `ident` is registered as
    /// a dependent of every definition variable visited, so it is revisited
    /// when the definition's type changes.
    pub fn fresh_unify(
        &mut self,
        def: TVarId,
        use_: TVarId,
        nongen: Option<&VStack>,
        ident: SyntaxId,
        structs: &mut impl StructLattice,
        work: &mut Worklist,
    ) -> bool {
        let mut vars = FreshVars::new();
        self.fresh_unify_in(def, use_, nongen, ident, &mut vars, structs, work)
    }

    #[allow(clippy::too_many_arguments)]
    fn fresh_unify_in(
        &mut self,
        def: TVarId,
        use_: TVarId,
        nongen: Option<&VStack>,
        ident: SyntaxId,
        vars: &mut FreshVars,
        structs: &mut impl StructLattice,
        work: &mut Worklist,
    ) -> bool {
        let def = self.find(def);
        let use_ = self.find(use_);
        if let Some(&inst) = vars.get(&def) {
            return self.unify(inst, use_, structs, work);
        }
        if self.occurs_in(def, nongen) {
            vars.insert(def, use_);
            return self.unify(def, use_, structs, work);
        }
        self.add_dep(def, ident);

        let dkind = self.nodes[def.index()].kind.clone();
        let ukind = self.nodes[use_.index()].kind.clone();
        match (&dkind, &ukind) {
            (TKind::Leaf, _) => {
                vars.insert(def, use_);
                false
            }
            (
                TKind::Fun { fidxs, args, ret },
                TKind::Fun {
                    fidxs: ufidxs,
                    args: uargs,
                    ret: uret,
                },
            ) if args.len() == uargs.len() => {
                vars.insert(def, use_);
                let mut progress = false;
                if !fidxs.is_subset(ufidxs) {
                    self.nodes[use_.index()].kind = TKind::Fun {
                        fidxs: ufidxs.union(fidxs).copied().collect(),
                        args: uargs.clone(),
                        ret: *uret,
                    };
                    work.extend(self.nodes[use_.index()].deps.iter().copied());
                    progress = true;
                }
                for (&d, &u) in args.iter().zip(uargs) {
                    progress |= self.fresh_unify_in(d, u, nongen, ident, vars, structs, work);
                }
                progress | self.fresh_unify_in(*ret, *uret, nongen, ident, vars, structs, work)
            }
            (
                TKind::Struct { open, fields, .. },
                TKind::Struct {
                    open: uopen,
                    fields: ufields,
                    ..
                },
            ) if open == uopen && fields.keys().eq(ufields.keys()) => {
                vars.insert(def, use_);
                let mut progress = false;
                for (d, u) in fields.values().zip(ufields.values()) {
                    progress |= self.fresh_unify_in(*d, *u, nongen, ident, vars, structs, work);
                }
                progress
            }
            (TKind::Nil(d), TKind::Nil(u)) => {
                vars.insert(def, use_);
                self.fresh_unify_in(*d, *u, nongen, ident, vars, structs, work)
            }
            (TKind::Base(d), TKind::Base(u)) if d == u => false,
            _ => {
                let copy = self.fresh_copy(def, nongen, vars);
                self.unify(copy, use_, structs, work)
            }
        }
    }

    /// Copy `id`'s type, sharing variables reachable from `nongen` and
    /// reusing copies already recorded in `vars`.
    pub fn fresh_copy(&mut self, id: TVarId, nongen: Option<&VStack>, vars: &mut FreshVars) -> TVarId {
        let id = self.find(id);
        if let Some(&copy) = vars.get(&id) {
            return copy;
        }
        if self.occurs_in(id, nongen) {
            return id;
        }
        let kind = self.nodes[id.index()].kind.clone();
        if let TKind::Base(v) = kind {
            return self.alloc(TKind::Base(v));
        }
        let copy = self.leaf();
        vars.insert(id, copy);
        let kind = match kind {
            TKind::Error(mut err) => {
                err.alts = err
                    .alts
                    .into_iter()
                    .map(|alt| self.copy_kind(alt, nongen, vars))
                    .collect();
                TKind::Error(err)
            }
            other => self.copy_kind(other, nongen, vars),
        };
        self.nodes[copy.index()].kind = kind;
        copy
    }

    fn copy_kind(&mut self, kind: TKind, nongen: Option<&VStack>, vars: &mut FreshVars) -> TKind {
        match kind {
            TKind::Fun { fidxs, args, ret } => TKind::Fun {
                fidxs,
                args: args.into_iter().map(|a| self.fresh_copy(a, nongen, vars)).collect(),
                ret: self.fresh_copy(ret, nongen, vars),
            },
            TKind::Struct { aliases, open, fields } => TKind::Struct {
                aliases,
                open,
                fields: fields
                    .into_iter()
                    .map(|(name, t)| (name, self.fresh_copy(t, nongen, vars)))
                    .collect(),
            },
            TKind::Nil(child) => TKind::Nil(self.fresh_copy(child, nongen, vars)),
            other => other,
        }
    }
}
