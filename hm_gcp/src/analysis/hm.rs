//! Unification steps.
//!
//! Constants, lambdas, structs and primitives get their type shape when
//! lowered, so only the forms that relate several nodes do work here.

use super::Analysis;
use crate::lattice::{Aliases, Fidxs};
use crate::syntax::{Prim, SyntaxId, SyntaxKind};
use crate::tvar::{TError, TKind, TVarId};
use std::collections::BTreeMap;

impl Analysis {
    /// Run the unification step of `id`. Returns true on progress.
    pub(super) fn hm_step(&mut self, id: SyntaxId) -> bool {
        let node = &self.nodes[id.index()];
        let tvar = node.tvar;
        match node.kind.clone() {
            SyntaxKind::Constant(_) | SyntaxKind::Lambda { .. } | SyntaxKind::Struct { .. } | SyntaxKind::Prim { .. } => {
                false
            }
            SyntaxKind::Ident { binding, fresh, .. } => {
                let Some(def) = self.binding_tvar(binding) else {
                    return false;
                };
                if fresh {
                    let nongen = node.nongen.clone();
                    self.tvars
                        .fresh_unify(def, tvar, nongen.as_deref(), id, &mut self.structs, &mut self.work)
                } else {
                    self.unify(def, tvar)
                }
            }
            SyntaxKind::Let { targ, def, body, .. } => {
                let def_tvar = self.nodes[def.index()].tvar;
                let body_tvar = self.nodes[body.index()].tvar;
                self.unify(targ, def_tvar) | self.unify(tvar, body_tvar)
            }
            SyntaxKind::Root { body } => {
                let body_tvar = self.nodes[body.index()].tvar;
                self.unify(tvar, body_tvar)
            }
            SyntaxKind::Apply { fun, args } => self.hm_apply(id, tvar, fun, &args),
            SyntaxKind::Field { rec, name } => self.hm_field(id, tvar, rec, &name),
        }
    }

    fn hm_apply(&mut self, id: SyntaxId, tvar: TVarId, fun: SyntaxId, args: &[SyntaxId]) -> bool {
        // The call's value reads this variable.
        self.tvars.add_dep(tvar, id);
        if let Some(progress) = self.hm_if(tvar, fun, args) {
            return progress;
        }
        let fun_tvar = self.nodes[fun.index()].tvar;
        let arg_tvars: Vec<TVarId> = args.iter().map(|a| self.nodes[a.index()].tvar).collect();
        match fun_shape(self.tvars.kind(fun_tvar), arg_tvars.len()) {
            Some((params, ret)) => {
                let mut progress = false;
                for (p, a) in params.into_iter().zip(arg_tvars) {
                    progress |= self.unify(p, a);
                }
                progress | self.unify(ret, tvar)
            }
            None => {
                let shape = self.tvars.alloc(TKind::Fun {
                    fidxs: Fidxs::new(),
                    args: arg_tvars,
                    ret: tvar,
                });
                self.unify(fun_tvar, shape)
            }
        }
    }

    /// Call of the `if` primitive: only branches the predicate leaves live
    /// are unified with the result. `None` if this is not such a call.
    fn hm_if(&mut self, tvar: TVarId, fun: SyntaxId, args: &[SyntaxId]) -> Option<bool> {
        let SyntaxKind::Prim { prim: Prim::If, fun: info, .. } = &self.nodes[fun.index()].kind else {
            return None;
        };
        if args.len() != 3 {
            return None;
        }
        let pred_param = info.targs[0];
        let TKind::Fun { ret, .. } = *self.tvars.kind(self.nodes[fun.index()].tvar) else {
            return None;
        };
        let (then_live, else_live) = if self.config.do_gcp {
            let pred = &self.nodes[args[0].index()].flow;
            if pred.above_center() {
                (false, false)
            } else {
                (!pred.is_false(), pred.may_be_nil())
            }
        } else {
            (true, true)
        };

        let [p, t, f] = [args[0], args[1], args[2]].map(|a| self.nodes[a.index()].tvar);
        let mut progress = self.unify(pred_param, p);
        progress |= self.unify(ret, tvar);
        if then_live {
            progress |= self.unify(t, tvar);
        }
        if else_live {
            progress |= self.unify(f, tvar);
        }
        Some(progress)
    }

    fn hm_field(&mut self, id: SyntaxId, tvar: TVarId, rec: SyntaxId, name: &str) -> bool {
        let rec_tvar = self.nodes[rec.index()].tvar;
        self.tvars.add_dep(rec_tvar, id);
        match self.tvars.kind(rec_tvar).clone() {
            TKind::Struct { fields, open, aliases } => match fields.get(name) {
                Some(&field) => self.unify(field, tvar),
                None if open => {
                    let mut fields = fields;
                    fields.insert(name.to_string(), tvar);
                    self.tvars.set_kind(rec_tvar, TKind::Struct { aliases, open, fields });
                    let deps = self.tvars.deps(rec_tvar).to_vec();
                    self.work.extend(deps);
                    true
                }
                None => self.type_error(tvar, format!("Missing field {}", name)),
            },
            TKind::Nil(_) => self.type_error(tvar, format!("May be nil when loading field {}", name)),
            TKind::Error(err) => {
                let known = err.alts.iter().find_map(|alt| match alt {
                    TKind::Struct { fields, .. } => fields.get(name).copied(),
                    _ => None,
                });
                match known {
                    Some(field) => self.unify(field, tvar),
                    None => self.require_field(rec_tvar, tvar, name),
                }
            }
            _ => self.require_field(rec_tvar, tvar, name),
        }
    }

    /// Unify `rec` with an open struct holding `name: field`.
    fn require_field(&mut self, rec: TVarId, field: TVarId, name: &str) -> bool {
        let shape = self.tvars.alloc(TKind::Struct {
            aliases: Aliases::new(),
            open: true,
            fields: BTreeMap::from([(name.to_string(), field)]),
        });
        self.unify(rec, shape)
    }

    /// Mark `tvar` as a type error with `msg`, once.
    fn type_error(&mut self, tvar: TVarId, msg: String) -> bool {
        if self.tvars.is_error(tvar) {
            return false;
        }
        let err = self.tvars.alloc(TKind::Error(Box::new(TError::with_msg(msg))));
        self.unify(tvar, err)
    }
}

/// Parameters and result of a function type with `nargs` parameters, also
/// when it is one alternative of an error.
fn fun_shape(kind: &TKind, nargs: usize) -> Option<(Vec<TVarId>, TVarId)> {
    let matching = |k: &TKind| match k {
        TKind::Fun { args, ret, .. } if args.len() == nargs => Some((args.clone(), *ret)),
        _ => None,
    };
    match kind {
        TKind::Error(err) => err.alts.iter().find_map(matching),
        other => matching(other),
    }
}
