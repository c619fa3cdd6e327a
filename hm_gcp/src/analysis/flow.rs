//! Value steps.
//!
//! Each node's value is recomputed from its inputs and stored as the meet
//! with its previous value, so values only fall. When a value changes, the
//! parent decides which nodes depend on it.

use super::Analysis;
use crate::diagnostics::{Diagnostic, DiagnosticReason};
use crate::lattice::{Aliases, Fidxs, Value};
use crate::structs::approximate_fun;
use crate::syntax::{Binding, SyntaxId, SyntaxKind};
use std::collections::BTreeMap;

impl Analysis {
    /// Recompute the value of `id`, store it and wake dependents.
    pub(super) fn value_step(&mut self, id: SyntaxId) {
        let new = self.value_of(id, true);
        let old = self.nodes[id.index()].flow.clone();
        let stored = self.structs.meet(&old, &new);
        if stored != new {
            let (old_s, new_s) = (self.structs.render(&old), self.structs.render(&new));
            log::warn!("non-monotone value at {:?}: {} after {}", id, new_s, old_s);
            let node = &self.nodes[id.index()];
            let diag = Diagnostic::new(DiagnosticReason::NonMonotone { old: old_s, new: new_s })
                .with_span(node.span)
                .with_context(node.kind.name());
            self.diagnostics.record(diag);
        }
        if stored == old {
            return;
        }
        log::trace!("{:?} falls to {}", id, stored);
        self.nodes[id.index()].flow = stored;
        if let Some(parent) = self.nodes[id.index()].parent {
            self.add_val_work(parent, id);
        }
    }

    /// The value `id` computes from its inputs' current values. With
    /// `register` set, newly reached call targets learn about the call site.
    pub(super) fn value_of(&mut self, id: SyntaxId, register: bool) -> Value {
        let kind = self.nodes[id.index()].kind.clone();
        match kind {
            SyntaxKind::Constant(v) => v,
            SyntaxKind::Ident { binding, .. } => match binding {
                Binding::Lambda { def, idx } => self.nodes[def.index()]
                    .kind
                    .fun_info()
                    .and_then(|f| f.types.get(idx).cloned())
                    .unwrap_or(Value::Scalar),
                Binding::Let { def } => match &self.nodes[def.index()].kind {
                    SyntaxKind::Let { def, .. } => self.nodes[def.index()].flow.clone(),
                    _ => Value::Scalar,
                },
            },
            SyntaxKind::Lambda { body, fun, .. } => {
                let body = self.nodes[body.index()].flow.clone();
                let value = Value::fun(fun.fidx, fun.nargs(), body);
                approximate_fun(&value, &Fidxs::from([fun.fidx]), self.config.fun_cutoff)
            }
            SyntaxKind::Let { body, .. } | SyntaxKind::Root { body } => self.nodes[body.index()].flow.clone(),
            SyntaxKind::Apply { fun, args } => self.apply_value(id, fun, &args, register),
            SyntaxKind::Struct { alias, fields } => {
                let values = fields
                    .iter()
                    .map(|(name, f)| (name.clone(), self.nodes[f.index()].flow.clone()))
                    .collect();
                self.alloc_value(id, alias, values)
            }
            SyntaxKind::Field { rec, name } => {
                let rec = &self.nodes[rec.index()].flow;
                match rec {
                    v if v.above_center() => Value::Any,
                    Value::Nil => Value::Any,
                    Value::Ptr { obj, .. } => match self.structs.field(*obj, &name) {
                        Some(v) => v.clone(),
                        None if self.structs.node(*obj).any => Value::Any,
                        None => Value::Scalar,
                    },
                    _ => Value::Scalar,
                }
            }
            SyntaxKind::Prim { prim, alias, fun } => {
                let ret = match alias {
                    Some(alias) if prim.is_constructor() => {
                        let values = fun
                            .types
                            .iter()
                            .enumerate()
                            .map(|(i, v)| (i.to_string(), v.clone()))
                            .collect();
                        self.alloc_value(id, alias, values)
                    }
                    _ => prim.apply(&fun.types, &mut self.structs),
                };
                Value::fun(fun.fidx, fun.nargs(), ret)
            }
        }
    }

    /// Pointer to a struct allocated at `alias`, depth-bounded.
    fn alloc_value(&mut self, id: SyntaxId, alias: u32, fields: BTreeMap<String, Value>) -> Value {
        let obj = self.structs.make(fields);
        let approx = self.structs.approximate(&Aliases::from([alias]), obj, self.config.cutoff);
        if approx.chopped {
            log::warn!("struct at site {} chopped after folding did not settle", alias);
            let diag = Diagnostic::new(DiagnosticReason::ApproximationFallback(alias))
                .with_span(self.nodes[id.index()].span)
                .with_context(self.nodes[id.index()].kind.name());
            self.diagnostics.record(diag);
        }
        Value::ptr(alias, approx.id)
    }

    fn apply_value(&mut self, id: SyntaxId, fun: SyntaxId, args: &[SyntaxId], register: bool) -> Value {
        let f = match self.nodes[fun.index()].flow.clone() {
            Value::Fun(f) => f,
            other if other.above_center() => return Value::Any,
            _ => return Value::Scalar,
        };
        if f.fidxs.is_empty() {
            return Value::Any;
        }
        if register {
            for &fidx in &f.fidxs {
                let Some(target) = self.fun_node(fidx) else {
                    continue;
                };
                if self.register_call(target, id) {
                    for (i, arg) in args.iter().enumerate() {
                        let value = self.nodes[arg.index()].flow.clone();
                        self.arg_meet(target, i, &value);
                    }
                    if matches!(self.nodes[target.index()].kind, SyntaxKind::Prim { .. }) {
                        self.work.push(target);
                    }
                }
            }
        }
        let ret = *f.ret;
        match self.hm_lift(id, args) {
            Some(lift) => self.structs.join(&ret, &lift),
            None => ret,
        }
    }

    /// Record `call` as a call site of `target`. False if already known.
    fn register_call(&mut self, target: SyntaxId, call: SyntaxId) -> bool {
        let Some(info) = self.nodes[target.index()].kind.fun_info_mut() else {
            return false;
        };
        if info.applys.contains(&call) {
            return false;
        }
        log::trace!("call {:?} reaches fidx {}", call, info.fidx);
        info.applys.push(call);
        true
    }

    /// When the call's type is a bare variable shared with some arguments, the
    /// callee is parametric in it and can only return one of those arguments:
    /// the meet of their values bounds the result from above.
    fn hm_lift(&mut self, id: SyntaxId, args: &[SyntaxId]) -> Option<Value> {
        if !self.config.do_hm {
            return None;
        }
        let tvar = self.tvars.find(self.nodes[id.index()].tvar);
        if !self.tvars.is_leaf(tvar) {
            return None;
        }
        let mut lift: Option<Value> = None;
        for arg in args {
            if self.tvars.find(self.nodes[arg.index()].tvar) != tvar {
                continue;
            }
            let value = self.nodes[arg.index()].flow.clone();
            lift = Some(match lift {
                Some(prev) => self.structs.meet(&prev, &value),
                None => value,
            });
        }
        lift
    }

    /// Meet `value` into parameter `idx` of the function at `target`.
    pub(super) fn arg_meet(&mut self, target: SyntaxId, idx: usize, value: &Value) {
        let Some(old) = self.nodes[target.index()]
            .kind
            .fun_info()
            .and_then(|f| f.types.get(idx).cloned())
        else {
            return;
        };
        let new = self.structs.meet(&old, value);
        if new == old {
            return;
        }
        let is_prim = matches!(self.nodes[target.index()].kind, SyntaxKind::Prim { .. });
        if let Some(info) = self.nodes[target.index()].kind.fun_info_mut() {
            info.types[idx] = new;
            let refs = info.refs[idx].clone();
            self.work.extend(refs);
        }
        if is_prim {
            self.work.push(target);
        }
    }

    /// `child`'s value changed; push what depends on it.
    fn add_val_work(&mut self, parent: SyntaxId, child: SyntaxId) {
        match &self.nodes[parent.index()].kind {
            SyntaxKind::Lambda { fun, .. } => {
                let applys = fun.applys.clone();
                self.work.push(parent);
                self.work.extend(applys);
            }
            SyntaxKind::Let { def, refs, .. } => {
                if *def == child {
                    let refs = refs.clone();
                    self.work.extend(refs);
                } else {
                    self.work.push(parent);
                }
            }
            SyntaxKind::Apply { fun, args } => {
                let fun = *fun;
                let argn = args.iter().position(|&a| a == child);
                self.work.push(parent);
                let (Some(argn), Value::Fun(f)) = (argn, &self.nodes[fun.index()].flow) else {
                    return;
                };
                let value = self.nodes[child.index()].flow.clone();
                let targets: Vec<SyntaxId> = f.fidxs.iter().filter_map(|&fidx| self.fun_node(fidx)).collect();
                for target in targets {
                    self.arg_meet(target, argn, &value);
                }
            }
            _ => {
                self.work.push(parent);
            }
        }
    }
}
