//! Root escape.
//!
//! Functions reachable from the program's value can be called by code the
//! analysis never sees, with arguments it cannot know. Their parameters are
//! widened to `scalar`.

use super::Analysis;
use crate::diagnostics::{Diagnostic, DiagnosticReason};
use crate::lattice::{Fidx, StructId, Value};
use crate::syntax::SyntaxKind;
use std::collections::{BTreeSet, HashSet};

impl Analysis {
    /// Widen the parameters of every newly escaped function. Returns how
    /// many functions were widened.
    pub(super) fn escape_root(&mut self) -> usize {
        let value = self.nodes[self.root.index()].flow.clone();
        if value.above_center() {
            return 0;
        }
        let mut widened = 0;
        for fidx in self.escaping(&value) {
            if !self.escaped.insert(fidx) {
                continue;
            }
            let Some(target) = self.fun_node(fidx) else {
                continue;
            };
            widened += 1;
            let nargs = self.nodes[target.index()].kind.fun_info().map_or(0, |f| f.nargs());
            for idx in 0..nargs {
                self.arg_meet(target, idx, &Value::Scalar);
            }
            if matches!(self.nodes[target.index()].kind, SyntaxKind::Prim { .. }) {
                self.work.push(target);
            }
            log::debug!("fidx {} escapes", fidx);
            let node = &self.nodes[target.index()];
            let diag = Diagnostic::new(DiagnosticReason::EscapedFunctionWidened(fidx))
                .with_span(node.span)
                .with_context(node.label());
            self.diagnostics.record(diag);
        }
        widened
    }

    /// Function identities reachable from `value` through function values,
    /// their return values and struct fields.
    pub(super) fn escaping(&self, value: &Value) -> BTreeSet<Fidx> {
        let mut fidxs = BTreeSet::new();
        let mut seen = HashSet::new();
        self.collect_escaping(value, &mut fidxs, &mut seen);
        fidxs
    }

    fn collect_escaping(&self, value: &Value, fidxs: &mut BTreeSet<Fidx>, seen: &mut HashSet<StructId>) {
        match value {
            Value::Fun(fun) => {
                fidxs.extend(fun.fidxs.iter().copied());
                self.collect_escaping(&fun.ret, fidxs, seen);
            }
            Value::Ptr { obj, .. } => {
                if !seen.insert(*obj) {
                    return;
                }
                for field in self.structs.node(*obj).fields.values() {
                    self.collect_escaping(field, fidxs, seen);
                }
            }
            _ => {}
        }
    }
}
