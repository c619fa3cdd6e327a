//! Reading results out of a finished analysis.

use super::Analysis;
use crate::diagnostics::{Diagnostic, DiagnosticReason};
use crate::lattice::{Fidx, Value};
use hm_gcp_parser::Span;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Worklist pops spent in each pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Iterations {
    pub first_pass: usize,
    pub escape_pass: usize,
}

/// Type and value of one syntax node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeReport {
    pub id: usize,
    pub kind: &'static str,
    pub label: String,
    pub span: Span,
    #[serde(rename = "type")]
    pub ty: String,
    pub value: String,
}

/// Signature of a function reachable from the program's value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EscapedSignature {
    pub fidx: Fidx,
    pub label: String,
    /// Parameter values after widening.
    pub params: Vec<String>,
    pub ret: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl fmt::Display for EscapedSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} : {} ; ({}) -> {}", self.fidx, self.label, self.ty, self.params.join(", "), self.ret)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AnalysisResult {
    /// HM type of the whole program.
    pub program_type: String,
    /// GCP value of the whole program.
    pub program_value: String,
    pub nodes: Vec<NodeReport>,
    pub escaped: Vec<EscapedSignature>,
    pub iterations: Iterations,
    pub diagnostics: Vec<Diagnostic>,
    /// Some node's type holds a unification conflict.
    pub has_errors: bool,
}

impl AnalysisResult {
    /// Report of the first node with this kind and label, in source order.
    pub fn find(&self, kind: &str, label: &str) -> Option<&NodeReport> {
        self.nodes.iter().find(|n| n.kind == kind && n.label == label)
    }
}

impl Analysis {
    /// Collect the result. Unification conflicts are added to the
    /// diagnostics here, once per conflicting type.
    pub fn result(&self) -> AnalysisResult {
        let root = self.node(self.root);
        let nodes: Vec<NodeReport> = self
            .nodes()
            .map(|(id, node)| NodeReport {
                id: id.index(),
                kind: node.kind.name(),
                label: node.label(),
                span: node.span,
                ty: self.tvars.render(node.tvar),
                value: self.structs.render(&node.flow),
            })
            .collect();

        let mut diagnostics = self.diagnostics.items().to_vec();
        let mut has_errors = false;
        let mut reported = HashSet::new();
        for (_, node) in self.nodes() {
            has_errors |= self.tvars.has_error(node.tvar);
            if !self.tvars.is_error(node.tvar) {
                continue;
            }
            if self.diagnostics.is_enabled() && reported.insert(self.tvars.root(node.tvar)) {
                let ty = self.tvars.render(node.tvar);
                diagnostics.push(
                    Diagnostic::new(DiagnosticReason::UnificationError(ty))
                        .with_span(node.span)
                        .with_context(node.kind.name()),
                );
            }
        }

        AnalysisResult {
            program_type: self.tvars.render(root.tvar),
            program_value: self.structs.render(&root.flow),
            nodes,
            escaped: self.escaped_signatures(),
            iterations: self.iterations,
            diagnostics,
            has_errors,
        }
    }

    /// Signatures of every function reachable from the program's value.
    pub fn escaped_signatures(&self) -> Vec<EscapedSignature> {
        let root = &self.node(self.root).flow;
        self.escaping(root)
            .into_iter()
            .filter_map(|fidx| {
                let node = self.node(self.fun_node(fidx)?);
                let info = node.kind.fun_info()?;
                let ret = match &node.flow {
                    Value::Fun(f) => self.structs.render(&f.ret),
                    other => self.structs.render(other),
                };
                Some(EscapedSignature {
                    fidx,
                    label: node.label(),
                    params: info.types.iter().map(|v| self.structs.render(v)).collect(),
                    ret,
                    ty: self.tvars.render(node.tvar),
                })
            })
            .collect()
    }
}
