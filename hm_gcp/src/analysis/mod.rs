//! Combined HM and GCP analysis.
//!
//! An [`Analysis`] owns everything one run needs: the syntax arena, the type
//! variable arena, the struct arena, the worklist, the identity counters and
//! the diagnostics. Nothing is shared between runs.
//!
//! A run lowers the program, seeds the worklist with every node and drains
//! it. Each pop performs the node's unification step and then its value
//! step; either may push other nodes. Once the worklist is empty, functions
//! reachable from the program's value have their arguments widened to
//! `scalar` (anyone may call them) and the worklist is drained again, until
//! no new function escapes.
//!
//! - `lower`: syntax arena construction and identifier resolution
//! - `hm`: per-form unification steps
//! - `flow`: per-form value steps and dependent wake-up
//! - `escape`: root escape widening
//! - `report`: the public result

mod escape;
mod flow;
mod hm;
mod lower;
mod report;

pub use report::{AnalysisResult, EscapedSignature, Iterations, NodeReport};

use crate::config::AnalysisConfig;
use crate::diagnostics::Diagnostics;
use crate::error::AnalysisError;
use crate::lattice::{Alias, Fidx};
use crate::structs::StructArena;
use crate::syntax::{SyntaxId, SyntaxNode};
use crate::tvar::{TVarArena, TVarId};
use crate::worklist::Worklist;
use hm_gcp_parser::Expr;
use std::collections::BTreeSet;

/// Parse and analyze a program.
pub fn analyze(source: &str, config: &AnalysisConfig) -> Result<AnalysisResult, AnalysisError> {
    let expr = hm_gcp_parser::parse(source)?;
    let mut analysis = Analysis::from_expr(&expr, config.clone())?;
    analysis.run()?;
    Ok(analysis.result())
}

/// One analysis session.
#[derive(Debug)]
pub struct Analysis {
    config: AnalysisConfig,
    nodes: Vec<SyntaxNode>,
    tvars: TVarArena,
    structs: StructArena,
    work: Worklist,
    /// Lambda or primitive node of each function identity, indexed by
    /// `fidx - 1`.
    funs: Vec<SyntaxId>,
    next_alias: Alias,
    root: SyntaxId,
    /// Functions whose arguments have been widened by the escape pass.
    escaped: BTreeSet<Fidx>,
    iterations: Iterations,
    diagnostics: Diagnostics,
}

impl Analysis {
    /// Lower `expr` and seed the worklist with every node.
    pub fn from_expr(expr: &Expr, config: AnalysisConfig) -> Result<Self, AnalysisError> {
        let mut analysis = Analysis {
            work: Worklist::new(config.seed),
            diagnostics: Diagnostics::new(config.collect_diagnostics),
            config,
            nodes: Vec::new(),
            tvars: TVarArena::new(),
            structs: StructArena::new(),
            funs: Vec::new(),
            next_alias: 1,
            root: SyntaxId(0),
            escaped: BTreeSet::new(),
            iterations: Iterations::default(),
        };
        analysis.root = analysis.lower_program(expr)?;
        let all = (0..analysis.nodes.len() as u32).map(SyntaxId);
        analysis.work.extend(all);
        log::debug!(
            "lowered {} nodes, {} functions, {} type variables",
            analysis.nodes.len(),
            analysis.funs.len(),
            analysis.tvars.len()
        );
        Ok(analysis)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn root(&self) -> SyntaxId {
        self.root
    }

    pub fn node(&self, id: SyntaxId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (SyntaxId, &SyntaxNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (SyntaxId(i as u32), n))
    }

    pub fn tvars(&self) -> &TVarArena {
        &self.tvars
    }

    pub fn structs(&self) -> &StructArena {
        &self.structs
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Drive both passes to a fixed point.
    pub fn run(&mut self) -> Result<(), AnalysisError> {
        self.iterations.first_pass = self.drain()?;
        log::debug!("first pass settled after {} pops", self.iterations.first_pass);
        if !self.config.do_gcp {
            return Ok(());
        }
        loop {
            let widened = self.escape_root();
            if widened == 0 {
                break;
            }
            log::debug!("{} escaping functions widened", widened);
            self.iterations.escape_pass += self.drain()?;
        }
        log::debug!("escape pass settled after {} pops", self.iterations.escape_pass);
        Ok(())
    }

    /// Pop until the worklist is empty.
    fn drain(&mut self) -> Result<usize, AnalysisError> {
        let start = self.work.pops();
        while let Some(id) = self.work.pop() {
            if self.work.pops() - start > self.config.max_iterations {
                return Err(AnalysisError::IterationCapExceeded {
                    limit: self.config.max_iterations,
                });
            }
            log::trace!("visit {:?} {}", id, self.nodes[id.index()].kind.name());
            if self.config.do_hm {
                self.hm_step(id);
            }
            if self.config.do_gcp {
                self.value_step(id);
            }
        }
        if self.config.check_quiescence && self.config.do_gcp {
            self.check_quiescence()?;
        }
        Ok(self.work.pops() - start)
    }

    /// Every node off the worklist must be at its fixed point.
    fn check_quiescence(&mut self) -> Result<(), AnalysisError> {
        for i in 0..self.nodes.len() {
            let id = SyntaxId(i as u32);
            if self.work.contains(id) {
                continue;
            }
            let new = self.value_of(id, false);
            let old = self.nodes[i].flow.clone();
            if !self.structs.isa(&new, &old) {
                let node = &self.nodes[i];
                return Err(AnalysisError::StaleNode {
                    kind: node.kind.name(),
                    span: node.span,
                    old: self.structs.render(&old),
                    new: self.structs.render(&new),
                });
            }
        }
        Ok(())
    }

    /// Unify two type variables, waking dependents.
    fn unify(&mut self, a: TVarId, b: TVarId) -> bool {
        self.tvars.unify(a, b, &mut self.structs, &mut self.work)
    }

    /// Lambda or primitive node of a function identity.
    fn fun_node(&self, fidx: Fidx) -> Option<SyntaxId> {
        self.funs.get((fidx as usize).checked_sub(1)?).copied()
    }
}

#[cfg(test)]
mod tests;
