use super::*;
use crate::syntax::{Binding, SyntaxKind};
use pretty_assertions::assert_eq;

fn lowered(source: &str) -> Analysis {
    let expr = hm_gcp_parser::parse(source).unwrap();
    Analysis::from_expr(&expr, AnalysisConfig::default()).unwrap()
}

fn ran(source: &str, config: AnalysisConfig) -> Analysis {
    let expr = hm_gcp_parser::parse(source).unwrap();
    let mut analysis = Analysis::from_expr(&expr, config).unwrap();
    analysis.run().unwrap();
    analysis
}

fn idents<'a>(analysis: &'a Analysis, name: &str) -> Vec<&'a SyntaxKind> {
    analysis
        .nodes()
        .map(|(_, n)| &n.kind)
        .filter(|k| matches!(k, SyntaxKind::Ident { name: n, .. } if n == name))
        .collect()
}

// ==================== Lowering ====================

#[test]
fn test_lower_unbound_identifier() {
    let expr = hm_gcp_parser::parse("(frob 1)").unwrap();
    let err = Analysis::from_expr(&expr, AnalysisConfig::default()).unwrap_err();
    match err {
        AnalysisError::UnboundIdentifier { name, span } => {
            assert_eq!(name, "frob");
            assert_eq!(span.line, 1);
            assert_eq!(span.column, 2);
        }
        other => panic!("expected UnboundIdentifier, got {:?}", other),
    }
}

#[test]
fn test_lower_root_is_first_node() {
    let analysis = lowered("1");
    assert_eq!(analysis.root().index(), 0);
    assert_eq!(analysis.node(analysis.root()).kind.name(), "root");
    assert_eq!(analysis.node(analysis.root()).parent, None);
}

#[test]
fn test_lower_let_shadows_primitive() {
    let analysis = lowered("pair = {x -> x}; (pair 3)");
    let prims = analysis
        .nodes()
        .filter(|(_, n)| matches!(n.kind, SyntaxKind::Prim { .. }))
        .count();
    assert_eq!(prims, 0);
    assert_eq!(idents(&analysis, "pair").len(), 1);
}

#[test]
fn test_lower_each_primitive_use_is_its_own_instance() {
    let analysis = lowered("(pair (pair 1 2) 3)");
    let fidxs: Vec<Fidx> = analysis
        .nodes()
        .filter_map(|(_, n)| match &n.kind {
            SyntaxKind::Prim { fun, alias, .. } => {
                assert!(alias.is_some());
                Some(fun.fidx)
            }
            _ => None,
        })
        .collect();
    assert_eq!(fidxs, vec![1, 2]);
}

#[test]
fn test_lower_let_use_is_fresh_outside_definition() {
    let analysis = lowered("id = {x -> x}; (id 1)");
    match idents(&analysis, "id")[0] {
        SyntaxKind::Ident { binding, fresh, .. } => {
            assert!(matches!(binding, Binding::Let { .. }));
            assert!(*fresh);
        }
        _ => unreachable!(),
    }
    match idents(&analysis, "x")[0] {
        SyntaxKind::Ident { binding, fresh, .. } => {
            assert!(matches!(binding, Binding::Lambda { idx: 0, .. }));
            assert!(!*fresh);
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_lower_recursive_use_is_not_fresh() {
    let analysis = lowered("fact = {n -> (if (eq0 n) 1 (* n (fact (dec n))))}; (fact 3)");
    let uses = idents(&analysis, "fact");
    assert_eq!(uses.len(), 2);
    let fresh: Vec<bool> = uses
        .iter()
        .map(|k| match k {
            SyntaxKind::Ident { fresh, .. } => *fresh,
            _ => unreachable!(),
        })
        .collect();
    // inside the definition, then in the body
    assert_eq!(fresh, vec![false, true]);
}

#[test]
fn test_lower_let_collects_refs() {
    let analysis = lowered("a = 1; (pair a a)");
    let refs = analysis
        .nodes()
        .find_map(|(_, n)| match &n.kind {
            SyntaxKind::Let { refs, .. } => Some(refs.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(refs.len(), 2);
    for r in refs {
        assert_eq!(analysis.node(r).label(), "a");
    }
}

#[test]
fn test_lower_lambda_params_get_refs() {
    let analysis = lowered("{x y -> (pair y y)}");
    let fun = analysis
        .nodes()
        .find_map(|(_, n)| match &n.kind {
            SyntaxKind::Lambda { fun, .. } => Some(fun.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(fun.fidx, 1);
    assert_eq!(fun.nargs(), 2);
    assert_eq!(fun.refs[0].len(), 0);
    assert_eq!(fun.refs[1].len(), 2);
}

// ==================== Driver ====================

#[test]
fn test_run_iteration_cap() {
    let expr = hm_gcp_parser::parse("(pair 1 2)").unwrap();
    let config = AnalysisConfig {
        max_iterations: 1,
        ..AnalysisConfig::default()
    };
    let mut analysis = Analysis::from_expr(&expr, config).unwrap();
    let err = analysis.run().unwrap_err();
    assert!(matches!(err, AnalysisError::IterationCapExceeded { limit: 1 }));
}

#[test]
fn test_run_settles_with_quiescence_check() {
    let analysis = ran(
        "fact = {n -> (if (eq0 n) 1 (* n (fact (dec n))))}; (fact 3)",
        AnalysisConfig::default(),
    );
    assert!(analysis.work.is_empty());
    assert!(analysis.iterations.first_pass >= analysis.nodes.len());
}

#[test]
fn test_run_hm_only_skips_escape() {
    let analysis = ran("{x -> (+ x 1)}", AnalysisConfig::default().with_gcp(false));
    assert!(analysis.escaped.is_empty());
    assert_eq!(analysis.iterations.escape_pass, 0);
    assert_eq!(analysis.tvars.render(analysis.node(analysis.root).tvar), "{ int64 -> int64 }");
}

#[test]
fn test_run_dead_branch_not_unified() {
    let analysis = ran("(if 1 3 \"abc\")", AnalysisConfig::default());
    let root = analysis.node(analysis.root);
    assert_eq!(analysis.tvars.render(root.tvar), "int64");
    assert_eq!(analysis.structs.render(&root.flow), "3");
    assert!(analysis.nodes.iter().all(|n| !analysis.tvars.has_error(n.tvar)));
}

#[test]
fn test_run_escape_widens_parameters() {
    let analysis = ran("{x -> (+ x 1)}", AnalysisConfig::default());
    assert_eq!(analysis.escaped, BTreeSet::from([1]));
    let lambda = analysis.fun_node(1).unwrap();
    let types = analysis.node(lambda).kind.fun_info().unwrap().types.clone();
    assert_eq!(types, vec![crate::lattice::Value::Scalar]);
}

#[test]
fn test_fun_node_lookup() {
    let analysis = lowered("{x -> x}");
    assert_eq!(analysis.fun_node(0), None);
    assert_eq!(analysis.fun_node(2), None);
    let id = analysis.fun_node(1).unwrap();
    assert_eq!(analysis.node(id).kind.name(), "lambda");
}

#[test]
fn test_iterations_match_worklist_pops() {
    let analysis = ran("{x -> (+ x 1)}", AnalysisConfig::default());
    let Iterations { first_pass, escape_pass } = analysis.iterations;
    assert!(escape_pass > 0);
    assert_eq!(first_pass + escape_pass, analysis.work.pops());
}
