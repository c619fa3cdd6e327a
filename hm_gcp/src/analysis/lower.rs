//! Lowering parsed expressions into the syntax arena.
//!
//! Lowering also does the one-time preparation: every node gets a type
//! variable and its non-generic stack, identifiers are resolved against the
//! enclosing lambdas and lets (then against the primitive table), and
//! lambdas, structs, constants and primitives get their fixed type shapes.

use super::Analysis;
use crate::error::AnalysisError;
use crate::lattice::{Aliases, Fidx, Fidxs, Value};
use crate::syntax::{Binding, FunInfo, Prim, SyntaxId, SyntaxKind, SyntaxNode};
use crate::tvar::{TKind, TVarId, VStack};
use hm_gcp_parser::{Expr, Literal, Span};
use std::collections::BTreeMap;
use std::rc::Rc;

type NonGen = Option<Rc<VStack>>;

/// A binding construct in scope while lowering its body.
struct Scope<'a> {
    id: SyntaxId,
    is_let: bool,
    names: &'a [String],
    targs: Vec<TVarId>,
    /// Identifiers resolved to each name.
    refs: Vec<Vec<SyntaxId>>,
}

impl Analysis {
    pub(super) fn lower_program(&mut self, expr: &Expr) -> Result<SyntaxId, AnalysisError> {
        let root = self.reserve(None, expr.span(), None);
        let mut scopes = Vec::new();
        let body = self.lower(expr, root, &None, &mut scopes)?;
        self.nodes[root.index()].kind = SyntaxKind::Root { body };
        Ok(root)
    }

    /// Push a node with a fresh leaf type variable. Its kind is set by the
    /// caller once the children exist.
    fn reserve(&mut self, parent: Option<SyntaxId>, span: Span, nongen: NonGen) -> SyntaxId {
        let id = SyntaxId(self.nodes.len() as u32);
        let tvar = self.tvars.leaf();
        self.nodes.push(SyntaxNode {
            kind: SyntaxKind::Constant(Value::Any),
            parent,
            tvar,
            flow: Value::Any,
            nongen,
            span,
        });
        id
    }

    fn new_fidx(&mut self, node: SyntaxId) -> Fidx {
        self.funs.push(node);
        self.funs.len() as Fidx
    }

    fn new_alias(&mut self) -> u32 {
        let alias = self.next_alias;
        self.next_alias += 1;
        alias
    }

    fn lower<'a>(
        &mut self,
        expr: &'a Expr,
        parent: SyntaxId,
        nongen: &NonGen,
        scopes: &mut Vec<Scope<'a>>,
    ) -> Result<SyntaxId, AnalysisError> {
        match expr {
            Expr::Lit { value, span } => {
                let id = self.reserve(Some(parent), *span, nongen.clone());
                let value = match value {
                    Literal::Nil => Value::Nil,
                    Literal::Int(v) => Value::int(*v),
                    Literal::Float(v) => Value::flt(*v),
                    Literal::Str(s) => Value::str(s.clone()),
                };
                // nil may stand for any pointer or number
                let shape = match value {
                    Value::Nil => TKind::Nil(self.tvars.leaf()),
                    ref v => TKind::Base(v.widen()),
                };
                let tvar = self.nodes[id.index()].tvar;
                self.tvars.set_kind(tvar, shape);
                self.nodes[id.index()].kind = SyntaxKind::Constant(value);
                Ok(id)
            }
            Expr::Ident { name, span } => self.lower_ident(name, *span, parent, nongen, scopes),
            Expr::Lambda { params, body, span } => {
                let id = self.reserve(Some(parent), *span, nongen.clone());
                let fidx = self.new_fidx(id);
                let targs: Vec<TVarId> = params.iter().map(|_| self.tvars.leaf()).collect();
                let mut inner = nongen.clone();
                for &t in &targs {
                    inner = Some(VStack::push(inner, t));
                }
                scopes.push(Scope {
                    id,
                    is_let: false,
                    names: params,
                    targs: targs.clone(),
                    refs: vec![Vec::new(); params.len()],
                });
                let body_id = self.lower(body, id, &inner, scopes)?;
                let refs = scopes.pop().map(|s| s.refs).unwrap_or_default();

                let body_tvar = self.nodes[body_id.index()].tvar;
                let tvar = self.nodes[id.index()].tvar;
                self.tvars.set_kind(
                    tvar,
                    TKind::Fun {
                        fidxs: Fidxs::from([fidx]),
                        args: targs.clone(),
                        ret: body_tvar,
                    },
                );
                self.nodes[id.index()].kind = SyntaxKind::Lambda {
                    params: params.clone(),
                    body: body_id,
                    fun: FunInfo::new(fidx, targs, refs),
                };
                Ok(id)
            }
            Expr::Let { name, def, body, span } => {
                let id = self.reserve(Some(parent), *span, nongen.clone());
                let targ = self.tvars.leaf();
                scopes.push(Scope {
                    id,
                    is_let: true,
                    names: std::slice::from_ref(name),
                    targs: vec![targ],
                    refs: vec![Vec::new()],
                });
                // The definition may refer to itself; it is not generalized
                // while being defined.
                let def_nongen = Some(VStack::push(nongen.clone(), targ));
                let def_id = self.lower(def, id, &def_nongen, scopes)?;
                let body_id = self.lower(body, id, nongen, scopes)?;
                let refs = scopes
                    .pop()
                    .and_then(|s| s.refs.into_iter().next())
                    .unwrap_or_default();
                self.nodes[id.index()].kind = SyntaxKind::Let {
                    name: name.clone(),
                    targ,
                    def: def_id,
                    body: body_id,
                    refs,
                };
                Ok(id)
            }
            Expr::Apply { fun, args, span } => {
                let id = self.reserve(Some(parent), *span, nongen.clone());
                let fun_id = self.lower(fun, id, nongen, scopes)?;
                let arg_ids = args
                    .iter()
                    .map(|arg| self.lower(arg, id, nongen, scopes))
                    .collect::<Result<Vec<_>, _>>()?;
                self.nodes[id.index()].kind = SyntaxKind::Apply {
                    fun: fun_id,
                    args: arg_ids,
                };
                Ok(id)
            }
            Expr::Struct { fields, span } => {
                let id = self.reserve(Some(parent), *span, nongen.clone());
                let alias = self.new_alias();
                let mut lowered = Vec::with_capacity(fields.len());
                let mut ftvars = BTreeMap::new();
                for (name, field) in fields {
                    let fid = self.lower(field, id, nongen, scopes)?;
                    ftvars.insert(name.clone(), self.nodes[fid.index()].tvar);
                    lowered.push((name.clone(), fid));
                }
                let tvar = self.nodes[id.index()].tvar;
                self.tvars.set_kind(
                    tvar,
                    TKind::Struct {
                        aliases: Aliases::from([alias]),
                        open: false,
                        fields: ftvars,
                    },
                );
                self.nodes[id.index()].kind = SyntaxKind::Struct { alias, fields: lowered };
                Ok(id)
            }
            Expr::Field { rec, name, span } => {
                let id = self.reserve(Some(parent), *span, nongen.clone());
                let rec_id = self.lower(rec, id, nongen, scopes)?;
                self.nodes[id.index()].kind = SyntaxKind::Field {
                    rec: rec_id,
                    name: name.clone(),
                };
                Ok(id)
            }
        }
    }

    fn lower_ident(
        &mut self,
        name: &str,
        span: Span,
        parent: SyntaxId,
        nongen: &NonGen,
        scopes: &mut [Scope<'_>],
    ) -> Result<SyntaxId, AnalysisError> {
        let found = scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(s, scope)| scope.names.iter().rposition(|n| n == name).map(|idx| (s, idx)));

        let Some((s, idx)) = found else {
            return match Prim::from_name(name) {
                Some(prim) => Ok(self.lower_prim(prim, span, parent, nongen)),
                None => Err(AnalysisError::UnboundIdentifier {
                    name: name.to_string(),
                    span,
                }),
            };
        };

        let id = self.reserve(Some(parent), span, nongen.clone());
        let scope = &mut scopes[s];
        scope.refs[idx].push(id);
        let (binding, fresh) = if scope.is_let {
            let fresh = !self.tvars.occurs_in(scope.targs[idx], nongen.as_deref());
            (Binding::Let { def: scope.id }, fresh)
        } else {
            (Binding::Lambda { def: scope.id, idx }, false)
        };
        self.nodes[id.index()].kind = SyntaxKind::Ident {
            name: name.to_string(),
            binding,
            fresh,
        };
        Ok(id)
    }

    fn lower_prim(&mut self, prim: Prim, span: Span, parent: SyntaxId, nongen: &NonGen) -> SyntaxId {
        let id = self.reserve(Some(parent), span, nongen.clone());
        let fidx = self.new_fidx(id);
        let alias = prim.is_constructor().then(|| self.new_alias());
        let (targs, ret) = prim.signature(&mut self.tvars, alias);
        let tvar = self.nodes[id.index()].tvar;
        self.tvars.set_kind(
            tvar,
            TKind::Fun {
                fidxs: Fidxs::from([fidx]),
                args: targs.clone(),
                ret,
            },
        );
        let refs = vec![Vec::new(); targs.len()];
        self.nodes[id.index()].kind = SyntaxKind::Prim {
            prim,
            alias,
            fun: FunInfo::new(fidx, targs, refs),
        };
        id
    }

    /// Type variable an identifier binding refers to.
    pub(super) fn binding_tvar(&self, binding: Binding) -> Option<TVarId> {
        match binding {
            Binding::Lambda { def, idx } => self.nodes[def.index()]
                .kind
                .fun_info()
                .and_then(|f| f.targs.get(idx).copied()),
            Binding::Let { def } => match &self.nodes[def.index()].kind {
                SyntaxKind::Let { targ, .. } => Some(*targ),
                _ => None,
            },
        }
    }
}
