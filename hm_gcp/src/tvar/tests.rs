use super::*;
use crate::structs::StructArena;
use crate::worklist::Worklist;
use pretty_assertions::assert_eq;

struct Fixture {
    tvars: TVarArena,
    structs: StructArena,
    work: Worklist,
}

impl Fixture {
    fn new() -> Self {
        Self {
            tvars: TVarArena::new(),
            structs: StructArena::new(),
            work: Worklist::new(1),
        }
    }

    fn unify(&mut self, a: TVarId, b: TVarId) -> bool {
        self.tvars.unify(a, b, &mut self.structs, &mut self.work)
    }

    fn fun(&mut self, args: Vec<TVarId>, ret: TVarId) -> TVarId {
        self.tvars.alloc(TKind::Fun {
            fidxs: Fidxs::new(),
            args,
            ret,
        })
    }

    fn strukt(&mut self, open: bool, fields: &[(&str, TVarId)]) -> TVarId {
        self.tvars.alloc(TKind::Struct {
            aliases: Aliases::new(),
            open,
            fields: fields.iter().map(|(n, t)| (n.to_string(), *t)).collect(),
        })
    }

    fn render(&self, id: TVarId) -> String {
        self.tvars.render(id)
    }
}

#[test]
fn test_leaf_takes_shape() {
    let mut fx = Fixture::new();
    let a = fx.tvars.leaf();
    let i = fx.tvars.base(Value::INT64);
    assert!(fx.unify(a, i));
    assert_eq!(fx.render(a), "int64");
    assert!(!fx.unify(a, i), "unify is idempotent");
}

#[test]
fn test_base_mismatch_is_error() {
    let mut fx = Fixture::new();
    let i = fx.tvars.base(Value::INT64);
    let s = fx.tvars.base(Value::STRPTR);
    fx.unify(i, s);
    assert!(fx.tvars.is_error(i));
    assert_eq!(fx.render(s), "Cannot unify int64 and *str");

    // A further base that fits an existing alternative adds nothing new.
    let b = fx.tvars.base(Value::BOOL);
    fx.unify(b, i);
    assert_eq!(fx.render(b), "Cannot unify int64 and *str");
}

#[test]
fn test_fun_unify() {
    let mut fx = Fixture::new();
    let a = fx.tvars.leaf();
    let i = fx.tvars.base(Value::INT64);
    let f1 = fx.fun(vec![a], i);
    let s = fx.tvars.base(Value::STRPTR);
    let b = fx.tvars.leaf();
    let f2 = fx.fun(vec![s], b);
    fx.unify(f1, f2);
    assert_eq!(fx.render(f1), "{ *str -> int64 }");
    assert_eq!(fx.tvars.find(f1), fx.tvars.find(f2));
}

#[test]
fn test_unify_commutes() {
    let build = |fx: &mut Fixture| {
        let a = fx.tvars.leaf();
        let i = fx.tvars.base(Value::INT64);
        let x = fx.fun(vec![a], i);
        let s = fx.tvars.base(Value::STRPTR);
        let b = fx.tvars.leaf();
        let y = fx.fun(vec![s], b);
        (x, y)
    };
    let mut left = Fixture::new();
    let (x1, y1) = build(&mut left);
    left.unify(x1, y1);
    let mut right = Fixture::new();
    let (x2, y2) = build(&mut right);
    right.unify(y2, x2);
    assert_eq!(left.render(x1), right.render(x2));
}

#[test]
fn test_arity_mismatch() {
    let mut fx = Fixture::new();
    let a = fx.tvars.leaf();
    let r1 = fx.tvars.leaf();
    let f1 = fx.fun(vec![a], r1);
    let r2 = fx.tvars.leaf();
    let f2 = fx.fun(vec![], r2);
    fx.unify(f1, f2);
    assert_eq!(fx.render(f1), "Cannot unify { A -> B } and { -> C }");
}

#[test]
fn test_struct_missing_field() {
    let mut fx = Fixture::new();
    let i = fx.tvars.base(Value::INT64);
    let closed = fx.strukt(false, &[("a", i)]);
    let b = fx.tvars.leaf();
    let open = fx.strukt(true, &[("b", b)]);
    fx.unify(closed, open);
    assert_eq!(fx.render(closed), "@{ a = int64; b = Missing field b }");
    assert!(fx.tvars.has_error(closed));
}

#[test]
fn test_open_structs_merge_fields() {
    let mut fx = Fixture::new();
    let i = fx.tvars.base(Value::INT64);
    let x = fx.strukt(true, &[("a", i)]);
    let s = fx.tvars.base(Value::STRPTR);
    let y = fx.strukt(true, &[("b", s)]);
    fx.unify(x, y);
    assert_eq!(fx.render(x), "@{ a = int64; b = *str; ... }");
    assert!(!fx.tvars.has_error(x));
}

#[test]
fn test_tuple_rendering() {
    let mut fx = Fixture::new();
    let i = fx.tvars.base(Value::INT64);
    let s = fx.tvars.base(Value::STRPTR);
    let pair = fx.strukt(false, &[("0", i), ("1", s)]);
    assert_eq!(fx.render(pair), "( int64, *str )");
}

#[test]
fn test_nil_unify() {
    let mut fx = Fixture::new();
    let c = fx.tvars.leaf();
    let n = fx.tvars.alloc(TKind::Nil(c));
    let i = fx.tvars.base(Value::INT64);
    fx.unify(n, i);
    assert_eq!(fx.render(n), "int64");

    let c = fx.tvars.leaf();
    let n = fx.tvars.alloc(TKind::Nil(c));
    let s = fx.tvars.base(Value::STRPTR);
    fx.unify(n, s);
    assert_eq!(fx.render(s), "*str?");
}

#[test]
fn test_recursive_type() {
    let mut fx = Fixture::new();
    let r = fx.tvars.leaf();
    let i = fx.tvars.base(Value::INT64);
    let f = fx.fun(vec![i], r);
    fx.unify(r, f);
    assert_eq!(fx.render(f), "A:{ int64 -> A }");
    // Cycles terminate.
    assert!(!fx.unify(f, r));
}

#[test]
fn test_fresh_unify_generalizes() {
    let mut fx = Fixture::new();
    let a = fx.tvars.leaf();
    let id = fx.fun(vec![a], a);

    let i = fx.tvars.base(Value::INT64);
    let r1 = fx.tvars.leaf();
    let use1 = fx.fun(vec![i], r1);
    fx.tvars
        .fresh_unify(id, use1, None, SyntaxId(0), &mut fx.structs, &mut fx.work);

    let s = fx.tvars.base(Value::STRPTR);
    let r2 = fx.tvars.leaf();
    let use2 = fx.fun(vec![s], r2);
    fx.tvars
        .fresh_unify(id, use2, None, SyntaxId(0), &mut fx.structs, &mut fx.work);

    assert_eq!(fx.render(r1), "int64");
    assert_eq!(fx.render(r2), "*str");
    assert_eq!(fx.render(id), "{ A -> A }");
    assert_eq!(fx.tvars.deps(id), &[SyntaxId(0)]);
}

#[test]
fn test_fresh_unify_shares_nongen() {
    let mut fx = Fixture::new();
    let a = fx.tvars.leaf();
    let id = fx.fun(vec![a], a);
    let nongen = VStack::push(None, a);

    let i = fx.tvars.base(Value::INT64);
    let r = fx.tvars.leaf();
    let use1 = fx.fun(vec![i], r);
    fx.tvars
        .fresh_unify(id, use1, Some(&nongen), SyntaxId(0), &mut fx.structs, &mut fx.work);

    assert_eq!(fx.render(id), "{ int64 -> int64 }");
    assert_eq!(fx.render(r), "int64");
}

#[test]
fn test_fresh_copy_shares_nongen() {
    let mut fx = Fixture::new();
    let a = fx.tvars.leaf();
    let b = fx.tvars.leaf();
    let f = fx.fun(vec![a], b);
    let nongen = VStack::push(None, b);
    let mut vars = fresh::FreshVars::new();
    let copy = fx.tvars.fresh_copy(f, Some(&nongen), &mut vars);
    assert_ne!(copy, f);
    match fx.tvars.kind(copy).clone() {
        TKind::Fun { args, ret, .. } => {
            assert_ne!(fx.tvars.find(args[0]), fx.tvars.find(a));
            assert_eq!(fx.tvars.find(ret), fx.tvars.find(b));
        }
        other => panic!("expected fun, got {:?}", other),
    }
}
