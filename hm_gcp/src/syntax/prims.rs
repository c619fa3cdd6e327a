//! Built-in functions.
//!
//! Each unshadowed use of a primitive name becomes its own function with a
//! fixed type signature and a hand-written value transfer function.
//!
//! | name      | type                     |
//! |-----------|--------------------------|
//! | `pair`    | `{ A B -> ( A, B ) }`    |
//! | `triple`  | `{ A B C -> ( A, B, C ) }` |
//! | `if`      | `{ A B C -> D }`         |
//! | `eq`      | `{ A A -> bool }`        |
//! | `eq0`     | `{ int64 -> bool }`      |
//! | `isempty` | `{ *str -> bool }`       |
//! | `notnil`  | `{ A? -> A }`            |
//! | `*`, `+`  | `{ int64 int64 -> int64 }` |
//! | `dec`     | `{ int64 -> int64 }`     |
//! | `str`     | `{ int64 -> *str }`      |
//! | `factor`  | `{ flt64 -> flt64 }`     |
//!
//! The two branches of `if` are not part of its signature: call sites unify
//! only the branches the predicate leaves live.

use crate::lattice::{Alias, Aliases, IntValue, StrValue, StructLattice, Value};
use crate::tvar::{TKind, TVarArena, TVarId};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Prim {
    Pair,
    Triple,
    If,
    Eq,
    Eq0,
    IsEmpty,
    NotNil,
    Mul,
    Add,
    Dec,
    Str,
    Factor,
}

impl Prim {
    pub const ALL: [Prim; 12] = [
        Prim::Pair,
        Prim::Triple,
        Prim::If,
        Prim::Eq,
        Prim::Eq0,
        Prim::IsEmpty,
        Prim::NotNil,
        Prim::Mul,
        Prim::Add,
        Prim::Dec,
        Prim::Str,
        Prim::Factor,
    ];

    pub fn from_name(name: &str) -> Option<Prim> {
        Prim::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Prim::Pair => "pair",
            Prim::Triple => "triple",
            Prim::If => "if",
            Prim::Eq => "eq",
            Prim::Eq0 => "eq0",
            Prim::IsEmpty => "isempty",
            Prim::NotNil => "notnil",
            Prim::Mul => "*",
            Prim::Add => "+",
            Prim::Dec => "dec",
            Prim::Str => "str",
            Prim::Factor => "factor",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Prim::Triple | Prim::If => 3,
            Prim::Pair | Prim::Eq | Prim::Mul | Prim::Add => 2,
            Prim::Eq0 | Prim::IsEmpty | Prim::NotNil | Prim::Dec | Prim::Str | Prim::Factor => 1,
        }
    }

    /// Constructors allocate a struct and need an allocation site.
    pub fn is_constructor(self) -> bool {
        matches!(self, Prim::Pair | Prim::Triple)
    }

    /// Fresh argument and return type variables for one instance.
    pub fn signature(self, tvars: &mut TVarArena, alias: Option<Alias>) -> (Vec<TVarId>, TVarId) {
        match self {
            Prim::Pair | Prim::Triple => {
                let args: Vec<TVarId> = (0..self.arity()).map(|_| tvars.leaf()).collect();
                let fields: BTreeMap<String, TVarId> =
                    args.iter().enumerate().map(|(i, &t)| (i.to_string(), t)).collect();
                let ret = tvars.alloc(TKind::Struct {
                    aliases: alias.into_iter().collect::<Aliases>(),
                    open: false,
                    fields,
                });
                (args, ret)
            }
            Prim::If => {
                let args = (0..3).map(|_| tvars.leaf()).collect();
                (args, tvars.leaf())
            }
            Prim::Eq => {
                let a = tvars.leaf();
                (vec![a, a], tvars.base(Value::BOOL))
            }
            Prim::Eq0 => (vec![tvars.base(Value::INT64)], tvars.base(Value::BOOL)),
            Prim::IsEmpty => (vec![tvars.base(Value::STRPTR)], tvars.base(Value::BOOL)),
            Prim::NotNil => {
                let a = tvars.leaf();
                let nilable = tvars.alloc(TKind::Nil(a));
                (vec![nilable], a)
            }
            Prim::Mul | Prim::Add => {
                let x = tvars.base(Value::INT64);
                let y = tvars.base(Value::INT64);
                (vec![x, y], tvars.base(Value::INT64))
            }
            Prim::Dec => (vec![tvars.base(Value::INT64)], tvars.base(Value::INT64)),
            Prim::Str => (vec![tvars.base(Value::INT64)], tvars.base(Value::STRPTR)),
            Prim::Factor => (vec![tvars.base(Value::FLT64)], tvars.base(Value::FLT64)),
        }
    }

    /// Return value given the meet of the arguments seen so far.
    ///
    /// Constructors are built by the caller, which owns the allocation site;
    /// here they return `scalar`.
    pub fn apply(self, args: &[Value], structs: &mut impl StructLattice) -> Value {
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Any);
        match self {
            Prim::Pair | Prim::Triple => Value::Scalar,
            Prim::If => {
                let (pred, t, f) = (arg(0), arg(1), arg(2));
                if pred.is_false() {
                    f
                } else if pred.above_center() {
                    Value::Any
                } else if !pred.may_be_nil() {
                    t
                } else {
                    t.meet(&f, structs)
                }
            }
            Prim::Eq => {
                let (x, y) = (arg(0), arg(1));
                if x.above_center() || y.above_center() {
                    Value::XBOOL
                } else if x.is_con() && y.is_con() && x == y {
                    Value::TRUE
                } else {
                    Value::BOOL
                }
            }
            Prim::Eq0 => {
                let x = arg(0);
                if x.above_center() {
                    if x.may_be_nil() {
                        Value::XBOOL
                    } else {
                        Value::FALSE
                    }
                } else if x == Value::Scalar {
                    Value::BOOL
                } else if x.is_false() {
                    Value::TRUE
                } else if x.meet(&Value::Nil, structs) != x {
                    Value::FALSE
                } else {
                    Value::BOOL
                }
            }
            Prim::IsEmpty => match arg(0) {
                x if x.above_center() => Value::XBOOL,
                Value::Str {
                    s: StrValue::Con(s),
                    nil: false,
                } => Value::int(s.is_empty() as i64),
                _ => Value::BOOL,
            },
            Prim::NotNil => arg(0).not_nil(),
            Prim::Mul => int_binop(&arg(0), &arg(1), |a, b| {
                if a == Some(0) || b == Some(0) {
                    return Some(0);
                }
                Some(a?.wrapping_mul(b?))
            }),
            Prim::Add => int_binop(&arg(0), &arg(1), |a, b| Some(a?.wrapping_add(b?))),
            Prim::Dec => match arg(0) {
                x if x.above_center() => Value::XINT64,
                Value::Int(IntValue::Con(v)) => Value::int(v.wrapping_sub(1)),
                _ => Value::INT64,
            },
            Prim::Str => match arg(0) {
                x if x.above_center() => Value::XSTRPTR,
                Value::Int(IntValue::Con(v)) => Value::str(v.to_string()),
                _ => Value::STRPTR,
            },
            Prim::Factor => {
                if arg(0).above_center() {
                    Value::XFLT64
                } else {
                    Value::FLT64
                }
            }
        }
    }
}

/// Integer operator: high if either side is high, `fold` on the constants
/// otherwise, `int64` when folding gives nothing.
fn int_binop(x: &Value, y: &Value, fold: impl Fn(Option<i64>, Option<i64>) -> Option<i64>) -> Value {
    if x.above_center() || y.above_center() {
        return Value::XINT64;
    }
    match fold(x.as_int(), y.as_int()) {
        Some(v) => Value::int(v),
        None => Value::INT64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::StructId;
    use pretty_assertions::assert_eq;

    struct NoStructs;

    impl StructLattice for NoStructs {
        fn meet_structs(&mut self, a: StructId, _b: StructId) -> StructId {
            a
        }

        fn dual_struct(&mut self, a: StructId) -> StructId {
            a
        }
    }

    fn apply(prim: Prim, args: &[Value]) -> Value {
        prim.apply(args, &mut NoStructs)
    }

    #[test]
    fn test_names_round_trip() {
        for prim in Prim::ALL {
            assert_eq!(Prim::from_name(prim.name()), Some(prim));
        }
        assert_eq!(Prim::from_name("frob"), None);
    }

    #[test]
    fn test_signature_arity() {
        let mut tvars = TVarArena::new();
        for prim in Prim::ALL {
            let (args, _) = prim.signature(&mut tvars, Some(1));
            assert_eq!(args.len(), prim.arity(), "{}", prim.name());
        }
    }

    #[test]
    fn test_signature_rendering() {
        let mut tvars = TVarArena::new();
        let mut render = |prim: Prim| {
            let (args, ret) = prim.signature(&mut tvars, Some(1));
            let f = tvars.alloc(TKind::Fun {
                fidxs: Default::default(),
                args,
                ret,
            });
            tvars.render(f)
        };
        assert_eq!(render(Prim::Pair), "{ A B -> ( A, B ) }");
        assert_eq!(render(Prim::Eq), "{ A A -> bool }");
        assert_eq!(render(Prim::NotNil), "{ A? -> A }");
        assert_eq!(render(Prim::Str), "{ int64 -> *str }");
    }

    #[test]
    fn test_if() {
        let (t, f) = (Value::int(3), Value::str("abc"));
        assert_eq!(apply(Prim::If, &[Value::int(1), t.clone(), f.clone()]), t);
        assert_eq!(apply(Prim::If, &[Value::Nil, t.clone(), f.clone()]), f);
        assert_eq!(apply(Prim::If, &[Value::Any, t.clone(), f.clone()]), Value::Any);
        assert_eq!(apply(Prim::If, &[Value::INT64, Value::int(2), Value::int(3)]), Value::INT64);
    }

    #[test]
    fn test_eq() {
        assert_eq!(apply(Prim::Eq, &[Value::int(2), Value::int(2)]), Value::TRUE);
        assert_eq!(apply(Prim::Eq, &[Value::int(2), Value::int(3)]), Value::BOOL);
        assert_eq!(apply(Prim::Eq, &[Value::Any, Value::int(3)]), Value::XBOOL);
    }

    #[test]
    fn test_eq0() {
        assert_eq!(apply(Prim::Eq0, &[Value::Nil]), Value::TRUE);
        assert_eq!(apply(Prim::Eq0, &[Value::int(0)]), Value::TRUE);
        assert_eq!(apply(Prim::Eq0, &[Value::int(5)]), Value::FALSE);
        assert_eq!(apply(Prim::Eq0, &[Value::INT64]), Value::BOOL);
        assert_eq!(apply(Prim::Eq0, &[Value::Scalar]), Value::BOOL);
        assert_eq!(apply(Prim::Eq0, &[Value::Any]), Value::XBOOL);
    }

    #[test]
    fn test_isempty() {
        assert_eq!(apply(Prim::IsEmpty, &[Value::str("")]), Value::int(1));
        assert_eq!(apply(Prim::IsEmpty, &[Value::str("x")]), Value::int(0));
        assert_eq!(apply(Prim::IsEmpty, &[Value::STRPTR]), Value::BOOL);
    }

    #[test]
    fn test_arithmetic_folds_constants() {
        assert_eq!(apply(Prim::Add, &[Value::int(2), Value::int(3)]), Value::int(5));
        assert_eq!(apply(Prim::Mul, &[Value::int(4), Value::int(3)]), Value::int(12));
        assert_eq!(apply(Prim::Mul, &[Value::int(0), Value::INT64]), Value::int(0));
        assert_eq!(apply(Prim::Mul, &[Value::INT64, Value::int(3)]), Value::INT64);
        assert_eq!(apply(Prim::Add, &[Value::Any, Value::int(3)]), Value::XINT64);
        assert_eq!(apply(Prim::Add, &[Value::int(i64::MAX), Value::int(1)]), Value::int(i64::MIN));
        assert_eq!(apply(Prim::Dec, &[Value::int(3)]), Value::int(2));
        assert_eq!(apply(Prim::Str, &[Value::int(17)]), Value::str("17"));
        assert_eq!(apply(Prim::Str, &[Value::INT64]), Value::STRPTR);
        assert_eq!(apply(Prim::Factor, &[Value::flt(2.5)]), Value::FLT64);
    }

    #[test]
    fn test_notnil() {
        let nilable = Value::Str {
            s: StrValue::Con("a".into()),
            nil: true,
        };
        assert_eq!(apply(Prim::NotNil, &[nilable]), Value::str("a"));
    }
}
