//! Lattice operations on values.
//!
//! This module implements the core operations on the value lattice:
//! - meet (⊓): greatest lower bound, the only direction values move in
//! - join (⊔): an upper bound that never overshoots the least one
//! - isa: `a.isa(b)` iff `a ⊓ b == b`
//! - dual: top/bottom flip
//!
//! Struct pointers need the struct arena to meet or dual their targets; the
//! [`StructLattice`] trait is that seam.

use super::value::{FltValue, FunValue, IntValue, StrValue, StructId, Value};

/// Operations on interned structs needed by pointer meets.
pub trait StructLattice {
    /// Meet of two interned structs, returning an interned struct.
    fn meet_structs(&mut self, a: StructId, b: StructId) -> StructId;
    /// Dual of an interned struct.
    fn dual_struct(&mut self, a: StructId) -> StructId;
}

fn is_bool(v: i64) -> bool {
    v == 0 || v == 1
}

impl IntValue {
    /// # Examples
    /// ```text
    /// ~int64 ⊓ 3    = 3
    /// 3 ⊓ 3         = 3
    /// 0 ⊓ 1         = bool
    /// 3 ⊓ 4         = int64
    /// ~bool ⊓ 1     = 1
    /// ~bool ⊓ 7     = int64
    /// ```
    pub fn meet(&self, other: &IntValue) -> IntValue {
        use IntValue::*;
        match (self, other) {
            (High, x) | (x, High) => x.clone(),
            (Low, _) | (_, Low) => Low,
            (XBool, XBool) => XBool,
            (XBool, Con(c)) | (Con(c), XBool) => {
                if is_bool(*c) {
                    Con(*c)
                } else {
                    Low
                }
            }
            (XBool, Bool) | (Bool, XBool) | (Bool, Bool) => Bool,
            (Con(a), Con(b)) if a == b => Con(*a),
            (Con(a), Con(b)) if is_bool(*a) && is_bool(*b) => Bool,
            (Con(_), Con(_)) => Low,
            (Con(c), Bool) | (Bool, Con(c)) => {
                if is_bool(*c) {
                    Bool
                } else {
                    Low
                }
            }
        }
    }

    pub fn dual(&self) -> IntValue {
        match self {
            IntValue::High => IntValue::Low,
            IntValue::XBool => IntValue::Bool,
            IntValue::Con(v) => IntValue::Con(*v),
            IntValue::Bool => IntValue::XBool,
            IntValue::Low => IntValue::High,
        }
    }
}

impl FltValue {
    pub fn meet(&self, other: &FltValue) -> FltValue {
        match (self, other) {
            (FltValue::High, x) | (x, FltValue::High) => x.clone(),
            (FltValue::Con(a), FltValue::Con(b)) if a.to_bits() == b.to_bits() => FltValue::Con(*a),
            _ => FltValue::Low,
        }
    }

    pub fn dual(&self) -> FltValue {
        match self {
            FltValue::High => FltValue::Low,
            FltValue::Con(v) => FltValue::Con(*v),
            FltValue::Low => FltValue::High,
        }
    }
}

impl StrValue {
    pub fn meet(&self, other: &StrValue) -> StrValue {
        match (self, other) {
            (StrValue::High, x) | (x, StrValue::High) => x.clone(),
            (StrValue::Con(a), StrValue::Con(b)) if a == b => StrValue::Con(a.clone()),
            _ => StrValue::Low,
        }
    }

    pub fn dual(&self) -> StrValue {
        match self {
            StrValue::High => StrValue::Low,
            StrValue::Con(s) => StrValue::Con(s.clone()),
            StrValue::Low => StrValue::High,
        }
    }
}

impl Value {
    /// Meet operation (⊓): greatest lower bound.
    ///
    /// # Examples
    /// ```text
    /// any ⊓ T          = T
    /// scalar ⊓ T       = scalar
    /// 3 ⊓ "abc"        = scalar
    /// nil ⊓ 3          = int64
    /// nil ⊓ "abc"      = "abc"?
    /// [1]{1 -> 3} ⊓ [2]{1 -> 4} = [1,2]{1 -> int64}
    /// [1]{1 -> 3} ⊓ [2]{2 -> 3} = scalar
    /// ```
    pub fn meet(&self, other: &Value, structs: &mut impl StructLattice) -> Value {
        use Value::*;
        match (self, other) {
            (Any, x) | (x, Any) => x.clone(),
            (Scalar, _) | (_, Scalar) => Scalar,
            (Nil, Nil) => Nil,
            (Nil, x) | (x, Nil) => x.meet_nil(),
            (Int(a), Int(b)) => Int(a.meet(b)),
            (Flt(a), Flt(b)) => Flt(a.meet(b)),
            (Str { s: a, nil: n1 }, Str { s: b, nil: n2 }) => Str {
                s: a.meet(b),
                nil: *n1 || *n2,
            },
            (Fun(a), Fun(b)) => {
                if a.nargs != b.nargs {
                    return Scalar;
                }
                Fun(FunValue {
                    fidxs: a.fidxs.union(&b.fidxs).copied().collect(),
                    nargs: a.nargs,
                    ret: Box::new(a.ret.meet(&b.ret, structs)),
                    nil: a.nil || b.nil,
                })
            }
            (
                Ptr {
                    aliases: a1,
                    obj: o1,
                    nil: n1,
                },
                Ptr {
                    aliases: a2,
                    obj: o2,
                    nil: n2,
                },
            ) => Ptr {
                aliases: a1.union(a2).copied().collect(),
                obj: if o1 == o2 { *o1 } else { structs.meet_structs(*o1, *o2) },
                nil: *n1 || *n2,
            },
            _ => Scalar,
        }
    }

    /// Meet with the nil constant.
    fn meet_nil(&self) -> Value {
        match self {
            Value::Any | Value::Nil => Value::Nil,
            Value::Int(v) => Value::Int(v.meet(&IntValue::Con(0))),
            Value::Flt(v) => Value::Flt(v.meet(&FltValue::Con(0.0))),
            Value::Str { s, .. } => Value::Str {
                s: s.clone(),
                nil: true,
            },
            Value::Fun(fun) => Value::Fun(FunValue {
                nil: true,
                ..fun.clone()
            }),
            Value::Ptr { aliases, obj, .. } => Value::Ptr {
                aliases: aliases.clone(),
                obj: *obj,
                nil: true,
            },
            Value::Scalar => Value::Scalar,
        }
    }

    /// Join operation (⊔).
    ///
    /// Exact for numbers and strings (dual of the meet of the duals). Where the
    /// least upper bound is not representable this returns the meet, which is
    /// always a valid, lower, answer.
    pub fn join(&self, other: &Value, structs: &mut impl StructLattice) -> Value {
        use Value::*;
        match (self, other) {
            (Any, _) | (_, Any) => Any,
            (Scalar, x) | (x, Scalar) => x.clone(),
            (Nil, Nil) => Nil,
            (Int(a), Int(b)) => Int(a.dual().meet(&b.dual()).dual()),
            (Flt(a), Flt(b)) => Flt(a.dual().meet(&b.dual()).dual()),
            (Str { s: a, nil: n1 }, Str { s: b, nil: n2 }) => Str {
                s: a.dual().meet(&b.dual()).dual(),
                nil: *n1 && *n2,
            },
            (Fun(a), Fun(b)) if a.fidxs == b.fidxs && a.nargs == b.nargs => Fun(FunValue {
                fidxs: a.fidxs.clone(),
                nargs: a.nargs,
                ret: Box::new(a.ret.join(&b.ret, structs)),
                nil: a.nil && b.nil,
            }),
            (
                Ptr {
                    aliases: a1,
                    obj: o1,
                    nil: n1,
                },
                Ptr {
                    aliases: a2,
                    obj: o2,
                    nil: n2,
                },
            ) if a1 == a2 && o1 == o2 => Ptr {
                aliases: a1.clone(),
                obj: *o1,
                nil: *n1 && *n2,
            },
            _ => self.meet(other, structs),
        }
    }

    /// Dual (top/bottom flip).
    pub fn dual(&self, structs: &mut impl StructLattice) -> Value {
        match self {
            Value::Any => Value::Scalar,
            Value::Scalar => Value::Any,
            Value::Nil => Value::Nil,
            Value::Int(v) => Value::Int(v.dual()),
            Value::Flt(v) => Value::Flt(v.dual()),
            Value::Str { s, nil } => Value::Str {
                s: s.dual(),
                nil: *nil,
            },
            Value::Fun(fun) => Value::Fun(FunValue {
                ret: Box::new(fun.ret.dual(structs)),
                ..fun.clone()
            }),
            Value::Ptr { aliases, obj, nil } => Value::Ptr {
                aliases: aliases.clone(),
                obj: structs.dual_struct(*obj),
                nil: *nil,
            },
        }
    }

    /// `self.isa(other)` iff `self ⊓ other == other`, i.e. `other` is no more
    /// precise than `self`.
    pub fn isa(&self, other: &Value, structs: &mut impl StructLattice) -> bool {
        self.meet(other, structs) == *other
    }

    /// Constants widen to their general type; used for HM base types.
    pub fn widen(&self) -> Value {
        match self {
            Value::Int(IntValue::Bool | IntValue::XBool) => Value::BOOL,
            Value::Int(_) => Value::INT64,
            Value::Flt(_) => Value::FLT64,
            Value::Str { nil, .. } => Value::Str {
                s: StrValue::Low,
                nil: *nil,
            },
            other => other.clone(),
        }
    }

    /// True for high (optimistic, not yet known) values.
    pub fn above_center(&self) -> bool {
        matches!(
            self,
            Value::Any
                | Value::Int(IntValue::High | IntValue::XBool)
                | Value::Flt(FltValue::High)
                | Value::Str {
                    s: StrValue::High,
                    ..
                }
        )
    }

    pub fn is_con(&self) -> bool {
        matches!(
            self,
            Value::Nil
                | Value::Int(IntValue::Con(_))
                | Value::Flt(FltValue::Con(_))
                | Value::Str {
                    s: StrValue::Con(_),
                    nil: false
                }
        )
    }

    /// True for values that are certainly nil, zero or false.
    pub fn is_false(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::Int(IntValue::Con(v)) => *v == 0,
            Value::Flt(FltValue::Con(v)) => *v == 0.0,
            _ => false,
        }
    }

    /// True if the value may be nil, zero or false at runtime.
    pub fn may_be_nil(&self) -> bool {
        match self {
            Value::Any | Value::Nil | Value::Scalar => true,
            Value::Int(IntValue::Con(v)) => *v == 0,
            Value::Int(_) => true,
            Value::Flt(FltValue::Con(v)) => *v == 0.0,
            Value::Flt(_) => true,
            Value::Str { nil, .. } => *nil,
            Value::Fun(fun) => fun.nil,
            Value::Ptr { nil, .. } => *nil,
        }
    }

    /// The value with any nil possibility removed.
    pub fn not_nil(&self) -> Value {
        match self {
            Value::Nil => Value::Any,
            Value::Str { s, .. } => Value::Str {
                s: s.clone(),
                nil: false,
            },
            Value::Fun(fun) => Value::Fun(FunValue {
                nil: false,
                ..fun.clone()
            }),
            Value::Ptr { aliases, obj, .. } => Value::Ptr {
                aliases: aliases.clone(),
                obj: *obj,
                nil: false,
            },
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Struct handling for tests that never build struct pointers.
    struct NoStructs;

    impl StructLattice for NoStructs {
        fn meet_structs(&mut self, a: StructId, _b: StructId) -> StructId {
            a
        }
        fn dual_struct(&mut self, a: StructId) -> StructId {
            a
        }
    }

    fn meet(a: &Value, b: &Value) -> Value {
        a.meet(b, &mut NoStructs)
    }

    fn samples() -> Vec<Value> {
        vec![
            Value::Any,
            Value::Nil,
            Value::XINT64,
            Value::XBOOL,
            Value::int(0),
            Value::int(1),
            Value::int(7),
            Value::BOOL,
            Value::INT64,
            Value::flt(2.5),
            Value::FLT64,
            Value::str("abc"),
            Value::STRPTR,
            Value::fun(1, 1, Value::int(3)),
            Value::fun(2, 1, Value::INT64),
            Value::Scalar,
        ]
    }

    #[test]
    fn test_meet_commutative_and_idempotent() {
        for a in samples() {
            assert_eq!(meet(&a, &a), a, "idempotent on {}", a);
            for b in samples() {
                assert_eq!(meet(&a, &b), meet(&b, &a), "{} ⊓ {}", a, b);
            }
        }
    }

    #[test]
    fn test_meet_associative() {
        let s = samples();
        for a in &s {
            for b in &s {
                for c in &s {
                    assert_eq!(
                        meet(&meet(a, b), c),
                        meet(a, &meet(b, c)),
                        "({} ⊓ {}) ⊓ {}",
                        a,
                        b,
                        c
                    );
                }
            }
        }
    }

    #[test]
    fn test_top_and_bottom() {
        for a in samples() {
            assert_eq!(meet(&Value::Any, &a), a);
            assert_eq!(meet(&Value::Scalar, &a), Value::Scalar);
            assert!(Value::Any.isa(&a, &mut NoStructs));
            assert!(a.isa(&Value::Scalar, &mut NoStructs));
        }
    }

    #[test]
    fn test_int_meets() {
        assert_eq!(meet(&Value::int(3), &Value::int(4)), Value::INT64);
        assert_eq!(meet(&Value::int(0), &Value::int(1)), Value::BOOL);
        assert_eq!(meet(&Value::XBOOL, &Value::int(1)), Value::int(1));
        assert_eq!(meet(&Value::XBOOL, &Value::int(9)), Value::INT64);
        assert_eq!(meet(&Value::int(3), &Value::str("x")), Value::Scalar);
    }

    #[test]
    fn test_nil_meets() {
        assert_eq!(meet(&Value::Nil, &Value::int(3)), Value::INT64);
        assert_eq!(meet(&Value::Nil, &Value::int(0)), Value::int(0));
        assert_eq!(
            meet(&Value::Nil, &Value::str("a")),
            Value::Str {
                s: StrValue::Con("a".into()),
                nil: true
            }
        );
        assert!(meet(&Value::Nil, &Value::fun(1, 0, Value::Any)).may_be_nil());
    }

    #[test]
    fn test_fun_meets() {
        let f = Value::fun(1, 1, Value::int(3));
        let g = Value::fun(2, 1, Value::int(4));
        let fg = meet(&f, &g);
        assert_eq!(fg.to_string(), "[1,2]{1 -> int64}");
        assert_eq!(meet(&f, &Value::fun(3, 2, Value::int(3))), Value::Scalar);
    }

    #[test]
    fn test_join_is_upper_bound() {
        for a in samples() {
            for b in samples() {
                let j = a.join(&b, &mut NoStructs);
                assert!(j.isa(&a, &mut NoStructs), "{} ⊔ {} = {} not above {}", a, b, j, a);
                assert!(j.isa(&b, &mut NoStructs), "{} ⊔ {} = {} not above {}", a, b, j, b);
            }
        }
    }

    #[test]
    fn test_join_examples() {
        assert_eq!(Value::Scalar.join(&Value::int(1), &mut NoStructs), Value::int(1));
        assert_eq!(Value::INT64.join(&Value::int(1), &mut NoStructs), Value::int(1));
        assert_eq!(Value::int(1).join(&Value::int(2), &mut NoStructs), Value::XINT64);
    }

    #[test]
    fn test_dual_involution() {
        for a in samples() {
            assert_eq!(a.dual(&mut NoStructs).dual(&mut NoStructs), a);
        }
        assert_eq!(Value::INT64.dual(&mut NoStructs), Value::XINT64);
        assert!(Value::BOOL.dual(&mut NoStructs).above_center());
    }

    #[test]
    fn test_predicates() {
        assert!(Value::int(3).is_con());
        assert!(!Value::INT64.is_con());
        assert!(Value::Nil.is_false());
        assert!(Value::int(0).is_false());
        assert!(!Value::int(1).may_be_nil());
        assert!(Value::BOOL.may_be_nil());
        assert!(!Value::str("x").may_be_nil());
        assert_eq!(Value::int(5).widen(), Value::INT64);
        assert_eq!(Value::str("x").widen(), Value::STRPTR);
        assert_eq!(Value::BOOL.widen(), Value::BOOL);
    }
}
