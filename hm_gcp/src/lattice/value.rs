//! Value lattice elements for global constant propagation.
//!
//! The lattice is oriented optimistically: analysis starts every node at
//! `Any` and values only fall toward `Scalar`.
//!
//! ```text
//! Any (top - no information yet, unreachable)
//!   |
//! ~int64  ~bool  ~flt64  ~*str      (high forms)
//!   |
//! constants: 3, 2.5, "abc", nil
//!   |
//! bool  int64  flt64  *str  fun  ptr  (low forms)
//!   |
//! Scalar (bottom - any possible value)
//! ```

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Function identity.
pub type Fidx = u32;
/// Allocation-site identity.
pub type Alias = u32;
/// Set of function identities.
pub type Fidxs = BTreeSet<Fidx>;
/// Set of allocation-site identities.
pub type Aliases = BTreeSet<Alias>;

/// Handle to a node in the struct arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StructId(pub(crate) u32);

impl StructId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Integer sub-lattice.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IntValue {
    /// `~int64`, no integer seen yet
    High,
    /// `~bool`, dual of `Bool`
    XBool,
    /// A known constant
    Con(i64),
    /// `0` or `1`
    Bool,
    /// `int64`, any integer
    Low,
}

/// Float sub-lattice.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum FltValue {
    High,
    Con(f64),
    Low,
}

impl Eq for FltValue {}

impl std::hash::Hash for FltValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        if let FltValue::Con(v) = self {
            v.to_bits().hash(state);
        }
    }
}

/// String sub-lattice.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum StrValue {
    High,
    Con(String),
    Low,
}

/// A function pointer value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FunValue {
    /// Functions this pointer may refer to
    pub fidxs: Fidxs,
    pub nargs: usize,
    /// Meet of the possible return values
    pub ret: Box<Value>,
    /// True if the pointer may be nil
    pub nil: bool,
}

/// An element of the value lattice.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Value {
    /// Top: no information yet.
    Any,
    /// The nil constant.
    Nil,
    Int(IntValue),
    Flt(FltValue),
    Str { s: StrValue, nil: bool },
    Fun(FunValue),
    /// Pointer to an interned struct in the struct arena.
    Ptr {
        aliases: Aliases,
        obj: StructId,
        nil: bool,
    },
    /// Bottom: any possible value.
    Scalar,
}

impl Value {
    pub const INT64: Value = Value::Int(IntValue::Low);
    pub const BOOL: Value = Value::Int(IntValue::Bool);
    pub const XBOOL: Value = Value::Int(IntValue::XBool);
    pub const XINT64: Value = Value::Int(IntValue::High);
    pub const FLT64: Value = Value::Flt(FltValue::Low);
    pub const XFLT64: Value = Value::Flt(FltValue::High);
    pub const STRPTR: Value = Value::Str {
        s: StrValue::Low,
        nil: false,
    };
    pub const XSTRPTR: Value = Value::Str {
        s: StrValue::High,
        nil: false,
    };
    pub const TRUE: Value = Value::Int(IntValue::Con(1));
    pub const FALSE: Value = Value::Int(IntValue::Con(0));

    pub fn int(v: i64) -> Value {
        Value::Int(IntValue::Con(v))
    }

    pub fn flt(v: f64) -> Value {
        Value::Flt(FltValue::Con(v))
    }

    pub fn str(s: impl Into<String>) -> Value {
        Value::Str {
            s: StrValue::Con(s.into()),
            nil: false,
        }
    }

    /// Pointer to a single function, returning `ret`.
    pub fn fun(fidx: Fidx, nargs: usize, ret: Value) -> Value {
        Value::Fun(FunValue {
            fidxs: Fidxs::from([fidx]),
            nargs,
            ret: Box::new(ret),
            nil: false,
        })
    }

    /// Pointer to a struct allocated at a single site.
    pub fn ptr(alias: Alias, obj: StructId) -> Value {
        Value::Ptr {
            aliases: Aliases::from([alias]),
            obj,
            nil: false,
        }
    }

    pub fn as_fun(&self) -> Option<&FunValue> {
        match self {
            Value::Fun(fun) => Some(fun),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(IntValue::Con(v)) => Some(*v),
            _ => None,
        }
    }

    /// Rebuild the value with every struct handle passed through `f`,
    /// including handles nested in function return values.
    pub fn map_structs(&self, f: &mut impl FnMut(StructId) -> StructId) -> Value {
        match self {
            Value::Ptr { aliases, obj, nil } => Value::Ptr {
                aliases: aliases.clone(),
                obj: f(*obj),
                nil: *nil,
            },
            Value::Fun(fun) => Value::Fun(FunValue {
                ret: Box::new(fun.ret.map_structs(f)),
                ..fun.clone()
            }),
            other => other.clone(),
        }
    }

    /// Visit every struct handle directly reachable from this value.
    pub fn for_each_struct(&self, f: &mut impl FnMut(&Aliases, StructId)) {
        match self {
            Value::Ptr { aliases, obj, .. } => f(aliases, *obj),
            Value::Fun(fun) => fun.ret.for_each_struct(f),
            _ => {}
        }
    }
}

impl fmt::Display for IntValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntValue::High => write!(f, "~int64"),
            IntValue::XBool => write!(f, "~bool"),
            IntValue::Con(v) => write!(f, "{}", v),
            IntValue::Bool => write!(f, "bool"),
            IntValue::Low => write!(f, "int64"),
        }
    }
}

impl fmt::Display for FltValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FltValue::High => write!(f, "~flt64"),
            FltValue::Con(v) => write!(f, "{:?}", v),
            FltValue::Low => write!(f, "flt64"),
        }
    }
}

impl fmt::Display for StrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrValue::High => write!(f, "~*str"),
            StrValue::Con(s) => write!(f, "\"{}\"", s),
            StrValue::Low => write!(f, "*str"),
        }
    }
}

/// Shallow rendering: struct pointers print as their arena handle.
/// Use [`crate::structs::StructArena::render`] for the full picture.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nil = |f: &mut fmt::Formatter<'_>, nil: bool| if nil { write!(f, "?") } else { Ok(()) };
        match self {
            Value::Any => write!(f, "any"),
            Value::Nil => write!(f, "nil"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Flt(v) => write!(f, "{}", v),
            Value::Str { s, nil: n } => {
                write!(f, "{}", s)?;
                nil(f, *n)
            }
            Value::Fun(fun) => {
                write!(f, "{}{{{} -> {}}}", FidxList(&fun.fidxs), fun.nargs, fun.ret)?;
                nil(f, fun.nil)
            }
            Value::Ptr { aliases, obj, nil: n } => {
                write!(f, "*{}#{}", FidxList(aliases), obj.0)?;
                nil(f, *n)
            }
            Value::Scalar => write!(f, "scalar"),
        }
    }
}

/// Renders an identity set as `[1,2]`.
pub(crate) struct FidxList<'a>(pub &'a BTreeSet<u32>);

impl fmt::Display for FidxList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", id)?;
        }
        write!(f, "]")
    }
}
