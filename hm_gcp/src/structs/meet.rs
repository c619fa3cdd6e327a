//! Struct meet and dual.
//!
//! Both operations may recurse through cyclic structs. The outermost call
//! builds placeholders, memoized on the argument pair so that a cycle in the
//! inputs closes a cycle in the output, then interns the result.

use super::StructArena;
use crate::lattice::{StructId, StructLattice, Value};
use std::collections::BTreeSet;

impl StructLattice for StructArena {
    fn meet_structs(&mut self, a: StructId, b: StructId) -> StructId {
        if a == b {
            return a;
        }
        let key = (a.min(b), a.max(b));
        if let Some(&done) = self.meet_memo.get(&key) {
            return done;
        }

        let (na, nb) = (self.node(a).clone(), self.node(b).clone());
        let ph = self.placeholder(na.any && nb.any, na.open || nb.open, Default::default());
        self.meet_memo.insert(key, ph);
        self.meet_depth += 1;

        let names: BTreeSet<&String> = na.fields.keys().chain(nb.fields.keys()).collect();
        for name in names {
            let value = match (na.fields.get(name), nb.fields.get(name)) {
                (Some(x), Some(y)) => Some(x.meet(y, self)),
                (Some(x), None) if nb.any => Some(x.clone()),
                (None, Some(y)) if na.any => Some(y.clone()),
                _ => None,
            };
            if let Some(value) = value {
                self.node_mut(ph).fields.insert(name.clone(), value);
            }
        }

        self.meet_depth -= 1;
        if self.meet_depth == 0 {
            self.meet_memo.clear();
            self.intern(ph)
        } else {
            ph
        }
    }

    fn dual_struct(&mut self, a: StructId) -> StructId {
        if let Some(&done) = self.dual_memo.get(&a) {
            return done;
        }
        let node = self.node(a).clone();
        let ph = self.placeholder(!node.any, !node.open, Default::default());
        self.dual_memo.insert(a, ph);
        self.dual_depth += 1;

        for (name, value) in &node.fields {
            let dual = value.dual(self);
            self.node_mut(ph).fields.insert(name.clone(), dual);
        }

        self.dual_depth -= 1;
        if self.dual_depth == 0 {
            self.dual_memo.clear();
            self.intern(ph)
        } else {
            ph
        }
    }
}

impl StructArena {
    /// Meet of two values, resolving struct pointers against this arena.
    pub fn meet(&mut self, a: &Value, b: &Value) -> Value {
        a.meet(b, self)
    }

    pub fn join(&mut self, a: &Value, b: &Value) -> Value {
        a.join(b, self)
    }

    pub fn isa(&mut self, a: &Value, b: &Value) -> bool {
        a.isa(b, self)
    }
}
