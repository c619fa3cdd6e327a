//! Printing values together with the structs they point to.
//!
//! ```text
//! *[3]$1:@{0=1; 1=*[3]$1?}     // a folded list: $1 refers back to the struct
//! [2]{1 -> *[4]@{a=1; b="x"}}
//! ```
//!
//! Structs that are reached again while being printed are labeled `$N:` at
//! their first occurrence and printed as `$N` afterwards.

use super::StructArena;
use crate::lattice::value::FidxList;
use crate::lattice::{StructId, Value};
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

impl StructArena {
    /// Render `value`, expanding struct pointers.
    pub fn render(&self, value: &Value) -> String {
        let mut cyclic = HashSet::new();
        let mut on_path = HashSet::new();
        self.find_cycles(value, &mut on_path, &mut cyclic);
        let mut printer = Printer {
            arena: self,
            cyclic,
            labels: HashMap::new(),
            on_path: HashSet::new(),
            out: String::new(),
        };
        printer.value(value);
        printer.out
    }

    fn find_cycles(&self, value: &Value, on_path: &mut HashSet<StructId>, cyclic: &mut HashSet<StructId>) {
        let mut targets = Vec::new();
        value.for_each_struct(&mut |_, obj| targets.push(obj));
        for obj in targets {
            if on_path.contains(&obj) {
                cyclic.insert(obj);
                continue;
            }
            on_path.insert(obj);
            for field in self.node(obj).fields.values() {
                self.find_cycles(field, on_path, cyclic);
            }
            on_path.remove(&obj);
        }
    }
}

struct Printer<'a> {
    arena: &'a StructArena,
    cyclic: HashSet<StructId>,
    labels: HashMap<StructId, usize>,
    on_path: HashSet<StructId>,
    out: String,
}

impl Printer<'_> {
    fn value(&mut self, value: &Value) {
        match value {
            Value::Ptr { aliases, obj, nil } => {
                let _ = write!(self.out, "*{}", FidxList(aliases));
                self.strukt(*obj);
                if *nil {
                    self.out.push('?');
                }
            }
            Value::Fun(fun) => {
                let _ = write!(self.out, "{}{{{} -> ", FidxList(&fun.fidxs), fun.nargs);
                self.value(&fun.ret);
                self.out.push('}');
                if fun.nil {
                    self.out.push('?');
                }
            }
            other => {
                let _ = write!(self.out, "{}", other);
            }
        }
    }

    fn strukt(&mut self, id: StructId) {
        if self.on_path.contains(&id) {
            let label = self.labels.get(&id).copied().unwrap_or(0);
            let _ = write!(self.out, "${}", label);
            return;
        }
        if self.cyclic.contains(&id) {
            let next = self.labels.len() + 1;
            let label = *self.labels.entry(id).or_insert(next);
            let _ = write!(self.out, "${}:", label);
        }
        let node = self.arena.node(id);
        self.on_path.insert(id);
        self.out.push_str("@{");
        for (i, (name, field)) in node.fields.iter().enumerate() {
            if i > 0 {
                self.out.push_str("; ");
            }
            let _ = write!(self.out, "{}=", name);
            self.value(field);
        }
        if node.open {
            if !node.fields.is_empty() {
                self.out.push_str("; ");
            }
            self.out.push_str("...");
        }
        self.out.push('}');
        if node.any {
            self.out.push('~');
        }
        self.on_path.remove(&id);
    }
}
