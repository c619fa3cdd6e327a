//! Printing type variables.
//!
//! ```text
//! { A -> A }                     // identity
//! ( int64, *str )                // pair
//! @{ x = int64; ... }            // open record
//! A:{ int64 -> A }               // recursive type, labeled at first sight
//! *str?                          // possibly nil
//! Cannot unify int64 and *str
//! ```

use super::{TKind, TVarArena, TVarId};
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

fn var_name(n: usize) -> String {
    let letter = (b'A' + (n % 26) as u8) as char;
    if n < 26 {
        letter.to_string()
    } else {
        format!("{}{}", letter, n / 26)
    }
}

impl TVarArena {
    /// Render the type of `id` with variables named `A`, `B`, ... in order of
    /// first appearance.
    pub fn render(&self, id: TVarId) -> String {
        let mut counts = HashMap::new();
        self.count_refs(id, &mut counts);
        let shared = counts
            .into_iter()
            .filter(|&(id, n)| n > 1 && !matches!(self.nodes[id.index()].kind, TKind::Leaf))
            .map(|(id, _)| id)
            .collect();
        let mut printer = Printer {
            arena: self,
            shared,
            names: HashMap::new(),
            printed: HashSet::new(),
            out: String::new(),
        };
        printer.tvar(id);
        printer.out
    }

    /// Count how often each root is reached; children are visited once.
    fn count_refs(&self, id: TVarId, counts: &mut HashMap<TVarId, usize>) {
        let id = self.root(id);
        let n = counts.entry(id).or_insert(0);
        *n += 1;
        if *n > 1 {
            return;
        }
        for child in self.nodes[id.index()].kind.children() {
            self.count_refs(child, counts);
        }
    }
}

struct Printer<'a> {
    arena: &'a TVarArena,
    shared: HashSet<TVarId>,
    names: HashMap<TVarId, String>,
    printed: HashSet<TVarId>,
    out: String,
}

impl Printer<'_> {
    fn name(&mut self, id: TVarId) -> String {
        let next = self.names.len();
        self.names.entry(id).or_insert_with(|| var_name(next)).clone()
    }

    fn tvar(&mut self, id: TVarId) {
        let arena = self.arena;
        let id = arena.root(id);
        let kind = &arena.nodes[id.index()].kind;
        if matches!(kind, TKind::Leaf) {
            let name = self.name(id);
            self.out.push_str(&name);
            return;
        }
        if self.shared.contains(&id) {
            let name = self.name(id);
            if !self.printed.insert(id) {
                self.out.push_str(&name);
                return;
            }
            let _ = write!(self.out, "{}:", name);
        }
        self.kind(kind);
    }

    fn kind(&mut self, kind: &TKind) {
        match kind {
            TKind::Leaf => self.out.push('?'),
            TKind::Base(v) => {
                let _ = write!(self.out, "{}", v);
            }
            TKind::Fun { args, ret, .. } => {
                self.out.push('{');
                for &arg in args {
                    self.out.push(' ');
                    self.tvar(arg);
                }
                self.out.push_str(" -> ");
                self.tvar(*ret);
                self.out.push_str(" }");
            }
            TKind::Struct { open, fields, .. } => {
                // Field names sort as strings, so this only matches tuples of
                // up to ten elements.
                let is_tuple = !open
                    && !fields.is_empty()
                    && fields.keys().enumerate().all(|(i, name)| name.parse::<usize>() == Ok(i));
                if is_tuple {
                    self.out.push_str("( ");
                    for (n, &t) in fields.values().enumerate() {
                        if n > 0 {
                            self.out.push_str(", ");
                        }
                        self.tvar(t);
                    }
                    self.out.push_str(" )");
                    return;
                }
                self.out.push_str("@{");
                for (i, (name, &t)) in fields.iter().enumerate() {
                    if i > 0 {
                        self.out.push(';');
                    }
                    let _ = write!(self.out, " {} = ", name);
                    self.tvar(t);
                }
                if *open {
                    if !fields.is_empty() {
                        self.out.push(';');
                    }
                    self.out.push_str(" ...");
                }
                self.out.push_str(" }");
            }
            TKind::Nil(child) => {
                self.tvar(*child);
                self.out.push('?');
            }
            TKind::Error(err) => match &err.msg {
                Some(msg) => self.out.push_str(msg),
                None => {
                    self.out.push_str("Cannot unify ");
                    for (i, alt) in err.alts.iter().enumerate() {
                        if i > 0 {
                            self.out.push_str(" and ");
                        }
                        self.kind(alt);
                    }
                }
            },
        }
    }
}
