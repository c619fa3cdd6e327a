//! Struct arena: hash-consed, possibly cyclic struct lattice elements.
//!
//! Every struct that flows through the analysis lives here and is referred to
//! by [`StructId`]. Interned nodes are canonical: two interned ids are equal
//! exactly when the (possibly infinite) structs they describe are equal, so
//! pointer values can be compared with `==` during fixed-point iteration.
//!
//! Construction goes through *placeholders*: mutable, uninterned nodes that
//! may reference each other in cycles. [`StructArena::intern`] minimizes a
//! placeholder graph and maps it onto canonical nodes.
//!
//! - `meet`: struct meet and dual ([`StructLattice`] impl)
//! - `approx`: depth-bounded folding of recursive allocation sites
//! - `render`: human-readable printing of values with struct contents

mod approx;
mod meet;
mod render;

pub use approx::{approximate_fun, Approximation};

use crate::lattice::{StructId, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One struct in the arena.
#[derive(Clone, Debug, PartialEq)]
pub struct StructNode {
    /// High struct: fields it does not list may hold anything (top).
    pub any: bool,
    /// More fields than the listed ones may exist.
    pub open: bool,
    pub fields: BTreeMap<String, Value>,
    interned: bool,
}

impl StructNode {
    fn shallow_key(&self) -> ShallowKey {
        ShallowKey {
            any: self.any,
            open: self.open,
            names: self.fields.keys().cloned().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ShallowKey {
    any: bool,
    open: bool,
    names: Vec<String>,
}

/// Arena of struct lattice elements.
#[derive(Debug, Default)]
pub struct StructArena {
    nodes: Vec<StructNode>,
    interned: HashMap<ShallowKey, Vec<StructId>>,
    meet_memo: HashMap<(StructId, StructId), StructId>,
    meet_depth: usize,
    dual_memo: HashMap<StructId, StructId>,
    dual_depth: usize,
}

impl StructArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: StructId) -> &StructNode {
        &self.nodes[id.index()]
    }

    pub fn field(&self, id: StructId, name: &str) -> Option<&Value> {
        self.node(id).fields.get(name)
    }

    /// Number of nodes ever allocated, placeholders included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Canonical closed struct with exactly these fields.
    pub fn make(&mut self, fields: BTreeMap<String, Value>) -> StructId {
        let ph = self.placeholder(false, false, fields);
        self.intern(ph)
    }

    /// Canonical open struct, high on unlisted fields.
    pub fn make_any(&mut self) -> StructId {
        let ph = self.placeholder(true, true, BTreeMap::new());
        self.intern(ph)
    }

    fn placeholder(&mut self, any: bool, open: bool, fields: BTreeMap<String, Value>) -> StructId {
        let id = StructId(self.nodes.len() as u32);
        self.nodes.push(StructNode {
            any,
            open,
            fields,
            interned: false,
        });
        id
    }

    fn node_mut(&mut self, id: StructId) -> &mut StructNode {
        debug_assert!(!self.nodes[id.index()].interned, "interned structs are immutable");
        &mut self.nodes[id.index()]
    }

    /// Struct handles directly referenced by a node's fields.
    fn children(&self, id: StructId) -> Vec<StructId> {
        let mut out = Vec::new();
        for value in self.node(id).fields.values() {
            value.for_each_struct(&mut |_, obj| out.push(obj));
        }
        out
    }

    /// Map the placeholder graph rooted at `root` onto canonical nodes.
    ///
    /// Placeholders reachable from `root` are grouped with every interned node
    /// they could coincide with, the coarsest bisimulation over that set is
    /// computed by partition refinement, and each resulting block is mapped
    /// to its interned member or to a freshly interned node.
    pub fn intern(&mut self, root: StructId) -> StructId {
        if self.node(root).interned {
            return root;
        }

        // Placeholders reachable from root, without descending into interned nodes.
        let mut placeholders = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        let mut frontier = Vec::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if self.node(id).interned {
                frontier.push(id);
                continue;
            }
            placeholders.push(id);
            stack.extend(self.children(id));
        }

        // Interned candidates sharing a shape with some placeholder.
        for &ph in &placeholders {
            if let Some(candidates) = self.interned.get(&self.node(ph).shallow_key()) {
                frontier.extend(candidates.iter().copied());
            }
        }

        // Close the universe over interned children.
        let mut universe: Vec<StructId> = placeholders.clone();
        let mut stack = frontier;
        let mut in_universe: HashSet<StructId> = placeholders.iter().copied().collect();
        while let Some(id) = stack.pop() {
            if !in_universe.insert(id) {
                continue;
            }
            universe.push(id);
            stack.extend(self.children(id));
        }

        let block = self.refine(&universe);

        // Canonical id per block: an existing interned member, or a new node.
        let mut canon: HashMap<usize, StructId> = HashMap::new();
        for &id in &universe {
            if self.node(id).interned {
                let b = block[&id];
                canon.entry(b).and_modify(|c| *c = (*c).min(id)).or_insert(id);
            }
        }
        let mut fresh = Vec::new();
        for &ph in &placeholders {
            let b = block[&ph];
            if let std::collections::hash_map::Entry::Vacant(e) = canon.entry(b) {
                let id = StructId(self.nodes.len() as u32);
                let node = self.node(ph).clone();
                self.nodes.push(node);
                e.insert(id);
                fresh.push(id);
            }
        }
        for id in fresh {
            let fields = self.nodes[id.index()]
                .fields
                .iter()
                .map(|(name, value)| {
                    let mapped = value.map_structs(&mut |obj| canon[&block[&obj]]);
                    (name.clone(), mapped)
                })
                .collect();
            let node = &mut self.nodes[id.index()];
            node.fields = fields;
            node.interned = true;
            let key = node.shallow_key();
            self.interned.entry(key).or_default().push(id);
        }

        canon[&block[&root]]
    }

    /// Coarsest partition of `universe` where equal blocks have equal flags,
    /// equal field names and field values equal up to the blocks of the
    /// structs they point to.
    fn refine(&self, universe: &[StructId]) -> HashMap<StructId, usize> {
        let mut block: HashMap<StructId, usize> = HashMap::new();
        let mut shapes: HashMap<ShallowKey, usize> = HashMap::new();
        for &id in universe {
            let key = self.node(id).shallow_key();
            let next = shapes.len();
            block.insert(id, *shapes.entry(key).or_insert(next));
        }

        let mut count = shapes.len();
        loop {
            let mut signatures: HashMap<(usize, Vec<Value>), usize> = HashMap::new();
            let mut next_block = HashMap::new();
            for &id in universe {
                let fields: Vec<Value> = self
                    .node(id)
                    .fields
                    .values()
                    .map(|v| v.map_structs(&mut |obj| StructId(block[&obj] as u32)))
                    .collect();
                let n = signatures.len();
                let b = *signatures.entry((block[&id], fields)).or_insert(n);
                next_block.insert(id, b);
            }
            block = next_block;
            if signatures.len() == count {
                return block;
            }
            count = signatures.len();
        }
    }
}
