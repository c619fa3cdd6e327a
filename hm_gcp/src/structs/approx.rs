//! Depth-bounded approximation of recursive data.
//!
//! A struct allocated at one site may end up holding pointers to structs from
//! the same site (lists, trees). Left alone, every trip around the worklist
//! would nest one level deeper and the analysis would never settle. Once the
//! nesting passes the cutoff, the deeper structs are folded into the struct
//! at the cutoff depth, producing a cyclic node that summarizes them all.
//!
//! Folding is a meet, so the result is always below the input. If folding
//! does not bring the depth under the cutoff after a few rounds, the
//! remaining deep pointers are chopped to `scalar`.

use super::StructArena;
use crate::lattice::widening::MAX_FOLD_ROUNDS;
use crate::lattice::{Aliases, Fidxs, FunValue, StructId, StructLattice, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Result of [`StructArena::approximate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Approximation {
    pub id: StructId,
    /// Folding did not converge and deep pointers were cut to `scalar`.
    pub chopped: bool,
}

/// Walk state for one fold or chop pass.
struct Fold<'a> {
    aliases: &'a Aliases,
    cutoff: usize,
    chop: bool,
    /// Old node to placeholder, for nodes on the current path.
    path: HashMap<StructId, StructId>,
    /// Placeholders at the cutoff depth, innermost last.
    anchors: Vec<StructId>,
    /// Deep structs to fold into an anchor.
    tails: Vec<(StructId, StructId)>,
    /// Every placeholder created, for the final rewrite.
    created: Vec<StructId>,
}

/// Collects struct pairs to merge instead of meeting them eagerly.
#[derive(Default)]
struct MergeQueue {
    pending: Vec<(StructId, StructId)>,
}

impl StructLattice for MergeQueue {
    fn meet_structs(&mut self, a: StructId, b: StructId) -> StructId {
        if a != b {
            self.pending.push((a, b));
        }
        a
    }

    fn dual_struct(&mut self, a: StructId) -> StructId {
        a
    }
}

fn find(parent: &HashMap<StructId, StructId>, mut id: StructId) -> StructId {
    while let Some(&up) = parent.get(&id) {
        id = up;
    }
    id
}

impl StructArena {
    /// Bound the nesting of structs allocated at `aliases` under `root`.
    ///
    /// The root counts as depth 1; every pointer whose aliases overlap
    /// `aliases` adds one.
    pub fn approximate(&mut self, aliases: &Aliases, root: StructId, cutoff: usize) -> Approximation {
        let cutoff = cutoff.max(1);
        let mut id = root;
        for round in 0..MAX_FOLD_ROUNDS {
            if self.alias_depth(aliases, id, cutoff) <= cutoff {
                return Approximation { id, chopped: false };
            }
            log::trace!("fold round {} for {:?} at depth cutoff {}", round, aliases, cutoff);
            id = self.fold(aliases, id, cutoff);
        }
        if self.alias_depth(aliases, id, cutoff) <= cutoff {
            return Approximation { id, chopped: false };
        }
        log::debug!("chopping struct for {:?} after {} fold rounds", aliases, MAX_FOLD_ROUNDS);
        let id = self.chop(aliases, id, cutoff);
        Approximation { id, chopped: true }
    }

    /// Nesting depth of `aliases` below `root`; stops exploring past `limit`.
    pub fn alias_depth(&self, aliases: &Aliases, root: StructId, limit: usize) -> usize {
        let mut on_path = HashSet::new();
        self.depth_walk(aliases, root, 1, limit, &mut on_path)
    }

    fn depth_walk(
        &self,
        aliases: &Aliases,
        id: StructId,
        depth: usize,
        limit: usize,
        on_path: &mut HashSet<StructId>,
    ) -> usize {
        on_path.insert(id);
        let mut edges = Vec::new();
        for value in self.node(id).fields.values() {
            value.for_each_struct(&mut |a, obj| edges.push((!a.is_disjoint(aliases), obj)));
        }
        let mut max = depth;
        for (overlap, obj) in edges {
            if max > limit {
                break;
            }
            if on_path.contains(&obj) {
                continue;
            }
            let d = self.depth_walk(aliases, obj, depth + overlap as usize, limit, on_path);
            max = max.max(d);
        }
        on_path.remove(&id);
        max
    }

    fn fold(&mut self, aliases: &Aliases, root: StructId, cutoff: usize) -> StructId {
        let mut fold = Fold {
            aliases,
            cutoff,
            chop: false,
            path: HashMap::new(),
            anchors: Vec::new(),
            tails: Vec::new(),
            created: Vec::new(),
        };
        let top = self.copy_node(&mut fold, root, 1, true);

        // Copy each deep struct once, then merge the copy into its anchor.
        let mut merges = MergeQueue::default();
        let mut copied: HashMap<StructId, StructId> = HashMap::new();
        while let Some((anchor, old)) = fold.tails.pop() {
            let copy = match copied.get(&old) {
                Some(&copy) => copy,
                None => {
                    fold.path.clear();
                    fold.anchors.clear();
                    let copy = self.copy_node(&mut fold, old, cutoff, true);
                    copied.insert(old, copy);
                    copy
                }
            };
            merges.pending.push((anchor, copy));
        }

        let mut parent: HashMap<StructId, StructId> = HashMap::new();
        while let Some((a, b)) = merges.pending.pop() {
            let (ra, rb) = (find(&parent, a), find(&parent, b));
            if ra == rb {
                continue;
            }
            parent.insert(rb, ra);
            let (na, nb) = (self.node(ra).clone(), self.node(rb).clone());
            let names: BTreeSet<&String> = na.fields.keys().chain(nb.fields.keys()).collect();
            let mut fields = BTreeMap::new();
            for name in names {
                let value = match (na.fields.get(name), nb.fields.get(name)) {
                    (Some(x), Some(y)) => Some(x.meet(y, &mut merges)),
                    (Some(x), None) if nb.any => Some(x.clone()),
                    (None, Some(y)) if na.any => Some(y.clone()),
                    _ => None,
                };
                if let Some(value) = value {
                    fields.insert(name.clone(), value);
                }
            }
            let node = self.node_mut(ra);
            node.any = na.any && nb.any;
            node.open = na.open || nb.open;
            node.fields = fields;
        }

        for &ph in &fold.created {
            let fields = self
                .node(ph)
                .fields
                .iter()
                .map(|(name, value)| (name.clone(), value.map_structs(&mut |obj| find(&parent, obj))))
                .collect();
            self.node_mut(ph).fields = fields;
        }
        self.intern(find(&parent, top))
    }

    fn chop(&mut self, aliases: &Aliases, root: StructId, cutoff: usize) -> StructId {
        let mut fold = Fold {
            aliases,
            cutoff,
            chop: true,
            path: HashMap::new(),
            anchors: Vec::new(),
            tails: Vec::new(),
            created: Vec::new(),
        };
        let top = self.copy_node(&mut fold, root, 1, true);
        self.intern(top)
    }

    /// Copy `old` into a placeholder. `entered` is set when the pointer that
    /// led here was from the folded allocation site.
    fn copy_node(&mut self, fold: &mut Fold<'_>, old: StructId, depth: usize, entered: bool) -> StructId {
        let node = self.node(old).clone();
        let ph = self.placeholder(node.any, node.open, BTreeMap::new());
        fold.created.push(ph);
        fold.path.insert(old, ph);
        let anchored = entered && depth == fold.cutoff;
        if anchored {
            fold.anchors.push(ph);
        }
        for (name, value) in &node.fields {
            let copied = self.copy_value(fold, value, depth);
            self.node_mut(ph).fields.insert(name.clone(), copied);
        }
        if anchored {
            fold.anchors.pop();
        }
        fold.path.remove(&old);
        ph
    }

    fn copy_value(&mut self, fold: &mut Fold<'_>, value: &Value, depth: usize) -> Value {
        match value {
            Value::Ptr { aliases, obj, nil } => {
                let overlap = !aliases.is_disjoint(fold.aliases);
                let d = depth + overlap as usize;
                let target = if let Some(&ph) = fold.path.get(obj) {
                    ph
                } else if overlap && d > fold.cutoff {
                    if fold.chop {
                        return Value::Scalar;
                    }
                    match fold.anchors.last() {
                        Some(&anchor) => {
                            fold.tails.push((anchor, *obj));
                            anchor
                        }
                        None => self.copy_node(fold, *obj, d, overlap),
                    }
                } else {
                    self.copy_node(fold, *obj, d, overlap)
                };
                Value::Ptr {
                    aliases: aliases.clone(),
                    obj: target,
                    nil: *nil,
                }
            }
            Value::Fun(fun) => Value::Fun(FunValue {
                ret: Box::new(self.copy_value(fold, &fun.ret, depth)),
                ..fun.clone()
            }),
            other => other.clone(),
        }
    }
}

/// Bound the nesting of function values returning functions from `fidxs`.
///
/// The outermost function counts as depth 1; a nested function value whose
/// identities overlap `fidxs` past `cutoff` becomes `scalar`.
pub fn approximate_fun(value: &Value, fidxs: &Fidxs, cutoff: usize) -> Value {
    fn walk(value: &Value, fidxs: &Fidxs, depth: usize, cutoff: usize) -> Value {
        match value {
            Value::Fun(fun) => {
                let overlap = !fun.fidxs.is_disjoint(fidxs);
                let d = depth + overlap as usize;
                if overlap && d > cutoff {
                    return Value::Scalar;
                }
                Value::Fun(FunValue {
                    ret: Box::new(walk(&fun.ret, fidxs, d, cutoff)),
                    ..fun.clone()
                })
            }
            other => other.clone(),
        }
    }
    walk(value, fidxs, 0, cutoff.max(1))
}
