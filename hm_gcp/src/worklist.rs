//! Pending-node worklist.
//!
//! Nodes are drawn in a pseudo-random but reproducible order: each pop
//! advances a rotating index by the seed and removes the item it lands on.
//! Different seeds exercise different visiting orders, which is how the
//! order-independence of the fixed point is tested.

use crate::syntax::SyntaxId;
use std::collections::HashSet;

/// Set of syntax nodes awaiting a visit. A node is present at most once.
#[derive(Debug, Clone)]
pub struct Worklist {
    items: Vec<SyntaxId>,
    on: HashSet<SyntaxId>,
    seed: usize,
    idx: usize,
    pops: usize,
}

impl Worklist {
    pub fn new(seed: u64) -> Self {
        Self {
            items: Vec::new(),
            on: HashSet::new(),
            // A zero step would pin the draw to one slot.
            seed: (seed as usize).max(1),
            idx: 0,
            pops: 0,
        }
    }

    /// Add `id` unless already pending. Returns true if it was added.
    pub fn push(&mut self, id: SyntaxId) -> bool {
        if !self.on.insert(id) {
            return false;
        }
        self.items.push(id);
        true
    }

    pub fn extend(&mut self, ids: impl IntoIterator<Item = SyntaxId>) {
        for id in ids {
            self.push(id);
        }
    }

    pub fn pop(&mut self) -> Option<SyntaxId> {
        if self.items.is_empty() {
            return None;
        }
        self.idx = self.idx.wrapping_add(self.seed);
        let id = self.items.swap_remove(self.idx % self.items.len());
        self.on.remove(&id);
        self.pops += 1;
        Some(id)
    }

    pub fn contains(&self, id: SyntaxId) -> bool {
        self.on.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total pops since creation.
    pub fn pops(&self) -> usize {
        self.pops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_dedups() {
        let mut work = Worklist::new(1);
        assert!(work.push(SyntaxId(3)));
        assert!(!work.push(SyntaxId(3)));
        assert_eq!(work.len(), 1);
        assert!(work.contains(SyntaxId(3)));
        assert_eq!(work.pop(), Some(SyntaxId(3)));
        assert!(work.is_empty());
        assert_eq!(work.pop(), None);
        assert_eq!(work.pops(), 1);
    }

    #[test]
    fn test_every_item_popped_once() {
        for seed in [0, 1, 2, 7, 123] {
            let mut work = Worklist::new(seed);
            work.extend((0..20).map(SyntaxId));
            let mut seen: Vec<u32> = std::iter::from_fn(|| work.pop()).map(|id| id.0).collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..20).collect::<Vec<_>>(), "seed {}", seed);
        }
    }

    #[test]
    fn test_seed_changes_order() {
        let order = |seed| {
            let mut work = Worklist::new(seed);
            work.extend((0..10).map(SyntaxId));
            std::iter::from_fn(move || work.pop()).collect::<Vec<_>>()
        };
        assert_eq!(order(3), order(3));
        assert_ne!(order(1), order(3));
    }
}
