// Selection - marked CIDs, independent of what is currently visible.
// Keyed by CID, so two items sharing a CID are marked together.

use crate::tree::VisibleNode;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    marked: HashSet<u64>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one CID. Returns true if it is now marked.
    pub fn toggle_cid(&mut self, cid: u64) -> bool {
        if self.marked.remove(&cid) {
            false
        } else {
            self.marked.insert(cid);
            true
        }
    }

    /// Flip the CID of a leaf row. Non-leaf rows are ignored (`None`).
    pub fn toggle(&mut self, node: &VisibleNode) -> Option<bool> {
        if !node.is_leaf() {
            return None;
        }
        node.cid.map(|cid| self.toggle_cid(cid))
    }

    pub fn contains(&self, cid: u64) -> bool {
        self.marked.contains(&cid)
    }

    pub fn is_marked(&self, node: &VisibleNode) -> bool {
        node.cid.is_some_and(|cid| self.contains(cid))
    }

    /// Unordered view of everything marked.
    pub fn selected(&self) -> &HashSet<u64> {
        &self.marked
    }

    pub fn len(&self) -> usize {
        self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    pub fn clear(&mut self) {
        self.marked.clear();
    }

    /// Marked CIDs ordered by first appearance in `sequence`; anything not
    /// found there goes last, ascending.
    pub fn ordered_by(&self, sequence: &[VisibleNode]) -> Vec<u64> {
        let mut seen = HashSet::new();
        let mut ordered: Vec<u64> = sequence
            .iter()
            .filter_map(|node| node.cid)
            .filter(|cid| self.marked.contains(cid) && seen.insert(*cid))
            .collect();

        let mut stray: Vec<u64> = self.marked.difference(&seen).copied().collect();
        stray.sort_unstable();
        ordered.extend(stray);
        ordered
    }
}
