//! Representative Table for SCC-merged nodes
//!
//! Union-find variant tailored to cycle collapsing:
//! - **Explicit direction**: the caller picks the representative (minimum NodeId
//!   of an SCC), no union by rank
//! - **Flat trees**: merging re-points every sub-node of the merged node, so
//!   `find` is a single array read and `rep(rep(x)) == rep(x)` always holds
//! - **Sub-node sets**: each representative knows every node collapsed into it
//!
//! # References
//! - Tarjan, R. E. "Efficiency of a Good But Not Linear Set Union Algorithm" (1975)
//! - Pearce et al. "Efficient Field-Sensitive Pointer Analysis" (CC 2004)

use super::sparse_bitmap::SparseBitmap;
use crate::features::points_to::domain::NodeId;
use rustc_hash::FxHashMap;

/// Node → representative map with representative → members index
#[derive(Debug, Clone, Default)]
pub struct RepTable {
    /// Representative of each node (self = representative)
    rep: Vec<NodeId>,

    /// Members of each non-singleton class, representative included
    subs: FxHashMap<NodeId, SparseBitmap>,

    /// Number of representatives
    set_count: usize,
}

impl RepTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure element exists in the table
    pub fn make_set(&mut self, x: NodeId) {
        let old_len = self.rep.len();
        let new_len = x as usize + 1;
        if new_len > old_len {
            self.rep.extend(old_len as NodeId..new_len as NodeId);
            self.set_count += new_len - old_len;
        }
    }

    /// Representative of `x` (unknown IDs are their own representative)
    #[inline]
    pub fn find(&self, x: NodeId) -> NodeId {
        self.rep.get(x as usize).copied().unwrap_or(x)
    }

    #[inline]
    pub fn is_rep(&self, x: NodeId) -> bool {
        self.find(x) == x
    }

    /// Collapse the class of `node` into `rep`. Returns false if already merged.
    pub fn merge(&mut self, node: NodeId, rep: NodeId) -> bool {
        self.make_set(node.max(rep));
        let (node, rep) = (self.find(node), self.find(rep));
        if node == rep {
            return false;
        }

        let moved = self
            .subs
            .remove(&node)
            .unwrap_or_else(|| SparseBitmap::singleton(node));
        for member in moved.iter() {
            self.rep[member as usize] = rep;
        }

        let rep_subs = self
            .subs
            .entry(rep)
            .or_insert_with(|| SparseBitmap::singleton(rep));
        rep_subs.union_with(&moved);

        self.set_count -= 1;
        true
    }

    /// Members collapsed into the class of `x`, representative included
    pub fn sub_nodes(&self, x: NodeId) -> SparseBitmap {
        let rep = self.find(x);
        self.subs
            .get(&rep)
            .cloned()
            .unwrap_or_else(|| SparseBitmap::singleton(rep))
    }

    /// Number of members in the class of `x`
    pub fn class_size(&self, x: NodeId) -> usize {
        self.subs.get(&self.find(x)).map_or(1, |s| s.len())
    }

    /// Number of distinct classes
    #[inline]
    pub fn set_count(&self) -> usize {
        self.set_count
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rep.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rep.is_empty()
    }

    /// Snapshot of the whole mapping (for comparisons in tests and stats)
    pub fn mapping(&self) -> Vec<NodeId> {
        self.rep.clone()
    }
}
