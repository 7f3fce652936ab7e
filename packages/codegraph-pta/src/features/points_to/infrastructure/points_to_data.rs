//! Diff-based points-to storage
//!
//! Per node, three sets:
//! - `pts`: the current points-to set (only grows)
//! - `propagated`: the part of `pts` already pushed along outgoing direct edges
//! - reverse pts: for every object, the nodes whose `pts` contains it
//!
//! `compute_diff` hands the solver `pts \ propagated` and marks it propagated, so
//! Copy/Gep edges only ever carry new facts.
//!
//! # References
//! - Pearce et al. "Online Cycle Detection and Difference Propagation" (SCAM 2003)

use super::sparse_bitmap::{PointsTo, SparseBitmap};
use crate::features::points_to::domain::NodeId;

/// Points-to sets with difference propagation support
#[derive(Debug, Clone, Default)]
pub struct DiffPointsToData {
    pts: Vec<PointsTo>,
    propagated: Vec<PointsTo>,
    rev_pts: Vec<SparseBitmap>,
}

impl DiffPointsToData {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure(&mut self, id: NodeId) {
        let len = id as usize + 1;
        if self.pts.len() < len {
            self.pts.resize_with(len, PointsTo::new);
            self.propagated.resize_with(len, PointsTo::new);
        }
    }

    fn ensure_rev(&mut self, obj: NodeId) {
        let len = obj as usize + 1;
        if self.rev_pts.len() < len {
            self.rev_pts.resize_with(len, SparseBitmap::new);
        }
    }

    /// Points-to set of `id` (empty if never touched)
    pub fn get_pts(&self, id: NodeId) -> &PointsTo {
        static EMPTY: PointsTo = PointsTo::EMPTY;
        self.pts.get(id as usize).unwrap_or(&EMPTY)
    }

    /// Nodes whose points-to set contains `obj`
    pub fn get_rev_pts(&self, obj: NodeId) -> &SparseBitmap {
        static EMPTY: SparseBitmap = SparseBitmap::EMPTY;
        self.rev_pts.get(obj as usize).unwrap_or(&EMPTY)
    }

    /// Add `obj` to `pts(id)`. Returns true if it was new.
    pub fn add_pts(&mut self, id: NodeId, obj: NodeId) -> bool {
        self.ensure(id);
        if self.pts[id as usize].insert(obj) {
            self.ensure_rev(obj);
            self.rev_pts[obj as usize].insert(id);
            true
        } else {
            false
        }
    }

    /// pts(id) ∪= set. Returns true if `pts(id)` grew.
    pub fn union_pts(&mut self, id: NodeId, set: &PointsTo) -> bool {
        if set.is_empty() {
            return false;
        }
        self.ensure(id);
        let target = &mut self.pts[id as usize];
        #[cfg(debug_assertions)]
        let before = target.len();
        let added = set.difference(target);
        if added.is_empty() {
            return false;
        }
        target.union_with(&added);
        #[cfg(debug_assertions)]
        debug_assert!(
            self.pts[id as usize].len() >= before,
            "points-to set of node {} shrank",
            id
        );
        for obj in added.iter() {
            self.ensure_rev(obj);
            self.rev_pts[obj as usize].insert(id);
        }
        true
    }

    /// pts(dst) ∪= pts(src). Returns true if `pts(dst)` grew.
    pub fn union_pts_from(&mut self, dst: NodeId, src: NodeId) -> bool {
        if dst == src {
            return false;
        }
        let set = self.get_pts(src).clone();
        self.union_pts(dst, &set)
    }

    /// New facts of `id` since the last call; marks them propagated
    pub fn compute_diff(&mut self, id: NodeId) -> PointsTo {
        self.ensure(id);
        let idx = id as usize;
        let diff = self.pts[idx].difference(&self.propagated[idx]);
        if !diff.is_empty() {
            self.propagated[idx].union_with(&diff);
        }
        diff
    }

    /// Facts of `id` not yet propagated, without consuming them
    pub fn pending_diff(&self, id: NodeId) -> PointsTo {
        match (self.pts.get(id as usize), self.propagated.get(id as usize)) {
            (Some(pts), Some(propagated)) => pts.difference(propagated),
            _ => PointsTo::new(),
        }
    }

    /// Fold `node` into `rep` after an SCC merge
    ///
    /// `rep` receives all of `node`'s facts; only facts both had already
    /// propagated stay marked as propagated, since the edges moved from `node`
    /// never saw the rest.
    pub fn merge_into(&mut self, node: NodeId, rep: NodeId) -> bool {
        if node == rep {
            return false;
        }
        self.ensure(node.max(rep));
        let node_propagated = self.propagated[node as usize].clone();
        self.propagated[rep as usize].intersect_with(&node_propagated);
        self.union_pts_from(rep, node)
    }

    /// Number of nodes with a non-empty points-to set
    pub fn non_empty_count(&self) -> usize {
        self.pts.iter().filter(|p| !p.is_empty()).count()
    }

    /// Size of the largest points-to set
    pub fn max_pts_size(&self) -> usize {
        self.pts.iter().map(PointsTo::len).max().unwrap_or(0)
    }

    /// Sum of all points-to set sizes
    pub fn total_pts_size(&self) -> usize {
        self.pts.iter().map(PointsTo::len).sum()
    }

    /// Copy of every points-to set, indexed by node
    pub fn snapshot(&self) -> Vec<PointsTo> {
        self.pts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_tracks_reverse_pts() {
        let mut data = DiffPointsToData::new();
        assert!(data.add_pts(4, 10));
        assert!(!data.add_pts(4, 10));
        assert!(data.add_pts(5, 10));

        assert!(data.get_pts(4).contains(10));
        assert_eq!(data.get_rev_pts(10).iter().collect::<Vec<_>>(), vec![4, 5]);
        assert!(data.get_pts(99).is_empty());
    }

    #[test]
    fn test_diff_is_consumed_once() {
        let mut data = DiffPointsToData::new();
        data.add_pts(4, 10);
        data.add_pts(4, 11);

        let diff = data.compute_diff(4);
        assert_eq!(diff.iter().collect::<Vec<_>>(), vec![10, 11]);
        assert!(data.compute_diff(4).is_empty());

        data.add_pts(4, 12);
        assert_eq!(data.pending_diff(4).iter().collect::<Vec<_>>(), vec![12]);
        assert_eq!(data.compute_diff(4).iter().collect::<Vec<_>>(), vec![12]);
    }

    #[test]
    fn test_merge_keeps_only_common_propagated_facts() {
        let mut data = DiffPointsToData::new();
        data.add_pts(4, 10);
        data.add_pts(4, 11);
        data.compute_diff(4);

        data.add_pts(5, 11);
        data.add_pts(5, 12);
        data.compute_diff(5);

        assert!(data.merge_into(5, 4));
        assert_eq!(data.get_pts(4).iter().collect::<Vec<_>>(), vec![10, 11, 12]);
        // Only 11 was propagated by both nodes
        assert_eq!(data.compute_diff(4).iter().collect::<Vec<_>>(), vec![10, 12]);
        assert!(data.get_rev_pts(12).contains(4));
    }

    #[test]
    fn test_union_reports_growth() {
        let mut data = DiffPointsToData::new();
        data.add_pts(4, 10);
        assert!(data.union_pts_from(5, 4));
        assert!(!data.union_pts_from(5, 4));
        assert!(!data.union_pts_from(4, 4));
        assert_eq!(data.max_pts_size(), 1);
        assert_eq!(data.non_empty_count(), 2);
    }
}
