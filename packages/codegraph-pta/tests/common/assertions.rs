//! Custom assertions for points-to results

use codegraph_pta::{AndersenAnalysis, NodeId, PointsToQuery};
use pretty_assertions::assert_eq;

/// Assert the exact points-to set of `node`
pub fn assert_pts(analysis: &AndersenAnalysis, node: NodeId, expected: &[NodeId]) {
    let mut expected = expected.to_vec();
    expected.sort_unstable();
    assert_eq!(
        analysis.points_to(node),
        expected,
        "points-to set of {}",
        analysis.graph().label(node)
    );
}

/// Assert `pts(node)` contains every object of `objects`
pub fn assert_pts_contains(analysis: &AndersenAnalysis, node: NodeId, objects: &[NodeId]) {
    let pts = analysis.points_to(node);
    for obj in objects {
        assert!(
            pts.contains(obj),
            "expected {} in pts({}) = {:?}",
            analysis.graph().label(*obj),
            analysis.graph().label(node),
            pts
        );
    }
}

/// Every node's points-to set, indexed by node ID
pub fn pts_snapshot(analysis: &AndersenAnalysis) -> Vec<Vec<NodeId>> {
    (0..analysis.graph().node_count() as NodeId)
        .map(|n| analysis.points_to(n))
        .collect()
}

/// Assert `before[n] ⊆ after[n]` for every node present in `before`
pub fn assert_monotone(before: &[Vec<NodeId>], after: &[Vec<NodeId>]) {
    for (node, old) in before.iter().enumerate() {
        let new = &after[node];
        for obj in old {
            assert!(
                new.contains(obj),
                "pts({node}) lost {obj}: {old:?} -> {new:?}"
            );
        }
    }
}
