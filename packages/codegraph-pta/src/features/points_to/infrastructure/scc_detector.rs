//! Strongly Connected Component Detection
//!
//! Tarjan's algorithm over the *direct* edge subgraph (Copy and Gep) of the
//! constraint graph. Load/Store edges are ignored: they stand for a dereference,
//! not for structural inclusion.
//!
//! # Why SCC Detection?
//! In constraint graphs like:
//!   x ⊇ y, y ⊇ z, z ⊇ x (cycle)
//!
//! All variables in the cycle end up with the same points-to set, so the
//! solver collapses them into one representative.
//!
//! The DFS is iterative (no recursion depth limit on long copy chains) and visits
//! roots and successors in ascending NodeId order, so components, representatives
//! and the topological order are fully deterministic.
//!
//! # References
//! - Tarjan, R. "Depth-First Search and Linear Graph Algorithms" (1972)
//! - Nuutila, E. "On Finding the Strongly Connected Components" (1994)

use super::constraint_graph::ConstraintGraph;
use crate::features::points_to::domain::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::min;

/// Result of SCC detection
#[derive(Debug, Clone, Default)]
pub struct SccResult {
    /// Non-trivial SCCs, each sorted ascending (first element = representative)
    pub components: Vec<Vec<NodeId>>,

    /// Representatives in topological order (sources first)
    pub topo_order: Vec<NodeId>,

    /// Singleton nodes with an offset-growing Gep self-loop
    pub pwc_self_loops: Vec<NodeId>,

    pub stats: SccStats,
}

#[derive(Debug, Clone, Default)]
pub struct SccStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub scc_count: usize,
    pub largest_scc: usize,
    pub collapsed_nodes: usize,
}

impl SccResult {
    /// Representative of each non-trivial component member
    pub fn rep_map(&self) -> FxHashMap<NodeId, NodeId> {
        self.components
            .iter()
            .flat_map(|c| c.iter().map(move |&m| (m, c[0])))
            .collect()
    }
}

struct Frame {
    node: NodeId,
    succs: Vec<NodeId>,
    next: usize,
}

#[derive(Default)]
struct TarjanState {
    index: FxHashMap<NodeId, usize>,
    lowlink: FxHashMap<NodeId, usize>,
    on_stack: FxHashSet<NodeId>,
    stack: Vec<NodeId>,
    current_index: usize,
    /// Emitted in reverse topological order
    sccs: Vec<Vec<NodeId>>,
    edges_seen: usize,
}

impl TarjanState {
    fn visit(&mut self, v: NodeId) {
        self.index.insert(v, self.current_index);
        self.lowlink.insert(v, self.current_index);
        self.current_index += 1;
        self.stack.push(v);
        self.on_stack.insert(v);
    }

    fn lower(&mut self, v: NodeId, candidate: usize) {
        if let Some(low) = self.lowlink.get_mut(&v) {
            *low = min(*low, candidate);
        }
    }

    fn pop_component(&mut self, root: NodeId) {
        let mut scc = Vec::new();
        while let Some(w) = self.stack.pop() {
            self.on_stack.remove(&w);
            scc.push(w);
            if w == root {
                break;
            }
        }
        scc.sort_unstable();
        self.sccs.push(scc);
    }
}

/// Detect SCCs among the current representatives of `graph`
///
/// Time: O(V + E)
/// Space: O(V)
pub fn detect_sccs(graph: &ConstraintGraph) -> SccResult {
    let nodes = graph.rep_nodes();
    let mut state = TarjanState::default();
    let mut call_stack: Vec<Frame> = Vec::new();

    for &root in &nodes {
        if state.index.contains_key(&root) {
            continue;
        }
        state.visit(root);
        let succs = graph.direct_successors(root);
        state.edges_seen += succs.len();
        call_stack.push(Frame {
            node: root,
            succs,
            next: 0,
        });

        while let Some(frame) = call_stack.last_mut() {
            let v = frame.node;
            if frame.next < frame.succs.len() {
                let w = frame.succs[frame.next];
                frame.next += 1;
                if let Some(&w_index) = state.index.get(&w) {
                    if state.on_stack.contains(&w) {
                        state.lower(v, w_index);
                    }
                } else {
                    state.visit(w);
                    let succs = graph.direct_successors(w);
                    state.edges_seen += succs.len();
                    call_stack.push(Frame {
                        node: w,
                        succs,
                        next: 0,
                    });
                }
                continue;
            }

            call_stack.pop();
            let v_low = state.lowlink.get(&v).copied().unwrap_or(usize::MAX);
            if let Some(parent) = call_stack.last() {
                state.lower(parent.node, v_low);
            }
            if state.index.get(&v) == Some(&v_low) {
                state.pop_component(v);
            }
        }
    }

    build_result(graph, nodes.len(), state)
}

fn build_result(graph: &ConstraintGraph, total_nodes: usize, state: TarjanState) -> SccResult {
    let mut components = Vec::new();
    let mut pwc_self_loops = Vec::new();
    let mut collapsed = 0;
    let mut largest = 0;

    // Tarjan emits sinks first
    let topo_order: Vec<NodeId> = state.sccs.iter().rev().map(|scc| scc[0]).collect();

    for scc in state.sccs.into_iter().rev() {
        largest = largest.max(scc.len());
        if scc.len() > 1 {
            collapsed += scc.len() - 1;
            components.push(scc);
        } else if graph.has_critical_gep_self_loop(scc[0]) {
            pwc_self_loops.push(scc[0]);
        }
    }

    SccResult {
        stats: SccStats {
            total_nodes,
            total_edges: state.edges_seen,
            scc_count: components.len(),
            largest_scc: largest,
            collapsed_nodes: collapsed,
        },
        components,
        topo_order,
        pwc_self_loops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_graph(n: usize) -> (ConstraintGraph, Vec<NodeId>) {
        let mut graph = ConstraintGraph::new();
        let ids: Vec<NodeId> = (0..n).map(|_| graph.add_value(None)).collect();
        (graph, ids)
    }

    #[test]
    fn test_simple_cycle() {
        // A → B → C → A
        let (mut graph, v) = chain_graph(3);
        graph.add_copy_edge(v[0], v[1]).unwrap();
        graph.add_copy_edge(v[1], v[2]).unwrap();
        graph.add_copy_edge(v[2], v[0]).unwrap();

        let result = detect_sccs(&graph);
        assert_eq!(result.stats.scc_count, 1);
        assert_eq!(result.components[0], v);
        assert_eq!(result.stats.collapsed_nodes, 2);
    }

    #[test]
    fn test_no_cycle_topological_order() {
        // A → B → C
        let (mut graph, v) = chain_graph(3);
        graph.add_copy_edge(v[1], v[2]).unwrap();
        graph.add_copy_edge(v[0], v[1]).unwrap();

        let result = detect_sccs(&graph);
        assert_eq!(result.stats.scc_count, 0);
        let pos = |n: NodeId| result.topo_order.iter().position(|&x| x == n).unwrap();
        assert!(pos(v[0]) < pos(v[1]));
        assert!(pos(v[1]) < pos(v[2]));
    }

    #[test]
    fn test_load_store_edges_ignored() {
        let (mut graph, v) = chain_graph(2);
        graph.add_copy_edge(v[0], v[1]).unwrap();
        graph.add_load_edge(v[1], v[0]).unwrap();
        assert!(detect_sccs(&graph).components.is_empty());
    }

    #[test]
    fn test_gep_edges_close_cycles() {
        let (mut graph, v) = chain_graph(2);
        graph.add_normal_gep_edge(v[0], v[1], 1).unwrap();
        graph.add_copy_edge(v[1], v[0]).unwrap();
        assert_eq!(detect_sccs(&graph).components, vec![vec![v[0], v[1]]]);
    }

    #[test]
    fn test_multiple_sccs_min_representative() {
        // Cycles (c, a, b) and (d, e)
        let (mut graph, v) = chain_graph(5);
        graph.add_copy_edge(v[2], v[0]).unwrap();
        graph.add_copy_edge(v[0], v[1]).unwrap();
        graph.add_copy_edge(v[1], v[2]).unwrap();
        graph.add_copy_edge(v[3], v[4]).unwrap();
        graph.add_copy_edge(v[4], v[3]).unwrap();

        let result = detect_sccs(&graph);
        assert_eq!(result.stats.scc_count, 2);
        let reps = result.rep_map();
        assert_eq!(reps[&v[2]], v[0]);
        assert_eq!(reps[&v[4]], v[3]);
    }

    #[test]
    fn test_gep_self_loop_reported() {
        let (mut graph, v) = chain_graph(2);
        graph.add_normal_gep_edge(v[0], v[0], 2).unwrap();
        graph.add_normal_gep_edge(v[1], v[1], 0).unwrap();

        let result = detect_sccs(&graph);
        assert!(result.components.is_empty());
        assert_eq!(result.pwc_self_loops, vec![v[0]]);
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let (mut graph, v) = chain_graph(20_000);
        for pair in v.windows(2) {
            graph.add_copy_edge(pair[0], pair[1]).unwrap();
        }
        graph.add_copy_edge(v[v.len() - 1], v[0]).unwrap();

        let result = detect_sccs(&graph);
        assert_eq!(result.components.len(), 1);
        assert_eq!(result.components[0].len(), 20_000);
    }
}
