//! High-Level Points-to Analyzer
//!
//! [`AndersenAnalysis`] is the context object of one whole-program run. It
//! owns the solver (graph + points-to store) and the call resolver and drives
//! the outer loop:
//!
//! ```text
//! initialize
//! loop {
//!     collapse cycles; propagate
//!     if no new call edges and nothing to reanalyze { break }
//! }
//! resolve thread edges; report unresolved calls
//! ```
//!
//! # Usage
//! ```text
//! let program = builder.build();
//! let mut analysis = AndersenAnalysis::new(program, PtaConfig::default())?;
//! analysis.solve();
//! assert!(analysis.may_alias(x, y));
//! ```

use super::builder::{ConstraintProgram, SkippedRegion};
use crate::config::{PtaConfig, Validatable};
use crate::errors::Result;
use crate::features::points_to::domain::{AliasResult, CallInstId, NodeId, BLACK_HOLE};
use crate::features::points_to::infrastructure::{
    AndersenSolver, AndersenStats, ConstraintGraph, OnTheFlyResolver, PointsTo, PtaCallGraph,
    ResolverStats,
};
use crate::features::points_to::ports::PointsToQuery;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Unified statistics of one analysis
#[derive(Debug, Clone, Default)]
pub struct AnalysisStats {
    pub rounds: usize,
    /// False if the round budget stopped the loop early
    pub converged: bool,

    pub nodes: usize,
    pub edges: usize,
    pub rep_nodes: usize,
    pub sccs_collapsed: usize,
    pub nodes_merged: usize,
    pub pwc_nodes: usize,
    pub field_collapses: usize,
    pub fi_objects: usize,
    pub derived_copy_edges: usize,

    pub call_edges: usize,
    pub indirect_call_edges: usize,
    pub thread_edges: usize,
    pub unresolved_calls: usize,
    pub skipped_regions: usize,

    pub max_pts_size: usize,
    pub total_pts_size: usize,
    pub duration_ms: f64,
}

/// Whole-program Andersen analysis
#[derive(Debug)]
pub struct AndersenAnalysis {
    solver: AndersenSolver,
    resolver: OnTheFlyResolver,
    skipped_regions: Vec<SkippedRegion>,
    stats: AnalysisStats,
    solved: bool,
}

impl AndersenAnalysis {
    /// Create an analysis over `program`; fails if `config` is invalid
    pub fn new(program: ConstraintProgram, config: PtaConfig) -> Result<Self> {
        config.validate()?;

        let ConstraintProgram {
            graph,
            signatures,
            call_graph,
            indirect_calls,
            forks,
            joins,
            skipped_regions,
            ..
        } = program;

        let resolver = OnTheFlyResolver::new(signatures, call_graph, config.indirect_call_limit)
            .with_indirect_sites(indirect_calls)
            .with_thread_sites(forks, joins);
        let solver = AndersenSolver::new(graph, config);

        Ok(Self {
            solver,
            resolver,
            stats: AnalysisStats {
                skipped_regions: skipped_regions.len(),
                ..Default::default()
            },
            skipped_regions,
            solved: false,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Solving
    // ═══════════════════════════════════════════════════════════════════════

    /// Run to fixpoint (or the round budget)
    ///
    /// A second call on a converged analysis does nothing.
    pub fn solve(&mut self) -> &AnalysisStats {
        if self.solved {
            return &self.stats;
        }
        let start = Instant::now();

        loop {
            if !self.solve_round() {
                self.stats.converged = true;
                break;
            }
            if let Some(max) = self.solver.config().max_iterations {
                if self.stats.rounds >= max {
                    warn!(rounds = self.stats.rounds, "round budget exhausted before fixpoint");
                    break;
                }
            }
        }

        if self.solver.config().resolve_thread_edges {
            self.resolver.resolve_thread_edges(&self.solver);
        }
        self.stats.unresolved_calls = self.resolver.report_unresolved();
        self.solved = self.stats.converged;

        self.refresh_stats();
        self.stats.duration_ms += start.elapsed().as_secs_f64() * 1000.0;
        info!(
            rounds = self.stats.rounds,
            converged = self.stats.converged,
            nodes = self.stats.nodes,
            call_edges = self.stats.call_edges,
            merged = self.stats.nodes_merged,
            duration_ms = self.stats.duration_ms,
            "points-to analysis finished"
        );
        &self.stats
    }

    /// One outer iteration: collapse, propagate, resolve calls
    ///
    /// Returns true if another round is needed.
    pub fn solve_round(&mut self) -> bool {
        if !self.solver.is_initialized() {
            self.solver.initialize();
        }
        self.solver.begin_round();
        self.solver.propagate();
        let reanalyze = self.solver.take_reanalyze();
        let new_calls = self.resolver.resolve(&mut self.solver);
        self.stats.rounds += 1;

        debug!(
            round = self.stats.rounds,
            new_calls = new_calls,
            reanalyze = reanalyze,
            "round complete"
        );
        new_calls || reanalyze
    }

    fn refresh_stats(&mut self) {
        let graph = self.solver.graph();
        let solver = self.solver.stats();
        let resolver = self.resolver.stats();
        let pts = self.solver.pts_data();

        self.stats.nodes = graph.node_count();
        self.stats.edges = graph.edge_count();
        self.stats.rep_nodes = graph.rep_nodes().len();
        self.stats.sccs_collapsed = solver.sccs_collapsed;
        self.stats.nodes_merged = solver.nodes_merged;
        self.stats.pwc_nodes = graph.pwc_count();
        self.stats.field_collapses = solver.field_collapses;
        self.stats.fi_objects = solver.fi_objects;
        self.stats.derived_copy_edges = solver.derived_copy_edges;
        self.stats.call_edges = self.resolver.call_graph().num_edges();
        self.stats.indirect_call_edges = resolver.indirect_edges;
        self.stats.thread_edges =
            resolver.fork_edges + resolver.join_edges + resolver.parallel_for_edges;
        self.stats.max_pts_size = pts.max_pts_size();
        self.stats.total_pts_size = pts.total_pts_size();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn graph(&self) -> &ConstraintGraph {
        self.solver.graph()
    }

    #[inline]
    pub fn call_graph(&self) -> &PtaCallGraph {
        self.resolver.call_graph()
    }

    #[inline]
    pub fn stats(&self) -> &AnalysisStats {
        &self.stats
    }

    pub fn solver_stats(&self) -> &AndersenStats {
        self.solver.stats()
    }

    pub fn resolver_stats(&self) -> &ResolverStats {
        self.resolver.stats()
    }

    pub fn config(&self) -> &PtaConfig {
        self.solver.config()
    }

    pub fn skipped_regions(&self) -> &[SkippedRegion] {
        &self.skipped_regions
    }

    pub fn unresolved_call_sites(&self) -> Vec<CallInstId> {
        self.resolver.unresolved_sites()
    }

    /// Points-to set of the representative of `id`
    pub fn points_to_set(&self, id: NodeId) -> &PointsTo {
        self.solver.points_to(id)
    }

    pub fn is_pwc(&self, id: NodeId) -> bool {
        self.solver.graph().is_pwc(self.solver.rep(id))
    }

    /// Points-to set with field-insensitive objects widened to all their fields
    fn expanded_pts(&self, id: NodeId) -> PointsTo {
        let graph = self.solver.graph();
        let mut expanded = PointsTo::new();
        for obj in self.solver.points_to(id).iter() {
            expanded.insert(obj);
            if graph.is_object(obj) && graph.is_field_insensitive(obj) {
                let base = graph.base_of(obj);
                expanded.insert(base);
                for &field in graph.fields_of(base) {
                    expanded.insert(field);
                }
            }
        }
        expanded
    }

    /// `{o}` where `o` is one concrete location
    fn unique_location(&self, pts: &PointsTo) -> Option<NodeId> {
        if pts.len() != 1 {
            return None;
        }
        let graph = self.solver.graph();
        let obj = pts.first()?;
        let concrete = graph.is_object(obj)
            && !graph.is_heap(obj)
            && !graph.is_black_hole_or_constant(obj)
            && !graph.is_field_insensitive(obj);
        concrete.then_some(obj)
    }
}

impl PointsToQuery for AndersenAnalysis {
    fn points_to(&self, node: NodeId) -> Vec<NodeId> {
        self.solver.points_to(node).iter().collect()
    }

    fn alias(&self, a: NodeId, b: NodeId) -> AliasResult {
        let (pts_a, pts_b) = (self.solver.points_to(a), self.solver.points_to(b));
        if pts_a.contains(BLACK_HOLE) || pts_b.contains(BLACK_HOLE) {
            return AliasResult::MayAlias;
        }
        if let (Some(x), Some(y)) = (self.unique_location(pts_a), self.unique_location(pts_b)) {
            if x == y {
                return AliasResult::MustAlias;
            }
        }
        if self.expanded_pts(a).intersects(&self.expanded_pts(b)) {
            AliasResult::MayAlias
        } else {
            AliasResult::NoAlias
        }
    }

    fn callees(&self, inst: CallInstId) -> Vec<NodeId> {
        self.resolver.call_graph().callees(inst)
    }

    fn scc_rep_node(&self, node: NodeId) -> NodeId {
        self.solver.rep(node)
    }

    fn is_field_insensitive(&self, node: NodeId) -> bool {
        self.solver.graph().is_field_insensitive(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::points_to::application::builder::{
        ConstraintGraphBuilder, ConstraintRegion,
    };
    use crate::features::points_to::domain::{Constraint, ObjectMeta, BLK_PTR};

    fn analyze(builder: ConstraintGraphBuilder) -> AndersenAnalysis {
        let mut analysis = AndersenAnalysis::new(builder.build(), PtaConfig::default()).unwrap();
        analysis.solve();
        analysis
    }

    #[test]
    fn test_basic_analysis() {
        let mut builder = ConstraintGraphBuilder::new();
        let (x, y) = (builder.add_value("x"), builder.add_value("y"));
        let a = builder.add_object("A", ObjectMeta::stack(0));
        builder.add_constraints([Constraint::addr(x, a), Constraint::copy(x, y)]).unwrap();

        let analysis = analyze(builder);
        assert_eq!(analysis.points_to(y), vec![a]);
        assert_eq!(analysis.alias(x, y), AliasResult::MustAlias);
        assert!(analysis.stats().converged);
    }

    #[test]
    fn test_no_alias() {
        let mut builder = ConstraintGraphBuilder::new();
        let (x, y) = (builder.add_value("x"), builder.add_value("y"));
        let a = builder.add_object("A", ObjectMeta::heap(0));
        let b = builder.add_object("B", ObjectMeta::heap(0));
        builder.add_constraints([Constraint::addr(x, a), Constraint::addr(y, b)]).unwrap();

        let analysis = analyze(builder);
        assert_eq!(analysis.alias(x, y), AliasResult::NoAlias);
    }

    #[test]
    fn test_heap_singletons_only_may_alias() {
        let mut builder = ConstraintGraphBuilder::new();
        let (x, y) = (builder.add_value("x"), builder.add_value("y"));
        let h = builder.add_object("h", ObjectMeta::heap(0));
        builder.add_constraints([Constraint::addr(x, h), Constraint::copy(x, y)]).unwrap();

        let analysis = analyze(builder);
        assert_eq!(analysis.alias(x, y), AliasResult::MayAlias);
    }

    #[test]
    fn test_black_hole_may_alias_everything() {
        let mut builder = ConstraintGraphBuilder::new();
        let (x, y) = (builder.add_value("x"), builder.add_value("y"));
        let a = builder.add_object("A", ObjectMeta::stack(0));
        builder.add_constraints([Constraint::addr(x, a), Constraint::copy(BLK_PTR, y)]).unwrap();

        let analysis = analyze(builder);
        assert_eq!(analysis.alias(x, y), AliasResult::MayAlias);
    }

    #[test]
    fn test_solve_twice_is_noop() {
        let mut builder = ConstraintGraphBuilder::new();
        let (x, y) = (builder.add_value("x"), builder.add_value("y"));
        let a = builder.add_object("A", ObjectMeta::stack(0));
        let mut region = ConstraintRegion::new("main");
        region.push(Constraint::addr(x, a)).push(Constraint::copy(x, y));
        builder.add_region(region).unwrap();

        let mut analysis = analyze(builder);
        let rounds = analysis.stats().rounds;
        let before = analysis.solver.pts_data().snapshot();
        analysis.solve();
        assert_eq!(analysis.stats().rounds, rounds);
        // An extra round finds nothing new either
        assert!(!analysis.solve_round());
        assert_eq!(analysis.solver.pts_data().snapshot(), before);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let program = ConstraintGraphBuilder::new().build();
        let config = PtaConfig::default().max_field_limit(0);
        assert!(AndersenAnalysis::new(program, config).is_err());
    }

    #[test]
    fn test_analysis_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<AndersenAnalysis>();
    }
}
