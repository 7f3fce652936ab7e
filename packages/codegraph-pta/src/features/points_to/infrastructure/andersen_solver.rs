//! Andersen's Points-to Analysis Solver
//!
//! Inclusion-based pointer analysis over a [`ConstraintGraph`]:
//! - **Difference propagation**: Copy/Gep edges only carry `pts \ propagated`
//! - **SCC collapse**: copy/gep cycles merged into their minimum node
//! - **PWC handling**: cycles through offset-growing Geps collapse their targets
//!   to field-insensitive objects
//! - **Dynamic edges**: Load/Store edges spawn copy edges as pointees are found
//!
//! The solver owns the graph and the points-to store; the outer loop (rounds,
//! call-graph updates) lives in the application layer.
//!
//! # Complexity
//! - Theoretical: O(n³) worst case
//! - Practical: close to O(n²) with SCC collapse and diff propagation
//!
//! # References
//! - Andersen, L. O. "Program Analysis and Specialization for C" (PhD 1994)
//! - Hardekopf & Lin "The Ant and the Grasshopper" (PLDI 2007)
//! - Pearce et al. "Efficient Field-Sensitive Pointer Analysis" (CC 2004)

use super::constraint_graph::{ConstraintGraph, EdgeBucket};
use super::points_to_data::DiffPointsToData;
use super::scc_detector::detect_sccs;
use super::sparse_bitmap::PointsTo;
use super::worklist::Worklist;
use crate::config::PtaConfig;
use crate::features::points_to::domain::{CallSiteId, EdgeKind, NodeId, NodeKind};
use rustc_hash::FxHashSet;
use std::time::Instant;
use tracing::{debug, error, trace};

/// Statistics for Andersen's analysis
#[derive(Debug, Clone, Default)]
pub struct AndersenStats {
    pub addr_processed: usize,
    pub copy_processed: usize,
    pub gep_processed: usize,
    pub load_processed: usize,
    pub store_processed: usize,

    pub scc_detections: usize,
    pub sccs_collapsed: usize,
    pub nodes_merged: usize,
    pub pwc_collapses: usize,
    pub field_collapses: usize,
    pub variant_gep_collapses: usize,
    /// Objects made field-insensitive while solving
    pub fi_objects: usize,

    pub derived_copy_edges: usize,
    pub node_visits: usize,

    pub duration_scc_ms: f64,
    pub duration_solve_ms: f64,
}

/// Andersen's points-to analysis solver
pub struct AndersenSolver {
    config: PtaConfig,
    graph: ConstraintGraph,
    pts: DiffPointsToData,
    worklist: Worklist,

    /// Bases whose fields have been merged into them
    collapsed: FxHashSet<NodeId>,

    /// Derived direct edges since the last SCC pass
    new_direct_edges: usize,

    /// Set when a collapse changed facts of already processed nodes
    reanalyze: bool,
    initialized: bool,

    stats: AndersenStats,
}

impl std::fmt::Debug for AndersenSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AndersenSolver")
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .field("pending", &self.worklist.len())
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl AndersenSolver {
    pub fn new(graph: ConstraintGraph, config: PtaConfig) -> Self {
        let graph = graph.with_field_options(config.max_field_limit, config.first_field_eq_base);
        Self {
            worklist: Worklist::new(config.worklist_order),
            config,
            graph,
            pts: DiffPointsToData::new(),
            collapsed: FxHashSet::default(),
            new_direct_edges: 0,
            reanalyze: false,
            initialized: false,
            stats: AndersenStats::default(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn graph(&self) -> &ConstraintGraph {
        &self.graph
    }

    #[inline]
    pub fn graph_mut(&mut self) -> &mut ConstraintGraph {
        &mut self.graph
    }

    #[inline]
    pub fn pts_data(&self) -> &DiffPointsToData {
        &self.pts
    }

    #[inline]
    pub fn config(&self) -> &PtaConfig {
        &self.config
    }

    #[inline]
    pub fn stats(&self) -> &AndersenStats {
        &self.stats
    }

    #[inline]
    pub fn rep(&self, id: NodeId) -> NodeId {
        self.graph.scc_rep_node(id)
    }

    /// Points-to set of the representative of `id`
    pub fn points_to(&self, id: NodeId) -> &PointsTo {
        self.pts.get_pts(self.rep(id))
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Read and clear the reanalyze flag
    pub fn take_reanalyze(&mut self) -> bool {
        std::mem::take(&mut self.reanalyze)
    }

    /// Queue a node (resolved to its representative)
    #[inline]
    pub fn push(&mut self, id: NodeId) {
        let rep = self.rep(id);
        self.worklist.push(rep);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Phase 1: Seeding
    // ═══════════════════════════════════════════════════════════════════════

    /// Seed points-to sets from address edges
    ///
    /// Running it again adds nothing new.
    pub fn initialize(&mut self) {
        if !self.config.field_sensitive {
            let objects: Vec<NodeId> = self
                .graph
                .nodes()
                .filter(|n| matches!(n.kind, NodeKind::Object(_)))
                .map(|n| n.id)
                .collect();
            for obj in objects {
                self.graph.set_obj_field_insensitive(obj);
            }
        }

        for (pointer, object) in self.graph.addr_edges() {
            self.stats.addr_processed += 1;
            let rep = self.rep(pointer);
            if self.pts.add_pts(rep, object) {
                self.worklist.push(rep);
            }
        }
        self.initialized = true;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Phase 2: Cycle collapse
    // ═══════════════════════════════════════════════════════════════════════

    /// Queue every representative for one propagation round
    pub fn begin_round(&mut self) {
        let order = if self.config.enable_scc {
            self.collapse_sccs()
        } else {
            self.graph.rep_nodes()
        };
        for node in order {
            self.worklist.push(node);
        }
    }

    /// Detect and merge copy/gep cycles. Returns representatives in topological order.
    pub fn collapse_sccs(&mut self) -> Vec<NodeId> {
        let start = Instant::now();
        let result = detect_sccs(&self.graph);
        self.stats.scc_detections += 1;

        let mut pwc_candidates = Vec::new();
        for component in &result.components {
            let rep = component[0];
            for &member in &component[1..] {
                self.merge_node_to_rep(member, rep);
            }
            self.stats.sccs_collapsed += 1;
            pwc_candidates.push(rep);
        }
        for &node in &result.pwc_self_loops {
            self.graph.set_pwc(node);
            pwc_candidates.push(node);
        }

        for rep in pwc_candidates {
            if self.graph.is_pwc(rep) {
                self.flatten_pwc_members(rep);
            }
        }

        if !result.components.is_empty() {
            debug!(
                components = result.stats.scc_count,
                largest = result.stats.largest_scc,
                merged = result.stats.collapsed_nodes,
                "collapsed copy cycles"
            );
        }

        self.new_direct_edges = 0;
        self.stats.duration_scc_ms += start.elapsed().as_secs_f64() * 1000.0;
        result.topo_order
    }

    /// Object members of a PWC class lose field sensitivity
    fn flatten_pwc_members(&mut self, rep: NodeId) {
        for member in self.graph.scc_sub_nodes(rep).iter() {
            if !self.graph.is_object(member) || self.graph.is_black_hole_or_constant(member) {
                continue;
            }
            let base = self.graph.base_of(member);
            if self.graph.set_obj_field_insensitive(base) {
                self.stats.fi_objects += 1;
                debug!(
                    node = rep,
                    object = base,
                    "object in positive weight cycle made field-insensitive"
                );
            }
            self.graph.add_node_to_collapse(base);
        }
    }

    /// Fold the class of `node` into the class of `rep`
    ///
    /// Points-to facts, edges and PWC flags move to `rep`, which is queued.
    pub fn merge_node_to_rep(&mut self, node: NodeId, rep: NodeId) -> bool {
        let (node, rep) = (self.rep(node), self.rep(rep));
        if node == rep {
            return false;
        }

        self.pts.merge_into(node, rep);
        let critical_gep = self.graph.move_edges_to_rep(node, rep);
        self.graph.merge_rep(node, rep);
        if critical_gep {
            self.graph.set_pwc(rep);
        }

        self.worklist.push(rep);
        self.stats.nodes_merged += 1;
        trace!(node = node, rep = rep, "merged node");
        true
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Phase 3: Propagation
    // ═══════════════════════════════════════════════════════════════════════

    /// Process queued nodes until the worklist is empty
    pub fn propagate(&mut self) {
        let start = Instant::now();
        loop {
            while let Some(node) = self.worklist.pop() {
                let threshold = self.config.scc_batch_threshold;
                if self.config.enable_scc && threshold > 0 && self.new_direct_edges >= threshold {
                    for rep in self.collapse_sccs() {
                        if !self.pts.pending_diff(rep).is_empty() {
                            self.worklist.push(rep);
                        }
                    }
                }
                self.process_node(node);
            }
            // Gep resolution of the last node may have queued bases
            self.collapse_fields();
            if self.worklist.is_empty() {
                break;
            }
        }
        self.stats.duration_solve_ms += start.elapsed().as_secs_f64() * 1000.0;
    }

    fn process_node(&mut self, node: NodeId) {
        if !self.graph.is_rep(node) {
            return;
        }
        self.stats.node_visits += 1;
        trace!(node = node, "processing node");

        if self.config.merge_pwc && self.graph.is_pwc(node) && self.collapse_node_pts(node) {
            self.stats.pwc_collapses += 1;
            self.reanalyze = true;
        }
        self.collapse_fields();

        // Field collapse may have merged this node away
        if !self.graph.is_rep(node) {
            return;
        }

        self.handle_copy_gep(node);
        self.handle_load_store(node);
    }

    /// Propagate the diff of `node` along its Copy and Gep out edges
    fn handle_copy_gep(&mut self, node: NodeId) {
        let diff = self.pts.compute_diff(node);
        if diff.is_empty() {
            return;
        }

        for dst in self.sorted_out_targets(node, EdgeBucket::Copy) {
            self.stats.copy_processed += 1;
            let dst = self.rep(dst);
            if self.pts.union_pts(dst, &diff) {
                self.worklist.push(dst);
            }
        }

        let mut geps: Vec<(NodeId, EdgeKind, u32)> = self
            .graph
            .out_edges(node, EdgeBucket::Gep)
            .map(|e| (e.dst, e.kind, e.id))
            .collect();
        geps.sort_unstable_by_key(|&(_, _, id)| id);
        for (dst, kind, _) in geps {
            self.stats.gep_processed += 1;
            let derived = self.process_gep_pts(&diff, kind);
            let dst = self.rep(dst);
            if self.pts.union_pts(dst, &derived) {
                self.worklist.push(dst);
            }
        }
    }

    /// Objects reached by applying a Gep to every object of `pts`
    pub fn process_gep_pts(&mut self, pts: &PointsTo, kind: EdgeKind) -> PointsTo {
        let mut derived = PointsTo::new();
        for obj in pts.iter() {
            if self.graph.is_black_hole_or_constant(obj) {
                derived.insert(obj);
                continue;
            }
            if !self.graph.is_object(obj) {
                error!(node = obj, "value node found in a points-to set, skipping");
                continue;
            }
            match kind {
                EdgeKind::VariantGep => {
                    let base = self.graph.base_of(obj);
                    if self.graph.set_obj_field_insensitive(base) {
                        self.stats.variant_gep_collapses += 1;
                        self.stats.fi_objects += 1;
                        debug!(object = base, "variant gep made object field-insensitive");
                        self.graph.add_node_to_collapse(base);
                    }
                    derived.insert(base);
                }
                EdgeKind::NormalGep { offset } => match self.graph.gep_obj_node(obj, offset) {
                    Ok(field) => {
                        derived.insert(field);
                    }
                    Err(e) => {
                        error!(object = obj, offset = offset, error = %e, "gep resolution failed")
                    }
                },
                _ => {}
            }
        }
        derived
    }

    /// Derive copy edges from the Load/Store edges of `node`
    fn handle_load_store(&mut self, node: NodeId) {
        let pts = self.pts.get_pts(node).clone();
        if pts.is_empty() {
            return;
        }
        let loads = self.sorted_out_targets(node, EdgeBucket::Load);
        let mut stores: Vec<NodeId> = self
            .graph
            .in_edges(node, EdgeBucket::Store)
            .map(|e| e.src)
            .collect();
        stores.sort_unstable();
        if loads.is_empty() && stores.is_empty() {
            return;
        }

        for obj in pts.iter() {
            if self.graph.is_constant(obj) {
                continue;
            }
            let obj_rep = self.rep(obj);
            for &dst in &loads {
                self.stats.load_processed += 1;
                self.add_derived_copy(obj_rep, dst, None);
            }
            for &src in &stores {
                self.stats.store_processed += 1;
                self.add_derived_copy(src, obj_rep, None);
            }
        }
    }

    fn sorted_out_targets(&self, node: NodeId, bucket: EdgeBucket) -> Vec<NodeId> {
        let mut targets: Vec<NodeId> = self.graph.out_edges(node, bucket).map(|e| e.dst).collect();
        targets.sort_unstable();
        targets
    }

    fn add_derived_copy(
        &mut self,
        src: NodeId,
        dst: NodeId,
        call_site: Option<CallSiteId>,
    ) -> bool {
        let (src, dst) = (self.rep(src), self.rep(dst));
        if src == dst {
            return false;
        }
        let inserted = match call_site {
            Some(cs) => self.graph.add_call_copy_edge(src, dst, cs),
            None => self.graph.add_copy_edge(src, dst),
        };
        match inserted {
            Ok(true) => {
                self.stats.derived_copy_edges += 1;
                self.new_direct_edges += 1;
                // The new edge never saw the facts already propagated from src
                if self.pts.union_pts_from(dst, src) {
                    self.worklist.push(dst);
                }
                true
            }
            Ok(false) => false,
            Err(e) => {
                error!(src = src, dst = dst, error = %e, "failed to add derived copy edge");
                false
            }
        }
    }

    /// Add a copy edge created by call resolution and propagate across it
    pub fn add_call_copy_edge(&mut self, src: NodeId, dst: NodeId, call_site: CallSiteId) -> bool {
        self.add_derived_copy(src, dst, Some(call_site))
    }

    /// Add `pointer = &object` after seeding and propagate it
    pub fn add_addr_edge(&mut self, pointer: NodeId, object: NodeId) -> bool {
        match self.graph.add_addr_edge(pointer, object) {
            Ok(inserted) => {
                let rep = self.rep(pointer);
                if self.pts.add_pts(rep, object) {
                    self.stats.addr_processed += 1;
                    self.worklist.push(rep);
                }
                inserted
            }
            Err(e) => {
                error!(
                    pointer = pointer,
                    object = object,
                    error = %e,
                    "failed to add address edge"
                );
                false
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Field collapse
    // ═══════════════════════════════════════════════════════════════════════

    /// Queue every object pointed to by `node` for field collapse
    pub fn collapse_node_pts(&mut self, node: NodeId) -> bool {
        let pts = self.pts.get_pts(node).clone();
        let mut changed = false;
        for obj in pts.iter() {
            if self.graph.is_black_hole_or_constant(obj) || !self.graph.is_object(obj) {
                continue;
            }
            let base = self.graph.base_of(obj);
            if self.collapsed.contains(&base) {
                continue;
            }
            if self.graph.set_obj_field_insensitive(base) {
                self.stats.fi_objects += 1;
                debug!(node = node, object = base, "collapsing pointee of positive weight cycle");
            }
            self.graph.add_node_to_collapse(base);
            changed = true;
        }
        changed
    }

    /// Drain the collapse queue
    pub fn collapse_fields(&mut self) {
        loop {
            let queued = self.graph.take_nodes_to_collapse();
            if queued.is_empty() {
                break;
            }
            for base in queued {
                if self.collapse_field(base) {
                    self.reanalyze = true;
                }
            }
        }
    }

    /// Merge every field of the base of `obj` into the base
    ///
    /// Holders of a field also receive the base, so later loads and stores
    /// through them see the whole object.
    pub fn collapse_field(&mut self, obj: NodeId) -> bool {
        let base = self.graph.base_of(obj);
        if self.graph.is_black_hole_or_constant(base) || !self.graph.is_object(base) {
            return false;
        }
        if !self.collapsed.insert(base) {
            return false;
        }
        if self.graph.set_obj_field_insensitive(base) {
            self.stats.fi_objects += 1;
        }
        self.stats.field_collapses += 1;

        let mut changed = false;
        let fields = self.graph.fields_of(base).to_vec();
        for field in fields {
            let holders = self.pts.get_rev_pts(field).clone();
            for holder in holders.iter() {
                let holder = self.rep(holder);
                if self.pts.add_pts(holder, base) {
                    self.worklist.push(holder);
                    changed = true;
                }
            }

            // Keep the minimum node as representative
            let (a, b) = (self.rep(field), self.rep(base));
            let (node, rep) = if a < b { (b, a) } else { (a, b) };
            changed |= self.merge_node_to_rep(node, rep);
        }

        if !self.graph.fields_of(base).is_empty() {
            debug!(
                object = base,
                fields = self.graph.fields_of(base).len(),
                "collapsed object fields"
            );
        }

        let base_rep = self.rep(base);
        if self.graph.is_pwc(base_rep) && self.collapse_node_pts(base_rep) {
            changed = true;
        }
        changed
    }
}
