//! Constraint Graph Builder
//!
//! Entry point for IR frontends. Nodes are allocated one by one; constraints
//! and call sites arrive in named regions (typically one per function body).
//! A region is validated as a whole before anything in it touches the graph,
//! so a malformed region is skipped without leaving half of it behind.
//!
//! # Usage
//! ```text
//! let mut builder = ConstraintGraphBuilder::new();
//! let p = builder.add_value("p");
//! let o = builder.add_object("o", ObjectMeta::stack(0));
//!
//! let mut region = ConstraintRegion::new("main");
//! region.push(Constraint::addr(p, o));
//! builder.add_region(region)?;
//!
//! let program = builder.build();
//! ```

use crate::features::points_to::domain::{
    CallInstId, Constraint, ConstraintGraphError, ConstraintSet, DirectCallSite, EdgeKind, ForkSite,
    FunctionSignature, GraphResult, IndirectCallSite, JoinSite, NodeId, ObjectMeta, BLACK_HOLE,
    BLK_PTR, CONSTANT_OBJ, NULL_PTR,
};
use crate::features::points_to::infrastructure::{
    bind_params, CallGraphEdgeKind, ConstraintGraph, PtaCallGraph,
};
use crate::features::points_to::ports::ConstraintSource;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

/// Named batch of constraints and call sites, applied atomically
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegion {
    pub name: String,
    pub constraints: ConstraintSet,
    pub direct_calls: Vec<DirectCallSite>,
    pub indirect_calls: Vec<IndirectCallSite>,
    pub forks: Vec<ForkSite>,
    pub joins: Vec<JoinSite>,
    /// Geps whose offset metadata was missing
    pub malformed_geps: usize,
}

impl ConstraintRegion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, constraint: Constraint) -> &mut Self {
        self.constraints.add(constraint);
        self
    }

    pub fn extend(&mut self, constraints: impl IntoIterator<Item = Constraint>) -> &mut Self {
        for constraint in constraints {
            self.constraints.add(constraint);
        }
        self
    }

    /// Gep with builder metadata; `None` becomes a variant gep
    pub fn gep(&mut self, src: NodeId, dst: NodeId, offset: Option<u32>) -> &mut Self {
        if offset.is_none() {
            self.malformed_geps += 1;
        }
        self.push(Constraint::gep(src, dst, offset))
    }

    pub fn direct_call(&mut self, call: DirectCallSite) -> &mut Self {
        self.direct_calls.push(call);
        self
    }

    pub fn indirect_call(&mut self, call: IndirectCallSite) -> &mut Self {
        self.indirect_calls.push(call);
        self
    }

    pub fn fork(&mut self, fork: ForkSite) -> &mut Self {
        self.forks.push(fork);
        self
    }

    pub fn join(&mut self, join: JoinSite) -> &mut Self {
        self.joins.push(join);
        self
    }

    fn call_ids(&self) -> impl Iterator<Item = CallInstId> + '_ {
        self.direct_calls
            .iter()
            .map(|c| c.id)
            .chain(self.indirect_calls.iter().map(|c| c.id))
            .chain(self.forks.iter().map(|f| f.id))
            .chain(self.joins.iter().map(|j| j.id))
    }
}

/// Region rejected during building
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRegion {
    pub name: String,
    pub error: ConstraintGraphError,
}

#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub regions: usize,
    pub constraints: usize,
    /// Load and store constraints among `constraints`
    pub complex_constraints: usize,
    pub malformed_geps: usize,
    pub direct_calls: usize,
    pub indirect_calls: usize,
    pub thread_sites: usize,
    pub functions: usize,
    /// Arguments passed to a direct callee with no room for them
    pub dropped_args: usize,
}

/// Analysis input produced by [`ConstraintGraphBuilder::build`]
#[derive(Debug, Clone)]
pub struct ConstraintProgram {
    pub graph: ConstraintGraph,
    pub signatures: FxHashMap<NodeId, FunctionSignature>,
    /// Direct call edges resolved at build time
    pub call_graph: PtaCallGraph,
    pub indirect_calls: Vec<IndirectCallSite>,
    pub forks: Vec<ForkSite>,
    pub joins: Vec<JoinSite>,
    pub skipped_regions: Vec<SkippedRegion>,
    pub stats: BuildStats,
}

impl ConstraintProgram {
    /// Build a program from an external constraint source
    pub fn from_source(source: &impl ConstraintSource) -> GraphResult<Self> {
        let mut builder = ConstraintGraphBuilder::new();
        source.populate(&mut builder)?;
        Ok(builder.build())
    }
}

/// Builds a [`ConstraintProgram`] region by region
#[derive(Debug, Default)]
pub struct ConstraintGraphBuilder {
    graph: ConstraintGraph,
    signatures: FxHashMap<NodeId, FunctionSignature>,
    call_graph: PtaCallGraph,
    indirect_calls: Vec<IndirectCallSite>,
    forks: Vec<ForkSite>,
    joins: Vec<JoinSite>,
    call_ids: FxHashSet<CallInstId>,
    skipped_regions: Vec<SkippedRegion>,
    stats: BuildStats,
}

impl ConstraintGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Nodes
    // ═══════════════════════════════════════════════════════════════════════

    pub fn add_value(&mut self, name: &str) -> NodeId {
        self.graph.add_value(Some(name))
    }

    pub fn add_object(&mut self, name: &str, meta: ObjectMeta) -> NodeId {
        self.graph.add_object(Some(name), meta)
    }

    /// Register a function object with its formal interface
    pub fn add_function(
        &mut self,
        name: &str,
        signature: FunctionSignature,
    ) -> GraphResult<NodeId> {
        let interface = signature
            .formals
            .iter()
            .chain(signature.ret.iter())
            .chain(signature.vararg.iter());
        for &node in interface {
            self.expect_value(node, "function interface")?;
        }

        let id = self.graph.add_object(Some(name), ObjectMeta::function());
        let signature = FunctionSignature {
            name: name.to_string(),
            ..signature
        };
        self.signatures.insert(id, signature);
        self.stats.functions += 1;
        Ok(id)
    }

    #[inline]
    pub fn null_ptr(&self) -> NodeId {
        NULL_PTR
    }

    #[inline]
    pub fn black_hole(&self) -> NodeId {
        BLACK_HOLE
    }

    #[inline]
    pub fn constant_obj(&self) -> NodeId {
        CONSTANT_OBJ
    }

    /// Value pointing to the black hole, for unknown external results
    #[inline]
    pub fn blk_ptr(&self) -> NodeId {
        BLK_PTR
    }

    pub fn graph(&self) -> &ConstraintGraph {
        &self.graph
    }

    pub fn skipped_regions(&self) -> &[SkippedRegion] {
        &self.skipped_regions
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Regions
    // ═══════════════════════════════════════════════════════════════════════

    /// Validate and apply a region
    ///
    /// A rejected region is recorded in `skipped_regions` and nothing of it is applied.
    pub fn add_region(&mut self, region: ConstraintRegion) -> GraphResult<()> {
        if let Err(error) = self.validate_region(&region) {
            warn!(region = %region.name, error = %error, "skipping malformed constraint region");
            self.skipped_regions.push(SkippedRegion {
                name: region.name,
                error: error.clone(),
            });
            return Err(error);
        }
        self.apply_region(region)
    }

    /// Apply a single constraint outside any region
    pub fn add_constraint(&mut self, constraint: Constraint) -> GraphResult<bool> {
        self.validate_constraint(&constraint)?;
        self.stats.constraints += 1;
        if constraint.is_complex() {
            self.stats.complex_constraints += 1;
        }
        self.graph.add_edge(constraint.kind, constraint.src, constraint.dst)
    }

    /// Apply constraints one by one; stops at the first invalid one
    ///
    /// Returns how many were new.
    pub fn add_constraints(
        &mut self,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> GraphResult<usize> {
        let mut inserted = 0;
        for constraint in constraints {
            if self.add_constraint(constraint)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    pub fn build(self) -> ConstraintProgram {
        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            regions = self.stats.regions,
            skipped = self.skipped_regions.len(),
            "constraint program built"
        );
        ConstraintProgram {
            graph: self.graph,
            signatures: self.signatures,
            call_graph: self.call_graph,
            indirect_calls: self.indirect_calls,
            forks: self.forks,
            joins: self.joins,
            skipped_regions: self.skipped_regions,
            stats: self.stats,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Validation
    // ═══════════════════════════════════════════════════════════════════════

    fn expect_node(&self, node: NodeId) -> GraphResult<()> {
        self.graph.node(node).map(|_| ())
    }

    fn expect_value(&self, node: NodeId, context: &'static str) -> GraphResult<()> {
        if self.graph.node(node)?.is_value() {
            Ok(())
        } else {
            Err(ConstraintGraphError::ExpectedValue { node, context })
        }
    }

    fn validate_constraint(&self, constraint: &Constraint) -> GraphResult<()> {
        self.expect_node(constraint.src)?;
        self.expect_node(constraint.dst)?;
        if constraint.kind == EdgeKind::Addr && !self.graph.is_object(constraint.dst) {
            return Err(ConstraintGraphError::ExpectedObject {
                node: constraint.dst,
                context: "address-of target",
            });
        }
        Ok(())
    }

    fn validate_region(&self, region: &ConstraintRegion) -> GraphResult<()> {
        for constraint in region.constraints.iter() {
            self.validate_constraint(constraint)?;
        }

        let mut seen = FxHashSet::default();
        for id in region.call_ids() {
            if self.call_ids.contains(&id) || !seen.insert(id) {
                return Err(ConstraintGraphError::DuplicateCallSite(id));
            }
        }

        for call in &region.direct_calls {
            let signature = self
                .signatures
                .get(&call.callee)
                .ok_or(ConstraintGraphError::UnknownFunction(call.callee))?;
            if !signature.accepts(call.args.len()) {
                return Err(ConstraintGraphError::ArityMismatch {
                    call: call.id,
                    expected: signature.formals.len(),
                    found: call.args.len(),
                });
            }
            self.validate_call_values(call.caller, &call.args, call.ret)?;
        }
        for call in &region.indirect_calls {
            self.expect_node(call.target)?;
            self.validate_call_values(call.caller, &call.args, call.ret)?;
        }
        for fork in &region.forks {
            self.expect_node(fork.routine)?;
            let values = fork.arg.iter().chain(fork.thread_handle.iter());
            for &node in values {
                self.expect_node(node)?;
            }
            self.validate_caller(fork.caller)?;
        }
        for join in &region.joins {
            self.expect_node(join.thread_handle)?;
            self.validate_caller(join.caller)?;
        }
        Ok(())
    }

    fn validate_call_values(
        &self,
        caller: Option<NodeId>,
        args: &[NodeId],
        ret: Option<NodeId>,
    ) -> GraphResult<()> {
        for &node in args.iter().chain(ret.iter()) {
            self.expect_node(node)?;
        }
        self.validate_caller(caller)
    }

    fn validate_caller(&self, caller: Option<NodeId>) -> GraphResult<()> {
        match caller {
            Some(f) if !self.signatures.contains_key(&f) => {
                Err(ConstraintGraphError::UnknownFunction(f))
            }
            _ => Ok(()),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Application
    // ═══════════════════════════════════════════════════════════════════════

    fn apply_region(&mut self, region: ConstraintRegion) -> GraphResult<()> {
        let ids: Vec<CallInstId> = region.call_ids().collect();
        self.call_ids.extend(ids);

        for constraint in region.constraints.iter() {
            self.graph.add_edge(constraint.kind, constraint.src, constraint.dst)?;
        }
        for call in &region.direct_calls {
            self.apply_direct_call(call)?;
        }

        self.stats.regions += 1;
        self.stats.constraints += region.constraints.len();
        self.stats.complex_constraints += region.constraints.complex_count();
        self.stats.malformed_geps += region.malformed_geps;
        self.stats.direct_calls += region.direct_calls.len();
        self.stats.indirect_calls += region.indirect_calls.len();
        self.stats.thread_sites += region.forks.len() + region.joins.len();
        if region.malformed_geps > 0 {
            debug!(
                region = %region.name,
                count = region.malformed_geps,
                "geps without offset metadata treated as variant"
            );
        }

        self.indirect_calls.extend(region.indirect_calls);
        self.forks.extend(region.forks);
        self.joins.extend(region.joins);
        Ok(())
    }

    fn apply_direct_call(&mut self, call: &DirectCallSite) -> GraphResult<()> {
        let signature = self
            .signatures
            .get(&call.callee)
            .ok_or(ConstraintGraphError::UnknownFunction(call.callee))?
            .clone();
        let Some(call_site) =
            self.call_graph
                .add_edge(call.id, call.caller, call.callee, CallGraphEdgeKind::Direct)
        else {
            return Ok(());
        };

        let binding = bind_params(&call.args, call.ret, &signature);
        if binding.dropped_args > 0 {
            self.stats.dropped_args += binding.dropped_args;
            warn!(
                call = call.id,
                callee = %signature.name,
                extra = binding.dropped_args,
                "too many arguments for callee, extra arguments ignored"
            );
        }
        for (src, dst) in binding.copies {
            self.graph.add_call_copy_edge(src, dst, call_site)?;
        }

        if signature.heap_allocator {
            if let Some(ret) = call.ret {
                let name = format!("{}@{}", signature.name, call.id);
                let object = self.graph.add_object(Some(&name), ObjectMeta::heap(0));
                self.graph.add_addr_edge(ret, object)?;
            }
        }
        Ok(())
    }
}
