//! On-the-fly Indirect Call Resolution
//!
//! Function pointers are resolved as their points-to sets grow:
//! after each propagation round, every indirect call site looks at the
//! function objects its target may point to and wires new callees in with
//! call-site tagged parameter/return copies. New copies propagate right away,
//! so the next round picks them up.
//!
//! Thread sites (fork, join, parallel-for) are resolved once, after the
//! fixpoint, and only add call-graph edges.
//!
//! # References
//! - Lhoták & Hendren "Scaling Java Points-to Analysis Using Spark" (CC 2003)
//! - Sui & Xue "SVF: Interprocedural Static Value-Flow Analysis in LLVM" (CC 2016)

use super::andersen_solver::AndersenSolver;
use super::call_graph::{CallGraphEdgeKind, PtaCallGraph};
use crate::features::points_to::domain::{
    CallInstId, CallSiteId, ForkKind, ForkSite, FunctionSignature, IndirectCallSite, JoinSite,
    NodeId, ObjectMeta,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

/// Copies binding a call's actuals to a callee's formals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamBinding {
    /// `(src, dst)` copy edges
    pub copies: Vec<(NodeId, NodeId)>,
    /// Actual arguments with no formal and no vararg node to receive them
    pub dropped_args: usize,
}

/// Pair actual arguments and the return value with a callee's signature
///
/// Extra arguments flow into the vararg node when the callee has one.
pub fn bind_params(
    args: &[NodeId],
    ret: Option<NodeId>,
    callee: &FunctionSignature,
) -> ParamBinding {
    let mut binding = ParamBinding::default();
    for (&arg, &formal) in args.iter().zip(&callee.formals) {
        binding.copies.push((arg, formal));
    }
    let extra = args.iter().skip(callee.formals.len());
    match callee.vararg {
        Some(vararg) => binding.copies.extend(extra.map(|&arg| (arg, vararg))),
        None => binding.dropped_args = extra.count(),
    }
    if let (Some(formal_ret), Some(actual_ret)) = (callee.ret, ret) {
        binding.copies.push((formal_ret, actual_ret));
    }
    binding
}

#[derive(Debug, Clone, Default)]
pub struct ResolverStats {
    pub resolve_calls: usize,
    pub indirect_edges: usize,
    pub param_copies: usize,
    /// Candidate callees skipped because of an argument count mismatch
    pub arity_mismatches: usize,
    pub too_many_args: usize,
    pub heap_objects: usize,
    pub fork_edges: usize,
    pub join_edges: usize,
    pub parallel_for_edges: usize,
    pub limit_reached: bool,
}

/// Resolves indirect calls against the solver's points-to sets
#[derive(Debug, Clone)]
pub struct OnTheFlyResolver {
    /// Keyed by function object
    signatures: FxHashMap<NodeId, FunctionSignature>,
    indirect_sites: Vec<IndirectCallSite>,
    forks: Vec<ForkSite>,
    joins: Vec<JoinSite>,
    call_graph: PtaCallGraph,

    /// (site, callee) pairs already examined, including rejected ones
    seen: FxHashSet<(CallInstId, NodeId)>,
    indirect_call_limit: usize,
    stats: ResolverStats,
}

impl OnTheFlyResolver {
    pub fn new(
        signatures: FxHashMap<NodeId, FunctionSignature>,
        call_graph: PtaCallGraph,
        indirect_call_limit: usize,
    ) -> Self {
        Self {
            signatures,
            indirect_sites: Vec::new(),
            forks: Vec::new(),
            joins: Vec::new(),
            call_graph,
            seen: FxHashSet::default(),
            indirect_call_limit,
            stats: ResolverStats::default(),
        }
    }

    pub fn with_indirect_sites(mut self, sites: Vec<IndirectCallSite>) -> Self {
        self.indirect_sites = sites;
        self
    }

    pub fn with_thread_sites(mut self, forks: Vec<ForkSite>, joins: Vec<JoinSite>) -> Self {
        self.forks = forks;
        self.joins = joins;
        self
    }

    #[inline]
    pub fn call_graph(&self) -> &PtaCallGraph {
        &self.call_graph
    }

    #[inline]
    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    pub fn signature(&self, function: NodeId) -> Option<&FunctionSignature> {
        self.signatures.get(&function)
    }

    pub fn indirect_sites(&self) -> &[IndirectCallSite] {
        &self.indirect_sites
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Indirect calls
    // ═══════════════════════════════════════════════════════════════════════

    /// Connect newly discovered callees of every indirect site
    ///
    /// Returns true if any call edge was added.
    pub fn resolve(&mut self, solver: &mut AndersenSolver) -> bool {
        self.stats.resolve_calls += 1;
        let mut changed = false;

        for idx in 0..self.indirect_sites.len() {
            let site = self.indirect_sites[idx].clone();
            let candidates: Vec<NodeId> = solver
                .points_to(site.target)
                .iter()
                .filter(|f| self.signatures.contains_key(f))
                .collect();

            for callee in candidates {
                if !self.seen.insert((site.id, callee)) {
                    continue;
                }
                if self.stats.indirect_edges >= self.indirect_call_limit {
                    if !self.stats.limit_reached {
                        self.stats.limit_reached = true;
                        warn!(
                            limit = self.indirect_call_limit,
                            "indirect call limit reached, further targets ignored"
                        );
                    }
                    return changed;
                }
                changed |= self.connect_callee(solver, &site, callee);
            }
        }
        changed
    }

    fn connect_callee(
        &mut self,
        solver: &mut AndersenSolver,
        site: &IndirectCallSite,
        callee: NodeId,
    ) -> bool {
        let Some(signature) = self.signatures.get(&callee) else {
            return false;
        };
        if !signature.accepts(site.args.len()) {
            self.stats.arity_mismatches += 1;
            debug!(
                call = site.id,
                callee = %signature.name,
                args = site.args.len(),
                formals = signature.formals.len(),
                "skipping callee with mismatched arity"
            );
            return false;
        }

        let Some(call_site) =
            self.call_graph
                .add_edge(site.id, site.caller, callee, CallGraphEdgeKind::Indirect)
        else {
            return false;
        };
        self.stats.indirect_edges += 1;
        debug!(
            call = site.id,
            callee = %signature.name,
            call_site = call_site,
            "resolved indirect call"
        );

        let signature = signature.clone();
        self.connect_caller_to_callee_params(solver, site, &signature, call_site);
        true
    }

    fn connect_caller_to_callee_params(
        &mut self,
        solver: &mut AndersenSolver,
        site: &IndirectCallSite,
        callee: &FunctionSignature,
        call_site: CallSiteId,
    ) {
        let binding = bind_params(&site.args, site.ret, callee);
        if binding.dropped_args > 0 {
            self.stats.too_many_args += 1;
            warn!(
                call = site.id,
                callee = %callee.name,
                extra = binding.dropped_args,
                "too many arguments for callee, extra arguments ignored"
            );
        }
        for (src, dst) in binding.copies {
            if solver.add_call_copy_edge(src, dst, call_site) {
                self.stats.param_copies += 1;
            }
        }

        if callee.heap_allocator {
            if let Some(ret) = site.ret {
                let mut meta = ObjectMeta::heap(0);
                if !solver.config().field_sensitive {
                    meta = meta.flat();
                }
                let name = format!("{}@{}", callee.name, site.id);
                let object = solver.graph_mut().add_object(Some(&name), meta);
                solver.add_addr_edge(ret, object);
                self.stats.heap_objects += 1;
            }
        }
    }

    /// Indirect sites without any resolved callee
    pub fn unresolved_sites(&self) -> Vec<CallInstId> {
        self.indirect_sites
            .iter()
            .filter(|site| self.call_graph.callees(site.id).is_empty())
            .map(|site| site.id)
            .collect()
    }

    /// Log unresolved sites; returns how many there are
    pub fn report_unresolved(&self) -> usize {
        let unresolved = self.unresolved_sites();
        if unresolved.is_empty() {
            return 0;
        }
        for &id in &unresolved {
            debug!(call = id, "indirect call has no resolved callee");
        }
        warn!(
            unresolved = unresolved.len(),
            total = self.indirect_sites.len(),
            "indirect call sites left unresolved"
        );
        unresolved.len()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Thread sites
    // ═══════════════════════════════════════════════════════════════════════

    /// Add fork, parallel-for and join edges from the final points-to sets
    ///
    /// Returns the number of edges added.
    pub fn resolve_thread_edges(&mut self, solver: &AndersenSolver) -> usize {
        let mut added = 0;

        for fork in &self.forks {
            let kind = match fork.kind {
                ForkKind::Fork => CallGraphEdgeKind::ThreadFork,
                ForkKind::ParallelFor => CallGraphEdgeKind::ParallelFor,
            };
            for routine in self.routines_of(solver, fork) {
                if self.call_graph.add_edge(fork.id, fork.caller, routine, kind).is_some() {
                    match kind {
                        CallGraphEdgeKind::ParallelFor => self.stats.parallel_for_edges += 1,
                        _ => self.stats.fork_edges += 1,
                    }
                    added += 1;
                }
            }
        }

        for join in &self.joins {
            let joined = solver.points_to(join.thread_handle);
            if joined.is_empty() {
                continue;
            }
            for fork in self.forks.iter().filter(|f| f.kind == ForkKind::Fork) {
                let Some(handle) = fork.thread_handle else {
                    continue;
                };
                if !solver.points_to(handle).intersects(joined) {
                    continue;
                }
                for routine in self.routines_of(solver, fork) {
                    if self
                        .call_graph
                        .add_edge(join.id, join.caller, routine, CallGraphEdgeKind::ThreadJoin)
                        .is_some()
                    {
                        self.stats.join_edges += 1;
                        added += 1;
                    }
                }
            }
        }

        if added > 0 {
            debug!(edges = added, "resolved thread edges");
        }
        added
    }

    fn routines_of(&self, solver: &AndersenSolver, fork: &ForkSite) -> Vec<NodeId> {
        solver
            .points_to(fork.routine)
            .iter()
            .filter(|f| self.signatures.contains_key(f))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PtaConfig;
    use crate::features::points_to::infrastructure::constraint_graph::ConstraintGraph;

    fn run(solver: &mut AndersenSolver, resolver: &mut OnTheFlyResolver) {
        solver.initialize();
        loop {
            solver.begin_round();
            solver.propagate();
            let reanalyze = solver.take_reanalyze();
            if !resolver.resolve(solver) && !reanalyze {
                break;
            }
        }
    }

    #[test]
    fn test_bind_params_vararg_and_ret() {
        let sig = FunctionSignature::new("printf")
            .with_formals([10])
            .with_vararg(11)
            .with_ret(12);
        let binding = bind_params(&[1, 2, 3], Some(4), &sig);
        assert_eq!(binding.copies, vec![(1, 10), (2, 11), (3, 11), (12, 4)]);
        assert_eq!(binding.dropped_args, 0);

        let fixed = FunctionSignature::new("f").with_formals([10]);
        assert_eq!(bind_params(&[1, 2], None, &fixed).dropped_args, 1);
    }

    #[test]
    fn test_resolves_function_pointer() {
        // fp = &foo; fp(a) with a = &o
        let mut graph = ConstraintGraph::new();
        let (fp, a, formal) = (graph.add_value(None), graph.add_value(None), graph.add_value(None));
        let foo = graph.add_object(Some("foo"), ObjectMeta::function());
        let o = graph.add_object(None, ObjectMeta::stack(0));
        graph.add_addr_edge(fp, foo).unwrap();
        graph.add_addr_edge(a, o).unwrap();

        let mut signatures = FxHashMap::default();
        signatures.insert(foo, FunctionSignature::new("foo").with_formals([formal]));
        let mut resolver = OnTheFlyResolver::new(signatures, PtaCallGraph::new(), 100)
            .with_indirect_sites(vec![IndirectCallSite::new(7, fp).with_args([a])]);
        let mut solver = AndersenSolver::new(graph, PtaConfig::default());
        run(&mut solver, &mut resolver);

        assert_eq!(resolver.call_graph().callees(7), vec![foo]);
        assert!(solver.points_to(formal).contains(o));
        assert!(resolver.unresolved_sites().is_empty());
    }

    #[test]
    fn test_arity_mismatch_skipped() {
        let mut graph = ConstraintGraph::new();
        let (fp, a) = (graph.add_value(None), graph.add_value(None));
        let two = graph.add_value(None);
        let foo = graph.add_object(Some("foo"), ObjectMeta::function());
        graph.add_addr_edge(fp, foo).unwrap();

        let mut signatures = FxHashMap::default();
        signatures.insert(foo, FunctionSignature::new("foo").with_formals([two, two]));
        let mut resolver = OnTheFlyResolver::new(signatures, PtaCallGraph::new(), 100)
            .with_indirect_sites(vec![IndirectCallSite::new(1, fp).with_args([a])]);
        let mut solver = AndersenSolver::new(graph, PtaConfig::default());
        run(&mut solver, &mut resolver);

        assert!(resolver.call_graph().callees(1).is_empty());
        assert_eq!(resolver.stats().arity_mismatches, 1);
        assert_eq!(resolver.unresolved_sites(), vec![1]);
        assert_eq!(resolver.report_unresolved(), 1);
    }

    #[test]
    fn test_heap_allocator_gets_object_per_site() {
        let mut graph = ConstraintGraph::new();
        let (fp, r1, r2) = (graph.add_value(None), graph.add_value(None), graph.add_value(None));
        let malloc = graph.add_object(Some("malloc"), ObjectMeta::function());
        graph.add_addr_edge(fp, malloc).unwrap();

        let mut signatures = FxHashMap::default();
        signatures.insert(malloc, FunctionSignature::new("malloc").heap_allocator());
        let mut resolver = OnTheFlyResolver::new(signatures, PtaCallGraph::new(), 100)
            .with_indirect_sites(vec![
                IndirectCallSite::new(1, fp).with_ret(r1),
                IndirectCallSite::new(2, fp).with_ret(r2),
            ]);
        let mut solver = AndersenSolver::new(graph, PtaConfig::default());
        run(&mut solver, &mut resolver);

        assert_eq!(resolver.stats().heap_objects, 2);
        assert_eq!(solver.points_to(r1).len(), 1);
        assert!(!solver.points_to(r1).intersects(solver.points_to(r2)));
        let obj = solver.points_to(r1).first().unwrap();
        assert!(solver.graph().is_heap(obj));
    }
}
