//! Points-to call graph
//!
//! Edges connect a call instruction to a function object. Each
//! `(instruction, callee, kind)` triple is stored once and gets a fresh
//! [`CallSiteId`], which tags the parameter copies created for it.

use crate::features::points_to::domain::{CallInstId, CallSiteId, NodeId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// How a call edge was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallGraphEdgeKind {
    /// Statically known callee
    Direct,
    /// Resolved through a function pointer
    Indirect,
    /// Thread creation running the callee
    ThreadFork,
    /// Thread join waiting for the callee
    ThreadJoin,
    /// Parallel-for body
    ParallelFor,
}

impl CallGraphEdgeKind {
    /// Direct and indirect calls (as opposed to thread edges)
    #[inline]
    pub fn is_call(&self) -> bool {
        matches!(self, Self::Direct | Self::Indirect)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Indirect => "indirect",
            Self::ThreadFork => "fork",
            Self::ThreadJoin => "join",
            Self::ParallelFor => "parallel_for",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphEdge {
    pub call_site: CallSiteId,
    pub inst: CallInstId,
    /// Function containing the instruction, when known
    pub caller: Option<NodeId>,
    pub callee: NodeId,
    pub kind: CallGraphEdgeKind,
}

/// Call graph built while solving
#[derive(Debug, Clone, Default)]
pub struct PtaCallGraph {
    edges: Vec<CallGraphEdge>,
    index: FxHashMap<(CallInstId, NodeId, CallGraphEdgeKind), usize>,
    /// Instruction → edge indices
    by_inst: FxHashMap<CallInstId, Vec<usize>>,
    /// Callee → edge indices
    by_callee: FxHashMap<NodeId, Vec<usize>>,
}

impl PtaCallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge. Returns its fresh ID, or None if it already exists.
    pub fn add_edge(
        &mut self,
        inst: CallInstId,
        caller: Option<NodeId>,
        callee: NodeId,
        kind: CallGraphEdgeKind,
    ) -> Option<CallSiteId> {
        if self.index.contains_key(&(inst, callee, kind)) {
            return None;
        }
        let idx = self.edges.len();
        let call_site = idx as CallSiteId;
        self.edges.push(CallGraphEdge {
            call_site,
            inst,
            caller,
            callee,
            kind,
        });
        self.index.insert((inst, callee, kind), idx);
        self.by_inst.entry(inst).or_default().push(idx);
        self.by_callee.entry(callee).or_default().push(idx);
        Some(call_site)
    }

    pub fn has_edge(&self, inst: CallInstId, callee: NodeId, kind: CallGraphEdgeKind) -> bool {
        self.index.contains_key(&(inst, callee, kind))
    }

    /// Functions called (directly or indirectly) at `inst`, ascending
    pub fn callees(&self, inst: CallInstId) -> Vec<NodeId> {
        self.targets(inst, CallGraphEdgeKind::is_call)
    }

    /// Targets of any edge kind at `inst`, ascending
    pub fn targets(
        &self,
        inst: CallInstId,
        filter: impl Fn(&CallGraphEdgeKind) -> bool,
    ) -> Vec<NodeId> {
        let mut callees: Vec<NodeId> = self
            .by_inst
            .get(&inst)
            .into_iter()
            .flatten()
            .map(|&idx| &self.edges[idx])
            .filter(|e| filter(&e.kind))
            .map(|e| e.callee)
            .collect();
        callees.sort_unstable();
        callees.dedup();
        callees
    }

    /// ID of the call edge from `inst` to `callee`
    pub fn call_site_id(&self, inst: CallInstId, callee: NodeId) -> Option<CallSiteId> {
        [CallGraphEdgeKind::Direct, CallGraphEdgeKind::Indirect]
            .iter()
            .find_map(|&kind| self.index.get(&(inst, callee, kind)))
            .map(|&idx| self.edges[idx].call_site)
    }

    /// Call instructions reaching `function` through call edges, ascending
    pub fn callers_of(&self, function: NodeId) -> Vec<CallInstId> {
        let mut insts: Vec<CallInstId> = self
            .by_callee
            .get(&function)
            .into_iter()
            .flatten()
            .map(|&idx| &self.edges[idx])
            .filter(|e| e.kind.is_call())
            .map(|e| e.inst)
            .collect();
        insts.sort_unstable();
        insts.dedup();
        insts
    }

    /// All edges, in insertion order
    pub fn edges(&self) -> &[CallGraphEdge] {
        &self.edges
    }

    pub fn edges_of_kind(
        &self,
        kind: CallGraphEdgeKind,
    ) -> impl Iterator<Item = &CallGraphEdge> + '_ {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_edges_of_kind(&self, kind: CallGraphEdgeKind) -> usize {
        self.edges_of_kind(kind).count()
    }
}
