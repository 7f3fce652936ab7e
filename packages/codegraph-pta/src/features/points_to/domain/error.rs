//! Structural errors at the constraint-graph boundary

use super::call_site::CallInstId;
use super::edge::{EdgeId, EdgeKind};
use super::node::NodeId;
use thiserror::Error;

/// Input-integrity violation detected while building or mutating the graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintGraphError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {node} must be an object ({context})")]
    ExpectedObject { node: NodeId, context: &'static str },

    #[error("node {node} must be a value variable ({context})")]
    ExpectedValue { node: NodeId, context: &'static str },

    #[error("duplicate {kind} edge {src} -> {dst}")]
    DuplicateEdge {
        src: NodeId,
        dst: NodeId,
        kind: EdgeKind,
    },

    #[error("edge {0} does not exist")]
    EdgeNotFound(EdgeId),

    #[error("node {0} is not a registered function")]
    UnknownFunction(NodeId),

    #[error("call instruction {0} registered twice")]
    DuplicateCallSite(CallInstId),

    #[error("call {call} passes {found} arguments, callee expects {expected}")]
    ArityMismatch {
        call: CallInstId,
        expected: usize,
        found: usize,
    },
}

/// Result alias for graph construction
pub type GraphResult<T> = Result<T, ConstraintGraphError>;
