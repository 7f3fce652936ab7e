//! Domain models for Points-to Analysis
//!
//! Algorithm-independent vocabulary:
//! - Node/Edge: typed constraint-graph variables and inclusion edges
//! - Constraint: input triples fed by the IR builder
//! - CallSite: indirect/direct/thread call descriptions
//! - AliasResult: alias query verdicts

pub mod alias;
pub mod call_site;
pub mod constraint;
pub mod edge;
pub mod error;
pub mod node;

pub use alias::AliasResult;
pub use call_site::{
    CallInstId, CallSiteId, DirectCallSite, ForkKind, ForkSite, FunctionSignature,
    IndirectCallSite, JoinSite,
};
pub use constraint::{Constraint, ConstraintSet};
pub use edge::{ConstraintEdge, EdgeClass, EdgeId, EdgeKey, EdgeKind};
pub use error::{ConstraintGraphError, GraphResult};
pub use node::{
    ConstraintNode, NodeId, NodeKind, ObjectKind, ObjectMeta, BLACK_HOLE, BLK_PTR, CONSTANT_OBJ,
    NULL_PTR, RESERVED_NODES,
};
