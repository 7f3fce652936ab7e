//! Ports (Interfaces) for Points-to Analysis
//!
//! - **ConstraintSource**: inbound, lets an IR frontend feed the builder
//! - **PointsToQuery**: outbound, the client query surface
//!
//! # Example (Generic - Zero-cost)
//! ```ignore
//! fn report<Q: PointsToQuery>(query: &Q, a: NodeId, b: NodeId) -> bool {
//!     query.may_alias(a, b)
//! }
//! ```

use crate::features::points_to::application::ConstraintGraphBuilder;
use crate::features::points_to::domain::{AliasResult, CallInstId, GraphResult, NodeId};

/// Produces constraints for a program
pub trait ConstraintSource {
    /// Add this source's nodes, regions and functions to `builder`
    fn populate(&self, builder: &mut ConstraintGraphBuilder) -> GraphResult<()>;
}

/// Queries over a solved analysis
pub trait PointsToQuery {
    /// Objects `node` may point to, ascending
    fn points_to(&self, node: NodeId) -> Vec<NodeId>;

    fn alias(&self, a: NodeId, b: NodeId) -> AliasResult;

    /// Functions a call instruction may invoke
    fn callees(&self, inst: CallInstId) -> Vec<NodeId>;

    fn scc_rep_node(&self, node: NodeId) -> NodeId;

    fn is_field_insensitive(&self, node: NodeId) -> bool;

    fn may_alias(&self, a: NodeId, b: NodeId) -> bool {
        self.alias(a, b).may_alias()
    }

    fn must_alias(&self, a: NodeId, b: NodeId) -> bool {
        self.alias(a, b) == AliasResult::MustAlias
    }
}
