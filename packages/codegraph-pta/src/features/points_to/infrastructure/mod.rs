//! Infrastructure layer for Points-to Analysis
//!
//! Algorithm implementations:
//! - **SparseBitmap**: Deferred sorting + batch operations for points-to sets
//! - **RepTable**: SCC representative mapping with O(1) lookups
//! - **ConstraintGraph**: Typed arena graph with per-kind edge buckets
//! - **DiffPointsToData**: Difference propagation store
//! - **SccDetector**: Iterative Tarjan over copy/gep edges
//! - **AndersenSolver**: Field-sensitive inclusion-based solver
//! - **OnTheFlyResolver**: Indirect call and thread edge resolution

pub mod andersen_solver;
pub mod call_graph;
pub mod call_resolver;
pub mod constraint_graph;
pub mod points_to_data;
pub mod rep_table;
pub mod scc_detector;
pub mod sparse_bitmap;
pub mod worklist;

pub use andersen_solver::{AndersenSolver, AndersenStats};
pub use call_graph::{CallGraphEdge, CallGraphEdgeKind, PtaCallGraph};
pub use call_resolver::{bind_params, OnTheFlyResolver, ParamBinding, ResolverStats};
pub use constraint_graph::{ConstraintGraph, EdgeBucket, DEFAULT_MAX_FIELD_LIMIT};
pub use points_to_data::DiffPointsToData;
pub use rep_table::RepTable;
pub use scc_detector::{detect_sccs, SccResult, SccStats};
pub use sparse_bitmap::{PointsTo, SparseBitmap};
pub use worklist::Worklist;
