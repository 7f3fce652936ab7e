//! Application layer for Points-to Analysis
//!
//! High-level APIs:
//! - **ConstraintGraphBuilder**: validated, region-based constraint input
//! - **AndersenAnalysis**: outer driver loop and queries
//! - **analyze_batch**: parallel analysis of independent programs

pub mod analyzer;
pub mod batch;
pub mod builder;

pub use analyzer::{AnalysisStats, AndersenAnalysis};
pub use batch::{analyze_batch, BatchOutcome};
pub use builder::{
    BuildStats, ConstraintGraphBuilder, ConstraintProgram, ConstraintRegion, SkippedRegion,
};
