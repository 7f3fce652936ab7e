/*
 * Codegraph PTA - Constraint-Graph Points-to Engine
 *
 * Feature-First Hexagonal Architecture:
 * - features/points_to/ : domain → infrastructure (solver) → application (driver)
 * - config/             : Presets + YAML overrides
 * - errors              : Crate-level error type
 *
 * Performance:
 * - Diff propagation + SCC collapse
 * - Rayon across independent programs
 */

// Crate-level lint configuration
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::should_implement_trait)] // from_str naming intentional
#![allow(clippy::derivable_impls)] // Manual impl for documentation

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Configuration system (presets, builder, YAML)
pub mod config;

/// Error types
pub mod errors;

/// Feature modules
pub mod features;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{ConfigError, Preset, PtaConfig, WorklistOrder};
pub use errors::{PtaError, Result};
pub use features::points_to::{
    analyze_batch, AliasResult, AndersenAnalysis, Constraint, ConstraintGraphBuilder,
    ConstraintProgram, ConstraintRegion, NodeId, ObjectMeta, PointsToQuery,
};
