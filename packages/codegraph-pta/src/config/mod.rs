//! Solver Configuration System
//!
//! Two levels:
//! - Level 1: Preset - one-liner for common cases
//! - Level 2: Builder/YAML overrides on top of a preset
//!
//! # Examples
//!
//! ```rust,ignore
//! use codegraph_pta::config::{Preset, PtaConfig};
//!
//! // Level 1: Simple preset
//! let config = PtaConfig::from_preset(Preset::Fast);
//!
//! // Level 2: Override specific knobs
//! let config = PtaConfig::default().max_field_limit(64).merge_pwc(false);
//! let config = PtaConfig::from_yaml("team-pta.yaml")?;
//! ```

pub mod error;
pub mod io;
pub mod preset;
pub mod pta_config;
pub mod validation;

// Re-exports
pub use error::{ConfigError, ConfigResult};
pub use io::ConfigFileV1;
pub use preset::Preset;
pub use pta_config::{PtaConfig, WorklistOrder};
pub use validation::Validatable;
