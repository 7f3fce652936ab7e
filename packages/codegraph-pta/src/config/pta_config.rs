//! Points-to solver configuration

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Upper bound accepted for `max_field_limit`
pub const MAX_FIELD_LIMIT_BOUND: u32 = 1_000_000;

/// Order in which the solver pops pending nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorklistOrder {
    /// First in, first out
    Fifo,
    /// Last in, first out
    Lifo,
}

impl Default for WorklistOrder {
    fn default() -> Self {
        Self::Fifo
    }
}

/// Andersen solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PtaConfig {
    /// Distinguish fields of an object (false = every object is a single blob)
    pub field_sensitive: bool,

    /// Field offsets at or above this collapse the object (1..=1_000_000)
    pub max_field_limit: u32,

    /// Model field 0 as the object itself
    pub first_field_eq_base: bool,

    /// Collapse copy/gep cycles
    pub enable_scc: bool,

    /// Collapse the points-to sets of positive weight cycles
    ///
    /// When off, offsets around a cycle grow until `max_field_limit` flattens the object.
    pub merge_pwc: bool,

    /// Re-run cycle detection after this many derived copy edges (0 = once per round)
    pub scc_batch_threshold: usize,

    pub worklist_order: WorklistOrder,

    /// Max outer rounds (None = run to fixpoint)
    pub max_iterations: Option<usize>,

    /// Max resolved indirect call edges
    pub indirect_call_limit: usize,

    /// Resolve fork/join/parallel-for edges after convergence
    pub resolve_thread_edges: bool,
}

impl PtaConfig {
    /// Builder: Set field_sensitive
    pub fn field_sensitive(mut self, v: bool) -> Self {
        self.field_sensitive = v;
        self
    }

    /// Builder: Set max_field_limit
    pub fn max_field_limit(mut self, v: u32) -> Self {
        self.max_field_limit = v;
        self
    }

    /// Builder: Set first_field_eq_base
    pub fn first_field_eq_base(mut self, v: bool) -> Self {
        self.first_field_eq_base = v;
        self
    }

    /// Builder: Set enable_scc
    pub fn enable_scc(mut self, v: bool) -> Self {
        self.enable_scc = v;
        self
    }

    /// Builder: Set merge_pwc
    pub fn merge_pwc(mut self, v: bool) -> Self {
        self.merge_pwc = v;
        self
    }

    /// Builder: Set scc_batch_threshold
    pub fn scc_batch_threshold(mut self, v: usize) -> Self {
        self.scc_batch_threshold = v;
        self
    }

    /// Builder: Set worklist_order
    pub fn worklist_order(mut self, v: WorklistOrder) -> Self {
        self.worklist_order = v;
        self
    }

    /// Builder: Set max_iterations
    pub fn max_iterations(mut self, v: Option<usize>) -> Self {
        self.max_iterations = v;
        self
    }

    /// Builder: Set indirect_call_limit
    pub fn indirect_call_limit(mut self, v: usize) -> Self {
        self.indirect_call_limit = v;
        self
    }

    /// Builder: Set resolve_thread_edges
    pub fn resolve_thread_edges(mut self, v: bool) -> Self {
        self.resolve_thread_edges = v;
        self
    }

    /// Get preset configuration
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                field_sensitive: false,
                max_field_limit: 64,
                first_field_eq_base: false,
                enable_scc: true,
                merge_pwc: true,
                scc_batch_threshold: 0,
                worklist_order: WorklistOrder::Fifo,
                max_iterations: Some(10),
                indirect_call_limit: 10_000,
                resolve_thread_edges: false,
            },
            Preset::Balanced | Preset::Custom => Self {
                field_sensitive: true,
                max_field_limit: 512,
                first_field_eq_base: false,
                enable_scc: true,
                merge_pwc: true,
                scc_batch_threshold: 0,
                worklist_order: WorklistOrder::Fifo,
                max_iterations: None,
                indirect_call_limit: 50_000,
                resolve_thread_edges: true,
            },
            Preset::Thorough => Self {
                field_sensitive: true,
                max_field_limit: 4096,
                first_field_eq_base: false,
                enable_scc: true,
                merge_pwc: true,
                scc_batch_threshold: 1000,
                worklist_order: WorklistOrder::Fifo,
                max_iterations: None,
                indirect_call_limit: 200_000,
                resolve_thread_edges: true,
            },
        }
    }
}

impl Default for PtaConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for PtaConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_field_limit == 0 || self.max_field_limit > MAX_FIELD_LIMIT_BOUND {
            return Err(ConfigError::range_with_hint(
                "pta.max_field_limit",
                self.max_field_limit,
                1,
                MAX_FIELD_LIMIT_BOUND,
                "At least one field offset must be tracked",
            ));
        }

        if let Some(n) = self.max_iterations {
            if n == 0 {
                return Err(ConfigError::Validation(
                    "pta.max_iterations must be at least 1 or None for unlimited".to_string(),
                ));
            }
        }

        if self.indirect_call_limit == 0 {
            return Err(ConfigError::range_with_hint(
                "pta.indirect_call_limit",
                self.indirect_call_limit,
                1,
                usize::MAX,
                "Use a small limit instead of disabling call resolution",
            ));
        }

        if !self.enable_scc && self.scc_batch_threshold > 0 {
            return Err(ConfigError::Validation(
                "pta.scc_batch_threshold requires enable_scc".to_string(),
            ));
        }

        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "PtaConfig"
    }
}
