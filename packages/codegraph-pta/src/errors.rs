//! Error types for codegraph-pta
//!
//! Provides unified error handling across the crate.

use crate::config::ConfigError;
use crate::features::points_to::domain::ConstraintGraphError;
use thiserror::Error;

/// Main error type for points-to analysis operations
#[derive(Debug, Error)]
pub enum PtaError {
    /// Malformed constraint input
    #[error("Constraint graph error: {0}")]
    Graph(#[from] ConstraintGraphError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Analysis error
    #[error("Analysis error: {0}")]
    Analysis(String),
}

impl PtaError {
    /// Create an analysis error
    pub fn analysis(msg: impl Into<String>) -> Self {
        PtaError::Analysis(msg.into())
    }
}

/// Result type alias for points-to operations
pub type Result<T> = std::result::Result<T, PtaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_graph_error() {
        let err: PtaError = ConstraintGraphError::UnknownNode(7).into();
        assert!(matches!(err, PtaError::Graph(ConstraintGraphError::UnknownNode(7))));
        assert_eq!(err.to_string(), "Constraint graph error: unknown node 7");
    }

    #[test]
    fn test_analysis_error() {
        let err = PtaError::analysis("empty batch");
        assert_eq!(err.to_string(), "Analysis error: empty batch");
    }
}
