//! Batch analysis of independent programs
//!
//! Each program gets its own [`AndersenAnalysis`]; runs share nothing and are
//! spread over the rayon pool. A single fixpoint is always sequential.
//!
//! # Use Cases
//! - Many translation units or plugins analyzed in one CI job
//! - Benchmark sweeps over configurations

use super::analyzer::{AnalysisStats, AndersenAnalysis};
use super::builder::ConstraintProgram;
use crate::config::PtaConfig;
use crate::errors::Result;
use rayon::prelude::*;
use std::time::Instant;
use tracing::info;

/// Solved analysis of one batch entry
#[derive(Debug)]
pub struct BatchOutcome {
    /// Position of the program in the input
    pub index: usize,
    pub analysis: AndersenAnalysis,
}

impl BatchOutcome {
    #[inline]
    pub fn stats(&self) -> &AnalysisStats {
        self.analysis.stats()
    }
}

/// Solve every program in parallel; results keep the input order
pub fn analyze_batch(
    programs: Vec<ConstraintProgram>,
    config: &PtaConfig,
) -> Vec<Result<BatchOutcome>> {
    let start = Instant::now();
    let count = programs.len();

    let outcomes: Vec<Result<BatchOutcome>> = programs
        .into_par_iter()
        .enumerate()
        .map(|(index, program)| {
            let mut analysis = AndersenAnalysis::new(program, config.clone())?;
            analysis.solve();
            Ok(BatchOutcome { index, analysis })
        })
        .collect();

    info!(
        programs = count,
        failed = outcomes.iter().filter(|o| o.is_err()).count(),
        threads = rayon::current_num_threads(),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "batch analysis finished"
    );
    outcomes
}
