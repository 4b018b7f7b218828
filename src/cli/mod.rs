//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler implements the business logic for a specific CLI subcommand
//! and returns the process exit code it wants.

mod batch;
mod evaluate;
mod parse;
mod reconstruct;

pub use batch::run_batch;
pub use evaluate::run_evaluate;
pub use parse::run_parse;
pub use reconstruct::run_reconstruct;

use crate::config::AppConfig;
use crate::model::FormatKind;
use crate::pipeline::Evaluator;
use crate::quality::ThresholdSet;
use anyhow::{bail, Result};

/// Parse a `--format` override from its CLI spelling.
pub fn parse_format_override(name: &str) -> Result<FormatKind> {
    match name.to_lowercase().as_str() {
        "eds" => Ok(FormatKind::Eds),
        "iodd" | "xml" => Ok(FormatKind::Iodd),
        _ => bail!("Unknown format: {name}. Valid options: eds, iodd"),
    }
}

/// Build the evaluator a command runs with from the effective config.
fn build_evaluator(app: &AppConfig) -> Evaluator {
    Evaluator::new()
        .with_weights(app.scoring.weights)
        .with_thresholds(app.thresholds.clone())
        .with_synonyms(app.synonym_table())
        .include_formatting(app.scoring.include_formatting)
}

/// Resolve a `--gate` phase name to its rank in the configured rule order.
fn resolve_gate(thresholds: &ThresholdSet, gate: &str) -> Result<usize> {
    thresholds.rank(gate).ok_or_else(|| {
        let labels: Vec<&str> = thresholds.labels().collect();
        anyhow::anyhow!(
            "Unknown gate phase: {gate}. Configured phases: {}",
            labels.join(", ")
        )
    })
}

/// True when an achieved phase ranks at least as well as the gate.
fn phase_meets_gate(thresholds: &ThresholdSet, phase: Option<&str>, gate_rank: usize) -> bool {
    phase
        .and_then(|p| thresholds.rank(p))
        .is_some_and(|rank| rank <= gate_rank)
}
