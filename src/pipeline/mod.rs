//! Pipeline orchestration for device description processing.
//!
//! This module drives the parse → reconstruct → diff → score → persist
//! workflow for single documents and parallel batches, reducing
//! duplication across CLI command handlers. Stages advance one way; each
//! document's outcome records the furthest stage it completed.

mod evaluate;
mod ingest;
mod output;
mod runner;

pub use evaluate::{evaluate, EvaluationReport, Evaluator};
pub use ingest::read_document;
pub use output::{auto_detect_format, should_use_color, write_output, OutputTarget};
pub use runner::{BatchOutcome, BatchSummary, DocumentOutcome, PipelineRunner, PipelineStage};

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success - the document met the requested phase gate
    pub const SUCCESS: i32 = 0;
    /// The document scored below the requested phase gate
    pub const GATE_FAILED: i32 = 1;
    /// One or more documents failed before scoring
    pub const PARSE_FAILED: i32 = 2;
    /// An error occurred
    pub const ERROR: i32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_values() {
        assert_eq!(exit_codes::SUCCESS, 0);
        assert_eq!(exit_codes::GATE_FAILED, 1);
        assert_eq!(exit_codes::PARSE_FAILED, 2);
        assert_eq!(exit_codes::ERROR, 3);
    }
}
