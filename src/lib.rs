//! **A library for round-tripping industrial device descriptions.**
//!
//! `devdesc-tools` parses the two device description dialects found in
//! industrial automation, sectioned `key = value;` text (EDS) and XML
//! device descriptions (IODD), into one normalized model, renders that
//! model back into dialect text, and measures how much of the original
//! document survives the round trip. It powers both a command-line tool
//! for CI gating of vendor file drops and a Rust library for programmatic
//! integration.
//!
//! ## Key Features
//!
//! - **Tolerant Parsing**: Ingests EDS and IODD files with automatic
//!   format detection. Recoverable problems become diagnostics instead of
//!   failures, so one malformed entry never hides the rest of a file.
//! - **Normalized Model**: Both dialects land in the same
//!   [`NormalizedDevice`] shape (identity, parameters, enumerations,
//!   assemblies, connections, text tables), with unrecognized content
//!   preserved verbatim for replay.
//! - **Deterministic Reconstruction**: The [`Reconstructor`] renders a
//!   model back into its source dialect. Re-parsing the output yields an
//!   equal model; vendor key spellings and opaque sections are replayed
//!   as written.
//! - **Round-Trip Scoring**: The [`Evaluator`] diffs the original against
//!   its re-parsed reconstruction and scores completeness 0-100, then
//!   assigns a rollout phase (production, candidate, review, quarantine)
//!   from configurable thresholds.
//! - **Parallel Batches**: The [`PipelineRunner`] drives whole vendor
//!   drops through parse → reconstruct → diff → score → persist on a
//!   rayon worker pool, appending per-document metrics to JSONL history.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: The central data structures: [`NormalizedDevice`],
//!   [`RawDocument`], [`Diagnostic`]. Whatever the input dialect, parsing
//!   produces this one shape.
//! - **[`parsers`]**: Format detection and the two dialect parsers.
//!   [`parse_device`] is the common entry point.
//! - **[`reconstruct`]**: Renders models back to text.
//! - **[`diff`]**: The [`DiffEngine`] compares two models structurally and
//!   classifies every difference as missing, mismatched, extra or
//!   formatting-only.
//! - **[`quality`]**: Scoring weights, phase thresholds and the metric
//!   history sink.
//! - **[`pipeline`]**: The [`Evaluator`] and [`PipelineRunner`] that tie
//!   the stages together, plus output plumbing for the CLI.
//!
//! ## Getting Started: Parsing a Device Description
//!
//! ```no_run
//! use std::path::Path;
//! use devdesc_tools::parse_device;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outcome = parse_device(Path::new("path/to/drive.eds"))?;
//!
//!     println!(
//!         "Parsed '{}' with {} typed fields and {} parameters.",
//!         outcome.model.identity.product_name.as_ref().and_then(|s| s.as_text()).unwrap_or("unknown"),
//!         outcome.model.typed_field_count(),
//!         outcome.model.params.len()
//!     );
//!     for diagnostic in &outcome.diagnostics {
//!         println!("  {diagnostic}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Examples
//!
//! ### Scoring Round-Trip Fidelity
//!
//! The [`Evaluator`] reconstructs a parsed document, re-parses the result
//! and scores the difference.
//!
//! ```no_run
//! use devdesc_tools::{parse_device_with_format, Evaluator, FormatKind, RawDocument};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let text = std::fs::read_to_string("drive.eds")?;
//!     let document = RawDocument::new("drive.eds", FormatKind::Eds, text);
//!     let outcome = parse_device_with_format(&document.content, document.format)?;
//!
//!     let evaluator = Evaluator::new();
//!     let report = evaluator.evaluate(&document, &outcome)?;
//!
//!     println!("Score: {:.1}", report.metric.completeness_score);
//!     println!("Phase: {}", report.metric.phase);
//!     for entry in &report.diff.entries {
//!         println!("  {entry}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Evaluating a Whole Vendor Drop
//!
//! The [`PipelineRunner`] processes batches in parallel and aggregates
//! phase counts.
//!
//! ```no_run
//! use devdesc_tools::{FormatKind, PipelineRunner, RawDocument};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let documents = vec![
//!         RawDocument::new("a.eds", FormatKind::Eds, std::fs::read_to_string("a.eds")?),
//!         RawDocument::new("b.xml", FormatKind::Iodd, std::fs::read_to_string("b.xml")?),
//!     ];
//!
//!     let runner = PipelineRunner::new().jobs(Some(4));
//!     let batch = runner.run_batch(&documents, None)?;
//!
//!     println!("{}/{} documents scored", batch.summary.total - batch.summary.failed,
//!         batch.summary.total);
//!     for (phase, count) in &batch.summary.phase_counts {
//!         println!("  {phase:<12} {count}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Command-Line Interface (CLI)
//!
//! This documentation is for the `devdesc-tools` library crate. If you are
//! looking for the command-line tool, please refer to the project's README
//! or install it via `cargo install devdesc-tools`.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
// Pedantic lints: allow categories that are design choices for this codebase
#![allow(
    // Cast safety: usize→f64 casts appear throughout scoring and batch
    // statistics; entry counts are bounded in practice
    clippy::cast_precision_loss,
    // Doc completeness: # Errors / # Panics sections are not maintained
    // for every fallible fn
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    // Parser and writer state machines are inherently long
    clippy::too_many_lines,
    // Variable names like `old`/`new` or `params`/`param` are clear in context
    clippy::similar_names
)]

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod parsers;
pub mod pipeline;
pub mod quality;
pub mod reconstruct;
pub mod reports;
pub mod utils;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder};
pub use config::{ConfigError, Validatable};
pub use diff::{DiffEngine, DiffEntry, DiffEntryKind, DiffResult, DiffSummary};
pub use error::{DevDescError, ErrorContext, OptionContext, Result};
pub use model::{
    Diagnostic, FormatKind, NormalizedDevice, RawDocument, ReconstructedDocument, Severity,
};
pub use parsers::{
    parse_device, parse_device_str, parse_device_with_format, DeviceParser, FormatDetector,
    ParseError, ParseOutcome, SynonymTable,
};
pub use pipeline::{
    BatchOutcome, BatchSummary, DocumentOutcome, EvaluationReport, Evaluator, PipelineRunner,
    PipelineStage,
};
pub use quality::{
    JsonlHistorySink, MetricSink, QualityMetric, QualityScorer, ScoreWeights, ThresholdRule,
    ThresholdSet,
};
pub use reconstruct::{reconstruct, Reconstructor};
pub use reports::{ReportFormat, ReportGenerator};
