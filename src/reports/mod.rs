//! Report generation for evaluation results.
//!
//! This module renders pipeline outcomes in two shapes:
//! - JSON: structured data for programmatic integration
//! - Summary: compact shell-friendly output
//!
//! `Auto` resolves to one of the two based on whether stdout is a
//! terminal; see [`crate::pipeline::auto_detect_format`].

mod json;
mod summary;
mod types;

pub use json::JsonReporter;
pub use summary::SummaryReporter;
pub use types::ReportFormat;

use crate::error::Result;
use crate::pipeline::{BatchOutcome, DocumentOutcome};

/// Trait for report generators
pub trait ReportGenerator {
    /// Render one document's pipeline outcome
    fn generate_document_report(&self, outcome: &DocumentOutcome) -> Result<String>;

    /// Render a whole batch
    fn generate_batch_report(&self, batch: &BatchOutcome) -> Result<String>;

    /// Get the format this generator produces
    fn format(&self) -> ReportFormat;
}

/// Create a report generator for the given format
#[must_use]
pub fn create_reporter(format: ReportFormat) -> Box<dyn ReportGenerator> {
    create_reporter_with_options(format, true)
}

/// Create a report generator with color control
#[must_use]
pub fn create_reporter_with_options(
    format: ReportFormat,
    use_color: bool,
) -> Box<dyn ReportGenerator> {
    match format {
        ReportFormat::Auto | ReportFormat::Summary => {
            if use_color {
                Box::new(SummaryReporter::new())
            } else {
                Box::new(SummaryReporter::new().no_color())
            }
        }
        ReportFormat::Json => Box::new(JsonReporter::new()),
    }
}
