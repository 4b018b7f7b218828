//! JSON report generator.

use super::{ReportFormat, ReportGenerator};
use crate::error::{DevDescError, ReportErrorKind, Result};
use crate::pipeline::{BatchOutcome, DocumentOutcome};
use chrono::Utc;
use serde::Serialize;

/// JSON report generator
pub struct JsonReporter {
    /// Pretty print output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: true }
    }

    /// Set pretty printing
    #[must_use]
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        json.map_err(|e| {
            DevDescError::report(
                "rendering JSON report",
                ReportErrorKind::JsonSerializationError(e.to_string()),
            )
        })
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for JsonReporter {
    fn generate_document_report(&self, outcome: &DocumentOutcome) -> Result<String> {
        self.render(&JsonDocumentReport {
            metadata: JsonReportMetadata::new(),
            document: outcome,
        })
    }

    fn generate_batch_report(&self, batch: &BatchOutcome) -> Result<String> {
        self.render(&JsonBatchReport {
            metadata: JsonReportMetadata::new(),
            summary: batch,
        })
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }
}

// JSON report structures

#[derive(Serialize)]
struct JsonReportMetadata {
    tool: ToolInfo,
    generated_at: String,
}

impl JsonReportMetadata {
    fn new() -> Self {
        Self {
            tool: ToolInfo {
                name: "devdesc-tools".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    version: String,
}

#[derive(Serialize)]
struct JsonDocumentReport<'a> {
    metadata: JsonReportMetadata,
    document: &'a DocumentOutcome,
}

#[derive(Serialize)]
struct JsonBatchReport<'a> {
    metadata: JsonReportMetadata,
    #[serde(flatten)]
    summary: &'a BatchOutcome,
}
