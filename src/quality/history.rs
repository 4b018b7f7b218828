//! Append-only quality metric history.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// One scored document, as persisted to history.
///
/// `phase` is stored for display only; it is always re-derivable from the
/// other three numbers through the threshold set that was active, so score
/// and phase cannot drift apart across historical records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetric {
    pub document_id: String,
    pub completeness_score: f64,
    pub error_count: usize,
    pub warning_count: usize,
    pub phase: String,
    pub computed_at: DateTime<Utc>,
}

/// Destination for finished metrics.
///
/// History is write-only from the pipeline's point of view; nothing in the
/// core reads it back to make decisions.
pub trait MetricSink {
    /// Append one metric record.
    fn append(&mut self, metric: &QualityMetric) -> Result<()>;
}

/// JSON-lines file sink, one metric per line.
pub struct JsonlHistorySink {
    writer: Box<dyn Write + Send>,
}

impl JsonlHistorySink {
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }

    /// Open (or create) a history file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::new(Box::new(file)))
    }
}

impl MetricSink for JsonlHistorySink {
    fn append(&mut self, metric: &QualityMetric) -> Result<()> {
        serde_json::to_writer(&mut self.writer, metric)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
