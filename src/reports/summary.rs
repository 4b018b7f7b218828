//! Summary report generator for shell output.
//!
//! Provides a compact, human-readable summary for terminal usage.

use super::{ReportFormat, ReportGenerator};
use crate::error::Result;
use crate::pipeline::{BatchOutcome, DocumentOutcome};

/// Apply ANSI color formatting if colored output is enabled.
fn ansi_color(text: &str, color: &str, colored: bool) -> String {
    if colored {
        match color {
            "red" => format!("\x1b[31m{text}\x1b[0m"),
            "green" => format!("\x1b[32m{text}\x1b[0m"),
            "yellow" => format!("\x1b[33m{text}\x1b[0m"),
            "cyan" => format!("\x1b[36m{text}\x1b[0m"),
            "bold" => format!("\x1b[1m{text}\x1b[0m"),
            "dim" => format!("\x1b[2m{text}\x1b[0m"),
            _ => text.to_string(),
        }
    } else {
        text.to_string()
    }
}

/// Color name for a completeness score.
fn score_color(score: f64) -> &'static str {
    if score > 90.0 {
        "green"
    } else if score > 70.0 {
        "yellow"
    } else {
        "red"
    }
}

/// Summary reporter for shell output
pub struct SummaryReporter {
    /// Use colored output
    colored: bool,
    /// Maximum diff entries listed per document
    max_entries: usize,
}

impl SummaryReporter {
    /// Create a new summary reporter
    #[must_use]
    pub const fn new() -> Self {
        Self {
            colored: true,
            max_entries: 10,
        }
    }

    /// Disable colored output
    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.colored = false;
        self
    }

    /// Cap the number of diff entries listed per document
    #[must_use]
    pub const fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        ansi_color(text, color, self.colored)
    }

    fn push_document_lines(&self, lines: &mut Vec<String>, outcome: &DocumentOutcome) {
        lines.push(format!(
            "{}  {}",
            self.color("Document:", "cyan"),
            outcome.document_id
        ));

        let stage = match outcome.stage {
            Some(stage) => stage.label().to_string(),
            None => self.color("failed", "red"),
        };
        lines.push(format!("{}  {stage}", self.color("Stage:", "cyan")));

        if let Some(error) = &outcome.error {
            lines.push(format!(
                "{}  {}",
                self.color("Error:", "cyan"),
                self.color(error, "red")
            ));
        }

        if let Some(report) = &outcome.report {
            let score = report.metric.completeness_score;
            lines.push(format!(
                "{}  {}",
                self.color("Score:", "cyan"),
                self.color(&format!("{score:.1}"), score_color(score))
            ));
            lines.push(format!(
                "{}  {}",
                self.color("Phase:", "cyan"),
                report.metric.phase
            ));

            let errors = report.metric.error_count;
            let warnings = report.metric.warning_count;
            let errors_text = if errors > 0 {
                self.color(&format!("{errors} errors"), "red")
            } else {
                format!("{errors} errors")
            };
            let warnings_text = if warnings > 0 {
                self.color(&format!("{warnings} warnings"), "yellow")
            } else {
                format!("{warnings} warnings")
            };
            lines.push(format!(
                "{}  {errors_text}, {warnings_text}",
                self.color("Parsing:", "cyan")
            ));

            self.push_diff_lines(lines, report);

            if !report.notes.is_empty() {
                lines.push(String::new());
                lines.push(self.color("Notes:", "bold"));
                for note in &report.notes {
                    lines.push(format!("  {}", self.color(&note.message, "yellow")));
                }
            }
        }
    }

    fn push_diff_lines(&self, lines: &mut Vec<String>, report: &crate::pipeline::EvaluationReport) {
        let summary = &report.diff.summary;
        lines.push(String::new());
        lines.push(self.color("Differences:", "bold"));

        if summary.missing > 0 {
            lines.push(format!(
                "  {} missing",
                self.color(&format!("-{}", summary.missing), "red")
            ));
        }
        if summary.value_mismatches > 0 {
            let noun = if summary.value_mismatches == 1 {
                "value mismatch"
            } else {
                "value mismatches"
            };
            lines.push(format!(
                "  {} {noun}",
                self.color(&format!("~{}", summary.value_mismatches), "yellow")
            ));
        }
        if summary.extra > 0 {
            lines.push(format!(
                "  {} extra",
                self.color(&format!("+{}", summary.extra), "green")
            ));
        }
        if summary.formatting_only > 0 {
            lines.push(format!(
                "  {}",
                self.color(&format!("={} formatting only", summary.formatting_only), "dim")
            ));
        }
        if summary.total_changes == 0 && summary.formatting_only == 0 {
            lines.push(format!("  {}", self.color("Lossless round-trip", "dim")));
        }

        let listed = report.diff.entries.len().min(self.max_entries);
        for entry in report.diff.entries.iter().take(listed) {
            let color = match entry.kind {
                crate::diff::DiffEntryKind::Missing => "red",
                crate::diff::DiffEntryKind::ValueMismatch => "yellow",
                crate::diff::DiffEntryKind::Extra => "green",
                crate::diff::DiffEntryKind::FormattingOnly => "dim",
            };
            lines.push(format!("  {}", self.color(&entry.to_string(), color)));
        }
        let remaining = report.diff.entries.len().saturating_sub(listed);
        if remaining > 0 {
            lines.push(format!(
                "  {}",
                self.color(&format!("...and {remaining} more"), "dim")
            ));
        }
    }
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for SummaryReporter {
    fn generate_document_report(&self, outcome: &DocumentOutcome) -> Result<String> {
        let mut lines = Vec::new();

        lines.push(self.color("Fidelity Summary", "bold"));
        lines.push(self.color("─".repeat(40).as_str(), "dim"));
        self.push_document_lines(&mut lines, outcome);

        Ok(lines.join("\n"))
    }

    fn generate_batch_report(&self, batch: &BatchOutcome) -> Result<String> {
        let mut lines = Vec::new();

        lines.push(self.color("Batch Summary", "bold"));
        lines.push(self.color("─".repeat(40).as_str(), "dim"));

        let summary = &batch.summary;
        lines.push(format!(
            "{}  {}",
            self.color("Documents:", "cyan"),
            summary.total
        ));
        let failed_text = if summary.failed > 0 {
            self.color(&summary.failed.to_string(), "red")
        } else {
            summary.failed.to_string()
        };
        lines.push(format!("{}  {failed_text}", self.color("Failed:", "cyan")));
        if let Some(mean) = summary.mean_score {
            lines.push(format!(
                "{}  {}",
                self.color("Mean score:", "cyan"),
                self.color(&format!("{mean:.1}"), score_color(mean))
            ));
        }

        if !summary.phase_counts.is_empty() {
            lines.push(String::new());
            lines.push(self.color("Phases:", "bold"));
            for (phase, count) in &summary.phase_counts {
                lines.push(format!("  {phase:<12} {count}"));
            }
        }

        let failures: Vec<_> = batch.outcomes.iter().filter(|o| o.is_fatal()).collect();
        if !failures.is_empty() {
            lines.push(String::new());
            lines.push(self.color("Failed documents:", "bold"));
            for outcome in failures {
                let error = outcome.error.as_deref().unwrap_or("unknown error");
                lines.push(format!(
                    "  {}  {}",
                    outcome.document_id,
                    self.color(error, "red")
                ));
            }
        }

        Ok(lines.join("\n"))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Summary
    }
}
