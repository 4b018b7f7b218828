//! Configuration types for devdesc-tools operations.
//!
//! Provides structured configuration for scoring, phase gating, synonym
//! dialects and batch processing.

use crate::parsers::SynonymTable;
use crate::quality::{ScoreWeights, ThresholdSet};
use crate::reports::ReportFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// This is the top-level configuration struct that aggregates all configuration
/// options. It can be constructed from CLI arguments, config files, or both
/// (with CLI overriding file settings).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Scoring configuration (penalty weights, formatting reporting)
    pub scoring: ScoringConfig,
    /// Ordered phase gate rules; the first matching rule wins
    pub thresholds: ThresholdSet,
    /// Vendor synonym overrides for the sectioned-text dialect
    pub synonyms: SynonymConfig,
    /// Output configuration (format, file, colors)
    pub output: OutputConfig,
    /// Batch processing options
    pub batch: BatchConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Effective synonym table: built-ins overlaid with configured spellings.
    #[must_use]
    pub fn synonym_table(&self) -> SynonymTable {
        self.synonyms.build_table()
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Completeness scoring configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScoringConfig {
    /// Penalty weights by difference kind
    pub weights: ScoreWeights,
    /// Report formatting-only differences in diff output. They never
    /// affect the score either way.
    pub include_formatting: bool,
}

// ============================================================================
// Synonyms
// ============================================================================

/// Synonym overrides applied on top of the built-in vendor dialects.
///
/// Keyed by section name, then canonical field; the value lists literal
/// key spellings. A configured list replaces the built-in list for that
/// field, and its first entry becomes the primary spelling used during
/// reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SynonymConfig {
    /// section -> canonical field -> literal spellings
    pub overrides: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl SynonymConfig {
    /// True when no overrides are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Build the effective table from built-ins plus the overrides.
    #[must_use]
    pub fn build_table(&self) -> SynonymTable {
        let mut table = SynonymTable::with_builtins();
        for (section, fields) in &self.overrides {
            for (canonical, literals) in fields {
                let refs: Vec<&str> = literals.iter().map(String::as_str).collect();
                table.add_synonyms(section, canonical, &refs);
            }
        }
        table
    }
}

// ============================================================================
// Output
// ============================================================================

/// Output configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Report format
    pub format: ReportFormat,
    /// Output file path (stdout when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Disable colored output
    pub no_color: bool,
}

// ============================================================================
// Batch
// ============================================================================

/// Batch processing options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads for batch runs (global thread pool when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// JSONL history file quality metrics are appended to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<PathBuf>,
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the scoring weights.
    pub const fn weights(mut self, weights: ScoreWeights) -> Self {
        self.config.scoring.weights = weights;
        self
    }

    /// Report formatting-only differences.
    pub const fn include_formatting(mut self, include: bool) -> Self {
        self.config.scoring.include_formatting = include;
        self
    }

    /// Replace the phase threshold rules.
    pub fn thresholds(mut self, thresholds: ThresholdSet) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Override literal spellings for one canonical field.
    pub fn synonym(
        mut self,
        section: impl Into<String>,
        canonical: impl Into<String>,
        literals: Vec<String>,
    ) -> Self {
        self.config
            .synonyms
            .overrides
            .entry(section.into())
            .or_default()
            .insert(canonical.into(), literals);
        self
    }

    /// Set the output format.
    pub const fn output_format(mut self, format: ReportFormat) -> Self {
        self.config.output.format = format;
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    /// Disable colored output.
    pub const fn no_color(mut self, no_color: bool) -> Self {
        self.config.output.no_color = no_color;
        self
    }

    /// Cap batch parallelism.
    pub const fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.config.batch.jobs = jobs;
        self
    }

    /// Set the metric history file.
    pub fn history(mut self, history: Option<PathBuf>) -> Self {
        self.config.batch.history = history;
        self
    }

    /// Build the `AppConfig`.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_carries_standard_gates() {
        let config = AppConfig::default();
        assert!(!config.thresholds.is_empty());
        assert_eq!(config.thresholds.classify(100.0, 0, 0), "production");
    }

    #[test]
    fn test_builder_sets_fields() {
        let config = AppConfig::builder()
            .include_formatting(true)
            .output_format(ReportFormat::Json)
            .jobs(Some(4))
            .history(Some(PathBuf::from("history.jsonl")))
            .build();

        assert!(config.scoring.include_formatting);
        assert_eq!(config.output.format, ReportFormat::Json);
        assert_eq!(config.batch.jobs, Some(4));
        assert_eq!(config.batch.history, Some(PathBuf::from("history.jsonl")));
    }

    #[test]
    fn test_synonym_override_replaces_builtin_list() {
        let config = AppConfig::builder()
            .synonym(
                "device",
                "vendor_id",
                vec!["VendorNo".to_string(), "VendCode".to_string()],
            )
            .build();

        let table = config.synonym_table();
        assert_eq!(table.primary_literal("device", "vendor_id"), Some("VendorNo"));
        // Replaced list no longer contains the dropped builtin spelling.
        assert!(table.resolve("device", "VendorCode").is_empty());
        assert!(!table.resolve("device", "VendCode").is_empty());
        // Untouched fields keep their builtins.
        assert_eq!(table.primary_literal("device", "product_name"), Some("ProdName"));
    }
}
