//! Configuration validation for devdesc-tools.
//!
//! Provides validation traits and implementations for all configuration types.

use super::types::{AppConfig, BatchConfig, OutputConfig, ScoringConfig, SynonymConfig};
use crate::quality::ThresholdSet;

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.scoring.validate());
        errors.extend(self.thresholds.validate());
        errors.extend(self.synonyms.validate());
        errors.extend(self.output.validate());
        errors.extend(self.batch.validate());
        errors
    }
}

impl Validatable for ScoringConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let weights = [
            ("scoring.weights.missing", self.weights.missing),
            ("scoring.weights.value_mismatch", self.weights.value_mismatch),
            ("scoring.weights.extra", self.weights.extra),
        ];
        for (field, value) in weights {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError {
                    field: field.to_string(),
                    message: format!("Weight must be a non-negative number, got {value}"),
                });
            }
        }
        errors
    }
}

impl Validatable for ThresholdSet {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.is_empty() {
            errors.push(ConfigError {
                field: "thresholds".to_string(),
                message: "At least one threshold rule is required".to_string(),
            });
        }

        for (i, rule) in self.rules.iter().enumerate() {
            if rule.phase.trim().is_empty() {
                errors.push(ConfigError {
                    field: format!("thresholds[{i}].phase"),
                    message: "Phase label must not be empty".to_string(),
                });
            }
            if let Some(min_score) = rule.min_score {
                if !(0.0..=100.0).contains(&min_score) {
                    errors.push(ConfigError {
                        field: format!("thresholds[{i}].min_score"),
                        message: format!(
                            "Minimum score must be between 0 and 100, got {min_score}"
                        ),
                    });
                }
            }
        }

        errors
    }
}

impl Validatable for SynonymConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        for (section, fields) in &self.overrides {
            for (canonical, literals) in fields {
                if literals.is_empty() {
                    errors.push(ConfigError {
                        field: format!("synonyms.overrides.{section}.{canonical}"),
                        message: "At least one literal spelling is required".to_string(),
                    });
                }
                if literals.iter().any(|l| l.trim().is_empty()) {
                    errors.push(ConfigError {
                        field: format!("synonyms.overrides.{section}.{canonical}"),
                        message: "Literal spellings must not be empty".to_string(),
                    });
                }
            }
        }
        errors
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        // Validate output file path if specified
        if let Some(ref file_path) = self.file {
            if let Some(parent) = file_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    errors.push(ConfigError {
                        field: "output.file".to_string(),
                        message: format!("Parent directory does not exist: {}", parent.display()),
                    });
                }
            }
        }

        errors
    }
}

impl Validatable for BatchConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.jobs == Some(0) {
            errors.push(ConfigError {
                field: "batch.jobs".to_string(),
                message: "Worker count must be at least 1".to_string(),
            });
        }

        if let Some(ref history) = self.history {
            if let Some(parent) = history.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    errors.push(ConfigError {
                        field: "batch.history".to_string(),
                        message: format!("Parent directory does not exist: {}", parent.display()),
                    });
                }
            }
        }

        errors
    }
}

// ============================================================================
// Tests
// ============================================================================
