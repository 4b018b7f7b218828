//! Completeness scoring engine.
//!
//! Converts a structural diff into the 0-100 completeness score that phase
//! gating runs on.

use crate::diff::DiffResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-kind penalty weights.
///
/// `FormattingOnly` entries never penalize and have no weight here. `extra`
/// defaults to zero: the score denominator counts original-side fields only,
/// so a full-weight `extra` could sink small documents on a reconstruction
/// bug that invents fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScoreWeights {
    /// Penalty per missing field or record
    pub missing: f64,
    /// Penalty per value mismatch
    pub value_mismatch: f64,
    /// Penalty per invented field
    pub extra: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            missing: 1.0,
            value_mismatch: 1.0,
            extra: 0.0,
        }
    }
}

/// A completeness score plus the numbers that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[must_use]
pub struct ScoreBreakdown {
    /// Completeness score, 0.0 to 100.0
    pub score: f64,
    /// Sum of per-entry penalty weights
    pub weighted_penalty: f64,
    /// Denominator: populated fields counted on the original side
    pub total_field_count: usize,
    /// The original model had nothing countable; the score is pinned to 100
    /// and reports carry a warning note
    pub empty_original: bool,
}

impl ScoreBreakdown {
    /// True when nothing was lost or altered.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.score >= 100.0
    }
}

/// Scores diff results with configurable weights.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    weights: ScoreWeights,
}

impl QualityScorer {
    /// Create a scorer with default weights
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the penalty weights
    #[must_use]
    pub const fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Score a diff result.
    ///
    /// `100 x (1 - weighted_penalty / total_field_count)`, clamped to
    /// [0, 100]. An empty original scores 100.
    pub fn score(&self, diff: &DiffResult) -> ScoreBreakdown {
        let total = diff.total_field_count;
        if total == 0 {
            return ScoreBreakdown {
                score: 100.0,
                weighted_penalty: 0.0,
                total_field_count: 0,
                empty_original: true,
            };
        }

        let summary = &diff.summary;
        let weighted_penalty = summary.missing as f64 * self.weights.missing
            + summary.value_mismatches as f64 * self.weights.value_mismatch
            + summary.extra as f64 * self.weights.extra;
        let score = (100.0 * (1.0 - weighted_penalty / total as f64)).clamp(0.0, 100.0);

        ScoreBreakdown {
            score,
            weighted_penalty,
            total_field_count: total,
            empty_original: false,
        }
    }
}
