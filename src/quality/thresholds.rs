//! Ordered phase classification rules.
//!
//! A [`ThresholdSet`] maps the scored triple `(completeness_score,
//! error_count, warning_count)` to a discrete phase label. Rules are
//! evaluated top to bottom and the first match wins, so order expresses
//! priority. Classification is a pure function of the triple.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One phase rule: a label plus conditions over the scored triple.
///
/// Absent conditions do not constrain. A rule with no conditions matches
/// everything and usually closes the set as its catch-all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThresholdRule {
    /// Phase label this rule assigns
    pub phase: String,
    /// Minimum completeness score, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    /// Maximum number of `Error` diagnostics, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_errors: Option<usize>,
    /// Maximum number of `Warning` diagnostics, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_warnings: Option<usize>,
}

impl ThresholdRule {
    /// Rule with a label and no conditions (matches everything)
    #[must_use]
    pub fn catch_all(phase: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            min_score: None,
            max_errors: None,
            max_warnings: None,
        }
    }

    /// Require at least this completeness score
    #[must_use]
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    /// Allow at most this many `Error` diagnostics
    #[must_use]
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = Some(max_errors);
        self
    }

    /// Allow at most this many `Warning` diagnostics
    #[must_use]
    pub fn with_max_warnings(mut self, max_warnings: usize) -> Self {
        self.max_warnings = Some(max_warnings);
        self
    }

    fn matches(&self, score: f64, error_count: usize, warning_count: usize) -> bool {
        self.min_score.map_or(true, |min| score >= min)
            && self.max_errors.map_or(true, |max| error_count <= max)
            && self.max_warnings.map_or(true, |max| warning_count <= max)
    }
}

/// Ordered rule list, evaluated top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ThresholdSet {
    pub rules: Vec<ThresholdRule>,
}

impl ThresholdSet {
    /// Set with the given rules in evaluation order
    #[must_use]
    pub fn new(rules: Vec<ThresholdRule>) -> Self {
        Self { rules }
    }

    /// Classify a scored document into a phase label.
    ///
    /// First matching rule wins. When nothing matches, the last configured
    /// label applies as the most conservative choice; the result is never
    /// "unknown". Config validation rejects empty sets, but an empty set
    /// still degrades to `"quarantine"` rather than panicking.
    #[must_use]
    pub fn classify(&self, score: f64, error_count: usize, warning_count: usize) -> &str {
        for rule in &self.rules {
            if rule.matches(score, error_count, warning_count) {
                return &rule.phase;
            }
        }
        self.rules.last().map_or("quarantine", |r| r.phase.as_str())
    }

    /// Configured phase labels in rule order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.phase.as_str())
    }

    /// Position of a label in rule order. Earlier rules demand more, so a
    /// lower rank means a better phase.
    #[must_use]
    pub fn rank(&self, phase: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.phase == phase)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for ThresholdSet {
    /// Default gate: `production`, `candidate`, `review`, `quarantine`.
    ///
    /// Production requires a near-lossless round trip with clean parsing;
    /// any `Error` diagnostic demotes to `review` at best even when the
    /// score itself is high.
    fn default() -> Self {
        Self {
            rules: vec![
                ThresholdRule {
                    phase: "production".to_string(),
                    min_score: Some(98.0),
                    max_errors: Some(0),
                    max_warnings: Some(10),
                },
                ThresholdRule {
                    phase: "candidate".to_string(),
                    min_score: Some(90.0),
                    max_errors: Some(0),
                    max_warnings: None,
                },
                ThresholdRule {
                    phase: "review".to_string(),
                    min_score: Some(60.0),
                    max_errors: None,
                    max_warnings: None,
                },
                ThresholdRule::catch_all("quarantine"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_document_is_production() {
        let set = ThresholdSet::default();
        assert_eq!(set.classify(100.0, 0, 0), "production");
    }

    #[test]
    fn test_errors_demote_even_a_perfect_score() {
        let set = ThresholdSet::default();
        assert_eq!(set.classify(100.0, 1, 0), "review");
    }

    #[test]
    fn test_warning_limit_bounds_production() {
        let set = ThresholdSet::default();
        assert_eq!(set.classify(99.0, 0, 10), "production");
        assert_eq!(set.classify(99.0, 0, 11), "candidate");
    }

    #[test]
    fn test_low_scores_quarantine() {
        let set = ThresholdSet::default();
        assert_eq!(set.classify(59.9, 0, 0), "quarantine");
        assert_eq!(set.classify(0.0, 5, 20), "quarantine");
    }

    #[test]
    fn test_first_match_wins_over_later_rules() {
        let set = ThresholdSet {
            rules: vec![
                ThresholdRule {
                    phase: "a".to_string(),
                    min_score: Some(50.0),
                    max_errors: None,
                    max_warnings: None,
                },
                ThresholdRule {
                    phase: "b".to_string(),
                    min_score: Some(50.0),
                    max_errors: None,
                    max_warnings: None,
                },
            ],
        };
        assert_eq!(set.classify(75.0, 0, 0), "a");
    }

    #[test]
    fn test_no_match_falls_to_last_configured_label() {
        let set = ThresholdSet {
            rules: vec![
                ThresholdRule {
                    phase: "gold".to_string(),
                    min_score: Some(90.0),
                    max_errors: None,
                    max_warnings: None,
                },
                ThresholdRule {
                    phase: "silver".to_string(),
                    min_score: Some(70.0),
                    max_errors: None,
                    max_warnings: None,
                },
            ],
        };
        assert_eq!(set.classify(10.0, 0, 0), "silver");
    }

    #[test]
    fn test_yaml_rule_list_deserializes() {
        let yaml = "- phase: production\n  min_score: 98.0\n  max_errors: 0\n- phase: quarantine\n";
        let set: ThresholdSet = serde_yaml::from_str(yaml).expect("valid threshold yaml");
        assert_eq!(set.rules.len(), 2);
        assert_eq!(set.rules[0].phase, "production");
        assert_eq!(set.rules[0].max_warnings, None);
        assert_eq!(set.classify(99.0, 0, 3), "production");
        assert_eq!(set.classify(99.0, 1, 0), "quarantine");
    }
}
