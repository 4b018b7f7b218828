//! Completeness scoring and phase gating.
//!
//! Turns a structural diff into a 0-100 completeness score, classifies the
//! score and diagnostic counts into a discrete quality phase through an
//! ordered threshold set, and persists finished metrics to an append-only
//! history sink.
//!
//! Scoring is `100 x (1 - weighted_penalty / total_field_count)` with
//! configurable per-kind weights. Phase classification is first-match-wins
//! over the ordered rules; with no match the last configured label applies,
//! so a phase is never "unknown".

mod history;
mod scorer;
mod thresholds;

pub use history::{JsonlHistorySink, MetricSink, QualityMetric};
pub use scorer::{QualityScorer, ScoreBreakdown, ScoreWeights};
pub use thresholds::{ThresholdRule, ThresholdSet};
