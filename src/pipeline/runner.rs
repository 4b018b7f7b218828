//! Per-document pipeline orchestration.
//!
//! [`PipelineRunner`] drives each document through a one-way sequence of
//! stages: parse, reconstruct, diff, score, persist. A document's outcome
//! records the furthest stage it completed; failures carry everything
//! learned up to that point, so a batch never aborts because one vendor
//! file is broken.

use crate::error::{DevDescError, EvaluateErrorKind, Result};
use crate::model::{Diagnostic, RawDocument};
use crate::pipeline::evaluate::{EvaluationReport, Evaluator};
use crate::quality::MetricSink;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages a document moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    /// Raw text normalized into the shared model
    Parsed,
    /// Canonical text rendered from the model
    Reconstructed,
    /// Original and re-parsed reconstruction compared
    Diffed,
    /// Completeness score and gate phase assigned
    Scored,
    /// Quality metric appended to the history sink
    Persisted,
}

impl PipelineStage {
    /// Short stage name for logs and reports
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Reconstructed => "reconstructed",
            Self::Diffed => "diffed",
            Self::Scored => "scored",
            Self::Persisted => "persisted",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Everything the pipeline has to say about one document.
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct DocumentOutcome {
    /// Identity of the source document
    pub document_id: String,
    /// Furthest stage completed. `None` means parsing itself failed and
    /// no model ever existed.
    pub stage: Option<PipelineStage>,
    /// Parser diagnostics, in document order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
    /// Fidelity report, present once scoring completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<EvaluationReport>,
    /// Message of the error that stopped the pipeline, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentOutcome {
    /// True when the pipeline stopped before scoring.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.error.is_some()
    }

    /// Gate phase assigned by scoring, when scoring happened.
    #[must_use]
    pub fn phase(&self) -> Option<&str> {
        self.report.as_ref().map(|r| r.metric.phase.as_str())
    }
}

/// Map an evaluation failure to the last stage that still completed.
fn stage_reached(err: &DevDescError) -> PipelineStage {
    match err {
        DevDescError::Evaluate {
            source: EvaluateErrorKind::ReparseFailed(_),
            ..
        } => PipelineStage::Reconstructed,
        _ => PipelineStage::Parsed,
    }
}

/// Batch result: every document outcome plus aggregate counts.
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct BatchOutcome {
    pub outcomes: Vec<DocumentOutcome>,
    pub summary: BatchSummary,
}

/// Aggregate view of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Documents submitted
    pub total: usize,
    /// Documents that never reached scoring
    pub failed: usize,
    /// Scored documents per gate phase, in first-seen order
    pub phase_counts: IndexMap<String, usize>,
    /// Mean completeness score over scored documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_score: Option<f64>,
}

impl BatchSummary {
    fn from_outcomes(outcomes: &[DocumentOutcome]) -> Self {
        let mut phase_counts: IndexMap<String, usize> = IndexMap::new();
        let mut failed = 0usize;
        let mut scored = 0usize;
        let mut score_sum = 0.0f64;

        for outcome in outcomes {
            match &outcome.report {
                Some(report) => {
                    *phase_counts
                        .entry(report.metric.phase.clone())
                        .or_insert(0) += 1;
                    score_sum += report.metric.completeness_score;
                    scored += 1;
                }
                None => failed += 1,
            }
        }

        Self {
            total: outcomes.len(),
            failed,
            phase_counts,
            mean_score: (scored > 0).then(|| score_sum / scored as f64),
        }
    }
}

/// Drives documents through the pipeline stages.
///
/// The runner is stateless between documents and shares its evaluator
/// across worker threads, so a single runner serves a whole batch.
pub struct PipelineRunner {
    evaluator: Evaluator,
    jobs: Option<usize>,
}

impl PipelineRunner {
    /// Runner with a default evaluator and the global thread pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            evaluator: Evaluator::new(),
            jobs: None,
        }
    }

    /// Replace the evaluator wholesale.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Cap batch parallelism. `None` or zero use the global thread pool.
    #[must_use]
    pub const fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// The evaluator this runner scores documents with.
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Run one document through every stage.
    ///
    /// Never fails: errors land in the returned outcome. A sink append
    /// failure is logged and leaves the document at `Scored`.
    pub fn run_document(
        &self,
        document: &RawDocument,
        sink: Option<&mut dyn MetricSink>,
    ) -> DocumentOutcome {
        let mut outcome = self.run_stages(document);
        if let Some(sink) = sink {
            Self::persist(&mut outcome, sink);
        }
        outcome
    }

    /// Run a batch of documents in parallel.
    ///
    /// Stage work is distributed over rayon workers; history appends run
    /// sequentially afterwards so sink implementations stay simple. Fails
    /// only when the requested worker pool cannot be created.
    pub fn run_batch(
        &self,
        documents: &[RawDocument],
        sink: Option<&mut dyn MetricSink>,
    ) -> Result<BatchOutcome> {
        let mut outcomes = match self.jobs {
            Some(n) if n > 0 => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| {
                        DevDescError::validation(format!("cannot build worker pool: {e}"))
                    })?;
                pool.install(|| {
                    documents
                        .par_iter()
                        .map(|doc| self.run_stages(doc))
                        .collect::<Vec<_>>()
                })
            }
            _ => documents
                .par_iter()
                .map(|doc| self.run_stages(doc))
                .collect(),
        };

        if let Some(sink) = sink {
            for outcome in &mut outcomes {
                Self::persist(outcome, &mut *sink);
            }
        }

        let summary = BatchSummary::from_outcomes(&outcomes);
        tracing::info!(
            total = summary.total,
            failed = summary.failed,
            "batch complete"
        );

        Ok(BatchOutcome { outcomes, summary })
    }

    /// Parse, evaluate and assemble the outcome for one document.
    fn run_stages(&self, document: &RawDocument) -> DocumentOutcome {
        let parsed = match self.evaluator.parse_document(document) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::error!(document = %document.id, error = %err, "parse failed");
                return DocumentOutcome {
                    document_id: document.id.clone(),
                    stage: None,
                    diagnostics: err.diagnostics().to_vec(),
                    report: None,
                    error: Some(err.to_string()),
                };
            }
        };

        match self.evaluator.evaluate(document, &parsed) {
            Ok(report) => {
                tracing::info!(
                    document = %document.id,
                    score = report.metric.completeness_score,
                    phase = %report.metric.phase,
                    "document scored"
                );
                DocumentOutcome {
                    document_id: document.id.clone(),
                    stage: Some(PipelineStage::Scored),
                    diagnostics: parsed.diagnostics,
                    report: Some(report),
                    error: None,
                }
            }
            Err(err) => {
                tracing::error!(document = %document.id, error = %err, "evaluation failed");
                DocumentOutcome {
                    document_id: document.id.clone(),
                    stage: Some(stage_reached(&err)),
                    diagnostics: parsed.diagnostics,
                    report: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn persist(outcome: &mut DocumentOutcome, sink: &mut dyn MetricSink) {
        if let Some(report) = &outcome.report {
            match sink.append(&report.metric) {
                Ok(()) => outcome.stage = Some(PipelineStage::Persisted),
                Err(err) => {
                    tracing::warn!(
                        document = %outcome.document_id,
                        error = %err,
                        "failed to append metric history"
                    );
                }
            }
        }
    }
}

impl Default for PipelineRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FormatKind;
    use crate::quality::QualityMetric;

    const GOOD_EDS: &str = "\
[File]
DescText = \"Valve coupler\";
Revision = 1.2;

[Device]
VendCode = 12;
ProdName = \"Valve A\";
";

    struct VecSink(Vec<QualityMetric>);

    impl MetricSink for VecSink {
        fn append(&mut self, metric: &QualityMetric) -> Result<()> {
            self.0.push(metric.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl MetricSink for FailingSink {
        fn append(&mut self, _metric: &QualityMetric) -> Result<()> {
            Err(DevDescError::validation("sink closed"))
        }
    }

    fn doc(id: &str, content: &str) -> RawDocument {
        RawDocument::new(id, FormatKind::Eds, content)
    }

    #[test]
    fn test_good_document_reaches_scored() {
        let runner = PipelineRunner::new();
        let outcome = runner.run_document(&doc("valve.eds", GOOD_EDS), None);

        assert_eq!(outcome.stage, Some(PipelineStage::Scored));
        assert!(!outcome.is_fatal());
        assert_eq!(outcome.phase(), Some("production"));
        let report = outcome.report.expect("report present");
        assert!((report.metric.completeness_score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_sink_append_advances_to_persisted() {
        let runner = PipelineRunner::new();
        let mut sink = VecSink(Vec::new());
        let outcome = runner.run_document(&doc("valve.eds", GOOD_EDS), Some(&mut sink));

        assert_eq!(outcome.stage, Some(PipelineStage::Persisted));
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].document_id, "valve.eds");
    }

    #[test]
    fn test_failing_sink_keeps_scored_stage() {
        let runner = PipelineRunner::new();
        let mut sink = FailingSink;
        let outcome = runner.run_document(&doc("valve.eds", GOOD_EDS), Some(&mut sink));

        // Persistence failure is not a document failure.
        assert_eq!(outcome.stage, Some(PipelineStage::Scored));
        assert!(!outcome.is_fatal());
    }

    #[test]
    fn test_unparseable_document_has_no_stage() {
        let runner = PipelineRunner::new();
        let outcome = runner.run_document(&doc("junk.eds", "not a device description"), None);

        assert_eq!(outcome.stage, None);
        assert!(outcome.is_fatal());
        assert!(outcome.report.is_none());
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_batch_counts_phases_and_failures() {
        let runner = PipelineRunner::new().jobs(Some(2));
        let documents = vec![
            doc("a.eds", GOOD_EDS),
            doc("b.eds", GOOD_EDS),
            doc("broken.eds", "????"),
        ];
        let mut sink = VecSink(Vec::new());
        let batch = runner
            .run_batch(&documents, Some(&mut sink))
            .expect("batch runs");

        assert_eq!(batch.summary.total, 3);
        assert_eq!(batch.summary.failed, 1);
        assert_eq!(batch.summary.phase_counts.get("production"), Some(&2));
        let mean = batch.summary.mean_score.expect("two documents scored");
        assert!((mean - 100.0).abs() < 1e-9);
        // Only scored documents were persisted.
        assert_eq!(sink.0.len(), 2);
        assert!(batch
            .outcomes
            .iter()
            .filter(|o| !o.is_fatal())
            .all(|o| o.stage == Some(PipelineStage::Persisted)));
    }

    #[test]
    fn test_empty_batch_has_no_mean() {
        let runner = PipelineRunner::new();
        let batch = runner.run_batch(&[], None).expect("batch runs");
        assert_eq!(batch.summary.total, 0);
        assert!(batch.summary.mean_score.is_none());
    }

    #[test]
    fn test_stage_order_and_labels() {
        assert!(PipelineStage::Parsed < PipelineStage::Reconstructed);
        assert!(PipelineStage::Reconstructed < PipelineStage::Diffed);
        assert!(PipelineStage::Diffed < PipelineStage::Scored);
        assert!(PipelineStage::Scored < PipelineStage::Persisted);
        assert_eq!(PipelineStage::Scored.label(), "scored");
        assert_eq!(PipelineStage::Persisted.to_string(), "persisted");
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        let json = serde_json::to_string(&PipelineStage::Reconstructed).unwrap();
        assert_eq!(json, "\"reconstructed\"");
    }
}
