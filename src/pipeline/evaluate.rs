//! Round-trip evaluation: reconstruct, re-parse, diff, score, gate.

use crate::diff::{DiffEngine, DiffResult};
use crate::error::{DevDescError, EvaluateErrorKind, Result};
use crate::model::{codes, Diagnostic, Location, RawDocument, Severity};
use crate::parsers::{FormatDetector, ParseError, ParseOutcome, SynonymTable};
use crate::quality::{
    QualityMetric, QualityScorer, ScoreBreakdown, ScoreWeights, ThresholdSet,
};
use crate::reconstruct::Reconstructor;
use serde::Serialize;

/// Everything one evaluation produced.
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct EvaluationReport {
    /// The persisted metric: score, diagnostic counts, phase
    pub metric: QualityMetric,
    /// Score plus the numbers behind it
    pub breakdown: ScoreBreakdown,
    /// The structural diff the score came from
    pub diff: DiffResult,
    /// Notes raised by the evaluation itself (not parse diagnostics)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Diagnostic>,
}

impl EvaluationReport {
    /// True when the round trip lost or altered nothing.
    #[must_use]
    pub fn is_lossless(&self) -> bool {
        self.diff.is_lossless()
    }
}

/// Configured round-trip evaluator.
///
/// Holds everything an evaluation needs so batches can share one instance
/// across threads: the reconstructor (with its synonym table), the scorer
/// weights and the threshold set. All state is read-only during evaluation.
pub struct Evaluator {
    reconstructor: Reconstructor,
    detector: FormatDetector,
    scorer: QualityScorer,
    thresholds: ThresholdSet,
    include_formatting: bool,
}

impl Evaluator {
    /// Evaluator with built-in synonyms, default weights and default
    /// thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reconstructor: Reconstructor::new(),
            detector: FormatDetector::new(),
            scorer: QualityScorer::new(),
            thresholds: ThresholdSet::default(),
            include_formatting: false,
        }
    }

    /// Replace the scoring weights
    #[must_use]
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.scorer = QualityScorer::new().with_weights(weights);
        self
    }

    /// Replace the threshold set
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: ThresholdSet) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Replace the synonym table used for reconstruction and re-parsing.
    /// It must match the one the model was parsed with, or respelled keys
    /// count against the score.
    #[must_use]
    pub fn with_synonyms(mut self, synonyms: SynonymTable) -> Self {
        self.detector = FormatDetector::with_synonyms(synonyms.clone());
        self.reconstructor = Reconstructor::with_synonyms(synonyms);
        self
    }

    /// Include formatting-only entries in diff output (suppressed by
    /// default; they never affect the score)
    #[must_use]
    pub const fn include_formatting(mut self, include: bool) -> Self {
        self.include_formatting = include;
        self
    }

    /// Active threshold set
    #[must_use]
    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    /// Parse a document with the same synonym table evaluation uses.
    ///
    /// The pipeline parses through here so a configured spelling is
    /// recognized identically on first parse and on re-parse.
    pub fn parse_document(
        &self,
        document: &RawDocument,
    ) -> std::result::Result<ParseOutcome, ParseError> {
        self.detector
            .parse_with_format(&document.content, document.format)
    }

    /// Run reconstruct, re-parse, diff and score for one parsed document.
    ///
    /// The diff's original side is a fresh parse of `original`, not the
    /// caller's model, so content dropped from the model between parse and
    /// reconstruction counts as a loss. Low fidelity is not an error; it
    /// scores whatever it scores. The fatal conditions are a model that
    /// does not belong to `original` (format mismatch), an original our
    /// own parser rejects, a model too empty to render, and
    /// reconstruction output our own parser rejects.
    pub fn evaluate(
        &self,
        original: &RawDocument,
        outcome: &ParseOutcome,
    ) -> Result<EvaluationReport> {
        if outcome.model.format != original.format {
            return Err(DevDescError::evaluate(
                "matching model to document",
                EvaluateErrorKind::FormatMismatch {
                    model: outcome.model.format.name().to_string(),
                    document: original.format.name().to_string(),
                },
            ));
        }

        let baseline = self.parse_document(original).map_err(|err| {
            DevDescError::evaluate(
                "parsing original document",
                EvaluateErrorKind::OriginalParseFailed(err.to_string()),
            )
        })?;

        let reconstructed = self.reconstructor.reconstruct(&outcome.model)?;

        let reparsed = self
            .detector
            .parse_with_format(&reconstructed.content, original.format)
            .map_err(|err| {
                DevDescError::evaluate(
                    "re-parsing reconstructed text",
                    EvaluateErrorKind::ReparseFailed(err.to_string()),
                )
            })?;

        let diff = DiffEngine::new()
            .include_formatting(self.include_formatting)
            .diff(&baseline.model, &reparsed.model)?;

        let breakdown = self.scorer.score(&diff);
        let mut notes = Vec::new();
        if breakdown.empty_original {
            notes.push(Diagnostic {
                severity: Severity::Warning,
                code: codes::EMPTY_MODEL.to_string(),
                message: "original model has no countable fields; score of 100 is vacuous"
                    .to_string(),
                location: Location::section("document"),
            });
        }

        let error_count = outcome.error_count();
        let warning_count = outcome.warning_count();
        let phase = self
            .thresholds
            .classify(breakdown.score, error_count, warning_count)
            .to_string();

        tracing::debug!(
            document = %original.id,
            score = breakdown.score,
            phase = %phase,
            changes = diff.summary.total_changes,
            "evaluation complete"
        );

        Ok(EvaluationReport {
            metric: QualityMetric {
                document_id: original.id.clone(),
                completeness_score: breakdown.score,
                error_count,
                warning_count,
                phase,
                computed_at: chrono::Utc::now(),
            },
            breakdown,
            diff,
            notes,
        })
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// One-call form of [`Evaluator::evaluate`] with default weights.
pub fn evaluate(
    original: &RawDocument,
    outcome: &ParseOutcome,
    thresholds: &ThresholdSet,
) -> Result<EvaluationReport> {
    Evaluator::new()
        .with_thresholds(thresholds.clone())
        .evaluate(original, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FormatKind;
    use crate::parsers::parse_device_with_format;

    const SAMPLE_EDS: &str = "\
[File]
DescText = \"Conveyor drive\";
Revision = 1.2;

[Device]
VendCode = 68;
ProdType = 12;
ProdCode = 4711;
MajRev = 1;
MinRev = 3;
ProdName = \"ConveyorFlex 200\";

[Params]
Param1 =
    0,
    ,,
    0x0000,
    0xC6,
    1,
    \"Speed\",
    \"rpm\",
    \"Target speed\",
    0, 3000, 1500;
";

    fn parsed(content: &str, format: FormatKind) -> (RawDocument, ParseOutcome) {
        let document = RawDocument::new("test.eds", format, content);
        let outcome = parse_device_with_format(&document.content, format).expect("parses");
        (document, outcome)
    }

    #[test]
    fn test_faithful_roundtrip_scores_100_and_gates_production() {
        let (document, outcome) = parsed(SAMPLE_EDS, FormatKind::Eds);
        let report = evaluate(&document, &outcome, &ThresholdSet::default()).expect("evaluates");

        assert!(report.is_lossless());
        assert!((report.metric.completeness_score - 100.0).abs() < 1e-9);
        assert_eq!(report.metric.phase, "production");
        assert_eq!(report.metric.document_id, "test.eds");
        assert!(report.notes.is_empty());
    }

    #[test]
    fn test_format_mismatch_is_fatal() {
        let (_, outcome) = parsed(SAMPLE_EDS, FormatKind::Eds);
        let mislabeled = RawDocument::new("x.xml", FormatKind::Iodd, "<IODevice/>");

        let err = Evaluator::new()
            .evaluate(&mislabeled, &outcome)
            .expect_err("format mismatch must fail");
        assert!(err.to_string().contains("Evaluation failed"));
    }

    #[test]
    fn test_dropped_param_counts_as_missing_against_the_document() {
        let (document, mut outcome) = parsed(SAMPLE_EDS, FormatKind::Eds);
        outcome.model.params.shift_remove(&1);
        outcome.model.calculate_content_hash();

        // Fidelity is measured against the document, not the handed-in
        // model: content dropped before reconstruction is a loss.
        let report = evaluate(&document, &outcome, &ThresholdSet::default()).expect("evaluates");
        assert_eq!(report.diff.summary.missing, 1);
        assert!(report.metric.completeness_score < 100.0);
        assert!(!report.is_lossless());
    }

    #[test]
    fn test_mutated_value_is_detected_and_scored() {
        let (document, outcome) = parsed(SAMPLE_EDS, FormatKind::Eds);

        let reconstructed = Reconstructor::new()
            .reconstruct(&outcome.model)
            .expect("reconstructs");
        let mut tampered =
            parse_device_with_format(&reconstructed.content, FormatKind::Eds).expect("reparses");
        tampered.model.identity.vendor_id = Some(crate::model::Scalar::int(99));
        tampered.model.calculate_content_hash();

        let diff = DiffEngine::new()
            .diff(&outcome.model, &tampered.model)
            .expect("diffs");
        assert_eq!(diff.summary.value_mismatches, 1);

        let breakdown = QualityScorer::new().score(&diff);
        assert!(breakdown.score < 100.0);
    }
}
