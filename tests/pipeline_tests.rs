//! Pipeline integration tests.
//!
//! These tests exercise the full parse → reconstruct → diff → score →
//! persist pipeline, error handling paths, and report output with real
//! fixture files.

use devdesc_tools::model::{FormatKind, RawDocument};
use devdesc_tools::pipeline::{
    auto_detect_format, read_document, write_output, OutputTarget, PipelineRunner, PipelineStage,
};
use devdesc_tools::quality::{JsonlHistorySink, QualityMetric};
use devdesc_tools::reports::{create_reporter, create_reporter_with_options, ReportFormat};
use std::path::{Path, PathBuf};

// ============================================================================
// Test Fixtures
// ============================================================================

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_path(name: &str) -> PathBuf {
    Path::new(FIXTURES_DIR).join(name)
}

fn fixture_document(name: &str) -> RawDocument {
    read_document(&fixture_path(name), None, true).expect("fixture should ingest")
}

/// Sectioned text that detects as EDS but contains nothing recognizable.
const UNRECOGNIZABLE_EDS: &str = "[Port]\n        Port1 = TCP, \"backplane\", 1;\n";

// ============================================================================
// Ingest Stage Tests
// ============================================================================

mod ingest_stage {
    use super::*;

    #[test]
    fn extension_selects_format() {
        let eds = fixture_document("conveyor_drive.eds");
        assert_eq!(eds.format, FormatKind::Eds);
        assert!(!eds.content.is_empty());
        assert!(eds.id.ends_with("conveyor_drive.eds"));

        let iodd = fixture_document("level_sensor.xml");
        assert_eq!(iodd.format, FormatKind::Iodd);
    }

    #[test]
    fn explicit_format_wins_over_extension() {
        let path = fixture_path("level_sensor.xml");
        let document =
            read_document(&path, Some(FormatKind::Eds), true).expect("explicit format ingests");
        // Ingest trusts the caller; the mismatch surfaces at parse time.
        assert_eq!(document.format, FormatKind::Eds);
    }

    #[test]
    fn missing_file_returns_error() {
        let path = PathBuf::from("/nonexistent/path/to/device.eds");
        let result = read_document(&path, None, true);
        assert!(result.is_err(), "missing file should return error");

        let msg = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(
            msg.contains("device.eds") || msg.contains("Failed to read"),
            "error should mention the path: {msg}"
        );
    }

    #[test]
    fn undetectable_content_returns_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "meeting notes, nothing structured").expect("write temp file");

        let result = read_document(&path, None, true);
        assert!(result.is_err(), "undetectable content should return error");
    }

    #[test]
    fn unknown_extension_with_detectable_content_succeeds() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("drive.bak");
        let content = std::fs::read_to_string(fixture_path("conveyor_drive.eds")).unwrap();
        std::fs::write(&path, content).expect("write temp file");

        let document = read_document(&path, None, true).expect("content sniffing should succeed");
        assert_eq!(document.format, FormatKind::Eds);
    }
}

// ============================================================================
// Document Stage Tests
// ============================================================================

mod document_stage {
    use super::*;

    #[test]
    fn clean_document_reaches_scored() {
        let document = fixture_document("conveyor_drive.eds");
        let outcome = PipelineRunner::new().run_document(&document, None);

        assert!(!outcome.is_fatal());
        assert_eq!(outcome.stage, Some(PipelineStage::Scored));
        assert_eq!(outcome.phase(), Some("production"));
        assert!(outcome.diagnostics.is_empty());
        let report = outcome.report.expect("scored document carries a report");
        assert!(report.is_lossless());
    }

    #[test]
    fn parser_diagnostics_carried_into_outcome() {
        let document = fixture_document("flow_meter.eds");
        let outcome = PipelineRunner::new().run_document(&document, None);

        assert!(!outcome.is_fatal());
        assert_eq!(outcome.diagnostics.len(), 5);
        assert_eq!(outcome.phase(), Some("production"));
    }

    #[test]
    fn unparseable_document_stops_before_any_stage() {
        let document = RawDocument::new("junk.eds", FormatKind::Eds, UNRECOGNIZABLE_EDS);
        let outcome = PipelineRunner::new().run_document(&document, None);

        assert!(outcome.is_fatal());
        assert_eq!(outcome.stage, None);
        assert!(outcome.report.is_none());
        let error = outcome.error.expect("fatal outcome carries an error");
        assert!(
            error.contains("no recognized sections"),
            "unexpected error: {error}"
        );
    }

    #[test]
    fn sink_advances_document_to_persisted() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let history_path = dir.path().join("history.jsonl");
        let mut sink = JsonlHistorySink::open(&history_path).expect("open sink");

        let document = fixture_document("conveyor_drive.eds");
        let outcome = PipelineRunner::new().run_document(&document, Some(&mut sink));
        assert_eq!(outcome.stage, Some(PipelineStage::Persisted));

        let text = std::fs::read_to_string(&history_path).expect("read history");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let metric: QualityMetric = serde_json::from_str(lines[0]).expect("valid JSONL");
        assert!(metric.document_id.ends_with("conveyor_drive.eds"));
        assert_eq!(metric.phase, "production");
        assert!((metric.completeness_score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn failed_document_is_never_persisted() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let history_path = dir.path().join("history.jsonl");
        let mut sink = JsonlHistorySink::open(&history_path).expect("open sink");

        let document = RawDocument::new("junk.eds", FormatKind::Eds, UNRECOGNIZABLE_EDS);
        let outcome = PipelineRunner::new().run_document(&document, Some(&mut sink));
        assert_eq!(outcome.stage, None);

        let text = std::fs::read_to_string(&history_path).expect("read history");
        assert!(text.is_empty(), "no metric should be written: {text}");
    }
}

// ============================================================================
// Batch Stage Tests
// ============================================================================

mod batch_stage {
    use super::*;

    #[test]
    fn mixed_batch_counts_failures() {
        let documents = vec![
            fixture_document("conveyor_drive.eds"),
            RawDocument::new("junk.eds", FormatKind::Eds, UNRECOGNIZABLE_EDS),
            fixture_document("level_sensor.xml"),
        ];

        let batch = PipelineRunner::new()
            .run_batch(&documents, None)
            .expect("batch should run");

        assert_eq!(batch.summary.total, 3);
        assert_eq!(batch.summary.failed, 1);
        assert_eq!(batch.summary.phase_counts.get("production"), Some(&2));
        assert_eq!(batch.summary.mean_score, Some(100.0));

        // Outcomes keep submission order.
        assert!(!batch.outcomes[0].is_fatal());
        assert!(batch.outcomes[1].is_fatal());
        assert!(!batch.outcomes[2].is_fatal());
    }

    #[test]
    fn single_worker_batch_matches_parallel() {
        let documents = vec![
            fixture_document("conveyor_drive.eds"),
            fixture_document("flow_meter.eds"),
        ];

        let parallel = PipelineRunner::new()
            .run_batch(&documents, None)
            .expect("parallel batch");
        let sequential = PipelineRunner::new()
            .jobs(Some(1))
            .run_batch(&documents, None)
            .expect("sequential batch");

        assert_eq!(parallel.summary.total, sequential.summary.total);
        assert_eq!(parallel.summary.failed, sequential.summary.failed);
        assert_eq!(parallel.summary.phase_counts, sequential.summary.phase_counts);
        assert_eq!(parallel.summary.mean_score, sequential.summary.mean_score);
    }

    #[test]
    fn batch_with_sink_persists_every_scored_document() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let history_path = dir.path().join("history.jsonl");
        let mut sink = JsonlHistorySink::open(&history_path).expect("open sink");

        let documents = vec![
            fixture_document("conveyor_drive.eds"),
            fixture_document("legacy_actuator.eds"),
        ];
        let batch = PipelineRunner::new()
            .run_batch(&documents, Some(&mut sink))
            .expect("batch should run");

        assert!(batch
            .outcomes
            .iter()
            .all(|o| o.stage == Some(PipelineStage::Persisted)));

        let text = std::fs::read_to_string(&history_path).expect("read history");
        let phases: Vec<String> = text
            .lines()
            .map(|line| serde_json::from_str::<QualityMetric>(line).expect("valid JSONL").phase)
            .collect();
        assert_eq!(phases, vec!["production", "review"]);
    }

    #[test]
    fn empty_batch_has_no_mean() {
        let batch = PipelineRunner::new()
            .run_batch(&[], None)
            .expect("empty batch should run");

        assert_eq!(batch.summary.total, 0);
        assert_eq!(batch.summary.failed, 0);
        assert_eq!(batch.summary.mean_score, None);
        assert!(batch.summary.phase_counts.is_empty());
    }
}

// ============================================================================
// Output Stage Tests
// ============================================================================

mod output_stage {
    use super::*;

    #[test]
    fn file_target_is_never_terminal() {
        let target = OutputTarget::File(PathBuf::from("/tmp/report.json"));
        assert!(!target.is_terminal());
    }

    #[test]
    fn auto_format_resolves_to_json_for_files() {
        let target = OutputTarget::File(PathBuf::from("/tmp/report.json"));
        assert_eq!(
            auto_detect_format(ReportFormat::Auto, &target),
            ReportFormat::Json
        );
        // Explicit requests pass through untouched.
        assert_eq!(
            auto_detect_format(ReportFormat::Summary, &target),
            ReportFormat::Summary
        );
    }

    #[test]
    fn write_output_creates_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let out_path = dir.path().join("report.json");
        let target = OutputTarget::File(out_path.clone());

        write_output("{\"ok\":true}", &target, true).expect("write should succeed");

        let content = std::fs::read_to_string(&out_path).expect("read output");
        assert_eq!(content, "{\"ok\":true}");
    }
}

// ============================================================================
// Report Stage Tests
// ============================================================================

mod report_stage {
    use super::*;

    #[test]
    fn json_document_report_is_valid_json() {
        let document = fixture_document("conveyor_drive.eds");
        let outcome = PipelineRunner::new().run_document(&document, None);

        let reporter = create_reporter(ReportFormat::Json);
        let report = reporter
            .generate_document_report(&outcome)
            .expect("report should render");

        let json: serde_json::Value = serde_json::from_str(&report).expect("valid JSON");
        assert!(json.get("metadata").is_some());
        let doc = json.get("document").expect("document payload");
        assert_eq!(
            doc.pointer("/report/metric/phase").and_then(|v| v.as_str()),
            Some("production")
        );
        assert_eq!(
            doc.pointer("/report/metric/completeness_score")
                .and_then(serde_json::Value::as_f64),
            Some(100.0)
        );
    }

    #[test]
    fn summary_document_report_mentions_phase() {
        let document = fixture_document("legacy_actuator.eds");
        let outcome = PipelineRunner::new().run_document(&document, None);

        let reporter = create_reporter_with_options(ReportFormat::Summary, false);
        let report = reporter
            .generate_document_report(&outcome)
            .expect("report should render");

        assert!(report.contains("Fidelity Summary"));
        assert!(report.contains("review"));
        assert!(report.contains("1 errors"));
        assert!(!report.contains("\x1b["), "no-color output must be plain");
    }

    #[test]
    fn summary_batch_report_lists_phases_and_failures() {
        let documents = vec![
            fixture_document("conveyor_drive.eds"),
            RawDocument::new("junk.eds", FormatKind::Eds, UNRECOGNIZABLE_EDS),
        ];
        let batch = PipelineRunner::new()
            .run_batch(&documents, None)
            .expect("batch should run");

        let reporter = create_reporter_with_options(ReportFormat::Summary, false);
        let report = reporter
            .generate_batch_report(&batch)
            .expect("report should render");

        assert!(report.contains("Batch Summary"));
        assert!(report.contains("production"));
        assert!(report.contains("junk.eds"));
        assert!(report.contains("no recognized sections"));
    }

    #[test]
    fn json_batch_report_round_trips_summary_numbers() {
        let documents = vec![
            fixture_document("conveyor_drive.eds"),
            fixture_document("flow_meter.eds"),
        ];
        let batch = PipelineRunner::new()
            .run_batch(&documents, None)
            .expect("batch should run");

        let reporter = create_reporter(ReportFormat::Json);
        let report = reporter
            .generate_batch_report(&batch)
            .expect("report should render");

        let json: serde_json::Value = serde_json::from_str(&report).expect("valid JSON");
        assert_eq!(
            json.pointer("/summary/total").and_then(serde_json::Value::as_u64),
            Some(2)
        );
        assert_eq!(
            json.pointer("/summary/failed").and_then(serde_json::Value::as_u64),
            Some(0)
        );
        assert_eq!(
            json.pointer("/summary/phase_counts/production")
                .and_then(serde_json::Value::as_u64),
            Some(2)
        );
    }
}
