//! Integration tests for devdesc-tools
//!
//! These tests verify end-to-end functionality of device description
//! parsing, reconstruction, structural diffing and round-trip evaluation.

use devdesc_tools::diff::{DiffEngine, DiffEntryKind};
use devdesc_tools::model::{codes, FormatKind, NormalizedDevice, RawDocument, Scalar, Severity};
use devdesc_tools::parsers::{detect_format, parse_device, parse_device_str, ParseError};
use devdesc_tools::pipeline::{EvaluationReport, Evaluator};
use devdesc_tools::quality::{ThresholdRule, ThresholdSet};
use devdesc_tools::reconstruct::reconstruct;
use std::path::Path;

// ============================================================================
// Test Fixtures
// ============================================================================

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(FIXTURES_DIR).join(name)
}

fn fixture_document(name: &str, format: FormatKind) -> RawDocument {
    let content = std::fs::read_to_string(fixture_path(name)).expect("fixture should be readable");
    RawDocument::new(name, format, content)
}

// ============================================================================
// Parser Tests
// ============================================================================

mod parser_tests {
    use super::*;

    #[test]
    fn test_parse_eds_fixture() {
        let outcome =
            parse_device(&fixture_path("conveyor_drive.eds")).expect("Failed to parse EDS fixture");
        let model = &outcome.model;

        assert_eq!(model.format, FormatKind::Eds);
        assert_eq!(model.identity.vendor_id, Some(Scalar::int(68)));
        assert_eq!(
            model.identity.product_code,
            Some(Scalar::Int {
                value: 0x10E1,
                hex: true
            })
        );
        assert_eq!(
            model.identity.product_name,
            Some(Scalar::quoted_text("ConveyorFlex 200"))
        );

        let file_info = model.file_info.as_ref().expect("file section");
        assert_eq!(file_info.revision, Some(Scalar::Float { value: 2.4 }));

        assert_eq!(model.params.len(), 2);
        assert_eq!(model.enums.len(), 1);
        assert_eq!(model.assemblies.len(), 2);
        assert_eq!(model.connections.len(), 1);
        let capacity = model.capacity.as_ref().expect("capacity section");
        assert_eq!(capacity.tspecs.len(), 2);
        assert_eq!(model.record_count(), 6);

        assert!(
            outcome.diagnostics.is_empty(),
            "clean fixture raised: {:?}",
            outcome.diagnostics
        );
    }

    #[test]
    fn test_parse_eds_fixture_record_details() {
        let outcome = parse_device(&fixture_path("conveyor_drive.eds")).expect("parse");
        let model = &outcome.model;

        let speed = model.params.get(&1).expect("Param1");
        assert_eq!(speed.name, Some(Scalar::quoted_text("Target Speed")));
        assert_eq!(speed.units, Some(Scalar::quoted_text("rpm")));
        assert_eq!(speed.max, Some(Scalar::int(3000)));
        assert!(speed.raw_tail.is_empty());

        let choices = model.enums.get(&1).expect("Enum1");
        assert_eq!(choices.entries.len(), 3);
        assert_eq!(choices.entries[2].label, Scalar::quoted_text("Reverse"));

        let input = model.assemblies.get(&100).expect("Assem100");
        assert_eq!(input.members.len(), 2);
        assert_eq!(input.members[0].size, Some(Scalar::int(16)));
        // Skipped positional slots are recorded as present-but-empty.
        assert_eq!(input.reserved1, Some(Scalar::Empty));

        let owner = model.connections.get(&1).expect("Connection1");
        assert_eq!(owner.name, Some(Scalar::quoted_text("Exclusive Owner")));
        assert_eq!(owner.o2t_size, Some(Scalar::int(4)));
        assert_eq!(owner.config_format, Some(Scalar::Empty));
    }

    #[test]
    fn test_parse_iodd_fixture() {
        let outcome =
            parse_device(&fixture_path("level_sensor.xml")).expect("Failed to parse IODD fixture");
        let model = &outcome.model;

        assert_eq!(model.format, FormatKind::Iodd);
        assert_eq!(model.identity.vendor_id, Some(Scalar::int(888)));
        assert_eq!(model.identity.product_code, Some(Scalar::int(1204)));
        assert_eq!(
            model.identity.vendor_name,
            Some(Scalar::bare_text("Hydronic Sensors AG"))
        );

        assert_eq!(model.params.len(), 2);
        let level = model.params.get(&64).expect("fill level variable");
        assert_eq!(level.id.as_deref(), Some("V_FillLevel"));
        assert_eq!(level.data_size, Some(Scalar::int(16)));
        assert_eq!(level.max, Some(Scalar::int(4000)));

        let pd = model.process_data.get("PD_Level").expect("process data");
        assert_eq!(pd.bit_length, Some(Scalar::int(16)));

        assert_eq!(model.menus.len(), 2);
        assert_eq!(model.texts.primary_language.as_deref(), Some("en"));
        assert_eq!(model.texts.text_count(), 9);

        assert!(
            outcome.diagnostics.is_empty(),
            "clean fixture raised: {:?}",
            outcome.diagnostics
        );
    }

    #[test]
    fn test_parse_vendor_dialect_fixture() {
        let outcome =
            parse_device(&fixture_path("flow_meter.eds")).expect("Failed to parse dialect fixture");
        let model = &outcome.model;

        // VendorCode is a synonym spelling; the value lands in the typed
        // field and the spelling is retained for reconstruction.
        assert_eq!(model.identity.vendor_id, Some(Scalar::int(152)));
        let extra_keys: Vec<_> = model
            .identity
            .extras
            .iter()
            .map(|e| e.key.as_str())
            .collect();
        assert_eq!(extra_keys, vec!["VendorCode", "IconFile"]);

        let flow = model.params.get(&1).expect("Param1");
        assert_eq!(flow.raw_tail, vec!["250".to_string(), "1".to_string()]);

        // The combined spelling feeds both capacity fields.
        let capacity = model.capacity.as_ref().expect("capacity");
        assert_eq!(capacity.max_io_producers, Some(Scalar::int(3)));
        assert_eq!(capacity.max_io_consumers, Some(Scalar::int(3)));

        assert_eq!(model.opaque_sections.len(), 1);
        assert_eq!(model.opaque_sections[0].name, "Port");

        assert_eq!(outcome.error_count(), 0);
        assert_eq!(outcome.warning_count(), 1);
        assert_eq!(outcome.diagnostics.len(), 5);
    }

    #[test]
    fn test_parse_damaged_fixture_reports_error() {
        let outcome = parse_device(&fixture_path("legacy_actuator.eds"))
            .expect("recoverable damage must still parse");
        let model = &outcome.model;

        // The entry that lost its '=' is skipped; everything else survives.
        assert_eq!(model.identity.product_type, None);
        assert_eq!(model.identity.vendor_id, Some(Scalar::int(77)));
        assert_eq!(
            model.identity.product_name,
            Some(Scalar::quoted_text("QuarterTurn 45"))
        );

        assert_eq!(outcome.error_count(), 1);
        let error = outcome
            .diagnostics
            .iter()
            .find(|d| d.severity == Severity::Error)
            .expect("error diagnostic");
        assert_eq!(error.code, codes::MALFORMED_ENTRY);
    }

    #[test]
    fn test_format_detection() {
        let eds = std::fs::read_to_string(fixture_path("conveyor_drive.eds")).unwrap();
        let detected = detect_format(&eds).expect("EDS content should be detected");
        assert_eq!(detected.format_name, "EDS");
        assert_eq!(detected.variant.as_deref(), Some("sectioned-text"));
        assert_eq!(detected.version.as_deref(), Some("2.4"));

        let iodd = std::fs::read_to_string(fixture_path("level_sensor.xml")).unwrap();
        let detected = detect_format(&iodd).expect("IODD content should be detected");
        assert_eq!(detected.format_name, "IODD");
        assert_eq!(detected.variant.as_deref(), Some("xml"));
        assert_eq!(detected.version.as_deref(), Some("1.0.1"));
    }

    #[test]
    fn test_unknown_format_error() {
        let err =
            parse_device_str("just prose, no structure at all").expect_err("prose must not parse");
        assert!(matches!(err, ParseError::UnknownFormat(_)));
    }
}

// ============================================================================
// Reconstruction Tests
// ============================================================================

mod reconstruct_tests {
    use super::*;

    fn assert_reparses_equal(name: &str) {
        let outcome = parse_device(&fixture_path(name)).expect("parse");
        let rendered = reconstruct(&outcome.model).expect("reconstruct");
        let reparsed = parse_device_str(&rendered.content).expect("re-parse");
        assert_eq!(
            outcome.model, reparsed.model,
            "re-parsed model differs for {name}; rendered:\n{}",
            rendered.content
        );
    }

    #[test]
    fn test_eds_roundtrip_reparses_equal() {
        assert_reparses_equal("conveyor_drive.eds");
    }

    #[test]
    fn test_iodd_roundtrip_reparses_equal() {
        assert_reparses_equal("level_sensor.xml");
    }

    #[test]
    fn test_vendor_dialect_roundtrip_preserves_spellings() {
        let outcome = parse_device(&fixture_path("flow_meter.eds")).expect("parse");
        let rendered = reconstruct(&outcome.model).expect("reconstruct");

        assert!(rendered.content.contains("VendorCode = 152;"));
        assert!(!rendered.content.contains("VendCode = 152;"));
        assert!(rendered.content.contains("IconFile = \"flowsense.ico\";"));
        assert!(rendered.content.contains("[Port]"));

        let reparsed = parse_device_str(&rendered.content).expect("re-parse");
        assert_eq!(outcome.model, reparsed.model);
    }

    #[test]
    fn test_reconstructed_format_matches_source() {
        let outcome = parse_device(&fixture_path("level_sensor.xml")).expect("parse");
        let rendered = reconstruct(&outcome.model).expect("reconstruct");

        assert_eq!(rendered.format, FormatKind::Iodd);
        assert!(rendered.content.starts_with("<?xml"));
        assert!(rendered.content.contains("<IODevice"));
    }
}

// ============================================================================
// Diff Engine Tests
// ============================================================================

mod diff_tests {
    use super::*;

    fn roundtrip_models(name: &str) -> (NormalizedDevice, NormalizedDevice) {
        let outcome = parse_device(&fixture_path(name)).expect("parse");
        let rendered = reconstruct(&outcome.model).expect("reconstruct");
        let reparsed = parse_device_str(&rendered.content).expect("re-parse");
        (outcome.model, reparsed.model)
    }

    #[test]
    fn test_diff_faithful_roundtrip_is_lossless() {
        let (original, reparsed) = roundtrip_models("conveyor_drive.eds");
        let diff = DiffEngine::new().diff(&original, &reparsed).expect("diff");

        assert!(diff.is_lossless());
        assert_eq!(diff.summary.missing, 0);
        assert_eq!(diff.summary.value_mismatches, 0);
        assert!(diff.total_field_count > 0);
    }

    #[test]
    fn test_diff_detects_dropped_parameter() {
        let (original, mut mutated) = roundtrip_models("conveyor_drive.eds");
        mutated.params.shift_remove(&2);
        mutated.calculate_content_hash();

        let diff = DiffEngine::new().diff(&original, &mutated).expect("diff");
        assert!(!diff.is_lossless());
        assert_eq!(diff.summary.missing, 1);
        assert!(diff
            .entries_of(DiffEntryKind::Missing)
            .any(|e| e.location.to_string().contains("params/2")));
    }

    #[test]
    fn test_diff_detects_value_mismatch() {
        let (original, mut mutated) = roundtrip_models("level_sensor.xml");
        if let Some(param) = mutated.params.get_mut(&64) {
            param.max = Some(Scalar::int(9999));
        }
        mutated.calculate_content_hash();

        let diff = DiffEngine::new().diff(&original, &mutated).expect("diff");
        assert_eq!(diff.summary.value_mismatches, 1);
        let entry = diff
            .entries_of(DiffEntryKind::ValueMismatch)
            .next()
            .expect("mismatch entry");
        assert_eq!(entry.original_value.as_deref(), Some("4000"));
        assert_eq!(entry.reconstructed_value.as_deref(), Some("9999"));
    }

    #[test]
    fn test_diff_rejects_cross_format_models() {
        let (eds, _) = roundtrip_models("conveyor_drive.eds");
        let (iodd, _) = roundtrip_models("level_sensor.xml");

        assert!(DiffEngine::new().diff(&eds, &iodd).is_err());
    }
}

// ============================================================================
// Evaluator Tests
// ============================================================================

mod evaluator_tests {
    use super::*;

    fn evaluate_fixture(name: &str, format: FormatKind) -> EvaluationReport {
        let document = fixture_document(name, format);
        let evaluator = Evaluator::new();
        let outcome = evaluator.parse_document(&document).expect("parse");
        evaluator.evaluate(&document, &outcome).expect("evaluate")
    }

    #[test]
    fn test_evaluate_clean_eds_gates_production() {
        let report = evaluate_fixture("conveyor_drive.eds", FormatKind::Eds);

        assert!(report.is_lossless());
        assert!((report.metric.completeness_score - 100.0).abs() < 1e-9);
        assert_eq!(report.metric.phase, "production");
        assert_eq!(report.metric.error_count, 0);
        assert_eq!(report.metric.warning_count, 0);
    }

    #[test]
    fn test_evaluate_clean_iodd_gates_production() {
        let report = evaluate_fixture("level_sensor.xml", FormatKind::Iodd);

        assert!(report.is_lossless());
        assert_eq!(report.metric.phase, "production");
    }

    #[test]
    fn test_evaluate_vendor_dialect_still_production() {
        // One warning is inside the production gate's allowance, and the
        // retained spellings keep the round trip lossless.
        let report = evaluate_fixture("flow_meter.eds", FormatKind::Eds);

        assert!(report.is_lossless());
        assert_eq!(report.metric.warning_count, 1);
        assert_eq!(report.metric.phase, "production");
    }

    #[test]
    fn test_evaluate_damaged_sheet_gates_review() {
        // The skipped entry never reaches the model, so the round trip is
        // lossless, but the error diagnostic demotes the phase.
        let report = evaluate_fixture("legacy_actuator.eds", FormatKind::Eds);

        assert!(report.is_lossless());
        assert!((report.metric.completeness_score - 100.0).abs() < 1e-9);
        assert_eq!(report.metric.error_count, 1);
        assert_eq!(report.metric.phase, "review");
    }

    #[test]
    fn test_custom_thresholds_change_phase() {
        let strict = ThresholdSet::new(vec![
            ThresholdRule::catch_all("ship")
                .with_min_score(100.0)
                .with_max_errors(0),
            ThresholdRule::catch_all("hold"),
        ]);
        let document = fixture_document("legacy_actuator.eds", FormatKind::Eds);
        let evaluator = Evaluator::new().with_thresholds(strict);
        let outcome = evaluator.parse_document(&document).expect("parse");
        let report = evaluator.evaluate(&document, &outcome).expect("evaluate");

        // Perfect score, but the error count fails the first rule.
        assert_eq!(report.metric.phase, "hold");
    }

    #[test]
    fn test_evaluate_rejects_mismatched_document() {
        let document = fixture_document("conveyor_drive.eds", FormatKind::Eds);
        let evaluator = Evaluator::new();
        let outcome = evaluator.parse_document(&document).expect("parse");

        let mislabeled = RawDocument::new("other.xml", FormatKind::Iodd, "<IODevice/>");
        assert!(evaluator.evaluate(&mislabeled, &outcome).is_err());
    }
}
