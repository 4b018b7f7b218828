//! Evaluate command handler.
//!
//! Implements the `evaluate` subcommand: run one device description
//! through the full pipeline and report its fidelity score and phase.

use crate::config::AppConfig;
use crate::model::FormatKind;
use crate::pipeline::{
    auto_detect_format, exit_codes, read_document, should_use_color, write_output, OutputTarget,
    PipelineRunner,
};
use crate::reports::create_reporter_with_options;
use anyhow::Result;
use std::path::PathBuf;

use super::{build_evaluator, phase_meets_gate, resolve_gate};

/// Run the evaluate command, returning the desired exit code.
///
/// With `--gate PHASE` the exit code reflects whether the document's
/// assigned phase is at least as good as the named one, so CI jobs can
/// fail on regressions without parsing the report.
pub fn run_evaluate(
    path: PathBuf,
    format: Option<FormatKind>,
    gate: Option<String>,
    app: &AppConfig,
    quiet: bool,
) -> Result<i32> {
    // Resolve the gate before doing any work so a typo fails fast.
    let gate_rank = match &gate {
        Some(label) => Some(resolve_gate(&app.thresholds, label)?),
        None => None,
    };

    let document = read_document(&path, format, quiet)?;
    let runner = PipelineRunner::new().with_evaluator(build_evaluator(app));
    let outcome = runner.run_document(&document, None);

    let target = OutputTarget::from_option(app.output.file.clone());
    let report_format = auto_detect_format(app.output.format, &target);
    let use_color = should_use_color(app.output.no_color) && target.is_terminal();
    let reporter = create_reporter_with_options(report_format, use_color);

    let report = reporter.generate_document_report(&outcome)?;
    write_output(&report, &target, quiet)?;

    if outcome.stage.is_none() {
        return Ok(exit_codes::PARSE_FAILED);
    }
    if outcome.is_fatal() {
        return Ok(exit_codes::ERROR);
    }
    if let Some(rank) = gate_rank {
        if !phase_meets_gate(&app.thresholds, outcome.phase(), rank) {
            if !quiet {
                tracing::warn!(
                    document = %outcome.document_id,
                    phase = outcome.phase().unwrap_or("unscored"),
                    gate = gate.as_deref().unwrap_or_default(),
                    "gate not met"
                );
            }
            return Ok(exit_codes::GATE_FAILED);
        }
    }

    Ok(exit_codes::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    const GOOD_EDS: &str = "[File]\nDescText = \"Valve coupler\";\nRevision = 1.2;\n\n\
        [Device]\nVendCode = 12;\nProdName = \"Valve A\";\n";

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".eds").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn app_writing_to(path: PathBuf) -> AppConfig {
        AppConfig::builder().output_file(Some(path)).build()
    }

    #[test]
    fn test_run_evaluate_good_document_passes_production_gate() {
        let source = write_temp(GOOD_EDS);
        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("report.json");

        let app = app_writing_to(out_path.clone());
        let code = run_evaluate(
            source.path().to_path_buf(),
            None,
            Some("production".to_string()),
            &app,
            true,
        )
        .unwrap();

        assert_eq!(code, exit_codes::SUCCESS);
        assert!(out_path.exists());
    }

    #[test]
    fn test_run_evaluate_rejects_unknown_gate() {
        let source = write_temp(GOOD_EDS);
        let app = AppConfig::default();

        let result = run_evaluate(
            source.path().to_path_buf(),
            None,
            Some("shipit".to_string()),
            &app,
            true,
        );

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown gate"));
    }

    #[test]
    fn test_run_evaluate_parse_failure_exits_with_parse_code() {
        let source = write_temp("no sections here\n");
        let out_dir = tempfile::tempdir().unwrap();
        let app = app_writing_to(out_dir.path().join("report.txt"));

        let code = run_evaluate(source.path().to_path_buf(), None, None, &app, true).unwrap();

        assert_eq!(code, exit_codes::PARSE_FAILED);
    }
}
