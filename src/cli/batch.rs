//! Batch command handler.
//!
//! Implements the `batch` subcommand: scan a directory tree for device
//! descriptions, run every file through the pipeline in parallel, and
//! aggregate the results.

use crate::config::AppConfig;
use crate::model::FormatKind;
use crate::pipeline::{
    auto_detect_format, exit_codes, read_document, should_use_color, write_output,
    DocumentOutcome, OutputTarget, PipelineRunner,
};
use crate::quality::{JsonlHistorySink, MetricSink};
use crate::reports::create_reporter_with_options;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use super::{build_evaluator, phase_meets_gate, resolve_gate};

/// Run the batch command, returning the desired exit code.
///
/// One broken vendor file never aborts the batch; it shows up as a
/// failed outcome and drives the exit code instead.
pub fn run_batch(dir: PathBuf, gate: Option<String>, app: &AppConfig, quiet: bool) -> Result<i32> {
    // Resolve the gate before doing any work so a typo fails fast.
    let gate_rank = match &gate {
        Some(label) => Some(resolve_gate(&app.thresholds, label)?),
        None => None,
    };

    let paths = scan_device_files(&dir)?;
    if !quiet {
        tracing::info!(
            "Found {} device description files under {}",
            paths.len(),
            dir.display()
        );
    }

    let mut documents = Vec::with_capacity(paths.len());
    for path in &paths {
        match read_document(path, None, true) {
            Ok(document) => documents.push(document),
            Err(err) => tracing::warn!("Skipping {}: {err}", path.display()),
        }
    }
    if documents.is_empty() {
        bail!(
            "None of the {} files under {} could be read",
            paths.len(),
            dir.display()
        );
    }

    let runner = PipelineRunner::new()
        .with_evaluator(build_evaluator(app))
        .jobs(app.batch.jobs);

    let mut sink = match &app.batch.history {
        Some(path) => Some(JsonlHistorySink::open(path)?),
        None => None,
    };
    let batch = runner.run_batch(
        &documents,
        sink.as_mut().map(|s| s as &mut dyn MetricSink),
    )?;

    let target = OutputTarget::from_option(app.output.file.clone());
    let report_format = auto_detect_format(app.output.format, &target);
    let use_color = should_use_color(app.output.no_color) && target.is_terminal();
    let reporter = create_reporter_with_options(report_format, use_color);
    let report = reporter.generate_batch_report(&batch)?;
    write_output(&report, &target, quiet)?;

    // Exit precedence: parse failure, then pipeline error, then gate.
    if batch.outcomes.iter().any(|o| o.stage.is_none()) {
        return Ok(exit_codes::PARSE_FAILED);
    }
    if batch.outcomes.iter().any(DocumentOutcome::is_fatal) {
        return Ok(exit_codes::ERROR);
    }
    if let Some(rank) = gate_rank {
        let failing = batch
            .outcomes
            .iter()
            .filter(|o| !phase_meets_gate(&app.thresholds, o.phase(), rank))
            .count();
        if failing > 0 {
            if !quiet {
                tracing::warn!(
                    failing,
                    gate = gate.as_deref().unwrap_or_default(),
                    "gate not met"
                );
            }
            return Ok(exit_codes::GATE_FAILED);
        }
    }

    Ok(exit_codes::SUCCESS)
}

/// Recursively collect device description files under `dir`, sorted by
/// path for stable report ordering.
fn scan_device_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let mut paths = Vec::new();
    collect_device_files(dir, &mut paths);
    if paths.is_empty() {
        bail!(
            "No device description files (*.eds, *.xml, *.iodd) found under {}",
            dir.display()
        );
    }
    paths.sort();
    Ok(paths)
}

/// Depth-first walk. Unreadable directories are logged and skipped.
fn collect_device_files(dir: &Path, paths: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!("Cannot read directory {}: {err}", dir.display());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_device_files(&path, paths);
        } else if FormatKind::from_extension(&path).is_some() {
            paths.push(path);
        }
    }
}
