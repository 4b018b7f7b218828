//! Parse command handler.
//!
//! Implements the `parse` subcommand: parse one device description and
//! print the normalized model plus a diagnostics summary.

use crate::config::AppConfig;
use crate::model::{FormatKind, RawDocument};
use crate::parsers::{FormatDetector, ParseOutcome};
use crate::pipeline::{
    auto_detect_format, exit_codes, read_document, write_output, OutputTarget,
};
use crate::reports::ReportFormat;
use anyhow::Result;
use serde_json::json;
use std::path::PathBuf;

/// Run the parse command, returning the desired exit code.
///
/// The caller is responsible for calling `std::process::exit()` with the
/// returned code when it is non-zero.
pub fn run_parse(
    path: PathBuf,
    format: Option<FormatKind>,
    app: &AppConfig,
    quiet: bool,
) -> Result<i32> {
    let document = read_document(&path, format, quiet)?;
    let detector = FormatDetector::with_synonyms(app.synonym_table());

    let outcome = match detector.parse_with_format(&document.content, document.format) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("Parse failed: {err}");
            for diagnostic in err.diagnostics() {
                eprintln!("  {diagnostic}");
            }
            return Ok(exit_codes::PARSE_FAILED);
        }
    };

    if !quiet {
        tracing::info!(
            "Parsed {} typed fields, {} diagnostics",
            outcome.model.typed_field_count(),
            outcome.diagnostics.len()
        );
    }

    let target = OutputTarget::from_option(app.output.file.clone());
    let content = match auto_detect_format(app.output.format, &target) {
        ReportFormat::Json => render_json(&document, &outcome),
        _ => render_summary(&document, &outcome),
    };
    write_output(&content, &target, quiet)?;

    Ok(exit_codes::SUCCESS)
}

/// Render the model and diagnostics as pretty JSON.
fn render_json(document: &RawDocument, outcome: &ParseOutcome) -> String {
    let output = json!({
        "tool": "devdesc-tools",
        "version": env!("CARGO_PKG_VERSION"),
        "document": document.id,
        "format": document.format.name(),
        "model": outcome.model,
        "diagnostics": outcome.diagnostics,
    });
    serde_json::to_string_pretty(&output).unwrap_or_default()
}

/// Render a human-readable model summary.
fn render_summary(document: &RawDocument, outcome: &ParseOutcome) -> String {
    let model = &outcome.model;
    let mut lines = Vec::new();

    lines.push(format!("Device Description: {}", document.id));
    lines.push(format!("Format: {}", document.format.name().to_uppercase()));
    if let Some(name) = &model.identity.product_name {
        lines.push(format!("Product: {name}"));
    }
    lines.push(String::new());

    lines.push(format!("Typed fields:    {}", model.typed_field_count()));
    lines.push(format!("Parameters:      {}", model.params.len()));
    lines.push(format!("Enum sets:       {}", model.enums.len()));
    lines.push(format!("Assemblies:      {}", model.assemblies.len()));
    lines.push(format!("Connections:     {}", model.connections.len()));
    if !model.process_data.is_empty() {
        lines.push(format!("Process data:    {}", model.process_data.len()));
    }
    if !model.menus.is_empty() {
        lines.push(format!("Menus:           {}", model.menus.len()));
    }
    if !model.texts.is_empty() {
        lines.push(format!("Texts:           {}", model.texts.text_count()));
    }
    if !model.opaque_sections.is_empty() {
        lines.push(format!("Opaque sections: {}", model.opaque_sections.len()));
    }
    lines.push(String::new());

    if outcome.diagnostics.is_empty() {
        lines.push("No diagnostics.".to_string());
    } else {
        lines.push(format!(
            "Diagnostics: {} errors, {} warnings",
            outcome.error_count(),
            outcome.warning_count()
        ));
        for diagnostic in &outcome.diagnostics {
            lines.push(format!("  {diagnostic}"));
        }
    }

    lines.join("\n")
}
