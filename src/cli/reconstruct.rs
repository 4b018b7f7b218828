//! Reconstruct command handler.
//!
//! Implements the `reconstruct` subcommand: parse one device description
//! and emit the document regenerated from the normalized model.

use crate::config::AppConfig;
use crate::model::FormatKind;
use crate::pipeline::{exit_codes, read_document, write_output, OutputTarget};
use crate::parsers::FormatDetector;
use crate::reconstruct::Reconstructor;
use anyhow::Result;
use std::path::PathBuf;

/// Run the reconstruct command, returning the desired exit code.
///
/// The regenerated document goes to stdout unless an output file is
/// configured, so `devdesc-tools reconstruct dev.eds > copy.eds` works.
pub fn run_reconstruct(
    path: PathBuf,
    format: Option<FormatKind>,
    app: &AppConfig,
    quiet: bool,
) -> Result<i32> {
    let document = read_document(&path, format, quiet)?;
    let synonyms = app.synonym_table();
    let detector = FormatDetector::with_synonyms(synonyms.clone());

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

    let reconstructed = Reconstructor::with_synonyms(synonyms).reconstruct(&outcome.model)?;

    if !quiet {
        tracing::info!(
            "Reconstructed {} bytes from {} typed fields",
            reconstructed.content.len(),
            outcome.model.typed_field_count()
        );
    }

    let target = OutputTarget::from_option(app.output.file.clone());
    write_output(&reconstructed.content, &target, quiet)?;

    Ok(exit_codes::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_run_reconstruct_writes_output_file() {
        let source = write_temp(
            "[File]\nDescText = \"Sensor\";\n\n[Device]\nVendCode = 5;\n",
            ".eds",
        );
        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("rebuilt.eds");

        let app = AppConfig::builder()
            .output_file(Some(out_path.clone()))
            .build();
        let code = run_reconstruct(source.path().to_path_buf(), None, &app, true).unwrap();

        assert_eq!(code, exit_codes::SUCCESS);
        let rebuilt = std::fs::read_to_string(&out_path).unwrap();
        assert!(rebuilt.contains("[File]"));
        assert!(rebuilt.contains("VendCode = 5;"));
    }

    #[test]
    fn test_run_reconstruct_rejects_unparseable_input() {
        let source = write_temp("not a device description at all\n", ".eds");
        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("rebuilt.eds");

        let app = AppConfig::builder()
            .output_file(Some(out_path.clone()))
            .build();
        let code = run_reconstruct(source.path().to_path_buf(), None, &app, true).unwrap();

        assert_eq!(code, exit_codes::PARSE_FAILED);
        assert!(!out_path.exists());
    }
}
