//! Document ingestion for CLI commands.
//!
//! Reads device description files into [`RawDocument`]s, resolving the
//! format from an explicit override, the file extension, or content
//! detection, in that order.

use crate::model::{FormatKind, RawDocument};
use crate::parsers::{FormatDetector, MAX_DEVICE_FILE_SIZE};
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Read a device description file into a [`RawDocument`].
///
/// Fails when the file is unreadable, exceeds
/// [`MAX_DEVICE_FILE_SIZE`](crate::parsers::MAX_DEVICE_FILE_SIZE), or no
/// format can be determined.
pub fn read_document(
    path: &Path,
    format: Option<FormatKind>,
    quiet: bool,
) -> Result<RawDocument> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read device file: {}", path.display()))?;
    if metadata.len() > MAX_DEVICE_FILE_SIZE {
        bail!(
            "{} is {} bytes, over the {} byte limit",
            path.display(),
            metadata.len(),
            MAX_DEVICE_FILE_SIZE
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read device file: {}", path.display()))?;

    let format = match format.or_else(|| FormatKind::from_extension(path)) {
        Some(format) => format,
        None => detect_or_bail(path, &content)?,
    };

    let document = RawDocument::new(path.display().to_string(), format, content);
    if !quiet {
        tracing::info!(
            "Read {} as {} ({})",
            path.display(),
            format.name(),
            crate::utils::short_hash(document.content_hash)
        );
    }

    Ok(document)
}

fn detect_or_bail(path: &Path, content: &str) -> Result<FormatKind> {
    let detection = FormatDetector::new().detect_from_content(content);
    if let Some(parser) = detection.parser {
        if detection.can_parse() {
            tracing::debug!(
                format = parser.name(),
                confidence = detection.confidence.value(),
                "detected format from content"
            );
            return Ok(parser.format());
        }
    }
    bail!(
        "Cannot determine the format of {}; pass --format eds or --format iodd",
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_read_document_honors_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sensor.eds");
        std::fs::write(&path, "[Device]\nVendCode = 12;\n").unwrap();

        let doc = read_document(&path, None, true).unwrap();
        assert_eq!(doc.format, FormatKind::Eds);
        assert!(doc.content.contains("VendCode"));
    }

    #[test]
    fn test_read_document_explicit_format_wins() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sensor.eds");
        std::fs::write(&path, "[Device]\nVendCode = 12;\n").unwrap();

        let doc = read_document(&path, Some(FormatKind::Iodd), true).unwrap();
        assert_eq!(doc.format, FormatKind::Iodd);
    }

    #[test]
    fn test_read_document_detects_without_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("device-description");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[File]").unwrap();
        writeln!(file, "DescText = \"coupler\";").unwrap();
        writeln!(file, "[Device]").unwrap();
        writeln!(file, "VendCode = 12;").unwrap();

        let doc = read_document(&path, None, true).unwrap();
        assert_eq!(doc.format, FormatKind::Eds);
    }

    #[test]
    fn test_read_document_missing_file() {
        let result = read_document(Path::new("/nonexistent/device.eds"), None, true);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_document_undetectable_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes");
        std::fs::write(&path, "plain prose, no sections at all").unwrap();

        let result = read_document(&path, None, true);
        assert!(result.is_err());
    }
}
