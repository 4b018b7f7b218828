//! Device description parsers.
//!
//! This module provides parsers for the EDS (sectioned key/value text) and
//! IODD (XML) device description formats, converting them to the normalized
//! intermediate representation.
//!
//! ## Format Detection
//!
//! The module uses a confidence-based detection system to identify formats:
//! - Each parser reports a confidence score (0.0-1.0) for handling content
//! - The parser with the highest confidence is selected
//! - Detection includes dialect variant and file revision information
//!
//! ## Usage
//!
//! ```no_run
//! use devdesc_tools::parsers::{parse_device, detect_format};
//! use std::path::Path;
//!
//! // Auto-detect and parse
//! let outcome = parse_device(Path::new("device.eds")).unwrap();
//!
//! // Check format before parsing
//! let content = std::fs::read_to_string("device.eds").unwrap();
//! if let Some(detection) = detect_format(&content) {
//!     println!("Detected: {} ({})", detection.format_name, detection.confidence);
//! }
//! ```

mod detection;
mod eds;
mod iodd;
mod synonyms;
mod traits;

pub use detection::{DetectionResult, FormatDetector, ParserKind, MIN_CONFIDENCE_THRESHOLD};
pub(crate) use eds::clean_value;
pub use eds::EdsParser;
pub use iodd::IoddParser;
pub use synonyms::{SynonymHit, SynonymTable};
pub use traits::{
    DeviceParser, FormatConfidence, FormatDetection, ParseError, ParseOutcome,
};

use crate::model::FormatKind;
use std::path::Path;

/// Result of format detection
#[derive(Debug, Clone)]
pub struct DetectedFormat {
    /// Name of the detected format
    pub format_name: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// Detected variant (e.g., "sectioned-text", "xml")
    pub variant: Option<String>,
    /// Detected file revision if available
    pub version: Option<String>,
    /// Any warnings about the detection
    pub warnings: Vec<String>,
}

/// Detect device description format from content without parsing
///
/// Returns None if no format could be detected with sufficient confidence.
pub fn detect_format(content: &str) -> Option<DetectedFormat> {
    let detector = FormatDetector::new();
    let result = detector.detect_from_content(content);

    if result.can_parse() {
        Some(DetectedFormat {
            format_name: result
                .parser
                .map(|p| p.name().to_string())
                .unwrap_or_default(),
            confidence: result.confidence.value(),
            variant: result.variant,
            version: result.version,
            warnings: result.warnings,
        })
    } else {
        None
    }
}

/// Maximum device description file size (64 MB). Real EDS and IODD files are
/// a few hundred kilobytes at most; anything larger is rejected to prevent OOM.
pub const MAX_DEVICE_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Detect device description format from file content and parse accordingly
///
/// Uses confidence-based detection to select the best parser.
/// Returns an error if the file exceeds [`MAX_DEVICE_FILE_SIZE`].
pub fn parse_device(path: &Path) -> Result<ParseOutcome, ParseError> {
    let metadata = std::fs::metadata(path).map_err(|e| ParseError::IoError(e.to_string()))?;
    if metadata.len() > MAX_DEVICE_FILE_SIZE {
        return Err(ParseError::TooLarge {
            size: metadata.len(),
            limit: MAX_DEVICE_FILE_SIZE,
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| ParseError::IoError(e.to_string()))?;
    parse_device_str(&content)
}

/// Parse a device description from string content
///
/// Uses confidence-based detection to select the best parser.
pub fn parse_device_str(content: &str) -> Result<ParseOutcome, ParseError> {
    let detector = FormatDetector::new();
    detector.parse_str(content)
}

/// Parse a device description whose format the caller already knows.
///
/// Skips detection entirely; the declared format's parser is used even if
/// the content looks like something else, so mismatches fail loudly.
pub fn parse_device_with_format(
    content: &str,
    format: FormatKind,
) -> Result<ParseOutcome, ParseError> {
    let detector = FormatDetector::new();
    detector.parse_with_format(content, format)
}
