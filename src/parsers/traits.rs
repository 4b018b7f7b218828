//! Parser trait definitions and error types.
//!
//! This module defines the `DeviceParser` trait for format-specific parsers
//! and provides format detection through confidence scoring.
//!
//! Parsers are tolerant by contract: recoverable problems become
//! [`Diagnostic`](crate::model::Diagnostic) entries in the returned
//! [`ParseOutcome`], and only documents with no recognizable structure fail.

use crate::model::{Diagnostic, FormatKind, NormalizedDevice};
use std::path::Path;
use thiserror::Error;

/// Fatal errors that abort parsing of a document.
///
/// Fatal variants carry the diagnostics collected before the failure so
/// callers still get full provenance.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("no recognized sections in document")]
    NoRecognizedSections { diagnostics: Vec<Diagnostic> },

    #[error("unparseable root element: {message}")]
    InvalidRoot {
        message: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("XML parse error: {0}")]
    XmlError(String),

    #[error("Unknown device description format: {0}")]
    UnknownFormat(String),

    #[error("Document too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
}

impl ParseError {
    /// Diagnostics collected before the fatal condition, when any.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::NoRecognizedSections { diagnostics }
            | Self::InvalidRoot { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlError(err.to_string())
    }
}

/// A successful parse: the normalized model plus everything the parser
/// wants to say about the input. Diagnostics are in document order.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub model: NormalizedDevice,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutcome {
    #[must_use]
    pub fn new(model: NormalizedDevice, diagnostics: Vec<Diagnostic>) -> Self {
        Self { model, diagnostics }
    }

    /// Number of `Error`-severity diagnostics
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == crate::model::Severity::Error)
            .count()
    }

    /// Number of `Warning`-severity diagnostics
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == crate::model::Severity::Warning)
            .count()
    }
}

/// Confidence level for format detection
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FormatConfidence(f32);

impl FormatConfidence {
    /// No confidence - definitely not this format
    pub const NONE: Self = Self(0.0);
    /// Low confidence - might be this format
    pub const LOW: Self = Self(0.25);
    /// Medium confidence - likely this format
    pub const MEDIUM: Self = Self(0.5);
    /// High confidence - almost certainly this format
    pub const HIGH: Self = Self(0.75);
    /// Certain - definitely this format
    pub const CERTAIN: Self = Self(1.0);

    /// Create a new confidence value
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    /// Get the confidence value
    #[must_use]
    pub const fn value(&self) -> f32 {
        self.0
    }

    /// Check if this confidence indicates the format can be parsed
    #[must_use]
    pub fn can_parse(&self) -> bool {
        self.0 >= 0.25
    }
}

impl Default for FormatConfidence {
    fn default() -> Self {
        Self::NONE
    }
}

/// Detection result from a parser
#[derive(Debug, Clone)]
pub struct FormatDetection {
    /// Confidence that this parser can handle the content
    pub confidence: FormatConfidence,
    /// Detected dialect variant (e.g., "sectioned-text", "xml")
    pub variant: Option<String>,
    /// Detected schema/file revision if visible without full parsing
    pub version: Option<String>,
    /// Any issues detected that might affect parsing
    pub warnings: Vec<String>,
}

impl FormatDetection {
    /// Create a detection result indicating no match
    #[must_use]
    pub const fn no_match() -> Self {
        Self {
            confidence: FormatConfidence::NONE,
            variant: None,
            version: None,
            warnings: Vec::new(),
        }
    }

    /// Create a detection result with confidence
    #[must_use]
    pub const fn with_confidence(confidence: FormatConfidence) -> Self {
        Self {
            confidence,
            variant: None,
            version: None,
            warnings: Vec::new(),
        }
    }

    /// Set the detected variant
    #[must_use]
    pub fn variant(mut self, variant: &str) -> Self {
        self.variant = Some(variant.to_string());
        self
    }

    /// Set the detected version
    #[must_use]
    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Add a warning
    #[must_use]
    pub fn warning(mut self, warning: &str) -> Self {
        self.warnings.push(warning.to_string());
        self
    }
}

/// Trait for device description format parsers
///
/// Implementors provide format detection via `detect()` and parsing via
/// `parse_str()`. Detection allows format selection without expensive
/// trial-and-error parsing.
pub trait DeviceParser {
    /// Parse a device description from a file path
    fn parse(&self, path: &Path) -> Result<ParseOutcome, ParseError> {
        let content = std::fs::read_to_string(path)?;
        self.parse_str(&content)
    }

    /// Parse a device description from string content
    fn parse_str(&self, content: &str) -> Result<ParseOutcome, ParseError>;

    /// The format this parser produces
    fn format(&self) -> FormatKind;

    /// Get format name
    fn format_name(&self) -> &str {
        self.format().name()
    }

    /// Detect if this parser can handle the given content
    ///
    /// This performs lightweight structural checks without full parsing.
    fn detect(&self, content: &str) -> FormatDetection;

    /// Quick check if this parser can likely handle the content
    fn can_parse(&self, content: &str) -> bool {
        self.detect(content).confidence.can_parse()
    }

    /// Get confidence score for parsing this content
    fn confidence(&self, content: &str) -> FormatConfidence {
        self.detect(content).confidence
    }
}
