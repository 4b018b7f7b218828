//! Centralized format detection for device description parsers.
//!
//! Both parsers expose a lightweight `detect()`; this module runs them
//! side by side with a shared confidence threshold so callers get one
//! consistent answer instead of trial-and-error parsing.

use super::synonyms::SynonymTable;
use super::traits::{DeviceParser, FormatConfidence, FormatDetection, ParseError, ParseOutcome};
use super::{EdsParser, IoddParser};
use crate::model::FormatKind;

/// Minimum confidence threshold for accepting a format detection.
/// This is LOW confidence (0.25) - the parser believes it might be able to
/// handle the content.
pub const MIN_CONFIDENCE_THRESHOLD: f32 = 0.25;

/// Parser type identified during detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    Eds,
    Iodd,
}

impl ParserKind {
    /// Get the human-readable name for this parser.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Eds => "EDS",
            Self::Iodd => "IODD",
        }
    }

    /// The format this parser produces.
    #[must_use]
    pub const fn format(&self) -> FormatKind {
        match self {
            Self::Eds => FormatKind::Eds,
            Self::Iodd => FormatKind::Iodd,
        }
    }
}

/// Result of format detection.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// The parser that should handle this content, if detected.
    pub parser: Option<ParserKind>,
    /// Confidence level of the detection.
    pub confidence: FormatConfidence,
    /// Detected dialect variant (e.g., "sectioned-text", "xml").
    pub variant: Option<String>,
    /// Detected file/schema revision if available.
    pub version: Option<String>,
    /// Any warnings about the detection.
    pub warnings: Vec<String>,
}

impl DetectionResult {
    /// Create a result indicating no format was detected.
    #[must_use]
    pub fn unknown(reason: &str) -> Self {
        Self {
            parser: None,
            confidence: FormatConfidence::NONE,
            variant: None,
            version: None,
            warnings: vec![reason.to_string()],
        }
    }

    fn from_detection(parser: ParserKind, detection: FormatDetection) -> Self {
        Self {
            parser: Some(parser),
            confidence: detection.confidence,
            variant: detection.variant,
            version: detection.version,
            warnings: detection.warnings,
        }
    }

    /// Check if the detection is confident enough to parse.
    #[must_use]
    pub fn can_parse(&self) -> bool {
        self.parser.is_some() && self.confidence.value() >= MIN_CONFIDENCE_THRESHOLD
    }
}

/// Centralized format detector for device description content.
pub struct FormatDetector {
    eds: EdsParser,
    iodd: IoddParser,
    min_confidence: f32,
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatDetector {
    /// Create a new format detector with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            eds: EdsParser::new(),
            iodd: IoddParser::new(),
            min_confidence: MIN_CONFIDENCE_THRESHOLD,
        }
    }

    /// Create a format detector with a custom confidence threshold.
    #[must_use]
    pub fn with_threshold(min_confidence: f32) -> Self {
        Self {
            eds: EdsParser::new(),
            iodd: IoddParser::new(),
            min_confidence: min_confidence.clamp(0.0, 1.0),
        }
    }

    /// Create a format detector whose text parser uses a caller-supplied
    /// synonym table (configuration-driven vendor dialects).
    #[must_use]
    pub fn with_synonyms(synonyms: SynonymTable) -> Self {
        Self {
            eds: EdsParser::with_synonyms(synonyms),
            iodd: IoddParser::new(),
            min_confidence: MIN_CONFIDENCE_THRESHOLD,
        }
    }

    /// Detect format from full content string.
    ///
    /// This runs each parser's detect() method and selects the best.
    #[must_use]
    pub fn detect_from_content(&self, content: &str) -> DetectionResult {
        let eds_detection = self.eds.detect(content);
        let iodd_detection = self.iodd.detect(content);

        self.select_best_parser(eds_detection, iodd_detection)
    }

    /// Select the best parser based on detection results.
    ///
    /// Uses consistent threshold checking and returns an unknown result
    /// instead of defaulting to a specific parser when ambiguous.
    fn select_best_parser(
        &self,
        eds_detection: FormatDetection,
        iodd_detection: FormatDetection,
    ) -> DetectionResult {
        let eds_conf = eds_detection.confidence.value();
        let iodd_conf = iodd_detection.confidence.value();

        tracing::debug!(
            "Format detection: EDS={:.2}, IODD={:.2}, threshold={:.2}",
            eds_conf,
            iodd_conf,
            self.min_confidence
        );

        if eds_conf >= self.min_confidence && eds_conf > iodd_conf {
            DetectionResult::from_detection(ParserKind::Eds, eds_detection)
        } else if iodd_conf >= self.min_confidence {
            DetectionResult::from_detection(ParserKind::Iodd, iodd_detection)
        } else {
            // No default bias - return unknown if neither meets threshold
            let mut result = DetectionResult::unknown(
                "Could not detect device description format with sufficient confidence",
            );

            if eds_conf > 0.0 {
                result.warnings.push(format!(
                    "EDS detection: {:.0}% confidence (threshold: {:.0}%)",
                    eds_conf * 100.0,
                    self.min_confidence * 100.0
                ));
            }
            if iodd_conf > 0.0 {
                result.warnings.push(format!(
                    "IODD detection: {:.0}% confidence (threshold: {:.0}%)",
                    iodd_conf * 100.0,
                    self.min_confidence * 100.0
                ));
            }

            result
        }
    }

    /// Parse content using the detected format.
    ///
    /// This combines detection and parsing in a single operation.
    pub fn parse_str(&self, content: &str) -> Result<ParseOutcome, ParseError> {
        let detection = self.detect_from_content(content);

        for warning in &detection.warnings {
            tracing::warn!("{}", warning);
        }

        match detection.parser {
            Some(ParserKind::Eds) if detection.can_parse() => self.eds.parse_str(content),
            Some(ParserKind::Iodd) if detection.can_parse() => self.iodd.parse_str(content),
            _ => Err(ParseError::UnknownFormat(
                "Could not detect device description format. Expected EDS or IODD.".to_string(),
            )),
        }
    }

    /// Parse content with an explicitly declared format, skipping detection.
    pub fn parse_with_format(
        &self,
        content: &str,
        format: FormatKind,
    ) -> Result<ParseOutcome, ParseError> {
        match format {
            FormatKind::Eds => self.eds.parse_str(content),
            FormatKind::Iodd => self.iodd.parse_str(content),
        }
    }

    /// Get a reference to the EDS parser.
    #[must_use]
    pub fn eds_parser(&self) -> &EdsParser {
        &self.eds
    }

    /// Get a reference to the IODD parser.
    #[must_use]
    pub fn iodd_parser(&self) -> &IoddParser {
        &self.iodd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_sectioned_text() {
        let detector = FormatDetector::new();
        let content = "[Device]\nVendCode = 6;\nProdCode = 4321;\n";
        let result = detector.detect_from_content(content);

        assert_eq!(result.parser, Some(ParserKind::Eds));
        assert!(result.can_parse());
        assert_eq!(result.variant, Some("sectioned-text".to_string()));
    }

    #[test]
    fn test_detect_xml() {
        let detector = FormatDetector::new();
        let content = r#"<?xml version="1.0"?><IODevice><ProfileBody/></IODevice>"#;
        let result = detector.detect_from_content(content);

        assert_eq!(result.parser, Some(ParserKind::Iodd));
        assert!(result.can_parse());
        assert_eq!(result.variant, Some("xml".to_string()));
    }

    #[test]
    fn test_detect_unknown_format() {
        let detector = FormatDetector::new();
        let result = detector.detect_from_content("{\"some\": \"json\"}");

        assert!(result.parser.is_none());
        assert!(!result.can_parse());
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_no_default_bias() {
        let detector = FormatDetector::new();
        // XML that is not an IODevice document
        let result = detector.detect_from_content("<?xml version=\"1.0\"?><Recipe/>");

        assert!(result.parser.is_none());
        assert!(!result.can_parse());
    }

    #[test]
    fn test_parse_str_dispatches() {
        let detector = FormatDetector::new();
        let outcome = detector
            .parse_str("[Device]\nVendCode = 6;\n")
            .expect("should parse as EDS");
        assert_eq!(outcome.model.format, FormatKind::Eds);
    }

    #[test]
    fn test_parse_str_unknown_is_error() {
        let detector = FormatDetector::new();
        let err = detector
            .parse_str("just some prose, no structure")
            .expect_err("should not parse");
        assert!(matches!(err, ParseError::UnknownFormat(_)));
    }

    #[test]
    fn test_explicit_format_skips_detection() {
        let detector = FormatDetector::new();
        // Valid EDS text forced through the IODD parser must fail loudly
        let err = detector
            .parse_with_format("[Device]\nVendCode = 6;\n", FormatKind::Iodd)
            .expect_err("wrong format should fail");
        assert!(matches!(err, ParseError::InvalidRoot { .. }));
    }

    #[test]
    fn test_threshold_enforcement() {
        let detector = FormatDetector::with_threshold(0.9);
        // A lone unknown section header detects at LOW confidence
        let result = detector.detect_from_content("[Whatever]\n");

        if result.confidence.value() < 0.9 {
            assert!(!result.can_parse());
        }
    }
}
