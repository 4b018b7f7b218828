//! Typed scalar values extracted from device description fields.
//!
//! Scalars remember how they were written (hex vs decimal, quoted vs bare)
//! so reconstruction can render them back in the original notation, while
//! comparisons ignore notation: `0x10` and `16` are the same value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A coerced field value with rendering intent preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scalar {
    /// Integer value; `hex` records whether the source used `0x` notation
    Int { value: i64, hex: bool },
    /// Floating point value
    Float { value: f64 },
    /// Textual value; `quoted` records whether the source wrapped it in quotes
    Text { value: String, quoted: bool },
    /// Field present but without a value
    Empty,
}

impl Scalar {
    /// Decimal integer scalar
    #[must_use]
    pub const fn int(value: i64) -> Self {
        Self::Int { value, hex: false }
    }

    /// Quoted text scalar
    #[must_use]
    pub fn quoted_text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
            quoted: true,
        }
    }

    /// Bare (unquoted) text scalar
    #[must_use]
    pub fn bare_text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
            quoted: false,
        }
    }

    /// Coerce a cleaned field token into a typed scalar.
    ///
    /// The input must already have inline comments, trailing semicolons and
    /// surrounding whitespace removed. Anything that is not an integer
    /// (decimal or `0x` hex), a float or a quoted string is kept as bare
    /// text, never rejected.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if token.is_empty() {
            return Self::Empty;
        }

        if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
            return Self::Text {
                value: token[1..token.len() - 1].to_string(),
                quoted: true,
            };
        }

        if let Some(digits) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            if let Ok(value) = i64::from_str_radix(digits, 16) {
                return Self::Int { value, hex: true };
            }
            // Not valid hex after all; fall through to bare text
        } else if let Ok(value) = token.parse::<i64>() {
            return Self::Int { value, hex: false };
        } else if let Ok(value) = token.parse::<f64>() {
            if value.is_finite() {
                return Self::Float { value };
            }
        }

        Self::Text {
            value: token.to_string(),
            quoted: false,
        }
    }

    /// Compare by value, ignoring rendering intent.
    ///
    /// Integers compare across notations, and an integer equals a float
    /// carrying the same value. Text compares exactly (content only).
    #[must_use]
    pub fn semantically_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int { value: a, .. }, Self::Int { value: b, .. }) => a == b,
            (Self::Float { value: a }, Self::Float { value: b }) => a == b,
            (Self::Int { value: i, .. }, Self::Float { value: f })
            | (Self::Float { value: f }, Self::Int { value: i, .. }) => (*i as f64) == *f,
            (Self::Text { value: a, .. }, Self::Text { value: b, .. }) => a == b,
            (Self::Empty, Self::Empty) => true,
            _ => false,
        }
    }

    /// Integer value if this scalar carries one
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Non-negative integer value, if representable
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|v| u32::try_from(v).ok())
    }

    /// Text content if this scalar is textual
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { value, .. } => Some(value),
            _ => None,
        }
    }

    /// True for `Empty`
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Render without quoting, for XML attribute positions.
    #[must_use]
    pub fn unquoted(&self) -> String {
        match self {
            Self::Text { value, .. } => value.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    /// Canonical textual form: hex integers keep `0x` notation, quoted text
    /// keeps its quotes, and whole floats keep a decimal point so they
    /// re-parse as floats.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int { value, hex: true } if *value >= 0 => write!(f, "0x{value:X}"),
            Self::Int { value, .. } => write!(f, "{value}"),
            Self::Float { value } => {
                if value.fract() == 0.0 {
                    write!(f, "{value:.1}")
                } else {
                    write!(f, "{value}")
                }
            }
            Self::Text {
                value,
                quoted: true,
            } => write!(f, "\"{value}\""),
            Self::Text { value, .. } => write!(f, "{value}"),
            Self::Empty => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_int() {
        assert_eq!(
            Scalar::parse("42"),
            Scalar::Int {
                value: 42,
                hex: false
            }
        );
        assert_eq!(
            Scalar::parse("-7"),
            Scalar::Int {
                value: -7,
                hex: false
            }
        );
    }

    #[test]
    fn test_parse_hex_int() {
        assert_eq!(
            Scalar::parse("0x10"),
            Scalar::Int {
                value: 16,
                hex: true
            }
        );
        assert_eq!(
            Scalar::parse("0XFF"),
            Scalar::Int {
                value: 255,
                hex: true
            }
        );
    }

    #[test]
    fn test_parse_quoted_text() {
        assert_eq!(
            Scalar::parse("\"Output Assembly\""),
            Scalar::Text {
                value: "Output Assembly".to_string(),
                quoted: true
            }
        );
    }

    #[test]
    fn test_parse_bare_text() {
        assert_eq!(
            Scalar::parse("TxRx"),
            Scalar::Text {
                value: "TxRx".to_string(),
                quoted: false
            }
        );
        // Invalid hex digits stay text
        assert_eq!(
            Scalar::parse("0xZZ"),
            Scalar::Text {
                value: "0xZZ".to_string(),
                quoted: false
            }
        );
    }

    #[test]
    fn test_parse_float_and_empty() {
        assert_eq!(Scalar::parse("1.5"), Scalar::Float { value: 1.5 });
        assert_eq!(Scalar::parse(""), Scalar::Empty);
        assert_eq!(Scalar::parse("   "), Scalar::Empty);
    }

    #[test]
    fn test_semantic_equality_ignores_notation() {
        let hex = Scalar::parse("0x10");
        let dec = Scalar::parse("16");
        assert_ne!(hex, dec);
        assert!(hex.semantically_equals(&dec));

        let quoted = Scalar::parse("\"On\"");
        let bare = Scalar::parse("On");
        assert!(quoted.semantically_equals(&bare));
    }

    #[test]
    fn test_int_float_cross_equality() {
        let int = Scalar::parse("6");
        let float = Scalar::parse("6.0");
        assert!(int.semantically_equals(&float));
        assert!(!int.semantically_equals(&Scalar::parse("6.5")));
    }

    #[test]
    fn test_display_round_trips() {
        for input in ["42", "0x1A", "\"Vendor Name\"", "1.5", "6.0", "TxRx"] {
            let scalar = Scalar::parse(input);
            let rendered = scalar.to_string();
            let reparsed = Scalar::parse(&rendered);
            assert_eq!(scalar, reparsed, "round trip failed for {input}");
        }
    }

    #[test]
    fn test_whole_float_keeps_decimal_point() {
        let f = Scalar::Float { value: 6.0 };
        assert_eq!(f.to_string(), "6.0");
        // Re-parsing must stay a float, not collapse to an int
        assert!(matches!(
            Scalar::parse(&f.to_string()),
            Scalar::Float { .. }
        ));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Scalar::parse("0x20").as_u32(), Some(32));
        assert_eq!(Scalar::parse("-1").as_u32(), None);
        assert_eq!(Scalar::parse("\"abc\"").as_text(), Some("abc"));
        assert!(Scalar::parse("").is_empty());
    }
}
