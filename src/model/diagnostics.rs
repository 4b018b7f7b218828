//! Parser diagnostics: severity-tagged issues with document locations.
//!
//! Parsers never fail on recoverable problems; they record a [`Diagnostic`]
//! and keep going. The collector preserves insertion order, which follows
//! document order, so downstream consumers can rely on first-occurrence-wins
//! when the same code repeats.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known diagnostic codes emitted by the parsers.
pub mod codes {
    /// Field inside a recognized section that no grammar claims
    pub const UNKNOWN_FIELD: &str = "unknown-field";
    /// Section header that no grammar claims
    pub const UNKNOWN_SECTION: &str = "unknown-section";
    /// Entry that could not be parsed at all and was skipped
    pub const MALFORMED_ENTRY: &str = "malformed-entry";
    /// A vendor synonym key was mapped to its canonical field
    pub const SYNONYM_RESOLVED: &str = "synonym-resolved";
    /// Required attribute missing; element kept best-effort
    pub const MISSING_ATTRIBUTE: &str = "missing-attribute";
    /// Attribute present but not coercible to its expected type
    pub const INVALID_ATTRIBUTE: &str = "invalid-attribute";
    /// The same key appeared more than once within a collection
    pub const DUPLICATE_KEY: &str = "duplicate-key";
    /// Record had more fields than its grammar defines
    pub const EXCESS_FIELDS: &str = "excess-fields";
    /// Text reference points at no known text resource
    pub const UNRESOLVED_TEXT: &str = "unresolved-text";
    /// Scored model had no countable fields; the 100 score is vacuous
    pub const EMPTY_MODEL: &str = "empty-model";
}

/// Severity of a parser diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Purely informational (unrecognized optional section, synonym use)
    Info,
    /// Recognized but unexpected content, retained verbatim
    Warning,
    /// Recoverable failure; the field was skipped or parsed best-effort
    Error,
}

impl Severity {
    /// Get display label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Where in the document a diagnostic was raised.
///
/// For sectioned text this is a section name plus optional field key; for
/// XML it is an element path (`IODevice/DeviceIdentity`) plus optional
/// attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Section name or element path
    pub section: String,
    /// Field key or attribute name, when the issue is field-level
    pub field: Option<String>,
}

impl Location {
    /// Section-level location
    #[must_use]
    pub fn section(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            field: None,
        }
    }

    /// Field-level location
    #[must_use]
    pub fn field(section: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            field: Some(field.into()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}/{}", self.section, field),
            None => write!(f, "{}", self.section),
        }
    }
}

/// A single parser diagnostic. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable machine-readable code (see [`codes`])
    pub code: String,
    /// Human-readable explanation
    pub message: String,
    pub location: Location,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} at {}: {}",
            self.severity, self.code, self.location, self.message
        )
    }
}

/// Ordered, append-only collector the parsers write into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticCollector {
    items: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic with explicit severity
    pub fn push(
        &mut self,
        severity: Severity,
        code: &str,
        location: Location,
        message: impl Into<String>,
    ) {
        self.items.push(Diagnostic {
            severity,
            code: code.to_string(),
            message: message.into(),
            location,
        });
    }

    /// Append an `Info` diagnostic
    pub fn info(&mut self, code: &str, location: Location, message: impl Into<String>) {
        self.push(Severity::Info, code, location, message);
    }

    /// Append a `Warning` diagnostic
    pub fn warning(&mut self, code: &str, location: Location, message: impl Into<String>) {
        self.push(Severity::Warning, code, location, message);
    }

    /// Append an `Error` diagnostic
    pub fn error(&mut self, code: &str, location: Location, message: impl Into<String>) {
        self.push(Severity::Error, code, location, message);
    }

    /// Diagnostics in insertion (document) order
    #[must_use]
    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Consume the collector, returning the ordered diagnostics
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }

    /// Count of diagnostics at exactly the given severity
    #[must_use]
    pub fn count_of(&self, severity: Severity) -> usize {
        self.items.iter().filter(|d| d.severity == severity).count()
    }

    /// Number of `Error` diagnostics
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count_of(Severity::Error)
    }

    /// Number of `Warning` diagnostics
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count_of(Severity::Warning)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
