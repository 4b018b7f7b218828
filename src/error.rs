//! Unified error types for devdesc-tools.
//!
//! This module provides the error hierarchy for the library, with rich
//! context for debugging and user-friendly messages. Recoverable per-field
//! issues are NOT errors: parsers report those as [`crate::model::Diagnostic`]
//! entries and keep going. Only conditions that abort an operation surface
//! through these types.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for devdesc-tools operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DevDescError {
    /// Fatal errors during device description parsing
    #[error("Failed to parse device description: {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// Errors during text reconstruction
    #[error("Reconstruction failed: {context}")]
    Reconstruct {
        context: String,
        #[source]
        source: ReconstructErrorKind,
    },

    /// Errors during fidelity evaluation
    #[error("Evaluation failed: {context}")]
    Evaluate {
        context: String,
        #[source]
        source: EvaluateErrorKind,
    },

    /// Errors during report generation
    #[error("Report generation failed: {context}")]
    Report {
        context: String,
        #[source]
        source: ReportErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Fatal parse error kinds.
///
/// Everything here terminates the pipeline for the affected document; a
/// malformed entry inside an otherwise recognizable document is a
/// diagnostic, not a `ParseErrorKind`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("Unknown device description format - expected EDS or IODD markers")]
    UnknownFormat,

    #[error("No recognized sections found in document")]
    NoRecognizedSections,

    #[error("Unparseable root element: {0}")]
    InvalidRoot(String),

    #[error("Invalid XML structure: {0}")]
    InvalidXml(String),

    #[error("Missing required field: {field} in {context}")]
    MissingField { field: String, context: String },

    #[error("Invalid field value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("EDS parsing error: {0}")]
    Eds(String),

    #[error("IODD parsing error: {0}")]
    Iodd(String),
}

/// Specific reconstruction error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReconstructErrorKind {
    #[error("XML writer error: {0}")]
    XmlWrite(String),

    #[error("Model has no content for format {0}")]
    EmptyModel(String),
}

/// Specific evaluation error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EvaluateErrorKind {
    #[error("Model format {model} does not match document format {document}")]
    FormatMismatch { model: String, document: String },

    #[error("Original document failed to parse: {0}")]
    OriginalParseFailed(String),

    #[error("Reconstructed text failed to re-parse: {0}")]
    ReparseFailed(String),
}

/// Specific report error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReportErrorKind {
    #[error("JSON serialization failed: {0}")]
    JsonSerializationError(String),

    #[error("Output format not supported for this operation: {0}")]
    UnsupportedFormat(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for devdesc-tools operations
pub type Result<T> = std::result::Result<T, DevDescError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl DevDescError {
    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create a parse error for unknown format
    pub fn unknown_format(path: impl Into<String>) -> Self {
        Self::parse(format!("at {}", path.into()), ParseErrorKind::UnknownFormat)
    }

    /// Create a parse error for a document with no recognizable structure
    pub fn no_recognized_sections(context: impl Into<String>) -> Self {
        Self::parse(context, ParseErrorKind::NoRecognizedSections)
    }

    /// Create a parse error for missing field
    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::parse(
            "missing required field",
            ParseErrorKind::MissingField {
                field: field.into(),
                context: context.into(),
            },
        )
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a reconstruction error
    pub fn reconstruct(context: impl Into<String>, source: ReconstructErrorKind) -> Self {
        Self::Reconstruct {
            context: context.into(),
            source,
        }
    }

    /// Create an evaluation error
    pub fn evaluate(context: impl Into<String>, source: EvaluateErrorKind) -> Self {
        Self::Evaluate {
            context: context.into(),
            source,
        }
    }

    /// Create a report error
    pub fn report(context: impl Into<String>, source: ReportErrorKind) -> Self {
        Self::Report {
            context: context.into(),
            source,
        }
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for DevDescError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for DevDescError {
    fn from(err: serde_json::Error) -> Self {
        Self::report(
            "JSON serialization",
            ReportErrorKind::JsonSerializationError(err.to_string()),
        )
    }
}

impl From<quick_xml::Error> for DevDescError {
    fn from(err: quick_xml::Error) -> Self {
        Self::parse(
            "XML processing",
            ParseErrorKind::InvalidXml(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// This trait provides methods to add context information to errors,
/// creating a chain of context that helps trace the source of problems.
///
/// # Example
///
/// ```ignore
/// use devdesc_tools::error::ErrorContext;
///
/// fn load_device(path: &Path) -> Result<NormalizedDevice> {
///     let content = std::fs::read_to_string(path)
///         .context("reading device description file")?;
///
///     parse_device_str(&content, FormatKind::Eds)
///         .with_context(|| format!("parsing device description from {}", path.display()))?
/// }
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    ///
    /// The context string is prepended to the error's existing context,
    /// creating a chain that shows the path through the code.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure (lazy evaluation).
    ///
    /// The closure is only called if the result is an error,
    /// which is more efficient when the context string is expensive to compute.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<DevDescError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: DevDescError, new_ctx: &str) -> DevDescError {
    match err {
        DevDescError::Parse {
            context: existing,
            source,
        } => DevDescError::Parse {
            context: chain_context(new_ctx, &existing),
            source,
        },
        DevDescError::Reconstruct {
            context: existing,
            source,
        } => DevDescError::Reconstruct {
            context: chain_context(new_ctx, &existing),
            source,
        },
        DevDescError::Evaluate {
            context: existing,
            source,
        } => DevDescError::Evaluate {
            context: chain_context(new_ctx, &existing),
            source,
        },
        DevDescError::Report {
            context: existing,
            source,
        } => DevDescError::Report {
            context: chain_context(new_ctx, &existing),
            source,
        },
        DevDescError::Io {
            path,
            message,
            source,
        } => DevDescError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        DevDescError::Config(msg) => DevDescError::Config(chain_context(new_ctx, &msg)),
        DevDescError::Validation(msg) => DevDescError::Validation(chain_context(new_ctx, &msg)),
    }
}

/// Chain two context strings together.
///
/// If the existing context is empty, returns just the new context.
/// Otherwise, returns "`new_context`: `existing_context`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to an error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;

    /// Convert None to an error with context from a closure.
    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> OptionContext<T> for Option<T> {
    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| DevDescError::Validation(context.into()))
    }

    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.ok_or_else(|| DevDescError::Validation(f().into()))
    }
}
