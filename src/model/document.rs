//! Raw and reconstructed document wrappers.

use crate::utils::hash::content_hash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The two supported device description dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// Sectioned `key = value;` text (Electronic Data Sheet)
    Eds,
    /// XML device description (IO Device Description)
    Iodd,
}

impl FormatKind {
    /// Short format name for logs and reports
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Eds => "eds",
            Self::Iodd => "iodd",
        }
    }

    /// Guess a format from a file extension. Extension hints are advisory;
    /// content detection has the final say.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "eds" => Some(Self::Eds),
            "xml" | "iodd" => Some(Self::Iodd),
            _ => None,
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for FormatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eds" => Ok(Self::Eds),
            "iodd" | "xml" => Ok(Self::Iodd),
            other => Err(format!("unknown format '{other}' (expected eds or iodd)")),
        }
    }
}

/// Immutable ingested document: identity, declared format, full text and
/// content hash. Retained unchanged for later diffing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    /// Caller-supplied identity (usually the source path)
    pub id: String,
    pub format: FormatKind,
    pub content: String,
    /// xxh3-64 over the raw bytes
    pub content_hash: u64,
}

impl RawDocument {
    /// Wrap ingested text, computing its content hash.
    #[must_use]
    pub fn new(id: impl Into<String>, format: FormatKind, content: impl Into<String>) -> Self {
        let content = content.into();
        let content_hash = content_hash(content.as_bytes());
        Self {
            id: id.into(),
            format,
            content,
            content_hash,
        }
    }
}

/// Output of the forensic reconstructor. Recomputed on demand; never the
/// source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructedDocument {
    pub format: FormatKind,
    pub content: String,
    /// xxh3-64 over the reconstructed bytes
    pub content_hash: u64,
}

impl ReconstructedDocument {
    #[must_use]
    pub fn new(format: FormatKind, content: String) -> Self {
        let content_hash = content_hash(content.as_bytes());
        Self {
            format,
            content,
            content_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            FormatKind::from_extension(Path::new("drive.eds")),
            Some(FormatKind::Eds)
        );
        assert_eq!(
            FormatKind::from_extension(Path::new("sensor.xml")),
            Some(FormatKind::Iodd)
        );
        assert_eq!(FormatKind::from_extension(Path::new("README.md")), None);
        assert_eq!(FormatKind::from_extension(Path::new("no_extension")), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("eds".parse::<FormatKind>(), Ok(FormatKind::Eds));
        assert_eq!("IODD".parse::<FormatKind>(), Ok(FormatKind::Iodd));
        assert!("step".parse::<FormatKind>().is_err());
    }

    #[test]
    fn test_raw_document_hash_stability() {
        let a = RawDocument::new("a.eds", FormatKind::Eds, "[Device]\nVendCode = 1;\n");
        let b = RawDocument::new("b.eds", FormatKind::Eds, "[Device]\nVendCode = 1;\n");
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.content_hash, 0);

        let c = RawDocument::new("c.eds", FormatKind::Eds, "[Device]\nVendCode = 2;\n");
        assert_ne!(a.content_hash, c.content_hash);
    }

    #[test]
    fn test_reconstructed_document_hash() {
        let doc = ReconstructedDocument::new(FormatKind::Eds, "[Device]\n".to_string());
        assert_eq!(doc.content_hash, content_hash(doc.content.as_bytes()));
    }
}
