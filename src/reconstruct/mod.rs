//! Text reconstruction: render a [`NormalizedDevice`] back into its source
//! dialect.
//!
//! Reconstruction is deterministic and pure. The same model always yields
//! the same text, and nothing outside the model (clocks, counters, the
//! original document) feeds the output. Typed fields are emitted in
//! canonical order; verbatim extras, opaque sections and vendor key
//! spellings recorded at parse time are replayed as written, so a model
//! whose value arrived through a synonym key keeps that spelling instead
//! of being rewritten to the canonical one.
//!
//! The contract with the parsers is structural: re-parsing the text
//! produced here yields a model equal to the input. Cosmetic detail the
//! model never stored (entry order inside a section, whitespace, comments
//! after the last terminator) is regenerated in canonical form, which the
//! diff stage classifies as formatting-only.

mod eds;
mod iodd;

use crate::error::{DevDescError, ReconstructErrorKind, Result};
use crate::model::{FormatKind, NormalizedDevice, ReconstructedDocument};
use crate::parsers::SynonymTable;

/// Renders normalized models back into dialect text.
///
/// The synonym table must match the one the model was parsed with;
/// canonical key spellings for the sectioned-text dialect come from it.
pub struct Reconstructor {
    synonyms: SynonymTable,
}

impl Reconstructor {
    /// Reconstructor with the built-in synonym table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            synonyms: SynonymTable::with_builtins(),
        }
    }

    /// Reconstructor with a caller-supplied synonym table.
    #[must_use]
    pub fn with_synonyms(synonyms: SynonymTable) -> Self {
        Self { synonyms }
    }

    /// Render the model into its source dialect.
    ///
    /// # Errors
    ///
    /// Returns [`ReconstructErrorKind::EmptyModel`] when the model holds no
    /// recognized content, and [`ReconstructErrorKind::XmlWrite`] when XML
    /// serialization fails.
    pub fn reconstruct(&self, model: &NormalizedDevice) -> Result<ReconstructedDocument> {
        if !model.has_recognized_content() {
            return Err(DevDescError::reconstruct(
                "nothing to render",
                ReconstructErrorKind::EmptyModel(model.format.name().to_string()),
            ));
        }

        let content = match model.format {
            FormatKind::Eds => eds::write_document(model, &self.synonyms),
            FormatKind::Iodd => iodd::write_document(model)
                .map_err(|source| DevDescError::reconstruct("serializing XML", source))?,
        };

        tracing::debug!(
            format = model.format.name(),
            bytes = content.len(),
            "reconstructed document"
        );
        Ok(ReconstructedDocument::new(model.format, content))
    }
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a model with the built-in synonym table.
///
/// # Errors
///
/// See [`Reconstructor::reconstruct`].
pub fn reconstruct(model: &NormalizedDevice) -> Result<ReconstructedDocument> {
    Reconstructor::new().reconstruct(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_model_is_an_error() {
        let model = NormalizedDevice::new(FormatKind::Eds);
        let err = reconstruct(&model).expect_err("empty model should not render");

        match err {
            DevDescError::Reconstruct { source, .. } => {
                assert!(matches!(source, ReconstructErrorKind::EmptyModel(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_reconstruction_is_deterministic() {
        let mut model = NormalizedDevice::new(FormatKind::Eds);
        model.identity.vendor_id = Some(crate::model::Scalar::int(6));

        let first = reconstruct(&model).expect("render");
        let second = reconstruct(&model).expect("render");
        assert_eq!(first.content, second.content);
        assert_eq!(first.content_hash, second.content_hash);
    }
}
