//! Structural diff result types.

use crate::model::Location;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a single structural difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffEntryKind {
    /// Present in the original model, absent after reconstruction
    Missing,
    /// Absent in the original model, present after reconstruction
    Extra,
    /// Present on both sides with semantically different values
    ValueMismatch,
    /// Values agree after normalization; only the raw text differs
    FormattingOnly,
}

impl DiffEntryKind {
    /// Display label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Extra => "extra",
            Self::ValueMismatch => "value-mismatch",
            Self::FormattingOnly => "formatting-only",
        }
    }

    /// Whether this kind reports semantic loss. Formatting noise does not.
    #[must_use]
    pub const fn is_semantic(&self) -> bool {
        !matches!(self, Self::FormattingOnly)
    }
}

impl fmt::Display for DiffEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One structural difference between an original model and the re-parse of
/// its reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub kind: DiffEntryKind,
    /// Model location: collection path plus optional field name
    pub location: Location,
    /// Rendered original-side value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_value: Option<String>,
    /// Rendered reconstructed-side value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconstructed_value: Option<String>,
}

impl DiffEntry {
    /// A value present only in the original.
    #[must_use]
    pub fn missing(location: Location, original: impl Into<String>) -> Self {
        Self {
            kind: DiffEntryKind::Missing,
            location,
            original_value: Some(original.into()),
            reconstructed_value: None,
        }
    }

    /// A value present only after reconstruction.
    #[must_use]
    pub fn extra(location: Location, reconstructed: impl Into<String>) -> Self {
        Self {
            kind: DiffEntryKind::Extra,
            location,
            original_value: None,
            reconstructed_value: Some(reconstructed.into()),
        }
    }

    /// Semantically different values on the two sides.
    #[must_use]
    pub fn mismatch(
        location: Location,
        original: impl Into<String>,
        reconstructed: impl Into<String>,
    ) -> Self {
        Self {
            kind: DiffEntryKind::ValueMismatch,
            location,
            original_value: Some(original.into()),
            reconstructed_value: Some(reconstructed.into()),
        }
    }

    /// Equal values whose raw spelling differs.
    #[must_use]
    pub fn formatting(
        location: Location,
        original: impl Into<String>,
        reconstructed: impl Into<String>,
    ) -> Self {
        Self {
            kind: DiffEntryKind::FormattingOnly,
            location,
            original_value: Some(original.into()),
            reconstructed_value: Some(reconstructed.into()),
        }
    }
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let original = self.original_value.as_deref().unwrap_or("(none)");
        let reconstructed = self.reconstructed_value.as_deref().unwrap_or("(none)");
        match self.kind {
            DiffEntryKind::Missing => {
                write!(f, "[{}] {}: {}", self.kind, self.location, original)
            }
            DiffEntryKind::Extra => {
                write!(f, "[{}] {}: {}", self.kind, self.location, reconstructed)
            }
            DiffEntryKind::ValueMismatch | DiffEntryKind::FormattingOnly => {
                write!(
                    f,
                    "[{}] {}: {} != {}",
                    self.kind, self.location, original, reconstructed
                )
            }
        }
    }
}

/// Aggregate counts by entry kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Semantic differences: missing + extra + value mismatches
    pub total_changes: usize,
    pub missing: usize,
    pub extra: usize,
    pub value_mismatches: usize,
    pub formatting_only: usize,
}

/// Complete result of a structural model diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct DiffResult {
    /// Summary statistics
    pub summary: DiffSummary,
    /// Every difference, in model walk order
    pub entries: Vec<DiffEntry>,
    /// Populated fields counted on the original side. This is the scoring
    /// denominator; counting it from the original keeps the score stable
    /// even when reconstruction invents fields.
    pub total_field_count: usize,
}

impl DiffResult {
    /// Create an empty diff result
    pub fn new() -> Self {
        Self {
            summary: DiffSummary::default(),
            entries: Vec::new(),
            total_field_count: 0,
        }
    }

    /// Append an entry. Call [`DiffResult::calculate_summary`] when done.
    pub fn push(&mut self, entry: DiffEntry) {
        self.entries.push(entry);
    }

    /// Recompute the summary counts from the entry list.
    pub fn calculate_summary(&mut self) {
        let mut summary = DiffSummary::default();
        for entry in &self.entries {
            match entry.kind {
                DiffEntryKind::Missing => summary.missing += 1,
                DiffEntryKind::Extra => summary.extra += 1,
                DiffEntryKind::ValueMismatch => summary.value_mismatches += 1,
                DiffEntryKind::FormattingOnly => summary.formatting_only += 1,
            }
        }
        summary.total_changes = summary.missing + summary.extra + summary.value_mismatches;
        self.summary = summary;
    }

    /// Check if any semantic difference was recorded
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.summary.total_changes > 0
    }

    /// True when reconstruction lost nothing and invented nothing
    #[must_use]
    pub fn is_lossless(&self) -> bool {
        !self.has_changes()
    }

    /// Number of entries of exactly the given kind
    #[must_use]
    pub fn count_of(&self, kind: DiffEntryKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Entries of one kind, in walk order
    pub fn entries_of(&self, kind: DiffEntryKind) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }
}

impl Default for DiffResult {
    fn default() -> Self {
        Self::new()
    }
}
