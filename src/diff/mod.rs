//! Structural diffing of original models against re-parsed reconstructions.
//!
//! The engine walks two [`crate::model::NormalizedDevice`] values collection
//! by collection and reports every divergence as a [`DiffEntry`]. The
//! comparison is structural: field order, whitespace and comments never
//! register, and typed scalars compare semantically so a respelled number
//! (`0x10` vs `16`) is no loss. Raw-extras values get one extra grade: equal
//! after coercion counts as [`DiffEntryKind::FormattingOnly`], which is
//! reported but never scored as a change.
//!
//! Keyed collections pair records by key and a record absent from one side
//! yields a single entry for the whole record. Within an extras bag,
//! duplicate keys pair first occurrence to first occurrence; every later
//! duplicate on either side reports as its own `Extra` entry.

mod engine;
mod result;

pub use engine::DiffEngine;
pub use result::{DiffEntry, DiffEntryKind, DiffResult, DiffSummary};
