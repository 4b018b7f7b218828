//! Intermediate representation for normalized device descriptions.
//!
//! This module defines the canonical data structures both format parsers
//! populate. EDS text and IODD XML are normalized to these structures
//! before reconstruction, diffing and scoring.
//!
//! The model is deliberately retentive: anything a parser recognizes lands
//! in a typed field, and everything else is kept verbatim in raw-extras
//! bags or opaque sections so the reconstructor can put it back.

mod device;
mod diagnostics;
mod document;
mod scalar;
mod text;

pub use device::*;
pub use diagnostics::*;
pub use document::*;
pub use scalar::*;
pub use text::*;
