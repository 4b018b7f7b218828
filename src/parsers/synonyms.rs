//! Data-driven vendor key synonym tables.
//!
//! Vendor dialects spell the same semantic field differently, and one
//! vendor key can even cover two canonical fields at once (a combined
//! producer/consumer count). Rather than branching code per dialect, the
//! parser consults a table of `(canonical field, [literal keys])` per
//! section; adding a dialect is a data change, loadable from configuration.
//!
//! The first literal in each list is the primary spelling; reconstruction
//! uses it when emitting a canonical field.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A resolved synonym: which canonical field a literal key feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymHit<'a> {
    /// Canonical (model) field name
    pub canonical: &'a str,
    /// The primary literal spelling for that field
    pub primary: &'a str,
    /// Whether the matched key IS the primary spelling
    pub is_primary_spelling: bool,
}

/// Per-section synonym table: section -> canonical field -> literal keys.
///
/// Lookups are exact (the sectioned-text dialect is case-sensitive).
/// Iteration order is preserved so resolution is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymTable {
    sections: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl SynonymTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the built-in vendor dialects
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table.load_builtins();
        table
    }

    fn load_builtins(&mut self) {
        self.add_synonyms("device", "vendor_id", &["VendCode", "VendorCode"]);
        self.add_synonyms("device", "vendor_name", &["VendName", "VendorName"]);
        self.add_synonyms("device", "product_type", &["ProdType"]);
        self.add_synonyms("device", "product_type_string", &["ProdTypeStr"]);
        self.add_synonyms("device", "product_code", &["ProdCode", "ProductCode"]);
        self.add_synonyms("device", "major_revision", &["MajRev"]);
        self.add_synonyms("device", "minor_revision", &["MinRev"]);
        self.add_synonyms("device", "product_name", &["ProdName"]);
        self.add_synonyms("device", "catalog", &["Catalog"]);

        self.add_synonyms("file", "description", &["DescText"]);
        self.add_synonyms("file", "creation_date", &["CreateDate"]);
        self.add_synonyms("file", "creation_time", &["CreateTime"]);
        self.add_synonyms("file", "modification_date", &["ModDate"]);
        self.add_synonyms("file", "modification_time", &["ModTime"]);
        self.add_synonyms("file", "revision", &["Revision"]);
        self.add_synonyms("file", "home_url", &["HomeURL"]);

        self.add_synonyms("capacity", "max_io_connections", &["MaxIOConnections"]);
        self.add_synonyms("capacity", "max_msg_connections", &["MaxMsgConnections"]);
        // MaxIOProduceConsume is a combined count: it feeds both the
        // producer and consumer fields when a vendor omits the split keys.
        self.add_synonyms(
            "capacity",
            "max_io_producers",
            &["MaxIOProducers", "MaxIOProduceConsume"],
        );
        self.add_synonyms(
            "capacity",
            "max_io_consumers",
            &["MaxIOConsumers", "MaxIOProduceConsume"],
        );
    }

    /// Register literal keys for a canonical field. The first literal is
    /// the primary spelling. Replaces any existing list for that field.
    pub fn add_synonyms(&mut self, section: &str, canonical: &str, literals: &[&str]) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(
                canonical.to_string(),
                literals.iter().map(|s| (*s).to_string()).collect(),
            );
    }

    /// Resolve a literal key within a section.
    ///
    /// Returns every canonical field the key feeds, in table order. An
    /// empty result means the key is unknown to this section's grammar.
    #[must_use]
    pub fn resolve(&self, section: &str, key: &str) -> Vec<SynonymHit<'_>> {
        let Some(fields) = self.sections.get(section) else {
            return Vec::new();
        };

        let mut hits = Vec::new();
        for (canonical, literals) in fields {
            if !literals.iter().any(|l| l == key) {
                continue;
            }
            // A matched list is never empty.
            let Some(primary) = literals.first() else {
                continue;
            };
            hits.push(SynonymHit {
                canonical: canonical.as_str(),
                primary: primary.as_str(),
                is_primary_spelling: primary == key,
            });
        }
        hits
    }

    /// Primary literal spelling for a canonical field, for reconstruction.
    #[must_use]
    pub fn primary_literal(&self, section: &str, canonical: &str) -> Option<&str> {
        self.sections
            .get(section)?
            .get(canonical)?
            .first()
            .map(String::as_str)
    }

    /// Overlay another table: its per-field lists replace this table's.
    ///
    /// Used to apply configuration-supplied dialects on top of builtins.
    pub fn merge_overrides(&mut self, other: &Self) {
        for (section, fields) in &other.sections {
            let target = self.sections.entry(section.clone()).or_default();
            for (canonical, literals) in fields {
                target.insert(canonical.clone(), literals.clone());
            }
        }
    }

    /// All `(canonical, literals)` pairs of one section, in table order.
    #[must_use]
    pub fn section_fields(&self, section: &str) -> Option<&IndexMap<String, Vec<String>>> {
        self.sections.get(section)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_primary_spelling() {
        let table = SynonymTable::with_builtins();
        let hits = table.resolve("device", "VendCode");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].canonical, "vendor_id");
        assert!(hits[0].is_primary_spelling);
    }

    #[test]
    fn test_resolve_vendor_synonym() {
        let table = SynonymTable::with_builtins();
        let hits = table.resolve("device", "VendorCode");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].canonical, "vendor_id");
        assert_eq!(hits[0].primary, "VendCode");
        assert!(!hits[0].is_primary_spelling);
    }

    #[test]
    fn test_combined_key_feeds_two_fields() {
        let table = SynonymTable::with_builtins();
        let hits = table.resolve("capacity", "MaxIOProduceConsume");
        let canonicals: Vec<_> = hits.iter().map(|h| h.canonical).collect();
        assert_eq!(canonicals, vec!["max_io_producers", "max_io_consumers"]);
        assert!(hits.iter().all(|h| !h.is_primary_spelling));
    }

    #[test]
    fn test_hits_borrow_the_table_not_the_key() {
        let table = SynonymTable::with_builtins();
        let hits = {
            let key = String::from("VendorCode");
            table.resolve("device", &key)
        };
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].primary, "VendCode");
    }

    #[test]
    fn test_unknown_key_resolves_to_nothing() {
        let table = SynonymTable::with_builtins();
        assert!(table.resolve("capacity", "MaxWidgets").is_empty());
        assert!(table.resolve("nonexistent-section", "VendCode").is_empty());
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let table = SynonymTable::with_builtins();
        assert!(table.resolve("device", "vendcode").is_empty());
    }

    #[test]
    fn test_primary_literal() {
        let table = SynonymTable::with_builtins();
        assert_eq!(
            table.primary_literal("capacity", "max_io_producers"),
            Some("MaxIOProducers")
        );
        assert_eq!(table.primary_literal("capacity", "nope"), None);
    }

    #[test]
    fn test_merge_overrides_replaces_lists() {
        let mut table = SynonymTable::with_builtins();
        let mut overlay = SynonymTable::new();
        overlay.add_synonyms("capacity", "max_io_producers", &["MaxProducers"]);
        table.merge_overrides(&overlay);

        assert_eq!(
            table.primary_literal("capacity", "max_io_producers"),
            Some("MaxProducers")
        );
        // Untouched entries survive the overlay
        assert_eq!(
            table.primary_literal("capacity", "max_msg_connections"),
            Some("MaxMsgConnections")
        );
    }
}
