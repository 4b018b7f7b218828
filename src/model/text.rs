//! Multi-language text resources referenced by id.
//!
//! XML device descriptions keep user-visible strings out-of-line: elements
//! carry a text id, and an `ExternalTextCollection` maps id to string per
//! language. Resolution is deliberately lazy because the language selector
//! is not known at parse time; the model stores the table and hands out a
//! [`TextResolver`] when a caller finally picks a language.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Language-keyed table of text resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextTable {
    /// The document's declared primary language, used as fallback
    pub primary_language: Option<String>,
    /// language code -> (text id -> resolved string), both insertion-ordered
    pub languages: IndexMap<String, IndexMap<String, String>>,
}

impl TextTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one text resource under a language.
    pub fn add_text(
        &mut self,
        language: impl Into<String>,
        id: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.languages
            .entry(language.into())
            .or_default()
            .insert(id.into(), value.into());
    }

    /// Direct lookup in one language, no fallback.
    #[must_use]
    pub fn get(&self, language: &str, id: &str) -> Option<&str> {
        self.languages
            .get(language)
            .and_then(|texts| texts.get(id))
            .map(String::as_str)
    }

    /// Total number of text entries across all languages.
    #[must_use]
    pub fn text_count(&self) -> usize {
        self.languages.values().map(IndexMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// Language blocks in canonical order: the primary language first,
    /// then the rest sorted by code. Block order in a document is
    /// presentation, not content; hashing goes through this view.
    #[must_use]
    pub fn canonical_languages(&self) -> Vec<(&str, &IndexMap<String, String>)> {
        let mut blocks: Vec<(&str, &IndexMap<String, String>)> = self
            .languages
            .iter()
            .map(|(lang, entries)| (lang.as_str(), entries))
            .collect();
        blocks.sort_by_key(|&(lang, _)| (self.primary_language.as_deref() != Some(lang), lang));
        blocks
    }

    /// Bind a language selector, producing a resolver for text ids.
    #[must_use]
    pub fn resolver<'a>(&'a self, language: &str) -> TextResolver<'a> {
        TextResolver {
            table: self,
            language: language.to_string(),
        }
    }
}

/// Resolves text ids against a [`TextTable`] for one selected language,
/// falling back to the document's primary language.
#[derive(Debug, Clone)]
pub struct TextResolver<'a> {
    table: &'a TextTable,
    language: String,
}

impl<'a> TextResolver<'a> {
    /// Look up a text id: selected language first, then the primary
    /// language. Returns `None` when neither carries the id.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<&'a str> {
        if let Some(value) = self.table.get(&self.language, id) {
            return Some(value);
        }
        self.table
            .primary_language
            .as_deref()
            .filter(|primary| *primary != self.language)
            .and_then(|primary| self.table.get(primary, id))
    }

    /// The language this resolver selects.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }
}
