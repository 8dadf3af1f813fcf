//! Catalog entry types.
//!
//! A catalog file parses into one [`CatalogParseResult`]. Entries are grouped
//! by language tag and then by key; a single PO file contributes exactly one
//! language.

use std::collections::BTreeMap;

use super::position::Location;
use crate::issues::Diagnostic;

/// One translated message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub translation: String,
    /// Location of the key token, from its opening quote through the closing
    /// quote of its last continuation line.
    pub location: Location,
}

/// `key -> entry` for one language.
pub type LanguageEntries = BTreeMap<String, CatalogEntry>;

/// Outcome of parsing one catalog file.
///
/// `success == false` still carries whatever entries could be recovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogParseResult {
    /// `language -> key -> entry`
    pub entries: BTreeMap<String, LanguageEntries>,
    pub diagnostics: Vec<Diagnostic>,
    pub success: bool,
}

impl CatalogParseResult {
    /// Iterate `(language, key, entry)` triples.
    pub fn iter_entries(&self) -> impl Iterator<Item = (&str, &str, &CatalogEntry)> {
        self.entries.iter().flat_map(|(lang, entries)| {
            entries
                .iter()
                .map(move |(key, entry)| (lang.as_str(), key.as_str(), entry))
        })
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }
}
