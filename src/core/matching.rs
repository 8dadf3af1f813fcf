//! Reconcile catalog entries with code call sites.
//!
//! Pure and recomputed on demand from cache snapshots. Catalogs and code are
//! joined by key string only.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::{
    cache::Snapshot,
    data::{CatalogParseResult, CodeCallSite, Range},
};
use crate::issues::{Diagnostic, FileDiagnostics, Rule};

/// Key and language indexes built from one catalog snapshot.
#[derive(Debug, Default)]
struct CatalogIndex<'a> {
    /// `key -> languages it is translated in`
    key_languages: BTreeMap<&'a str, BTreeSet<&'a str>>,
    /// `language -> catalog files contributing it`
    language_files: BTreeMap<&'a str, BTreeSet<&'a str>>,
}

impl<'a> CatalogIndex<'a> {
    fn build(catalogs: &'a Snapshot<CatalogParseResult>) -> Self {
        let mut index = Self::default();
        for (file, parsed) in catalogs {
            for (lang, entries) in &parsed.entries {
                index
                    .language_files
                    .entry(lang.as_str())
                    .or_default()
                    .insert(file.as_str());
                for key in entries.keys() {
                    index
                        .key_languages
                        .entry(key.as_str())
                        .or_default()
                        .insert(lang.as_str());
                }
            }
        }
        index
    }

    fn contains_key(&self, key: &str) -> bool {
        self.key_languages.contains_key(key)
    }
}

/// Compute undefined-key, unused-key and missing-translation diagnostics for
/// one target. Every file's list is sorted.
pub fn match_diagnostics(
    catalogs: &Snapshot<CatalogParseResult>,
    sources: &Snapshot<Vec<CodeCallSite>>,
) -> FileDiagnostics {
    let index = CatalogIndex::build(catalogs);
    let used_keys: BTreeSet<&str> = sources
        .values()
        .flat_map(|sites| sites.iter().map(|site| site.key.as_str()))
        .collect();

    let mut out = FileDiagnostics::new();

    for site in sources.values().flat_map(|sites| sites.iter()) {
        if !index.contains_key(&site.key) {
            emit(
                &mut out,
                site.file_path(),
                Diagnostic::warning(
                    site.location.range,
                    format!("undefined localization key '{}' used in code", site.key),
                    Rule::UndefinedKey,
                ),
            );
        }
    }

    for parsed in catalogs.values() {
        for (_, key, entry) in parsed.iter_entries() {
            if !used_keys.contains(key) {
                emit(
                    &mut out,
                    &entry.location.file_path,
                    Diagnostic::information(
                        entry.location.range,
                        format!("localization key '{}' is not used in code", key),
                        Rule::UnusedKey,
                    ),
                );
            }
        }
    }

    for (key, present) in &index.key_languages {
        for (lang, files) in &index.language_files {
            if present.contains(lang) {
                continue;
            }
            for file in files {
                emit(
                    &mut out,
                    file,
                    Diagnostic::warning(
                        Range::document_start(),
                        format!("missing translation for key '{}' in language '{}'", key, lang),
                        Rule::MissingTranslation,
                    ),
                );
            }
        }
    }

    for diagnostics in out.values_mut() {
        diagnostics.sort();
    }
    out
}

fn emit(out: &mut FileDiagnostics, file: &str, diagnostic: Diagnostic) {
    out.entry(file.to_string()).or_default().push(diagnostic);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::{CatalogEntry, LanguageEntries, LiteralStyle, Location};
    use crate::issues::Severity;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn catalog(file: &str, lang: &str, keys: &[(&str, usize)]) -> (String, Arc<CatalogParseResult>) {
        let entries: LanguageEntries = keys
            .iter()
            .map(|&(key, line)| {
                (
                    key.to_string(),
                    CatalogEntry {
                        translation: format!("{lang}:{key}"),
                        location: Location::new(file, Range::from_coords(line, 6, line, 8 + key.len())),
                    },
                )
            })
            .collect();
        (
            file.to_string(),
            Arc::new(CatalogParseResult {
                entries: BTreeMap::from([(lang.to_string(), entries)]),
                diagnostics: Vec::new(),
                success: true,
            }),
        )
    }

    fn source(file: &str, keys: &[(&str, usize)]) -> (String, Arc<Vec<CodeCallSite>>) {
        let sites = keys
            .iter()
            .map(|&(key, line)| {
                let inner = Range::from_coords(line, 3, line, 3 + key.len());
                CodeCallSite {
                    key: key.to_string(),
                    location: Location::new(file, inner),
                    literal_range: Range::from_coords(line, 2, line, 4 + key.len()),
                    call_range: Range::from_coords(line, 0, line, 5 + key.len()),
                    style: LiteralStyle::double_quoted(),
                }
            })
            .collect();
        (file.to_string(), Arc::new(sites))
    }

    fn messages(diagnostics: &FileDiagnostics, file: &str) -> Vec<String> {
        diagnostics
            .get(file)
            .map(|list| list.iter().map(|d| d.message.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_all_matched_is_clean() {
        let catalogs = Snapshot::from([catalog("en.po", "en", &[("hello", 0)])]);
        let sources = Snapshot::from([source("app.py", &[("hello", 0)])]);
        assert!(match_diagnostics(&catalogs, &sources).is_empty());
    }

    #[test]
    fn test_undefined_key_warns_at_call_site() {
        let catalogs = Snapshot::from([catalog("en.po", "en", &[])]);
        let sources = Snapshot::from([source("app.py", &[("hello", 4)])]);

        let result = match_diagnostics(&catalogs, &sources);
        let diagnostics = &result["app.py"];
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].rule, Rule::UndefinedKey);
        assert_eq!(diagnostics[0].range, Range::from_coords(4, 3, 4, 8));
        assert_eq!(
            diagnostics[0].message,
            "undefined localization key 'hello' used in code"
        );
        assert!(!result.contains_key("en.po"));
    }

    #[test]
    fn test_unused_key_is_information() {
        let catalogs = Snapshot::from([catalog("en.po", "en", &[("bye", 2)])]);
        let sources = Snapshot::new();

        let result = match_diagnostics(&catalogs, &sources);
        let diagnostics = &result["en.po"];
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Information);
        assert_eq!(diagnostics[0].range, Range::from_coords(2, 6, 2, 11));
        assert_eq!(diagnostics[0].message, "localization key 'bye' is not used in code");
    }

    #[test]
    fn test_missing_translation_on_every_file_of_language() {
        let catalogs = Snapshot::from([
            catalog("a/en.po", "en", &[("hello", 0)]),
            catalog("a/ja.po", "ja", &[]),
            catalog("b/ja.po", "ja", &[]),
        ]);
        let sources = Snapshot::from([source("app.py", &[("hello", 0)])]);

        let result = match_diagnostics(&catalogs, &sources);
        for file in ["a/ja.po", "b/ja.po"] {
            assert_eq!(
                messages(&result, file),
                vec!["missing translation for key 'hello' in language 'ja'"]
            );
            assert_eq!(result[file][0].range, Range::document_start());
            assert_eq!(result[file][0].rule, Rule::MissingTranslation);
        }
        assert!(messages(&result, "a/en.po").is_empty());
        assert!(messages(&result, "app.py").is_empty());
    }

    #[test]
    fn test_output_is_sorted_and_deterministic() {
        let catalogs = Snapshot::from([catalog("en.po", "en", &[("b", 3), ("a", 1)])]);
        let sources = Snapshot::from([source("app.py", &[("z", 5), ("y", 2)])]);

        let first = match_diagnostics(&catalogs, &sources);
        let second = match_diagnostics(&catalogs, &sources);
        assert_eq!(first, second);
        assert_eq!(
            messages(&first, "app.py"),
            vec![
                "undefined localization key 'y' used in code",
                "undefined localization key 'z' used in code",
            ]
        );
        assert_eq!(
            messages(&first, "en.po"),
            vec![
                "localization key 'a' is not used in code",
                "localization key 'b' is not used in code",
            ]
        );
    }
}
