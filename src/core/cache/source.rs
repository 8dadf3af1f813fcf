//! Cache of call sites extracted from code files.

use std::{sync::Arc, time::Duration};

use super::{FileCache, FileParser};
use crate::core::{
    data::{CodeCallSite, CodeLanguage, Target},
    extract::CallExtractor,
    workspace::Workspace,
};

/// `code file -> call sites`
pub type SourceCache = FileCache<Vec<CodeCallSite>>;

/// Extracts call sites of one target's localization functions.
pub struct SourceFileParser {
    extractor: Arc<CallExtractor>,
    languages: Vec<CodeLanguage>,
    function_names: Vec<String>,
}

impl SourceFileParser {
    pub fn new(extractor: Arc<CallExtractor>, target: &Target) -> Self {
        Self {
            extractor,
            languages: target.code_languages.clone(),
            function_names: target.function_names.clone(),
        }
    }

    fn language_of(&self, file_path: &str) -> Option<CodeLanguage> {
        let (_, ext) = file_path.rsplit_once('.')?;
        CodeLanguage::from_extension(ext).filter(|lang| self.languages.contains(lang))
    }
}

impl FileParser<Vec<CodeCallSite>> for SourceFileParser {
    fn parse(&self, file_path: &str, text: &str) -> Vec<CodeCallSite> {
        match self.language_of(file_path) {
            Some(language) => self
                .extractor
                .extract(file_path, text, language, &self.function_names),
            None => Vec::new(),
        }
    }
}

impl SourceCache {
    pub fn for_target(
        target: &Target,
        extractor: Arc<CallExtractor>,
        workspace: Arc<dyn Workspace>,
        interval: Duration,
    ) -> Self {
        FileCache::new(
            "source-cache",
            Arc::new(SourceFileParser::new(extractor, target)),
            workspace,
            interval,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::CatalogFormat;

    fn target() -> Target {
        Target {
            code_languages: vec![CodeLanguage::Python],
            code_dirs: vec!["/p/src".into()],
            catalog_format: CatalogFormat::Po,
            catalog_dirs: vec!["/p/locales".into()],
            catalog_extension: ".po".to_string(),
            function_names: vec!["_".to_string()],
            settings_location: None,
        }
    }

    #[test]
    fn test_parses_only_target_languages() {
        let parser = SourceFileParser::new(Arc::new(CallExtractor::default()), &target());

        let sites = parser.parse("/p/src/app.py", "print(_(\"hello\"))\n");
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].key, "hello");

        assert!(parser.parse("/p/src/app.js", "_(\"hello\")").is_empty());
    }
}
