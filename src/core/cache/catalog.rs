//! Cache of parsed catalog files.

use std::{sync::Arc, time::Duration};

use super::{FileCache, FileParser};
use crate::core::{
    data::{CatalogFormat, CatalogParseResult},
    parsers::{CatalogParser, parser_for},
    workspace::Workspace,
};

/// `catalog file -> parse result`
pub type CatalogCache = FileCache<CatalogParseResult>;

pub struct CatalogFileParser {
    parser: &'static dyn CatalogParser,
}

impl CatalogFileParser {
    pub fn new(format: CatalogFormat) -> Self {
        Self {
            parser: parser_for(format),
        }
    }
}

impl FileParser<CatalogParseResult> for CatalogFileParser {
    fn parse(&self, file_path: &str, text: &str) -> CatalogParseResult {
        self.parser.parse(file_path, text)
    }
}

impl CatalogCache {
    pub fn for_format(
        format: CatalogFormat,
        workspace: Arc<dyn Workspace>,
        interval: Duration,
    ) -> Self {
        FileCache::new(
            "catalog-cache",
            Arc::new(CatalogFileParser::new(format)),
            workspace,
            interval,
        )
    }
}
