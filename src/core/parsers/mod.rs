//! Catalog parsers.
//!
//! Each supported [`CatalogFormat`] has one [`CatalogParser`]. Parsers are
//! pure: text in, [`CatalogParseResult`] out, malformed input reported as
//! diagnostics rather than errors.

pub mod po;

use crate::core::data::{CatalogFormat, CatalogParseResult};

pub use po::PoParser;

pub trait CatalogParser: Send + Sync {
    fn parse(&self, file_path: &str, text: &str) -> CatalogParseResult;
}

/// Parser implementation for a catalog format.
pub fn parser_for(format: CatalogFormat) -> &'static dyn CatalogParser {
    match format {
        CatalogFormat::Po => &PoParser,
    }
}
