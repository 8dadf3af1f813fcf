//! Core data types shared by the parsers, caches and matching engine.
//!
//! ## Module Structure
//!
//! - `position`: Position, Range, Location and the UTF-16 aware LineIndex
//! - `catalog`: CatalogEntry and CatalogParseResult
//! - `call_site`: CodeCallSite and the literal style it was written in
//! - `edit`: TextEdit and EditSet, plus applying edits to a text
//! - `target`: Target, CodeLanguage and CatalogFormat

pub mod call_site;
pub mod catalog;
pub mod edit;
pub mod position;
pub mod target;

pub use call_site::{CodeCallSite, EscapeStyle, LiteralStyle};
pub use catalog::{CatalogEntry, CatalogParseResult, LanguageEntries};
pub use edit::{EditSet, TextEdit, apply_text_edits};
pub use position::{LineIndex, Location, Position, Range, utf16_len};
pub use target::{CatalogFormat, CodeLanguage, Target};
