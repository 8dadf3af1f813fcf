//! Consistency engine between localization calls in code and catalogs.
//!
//! ## Module Structure
//!
//! - `data`: positions, catalog entries, call sites, targets, edits
//! - `parsers`: catalog parsers (PO)
//! - `extract`: tree-sitter call extraction and string literal handling
//! - `scheduler`: debounced, coalescing batch scheduler
//! - `cache`: per-file incremental caches built on the scheduler
//! - `matching`: diagnostics from a catalog snapshot and a code snapshot
//! - `rename`: key rename planning
//! - `workspace`: file enumeration, reads and atomic edits
//! - `engine`: one target's caches, queries and rename
//! - `service`: every target behind one entry point

pub mod cache;
pub mod data;
pub mod engine;
pub mod extract;
pub mod matching;
pub mod parsers;
pub mod rename;
pub mod scheduler;
pub mod service;
pub mod workspace;
