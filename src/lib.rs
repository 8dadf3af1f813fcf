//! locsync - localization consistency checker
//!
//! locsync keeps localization function calls in source code and gettext
//! catalogs consistent. It reports undefined and unused keys, missing
//! translations and malformed catalog entries, and renames keys across code
//! and catalogs in one atomic edit.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (argument parsing, commands, reporting)
//! - `config`: Configuration file loading and target normalization
//! - `core`: Parsers, extraction, incremental caches and the matching engine
//! - `issues`: Diagnostic types shared by the engine and the reporter

pub mod cli;
pub mod config;
pub mod core;
pub mod issues;
