//! Key rename across code and catalogs.
//!
//! Planning is pure: it turns known locations of a key into one [`EditSet`].
//! Applying the set is left to [`Workspace::apply_edits`], which is
//! all-or-nothing.
//!
//! [`Workspace::apply_edits`]: crate::core::workspace::Workspace::apply_edits

use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::{
    data::{CodeCallSite, EditSet, LiteralStyle, Location},
    extract::literal::{escape, render},
    parsers::po::escape_po,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenameError {
    #[error("cannot rename '{from}' to '{to}': key '{to}' already exists")]
    Conflict { from: String, to: String },
    #[error("new key name must not be empty")]
    EmptyName,
}

/// Plan the edits renaming `old` to `new`.
///
/// `code_sites` may contain other keys' sites; only those of `old` are
/// rewritten. `catalog_locations` carry no key and must already be the
/// definitions of `old`: every one of them is rewritten. Fails with
/// [`RenameError::Conflict`] when `new` is already a catalog key, producing
/// no edits.
pub fn plan_rename<'a>(
    old: &str,
    new: &str,
    code_sites: impl IntoIterator<Item = &'a CodeCallSite>,
    catalog_locations: impl IntoIterator<Item = &'a Location>,
    existing_keys: &BTreeSet<String>,
) -> Result<EditSet, RenameError> {
    if new.is_empty() {
        return Err(RenameError::EmptyName);
    }
    let mut edits = EditSet::new();
    if new == old {
        return Ok(edits);
    }
    if existing_keys.contains(new) {
        return Err(RenameError::Conflict {
            from: old.to_string(),
            to: new.to_string(),
        });
    }

    for site in code_sites.into_iter().filter(|site| site.key == old) {
        let inner = site
            .has_isolated_key()
            .then(|| escape(new, &site.style))
            .flatten();
        match inner {
            Some(text) => edits.push(site.file_path(), site.location.range, text),
            None => edits.push(site.file_path(), site.literal_range, default_literal(new)),
        }
    }

    for location in catalog_locations {
        edits.push(
            location.file_path.as_str(),
            location.range,
            format!("\"{}\"", escape_po(new)),
        );
    }

    Ok(edits)
}

fn default_literal(key: &str) -> String {
    render(key, &LiteralStyle::double_quoted()).unwrap_or_else(|| format!("\"{key}\""))
}
