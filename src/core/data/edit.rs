//! Text edits grouped by file.

use std::collections::BTreeMap;

use anyhow::{Result, bail};

use super::position::{LineIndex, Range};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

/// A set of replacements across files, applied as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSet {
    edits: BTreeMap<String, Vec<TextEdit>>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file_path: impl Into<String>, range: Range, new_text: impl Into<String>) {
        let edits = self.edits.entry(file_path.into()).or_default();
        edits.push(TextEdit {
            range,
            new_text: new_text.into(),
        });
        edits.sort();
        edits.dedup();
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Total number of edits.
    pub fn len(&self) -> usize {
        self.edits.values().map(Vec::len).sum()
    }

    pub fn file_count(&self) -> usize {
        self.edits.len()
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &[TextEdit])> {
        self.edits
            .iter()
            .map(|(file, edits)| (file.as_str(), edits.as_slice()))
    }

    pub fn edits_for(&self, file_path: &str) -> &[TextEdit] {
        self.edits.get(file_path).map_or(&[], Vec::as_slice)
    }
}

/// Apply one file's edits to its text.
///
/// Fails without partial output if an edit points outside the text or two
/// edits overlap.
pub fn apply_text_edits(text: &str, edits: &[TextEdit]) -> Result<String> {
    let index = LineIndex::new(text);
    let mut spans = Vec::with_capacity(edits.len());
    for edit in edits {
        let (Some(start), Some(end)) = (
            index.offset_at(edit.range.start),
            index.offset_at(edit.range.end),
        ) else {
            bail!("edit range {} is outside the document", edit.range);
        };
        spans.push((start, end, edit.new_text.as_str()));
    }
    spans.sort_by_key(|&(start, end, _)| (start, end));
    for pair in spans.windows(2) {
        if pair[1].0 < pair[0].1 {
            bail!("overlapping edits at byte offset {}", pair[1].0);
        }
    }

    let mut out = text.to_string();
    for &(start, end, new_text) in spans.iter().rev() {
        out.replace_range(start..end, new_text);
    }
    Ok(out)
}
