//! Text positions, ranges and locations.
//!
//! Lines are zero-based. Columns count UTF-16 code units so that positions
//! agree with what editors report; byte offsets are converted through
//! [`LineIndex`] and never used as columns directly.

use std::fmt;

/// A zero-based `(line, column)` position. Column is in UTF-16 code units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A half-open text range. `end` is the first position after the content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Build a range, swapping the endpoints if they are out of order.
    pub fn new(start: Position, end: Position) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    pub fn from_coords(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self::new(
            Position::new(start_line, start_col),
            Position::new(end_line, end_col),
        )
    }

    /// Zero-length range at the very start of a document.
    pub const fn document_start() -> Self {
        Self {
            start: Position::new(0, 0),
            end: Position::new(0, 0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `pos` lies within the range, treating `end` as inclusive so a
    /// cursor placed right after the last character still hits.
    pub fn contains_inclusive(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Whether `inner` lies entirely within this range.
    pub fn encloses(&self, inner: &Range) -> bool {
        self.start <= inner.start && inner.end <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line + 1,
            self.start.column + 1,
            self.end.line + 1,
            self.end.column + 1
        )
    }
}

/// A range inside a specific file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub file_path: String,
    pub range: Range,
}

impl Location {
    pub fn new(file_path: impl Into<String>, range: Range) -> Self {
        Self {
            file_path: file_path.into(),
            range,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file_path,
            self.range.start.line + 1,
            self.range.start.column + 1
        )
    }
}

/// Number of UTF-16 code units in `s`.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

// ============================================================
// Line Index
// ============================================================

/// Pre-computed line start offsets for converting between byte offsets and
/// [`Position`]s of a text.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { text, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset into a position. Offsets past the end clamp to
    /// the end of the text; offsets inside a multi-byte char round down.
    pub fn position_at(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        };
        let line_start = self.line_starts[line];
        Position::new(line, utf16_len(&self.text[line_start..offset]))
    }

    /// Convert a position back into a byte offset.
    ///
    /// Returns `None` when the line does not exist or the column falls past
    /// the end of the line or inside a surrogate pair.
    pub fn offset_at(&self, pos: Position) -> Option<usize> {
        let line_start = *self.line_starts.get(pos.line)?;
        let line_end = self
            .line_starts
            .get(pos.line + 1)
            .copied()
            .unwrap_or(self.text.len());
        let line = &self.text[line_start..line_end];

        let mut units = 0;
        for (i, c) in line.char_indices() {
            if units == pos.column {
                return Some(line_start + i);
            }
            if units > pos.column {
                return None;
            }
            units += c.len_utf16();
        }
        (units == pos.column).then_some(line_end)
    }

    pub fn range_of(&self, start: usize, end: usize) -> Range {
        Range::new(self.position_at(start), self.position_at(end))
    }
}
