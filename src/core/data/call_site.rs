//! Localization call sites found in source code.

use super::position::{Location, Range};

/// How escapes are written inside a string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscapeStyle {
    /// `\n`, `\"`, `\\` and friends.
    Backslash,
    /// C# verbatim strings: a quote is written as `""`, no backslash escapes.
    DoubledQuote,
    /// Raw strings: no escapes at all.
    Raw,
}

/// Shape of the literal a key was written in, kept so a rename can write the
/// new key back in the same style.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiteralStyle {
    /// String-kind prefix such as `r`, `u`, `@`. Empty when absent.
    pub prefix: String,
    /// Opening (and closing) delimiter: `"`, `'`, `` ` ``, `"""`, ...
    pub delimiter: String,
    pub escape: EscapeStyle,
}

impl LiteralStyle {
    pub fn double_quoted() -> Self {
        Self {
            prefix: String::new(),
            delimiter: "\"".to_string(),
            escape: EscapeStyle::Backslash,
        }
    }
}

impl Default for LiteralStyle {
    fn default() -> Self {
        Self::double_quoted()
    }
}

/// One accepted invocation of a localization function with a static key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeCallSite {
    /// Unescaped key text.
    pub key: String,
    /// Location of the key's characters only, inside the delimiters.
    pub location: Location,
    /// Whole literal token including prefix and delimiters.
    pub literal_range: Range,
    /// The full call expression.
    pub call_range: Range,
    pub style: LiteralStyle,
}

impl CodeCallSite {
    pub fn file_path(&self) -> &str {
        &self.location.file_path
    }

    /// Whether the inner key span is distinct from the literal token, i.e.
    /// delimiters were located around it.
    pub fn has_isolated_key(&self) -> bool {
        self.literal_range.encloses(&self.location.range) && self.literal_range != self.location.range
    }
}
