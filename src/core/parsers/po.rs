//! gettext PO catalog parser.
//!
//! A single forward pass over lines with a small state machine. Entries are
//! flushed on a blank line, on the next `msgid` and at end of input. The
//! header entry (empty `msgid`) is never stored; its `Language:` field
//! overrides the language derived from the file name.
//!
//! Plural forms contribute `msgstr[0]` as the translation. `msgctxt`,
//! `msgid_plural` and `msgstr[n]` for `n > 0` are recognized and skipped.

use std::{
    collections::BTreeMap,
    panic::{self, AssertUnwindSafe},
    path::Path,
    sync::LazyLock,
};

use regex::Regex;
use tracing::warn;

use super::CatalogParser;
use crate::core::data::{
    CatalogEntry, CatalogParseResult, LanguageEntries, Location, Position, Range, utf16_len,
};
use crate::issues::{Diagnostic, Rule};

static KEYWORD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(msgctxt|msgid_plural|msgid|msgstr(?:\[(\d+)\])?)\s+(".*")\s*$"#).unwrap()
});

static KEYWORD_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(msgctxt|msgid_plural|msgid|msgstr(?:\[\d+\])?)").unwrap());

static CONTINUATION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(".*")\s*$"#).unwrap());

static HEADER_LANGUAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^[ \t]*Language:[ \t]*(\S[^\r\n]*)").unwrap());

#[derive(Debug, Clone, Copy, Default)]
pub struct PoParser;

impl CatalogParser for PoParser {
    fn parse(&self, file_path: &str, text: &str) -> CatalogParseResult {
        match panic::catch_unwind(AssertUnwindSafe(|| parse_po(file_path, text))) {
            Ok(result) => result,
            Err(_) => {
                warn!(file = file_path, "PO parser failed unexpectedly");
                CatalogParseResult {
                    entries: BTreeMap::from([(default_language(file_path), LanguageEntries::new())]),
                    diagnostics: vec![Diagnostic::warning(
                        Range::document_start(),
                        "unknown parse error",
                        Rule::ParseFailure,
                    )],
                    success: false,
                }
            }
        }
    }
}

/// Language tag derived from a catalog file name: `locales/ja.po` -> `ja`.
pub fn default_language(file_path: &str) -> String {
    Path::new(file_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Escape a string for use inside a PO quoted string (without the quotes).
pub fn escape_po(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

// ============================================================
// Internal Functions
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InKey,
    InValue,
    /// Inside `msgctxt`, `msgid_plural` or a non-zero `msgstr[n]`.
    InIgnored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Context,
    Id,
    IdPlural,
    Str(usize),
}

struct PendingEntry {
    key: String,
    key_range: Range,
    value: String,
    value_range: Option<Range>,
}

struct PoState<'a> {
    file_path: &'a str,
    language: String,
    entries: LanguageEntries,
    diagnostics: Vec<Diagnostic>,
    success: bool,
    state: State,
    current: Option<PendingEntry>,
}

fn parse_po(file_path: &str, text: &str) -> CatalogParseResult {
    let mut po = PoState {
        file_path,
        language: default_language(file_path),
        entries: LanguageEntries::new(),
        diagnostics: Vec::new(),
        success: true,
        state: State::Idle,
        current: None,
    };

    for (line_no, raw) in text.split('\n').enumerate() {
        po.handle_line(line_no, raw);
    }
    po.flush();

    CatalogParseResult {
        entries: BTreeMap::from([(po.language, po.entries)]),
        diagnostics: po.diagnostics,
        success: po.success,
    }
}

impl PoState<'_> {
    fn handle_line(&mut self, line_no: usize, raw: &str) {
        let line = raw.trim();
        if line.is_empty() {
            self.flush();
            return;
        }
        if line.starts_with('#') {
            return;
        }

        if let Some(caps) = KEYWORD_LINE.captures(line) {
            let token = &caps[1];
            let keyword = match (token, caps.get(2)) {
                ("msgctxt", _) => Keyword::Context,
                ("msgid", _) => Keyword::Id,
                ("msgid_plural", _) => Keyword::IdPlural,
                (_, Some(index)) => Keyword::Str(index.as_str().parse().unwrap_or(usize::MAX)),
                _ => Keyword::Str(0),
            };
            match unquote(&caps[3]) {
                Some(text) => self.keyword(line_no, raw, keyword, text),
                None => self.invalid_token(line_no, raw, token),
            }
            return;
        }

        if let Some(token) = KEYWORD_PREFIX.find(line) {
            self.invalid_token(line_no, raw, token.as_str());
            return;
        }

        if let Some(caps) = CONTINUATION_LINE.captures(line) {
            let quoted = &caps[1];
            match unquote(quoted) {
                Some(text) => self.continuation(line_no, raw, quoted, text),
                None => self.unrecognized(line_no, line),
            }
            return;
        }

        self.unrecognized(line_no, line);
    }

    fn keyword(&mut self, line_no: usize, raw: &str, keyword: Keyword, text: String) {
        let span = quote_span(line_no, raw);
        match keyword {
            Keyword::Id => {
                self.flush();
                self.current = Some(PendingEntry {
                    key: text,
                    key_range: span,
                    value: String::new(),
                    value_range: None,
                });
                self.state = State::InKey;
            }
            Keyword::Context => {
                self.flush();
                self.state = State::InIgnored;
            }
            Keyword::IdPlural => {
                self.state = State::InIgnored;
            }
            Keyword::Str(index) => match self.current.as_mut() {
                Some(entry) if index == 0 => {
                    entry.value = text;
                    entry.value_range = Some(span);
                    self.state = State::InValue;
                }
                Some(_) => self.state = State::InIgnored,
                None => {
                    self.diagnostics.push(Diagnostic::warning(
                        span,
                        "msgstr without a preceding msgid",
                        Rule::UnrecognizedLine,
                    ));
                    self.success = false;
                    self.state = State::InIgnored;
                }
            },
        }
    }

    fn continuation(&mut self, line_no: usize, raw: &str, quoted: &str, text: String) {
        let span = quote_span(line_no, raw);
        match (self.state, self.current.as_mut()) {
            (State::InKey, Some(entry)) => {
                entry.key.push_str(&text);
                entry.key_range = Range::new(entry.key_range.start, span.end);
            }
            (State::InValue, Some(entry)) => {
                entry.value.push_str(&text);
                let start = entry.value_range.map_or(span.start, |r| r.start);
                entry.value_range = Some(Range::new(start, span.end));
            }
            (State::InIgnored, _) => {}
            _ => {
                self.diagnostics.push(Diagnostic::warning(
                    span,
                    format!("unexpected continuation string outside of msgid/msgstr: {quoted}"),
                    Rule::UnexpectedContinuation,
                ));
                self.success = false;
            }
        }
    }

    fn invalid_token(&mut self, line_no: usize, raw: &str, token: &str) {
        let start = raw.find(token).unwrap_or(0);
        let start_col = utf16_len(&raw[..start]);
        self.diagnostics.push(Diagnostic::error(
            Range::from_coords(line_no, start_col, line_no, start_col + utf16_len(token)),
            format!("invalid {token} format, expected quoted string"),
            Rule::InvalidToken,
        ));
        self.success = false;
    }

    fn unrecognized(&mut self, line_no: usize, line: &str) {
        let anchor = Position::new(line_no, 0);
        self.diagnostics.push(Diagnostic::warning(
            Range::new(anchor, anchor),
            format!("unrecognized line in catalog: {line}"),
            Rule::UnrecognizedLine,
        ));
        self.success = false;
    }

    fn flush(&mut self) {
        self.state = State::Idle;
        let Some(entry) = self.current.take() else {
            return;
        };

        if entry.key.is_empty() {
            if let Some(caps) = HEADER_LANGUAGE.captures(&entry.value) {
                self.language = caps[1].trim().to_string();
            }
            return;
        }

        let Some(value_range) = entry.value_range else {
            self.diagnostics.push(Diagnostic::error(
                entry.key_range,
                format!("missing msgstr for msgid '{}'", entry.key),
                Rule::MissingValue,
            ));
            self.success = false;
            return;
        };

        if entry.value.trim().is_empty() {
            self.diagnostics.push(Diagnostic::warning(
                value_range,
                format!("empty msgstr for msgid '{}'", entry.key),
                Rule::EmptyValue,
            ));
            self.success = false;
            return;
        }

        if self.entries.contains_key(&entry.key) {
            self.diagnostics.push(Diagnostic::warning(
                entry.key_range,
                format!("duplicate msgid '{}'", entry.key),
                Rule::DuplicateKey,
            ));
        }

        self.entries.insert(
            entry.key,
            CatalogEntry {
                translation: entry.value,
                location: Location::new(self.file_path, entry.key_range),
            },
        );
    }
}

/// Range from the first to just past the last quote on a line.
fn quote_span(line_no: usize, raw: &str) -> Range {
    let first = raw.find('"').unwrap_or(0);
    let last = raw.rfind('"').map_or(first, |i| i + 1);
    Range::from_coords(
        line_no,
        utf16_len(&raw[..first]),
        line_no,
        utf16_len(&raw[..last]),
    )
}

/// Strip the surrounding quotes of a single PO string and unescape it.
///
/// Returns `None` when the text is not exactly one quoted string, e.g. an
/// unescaped quote inside or an escaped closing quote.
fn unquote(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                '"' => out.push('"'),
                '\\' => out.push('\\'),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            },
            '"' => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::Severity;
    use pretty_assertions::assert_eq;

    fn parse(file: &str, text: &str) -> CatalogParseResult {
        PoParser.parse(file, text)
    }

    fn entries<'a>(result: &'a CatalogParseResult, lang: &str) -> &'a LanguageEntries {
        result.entries.get(lang).expect("language present")
    }

    #[test]
    fn test_well_formed_entries() {
        let text = "msgid \"hello\"\nmsgstr \"hi\"\n\nmsgid \"bye\"\nmsgstr \"see you\"\n\nmsgid \"x\"\nmsgstr \"y\"\n";
        let result = parse("/p/locales/en.po", text);

        assert!(result.success);
        assert!(result.diagnostics.is_empty());
        let en = entries(&result, "en");
        assert_eq!(en.len(), 3);
        assert_eq!(en["hello"].translation, "hi");
        assert_eq!(en["hello"].location.file_path, "/p/locales/en.po");
        assert_eq!(en["hello"].location.range, Range::from_coords(0, 6, 0, 13));
        assert_eq!(en["bye"].location.range, Range::from_coords(3, 6, 3, 11));
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let text = "msgid \"a\"\nmsgstr \"b\"\nmsgid \"a\"\nmsgstr \"c\"\nbogus\n";
        assert_eq!(parse("ja.po", text), parse("ja.po", text));
    }

    #[test]
    fn test_header_language_overrides_file_name() {
        let text = "msgid \"\"\nmsgstr \"\"\n\"Project-Id-Version: demo\\n\"\n\"Language: ja\\n\"\n\nmsgid \"hello\"\nmsgstr \"konnichiwa\"\n";
        let result = parse("messages.po", text);

        assert!(result.success);
        assert!(result.entries.get("messages").is_none());
        assert_eq!(entries(&result, "ja")["hello"].translation, "konnichiwa");
    }

    #[test]
    fn test_header_without_language_keeps_file_name() {
        let text = "msgid \"\"\nmsgstr \"Language-Team: none\\n\"\n\nmsgid \"a\"\nmsgstr \"b\"\n";
        let result = parse("fr.po", text);
        assert_eq!(entries(&result, "fr").len(), 1);
    }

    #[test]
    fn test_multiline_key_and_value() {
        let text = "msgid \"\"\n\"hel\"\n  \"lo\"\nmsgstr \"\"\n\"wor\"\n\"ld\"\n";
        let result = parse("en.po", text);

        assert!(result.diagnostics.is_empty());
        let entry = &entries(&result, "en")["hello"];
        assert_eq!(entry.translation, "world");
        assert_eq!(entry.location.range, Range::from_coords(0, 6, 2, 6));
    }

    #[test]
    fn test_missing_msgstr_is_error() {
        let result = parse("en.po", "msgid \"lonely\"\n\nmsgid \"ok\"\nmsgstr \"fine\"\n");

        assert!(!result.success);
        assert_eq!(result.diagnostics.len(), 1);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.rule, Rule::MissingValue);
        assert_eq!(diag.message, "missing msgstr for msgid 'lonely'");
        assert_eq!(diag.range, Range::from_coords(0, 6, 0, 14));
        assert!(!entries(&result, "en").contains_key("lonely"));
        assert!(entries(&result, "en").contains_key("ok"));
    }

    #[test]
    fn test_empty_msgstr_is_warning_and_discarded() {
        let result = parse("en.po", "msgid \"a\"\nmsgstr \"  \"\n");

        assert!(!result.success);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.rule, Rule::EmptyValue);
        assert_eq!(diag.message, "empty msgstr for msgid 'a'");
        assert_eq!(diag.range, Range::from_coords(1, 7, 1, 11));
        assert!(entries(&result, "en").is_empty());
    }

    #[test]
    fn test_duplicate_last_wins() {
        let text = "msgid \"k\"\nmsgstr \"first\"\n\nmsgid \"k\"\nmsgstr \"second\"\n";
        let result = parse("en.po", text);

        assert!(result.success);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].rule, Rule::DuplicateKey);
        assert_eq!(result.diagnostics[0].message, "duplicate msgid 'k'");
        assert_eq!(result.diagnostics[0].range, Range::from_coords(3, 6, 3, 9));
        let entry = &entries(&result, "en")["k"];
        assert_eq!(entry.translation, "second");
        assert_eq!(entry.location.range.start.line, 3);
    }

    #[test]
    fn test_unquoted_msgid_reports_token_span() {
        let result = parse("en.po", "  msgid hello\nmsgstr \"x\"\n");

        assert!(!result.success);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.rule, Rule::InvalidToken);
        assert_eq!(diag.message, "invalid msgid format, expected quoted string");
        assert_eq!(diag.range, Range::from_coords(0, 2, 0, 7));
    }

    #[test]
    fn test_unquoted_msgstr_reports_token_span() {
        let result = parse("en.po", "msgid \"a\"\nmsgstr oops\n");

        let diag = &result.diagnostics[0];
        assert_eq!(diag.message, "invalid msgstr format, expected quoted string");
        assert_eq!(diag.range, Range::from_coords(1, 0, 1, 6));
        // the msgstr line was skipped, so the entry has no value
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.message == "missing msgstr for msgid 'a'")
        );
    }

    #[test]
    fn test_continuation_outside_entry_is_warning() {
        let result = parse("en.po", "\"stray\"\nmsgid \"a\"\nmsgstr \"b\"\n");

        assert!(!result.success);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.rule, Rule::UnexpectedContinuation);
        assert_eq!(
            diag.message,
            "unexpected continuation string outside of msgid/msgstr: \"stray\""
        );
        assert_eq!(diag.range, Range::from_coords(0, 0, 0, 7));
        assert_eq!(entries(&result, "en")["a"].translation, "b");
    }

    #[test]
    fn test_unrecognized_line() {
        let result = parse("en.po", "garbage here\n");

        assert!(!result.success);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.rule, Rule::UnrecognizedLine);
        assert_eq!(diag.message, "unrecognized line in catalog: garbage here");
        assert_eq!(diag.range, Range::from_coords(0, 0, 0, 0));
    }

    #[test]
    fn test_comments_are_ignored() {
        let text = "# translator comment\n#: src/app.py:10\n#, fuzzy\nmsgid \"a\"\nmsgstr \"b\"\n";
        let result = parse("en.po", text);
        assert!(result.diagnostics.is_empty());
        assert_eq!(entries(&result, "en")["a"].location.range.start.line, 3);
    }

    #[test]
    fn test_unescapes_key_and_value() {
        let result = parse("en.po", "msgid \"a\\\"b\\\\c\\td\"\nmsgstr \"line\\nbreak\"\n");

        let en = entries(&result, "en");
        let entry = &en["a\"b\\c\td"];
        assert_eq!(entry.translation, "line\nbreak");
    }

    #[test]
    fn test_embedded_quote_is_invalid() {
        let result = parse("en.po", "msgid \"a\" \"b\"\nmsgstr \"x\"\n");
        assert_eq!(result.diagnostics[0].rule, Rule::InvalidToken);
    }

    #[test]
    fn test_plural_forms_use_first_msgstr() {
        let text = "msgid \"apple\"\nmsgid_plural \"apples\"\n\"!\"\nmsgstr[0] \"ringo\"\nmsgstr[1] \"ringos\"\n\"!\"\n";
        let result = parse("ja.po", text);

        assert!(result.success, "{:?}", result.diagnostics);
        let entry = &entries(&result, "ja")["apple"];
        assert_eq!(entry.translation, "ringo");
        assert_eq!(entry.location.range, Range::from_coords(0, 6, 0, 13));
    }

    #[test]
    fn test_msgctxt_is_skipped() {
        let text = "msgctxt \"menu\"\nmsgid \"Open\"\nmsgstr \"Ouvrir\"\n";
        let result = parse("fr.po", text);

        assert!(result.diagnostics.is_empty());
        assert_eq!(entries(&result, "fr")["Open"].translation, "Ouvrir");
    }

    #[test]
    fn test_orphan_msgstr_is_warning() {
        let result = parse("en.po", "msgstr \"nobody\"\n\"more\"\n");

        assert!(!result.success);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "msgstr without a preceding msgid");
    }

    #[test]
    fn test_columns_count_utf16_units() {
        let result = parse("ja.po", "msgid \"日本😀\"\nmsgstr \"x\"\n");
        let entry = &entries(&result, "ja")["日本😀"];
        assert_eq!(entry.location.range, Range::from_coords(0, 6, 0, 12));
    }

    #[test]
    fn test_empty_file_still_has_language() {
        let result = parse("/p/de.po", "");
        assert!(result.success);
        assert!(entries(&result, "de").is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let result = parse("en.po", "msgid \"a\"\r\nmsgstr \"b\"\r\n\r\nmsgid \"c\"\r\nmsgstr \"d\"\r\n");
        assert!(result.diagnostics.is_empty());
        assert_eq!(entries(&result, "en").len(), 2);
        assert_eq!(entries(&result, "en")["a"].location.range, Range::from_coords(0, 6, 0, 9));
    }

    #[test]
    fn test_escape_po() {
        assert_eq!(escape_po("say \"hi\"\\\n"), "say \\\"hi\\\"\\\\\\n");
        assert_eq!(escape_po("plain"), "plain");
    }
}
