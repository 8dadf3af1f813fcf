//! String literal normalization.
//!
//! Splits a literal token into prefix, delimiters and inner text, unescapes
//! the inner text into a key, and goes the other way when a rename writes a
//! new key back into source.

use std::ops::Range;

use crate::core::data::{EscapeStyle, LiteralStyle};

/// Which multi-character delimiters a literal kind may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelimiterRules {
    /// `"""` / `'''` (Python strings, Java text blocks).
    pub triple_quotes: bool,
    /// Runs of three or more quotes with matching length (C# raw strings).
    pub raw_runs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLiteral {
    pub key: String,
    /// Byte range of the inner text, relative to the literal token.
    pub inner: Range<usize>,
    pub style: LiteralStyle,
}

/// Split and unescape a literal token such as `"a\"b"`, `r'x'` or `@"C:\"`.
///
/// Returns `None` when the token does not have the expected shape.
pub fn parse_literal(text: &str, rules: DelimiterRules) -> Option<ParsedLiteral> {
    let prefix_len = text.find(['"', '\'', '`'])?;
    let prefix = &text[..prefix_len];
    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c == '@' || c == '$')
    {
        return None;
    }

    let rest = &text[prefix_len..];
    let quote = rest.chars().next()?;
    let run = rest.chars().take_while(|&c| c == quote).count();
    let delim_len = if rules.raw_runs && run >= 3 {
        run.min(rest.len() / 2)
    } else if rules.triple_quotes && run >= 3 {
        3
    } else {
        1
    };
    if rest.len() < delim_len * 2 {
        return None;
    }
    let delimiter = &rest[..delim_len];
    if !rest[delim_len..].ends_with(delimiter) {
        return None;
    }

    let inner_start = prefix_len + delim_len;
    let inner_end = text.len() - delim_len;
    let escape = if prefix.contains('@') {
        EscapeStyle::DoubledQuote
    } else if prefix.contains(['r', 'R']) || (rules.raw_runs && delim_len >= 3) {
        EscapeStyle::Raw
    } else {
        EscapeStyle::Backslash
    };
    let style = LiteralStyle {
        prefix: prefix.to_string(),
        delimiter: delimiter.to_string(),
        escape,
    };

    Some(ParsedLiteral {
        key: unescape(&text[inner_start..inner_end], &style),
        inner: inner_start..inner_end,
        style,
    })
}

pub fn unescape(inner: &str, style: &LiteralStyle) -> String {
    match style.escape {
        EscapeStyle::Raw => inner.to_string(),
        EscapeStyle::DoubledQuote => inner.replace("\"\"", "\""),
        EscapeStyle::Backslash => unescape_backslash(inner),
    }
}

/// Escape `key` so it can sit between the delimiters of `style`.
///
/// Returns `None` when the key cannot be expressed in that style, e.g. a raw
/// string that would need to contain its own delimiter.
pub fn escape(key: &str, style: &LiteralStyle) -> Option<String> {
    let quote = style.delimiter.chars().next().unwrap_or('"');
    match style.escape {
        EscapeStyle::Raw => {
            let conflicts = key.contains(&style.delimiter)
                || (style.delimiter.len() == 1 && key.contains(quote))
                || key.ends_with(quote)
                || (!style.prefix.is_empty() && key.ends_with('\\'));
            (!conflicts).then(|| key.to_string())
        }
        EscapeStyle::DoubledQuote => Some(key.replace('"', "\"\"")),
        EscapeStyle::Backslash => {
            let mut out = String::with_capacity(key.len());
            for c in key.chars() {
                match c {
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    '$' if quote == '`' => out.push_str("\\$"),
                    c if c == quote => {
                        out.push('\\');
                        out.push(c);
                    }
                    c => out.push(c),
                }
            }
            Some(out)
        }
    }
}

/// Full literal text for `key` in `style`, prefix and delimiters included.
pub fn render(key: &str, style: &LiteralStyle) -> Option<String> {
    let inner = escape(key, style)?;
    Some(format!(
        "{}{}{}{}",
        style.prefix, style.delimiter, inner, style.delimiter
    ))
}

fn unescape_backslash(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '\'' | '"' | '`' | '$')) => out.push(c),
            // line continuation
            Some('\n') => {}
            Some('\r') => {
                chars.next_if_eq(&'\n');
            }
            Some('u') => {
                let digits: String = if chars.next_if_eq(&'{').is_some() {
                    chars.by_ref().take_while(|&c| c != '}').collect()
                } else {
                    (0..4)
                        .map_while(|_| chars.next_if(char::is_ascii_hexdigit))
                        .collect()
                };
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&digits);
                    }
                }
            }
            Some('x') => {
                let digits: String = (0..2)
                    .map_while(|_| chars.next_if(char::is_ascii_hexdigit))
                    .collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(ch) if digits.len() == 2 => out.push(ch),
                    _ => {
                        out.push_str("\\x");
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
