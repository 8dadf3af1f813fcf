//! Diagnostic types.
//!
//! Every finding travels in-band as a [`Diagnostic`]: catalog syntax problems
//! from the parser, reconciliation findings from the matching engine and
//! settings problems from the configuration loader. Operational failures
//! (I/O, grammar loading) are logged instead and never become diagnostics.

use std::{collections::BTreeMap, fmt};

use crate::core::data::Range;

// ============================================================
// Severity and Rule
// ============================================================

/// Severity level of a diagnostic, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Information => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// Rule identifier for each kind of diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rule {
    InvalidToken,
    UnexpectedContinuation,
    UnrecognizedLine,
    MissingValue,
    EmptyValue,
    DuplicateKey,
    ParseFailure,
    UndefinedKey,
    UnusedKey,
    MissingTranslation,
    Settings,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::InvalidToken => write!(f, "invalid-token"),
            Rule::UnexpectedContinuation => write!(f, "unexpected-continuation"),
            Rule::UnrecognizedLine => write!(f, "unrecognized-line"),
            Rule::MissingValue => write!(f, "missing-value"),
            Rule::EmptyValue => write!(f, "empty-value"),
            Rule::DuplicateKey => write!(f, "duplicate-key"),
            Rule::ParseFailure => write!(f, "parse-failure"),
            Rule::UndefinedKey => write!(f, "undefined-key"),
            Rule::UnusedKey => write!(f, "unused-key"),
            Rule::MissingTranslation => write!(f, "missing-translation"),
            Rule::Settings => write!(f, "settings"),
        }
    }
}

// ============================================================
// Diagnostic
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub range: Range,
    pub message: String,
    pub severity: Severity,
    pub rule: Rule,
}

impl Diagnostic {
    pub fn new(range: Range, message: impl Into<String>, severity: Severity, rule: Rule) -> Self {
        Self {
            range,
            message: message.into(),
            severity,
            rule,
        }
    }

    pub fn error(range: Range, message: impl Into<String>, rule: Rule) -> Self {
        Self::new(range, message, Severity::Error, rule)
    }

    pub fn warning(range: Range, message: impl Into<String>, rule: Rule) -> Self {
        Self::new(range, message, Severity::Warning, rule)
    }

    pub fn information(range: Range, message: impl Into<String>, rule: Rule) -> Self {
        Self::new(range, message, Severity::Information, rule)
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.range
            .cmp(&other.range)
            .then_with(|| self.severity.cmp(&other.severity))
            .then_with(|| self.rule.cmp(&other.rule))
            .then_with(|| self.message.cmp(&other.message))
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Diagnostics grouped by file path.
pub type FileDiagnostics = BTreeMap<String, Vec<Diagnostic>>;

/// Merge `other` into `into`, keeping each file's list sorted.
pub fn merge_file_diagnostics(into: &mut FileDiagnostics, other: FileDiagnostics) {
    for (file, diagnostics) in other {
        let slot = into.entry(file).or_default();
        slot.extend(diagnostics);
        slot.sort();
    }
}

/// Count diagnostics of a given severity across all files.
pub fn count_severity(diagnostics: &FileDiagnostics, severity: Severity) -> usize {
    diagnostics
        .values()
        .flatten()
        .filter(|d| d.severity == severity)
        .count()
}
