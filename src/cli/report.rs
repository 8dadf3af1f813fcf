//! Report formatting and printing utilities.
//!
//! This module prints diagnostics in cargo-style format. It is separate from
//! the core so locsync can be used as a library.

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::Path,
};

use colored::{ColoredString, Colorize};
use unicode_width::UnicodeWidthStr;

use crate::config::CONFIG_FILE_NAME;
use crate::core::data::{EditSet, Range};
use crate::issues::{Diagnostic, FileDiagnostics, Severity, count_severity};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Print diagnostics in cargo-style format to stdout.
///
/// Paths are shown relative to `root` when they are inside it.
pub fn report(diagnostics: &FileDiagnostics, root: &Path) {
    report_to(diagnostics, root, &mut io::stdout().lock());
}

/// Print diagnostics to a custom writer.
///
/// Useful for testing or redirecting output.
pub fn report_to<W: Write>(diagnostics: &FileDiagnostics, root: &Path, writer: &mut W) {
    if diagnostics.values().all(Vec::is_empty) {
        return;
    }

    let max_line_width = calculate_max_line_width(diagnostics);
    for (file, list) in diagnostics {
        let text = fs::read_to_string(file).ok();
        let lines: Vec<&str> = text.as_deref().map(|t| t.lines().collect()).unwrap_or_default();
        let path = display_path(file, root);
        for diagnostic in list {
            print_diagnostic(diagnostic, &path, &lines, writer, max_line_width);
        }
    }

    print_summary(diagnostics, writer);
}

/// Print a success message when no problems are found.
pub fn print_success(code_files: usize, catalog_files: usize) {
    print_success_to(code_files, catalog_files, &mut io::stdout().lock());
}

/// Print a success message to a custom writer.
pub fn print_success_to<W: Write>(code_files: usize, catalog_files: usize, writer: &mut W) {
    let msg = format!(
        "Checked {} code {}, {} catalog {} - no problems found",
        code_files,
        plural(code_files, "file", "files"),
        catalog_files,
        plural(catalog_files, "file", "files"),
    );
    let _ = writeln!(writer, "{} {}", SUCCESS_MARK.green(), msg.green());
}

/// Print the edits of a rename.
pub fn print_rename(old: &str, new: &str, edits: &EditSet, root: &Path, applied: bool) {
    print_rename_to(old, new, edits, root, applied, &mut io::stdout().lock());
}

pub fn print_rename_to<W: Write>(
    old: &str,
    new: &str,
    edits: &EditSet,
    root: &Path,
    applied: bool,
    writer: &mut W,
) {
    if edits.is_empty() {
        let _ = writeln!(writer, "No locations of '{}' found.", old);
        return;
    }

    if !applied {
        for (file, file_edits) in edits.files() {
            let path = display_path(file, root);
            for edit in file_edits {
                let _ = writeln!(
                    writer,
                    "  {} {}:{}:{}",
                    "-->".blue(),
                    path,
                    edit.range.start.line + 1,
                    edit.range.start.column + 1
                );
                let _ = writeln!(writer, "      {} {}", "+".green(), edit.new_text);
            }
        }
        let _ = writeln!(writer);
        let _ = writeln!(
            writer,
            "{} '{}' to '{}': {} location(s) in {} file(s).",
            "Would rename".yellow().bold(),
            old,
            new,
            edits.len(),
            edits.file_count()
        );
        let _ = writeln!(writer, "Run with {} to write these edits.", "--apply".cyan());
    } else {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!(
                "Renamed '{}' to '{}': {} location(s) in {} file(s).",
                old,
                new,
                edits.len(),
                edits.file_count()
            )
            .green()
        );
    }
}

/// Print the result of `init`.
pub fn print_init_to<W: Write>(writer: &mut W) {
    let _ = writeln!(
        writer,
        "{} {}",
        SUCCESS_MARK.green(),
        format!("Created {}", CONFIG_FILE_NAME).green()
    );
}

// ============================================================
// Internal Functions
// ============================================================

fn print_diagnostic<W: Write>(
    diagnostic: &Diagnostic,
    path: &str,
    lines: &[&str],
    writer: &mut W,
    max_line_width: usize,
) {
    let line = diagnostic.range.start.line + 1;
    let col = diagnostic.range.start.column + 1;

    let _ = writeln!(
        writer,
        "{}: \"{}\"  {}",
        severity_label(diagnostic.severity),
        diagnostic.message,
        diagnostic.rule.to_string().dimmed().cyan()
    );
    let _ = writeln!(writer, "  {} {}:{}:{}", "-->".blue(), path, line, col);

    if let Some(source_line) = lines.get(diagnostic.range.start.line) {
        let (padding, width) = caret_span(source_line, &diagnostic.range);
        let carets = caret(diagnostic.severity, &"^".repeat(width));

        let _ = writeln!(writer, "{:>width$} {}", "", "|".blue(), width = max_line_width);
        let _ = writeln!(
            writer,
            "{:>width$} {} {}",
            line.to_string().blue(),
            "|".blue(),
            source_line,
            width = max_line_width
        );
        let _ = writeln!(
            writer,
            "{:>width$} {} {:>padding$}{}",
            "",
            "|".blue(),
            "",
            carets,
            width = max_line_width,
            padding = padding
        );
    }

    let _ = writeln!(writer); // Empty line between diagnostics
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "error".bold().red(),
        Severity::Warning => "warning".bold().yellow(),
        Severity::Information => "info".bold().blue(),
        Severity::Hint => "hint".bold().cyan(),
    }
}

fn caret(severity: Severity, s: &str) -> ColoredString {
    match severity {
        Severity::Error => s.red(),
        Severity::Warning => s.yellow(),
        Severity::Information => s.blue(),
        Severity::Hint => s.cyan(),
    }
}

/// Display-width padding before the range and display width of the range on
/// its first line. Columns are UTF-16 code units.
fn caret_span(source_line: &str, range: &Range) -> (usize, usize) {
    let start = byte_at_utf16(source_line, range.start.column);
    let end = if range.end.line == range.start.line {
        byte_at_utf16(source_line, range.end.column).max(start)
    } else {
        source_line.len()
    };
    let padding = UnicodeWidthStr::width(&source_line[..start]);
    let width = UnicodeWidthStr::width(&source_line[start..end]).max(1);
    (padding, width)
}

fn byte_at_utf16(line: &str, column: usize) -> usize {
    let mut units = 0;
    for (offset, c) in line.char_indices() {
        if units >= column {
            return offset;
        }
        units += c.len_utf16();
    }
    line.len()
}

fn print_summary<W: Write>(diagnostics: &FileDiagnostics, writer: &mut W) {
    let total_errors = count_severity(diagnostics, Severity::Error);
    let total_warnings = count_severity(diagnostics, Severity::Warning);
    let total_infos = count_severity(diagnostics, Severity::Information)
        + count_severity(diagnostics, Severity::Hint);
    let total_problems = total_errors + total_warnings;

    if total_problems > 0 {
        let _ = writeln!(
            writer,
            "{} {} problems ({} {}, {} {})",
            FAILURE_MARK.red(),
            total_problems,
            total_errors,
            plural(total_errors, "error", "errors").red(),
            total_warnings,
            plural(total_warnings, "warning", "warnings").yellow()
        );
    }
    if total_infos > 0 {
        let _ = writeln!(
            writer,
            "{} {}",
            total_infos,
            plural(total_infos, "note", "notes").blue()
        );
    }
}

fn calculate_max_line_width(diagnostics: &FileDiagnostics) -> usize {
    diagnostics
        .values()
        .flatten()
        .map(|d| d.range.start.line + 1)
        .max()
        .map(|n| n.to_string().len())
        .unwrap_or(1)
}

fn display_path(file: &str, root: &Path) -> String {
    match Path::new(file).strip_prefix(root) {
        Ok(relative) => format!("./{}", relative.display()),
        Err(_) => file.to_string(),
    }
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

/// Diagnostics per severity, for callers deciding exit status.
pub fn severity_counts(diagnostics: &FileDiagnostics) -> BTreeMap<Severity, usize> {
    let mut counts = BTreeMap::new();
    for diagnostic in diagnostics.values().flatten() {
        *counts.entry(diagnostic.severity).or_insert(0) += 1;
    }
    counts
}

// ============================================================
// Tests
// ============================================================
