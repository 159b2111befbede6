//! Report formatting and printing.
//!
//! Findings print in a cargo-style `severity: message` format, followed by
//! a one-line summary. Separate from the engine so keysync stays usable as
//! a library.

use std::io::{self, Write};

use colored::Colorize;

use super::run::{InitSummary, KeysReport, LintReport, RunResult};
use crate::core::sync::SyncSummary;

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Maximum number of call sites to display per key.
const MAX_SITES_DISPLAY: usize = 3;

pub fn print(result: &RunResult, verbose: bool) {
    print_to(result, verbose, &mut io::stdout().lock());
}

/// Print to a custom writer. Useful for testing or redirecting output.
pub fn print_to<W: Write>(result: &RunResult, verbose: bool, writer: &mut W) {
    // Writer failures here mean stdout is gone; nothing sensible remains.
    let _ = match result {
        RunResult::Sync(summary) => print_sync(summary, verbose, writer),
        RunResult::Keys(report) => print_keys(report, verbose, writer),
        RunResult::Lint(report) => print_lint(report, writer),
        RunResult::Init(summary) => print_init(summary, writer),
    };
}

fn print_sync<W: Write>(summary: &SyncSummary, verbose: bool, writer: &mut W) -> io::Result<()> {
    for missing in &summary.missing_keys {
        let mut notes = Vec::new();
        if let Some(reason) = missing.reason {
            notes.push(format!("suspicious: {}", reason));
        }
        if let Some(fallback) = &missing.fallback_literal {
            notes.push(format!("fallback: {:?}", fallback));
        }
        let suffix = if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", "))
        };
        writeln!(
            writer,
            "{} missing key `{}`{}",
            "error:".bold().red(),
            missing.key,
            suffix
        )?;
    }

    for unused in &summary.unused_keys {
        writeln!(
            writer,
            "{} unused key `{}` [{}]",
            "warning:".bold().yellow(),
            unused.key,
            unused.locales.join(", ")
        )?;
    }

    for issue in &summary.placeholder_issues {
        let mut parts = Vec::new();
        if !issue.diff.missing.is_empty() {
            parts.push(format!("missing {{{}}}", issue.diff.missing.join("}, {")));
        }
        if !issue.diff.extra.is_empty() {
            parts.push(format!("extra {{{}}}", issue.diff.extra.join("}, {")));
        }
        writeln!(
            writer,
            "{} placeholder mismatch for `{}` in {}: {}",
            "error:".bold().red(),
            issue.key,
            issue.locale,
            parts.join(", ")
        )?;
    }

    for violation in &summary.empty_value_violations {
        writeln!(
            writer,
            "{} empty value for `{}`",
            "warning:".bold().yellow(),
            violation.key
        )?;
    }

    for finding in &summary.suspicious_keys {
        writeln!(
            writer,
            "{} suspicious key `{}` ({}); try `{}`",
            "warning:".bold().yellow(),
            finding.key,
            finding.reason,
            finding.suggested_fix
        )?;
    }

    for warning in &summary.dynamic_key_warnings {
        writeln!(
            writer,
            "{} dynamic key at {}:{}:{} ({}): {}",
            "warning:".bold().yellow(),
            warning.file_path,
            warning.position.line,
            warning.position.column,
            warning.reason,
            warning.expression
        )?;
    }

    for stats in &summary.write_stats {
        if stats.added > 0 || stats.removed > 0 {
            writeln!(
                writer,
                "{}: +{} -{}",
                stats.locale.bold(),
                stats.added,
                stats.removed
            )?;
        }
    }

    if verbose {
        writeln!(
            writer,
            "{} files scanned, {} from cache, {} parsed",
            summary.files_scanned, summary.cache_hits, summary.files_parsed
        )?;
    }

    if summary.has_findings() || !summary.ok() {
        let mut counts = Vec::new();
        push_count(&mut counts, summary.missing_keys.len(), "missing");
        push_count(&mut counts, summary.unused_keys.len(), "unused");
        push_count(&mut counts, summary.placeholder_issues.len(), "placeholder");
        push_count(&mut counts, summary.empty_value_violations.len(), "empty");
        push_count(&mut counts, summary.suspicious_keys.len(), "suspicious");
        push_count(&mut counts, summary.dynamic_key_warnings.len(), "dynamic");
        writeln!(
            writer,
            "{} {}",
            FAILURE_MARK.red(),
            format!("out of sync: {}", counts.join(", ")).bold()
        )?;
    } else {
        writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!("locales in sync ({} files scanned)", summary.files_scanned).bold()
        )?;
    }

    Ok(())
}

fn push_count(counts: &mut Vec<String>, count: usize, label: &str) {
    if count > 0 {
        counts.push(format!("{} {}", count, label));
    }
}

fn print_keys<W: Write>(report: &KeysReport, verbose: bool, writer: &mut W) -> io::Result<()> {
    for (key, references) in &report.index.references_by_key {
        writeln!(writer, "{} ({})", key.bold(), references.len())?;
        for reference in references.iter().take(MAX_SITES_DISPLAY) {
            writeln!(
                writer,
                "  {}:{}:{}",
                reference.file_path, reference.position.line, reference.position.column
            )?;
        }
        if references.len() > MAX_SITES_DISPLAY {
            writeln!(writer, "  ... and {} more", references.len() - MAX_SITES_DISPLAY)?;
        }
    }

    for warning in &report.index.dynamic_key_warnings {
        writeln!(
            writer,
            "{} dynamic key at {}:{}:{} ({}): {}",
            "warning:".bold().yellow(),
            warning.file_path,
            warning.position.line,
            warning.position.column,
            warning.reason,
            warning.expression
        )?;
    }

    if verbose {
        writeln!(
            writer,
            "{} files scanned, {} from cache",
            report.files_scanned, report.cache_hits
        )?;
    }

    writeln!(
        writer,
        "{} keys, {} call sites",
        report.index.references_by_key.len(),
        report.index.reference_count()
    )?;

    Ok(())
}

fn print_lint<W: Write>(report: &LintReport, writer: &mut W) -> io::Result<()> {
    for finding in &report.findings {
        writeln!(
            writer,
            "{} suspicious key `{}` ({}); try `{}`",
            "warning:".bold().yellow(),
            finding.key,
            finding.reason,
            finding.suggested_fix
        )?;
    }

    if report.findings.is_empty() {
        writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!("{} keys checked, none suspicious", report.keys_checked).bold()
        )?;
    } else {
        writeln!(
            writer,
            "{} {}",
            FAILURE_MARK.red(),
            format!(
                "{} of {} keys suspicious",
                report.findings.len(),
                report.keys_checked
            )
            .bold()
        )?;
    }

    Ok(())
}

fn print_init<W: Write>(summary: &InitSummary, writer: &mut W) -> io::Result<()> {
    writeln!(
        writer,
        "{} Created {}",
        SUCCESS_MARK.green(),
        summary.path.display()
    )
}
