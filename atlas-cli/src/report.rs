//! Human-readable console output for the diagnostic commands.
//!
//! Validation findings are shown with two lines of surrounding source and a
//! `>>` marker on the offending line, so an unclosed tag can be found in the
//! editor without counting lines. The audit table aligns check names and
//! ends with a score-against-threshold verdict.

use std::fmt::Write;

use atlas_markup::{AuditLimits, AuditReport, ValidationReport};

/// Render every validation finding with its source context.
pub fn validation_findings(source: &str, report: &ValidationReport) -> String {
    if report.is_valid {
        return "No marker problems found.\n".to_string();
    }

    let mut out = String::new();
    for block in &report.unclosed_blocks {
        let _ = writeln!(
            out,
            "Unclosed [{}] opened on line {}:",
            block.kind.tag(),
            block.line_number
        );
        out.push_str(&source_context(source, block.line_number));
        out.push('\n');
    }
    for marker in &report.unmatched_close_markers {
        let _ = writeln!(
            out,
            "Close marker without an open block on line {}:",
            marker.line_number
        );
        out.push_str(&source_context(source, marker.line_number));
        out.push('\n');
    }
    let _ = writeln!(out, "{} marker problem(s) found.", report.finding_count());
    out
}

/// Show `line_number` (1-based) with up to two lines of context either side.
fn source_context(source: &str, line_number: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let error_index = line_number.saturating_sub(1);

    let start = error_index.saturating_sub(2);
    let end = (error_index + 3).min(lines.len());

    let mut context = String::new();
    for index in start..end {
        let marker = if index == error_index { ">>" } else { "  " };
        let _ = writeln!(context, "{} {:3} | {}", marker, index + 1, lines[index]);
    }
    context
}

/// Render an audit report as an aligned pass/fail table with a verdict line.
pub fn audit_table(report: &AuditReport, limits: &AuditLimits) -> String {
    let width = report
        .checks
        .iter()
        .map(|check| check.name.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for check in &report.checks {
        let status = if check.passed { "ok  " } else { "FAIL" };
        let _ = writeln!(out, "{} {:width$}  {}", status, check.name, check.detail);
    }

    let passed_count = report.checks.iter().filter(|check| check.passed).count();
    let verdict = if report.passed { "PASSED" } else { "FAILED" };
    let _ = writeln!(
        out,
        "\nScore: {}/{} ({:.2}) - {} (threshold {:.2})",
        passed_count,
        report.checks.len(),
        report.score,
        verdict,
        limits.pass_threshold
    );
    out
}
