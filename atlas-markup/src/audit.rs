//! Document audit
//!
//! Scores a generated analysis against the structural bar the publishing
//! side expects: enough words, a title, sane heading steps, balanced callout
//! markers, the standard sections present, and rectangular tables. The audit
//! is advisory; a failing score never blocks an export.

use serde::Serialize;

use crate::ast::{Block, Document, SpecialKind};
use crate::parser::parse;
use crate::validate::validate;

/// Thresholds for the audit checks.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLimits {
    pub min_words: usize,
    pub max_words: usize,
    /// Fraction of checks that must pass, 0..=1.
    pub pass_threshold: f64,
}

impl Default for AuditLimits {
    fn default() -> Self {
        Self {
            min_words: 500,
            max_words: 50_000,
            pass_threshold: 0.95,
        }
    }
}

/// One named check with its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditCheck {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

/// Result of auditing one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub checks: Vec<AuditCheck>,
    /// Fraction of checks that passed.
    pub score: f64,
    pub passed: bool,
}

impl AuditReport {
    pub fn failed_checks(&self) -> impl Iterator<Item = &AuditCheck> {
        self.checks.iter().filter(|check| !check.passed)
    }
}

/// Sections every full analysis is expected to carry at least once.
const REQUIRED_SECTIONS: [SpecialKind; 5] = [
    SpecialKind::QuickGlance,
    SpecialKind::InsightNote,
    SpecialKind::ActionBox,
    SpecialKind::Takeaways,
    SpecialKind::Exercise,
];

/// Audit raw markup text against the given limits.
pub fn audit(text: &str, limits: &AuditLimits) -> AuditReport {
    let document = parse(text);
    let report = validate(text);

    let mut checks = Vec::new();

    let words = document.word_count();
    checks.push(AuditCheck {
        name: "word-count",
        passed: (limits.min_words..=limits.max_words).contains(&words),
        detail: format!(
            "{words} words (expected {}..={})",
            limits.min_words, limits.max_words
        ),
    });

    let has_title = document.heading_levels().iter().any(|&level| level == 1);
    checks.push(AuditCheck {
        name: "title-heading",
        passed: has_title,
        detail: if has_title {
            "level-1 heading present".to_string()
        } else {
            "no level-1 heading".to_string()
        },
    });

    let skip = first_heading_skip(&document);
    checks.push(AuditCheck {
        name: "heading-steps",
        passed: skip.is_none(),
        detail: match skip {
            Some((from, to)) => format!("level {from} jumps to level {to}"),
            None => "no level skips deeper than one".to_string(),
        },
    });

    checks.push(AuditCheck {
        name: "blocks-closed",
        passed: report.is_valid,
        detail: if report.is_valid {
            "all callout markers balanced".to_string()
        } else {
            format!("{} marker problem(s)", report.finding_count())
        },
    });

    let missing: Vec<&str> = REQUIRED_SECTIONS
        .iter()
        .filter(|&&kind| !document.contains_special(kind))
        .map(|kind| kind.slug())
        .collect();
    checks.push(AuditCheck {
        name: "required-sections",
        passed: missing.is_empty(),
        detail: if missing.is_empty() {
            "all standard sections present".to_string()
        } else {
            format!("missing: {}", missing.join(", "))
        },
    });

    let ragged = ragged_table_count(&document);
    checks.push(AuditCheck {
        name: "tables-rectangular",
        passed: ragged == 0,
        detail: if ragged == 0 {
            "all tables have uniform columns".to_string()
        } else {
            format!("{ragged} table(s) with uneven rows")
        },
    });

    let passed_count = checks.iter().filter(|check| check.passed).count();
    let score = if checks.is_empty() {
        1.0
    } else {
        passed_count as f64 / checks.len() as f64
    };
    AuditReport {
        passed: score + 1e-9 >= limits.pass_threshold,
        score,
        checks,
    }
}

/// First place the heading hierarchy deepens by more than one level, as
/// `(from, to)`.
fn first_heading_skip(document: &Document) -> Option<(u8, u8)> {
    let levels = document.heading_levels();
    let mut previous: Option<u8> = None;
    for level in levels {
        if let Some(prev) = previous {
            if level > prev + 1 {
                return Some((prev, level));
            }
        }
        previous = Some(level);
    }
    None
}

fn ragged_table_count(document: &Document) -> usize {
    document
        .blocks
        .iter()
        .filter(|block| match block {
            Block::Table { rows } => match rows.first() {
                Some(first) => rows.iter().any(|row| row.len() != first.len()),
                None => false,
            },
            _ => false,
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_limits() -> AuditLimits {
        AuditLimits {
            min_words: 1,
            max_words: 10_000,
            pass_threshold: 0.95,
        }
    }

    fn full_document() -> String {
        let mut text = String::from("# The Book\n\n## Ideas\n\n");
        for kind in [
            "QUICK_GLANCE",
            "INSIGHT_NOTE",
            "ACTION_BOX",
            "TAKEAWAYS",
            "EXERCISE",
        ] {
            text.push_str(&format!("[{kind}]\ncontent line\n[/{kind}]\n\n"));
        }
        text
    }

    #[test]
    fn complete_document_passes() {
        let report = audit(&full_document(), &tiny_limits());
        assert!(report.passed, "failed checks: {:?}", report.failed_checks().collect::<Vec<_>>());
        assert_eq!(report.score, 1.0);
    }

    #[test]
    fn missing_sections_are_named() {
        let report = audit("# Title\n\njust prose.\n", &tiny_limits());
        let sections = report
            .checks
            .iter()
            .find(|check| check.name == "required-sections")
            .expect("check exists");
        assert!(!sections.passed);
        assert!(sections.detail.contains("quick-glance"));
        assert!(sections.detail.contains("exercise"));
    }

    #[test]
    fn heading_skip_is_flagged() {
        let report = audit("# Title\n\n### Too Deep\n", &tiny_limits());
        let steps = report
            .checks
            .iter()
            .find(|check| check.name == "heading-steps")
            .expect("check exists");
        assert!(!steps.passed);
        assert!(steps.detail.contains("level 1 jumps to level 3"));
    }

    #[test]
    fn unbalanced_markers_fail_the_closure_check() {
        let mut text = full_document();
        text.push_str("[TAKEAWAYS]\nunfinished\n");
        let report = audit(&text, &tiny_limits());
        let closed = report
            .checks
            .iter()
            .find(|check| check.name == "blocks-closed")
            .expect("check exists");
        assert!(!closed.passed);
    }

    #[test]
    fn ragged_table_is_flagged() {
        let mut text = full_document();
        text.push_str("| a | b |\n| 1 |\n");
        let report = audit(&text, &tiny_limits());
        let tables = report
            .checks
            .iter()
            .find(|check| check.name == "tables-rectangular")
            .expect("check exists");
        assert!(!tables.passed);
    }

    #[test]
    fn word_count_bounds_apply() {
        let limits = AuditLimits {
            min_words: 100_000,
            ..tiny_limits()
        };
        let report = audit(&full_document(), &limits);
        let words = report
            .checks
            .iter()
            .find(|check| check.name == "word-count")
            .expect("check exists");
        assert!(!words.passed);
        assert!(!report.passed);
    }
}
