//! Marker validation
//!
//! Re-scans raw lines, not the parsed document, and reports unbalanced
//! callout markers before an export runs. The scan must agree with the block
//! parser's tag detection exactly, including the two places where tags stop
//! being tags: inside a code fence everything is invisible, and fences
//! inside an open callout are ordinary content.

use serde::Serialize;

use crate::ast::SpecialKind;
use crate::line::{classify_line, LineKind};

/// A callout left open at end of input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnclosedBlock {
    pub kind: SpecialKind,
    /// 1-based line of the open tag.
    pub line_number: usize,
}

/// A close tag with nothing on the stack to close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedClose {
    /// 1-based line of the close tag.
    pub line_number: usize,
    pub raw_text: String,
}

/// Outcome of a validation scan. Purely diagnostic; parsing proceeds no
/// matter what this says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub unclosed_blocks: Vec<UnclosedBlock>,
    pub unmatched_close_markers: Vec<UnmatchedClose>,
}

impl ValidationReport {
    pub fn finding_count(&self) -> usize {
        self.unclosed_blocks.len() + self.unmatched_close_markers.len()
    }

    /// 1-based line numbers of all findings, in report order.
    pub fn finding_lines(&self) -> Vec<usize> {
        let mut lines: Vec<usize> = self
            .unclosed_blocks
            .iter()
            .map(|block| block.line_number)
            .chain(
                self.unmatched_close_markers
                    .iter()
                    .map(|marker| marker.line_number),
            )
            .collect();
        lines.sort_unstable();
        lines
    }
}

/// Scan raw text for unbalanced callout markers.
pub fn validate(text: &str) -> ValidationReport {
    let mut open: Vec<UnclosedBlock> = Vec::new();
    let mut unmatched: Vec<UnmatchedClose> = Vec::new();
    let mut in_code = false;

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        if in_code {
            if matches!(classify_line(line), LineKind::CodeFence) {
                in_code = false;
            }
            continue;
        }
        match classify_line(line) {
            LineKind::CodeFence if open.is_empty() => in_code = true,
            LineKind::SpecialOpen { kind, .. } => open.push(UnclosedBlock { kind, line_number }),
            LineKind::SpecialClose { .. } => {
                if open.pop().is_none() {
                    unmatched.push(UnmatchedClose {
                        line_number,
                        raw_text: line.trim().to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    ValidationReport {
        is_valid: open.is_empty() && unmatched.is_empty(),
        unclosed_blocks: open,
        unmatched_close_markers: unmatched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_with_trace;

    #[test]
    fn balanced_document_is_valid() {
        let report = validate("# Title\n\n[TAKEAWAYS]\n- a point\n[/TAKEAWAYS]\n");
        assert!(report.is_valid);
        assert_eq!(report.finding_count(), 0);
    }

    #[test]
    fn unclosed_block_is_reported_with_its_open_line() {
        let report = validate("intro\n\n[TAKEAWAYS]\n- a point\n");
        assert!(!report.is_valid);
        assert_eq!(
            report.unclosed_blocks,
            vec![UnclosedBlock {
                kind: SpecialKind::Takeaways,
                line_number: 3,
            }]
        );
    }

    #[test]
    fn unmatched_close_is_reported_with_raw_text() {
        let report = validate("text\n[/QUOTE]\n");
        assert_eq!(
            report.unmatched_close_markers,
            vec![UnmatchedClose {
                line_number: 2,
                raw_text: "[/QUOTE]".into(),
            }]
        );
    }

    #[test]
    fn tags_inside_code_fences_are_invisible() {
        let report = validate("```\n[TAKEAWAYS]\n```\n");
        assert!(report.is_valid);
    }

    #[test]
    fn fence_inside_callout_does_not_hide_the_close() {
        let report = validate("[EXERCISE]\n```\nsteps\n```\n[/EXERCISE]\n");
        assert!(report.is_valid);
    }

    #[test]
    fn nested_opens_need_two_closes() {
        let report = validate("[QUICK_GLANCE]\n[TAKEAWAYS]\n[/X]\n");
        assert_eq!(report.unclosed_blocks.len(), 1);
        assert_eq!(report.unclosed_blocks[0].kind, SpecialKind::QuickGlance);
    }

    #[test]
    fn agreement_with_parser_on_tricky_inputs() {
        let samples = [
            "",
            "plain text only\n",
            "[TAKEAWAYS]\nno close\n",
            "[/STRAY]\n",
            "```\n[TAKEAWAYS]\n```\n",
            "[EXERCISE]\n```\n[/EXERCISE]\n",
            "[QUICK_GLANCE]\n[TAKEAWAYS]\n[/A]\n[/B]\n",
            "[QUICK_GLANCE]\n[TAKEAWAYS]\n[/A]\n",
            "text\n[/ONE]\n[/TWO]\ntext\n",
        ];
        for sample in samples {
            let report = validate(sample);
            let (_, trace) = parse_with_trace(sample);
            assert_eq!(
                report.is_valid,
                trace.is_balanced(),
                "validator and parser disagree on {sample:?}"
            );
            assert_eq!(
                report.unclosed_blocks.len(),
                trace.synthetic_flushes.len(),
                "unclosed counts differ on {sample:?}"
            );
            assert_eq!(
                report.unmatched_close_markers.len(),
                trace.unmatched_closes.len(),
                "unmatched counts differ on {sample:?}"
            );
        }
    }

    #[test]
    fn report_serializes_for_machine_output() {
        let report = validate("[TAKEAWAYS]\n");
        let json = serde_json::to_string(&report).expect("report serializes");
        assert!(json.contains("\"is_valid\":false"));
        assert!(json.contains("\"takeaways\""));
    }
}
