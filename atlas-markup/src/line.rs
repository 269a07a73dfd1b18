//! Line classification
//!
//! Classifies a single raw line into the category the block parser consumes.
//! Stateless: the same line always classifies the same way, regardless of
//! what surrounds it. State-dependent meaning (tag lines inside code fences,
//! content lines inside callouts) is the parser's business.
//!
//! Priority order, first match wins:
//! 1. blank line
//! 2. code-fence toggle
//! 3. callout open tag
//! 4. callout close tag
//! 5. horizontal rule
//! 6. table row
//! 7. blockquote line
//! 8. heading
//! 9. unordered list item
//! 10. ordered list item
//! 11. plain text
//!
//! (Blank is checked first for convenience; an all-whitespace line cannot
//! match any other form, so the order of the remaining checks is the one
//! that matters.)

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::SpecialKind;

static OPEN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([A-Z][A-Z0-9_]*)(?::\s*(.*?))?\]$").unwrap());

static CLOSE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[/([A-Z][A-Z0-9_]*)\]$").unwrap());

static ORDERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)\.\s?(.*)$").unwrap());

/// Classification of one raw input line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Blank,
    /// A ``` line. The parser toggles code-block state on it.
    CodeFence,
    /// `[NAME]` or `[NAME: title]` where NAME is in the callout allow-list.
    SpecialOpen {
        kind: SpecialKind,
        title: Option<String>,
    },
    /// `[/NAME]` for any NAME. Close tags match by stack position, so the
    /// name is carried only for diagnostics.
    SpecialClose { name: String },
    Rule,
    TableRow { cells: Vec<String> },
    Quote { text: String },
    Heading { level: u8, text: String },
    UnorderedItem { text: String },
    OrderedItem { text: String },
    Text,
}

/// Classify one raw line. Pure function, no side effects.
pub fn classify_line(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with("```") {
        return LineKind::CodeFence;
    }
    if let Some(open) = match_open_tag(trimmed) {
        return open;
    }
    if let Some(captures) = CLOSE_TAG.captures(trimmed) {
        return LineKind::SpecialClose {
            name: captures[1].to_string(),
        };
    }
    if is_rule(trimmed) {
        return LineKind::Rule;
    }
    if let Some(cells) = match_table_row(trimmed) {
        return LineKind::TableRow { cells };
    }
    if let Some(rest) = trimmed.strip_prefix('>') {
        return LineKind::Quote {
            text: rest.strip_prefix(' ').unwrap_or(rest).to_string(),
        };
    }
    if let Some((level, text)) = match_heading(trimmed) {
        return LineKind::Heading { level, text };
    }
    if let Some(text) = match_unordered_item(trimmed) {
        return LineKind::UnorderedItem { text };
    }
    if let Some(captures) = ORDERED_ITEM.captures(trimmed) {
        return LineKind::OrderedItem {
            text: captures[2].trim().to_string(),
        };
    }
    LineKind::Text
}

fn match_open_tag(trimmed: &str) -> Option<LineKind> {
    let captures = OPEN_TAG.captures(trimmed)?;
    let name = &captures[1];
    let kind = SpecialKind::from_tag(name)?;
    let title = match captures.get(2) {
        Some(payload) if !payload.as_str().trim().is_empty() => {
            Some(payload.as_str().trim().to_string())
        }
        _ => numbered_exercise_title(name),
    };
    Some(LineKind::SpecialOpen { kind, title })
}

// `[EXERCISE_2]` carries its number as the panel title.
fn numbered_exercise_title(name: &str) -> Option<String> {
    let number = name.strip_prefix("EXERCISE_")?;
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("Exercise {number}"))
}

fn is_rule(trimmed: &str) -> bool {
    if trimmed == "---" || trimmed == "***" || trimmed == "___" {
        return true;
    }
    // A run of wide dashes longer than half the line also reads as a rule.
    let total = trimmed.chars().count();
    let mut longest = 0usize;
    let mut current = 0usize;
    for ch in trimmed.chars() {
        if matches!(ch, '\u{2014}' | '\u{2013}' | '\u{2015}') {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest * 2 > total
}

fn match_table_row(trimmed: &str) -> Option<Vec<String>> {
    if trimmed.len() < 2 || !trimmed.starts_with('|') || !trimmed.ends_with('|') {
        return None;
    }
    let interior = &trimmed[1..trimmed.len() - 1];
    Some(
        interior
            .split('|')
            .map(|cell| cell.trim().to_string())
            .collect(),
    )
}

fn match_heading(trimmed: &str) -> Option<(u8, String)> {
    let level = trimmed.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = trimmed.get(level..)?;
    let text = rest.strip_prefix(' ')?;
    Some((level as u8, text.trim().to_string()))
}

fn match_unordered_item(trimmed: &str) -> Option<String> {
    // `-` and the bullet glyph mark an item with or without a trailing
    // space. A bare `*` needs the space so emphasis-opening lines stay text.
    if let Some(rest) = trimmed.strip_prefix("* ") {
        return Some(rest.trim().to_string());
    }
    for marker in ['-', '\u{2022}'] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            return Some(rest.trim().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::bare_hash("#", LineKind::Text)]
    #[case::deepest_heading("###### Deep", LineKind::Heading { level: 6, text: "Deep".into() })]
    #[case::lone_pipe("|", LineKind::Text)]
    #[case::bare_dash("-", LineKind::UnorderedItem { text: String::new() })]
    #[case::zero_ordinal("0. zero", LineKind::OrderedItem { text: "zero".into() })]
    #[case::indented_tag("   [TAKEAWAYS]", LineKind::SpecialOpen { kind: SpecialKind::Takeaways, title: None })]
    #[case::lowercase_tag("[takeaways]", LineKind::Text)]
    #[case::fence_with_trailing_text("``` plus trailing words", LineKind::CodeFence)]
    fn classifier_edge_spellings(#[case] line: &str, #[case] expected: LineKind) {
        assert_eq!(classify_line(line), expected);
    }

    #[test]
    fn blank_and_whitespace_lines() {
        assert_eq!(classify_line(""), LineKind::Blank);
        assert_eq!(classify_line("   \t "), LineKind::Blank);
    }

    #[test]
    fn code_fence_with_language() {
        assert_eq!(classify_line("```"), LineKind::CodeFence);
        assert_eq!(classify_line("```swift"), LineKind::CodeFence);
    }

    #[test]
    fn open_tags_match_the_allow_list() {
        assert_eq!(
            classify_line("[QUICK_GLANCE]"),
            LineKind::SpecialOpen {
                kind: SpecialKind::QuickGlance,
                title: None,
            }
        );
        assert_eq!(
            classify_line("[ACTION_BOX: Try This Today]"),
            LineKind::SpecialOpen {
                kind: SpecialKind::ActionBox,
                title: Some("Try This Today".into()),
            }
        );
        assert_eq!(
            classify_line("  [EXERCISE_2]  "),
            LineKind::SpecialOpen {
                kind: SpecialKind::Exercise,
                title: Some("Exercise 2".into()),
            }
        );
    }

    #[test]
    fn unknown_bracketed_tags_are_text() {
        assert_eq!(classify_line("[SIDEBAR]"), LineKind::Text);
        assert_eq!(classify_line("[see chapter 4]"), LineKind::Text);
        assert_eq!(classify_line("[QUICK_GLANCE] trailing"), LineKind::Text);
    }

    #[test]
    fn close_tags_accept_any_name() {
        assert_eq!(
            classify_line("[/QUICK_GLANCE]"),
            LineKind::SpecialClose {
                name: "QUICK_GLANCE".into(),
            }
        );
        assert_eq!(
            classify_line("[/WHATEVER]"),
            LineKind::SpecialClose {
                name: "WHATEVER".into(),
            }
        );
    }

    #[test]
    fn rules_in_all_spellings() {
        assert_eq!(classify_line("---"), LineKind::Rule);
        assert_eq!(classify_line("***"), LineKind::Rule);
        assert_eq!(classify_line("___"), LineKind::Rule);
        assert_eq!(classify_line("\u{2014}\u{2014}\u{2014}\u{2014}"), LineKind::Rule);
    }

    #[test]
    fn short_dash_runs_are_not_rules() {
        // Half of the line or less in wide dashes stays text.
        assert_eq!(classify_line("a \u{2014} b \u{2014} c"), LineKind::Text);
    }

    #[test]
    fn table_rows_split_into_trimmed_cells() {
        assert_eq!(
            classify_line("| Framework | Year |"),
            LineKind::TableRow {
                cells: vec!["Framework".into(), "Year".into()],
            }
        );
        assert_eq!(
            classify_line("|a|b|c|"),
            LineKind::TableRow {
                cells: vec!["a".into(), "b".into(), "c".into()],
            }
        );
        assert_eq!(classify_line("| no trailing pipe"), LineKind::Text);
    }

    #[test]
    fn blockquote_strips_one_marker_space() {
        assert_eq!(
            classify_line("> quoted words"),
            LineKind::Quote {
                text: "quoted words".into(),
            }
        );
        assert_eq!(
            classify_line(">tight"),
            LineKind::Quote {
                text: "tight".into(),
            }
        );
    }

    #[test]
    fn headings_need_a_space_and_six_levels_max() {
        assert_eq!(
            classify_line("## Part Two"),
            LineKind::Heading {
                level: 2,
                text: "Part Two".into(),
            }
        );
        assert_eq!(classify_line("#NoSpace"), LineKind::Text);
        assert_eq!(classify_line("####### Too deep"), LineKind::Text);
    }

    #[test]
    fn list_items_with_and_without_marker_space() {
        assert_eq!(
            classify_line("- first"),
            LineKind::UnorderedItem {
                text: "first".into(),
            }
        );
        assert_eq!(
            classify_line("-tight"),
            LineKind::UnorderedItem {
                text: "tight".into(),
            }
        );
        assert_eq!(
            classify_line("\u{2022} glyph"),
            LineKind::UnorderedItem {
                text: "glyph".into(),
            }
        );
        assert_eq!(
            classify_line("* starred"),
            LineKind::UnorderedItem {
                text: "starred".into(),
            }
        );
        assert_eq!(
            classify_line("3. third"),
            LineKind::OrderedItem {
                text: "third".into(),
            }
        );
        assert_eq!(
            classify_line("12.tight"),
            LineKind::OrderedItem {
                text: "tight".into(),
            }
        );
    }

    #[test]
    fn bold_open_is_not_a_list_item() {
        assert_eq!(classify_line("**Bold lead.** Sentence."), LineKind::Text);
        assert_eq!(classify_line("*emphasis only*"), LineKind::Text);
    }

    #[test]
    fn plain_prose_is_text() {
        assert_eq!(classify_line("An ordinary sentence."), LineKind::Text);
    }
}
