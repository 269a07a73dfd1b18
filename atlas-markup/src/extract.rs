//! Sub-field extraction
//!
//! Three callout kinds carry labeled components inside their raw text:
//! insight notes (core statement plus up to three labeled sections), premium
//! quotes (quote lines plus an attribution line), and author spotlights
//! (name plus bio). Extraction is lenient text surgery over the collected
//! lines; it never fails, it just leaves fields empty.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{SpecialKind, StructuredFields};

// Labels may be wrapped in emphasis markers and take an optional colon on
// either side of the closing markers: "**Key Distinction:**",
// "**Key Distinction**:", "_key distinction_", "KEY DISTINCTION:".
static NOTE_LABELS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[*_]{0,3}(key\s+distinction|practical\s+implication|go\s+deeper)\s*:?\s*[*_]{0,3}\s*:?\s*",
    )
    .unwrap()
});

/// Pull labeled fields out of a structured callout's collected lines.
/// Returns `None` for kinds that have no structured form.
pub fn structured_fields(kind: SpecialKind, raw_lines: &[String]) -> Option<StructuredFields> {
    match kind {
        SpecialKind::InsightNote => Some(insight_note_fields(raw_lines)),
        SpecialKind::PremiumQuote => Some(premium_quote_fields(raw_lines)),
        SpecialKind::AuthorSpotlight => Some(author_spotlight_fields(raw_lines)),
        _ => None,
    }
}

fn insight_note_fields(raw_lines: &[String]) -> StructuredFields {
    let text = raw_lines.join("\n");
    let mut core = text.as_str();
    let mut key_distinction = None;
    let mut practical_implication = None;
    let mut go_deeper = None;

    let matches: Vec<_> = NOTE_LABELS.captures_iter(&text).collect();
    if let Some(first) = matches.first() {
        if let Some(whole) = first.get(0) {
            core = &text[..whole.start()];
        }
    }
    for (index, captures) in matches.iter().enumerate() {
        let (Some(whole), Some(label)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let value_end = matches
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map(|next| next.start())
            .unwrap_or(text.len());
        let value = text[whole.end()..value_end].trim();
        if value.is_empty() {
            continue;
        }
        match normalize_label(label.as_str()).as_str() {
            "key distinction" => key_distinction = Some(value.to_string()),
            "practical implication" => practical_implication = Some(value.to_string()),
            "go deeper" => go_deeper = Some(value.to_string()),
            _ => {}
        }
    }

    StructuredFields::InsightNote {
        core: core.trim().to_string(),
        key_distinction,
        practical_implication,
        go_deeper,
    }
}

fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn premium_quote_fields(raw_lines: &[String]) -> StructuredFields {
    let non_empty: Vec<&str> = raw_lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();

    let attribution_line = non_empty
        .last()
        .filter(|line| line.starts_with(['\u{2014}', '\u{2013}', '-']))
        .copied();

    let quote_lines: Vec<String> = match attribution_line {
        Some(_) => non_empty[..non_empty.len() - 1]
            .iter()
            .map(|line| line.to_string())
            .collect(),
        None => non_empty.iter().map(|line| line.to_string()).collect(),
    };

    let (attribution, source) = match attribution_line {
        Some(line) => split_attribution(line),
        None => (None, None),
    };

    StructuredFields::PremiumQuote {
        quote_lines,
        attribution,
        source,
    }
}

/// `"— Maya Angelou (Caged Bird)"` -> attribution "Maya Angelou", source
/// "Caged Bird". A comma also splits: `"- Angelou, 1969"` -> "Angelou" /
/// "1969". Parentheses win over the comma.
fn split_attribution(line: &str) -> (Option<String>, Option<String>) {
    let stripped = line
        .trim_start_matches(['\u{2014}', '\u{2013}', '-', ' '])
        .trim();
    if stripped.is_empty() {
        return (None, None);
    }

    if let (Some(open), Some(close)) = (stripped.find('('), stripped.rfind(')')) {
        if open < close {
            let source = stripped[open + 1..close].trim();
            let mut name = stripped[..open].trim().to_string();
            let tail = stripped[close + 1..].trim();
            if !tail.is_empty() {
                if !name.is_empty() {
                    name.push(' ');
                }
                name.push_str(tail);
            }
            return (
                non_empty_owned(&name),
                non_empty_owned(source),
            );
        }
    }

    match stripped.split_once(',') {
        Some((name, source)) => (non_empty_owned(name.trim()), non_empty_owned(source.trim())),
        None => (non_empty_owned(stripped), None),
    }
}

fn author_spotlight_fields(raw_lines: &[String]) -> StructuredFields {
    let mut non_empty = raw_lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty());
    let name = non_empty.next().map(|line| line.to_string());
    let bio = non_empty.collect::<Vec<_>>().join(" ");
    StructuredFields::AuthorSpotlight { name, bio }
}

fn non_empty_owned(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
