//! Inline formatting
//!
//! Scans a text span left to right and produces flat [`InlineRun`] values.
//! `**bold**` wins over `*italic*` and `_italic_`, code spans come after
//! emphasis, `[label](target)` becomes a link. All markers are non-greedy;
//! an unterminated marker is ordinary text, exactly as typed.
//!
//! Escaping is not done here: runs carry raw text and each renderer escapes
//! for its own surface. The one shared policy is [`safe_link_target`], which
//! strips script-capable link schemes for every target.

use crate::ast::InlineRun;

/// Convert one text span into an ordered run sequence.
pub fn parse_inline(text: &str) -> Vec<InlineRun> {
    let mut runs = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = find_nonempty(after, "**") {
                flush_literal(&mut runs, &mut literal);
                runs.push(InlineRun::Bold(after[..end].to_string()));
                rest = &after[end + 2..];
                continue;
            }
            literal.push_str("**");
            rest = after;
            continue;
        }
        if let Some(run) = single_marker(&mut rest, &mut runs, &mut literal, '*') {
            runs.push(run);
            continue;
        }
        if let Some(run) = single_marker(&mut rest, &mut runs, &mut literal, '_') {
            runs.push(run);
            continue;
        }
        if let Some(run) = single_marker(&mut rest, &mut runs, &mut literal, '`') {
            runs.push(run);
            continue;
        }
        if rest.starts_with('[') {
            if let Some((link, consumed)) = match_link(rest) {
                flush_literal(&mut runs, &mut literal);
                runs.push(link);
                rest = &rest[consumed..];
                continue;
            }
        }
        // No marker matched: take one character as literal text.
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            literal.push(ch);
            rest = chars.as_str();
        }
    }

    flush_literal(&mut runs, &mut literal);
    runs
}

/// Try to take a `<marker>...<marker>` span off the front of `rest`. On a
/// match the literal buffer is flushed and `rest` is advanced; when the
/// closing marker is missing the caller falls through to literal handling.
fn single_marker(
    rest: &mut &str,
    runs: &mut Vec<InlineRun>,
    literal: &mut String,
    marker: char,
) -> Option<InlineRun> {
    let after = rest.strip_prefix(marker)?;
    let end = find_nonempty(after, marker.encode_utf8(&mut [0u8; 4]))?;
    flush_literal(runs, literal);
    let content = after[..end].to_string();
    *rest = &after[end + marker.len_utf8()..];
    Some(match marker {
        '`' => InlineRun::Code(content),
        _ => InlineRun::Italic(content),
    })
}

/// First occurrence of `pattern` at a non-zero offset, so empty spans like
/// `****` fall through to literal text.
fn find_nonempty(haystack: &str, pattern: &str) -> Option<usize> {
    match haystack.find(pattern) {
        Some(0) => None,
        found => found,
    }
}

/// `[label](target)` at the start of `rest`; returns the run and the number
/// of bytes consumed.
fn match_link(rest: &str) -> Option<(InlineRun, usize)> {
    let after_open = rest.strip_prefix('[')?;
    let label_end = after_open.find("](")?;
    let after_label = &after_open[label_end + 2..];
    let target_end = after_label.find(')')?;
    let label = after_open[..label_end].to_string();
    let target = after_label[..target_end].to_string();
    // 1 for '[', 2 for '](', 1 for ')'
    let consumed = 1 + label_end + 2 + target_end + 1;
    Some((InlineRun::Link { label, target }, consumed))
}

fn flush_literal(runs: &mut Vec<InlineRun>, literal: &mut String) {
    if !literal.is_empty() {
        runs.push(InlineRun::Text(std::mem::take(literal)));
    }
}

/// Link targets allowed to reach an output surface: web, mail, and
/// same-document anchors. Anything else (`javascript:`, `data:`, `file:`,
/// scheme-relative) is replaced with an inert anchor.
pub fn safe_link_target(target: &str) -> &str {
    let candidate = target.trim();
    let lowered = candidate.to_ascii_lowercase();
    let allowed = lowered.starts_with("http://")
        || lowered.starts_with("https://")
        || lowered.starts_with("mailto:")
        || lowered.starts_with('#');
    if allowed {
        candidate
    } else {
        "#"
    }
}
