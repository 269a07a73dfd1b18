//! Hypertext target
//!
//! Produces one self-contained HTML document: stylesheet embedded, brand
//! palette exposed as CSS custom properties, optional branded header and
//! table of contents, and a styled panel for every callout kind. Escaping
//! happens on run content, never on assembled markup.

use std::fmt::Write;

use atlas_markup::line::{classify_line, LineKind};
use atlas_markup::parser::is_separator_row;
use atlas_markup::{
    parse_inline, safe_link_target, Block, Document, InlineRun, SpecialBlock, SpecialKind,
    StructuredFields,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::ExportResult;
use crate::media::sniff_image_mime;
use crate::options::RenderOptions;
use crate::target::{Artifact, RenderInput, RenderTarget};

const STYLESHEET: &str = include_str!("../../css/hypertext.css");

pub struct HypertextTarget;

impl RenderTarget for HypertextTarget {
    fn name(&self) -> &str {
        "html"
    }

    fn description(&self) -> &str {
        "Self-contained styled hypertext document"
    }

    fn extension(&self) -> &str {
        "html"
    }

    fn render(&self, input: &RenderInput<'_>, options: &RenderOptions) -> ExportResult<Artifact> {
        Ok(Artifact::Text(render_document(input.document, options)))
    }
}

fn render_document(document: &Document, options: &RenderOptions) -> String {
    let mut body = String::new();
    if options.include_cover_page {
        render_header(&mut body, document, options);
    }
    if options.include_toc {
        render_toc(&mut body, document);
    }
    body.push_str("<main class=\"analysis\">\n");
    for block in document.iter() {
        render_block(&mut body, block);
    }
    body.push_str("</main>\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<meta name="generator" content="atlas-export">
{meta}<title>{title}</title>
<style>
{css}
:root {{
  --gold: {gold};
  --burgundy: {burgundy};
  --coral: {coral};
}}
</style>
</head>
<body>
{body}</body>
</html>
"#,
        meta = meta_tags(options),
        title = escape_html(options.display_title()),
        css = STYLESHEET,
        gold = escape_html(&options.theme.gold),
        burgundy = escape_html(&options.theme.burgundy),
        coral = escape_html(&options.theme.coral),
        body = body,
    )
}

/// One `<meta>` tag per scalar metadata entry; compound values are skipped.
fn meta_tags(options: &RenderOptions) -> String {
    let mut out = String::new();
    for (key, value) in &options.metadata {
        if let Some(text) = value.as_plain_text() {
            let _ = writeln!(
                out,
                "<meta name=\"{}\" content=\"{}\">",
                escape_html(key),
                escape_html(&text)
            );
        }
    }
    out
}

fn render_header(out: &mut String, document: &Document, options: &RenderOptions) {
    out.push_str("<header class=\"header\">\n");
    if let Some(uri) = options.logo.as_deref().and_then(logo_data_uri) {
        let _ = writeln!(out, "<img class=\"logo\" src=\"{}\" alt=\"\">", uri);
    }
    let _ = writeln!(
        out,
        "<div class=\"brand\">{}</div>",
        escape_html(&options.theme.brand_line)
    );
    let _ = writeln!(out, "<h1>{}</h1>", escape_html(options.display_title()));
    if let Some(author) = options.author.as_deref() {
        let _ = writeln!(out, "<div class=\"author\">by {}</div>", escape_html(author));
    }
    let minutes = options.reading_minutes(document.word_count());
    let _ = writeln!(
        out,
        "<span class=\"reading-time-badge\">{} min read</span>",
        minutes
    );
    out.push_str("</header>\n");
}

fn logo_data_uri(bytes: &[u8]) -> Option<String> {
    let mime = sniff_image_mime(bytes)?;
    Some(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

fn render_toc(out: &mut String, document: &Document) {
    let entries = document.toc_entries();
    if entries.is_empty() {
        return;
    }
    out.push_str("<nav class=\"toc\">\n<h2>Contents</h2>\n<ul>\n");
    for entry in entries {
        let _ = writeln!(
            out,
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>",
            entry.level,
            escape_html(&entry.anchor_id),
            escape_html(&entry.text)
        );
    }
    out.push_str("</ul>\n</nav>\n");
}

fn render_block(out: &mut String, block: &Block) {
    match block {
        Block::Heading {
            level,
            text,
            anchor_id,
        } => {
            let _ = writeln!(
                out,
                "<h{level} id=\"{}\">{}</h{level}>",
                escape_html(anchor_id),
                inline_html(text),
            );
        }
        Block::Paragraph { runs } => {
            let _ = writeln!(out, "<p>{}</p>", runs_html(runs));
        }
        Block::List { ordered, items } => {
            let tag = if *ordered { "ol" } else { "ul" };
            let _ = writeln!(out, "<{}>", tag);
            for item in items {
                let _ = writeln!(out, "<li>{}</li>", runs_html(item));
            }
            let _ = writeln!(out, "</{}>", tag);
        }
        Block::Table { rows } => render_table(out, rows),
        Block::Blockquote { lines } => {
            out.push_str("<blockquote>\n");
            for line in lines {
                let _ = writeln!(out, "<p>{}</p>", inline_html(line));
            }
            out.push_str("</blockquote>\n");
        }
        Block::Rule => out.push_str("<hr>\n"),
        Block::Special(special) => render_special(out, special),
    }
}

fn render_table(out: &mut String, rows: &[Vec<String>]) {
    let Some((head, body)) = rows.split_first() else {
        return;
    };
    out.push_str("<table class=\"styled-table\">\n<thead>\n<tr>");
    for cell in head {
        let _ = write!(out, "<th>{}</th>", inline_html(cell));
    }
    out.push_str("</tr>\n</thead>\n");
    if !body.is_empty() {
        out.push_str("<tbody>\n");
        for row in body {
            out.push_str("<tr>");
            for cell in row {
                let _ = write!(out, "<td>{}</td>", inline_html(cell));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n");
    }
    out.push_str("</table>\n");
}

fn render_special(out: &mut String, special: &SpecialBlock) {
    match special.kind {
        SpecialKind::InsightNote => render_insight_note(out, special),
        SpecialKind::PremiumQuote => render_premium_quote(out, special),
        SpecialKind::AuthorSpotlight => render_author_spotlight(out, special),
        SpecialKind::VisualFlowchart => render_flowchart(out, special),
        SpecialKind::VisualTable => render_visual_table(out, special),
        SpecialKind::StructureMap => render_structure_map(out, special),
        SpecialKind::Quote => {
            out.push_str("<blockquote class=\"quote\">\n");
            for line in nonblank(&special.raw_lines) {
                let _ = writeln!(out, "<p>{}</p>", inline_html(line));
            }
            out.push_str("</blockquote>\n");
        }
        SpecialKind::PremiumDivider => {
            out.push_str("<div class=\"premium-divider\">\u{2726} \u{2726} \u{2726}</div>\n");
        }
        SpecialKind::PremiumH1 => render_premium_heading(out, special, 1),
        SpecialKind::PremiumH2 => render_premium_heading(out, special, 2),
        _ => render_generic_panel(out, special),
    }
}

/// Labeled panel used by every kind without a bespoke layout. Nothing is
/// ever dropped: an unstyled kind still shows its header and content.
fn render_generic_panel(out: &mut String, special: &SpecialBlock) {
    let _ = writeln!(out, "<section class=\"callout {}\">", special.kind.slug());
    let _ = writeln!(
        out,
        "<h4 class=\"callout-title\">{}</h4>",
        escape_html(special.header())
    );
    render_panel_lines(out, &special.raw_lines);
    out.push_str("</section>\n");
}

/// Content lines of a panel: bullet and numbered runs become lists, rows
/// become a table, anything else is a paragraph. Mirrors how the parser
/// would have read the lines had they appeared outside the callout.
fn render_panel_lines(out: &mut String, lines: &[String]) {
    let mut list: Option<(bool, Vec<String>)> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();

    fn flush_list(out: &mut String, list: &mut Option<(bool, Vec<String>)>) {
        if let Some((ordered, items)) = list.take() {
            let tag = if ordered { "ol" } else { "ul" };
            let _ = writeln!(out, "<{}>", tag);
            for item in items {
                let _ = writeln!(out, "<li>{}</li>", item);
            }
            let _ = writeln!(out, "</{}>", tag);
        }
    }

    fn flush_rows(out: &mut String, rows: &mut Vec<Vec<String>>) {
        if !rows.is_empty() {
            render_table(out, rows);
            rows.clear();
        }
    }

    for line in lines {
        match classify_line(line) {
            LineKind::Blank => {
                flush_list(out, &mut list);
                flush_rows(out, &mut rows);
            }
            LineKind::UnorderedItem { text } => {
                flush_rows(out, &mut rows);
                match &mut list {
                    Some((false, items)) => items.push(inline_html(&text)),
                    _ => {
                        flush_list(out, &mut list);
                        list = Some((false, vec![inline_html(&text)]));
                    }
                }
            }
            LineKind::OrderedItem { text } => {
                flush_rows(out, &mut rows);
                match &mut list {
                    Some((true, items)) => items.push(inline_html(&text)),
                    _ => {
                        flush_list(out, &mut list);
                        list = Some((true, vec![inline_html(&text)]));
                    }
                }
            }
            LineKind::TableRow { cells } => {
                flush_list(out, &mut list);
                if !is_separator_row(&cells) {
                    rows.push(cells);
                }
            }
            _ => {
                flush_list(out, &mut list);
                flush_rows(out, &mut rows);
                let _ = writeln!(out, "<p>{}</p>", inline_html(line.trim()));
            }
        }
    }
    flush_list(out, &mut list);
    flush_rows(out, &mut rows);
}

fn render_insight_note(out: &mut String, special: &SpecialBlock) {
    let Some(StructuredFields::InsightNote {
        core,
        key_distinction,
        practical_implication,
        go_deeper,
    }) = &special.fields
    else {
        render_generic_panel(out, special);
        return;
    };

    out.push_str("<section class=\"callout insight-note\">\n");
    let _ = writeln!(
        out,
        "<h4 class=\"callout-title\">{}</h4>",
        escape_html(special.header())
    );
    if !core.trim().is_empty() {
        let _ = writeln!(out, "<p class=\"note-core\">{}</p>", flowed_html(core));
    }
    for (label, value) in [
        ("Key Distinction", key_distinction),
        ("Practical Implication", practical_implication),
        ("Go Deeper", go_deeper),
    ] {
        if let Some(value) = value {
            out.push_str("<div class=\"note-field\">");
            let _ = write!(out, "<span class=\"note-label\">{}</span> ", label);
            let _ = write!(out, "<span>{}</span>", flowed_html(value));
            out.push_str("</div>\n");
        }
    }
    out.push_str("</section>\n");
}

fn render_premium_quote(out: &mut String, special: &SpecialBlock) {
    let Some(StructuredFields::PremiumQuote {
        quote_lines,
        attribution,
        source,
    }) = &special.fields
    else {
        render_generic_panel(out, special);
        return;
    };

    out.push_str("<figure class=\"premium-quote\">\n<blockquote>\n");
    for (index, line) in quote_lines.iter().enumerate() {
        if index > 0 {
            out.push_str("<br>\n");
        }
        out.push_str(&inline_html(line));
    }
    out.push_str("\n</blockquote>\n");
    if attribution.is_some() || source.is_some() {
        out.push_str("<figcaption>");
        if let Some(attribution) = attribution {
            let _ = write!(out, "\u{2014} {}", escape_html(attribution));
        }
        if let Some(source) = source {
            let _ = write!(out, " <cite>{}</cite>", escape_html(source));
        }
        out.push_str("</figcaption>\n");
    }
    out.push_str("</figure>\n");
}

fn render_author_spotlight(out: &mut String, special: &SpecialBlock) {
    let Some(StructuredFields::AuthorSpotlight { name, bio }) = &special.fields else {
        render_generic_panel(out, special);
        return;
    };

    out.push_str("<aside class=\"author-spotlight\">\n");
    let display = name.as_deref().unwrap_or_else(|| special.header());
    let _ = writeln!(out, "<h4>{}</h4>", inline_html(display));
    if !bio.is_empty() {
        let _ = writeln!(out, "<p>{}</p>", inline_html(bio));
    }
    out.push_str("</aside>\n");
}

fn render_flowchart(out: &mut String, special: &SpecialBlock) {
    out.push_str("<div class=\"visual-flowchart\">\n");
    if let Some(title) = special.title.as_deref() {
        let _ = writeln!(out, "<h4 class=\"callout-title\">{}</h4>", escape_html(title));
    }
    let steps = flow_steps(&special.raw_lines);
    for (index, step) in steps.iter().enumerate() {
        if index > 0 {
            out.push_str("<div class=\"flow-arrow\">\u{2193}</div>\n");
        }
        let _ = writeln!(out, "<div class=\"flow-step\">{}</div>", inline_html(step));
    }
    out.push_str("</div>\n");
}

/// Flowchart steps: lines split on inline arrows, arrow-only fragments
/// dropped (the arrow glyph between steps is the renderer's).
fn flow_steps(lines: &[String]) -> Vec<String> {
    let mut steps = Vec::new();
    for line in nonblank(lines) {
        let normalized = line.replace("\u{2192}", "->");
        for fragment in normalized.split("->") {
            let fragment = fragment.trim();
            if !fragment.is_empty() && !is_arrow_glyph(fragment) {
                steps.push(fragment.to_string());
            }
        }
    }
    steps
}

fn is_arrow_glyph(fragment: &str) -> bool {
    matches!(fragment, "\u{2193}" | "v" | "V" | "|" | "=>")
}

fn render_visual_table(out: &mut String, special: &SpecialBlock) {
    out.push_str("<div class=\"visual-table\">\n");
    if let Some(title) = special.title.as_deref() {
        let _ = writeln!(out, "<h4 class=\"callout-title\">{}</h4>", escape_html(title));
    }
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut stray: Vec<&String> = Vec::new();
    for line in nonblank(&special.raw_lines) {
        match classify_line(line) {
            LineKind::TableRow { cells } => {
                if !is_separator_row(&cells) {
                    rows.push(cells);
                }
            }
            _ => stray.push(line),
        }
    }
    render_table(out, &rows);
    for line in stray {
        let _ = writeln!(out, "<p>{}</p>", inline_html(line.trim()));
    }
    out.push_str("</div>\n");
}

fn render_structure_map(out: &mut String, special: &SpecialBlock) {
    out.push_str("<section class=\"callout structure-map\">\n");
    if let Some(title) = special.title.as_deref() {
        let _ = writeln!(out, "<h4 class=\"callout-title\">{}</h4>", escape_html(title));
    }
    // Indentation is the content here, so the lines go out verbatim.
    let tree = special.raw_lines.join("\n");
    let _ = writeln!(out, "<pre>{}</pre>", escape_html(tree.trim_end()));
    out.push_str("</section>\n");
}

fn render_premium_heading(out: &mut String, special: &SpecialBlock, level: u8) {
    let text = nonblank(&special.raw_lines)
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join(" ");
    let text = if text.is_empty() {
        special.title.clone().unwrap_or_default()
    } else {
        text
    };
    if text.is_empty() {
        return;
    }
    let _ = writeln!(
        out,
        "<h{level} class=\"premium-h{level}\">{}</h{level}>",
        inline_html(&text),
    );
}

fn nonblank(lines: &[String]) -> impl Iterator<Item = &String> {
    lines.iter().filter(|line| !line.trim().is_empty())
}

fn runs_html(runs: &[InlineRun]) -> String {
    let mut out = String::new();
    for run in runs {
        match run {
            InlineRun::Text(text) => out.push_str(&escape_html(text)),
            InlineRun::Bold(text) => {
                let _ = write!(out, "<strong>{}</strong>", escape_html(text));
            }
            InlineRun::Italic(text) => {
                let _ = write!(out, "<em>{}</em>", escape_html(text));
            }
            InlineRun::Code(text) => {
                let _ = write!(out, "<code>{}</code>", escape_html(text));
            }
            InlineRun::Link { label, target } => {
                let _ = write!(
                    out,
                    "<a href=\"{}\">{}</a>",
                    escape_html(safe_link_target(target)),
                    escape_html(label)
                );
            }
        }
    }
    out
}

fn inline_html(text: &str) -> String {
    runs_html(&parse_inline(text))
}

/// Inline rendering with internal newlines flowed into spaces, for field
/// values that span lines but read as one sentence.
fn flowed_html(text: &str) -> String {
    inline_html(&text.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
