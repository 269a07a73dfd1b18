//! Package target (word-processor document)
//!
//! Assembles the WordprocessingML parts (content types, package
//! relationships, styles, document, core properties) and zips them
//! with deflate into one container. Every special kind gets a named
//! paragraph style so the panels survive into the word processor; heading
//! paragraphs carry bookmarks under the same anchor ids the other targets
//! link to.
//!
//! The XML is assembled as text. The schema fixes element order inside
//! `pPr`/`rPr`/`tblPr`, so the writers below emit properties in schema
//! order even where a reader would not care.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write as _;

use atlas_markup::line::{classify_line, LineKind};
use atlas_markup::parser::is_separator_row;
use atlas_markup::{
    parse_inline, safe_link_target, Block, Document, InlineRun, SpecialBlock, SpecialKind,
    StructuredFields,
};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ExportError, ExportResult};
use crate::options::{RenderOptions, Theme};
use crate::target::{Artifact, RenderInput, RenderTarget};

pub struct PackageTarget;

impl RenderTarget for PackageTarget {
    fn name(&self) -> &str {
        "docx"
    }

    fn description(&self) -> &str {
        "Word-processor package"
    }

    fn extension(&self) -> &str {
        "docx"
    }

    fn is_binary(&self) -> bool {
        true
    }

    fn render(&self, input: &RenderInput<'_>, options: &RenderOptions) -> ExportResult<Artifact> {
        let bytes =
            build_package(input.document, options).map_err(|err| ExportError::PackagingFailed {
                reason: err.to_string(),
            })?;
        Ok(Artifact::Binary(bytes))
    }
}

/// Hyperlink relationship table. Ids are handed out while the document
/// part is written, then the relationships part is generated from the same
/// table, so the two can never disagree.
#[derive(Default)]
struct Hyperlinks {
    by_target: HashMap<String, String>,
    ordered: Vec<(String, String)>,
}

impl Hyperlinks {
    // rId1 is the styles part.
    fn rid_for(&mut self, target: &str) -> String {
        if let Some(rid) = self.by_target.get(target) {
            return rid.clone();
        }
        let rid = format!("rId{}", self.ordered.len() + 2);
        self.by_target.insert(target.to_string(), rid.clone());
        self.ordered.push((rid.clone(), target.to_string()));
        rid
    }
}

fn build_package(document: &Document, options: &RenderOptions) -> zip::result::ZipResult<Vec<u8>> {
    let mut links = Hyperlinks::default();
    let document_xml = write_document(document, options, &mut links);
    let styles_xml = write_styles(&options.theme);
    let document_rels = write_document_rels(&links);
    let core_xml = write_core_properties(options);

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
    ] {
        zip.start_file(name, deflated)?;
        zip.write_all(content.as_bytes())?;
    }
    for (name, content) in [
        ("word/_rels/document.xml.rels", &document_rels),
        ("word/styles.xml", &styles_xml),
        ("word/document.xml", &document_xml),
        ("docProps/core.xml", &core_xml),
    ] {
        zip.start_file(name, deflated)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>
"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>
"#;

fn write_document_rels(links: &Hyperlinks) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
"#,
    );
    for (rid, target) in &links.ordered {
        let _ = writeln!(
            xml,
            r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="{}" TargetMode="External"/>"#,
            rid,
            escape_xml(target)
        );
    }
    xml.push_str("</Relationships>\n");
    xml
}

fn write_core_properties(options: &RenderOptions) -> String {
    let mut keywords = String::new();
    for (key, value) in &options.metadata {
        if let Some(text) = value.as_plain_text() {
            if !keywords.is_empty() {
                keywords.push_str("; ");
            }
            let _ = write!(keywords, "{}={}", key, text);
        }
    }

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
    );
    let _ = writeln!(xml, "<dc:title>{}</dc:title>", escape_xml(options.display_title()));
    if let Some(author) = options.author.as_deref() {
        let _ = writeln!(xml, "<dc:creator>{}</dc:creator>", escape_xml(author));
    }
    if !keywords.is_empty() {
        let _ = writeln!(xml, "<cp:keywords>{}</cp:keywords>", escape_xml(&keywords));
    }
    xml.push_str("</cp:coreProperties>\n");
    xml
}

/// Style id for a callout kind: the slug in Pascal case, `insight-note`
/// becoming `InsightNote`.
fn kind_style_id(kind: SpecialKind) -> String {
    kind.slug()
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn write_styles(theme: &Theme) -> String {
    let burgundy = Theme::hex_digits(&theme.burgundy);
    let gold = Theme::hex_digits(&theme.gold);

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:docDefaults>
<w:rPrDefault><w:rPr><w:rFonts w:ascii="Georgia" w:hAnsi="Georgia"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>
<w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault>
</w:docDefaults>
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
"#,
    );

    // Heading2 carries the gold accent; the other levels stay burgundy.
    for (id, size, color) in [
        ("Heading1", 48, burgundy.as_str()),
        ("Heading2", 40, gold.as_str()),
        ("Heading3", 32, burgundy.as_str()),
        ("Heading4", 28, burgundy.as_str()),
    ] {
        let _ = writeln!(
            xml,
            r#"<w:style w:type="paragraph" w:styleId="{id}"><w:name w:val="{id}"/><w:basedOn w:val="Normal"/><w:pPr><w:spacing w:before="240" w:after="120"/></w:pPr><w:rPr><w:b/><w:color w:val="{color}"/><w:sz w:val="{size}"/></w:rPr></w:style>"#,
        );
    }

    xml.push_str(concat!(
        r#"<w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:pPr><w:spacing w:after="60"/><w:ind w:left="360"/></w:pPr></w:style>"#,
        "\n",
        r#"<w:style w:type="paragraph" w:styleId="Blockquote"><w:name w:val="Blockquote"/><w:basedOn w:val="Normal"/><w:pPr><w:ind w:left="360"/></w:pPr><w:rPr><w:i/><w:color w:val="595959"/></w:rPr></w:style>"#,
        "\n",
    ));
    let _ = writeln!(
        xml,
        r#"<w:style w:type="paragraph" w:styleId="PanelTitle"><w:name w:val="Panel Title"/><w:basedOn w:val="Normal"/><w:pPr><w:spacing w:before="180" w:after="60"/></w:pPr><w:rPr><w:b/><w:caps/><w:color w:val="{gold}"/><w:sz w:val="24"/></w:rPr></w:style>"#,
    );

    // One shaded style per callout kind so panels keep their identity.
    for kind in SpecialKind::ALL {
        let _ = writeln!(
            xml,
            r#"<w:style w:type="paragraph" w:styleId="{id}"><w:name w:val="{name}"/><w:basedOn w:val="Normal"/><w:pPr><w:shd w:val="clear" w:color="auto" w:fill="F7F3E8"/><w:ind w:left="240" w:right="240"/></w:pPr></w:style>"#,
            id = kind_style_id(kind),
            name = kind.label(),
        );
    }

    xml.push_str("</w:styles>\n");
    xml
}

fn write_document(document: &Document, options: &RenderOptions, links: &mut Hyperlinks) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<w:body>
"#,
    );

    let mut bookmark = 0u32;
    for block in document.iter() {
        write_block(&mut xml, block, options, links, &mut bookmark);
    }

    xml.push_str("</w:body>\n</w:document>\n");
    xml
}

fn write_block(
    xml: &mut String,
    block: &Block,
    options: &RenderOptions,
    links: &mut Hyperlinks,
    bookmark: &mut u32,
) {
    match block {
        Block::Heading {
            level,
            text,
            anchor_id,
        } => {
            let style = format!("Heading{}", (*level).min(4));
            let id = *bookmark;
            *bookmark += 1;
            let _ = write!(
                xml,
                r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr><w:bookmarkStart w:id="{id}" w:name="{name}"/>"#,
                name = escape_xml(anchor_id),
            );
            write_runs(xml, &parse_inline(text), links, "");
            let _ = writeln!(xml, r#"<w:bookmarkEnd w:id="{id}"/></w:p>"#);
        }
        Block::Paragraph { runs } => {
            xml.push_str("<w:p>");
            write_runs(xml, runs, links, "");
            xml.push_str("</w:p>\n");
        }
        Block::List { ordered, items } => {
            for (index, item) in items.iter().enumerate() {
                let marker = if *ordered {
                    format!("{}. ", index + 1)
                } else {
                    "\u{2022} ".to_string()
                };
                xml.push_str(r#"<w:p><w:pPr><w:pStyle w:val="ListBullet"/></w:pPr>"#);
                write_text_run(xml, &marker, "");
                write_runs(xml, item, links, "");
                xml.push_str("</w:p>\n");
            }
        }
        Block::Table { rows } => write_table(xml, rows, options, links),
        Block::Blockquote { lines } => {
            for line in lines {
                xml.push_str(r#"<w:p><w:pPr><w:pStyle w:val="Blockquote"/></w:pPr>"#);
                write_runs(xml, &parse_inline(line), links, "");
                xml.push_str("</w:p>\n");
            }
        }
        Block::Rule => {
            let _ = writeln!(
                xml,
                r#"<w:p><w:pPr><w:pBdr><w:bottom w:val="single" w:sz="6" w:space="1" w:color="{}"/></w:pBdr></w:pPr></w:p>"#,
                Theme::hex_digits(&options.theme.gold),
            );
        }
        Block::Special(special) => write_special(xml, special, options, links),
    }
}

fn write_table(
    xml: &mut String,
    rows: &[Vec<String>],
    options: &RenderOptions,
    links: &mut Hyperlinks,
) {
    if rows.is_empty() {
        return;
    }
    xml.push_str(concat!(
        "<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/><w:tblBorders>",
        "<w:top w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"D9D0BC\"/>",
        "<w:left w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"D9D0BC\"/>",
        "<w:bottom w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"D9D0BC\"/>",
        "<w:right w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"D9D0BC\"/>",
        "<w:insideH w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"D9D0BC\"/>",
        "<w:insideV w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"D9D0BC\"/>",
        "</w:tblBorders></w:tblPr>\n",
    ));

    let burgundy = Theme::hex_digits(&options.theme.burgundy);
    for (row_index, row) in rows.iter().enumerate() {
        xml.push_str("<w:tr>");
        for cell in row {
            let (fill, run_props) = if row_index == 0 {
                (Some(burgundy.as_str()), r#"<w:b/><w:color w:val="FFFFFF"/>"#)
            } else if row_index % 2 == 0 {
                (Some("F2EAD9"), "")
            } else {
                (None, "")
            };
            xml.push_str("<w:tc><w:tcPr>");
            if let Some(fill) = fill {
                let _ = write!(xml, r#"<w:shd w:val="clear" w:color="auto" w:fill="{fill}"/>"#);
            }
            xml.push_str("</w:tcPr><w:p>");
            write_runs(xml, &parse_inline(cell), links, run_props);
            xml.push_str("</w:p></w:tc>");
        }
        xml.push_str("</w:tr>\n");
    }
    xml.push_str("</w:tbl>\n");
    // A paragraph after the table keeps following content out of it.
    xml.push_str("<w:p/>\n");
}

fn write_special(
    xml: &mut String,
    special: &SpecialBlock,
    options: &RenderOptions,
    links: &mut Hyperlinks,
) {
    match special.kind {
        SpecialKind::PremiumDivider => {
            xml.push_str(r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr>"#);
            write_text_run(
                xml,
                "\u{2726} \u{2726} \u{2726}",
                &format!(r#"<w:color w:val="{}"/>"#, Theme::hex_digits(&options.theme.gold)),
            );
            xml.push_str("</w:p>\n");
        }
        SpecialKind::PremiumH1 | SpecialKind::PremiumH2 => {
            let style = if special.kind == SpecialKind::PremiumH1 {
                "Heading1"
            } else {
                "Heading2"
            };
            let text = joined_lines(&special.raw_lines)
                .unwrap_or_else(|| special.title.clone().unwrap_or_default());
            if !text.is_empty() {
                let _ = write!(xml, r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr>"#);
                write_runs(xml, &parse_inline(&text), links, "");
                xml.push_str("</w:p>\n");
            }
        }
        SpecialKind::Quote | SpecialKind::PremiumQuote => {
            for line in &special.raw_lines {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                xml.push_str(r#"<w:p><w:pPr><w:pStyle w:val="Blockquote"/></w:pPr>"#);
                write_runs(xml, &parse_inline(line), links, "");
                xml.push_str("</w:p>\n");
            }
        }
        SpecialKind::InsightNote => write_insight_note(xml, special, options, links),
        _ => {
            let style = kind_style_id(special.kind);
            write_panel_title(xml, special.header());
            write_panel_lines(xml, &special.raw_lines, &style, options, links);
        }
    }
}

fn write_insight_note(
    xml: &mut String,
    special: &SpecialBlock,
    options: &RenderOptions,
    links: &mut Hyperlinks,
) {
    let Some(StructuredFields::InsightNote {
        core,
        key_distinction,
        practical_implication,
        go_deeper,
    }) = &special.fields
    else {
        write_panel_title(xml, special.header());
        write_panel_lines(xml, &special.raw_lines, "InsightNote", options, links);
        return;
    };

    write_panel_title(xml, special.header());
    if !core.trim().is_empty() {
        xml.push_str(r#"<w:p><w:pPr><w:pStyle w:val="InsightNote"/></w:pPr>"#);
        write_runs(xml, &parse_inline(&flowed(core)), links, "");
        xml.push_str("</w:p>\n");
    }
    for (label, value) in [
        ("Key Distinction", key_distinction),
        ("Practical Implication", practical_implication),
        ("Go Deeper", go_deeper),
    ] {
        if let Some(value) = value {
            xml.push_str(r#"<w:p><w:pPr><w:pStyle w:val="InsightNote"/></w:pPr>"#);
            write_text_run(xml, &format!("{label}: "), "<w:b/>");
            write_runs(xml, &parse_inline(&flowed(value)), links, "");
            xml.push_str("</w:p>\n");
        }
    }
}

fn write_panel_title(xml: &mut String, title: &str) {
    xml.push_str(r#"<w:p><w:pPr><w:pStyle w:val="PanelTitle"/></w:pPr>"#);
    write_text_run(xml, title, "");
    xml.push_str("</w:p>\n");
}

/// Panel content: list lines become bulleted or renumbered paragraphs,
/// row lines collect into a real table, everything else is a paragraph in
/// the panel's own style.
fn write_panel_lines(
    xml: &mut String,
    lines: &[String],
    style: &str,
    options: &RenderOptions,
    links: &mut Hyperlinks,
) {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut ordinal = 0u32;

    for line in lines {
        match classify_line(line) {
            LineKind::Blank => {
                flush_rows(xml, &mut rows, options, links);
                ordinal = 0;
            }
            LineKind::TableRow { cells } => {
                ordinal = 0;
                if !is_separator_row(&cells) {
                    rows.push(cells);
                }
            }
            LineKind::UnorderedItem { text } => {
                flush_rows(xml, &mut rows, options, links);
                ordinal = 0;
                write_panel_item(xml, style, "\u{2022} ", &text, links);
            }
            LineKind::OrderedItem { text } => {
                flush_rows(xml, &mut rows, options, links);
                ordinal += 1;
                write_panel_item(xml, style, &format!("{ordinal}. "), &text, links);
            }
            _ => {
                flush_rows(xml, &mut rows, options, links);
                ordinal = 0;
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = write!(xml, r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr>"#);
                    write_runs(xml, &parse_inline(trimmed), links, "");
                    xml.push_str("</w:p>\n");
                }
            }
        }
    }
    flush_rows(xml, &mut rows, options, links);
}

fn flush_rows(
    xml: &mut String,
    rows: &mut Vec<Vec<String>>,
    options: &RenderOptions,
    links: &mut Hyperlinks,
) {
    if !rows.is_empty() {
        write_table(xml, rows, options, links);
        rows.clear();
    }
}

fn write_panel_item(
    xml: &mut String,
    style: &str,
    marker: &str,
    text: &str,
    links: &mut Hyperlinks,
) {
    let _ = write!(xml, r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr>"#);
    write_text_run(xml, marker, "");
    write_runs(xml, &parse_inline(text), links, "");
    xml.push_str("</w:p>\n");
}

/// One `w:r` per inline run. `extra_props` is prepended to each run's
/// properties, which is how header cells get their bold white text.
fn write_runs(xml: &mut String, runs: &[InlineRun], links: &mut Hyperlinks, extra_props: &str) {
    for run in runs {
        match run {
            InlineRun::Text(text) => write_text_run(xml, text, extra_props),
            InlineRun::Bold(text) => {
                write_text_run(xml, text, &format!("{extra_props}<w:b/>"));
            }
            InlineRun::Italic(text) => {
                write_text_run(xml, text, &format!("{extra_props}<w:i/>"));
            }
            InlineRun::Code(text) => {
                write_text_run(
                    xml,
                    text,
                    &format!(r#"<w:rFonts w:ascii="Courier New" w:hAnsi="Courier New"/>{extra_props}"#),
                );
            }
            InlineRun::Link { label, target } => {
                let safe = safe_link_target(target);
                if safe == "#" {
                    write_text_run(xml, label, extra_props);
                } else {
                    let rid = links.rid_for(safe);
                    let _ = write!(xml, r#"<w:hyperlink r:id="{rid}">"#);
                    write_text_run(
                        xml,
                        label,
                        &format!(r#"{extra_props}<w:color w:val="0563C1"/><w:u w:val="single"/>"#),
                    );
                    xml.push_str("</w:hyperlink>");
                }
            }
        }
    }
}

fn write_text_run(xml: &mut String, text: &str, props: &str) {
    xml.push_str("<w:r>");
    if !props.is_empty() {
        let _ = write!(xml, "<w:rPr>{props}</w:rPr>");
    }
    let _ = write!(
        xml,
        r#"<w:t xml:space="preserve">{}</w:t>"#,
        escape_xml(text)
    );
    xml.push_str("</w:r>");
}

fn joined_lines(lines: &[String]) -> Option<String> {
    let joined = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn flowed(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
