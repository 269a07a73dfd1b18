//! Paginated-text target
//!
//! Two passes. The first flattens the document into an ordered sequence of
//! styled runs: role, text and character metrics, no positions yet. The
//! second fills pages, walking the runs against the content rectangle of the
//! configured geometry and starting a new page when the rectangle is
//! exhausted. The artifact is the serialized page model as JSON; drawing is
//! the consumer's concern, layout is ours.
//!
//! [`render_basic`] is the simplified layout the publish pipeline falls back
//! to when the primary layout fails: one body style for everything, no cover,
//! no page numbers, and a degenerate geometry replaced by the default.

use serde::Serialize;

use atlas_markup::line::{classify_line, LineKind};
use atlas_markup::parser::is_separator_row;
use atlas_markup::{parse_inline, Block, Document, InlineRun, SpecialBlock, SpecialKind};

use crate::error::{ExportError, ExportResult};
use crate::options::{PageGeometry, RenderOptions};
use crate::target::{Artifact, RenderInput, RenderTarget};

pub struct PaginatedTarget;

impl RenderTarget for PaginatedTarget {
    fn name(&self) -> &str {
        "pages"
    }

    fn description(&self) -> &str {
        "Paginated page model as JSON"
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn render(&self, input: &RenderInput<'_>, options: &RenderOptions) -> ExportResult<Artifact> {
        let model = build_model(input.document, options)?;
        let json =
            serde_json::to_string_pretty(&model).map_err(|err| ExportError::ConversionFailed {
                target: "pages".to_string(),
                reason: err.to_string(),
            })?;
        Ok(Artifact::Text(json))
    }
}

/// The serialized layout: geometry echoed back plus the filled pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageModel {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub number: u32,
    pub cover: bool,
    pub runs: Vec<PlacedRun>,
}

/// One run placed on a page. `y` is measured from the top edge of the page;
/// `height` is the vertical extent of the drawn text, trailing spacing
/// excluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedRun {
    pub role: RunRole,
    pub text: String,
    pub y: f32,
    pub height: f32,
    pub size: f32,
}

/// What a run is, for the consumer to style. Heading carries its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunRole {
    CoverBrand,
    CoverTitle,
    CoverAuthor,
    CoverHighlight,
    /// Reserved rectangle for the logo image; the bytes travel separately.
    CoverLogo,
    Heading(u8),
    Body,
    ListItem,
    Quote,
    TableRow,
    PanelTitle,
    PanelBody,
    Rule,
    PageNumber,
}

/// A flattened run before layout: metrics, no position.
#[derive(Debug, Clone)]
struct StyledRun {
    role: RunRole,
    text: String,
    size: f32,
    leading: f32,
    space_after: f32,
}

const BODY_SIZE: f32 = 11.0;
const BODY_LEADING: f32 = 15.4;

impl StyledRun {
    fn heading(level: u8, text: String) -> Self {
        let (size, leading, space_after) = match level {
            1 => (24.0, 28.0, 10.0),
            2 => (20.0, 24.0, 8.0),
            3 => (16.0, 20.0, 6.0),
            _ => (14.0, 18.0, 6.0),
        };
        Self {
            role: RunRole::Heading(level),
            text,
            size,
            leading,
            space_after,
        }
    }

    fn body(text: String) -> Self {
        Self {
            role: RunRole::Body,
            text,
            size: BODY_SIZE,
            leading: BODY_LEADING,
            space_after: 6.0,
        }
    }

    fn list_item(text: String) -> Self {
        Self {
            role: RunRole::ListItem,
            text,
            size: BODY_SIZE,
            leading: BODY_LEADING,
            space_after: 3.0,
        }
    }

    fn quote(text: String) -> Self {
        Self {
            role: RunRole::Quote,
            text,
            size: BODY_SIZE,
            leading: BODY_LEADING,
            space_after: 6.0,
        }
    }

    fn table_row(cells: &[String]) -> Self {
        let text = cells
            .iter()
            .map(|cell| strip_markers(cell))
            .collect::<Vec<_>>()
            .join("\t");
        Self {
            role: RunRole::TableRow,
            text,
            size: 10.0,
            leading: 14.0,
            space_after: 2.0,
        }
    }

    fn panel_title(text: String) -> Self {
        Self {
            role: RunRole::PanelTitle,
            text,
            size: 13.0,
            leading: 17.0,
            space_after: 4.0,
        }
    }

    fn panel_body(text: String) -> Self {
        Self {
            role: RunRole::PanelBody,
            text,
            size: BODY_SIZE,
            leading: BODY_LEADING,
            space_after: 4.0,
        }
    }

    fn rule() -> Self {
        Self {
            role: RunRole::Rule,
            text: String::new(),
            size: 12.0,
            leading: 12.0,
            space_after: 0.0,
        }
    }

    /// Estimated drawn height: wrapped line count times leading. The
    /// character budget per line assumes an average glyph half the font
    /// size wide, which tracks the serif faces this feeds.
    fn visible_height(&self, content_width: f32) -> f32 {
        let chars = self.text.chars().count();
        if chars == 0 {
            return self.leading;
        }
        let per_line = ((content_width / (self.size * 0.5)) as usize).max(1);
        chars.div_ceil(per_line) as f32 * self.leading
    }
}

fn build_model(document: &Document, options: &RenderOptions) -> ExportResult<PageModel> {
    let geometry = options.page;
    if geometry.is_degenerate() {
        return Err(ExportError::ConversionFailed {
            target: "pages".to_string(),
            reason: "content rectangle is empty".to_string(),
        });
    }

    let mut pages = Vec::new();
    let mut first_number = 1;
    if options.include_cover_page {
        pages.push(cover_page(document, options, &geometry));
        first_number = 2;
    }
    paginate(&mut pages, first_number, flatten(document), &geometry);

    if options.include_page_numbers {
        for page in pages.iter_mut().filter(|page| !page.cover) {
            page.runs.push(page_number_run(page.number, &geometry));
        }
    }

    Ok(PageModel { geometry, pages })
}

fn flatten(document: &Document) -> Vec<StyledRun> {
    let mut runs = Vec::new();
    for block in document.iter() {
        match block {
            Block::Heading { level, text, .. } => {
                runs.push(StyledRun::heading(*level, strip_markers(text)));
            }
            Block::Paragraph { runs: inline } => runs.push(StyledRun::body(visible(inline))),
            Block::List { ordered, items } => {
                for (index, item) in items.iter().enumerate() {
                    let text = if *ordered {
                        format!("{}. {}", index + 1, visible(item))
                    } else {
                        format!("\u{2022} {}", visible(item))
                    };
                    runs.push(StyledRun::list_item(text));
                }
            }
            Block::Table { rows } => {
                for row in rows {
                    runs.push(StyledRun::table_row(row));
                }
            }
            Block::Blockquote { lines } => {
                for line in lines {
                    runs.push(StyledRun::quote(strip_markers(line)));
                }
            }
            Block::Rule => runs.push(StyledRun::rule()),
            Block::Special(special) => flatten_special(&mut runs, special),
        }
    }
    runs
}

fn flatten_special(runs: &mut Vec<StyledRun>, special: &SpecialBlock) {
    match special.kind {
        SpecialKind::PremiumDivider => runs.push(StyledRun::rule()),
        SpecialKind::PremiumH1 | SpecialKind::PremiumH2 => {
            let level = if special.kind == SpecialKind::PremiumH1 {
                1
            } else {
                2
            };
            let text = special
                .raw_lines
                .iter()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let text = if text.is_empty() {
                special.title.clone().unwrap_or_default()
            } else {
                text
            };
            if !text.is_empty() {
                runs.push(StyledRun::heading(level, strip_markers(&text)));
            }
        }
        SpecialKind::Quote | SpecialKind::PremiumQuote => {
            for line in &special.raw_lines {
                let line = line.trim();
                if !line.is_empty() {
                    runs.push(StyledRun::quote(strip_markers(line)));
                }
            }
        }
        SpecialKind::StructureMap => {
            runs.push(StyledRun::panel_title(special.header().to_string()));
            // Leading whitespace is the tree structure; keep it.
            for line in &special.raw_lines {
                if !line.trim().is_empty() {
                    runs.push(StyledRun::panel_body(strip_markers(line)));
                }
            }
        }
        _ => {
            runs.push(StyledRun::panel_title(special.header().to_string()));
            let mut ordinal = 0;
            for line in &special.raw_lines {
                match classify_line(line) {
                    LineKind::Blank => ordinal = 0,
                    LineKind::UnorderedItem { text } => {
                        ordinal = 0;
                        runs.push(StyledRun::list_item(format!(
                            "\u{2022} {}",
                            strip_markers(&text)
                        )));
                    }
                    LineKind::OrderedItem { text } => {
                        ordinal += 1;
                        runs.push(StyledRun::list_item(format!(
                            "{}. {}",
                            ordinal,
                            strip_markers(&text)
                        )));
                    }
                    LineKind::TableRow { cells } => {
                        ordinal = 0;
                        if !is_separator_row(&cells) {
                            runs.push(StyledRun::table_row(&cells));
                        }
                    }
                    _ => {
                        ordinal = 0;
                        runs.push(StyledRun::panel_body(strip_markers(line.trim())));
                    }
                }
            }
        }
    }
}

/// Fill pages from the flattened runs. A page breaks when the next run's
/// drawn height no longer fits; a run taller than the whole rectangle gets
/// a page to itself rather than being lost.
fn paginate(
    pages: &mut Vec<Page>,
    first_number: u32,
    runs: Vec<StyledRun>,
    geometry: &PageGeometry,
) {
    let content_width = geometry.content_width();
    let content_height = geometry.content_height();
    let mut number = first_number;
    let mut current: Vec<PlacedRun> = Vec::new();
    let mut cursor = 0.0f32;

    for run in runs {
        let height = run.visible_height(content_width);
        if cursor > 0.0 && cursor + height > content_height {
            pages.push(Page {
                number,
                cover: false,
                runs: std::mem::take(&mut current),
            });
            number += 1;
            cursor = 0.0;
        }
        current.push(PlacedRun {
            role: run.role,
            text: run.text,
            y: geometry.margin + cursor,
            height,
            size: run.size,
        });
        cursor += height + run.space_after;
    }

    if !current.is_empty() {
        pages.push(Page {
            number,
            cover: false,
            runs: current,
        });
    } else if pages.is_empty() {
        // An empty document still yields one page, so the model is never
        // a zero-page artifact.
        pages.push(Page {
            number,
            cover: false,
            runs: Vec::new(),
        });
    }
}

/// The cover is composed, not paginated: fixed vertical stack of brand
/// line, title, author and up to five highlights pulled from the first
/// quick-glance block.
fn cover_page(document: &Document, options: &RenderOptions, geometry: &PageGeometry) -> Page {
    let mut runs = Vec::new();
    let mut y = geometry.margin + 40.0;

    if options.logo.is_some() {
        runs.push(PlacedRun {
            role: RunRole::CoverLogo,
            text: String::new(),
            y,
            height: 96.0,
            size: 0.0,
        });
        y += 120.0;
    }
    runs.push(PlacedRun {
        role: RunRole::CoverBrand,
        text: options.theme.brand_line.clone(),
        y,
        height: 16.0,
        size: 12.0,
    });
    y += 30.0;
    runs.push(PlacedRun {
        role: RunRole::CoverTitle,
        text: options.display_title().to_string(),
        y,
        height: 34.0,
        size: 28.0,
    });
    y += 46.0;
    if let Some(author) = options.author.as_deref() {
        runs.push(PlacedRun {
            role: RunRole::CoverAuthor,
            text: format!("by {author}"),
            y,
            height: 18.0,
            size: 14.0,
        });
        y += 32.0;
    }
    for highlight in cover_highlights(document) {
        runs.push(PlacedRun {
            role: RunRole::CoverHighlight,
            text: highlight,
            y,
            height: 18.0,
            size: 12.0,
        });
        y += 22.0;
    }

    Page {
        number: 1,
        cover: true,
        runs,
    }
}

fn cover_highlights(document: &Document) -> Vec<String> {
    let Some(glance) = document.first_special(SpecialKind::QuickGlance) else {
        return Vec::new();
    };
    glance
        .raw_lines
        .iter()
        .filter_map(|line| match classify_line(line) {
            LineKind::UnorderedItem { text } => Some(strip_markers(&text)),
            _ => None,
        })
        .take(5)
        .collect()
}

fn page_number_run(number: u32, geometry: &PageGeometry) -> PlacedRun {
    PlacedRun {
        role: RunRole::PageNumber,
        text: number.to_string(),
        y: geometry.height - geometry.margin / 2.0,
        height: 9.0,
        size: 9.0,
    }
}

/// Simplified layout for the fallback path. Everything becomes a body run
/// at one size, cover and page numbers are dropped, and a degenerate
/// geometry is replaced by the default so layout always has room to work.
pub fn render_basic(source: &str, options: &RenderOptions) -> Artifact {
    let document = atlas_markup::parse(source);
    let geometry = if options.page.is_degenerate() {
        PageGeometry::default()
    } else {
        options.page
    };

    let runs = flatten(&document)
        .into_iter()
        .map(|run| StyledRun::body(run.text))
        .collect();
    let mut pages = Vec::new();
    paginate(&mut pages, 1, runs, &geometry);
    let model = PageModel { geometry, pages };
    Artifact::Text(serde_json::to_string_pretty(&model).unwrap_or_default())
}

fn visible(runs: &[InlineRun]) -> String {
    runs.iter().map(|run| run.visible_text()).collect()
}

fn strip_markers(text: &str) -> String {
    visible(&parse_inline(text))
}
