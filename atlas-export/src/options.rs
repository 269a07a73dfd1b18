//! Render options shared by every target

use serde::Serialize;

use crate::meta::MetaValue;

/// Brand palette and identity line applied to styled targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Accent color for highlights and panel titles, as `#RRGGBB`
    pub gold: String,
    /// Primary heading and cover color, as `#RRGGBB`
    pub burgundy: String,
    /// Secondary accent for callouts, as `#RRGGBB`
    pub coral: String,
    /// Short identity line shown on covers and headers
    pub brand_line: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            gold: "#CBA135".to_string(),
            burgundy: "#582534".to_string(),
            coral: "#E76F51".to_string(),
            brand_line: "INSIGHT ATLAS".to_string(),
        }
    }
}

impl Theme {
    /// Hex digits of a palette color without the leading `#`, uppercased.
    ///
    /// WordprocessingML color attributes use this form.
    pub fn hex_digits(color: &str) -> String {
        color.trim_start_matches('#').to_ascii_uppercase()
    }
}

/// Page dimensions and margin, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        // US letter at 72 dpi with a 0.75 inch margin
        Self {
            width: 612.0,
            height: 792.0,
            margin: 54.0,
        }
    }
}

impl PageGeometry {
    pub fn new(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }

    /// Width of the area text may occupy.
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Height of the area text may occupy.
    pub fn content_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }

    /// True when the margins leave no room for content.
    pub fn is_degenerate(&self) -> bool {
        self.content_width() <= 0.0 || self.content_height() <= 0.0
    }
}

/// Options accepted by every render target.
///
/// Targets ignore the options that do not apply to them; the plain text
/// target has no use for a logo, for example.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Book or chapter title for covers, headers and document properties
    pub title: Option<String>,
    /// Author line for covers and document properties
    pub author: Option<String>,
    /// Raw logo image bytes for covers and headers
    pub logo: Option<Vec<u8>>,
    /// Emit a cover page where the target supports one
    pub include_cover_page: bool,
    /// Emit a table of contents built from section headings
    pub include_toc: bool,
    /// Emit page numbers on paginated targets
    pub include_page_numbers: bool,
    /// Reading speed used for the estimated reading time badge
    pub words_per_minute: u32,
    pub theme: Theme,
    pub page: PageGeometry,
    /// Extra metadata surfaced as `<meta>` tags and document properties
    pub metadata: Vec<(String, MetaValue)>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            logo: None,
            include_cover_page: true,
            include_toc: true,
            include_page_numbers: true,
            words_per_minute: 225,
            theme: Theme::default(),
            page: PageGeometry::default(),
            metadata: Vec::new(),
        }
    }
}

impl RenderOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_logo(mut self, bytes: Vec<u8>) -> Self {
        self.logo = Some(bytes);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: MetaValue) -> Self {
        self.metadata.push((key.into(), value));
        self
    }

    /// Title to display, falling back to a stable placeholder.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => "Untitled Analysis",
        }
    }

    /// Estimated minutes to read `word_count` words, never less than one.
    pub fn reading_minutes(&self, word_count: usize) -> usize {
        let wpm = self.words_per_minute.max(1) as usize;
        word_count.div_ceil(wpm).max(1)
    }
}
