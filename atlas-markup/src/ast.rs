//! Document model
//!
//! A parsed document is a flat, ordered sequence of [`Block`] values. The
//! model is immutable once constructed: the parser builds it in one pass and
//! renderers only ever borrow it. Heading anchors are assigned here at
//! construction time so that every renderer links the same ids.

use serde::Serialize;

/// Named callout kinds recognized by the block grammar. Closed set: a tag
/// whose name is not listed here is ordinary text, never a block marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialKind {
    QuickGlance,
    InsightNote,
    AlternativePerspective,
    ResearchInsight,
    ActionBox,
    Exercise,
    FoundationalNarrative,
    StructureMap,
    Takeaways,
    VisualFlowchart,
    VisualTable,
    ProcessTimeline,
    ConceptMap,
    Quote,
    PremiumQuote,
    AuthorSpotlight,
    PremiumDivider,
    PremiumH1,
    PremiumH2,
}

impl SpecialKind {
    pub const ALL: [SpecialKind; 19] = [
        SpecialKind::QuickGlance,
        SpecialKind::InsightNote,
        SpecialKind::AlternativePerspective,
        SpecialKind::ResearchInsight,
        SpecialKind::ActionBox,
        SpecialKind::Exercise,
        SpecialKind::FoundationalNarrative,
        SpecialKind::StructureMap,
        SpecialKind::Takeaways,
        SpecialKind::VisualFlowchart,
        SpecialKind::VisualTable,
        SpecialKind::ProcessTimeline,
        SpecialKind::ConceptMap,
        SpecialKind::Quote,
        SpecialKind::PremiumQuote,
        SpecialKind::AuthorSpotlight,
        SpecialKind::PremiumDivider,
        SpecialKind::PremiumH1,
        SpecialKind::PremiumH2,
    ];

    /// Resolve an open-tag name to a kind. `EXERCISE_3` style names
    /// normalize to [`SpecialKind::Exercise`]; everything else must match a
    /// tag spelling exactly. Returns `None` for unknown names.
    pub fn from_tag(name: &str) -> Option<SpecialKind> {
        let direct = Self::ALL.iter().copied().find(|kind| kind.tag() == name);
        if direct.is_some() {
            return direct;
        }
        match name.strip_prefix("EXERCISE_") {
            Some(rest) if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) => {
                Some(SpecialKind::Exercise)
            }
            _ => None,
        }
    }

    /// The upper-snake tag spelling used in markup, without brackets.
    pub fn tag(&self) -> &'static str {
        match self {
            SpecialKind::QuickGlance => "QUICK_GLANCE",
            SpecialKind::InsightNote => "INSIGHT_NOTE",
            SpecialKind::AlternativePerspective => "ALTERNATIVE_PERSPECTIVE",
            SpecialKind::ResearchInsight => "RESEARCH_INSIGHT",
            SpecialKind::ActionBox => "ACTION_BOX",
            SpecialKind::Exercise => "EXERCISE",
            SpecialKind::FoundationalNarrative => "FOUNDATIONAL_NARRATIVE",
            SpecialKind::StructureMap => "STRUCTURE_MAP",
            SpecialKind::Takeaways => "TAKEAWAYS",
            SpecialKind::VisualFlowchart => "VISUAL_FLOWCHART",
            SpecialKind::VisualTable => "VISUAL_TABLE",
            SpecialKind::ProcessTimeline => "PROCESS_TIMELINE",
            SpecialKind::ConceptMap => "CONCEPT_MAP",
            SpecialKind::Quote => "QUOTE",
            SpecialKind::PremiumQuote => "PREMIUM_QUOTE",
            SpecialKind::AuthorSpotlight => "AUTHOR_SPOTLIGHT",
            SpecialKind::PremiumDivider => "PREMIUM_DIVIDER",
            SpecialKind::PremiumH1 => "PREMIUM_H1",
            SpecialKind::PremiumH2 => "PREMIUM_H2",
        }
    }

    /// Human-readable label used for panel headers and fallback rendering.
    pub fn label(&self) -> &'static str {
        match self {
            SpecialKind::QuickGlance => "Quick Glance",
            SpecialKind::InsightNote => "Insight Note",
            SpecialKind::AlternativePerspective => "Alternative Perspective",
            SpecialKind::ResearchInsight => "Research Insight",
            SpecialKind::ActionBox => "Action Box",
            SpecialKind::Exercise => "Exercise",
            SpecialKind::FoundationalNarrative => "Foundational Narrative",
            SpecialKind::StructureMap => "Structure Map",
            SpecialKind::Takeaways => "Takeaways",
            SpecialKind::VisualFlowchart => "Flowchart",
            SpecialKind::VisualTable => "Table",
            SpecialKind::ProcessTimeline => "Process Timeline",
            SpecialKind::ConceptMap => "Concept Map",
            SpecialKind::Quote => "Quote",
            SpecialKind::PremiumQuote => "Quote",
            SpecialKind::AuthorSpotlight => "Author Spotlight",
            SpecialKind::PremiumDivider => "Divider",
            SpecialKind::PremiumH1 => "Section Title",
            SpecialKind::PremiumH2 => "Section Subtitle",
        }
    }

    /// CSS class / slug form of the kind (`quick-glance`, `insight-note`, ...).
    pub fn slug(&self) -> &'static str {
        match self {
            SpecialKind::QuickGlance => "quick-glance",
            SpecialKind::InsightNote => "insight-note",
            SpecialKind::AlternativePerspective => "alternative-perspective",
            SpecialKind::ResearchInsight => "research-insight",
            SpecialKind::ActionBox => "action-box",
            SpecialKind::Exercise => "exercise",
            SpecialKind::FoundationalNarrative => "foundational-narrative",
            SpecialKind::StructureMap => "structure-map",
            SpecialKind::Takeaways => "takeaways",
            SpecialKind::VisualFlowchart => "visual-flowchart",
            SpecialKind::VisualTable => "visual-table",
            SpecialKind::ProcessTimeline => "process-timeline",
            SpecialKind::ConceptMap => "concept-map",
            SpecialKind::Quote => "quote",
            SpecialKind::PremiumQuote => "premium-quote",
            SpecialKind::AuthorSpotlight => "author-spotlight",
            SpecialKind::PremiumDivider => "premium-divider",
            SpecialKind::PremiumH1 => "premium-h1",
            SpecialKind::PremiumH2 => "premium-h2",
        }
    }

    /// Kinds that get labeled sub-fields pulled out after parsing.
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            SpecialKind::InsightNote | SpecialKind::PremiumQuote | SpecialKind::AuthorSpotlight
        )
    }
}

/// One inline run of a text span. Runs are flat; rendering concatenates them
/// in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineRun {
    Text(String),
    Bold(String),
    Italic(String),
    Code(String),
    Link { label: String, target: String },
}

impl InlineRun {
    /// The visible text of the run, without markers or link targets.
    pub fn visible_text(&self) -> &str {
        match self {
            InlineRun::Text(text)
            | InlineRun::Bold(text)
            | InlineRun::Italic(text)
            | InlineRun::Code(text) => text,
            InlineRun::Link { label, .. } => label,
        }
    }
}

/// Labeled components extracted from the structured callout kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredFields {
    InsightNote {
        core: String,
        key_distinction: Option<String>,
        practical_implication: Option<String>,
        go_deeper: Option<String>,
    },
    PremiumQuote {
        quote_lines: Vec<String>,
        attribution: Option<String>,
        source: Option<String>,
    },
    AuthorSpotlight {
        name: Option<String>,
        bio: String,
    },
}

/// A named callout region with its collected raw lines.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialBlock {
    pub kind: SpecialKind,
    /// Optional title from the open tag (`[ACTION_BOX: Try This]`).
    pub title: Option<String>,
    /// The content lines exactly as collected, markers excluded. Never
    /// discarded, even when the close tag was missing.
    pub raw_lines: Vec<String>,
    pub fields: Option<StructuredFields>,
}

impl SpecialBlock {
    /// Panel header text: the tag title when present, the kind label
    /// otherwise.
    pub fn header(&self) -> &str {
        self.title.as_deref().unwrap_or_else(|| self.kind.label())
    }
}

/// One block-level element of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: u8,
        text: String,
        anchor_id: String,
    },
    Paragraph {
        runs: Vec<InlineRun>,
    },
    List {
        ordered: bool,
        items: Vec<Vec<InlineRun>>,
    },
    Table {
        rows: Vec<Vec<String>>,
    },
    Blockquote {
        lines: Vec<String>,
    },
    Rule,
    Special(SpecialBlock),
}

/// Table-of-contents entry derived from level 2-3 headings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub text: String,
    pub level: u8,
    pub anchor_id: String,
}

/// An ordered, immutable sequence of blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn iter_specials(&self) -> impl Iterator<Item = &SpecialBlock> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Special(special) => Some(special),
            _ => None,
        })
    }

    /// First callout of the given kind, in document order.
    pub fn first_special(&self, kind: SpecialKind) -> Option<&SpecialBlock> {
        self.iter_specials().find(|special| special.kind == kind)
    }

    pub fn contains_special(&self, kind: SpecialKind) -> bool {
        self.first_special(kind).is_some()
    }

    /// Heading `(level, text)` pairs in document order.
    pub fn heading_levels(&self) -> Vec<u8> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading { level, .. } => Some(*level),
                _ => None,
            })
            .collect()
    }

    /// Entries for a table of contents: level 2-3 headings in order.
    pub fn toc_entries(&self) -> Vec<TocEntry> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading {
                    level,
                    text,
                    anchor_id,
                } if (2..=3).contains(level) => Some(TocEntry {
                    text: text.clone(),
                    level: *level,
                    anchor_id: anchor_id.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Total whitespace-separated word count across all visible block text.
    pub fn word_count(&self) -> usize {
        let mut words = 0;
        for block in &self.blocks {
            match block {
                Block::Heading { text, .. } => words += count_words(text),
                Block::Paragraph { runs } => words += count_run_words(runs),
                Block::List { items, .. } => {
                    for item in items {
                        words += count_run_words(item);
                    }
                }
                Block::Table { rows } => {
                    for row in rows {
                        for cell in row {
                            words += count_words(cell);
                        }
                    }
                }
                Block::Blockquote { lines } => {
                    for line in lines {
                        words += count_words(line);
                    }
                }
                Block::Rule => {}
                Block::Special(special) => {
                    for line in &special.raw_lines {
                        words += count_words(line);
                    }
                }
            }
        }
        words
    }

    /// Count of non-whitespace characters reachable from the block contents.
    /// Used to check that parsing never silently drops text.
    pub fn content_char_count(&self) -> usize {
        let mut count = 0;
        for block in &self.blocks {
            match block {
                Block::Heading { text, .. } => count += count_chars(text),
                Block::Paragraph { runs } => count += count_run_chars(runs),
                Block::List { items, .. } => {
                    for item in items {
                        count += count_run_chars(item);
                    }
                }
                Block::Table { rows } => {
                    for row in rows {
                        for cell in row {
                            count += count_chars(cell);
                        }
                    }
                }
                Block::Blockquote { lines } => {
                    for line in lines {
                        count += count_chars(line);
                    }
                }
                Block::Rule => {}
                Block::Special(special) => {
                    for line in &special.raw_lines {
                        count += count_chars(line);
                    }
                    if let Some(title) = &special.title {
                        count += count_chars(title);
                    }
                }
            }
        }
        count
    }
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

fn count_run_words(runs: &[InlineRun]) -> usize {
    runs.iter().map(|run| count_words(run.visible_text())).sum()
}

fn count_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

fn count_run_chars(runs: &[InlineRun]) -> usize {
    runs.iter()
        .map(|run| match run {
            InlineRun::Link { label, target } => count_chars(label) + count_chars(target),
            other => count_chars(other.visible_text()),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exact_tag_names() {
        assert_eq!(
            SpecialKind::from_tag("QUICK_GLANCE"),
            Some(SpecialKind::QuickGlance)
        );
        assert_eq!(
            SpecialKind::from_tag("PREMIUM_H2"),
            Some(SpecialKind::PremiumH2)
        );
        assert_eq!(SpecialKind::from_tag("NOT_A_BLOCK"), None);
    }

    #[test]
    fn numbered_exercise_tags_normalize() {
        assert_eq!(SpecialKind::from_tag("EXERCISE"), Some(SpecialKind::Exercise));
        assert_eq!(
            SpecialKind::from_tag("EXERCISE_2"),
            Some(SpecialKind::Exercise)
        );
        assert_eq!(SpecialKind::from_tag("EXERCISE_"), None);
        assert_eq!(SpecialKind::from_tag("EXERCISE_X"), None);
    }

    #[test]
    fn tag_and_slug_round_trip_all_kinds() {
        for kind in SpecialKind::ALL {
            assert_eq!(SpecialKind::from_tag(kind.tag()), Some(kind));
            assert_eq!(kind.slug(), kind.slug().to_lowercase());
        }
    }

    #[test]
    fn toc_skips_top_and_deep_levels() {
        let document = Document::new(vec![
            Block::Heading {
                level: 1,
                text: "Title".into(),
                anchor_id: "section-0".into(),
            },
            Block::Heading {
                level: 2,
                text: "Part One".into(),
                anchor_id: "section-1".into(),
            },
            Block::Heading {
                level: 4,
                text: "Minor".into(),
                anchor_id: "section-2".into(),
            },
            Block::Heading {
                level: 3,
                text: "Detail".into(),
                anchor_id: "section-3".into(),
            },
        ]);
        let toc = document.toc_entries();
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].text, "Part One");
        assert_eq!(toc[1].anchor_id, "section-3");
    }

    #[test]
    fn word_count_covers_every_block_shape() {
        let document = Document::new(vec![
            Block::Heading {
                level: 1,
                text: "Two words".into(),
                anchor_id: "section-0".into(),
            },
            Block::Paragraph {
                runs: vec![
                    InlineRun::Text("one ".into()),
                    InlineRun::Bold("two".into()),
                ],
            },
            Block::Special(SpecialBlock {
                kind: SpecialKind::Takeaways,
                title: None,
                raw_lines: vec!["- first point".into()],
                fields: None,
            }),
        ]);
        assert_eq!(document.word_count(), 2 + 2 + 3);
    }

    #[test]
    fn header_prefers_tag_title() {
        let untitled = SpecialBlock {
            kind: SpecialKind::ActionBox,
            title: None,
            raw_lines: Vec::new(),
            fields: None,
        };
        let titled = SpecialBlock {
            title: Some("Try This".into()),
            ..untitled.clone()
        };
        assert_eq!(untitled.header(), "Action Box");
        assert_eq!(titled.header(), "Try This");
    }
}
