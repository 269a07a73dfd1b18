//! Block parser
//!
//! Consumes classified lines with an explicit state machine and produces the
//! ordered block sequence. The parser never fails: malformed input degrades
//! to over- or under-segmented blocks, and every content line lands in some
//! block.
//!
//! Callout regions are tracked on an explicit stack. Close tags pop by stack
//! position, not by name (the lenient behavior the dialect's producers rely
//! on), and anything still open at end of input is flushed with whatever it
//! collected.

use crate::ast::{Block, Document, SpecialBlock, SpecialKind};
use crate::extract;
use crate::inline::parse_inline;
use crate::line::{classify_line, LineKind};

/// Side records from a parse: what had to be repaired. An input is balanced
/// exactly when both lists are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseTrace {
    /// Kinds of callouts that were still open at end of input, innermost
    /// first.
    pub synthetic_flushes: Vec<SpecialKind>,
    /// `(line_number, raw_text)` of close tags seen with nothing open.
    /// Line numbers are 1-based.
    pub unmatched_closes: Vec<(usize, String)>,
}

impl ParseTrace {
    pub fn is_balanced(&self) -> bool {
        self.synthetic_flushes.is_empty() && self.unmatched_closes.is_empty()
    }
}

/// Parse markup into a document, discarding the repair trace.
pub fn parse(text: &str) -> Document {
    parse_with_trace(text).0
}

/// Parse markup into a document plus the trace of repairs made.
pub fn parse_with_trace(text: &str) -> (Document, ParseTrace) {
    let mut parser = Parser::new();
    for (index, line) in text.lines().enumerate() {
        parser.step(index + 1, line);
    }
    parser.finish()
}

enum State {
    /// No multi-line block in progress; `paragraph` holds accumulated
    /// paragraph text (empty when idle).
    Normal { paragraph: String },
    InCodeBlock,
    InTable { rows: Vec<Vec<String>> },
    InBlockquote { lines: Vec<String> },
    InList(ListBuilder),
}

struct ListBuilder {
    ordered: bool,
    items: Vec<String>,
    current: Option<String>,
}

impl ListBuilder {
    fn new(ordered: bool, first_item: String) -> Self {
        Self {
            ordered,
            items: Vec::new(),
            current: Some(first_item),
        }
    }

    fn flush_item(&mut self) {
        if let Some(item) = self.current.take() {
            self.items.push(item);
        }
    }
}

struct SpecialBuilder {
    kind: SpecialKind,
    title: Option<String>,
    lines: Vec<String>,
}

struct Parser {
    blocks: Vec<Block>,
    state: State,
    specials: Vec<SpecialBuilder>,
    heading_seq: usize,
    trace: ParseTrace,
}

impl Parser {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            state: State::Normal {
                paragraph: String::new(),
            },
            specials: Vec::new(),
            heading_seq: 0,
            trace: ParseTrace::default(),
        }
    }

    fn step(&mut self, line_number: usize, line: &str) {
        // Fenced code swallows everything, tags included, until the next
        // fence.
        if matches!(self.state, State::InCodeBlock) {
            if matches!(classify_line(line), LineKind::CodeFence) {
                self.state = State::Normal {
                    paragraph: String::new(),
                };
            }
            return;
        }

        // Inside a callout nothing is interpreted except open and close
        // tags; every other line is literal content of the innermost region.
        if !self.specials.is_empty() {
            match classify_line(line) {
                LineKind::SpecialOpen { kind, title } => {
                    // The open line stays visible as content of the outer
                    // region, and the new region still joins the stack so
                    // close tags pop in LIFO order.
                    self.push_special_line(line);
                    self.specials.push(SpecialBuilder {
                        kind,
                        title,
                        lines: Vec::new(),
                    });
                }
                LineKind::SpecialClose { .. } => self.close_innermost_special(),
                _ => self.push_special_line(line),
            }
            return;
        }

        match classify_line(line) {
            LineKind::CodeFence => {
                self.flush_state();
                self.state = State::InCodeBlock;
            }
            LineKind::SpecialOpen { kind, title } => {
                self.flush_state();
                self.specials.push(SpecialBuilder {
                    kind,
                    title,
                    lines: Vec::new(),
                });
            }
            LineKind::SpecialClose { .. } => {
                self.trace
                    .unmatched_closes
                    .push((line_number, line.trim().to_string()));
            }
            LineKind::Rule => {
                self.flush_state();
                self.blocks.push(Block::Rule);
            }
            LineKind::TableRow { cells } => self.take_table_row(cells),
            LineKind::Quote { text } => self.take_quote_line(text),
            LineKind::Heading { level, text } => {
                self.flush_state();
                let anchor_id = format!("section-{}", self.heading_seq);
                self.heading_seq += 1;
                self.blocks.push(Block::Heading {
                    level,
                    text,
                    anchor_id,
                });
            }
            LineKind::UnorderedItem { text } => self.take_list_item(false, text),
            LineKind::OrderedItem { text } => self.take_list_item(true, text),
            LineKind::Blank => self.take_blank(),
            LineKind::Text => self.take_text(line.trim()),
        }
    }

    fn take_table_row(&mut self, cells: Vec<String>) {
        if is_separator_row(&cells) {
            // Header/body separators are layout, not data.
            if !matches!(self.state, State::InTable { .. }) {
                self.flush_state();
                self.state = State::InTable { rows: Vec::new() };
            }
            return;
        }
        match &mut self.state {
            State::InTable { rows } => rows.push(cells),
            _ => {
                self.flush_state();
                self.state = State::InTable { rows: vec![cells] };
            }
        }
    }

    fn take_quote_line(&mut self, text: String) {
        match &mut self.state {
            State::InBlockquote { lines } => lines.push(text),
            _ => {
                self.flush_state();
                self.state = State::InBlockquote { lines: vec![text] };
            }
        }
    }

    fn take_list_item(&mut self, ordered: bool, text: String) {
        match &mut self.state {
            State::InList(list) if list.ordered == ordered => {
                list.flush_item();
                list.current = Some(text);
            }
            _ => {
                // Switching between bullet and numbered starts a new list.
                self.flush_state();
                self.state = State::InList(ListBuilder::new(ordered, text));
            }
        }
    }

    fn take_blank(&mut self) {
        match &mut self.state {
            // A blank inside a list closes the item, not the list.
            State::InList(list) => list.flush_item(),
            _ => self.flush_state(),
        }
    }

    fn take_text(&mut self, text: &str) {
        match &mut self.state {
            State::InList(list) => match &mut list.current {
                // Directly after an item line, plain text continues the item.
                Some(current) => {
                    current.push(' ');
                    current.push_str(text);
                }
                // After a blank the list is over; the line starts a paragraph.
                None => {
                    self.flush_state();
                    self.state = State::Normal {
                        paragraph: text.to_string(),
                    };
                }
            },
            State::Normal { paragraph } if !paragraph.is_empty() => {
                if continues_paragraph(paragraph, text) {
                    paragraph.push(' ');
                    paragraph.push_str(text);
                } else {
                    let finished = std::mem::take(paragraph);
                    self.emit_paragraph(finished);
                    self.state = State::Normal {
                        paragraph: text.to_string(),
                    };
                }
            }
            _ => {
                self.flush_state();
                self.state = State::Normal {
                    paragraph: text.to_string(),
                };
            }
        }
    }

    fn push_special_line(&mut self, line: &str) {
        if let Some(builder) = self.specials.last_mut() {
            builder.lines.push(line.trim_end().to_string());
        }
    }

    fn close_innermost_special(&mut self) {
        if let Some(builder) = self.specials.pop() {
            self.emit_special(builder);
        }
    }

    fn emit_special(&mut self, builder: SpecialBuilder) {
        let fields = extract::structured_fields(builder.kind, &builder.lines);
        self.blocks.push(Block::Special(SpecialBlock {
            kind: builder.kind,
            title: builder.title,
            raw_lines: builder.lines,
            fields,
        }));
    }

    fn emit_paragraph(&mut self, text: String) {
        if !text.is_empty() {
            self.blocks.push(Block::Paragraph {
                runs: parse_inline(&text),
            });
        }
    }

    /// Close whatever multi-line block is in progress. Callout regions are
    /// not touched; only close tags and end of input finish those.
    fn flush_state(&mut self) {
        let state = std::mem::replace(
            &mut self.state,
            State::Normal {
                paragraph: String::new(),
            },
        );
        match state {
            State::Normal { paragraph } => self.emit_paragraph(paragraph),
            State::InCodeBlock => {}
            State::InTable { rows } => {
                if !rows.is_empty() {
                    self.blocks.push(Block::Table { rows });
                }
            }
            State::InBlockquote { lines } => {
                if !lines.is_empty() {
                    self.blocks.push(Block::Blockquote { lines });
                }
            }
            State::InList(mut list) => {
                list.flush_item();
                if !list.items.is_empty() {
                    self.blocks.push(Block::List {
                        ordered: list.ordered,
                        items: list
                            .items
                            .iter()
                            .map(|item| parse_inline(item))
                            .collect(),
                    });
                }
            }
        }
    }

    fn finish(mut self) -> (Document, ParseTrace) {
        self.flush_state();
        // Unterminated callouts still become blocks; dropping their text is
        // never an option.
        while let Some(builder) = self.specials.pop() {
            self.trace.synthetic_flushes.push(builder.kind);
            self.emit_special(builder);
        }
        (Document::new(self.blocks), self.trace)
    }
}

/// True for header/body separator rows like `| --- | --- |`: every trimmed
/// cell is non-empty, shorter than 5 chars, and at least half dashes.
/// Renderers that re-walk table-shaped lines inside callouts use the same
/// test so a separator never shows up as data anywhere.
pub fn is_separator_row(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|cell| {
            let trimmed = cell.trim();
            let total = trimmed.chars().count();
            if trimmed.is_empty() || total >= 5 {
                return false;
            }
            let dashes = trimmed.chars().filter(|&ch| ch == '-').count();
            dashes * 2 >= total
        })
}

/// A text line continues the open paragraph when it starts lowercase or the
/// accumulated text does not yet end a sentence.
fn continues_paragraph(accumulated: &str, next: &str) -> bool {
    let starts_lower = next
        .chars()
        .next()
        .map(|ch| ch.is_lowercase())
        .unwrap_or(false);
    let ends_terminal = accumulated
        .trim_end()
        .chars()
        .last()
        .map(|ch| matches!(ch, '.' | '!' | '?' | ':'))
        .unwrap_or(false);
    starts_lower || !ends_terminal
}
