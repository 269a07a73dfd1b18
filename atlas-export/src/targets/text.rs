//! Plain text target
//!
//! Flattens the document to unstyled text: one chunk per block, blank lines
//! between chunks, inline emphasis markers removed. Callouts come out as
//! their header line followed by their collected content.

use atlas_markup::{parse_inline, Block, InlineRun};

use crate::error::ExportResult;
use crate::options::RenderOptions;
use crate::target::{Artifact, RenderInput, RenderTarget};

pub struct PlainTextTarget;

impl RenderTarget for PlainTextTarget {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "Unstyled flattened text"
    }

    fn extension(&self) -> &str {
        "txt"
    }

    fn render(&self, input: &RenderInput<'_>, _options: &RenderOptions) -> ExportResult<Artifact> {
        let mut chunks: Vec<String> = Vec::new();
        for block in input.document.iter() {
            match block {
                Block::Heading { text, .. } => chunks.push(strip_markers(text)),
                Block::Paragraph { runs } => chunks.push(visible(runs)),
                Block::List { ordered, items } => {
                    let lines: Vec<String> = items
                        .iter()
                        .enumerate()
                        .map(|(index, item)| {
                            if *ordered {
                                format!("{}. {}", index + 1, visible(item))
                            } else {
                                format!("\u{2022} {}", visible(item))
                            }
                        })
                        .collect();
                    chunks.push(lines.join("\n"));
                }
                Block::Table { rows } => {
                    let lines: Vec<String> = rows
                        .iter()
                        .map(|row| {
                            row.iter()
                                .map(|cell| strip_markers(cell))
                                .collect::<Vec<_>>()
                                .join("\t")
                        })
                        .collect();
                    chunks.push(lines.join("\n"));
                }
                Block::Blockquote { lines } => {
                    let quoted: Vec<String> = lines
                        .iter()
                        .map(|line| format!("> {}", strip_markers(line)))
                        .collect();
                    chunks.push(quoted.join("\n"));
                }
                Block::Rule => chunks.push("* * *".to_string()),
                Block::Special(special) => {
                    let mut lines = vec![special.header().to_string()];
                    for line in &special.raw_lines {
                        if !line.trim().is_empty() {
                            lines.push(strip_markers(line));
                        }
                    }
                    chunks.push(lines.join("\n"));
                }
            }
        }
        let mut text = chunks.join("\n\n");
        if !text.is_empty() {
            text.push('\n');
        }
        Ok(Artifact::Text(text))
    }
}

fn visible(runs: &[InlineRun]) -> String {
    runs.iter().map(|run| run.visible_text()).collect()
}

fn strip_markers(line: &str) -> String {
    visible(&parse_inline(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_markup::parse;

    fn flatten(source: &str) -> String {
        let document = parse(source);
        let input = RenderInput {
            source,
            document: &document,
        };
        match PlainTextTarget
            .render(&input, &RenderOptions::default())
            .unwrap()
        {
            Artifact::Text(text) => text,
            Artifact::Binary(_) => panic!("expected text artifact"),
        }
    }

    #[test]
    fn strips_inline_markers_from_paragraphs() {
        let text = flatten("This is **bold** and *quiet* and `code`.\n");
        assert_eq!(text, "This is bold and quiet and code.\n");
    }

    #[test]
    fn numbers_ordered_items_and_bullets_unordered_ones() {
        let text = flatten("1. first\n2. second\n\n- alpha\n- beta\n");
        assert!(text.contains("1. first"));
        assert!(text.contains("2. second"));
        assert!(text.contains("\u{2022} alpha"));
    }

    #[test]
    fn table_rows_become_tab_separated_lines() {
        let text = flatten("| Model | Year |\n| --- | --- |\n| GTD | 2001 |\n");
        assert!(text.contains("Model\tYear"));
        assert!(text.contains("GTD\t2001"));
        // The separator row never appears.
        assert!(!text.contains("---"));
    }

    #[test]
    fn callouts_keep_their_header_and_lines() {
        let text = flatten("[ACTION_BOX: Try This]\nDo the thing today.\n[/ACTION_BOX]\n");
        assert!(text.contains("Try This"));
        assert!(text.contains("Do the thing today."));
        assert!(!text.contains("[ACTION_BOX"));
    }

    #[test]
    fn links_keep_their_label_only() {
        let text = flatten("Read [the paper](https://example.com/p) now.\n");
        assert_eq!(text, "Read the paper now.\n");
    }
}
