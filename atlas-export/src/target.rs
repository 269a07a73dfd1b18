//! Render target trait definition
//!
//! Every output format implements `RenderTarget`. The trait gives the
//! registry a uniform interface: a name to look the target up by, enough
//! metadata to pick file extensions and output handling, and the render
//! entry point itself.

use atlas_markup::Document;

use crate::error::ExportResult;
use crate::options::RenderOptions;

/// The finished product of a render call.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Text(String),
    Binary(Vec<u8>),
}

impl Artifact {
    /// Artifact bytes regardless of kind.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Artifact::Text(text) => text.as_bytes(),
            Artifact::Binary(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Artifact::Text(text) => text.into_bytes(),
            Artifact::Binary(bytes) => bytes,
        }
    }

    /// Text content, if this is a text artifact.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Artifact::Text(text) => Some(text),
            Artifact::Binary(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// Input handed to a target: the raw text and the parsed document.
///
/// Both views are provided because targets differ in what they consume.
/// The plain markup target echoes the raw text; everything else walks the
/// block tree.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub source: &'a str,
    pub document: &'a Document,
}

/// Trait for output formats
///
/// Implementors convert a parsed analysis document into one artifact.
/// Rendering never mutates the document; the same input may be rendered
/// by several targets in sequence.
pub trait RenderTarget: Send + Sync {
    /// The registry name of this target (e.g., "html", "pages", "docx")
    fn name(&self) -> &str;

    /// One-line description shown by target listings
    fn description(&self) -> &str {
        ""
    }

    /// File extension for artifacts of this target, without the dot
    fn extension(&self) -> &str;

    /// Whether artifacts are binary and therefore need an output path
    fn is_binary(&self) -> bool {
        false
    }

    /// Convert the document into this target's artifact
    fn render(&self, input: &RenderInput<'_>, options: &RenderOptions) -> ExportResult<Artifact>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_bytes_cover_both_kinds() {
        let text = Artifact::Text("hello".to_string());
        assert_eq!(text.as_bytes(), b"hello");
        assert_eq!(text.as_text(), Some("hello"));
        assert_eq!(text.len(), 5);

        let binary = Artifact::Binary(vec![0x50, 0x4B]);
        assert_eq!(binary.as_bytes(), &[0x50, 0x4B]);
        assert!(binary.as_text().is_none());
        assert!(!binary.is_empty());
    }
}
