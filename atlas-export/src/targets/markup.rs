//! Plain markup target
//!
//! The document's native form is already markup, so this target echoes the
//! source text unchanged. It exists so that "save as markup" goes through
//! the same registry and publish pipeline as every other export.

use crate::error::ExportResult;
use crate::options::RenderOptions;
use crate::target::{Artifact, RenderInput, RenderTarget};

pub struct PlainMarkupTarget;

impl RenderTarget for PlainMarkupTarget {
    fn name(&self) -> &str {
        "markup"
    }

    fn description(&self) -> &str {
        "Source markup, unchanged"
    }

    fn extension(&self) -> &str {
        "md"
    }

    fn render(&self, input: &RenderInput<'_>, _options: &RenderOptions) -> ExportResult<Artifact> {
        Ok(Artifact::Text(input.source.to_string()))
    }
}
