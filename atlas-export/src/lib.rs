//! Render targets and the publish pipeline for analysis documents
//!
//! This crate turns parsed analysis markup (see `atlas-markup`) into
//! deliverable artifacts. Five targets share one document model:
//!
//! ```text
//! - html    styled standalone hypertext document
//! - pages   paginated page model, serialized as JSON
//! - docx    word-processor package (zip container)
//! - markup  the source markup echoed unchanged
//! - text    plain flattened text
//! ```
//!
//! Architecture
//!
//! ```text
//! - RenderTarget trait: uniform interface over the targets (name,
//!   extension, binary flag, render)
//! - TargetRegistry: discovery and selection by name; front ends build
//!   one registry per run, nothing is process-global
//! - publish(): the prepare/convert/write pipeline with atomic file
//!   output and the paginated fallback
//!
//! This is a pure library. It never installs a tracing subscriber,
//! reads environment variables or prints; the CLI owns all of that.
//!
//! The file structure:
//! .
//! ├── error.rs        # ExportError taxonomy
//! ├── meta.rs         # MetaValue metadata tree
//! ├── media.rs        # ImageCache and image sniffing
//! ├── options.rs      # RenderOptions, Theme, PageGeometry
//! ├── target.rs       # RenderTarget trait and Artifact
//! ├── registry.rs     # TargetRegistry
//! ├── publish.rs      # publish pipeline
//! └── targets
//!     ├── html.rs
//!     ├── pages.rs
//!     ├── package.rs
//!     ├── markup.rs
//!     └── text.rs
//! ```
//!
//! Rendering is pure: the same document and options always produce the
//! same artifact, and no target mutates shared state. A failure in one
//! target never affects another.

pub mod error;
pub mod media;
pub mod meta;
pub mod options;
pub mod publish;
pub mod registry;
pub mod target;
pub mod targets;

pub use error::{ExportError, ExportResult};
pub use media::{sniff_image_mime, ImageCache};
pub use meta::MetaValue;
pub use options::{PageGeometry, RenderOptions, Theme};
pub use publish::{publish, PublishArtifact, PublishResult, PublishSpec};
pub use registry::TargetRegistry;
pub use target::{Artifact, RenderInput, RenderTarget};

/// Render `source` with the named target, using a registry of the built-in
/// targets. Callers with custom targets or many documents should build a
/// [`TargetRegistry`] themselves and render through it.
pub fn render(source: &str, target: &str, options: &RenderOptions) -> ExportResult<Artifact> {
    TargetRegistry::with_defaults().render(target, source, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convenience_render_reaches_every_builtin_target() {
        let source = "# Title\n\nBody text.\n";
        let options = RenderOptions::default();
        for target in ["html", "pages", "docx", "markup", "text"] {
            let artifact = render(source, target, &options).unwrap();
            assert!(!artifact.is_empty(), "empty artifact from {target}");
        }
    }

    #[test]
    fn convenience_render_reports_unknown_targets() {
        let err = render("Body.\n", "pdf", &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::UnknownTarget { .. }));
    }
}
