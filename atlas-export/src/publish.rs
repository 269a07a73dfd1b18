//! Publish pipeline
//!
//! Drives a render through three phases: prepare (target lookup), convert
//! (parse and render), write (deliver the artifact). Text artifacts with no
//! output path come back in memory; anything with a path is written
//! atomically, a named temporary in the destination directory renamed over
//! the final file so a failed write never leaves a torn artifact behind.
//!
//! The paginated target gets a second chance here: when its primary layout
//! fails, the simplified layout runs in its place and the substitution is
//! logged at warn level.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{ExportError, ExportResult};
use crate::options::RenderOptions;
use crate::registry::TargetRegistry;
use crate::target::Artifact;
use crate::targets::pages;

/// What to publish and where. Built incrementally:
///
/// ```ignore
/// let spec = PublishSpec::new(source, "html")
///     .options(options)
///     .output(Path::new("analysis.html"));
/// let result = publish(&registry, spec)?;
/// ```
#[derive(Debug, Clone)]
pub struct PublishSpec<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub output: Option<&'a Path>,
    pub options: RenderOptions,
}

impl<'a> PublishSpec<'a> {
    pub fn new(source: &'a str, target: &'a str) -> Self {
        Self {
            source,
            target,
            output: None,
            options: RenderOptions::default(),
        }
    }

    pub fn output(mut self, path: &'a Path) -> Self {
        self.output = Some(path);
        self
    }

    pub fn options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }
}

/// Where the published artifact ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishArtifact {
    /// Rendered text handed back to the caller
    InMemory(String),
    /// Artifact written to this path
    File(PathBuf),
}

#[derive(Debug)]
pub struct PublishResult {
    pub artifact: PublishArtifact,
    /// Artifact size in bytes, wherever it went.
    pub size: usize,
    /// True when the simplified paginated layout was substituted for the
    /// primary one.
    pub used_fallback: bool,
}

pub fn publish(registry: &TargetRegistry, spec: PublishSpec<'_>) -> ExportResult<PublishResult> {
    let span = tracing::info_span!("publish", target = spec.target);
    let _guard = span.enter();

    {
        let _phase = tracing::debug_span!("prepare").entered();
        registry.get(spec.target)?;
    }

    let (artifact, used_fallback) = {
        let _phase = tracing::debug_span!("convert").entered();
        convert(registry, &spec)?
    };
    let size = artifact.len();

    let delivered = {
        let _phase = tracing::debug_span!("write").entered();
        deliver(artifact, &spec)?
    };

    Ok(PublishResult {
        artifact: delivered,
        size,
        used_fallback,
    })
}

fn convert(registry: &TargetRegistry, spec: &PublishSpec<'_>) -> ExportResult<(Artifact, bool)> {
    match registry.render(spec.target, spec.source, &spec.options) {
        Ok(artifact) => Ok((artifact, false)),
        Err(ExportError::ConversionFailed { target, reason }) if target == "pages" => {
            tracing::warn!(
                reason = %reason,
                "paginated layout failed, substituting the simplified layout"
            );
            Ok((pages::render_basic(spec.source, &spec.options), true))
        }
        Err(err) => Err(err),
    }
}

fn deliver(artifact: Artifact, spec: &PublishSpec<'_>) -> ExportResult<PublishArtifact> {
    match (artifact, spec.output) {
        (artifact, Some(path)) => {
            write_atomic(path, artifact.as_bytes())?;
            tracing::debug!(path = %path.display(), "artifact written");
            Ok(PublishArtifact::File(path.to_path_buf()))
        }
        (Artifact::Text(text), None) => Ok(PublishArtifact::InMemory(text)),
        (Artifact::Binary(_), None) => Err(ExportError::OutputPathRequired {
            target: spec.target.to_string(),
        }),
    }
}

/// Write through a named temporary in the destination directory, then
/// rename over the final path. The temporary is removed on drop, so an
/// error on any step leaves nothing behind.
fn write_atomic(path: &Path, bytes: &[u8]) -> ExportResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let failed = |source: std::io::Error| ExportError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(failed)?;
    temp.write_all(bytes).map_err(failed)?;
    temp.persist(path).map_err(|err| failed(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn registry() -> TargetRegistry {
        TargetRegistry::with_defaults()
    }

    #[test]
    fn text_target_without_path_comes_back_in_memory() {
        let result = publish(&registry(), PublishSpec::new("# Title\n\nBody.\n", "html")).unwrap();
        match result.artifact {
            PublishArtifact::InMemory(html) => {
                assert!(html.contains("<!DOCTYPE html>"));
                assert_eq!(result.size, html.len());
            }
            other => panic!("expected in-memory artifact, got {other:?}"),
        }
        assert!(!result.used_fallback);
    }

    #[test]
    fn output_path_gets_the_artifact_and_nothing_else() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analysis.txt");
        let spec = PublishSpec::new("Plain body text.\n", "text").output(&path);
        let result = publish(&registry(), spec).unwrap();

        assert_eq!(result.artifact, PublishArtifact::File(path.clone()));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Plain body text."));
        // No temporary files were left next to the artifact.
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn binary_target_demands_a_path() {
        let err = publish(&registry(), PublishSpec::new("Body.\n", "docx")).unwrap_err();
        match err {
            ExportError::OutputPathRequired { target } => assert_eq!(target, "docx"),
            other => panic!("expected OutputPathRequired, got {other:?}"),
        }
    }

    #[test]
    fn package_writes_a_zip_container() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analysis.docx");
        let spec = PublishSpec::new("# Title\n\nBody.\n", "docx").output(&path);
        publish(&registry(), spec).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], &[0x50, 0x4B, 0x03, 0x04]);
    }

    #[test]
    fn unknown_target_is_reported_by_name() {
        let err = publish(&registry(), PublishSpec::new("Body.\n", "pdf")).unwrap_err();
        match err {
            ExportError::UnknownTarget { name } => assert_eq!(name, "pdf"),
            other => panic!("expected UnknownTarget, got {other:?}"),
        }
    }

    #[test]
    fn blank_source_is_rejected_before_rendering() {
        let err = publish(&registry(), PublishSpec::new("  \n\n", "html")).unwrap_err();
        assert!(matches!(err, ExportError::NoContent));
    }

    #[test]
    fn paginated_failure_falls_back_to_the_simplified_layout() {
        let mut options = RenderOptions::default();
        options.page = crate::options::PageGeometry::new(100.0, 100.0, 60.0);
        let spec = PublishSpec::new("# Title\n\nBody.\n", "pages").options(options);
        let result = publish(&registry(), spec).unwrap();

        assert!(result.used_fallback);
        match result.artifact {
            PublishArtifact::InMemory(json) => {
                let value: serde_json::Value = serde_json::from_str(&json).unwrap();
                assert_eq!(value["geometry"]["width"], 612.0);
            }
            other => panic!("expected in-memory artifact, got {other:?}"),
        }
    }

    #[test]
    fn other_targets_never_borrow_the_fallback() {
        let mut options = RenderOptions::default();
        options.page = crate::options::PageGeometry::new(100.0, 100.0, 60.0);
        // The degenerate geometry only matters to the paginated target.
        let spec = PublishSpec::new("Body.\n", "html").options(options);
        let result = publish(&registry(), spec).unwrap();
        assert!(!result.used_fallback);
    }

    #[test]
    fn missing_parent_directory_is_a_write_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("analysis.txt");
        let spec = PublishSpec::new("Body.\n", "text").output(&path);
        let err = publish(&registry(), spec).unwrap_err();
        match err {
            ExportError::WriteFailed { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("expected WriteFailed, got {other:?}"),
        }
    }
}
