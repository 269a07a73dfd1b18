//! End-to-end publish runs against a temporary directory.

use atlas_export::{publish, PublishArtifact, PublishSpec, RenderOptions, TargetRegistry};
use tempfile::tempdir;

const SOURCE: &str = "# Title\n\nA paragraph of body text.\n";

#[test]
fn one_document_publishes_to_several_targets_side_by_side() {
    let dir = tempdir().unwrap();
    let registry = TargetRegistry::with_defaults();

    for (target, file_name) in [
        ("html", "analysis.html"),
        ("text", "analysis.txt"),
        ("docx", "analysis.docx"),
    ] {
        let path = dir.path().join(file_name);
        let result = publish(&registry, PublishSpec::new(SOURCE, target).output(&path)).unwrap();
        assert_eq!(result.artifact, PublishArtifact::File(path.clone()));
        assert_eq!(result.size, std::fs::metadata(&path).unwrap().len() as usize);
    }

    let html = std::fs::read_to_string(dir.path().join("analysis.html")).unwrap();
    assert!(html.contains("<!DOCTYPE html>"));
    let docx = std::fs::read(dir.path().join("analysis.docx")).unwrap();
    assert_eq!(&docx[..2], b"PK");
    // The three artifacts are the only entries; nothing temporary remains.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
}

#[test]
fn republishing_replaces_the_artifact_in_place() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("analysis.txt");
    let registry = TargetRegistry::with_defaults();

    publish(&registry, PublishSpec::new("First version.\n", "text").output(&path)).unwrap();
    publish(&registry, PublishSpec::new("Second version.\n", "text").output(&path)).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("Second version."));
    assert!(!written.contains("First version."));
}

#[test]
fn options_flow_through_to_the_written_artifact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("analysis.html");
    let registry = TargetRegistry::with_defaults();
    let options = RenderOptions::default()
        .with_title("Deep Work")
        .with_author("Cal Newport");

    let spec = PublishSpec::new(SOURCE, "html").options(options).output(&path);
    publish(&registry, spec).unwrap();

    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("<title>Deep Work</title>"));
    assert!(html.contains("by Cal Newport"));
}
