use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

const ANALYSIS: &str = "\
# Deep Work

## At a Glance

[QUICK_GLANCE]
- Focus is a superpower in a distracted economy.
- Shallow work keeps you busy, deep work moves you forward.
[/QUICK_GLANCE]

[INSIGHT_NOTE]
Core Insight: Depth produces value that shallow effort cannot.
Key Distinction: Busyness is not productivity.
[/INSIGHT_NOTE]

[ACTION_BOX]
Schedule one ninety-minute deep block tomorrow morning.
[/ACTION_BOX]

[TAKEAWAYS]
1. Protect long unbroken blocks of attention.
2. Embrace boredom instead of reaching for the phone.
[/TAKEAWAYS]

[EXERCISE]
Track where your attention goes for one full day.
[/EXERCISE]
";

fn write_fixture(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn render_writes_a_hypertext_file() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_fixture(&dir, "analysis.md", ANALYSIS);
    let out = dir.path().join("analysis.html");

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("render")
        .arg(&doc)
        .arg("--target")
        .arg("html")
        .arg("-o")
        .arg(&out)
        .arg("--title")
        .arg("Deep Work")
        .arg("--author")
        .arg("Cal Newport");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let html = fs::read_to_string(&out).unwrap();
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("<title>Deep Work</title>"));
    assert!(html.contains("by Cal Newport"));
}

#[test]
fn render_prints_text_to_stdout_without_an_output_path() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_fixture(&dir, "analysis.md", ANALYSIS);

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("render").arg(&doc).arg("--target").arg("text");
    cmd.assert().success().stdout(
        predicate::str::contains("Deep Work")
            .and(predicate::str::contains("Focus is a superpower")),
    );
}

#[test]
fn unknown_target_is_refused_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_fixture(&dir, "analysis.md", ANALYSIS);

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("render").arg(&doc).arg("--target").arg("pdf");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown render target 'pdf'"));
}

#[test]
fn package_target_demands_an_output_path() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_fixture(&dir, "analysis.md", ANALYSIS);

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("render").arg(&doc).arg("--target").arg("docx");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("needs an output path"));
}

#[test]
fn package_render_produces_an_archive() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_fixture(&dir, "analysis.md", ANALYSIS);
    let out = dir.path().join("analysis.docx");

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("render")
        .arg(&doc)
        .arg("--target")
        .arg("docx")
        .arg("-o")
        .arg(&out);
    cmd.assert().success();

    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn page_size_flag_reaches_the_paginated_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_fixture(&dir, "analysis.md", ANALYSIS);

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("render")
        .arg(&doc)
        .arg("--target")
        .arg("pages")
        .arg("--page-size")
        .arg("mobile");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"width\": 390.0"));
}

#[test]
fn config_file_changes_the_brand_line() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_fixture(&dir, "analysis.md", ANALYSIS);
    let config = write_fixture(&dir, "atlas.toml", "[brand]\nbrand_line = \"NIGHT OWL PRESS\"\n");

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("render").arg(&doc).arg("--config").arg(&config);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("NIGHT OWL PRESS"));
}

#[test]
fn no_cover_drops_the_brand_header() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_fixture(&dir, "analysis.md", ANALYSIS);

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("render").arg(&doc).arg("--no-cover");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("INSIGHT ATLAS").not());
}

#[test]
fn logo_is_embedded_as_a_data_uri() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_fixture(&dir, "analysis.md", ANALYSIS);
    let logo = dir.path().join("logo.png");
    fs::write(&logo, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("render").arg(&doc).arg("--logo").arg(&logo);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("data:image/png;base64,"));
}

#[test]
fn meta_entries_become_meta_tags() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_fixture(&dir, "analysis.md", ANALYSIS);

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("render")
        .arg(&doc)
        .arg("--meta")
        .arg("isbn=978-3-16")
        .arg("--meta")
        .arg("edition=first");
    cmd.assert().success().stdout(
        predicate::str::contains("<meta name=\"isbn\" content=\"978-3-16\">")
            .and(predicate::str::contains("<meta name=\"edition\" content=\"first\">")),
    );
}

#[test]
fn malformed_meta_entry_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_fixture(&dir, "analysis.md", ANALYSIS);

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("render").arg(&doc).arg("--meta").arg("no-equals-sign");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not KEY=VALUE"));
}

#[test]
fn missing_input_file_reports_the_read_error() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("render").arg(dir.path().join("absent.md"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error reading"));
}

#[test]
fn validate_flags_an_unclosed_block() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write_fixture(&dir, "broken.md", "# Title\n\n[TAKEAWAYS]\n- left open\n");

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("validate").arg(&broken);
    cmd.assert().failure().stdout(
        predicate::str::contains(">>")
            .and(predicate::str::contains("[TAKEAWAYS]"))
            .and(predicate::str::contains("1 marker problem(s) found.")),
    );
}

#[test]
fn validate_json_reports_the_finding_line() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write_fixture(&dir, "broken.md", "# Title\n\n[TAKEAWAYS]\n- left open\n");

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("validate").arg(&broken).arg("--json");
    cmd.assert().failure().stdout(
        predicate::str::contains("\"is_valid\": false")
            .and(predicate::str::contains("\"line_number\": 3")),
    );
}

#[test]
fn validate_accepts_a_balanced_document() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_fixture(&dir, "analysis.md", ANALYSIS);

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("validate").arg(&doc);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No marker problems found."));
}

#[test]
fn audit_passes_with_relaxed_word_limits() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_fixture(&dir, "analysis.md", ANALYSIS);
    let relaxed = write_fixture(&dir, "relaxed.toml", "[audit]\nmin_words = 1\n");

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("audit").arg(&doc).arg("--config").arg(&relaxed);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("PASSED"));
}

#[test]
fn audit_fails_a_thin_document_and_names_the_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let thin = write_fixture(&dir, "thin.md", "just a few plain words\n");

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("audit").arg(&thin);
    cmd.assert().failure().stdout(
        predicate::str::contains("FAIL required-sections")
            .and(predicate::str::contains("FAILED")),
    );
}

#[test]
fn audit_json_emits_the_score() {
    let dir = tempfile::tempdir().unwrap();
    let thin = write_fixture(&dir, "thin.md", "just a few plain words\n");

    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("audit").arg(&thin).arg("--json");
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("\"score\""));
}

#[test]
fn targets_lists_the_builtin_names() {
    let mut cmd = cargo_bin_cmd!("atlas");
    cmd.arg("targets");
    cmd.assert().success().stdout(
        predicate::str::contains("html")
            .and(predicate::str::contains("pages"))
            .and(predicate::str::contains("docx"))
            .and(predicate::str::contains("markup"))
            .and(predicate::str::contains("text")),
    );
}
