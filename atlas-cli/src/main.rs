//! Command-line interface for Atlas analysis documents.
//! This binary renders generated book analyses into the supported targets
//! and runs the pre-publish checks on them.
//!
//! Usage:
//!   atlas render `<path>` --target `<name>` [-o `<file>`]  - Render a document to one target
//!   atlas validate `<path>` [--json]                   - Check that callout markers are balanced
//!   atlas audit `<path>` [--json]                      - Score a document against the publishing bar
//!   atlas targets                                    - List available render targets
mod report;

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};

use atlas_config::{AtlasConfig, Loader};
use atlas_export::{
    publish, ImageCache, MetaValue, PageGeometry, PublishArtifact, PublishSpec, RenderOptions,
    TargetRegistry, Theme,
};
use atlas_markup::{audit, validate, AuditLimits};

fn main() {
    init_tracing();

    let matches = Command::new("atlas")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for rendering and checking Atlas analysis documents")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("render")
                .about("Render a document to one target")
                .arg(
                    Arg::new("path")
                        .help("Path to the markup document")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .short('t')
                        .help("Render target name (see `atlas targets`)")
                        .default_value("html"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file; binary targets require one"),
                )
                .arg(
                    Arg::new("title")
                        .long("title")
                        .help("Book or chapter title for covers and document properties"),
                )
                .arg(
                    Arg::new("author")
                        .long("author")
                        .help("Author line for covers and document properties"),
                )
                .arg(
                    Arg::new("logo")
                        .long("logo")
                        .help("Path to a logo image shown on covers and headers"),
                )
                .arg(
                    Arg::new("meta")
                        .long("meta")
                        .value_name("KEY=VALUE")
                        .help("Extra metadata entry; may be given several times")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("no-cover")
                        .long("no-cover")
                        .help("Skip the cover page and header")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-toc")
                        .long("no-toc")
                        .help("Skip the table of contents")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-page-numbers")
                        .long("no-page-numbers")
                        .help("Skip page numbers on paginated output")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("page-size")
                        .long("page-size")
                        .help("Page size: letter, a4 or mobile"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("Configuration file layered over the built-in defaults"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check that callout markers are balanced; exits non-zero on findings")
                .arg(
                    Arg::new("path")
                        .help("Path to the markup document")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Emit the report as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("audit")
                .about("Score a document against the publishing bar; exits non-zero on a failing score")
                .arg(
                    Arg::new("path")
                        .help("Path to the markup document")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Emit the report as JSON")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("Configuration file layered over the built-in defaults"),
                ),
        )
        .subcommand(Command::new("targets").about("List available render targets"))
        .get_matches();

    match matches.subcommand() {
        Some(("render", render_matches)) => handle_render_command(render_matches),
        Some(("validate", validate_matches)) => handle_validate_command(validate_matches),
        Some(("audit", audit_matches)) => handle_audit_command(audit_matches),
        Some(("targets", _)) => handle_targets_command(),
        _ => unreachable!(),
    }
}

/// Install the stderr subscriber. `RUST_LOG` overrides the default filter,
/// so `RUST_LOG=atlas_export=debug atlas render ...` shows the publish phases.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Handle the render command
fn handle_render_command(matches: &ArgMatches) {
    let path = matches.get_one::<String>("path").unwrap();
    let source = read_source(path);
    let config = load_config(
        matches.get_one::<String>("config"),
        matches.get_one::<String>("page-size"),
    );
    let options = build_options(&config, matches);

    let target = matches.get_one::<String>("target").unwrap();
    let output = matches.get_one::<String>("output").map(PathBuf::from);

    let mut spec = PublishSpec::new(&source, target).options(options);
    if let Some(output) = output.as_deref() {
        spec = spec.output(output);
    }

    let registry = TargetRegistry::with_defaults();
    match publish(&registry, spec) {
        Ok(result) => match result.artifact {
            PublishArtifact::InMemory(text) => print!("{}", text),
            PublishArtifact::File(written) => {
                println!("Wrote {} ({} bytes)", written.display(), result.size)
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Hint: {}", e.recovery_hint());
            std::process::exit(1);
        }
    }
}

/// Handle the validate command
fn handle_validate_command(matches: &ArgMatches) {
    let path = matches.get_one::<String>("path").unwrap();
    let source = read_source(path);
    let report = validate(&source);

    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
            eprintln!("Error formatting JSON: {}", e);
            std::process::exit(1);
        });
        println!("{}", json);
    } else {
        print!("{}", report::validation_findings(&source, &report));
    }

    if !report.is_valid {
        std::process::exit(1);
    }
}

/// Handle the audit command
fn handle_audit_command(matches: &ArgMatches) {
    let path = matches.get_one::<String>("path").unwrap();
    let source = read_source(path);
    let config = load_config(matches.get_one::<String>("config"), None);
    let limits = AuditLimits {
        min_words: config.audit.min_words,
        max_words: config.audit.max_words,
        pass_threshold: config.audit.pass_threshold,
    };
    let report = audit(&source, &limits);

    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
            eprintln!("Error formatting JSON: {}", e);
            std::process::exit(1);
        });
        println!("{}", json);
    } else {
        print!("{}", report::audit_table(&report, &limits));
    }

    if !report.passed {
        std::process::exit(1);
    }
}

/// Handle the targets command
fn handle_targets_command() {
    let registry = TargetRegistry::with_defaults();
    println!("Available render targets:\n");

    for name in registry.list_targets() {
        if let Ok(target) = registry.get(&name) {
            println!("  {} (.{})", target.name(), target.extension());
            println!("    {}", target.description());
            println!();
        }
    }
}

fn read_source(path: &str) -> String {
    let source = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading '{}': {}", path, e);
        std::process::exit(1);
    });
    tracing::debug!(path = %path, bytes = source.len(), "document loaded");
    source
}

/// Layer the embedded defaults, the optional user file and the page-size
/// override into one configuration.
fn load_config(file: Option<&String>, page_size: Option<&String>) -> AtlasConfig {
    let mut loader = Loader::new();
    if let Some(file) = file {
        loader = loader.with_file(file);
    }
    if let Some(size) = page_size {
        loader = loader
            .set_override("page.size", size.as_str())
            .unwrap_or_else(|e| {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            });
    }
    loader.build().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    })
}

/// Combine the loaded configuration with the render flags.
fn build_options(config: &AtlasConfig, matches: &ArgMatches) -> RenderOptions {
    let (width, height) = config.page.size.dimensions();
    let mut options = RenderOptions {
        include_cover_page: !matches.get_flag("no-cover"),
        include_toc: !matches.get_flag("no-toc"),
        include_page_numbers: !matches.get_flag("no-page-numbers"),
        words_per_minute: config.reading.words_per_minute as u32,
        theme: Theme {
            gold: config.brand.gold.clone(),
            burgundy: config.brand.burgundy.clone(),
            coral: config.brand.coral.clone(),
            brand_line: config.brand.brand_line.clone(),
        },
        page: PageGeometry::new(width, height, config.page.margin),
        ..RenderOptions::default()
    };

    if let Some(title) = matches.get_one::<String>("title") {
        options = options.with_title(title);
    }
    if let Some(author) = matches.get_one::<String>("author") {
        options = options.with_author(author);
    }
    if let Some(logo) = matches.get_one::<String>("logo") {
        options = options.with_logo(load_logo(logo));
    }
    for entry in matches.get_many::<String>("meta").unwrap_or_default() {
        match entry.split_once('=') {
            Some((key, value)) => {
                options = options.with_metadata(key, MetaValue::String(value.to_string()));
            }
            None => {
                eprintln!("Error: metadata entry '{}' is not KEY=VALUE", entry);
                std::process::exit(1);
            }
        }
    }
    options
}

fn load_logo(path: &str) -> Vec<u8> {
    let mut images = ImageCache::new(4);
    match images.load(Path::new(path)) {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            eprintln!("Error reading logo '{}': {}", path, e);
            std::process::exit(1);
        }
    }
}
