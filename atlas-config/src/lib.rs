//! Shared configuration loader for the Atlas toolchain.
//!
//! `defaults/atlas.default.toml` is embedded into every binary so defaults
//! and documentation cannot drift apart. Applications layer user files and
//! CLI overrides on top via [`Loader`] before deserializing into
//! [`AtlasConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/atlas.default.toml");

/// Top-level configuration consumed by Atlas applications.
#[derive(Debug, Clone, Deserialize)]
pub struct AtlasConfig {
    pub page: PageConfig,
    pub brand: BrandConfig,
    pub reading: ReadingConfig,
    pub audit: AuditConfig,
}

/// Page geometry for the paginated target.
#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    pub size: PageSize,
    /// Margin in points, all four sides.
    pub margin: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageSize {
    Letter,
    A4,
    Mobile,
}

impl PageSize {
    /// `(width, height)` in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.0, 842.0),
            PageSize::Mobile => (390.0, 844.0),
        }
    }
}

/// Brand palette and wordmark shared by every styled target.
#[derive(Debug, Clone, Deserialize)]
pub struct BrandConfig {
    pub gold: String,
    pub burgundy: String,
    pub coral: String,
    pub brand_line: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadingConfig {
    pub words_per_minute: usize,
}

/// Thresholds for the document audit.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    pub min_words: usize,
    pub max_words: usize,
    pub pass_threshold: f64,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI flags).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<AtlasConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<AtlasConfig, ConfigError> {
    Loader::new().build()
}
