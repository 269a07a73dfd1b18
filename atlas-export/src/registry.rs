//! Target registry for discovery and selection
//!
//! Render targets are looked up by name. Front ends build one registry per
//! conversion run; nothing here is process-global.

use std::collections::HashMap;

use crate::error::{ExportError, ExportResult};
use crate::options::RenderOptions;
use crate::target::{Artifact, RenderInput, RenderTarget};
use crate::targets;

/// Registry of render targets
///
/// # Examples
///
/// ```ignore
/// let registry = TargetRegistry::with_defaults();
/// let artifact = registry.render("html", source, &RenderOptions::default())?;
/// ```
pub struct TargetRegistry {
    targets: HashMap<String, Box<dyn RenderTarget>>,
}

impl TargetRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        TargetRegistry {
            targets: HashMap::new(),
        }
    }

    /// Register a target
    ///
    /// If a target with the same name already exists, it will be replaced.
    pub fn register<T: RenderTarget + 'static>(&mut self, target: T) {
        self.targets
            .insert(target.name().to_string(), Box::new(target));
    }

    /// Get a target by name
    pub fn get(&self, name: &str) -> ExportResult<&dyn RenderTarget> {
        self.targets
            .get(name)
            .map(|t| t.as_ref())
            .ok_or_else(|| ExportError::UnknownTarget {
                name: name.to_string(),
            })
    }

    /// Check if a target exists
    pub fn has(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    /// List all available target names (sorted)
    pub fn list_targets(&self) -> Vec<String> {
        let mut names: Vec<_> = self.targets.keys().cloned().collect();
        names.sort();
        names
    }

    /// Parse the source text and render it with the named target.
    ///
    /// Empty or whitespace-only input is rejected before any target runs,
    /// so every target can assume it has at least one block to work with.
    pub fn render(
        &self,
        name: &str,
        source: &str,
        options: &RenderOptions,
    ) -> ExportResult<Artifact> {
        let target = self.get(name)?;
        if source.trim().is_empty() {
            return Err(ExportError::NoContent);
        }
        let document = atlas_markup::parse(source);
        tracing::debug!(
            target = name,
            blocks = document.blocks.len(),
            words = document.word_count(),
            "document parsed"
        );
        let input = RenderInput {
            source,
            document: &document,
        };
        target.render(&input, options)
    }

    /// Create a registry with the built-in targets
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(targets::html::HypertextTarget);
        registry.register(targets::pages::PaginatedTarget);
        registry.register(targets::package::PackageTarget);
        registry.register(targets::markup::PlainMarkupTarget);
        registry.register(targets::text::PlainTextTarget);

        registry
    }
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestTarget;
    impl RenderTarget for TestTarget {
        fn name(&self) -> &str {
            "test"
        }
        fn description(&self) -> &str {
            "Test target"
        }
        fn extension(&self) -> &str {
            "txt"
        }
        fn render(
            &self,
            input: &RenderInput<'_>,
            _options: &RenderOptions,
        ) -> ExportResult<Artifact> {
            Ok(Artifact::Text(format!(
                "{} blocks",
                input.document.blocks.len()
            )))
        }
    }

    #[test]
    fn registry_starts_empty() {
        let registry = TargetRegistry::new();
        assert!(registry.list_targets().is_empty());
    }

    #[test]
    fn register_and_get() {
        let mut registry = TargetRegistry::new();
        registry.register(TestTarget);

        assert!(registry.has("test"));
        assert_eq!(registry.get("test").unwrap().name(), "test");
        assert_eq!(registry.list_targets(), vec!["test"]);
    }

    #[test]
    fn get_unknown_target_fails() {
        let registry = TargetRegistry::new();
        match registry.get("nonexistent") {
            Err(ExportError::UnknownTarget { name }) => assert_eq!(name, "nonexistent"),
            other => panic!("expected UnknownTarget, got {:?}", other.map(|t| t.name())),
        }
    }

    #[test]
    fn render_parses_then_dispatches() {
        let mut registry = TargetRegistry::new();
        registry.register(TestTarget);

        let artifact = registry
            .render("test", "# Title\n\nBody text.\n", &RenderOptions::default())
            .unwrap();
        assert_eq!(artifact, Artifact::Text("2 blocks".to_string()));
    }

    #[test]
    fn render_rejects_blank_input() {
        let mut registry = TargetRegistry::new();
        registry.register(TestTarget);

        let result = registry.render("test", "  \n\t\n", &RenderOptions::default());
        assert!(matches!(result, Err(ExportError::NoContent)));
    }

    #[test]
    fn registering_twice_replaces() {
        let mut registry = TargetRegistry::new();
        registry.register(TestTarget);
        registry.register(TestTarget);
        assert_eq!(registry.list_targets().len(), 1);
    }

    #[test]
    fn with_defaults_registers_the_builtin_targets() {
        let registry = TargetRegistry::with_defaults();
        for name in ["html", "pages", "docx", "markup", "text"] {
            assert!(registry.has(name), "missing target {}", name);
        }
        assert_eq!(registry.list_targets().len(), 5);
    }
}
