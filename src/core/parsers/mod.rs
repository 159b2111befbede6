//! Pluggable dialect parsers and the extension-keyed registry.
//!
//! Each dialect (script, Vue SFC, Svelte) implements `DialectParser` and
//! funnels call sites through the shared detector in `calls`. Dispatch is
//! purely by file extension; files with an unregistered extension are
//! silently skipped. An unavailable parser degrades to "no references" for
//! its dialect with a single warning per registry instance.

pub mod calls;
pub mod script;
#[cfg(feature = "svelte")]
pub mod svelte;
#[cfg(feature = "vue")]
pub mod vue;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use colored::Colorize;

use crate::core::reference::FileExtraction;

/// One markup/script dialect's extractor.
///
/// `signature` must change whenever the parser's extraction behavior
/// changes; it feeds whole-cache invalidation, so stale cached references
/// can never survive a parser upgrade.
pub trait DialectParser: Send + Sync {
    fn name(&self) -> &'static str;
    fn extensions(&self) -> &'static [&'static str];
    fn signature(&self) -> &'static str;
    /// Whether the dialect's optional runtime pieces are present in the
    /// workspace. Unavailable parsers are skipped, never an error.
    fn is_available(&self, workspace_root: &Path) -> bool;
    fn parse_file(
        &self,
        file_path: &str,
        content: &str,
        translation_identifier: &str,
    ) -> Result<FileExtraction>;
}

/// Extension-keyed parser registry, owned by one extraction run.
///
/// Availability results are cached per instance and invalidated when the
/// workspace root changes; nothing here is a process global.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn DialectParser>>,
    workspace_root: PathBuf,
    availability: Mutex<BTreeMap<&'static str, bool>>,
    warned: Mutex<BTreeMap<&'static str, ()>>,
}

impl ParserRegistry {
    pub fn new(workspace_root: &Path) -> Self {
        Self {
            parsers: Vec::new(),
            workspace_root: workspace_root.to_path_buf(),
            availability: Mutex::new(BTreeMap::new()),
            warned: Mutex::new(BTreeMap::new()),
        }
    }

    /// Registry with every parser compiled into this build.
    pub fn with_default_parsers(workspace_root: &Path) -> Self {
        let mut registry = Self::new(workspace_root);
        registry.register(Box::new(script::ScriptParser));
        #[cfg(feature = "vue")]
        registry.register(Box::new(vue::VueParser));
        #[cfg(feature = "svelte")]
        registry.register(Box::new(svelte::SvelteParser));
        registry
    }

    pub fn register(&mut self, parser: Box<dyn DialectParser>) {
        self.parsers.push(parser);
    }

    /// Move the registry to a different workspace root, dropping cached
    /// availability results.
    pub fn set_workspace_root(&mut self, workspace_root: &Path) {
        self.workspace_root = workspace_root.to_path_buf();
        self.availability.lock().unwrap().clear();
    }

    /// Find the parser responsible for a file, by extension.
    pub fn for_file(&self, path: &Path) -> Option<&dyn DialectParser> {
        let extension = path.extension()?.to_str()?;
        self.parsers
            .iter()
            .find(|p| p.extensions().contains(&extension))
            .map(Box::as_ref)
    }

    /// All registered extensions, for file discovery.
    pub fn extensions(&self) -> Vec<&'static str> {
        self.parsers
            .iter()
            .flat_map(|p| p.extensions().iter().copied())
            .collect()
    }

    /// Combined signature over all registered parsers; any parser change
    /// invalidates the whole extraction cache.
    pub fn signature(&self) -> String {
        let mut parts: Vec<&str> = self.parsers.iter().map(|p| p.signature()).collect();
        parts.sort_unstable();
        parts.join("+")
    }

    /// Cached availability check; warns once per parser per registry.
    pub fn check_available(&self, parser: &dyn DialectParser) -> bool {
        let available = *self
            .availability
            .lock()
            .unwrap()
            .entry(parser.name())
            .or_insert_with(|| parser.is_available(&self.workspace_root));

        if !available
            && self
                .warned
                .lock()
                .unwrap()
                .insert(parser.name(), ())
                .is_none()
        {
            eprintln!(
                "{} {} parser unavailable in this workspace; its files contribute no references",
                "warning:".bold().yellow(),
                parser.name()
            );
        }

        available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct StubParser {
        available: bool,
    }

    impl DialectParser for StubParser {
        fn name(&self) -> &'static str {
            "stub"
        }
        fn extensions(&self) -> &'static [&'static str] {
            &["stub"]
        }
        fn signature(&self) -> &'static str {
            "stub:v1"
        }
        fn is_available(&self, _root: &Path) -> bool {
            self.available
        }
        fn parse_file(&self, _: &str, _: &str, _: &str) -> Result<FileExtraction> {
            Ok(FileExtraction::default())
        }
    }

    #[test]
    fn test_dispatch_by_extension() {
        let registry = ParserRegistry::with_default_parsers(Path::new("."));
        assert_eq!(
            registry.for_file(Path::new("src/app.tsx")).unwrap().name(),
            "script"
        );
        assert!(registry.for_file(Path::new("style.css")).is_none());
        assert!(registry.for_file(Path::new("Makefile")).is_none());
    }

    #[cfg(feature = "vue")]
    #[test]
    fn test_vue_extension_dispatch() {
        let registry = ParserRegistry::with_default_parsers(Path::new("."));
        assert_eq!(
            registry.for_file(Path::new("src/App.vue")).unwrap().name(),
            "vue"
        );
    }

    #[test]
    fn test_signature_contains_each_parser() {
        let registry = ParserRegistry::with_default_parsers(Path::new("."));
        assert!(registry.signature().contains("script:v2"));
    }

    #[test]
    fn test_unavailable_parser_reports_false() {
        let mut registry = ParserRegistry::new(Path::new("."));
        registry.register(Box::new(StubParser { available: false }));

        let parser = registry.for_file(Path::new("x.stub")).unwrap();
        assert!(!registry.check_available(parser));
        // Second check hits the per-instance cache; still unavailable.
        let parser = registry.for_file(Path::new("x.stub")).unwrap();
        assert!(!registry.check_available(parser));
    }

    #[test]
    fn test_workspace_root_change_clears_availability_cache() {
        let mut registry = ParserRegistry::new(Path::new("."));
        registry.register(Box::new(StubParser { available: true }));

        let parser = registry.for_file(Path::new("x.stub")).unwrap();
        assert!(registry.check_available(parser));
        registry.set_workspace_root(Path::new("/tmp"));
        let parser = registry.for_file(Path::new("x.stub")).unwrap();
        assert!(registry.check_available(parser));
    }
}
