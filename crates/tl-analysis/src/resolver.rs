//! Module resolution collaborator
//!
//! The analysis core never touches the filesystem. When a query lands on an
//! imported name it asks a [`ModuleResolver`] for the module's text and
//! repeats the lookup there.

use std::collections::HashMap;

/// Source of an imported module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub uri: String,
    pub text: String,
}

/// Maps a dotted module path (`util.text`) to its source
pub trait ModuleResolver {
    /// `None` means the module is unknown
    fn resolve(&self, path: &str) -> Option<ResolvedModule>;
}

impl<R: ModuleResolver + ?Sized> ModuleResolver for &R {
    fn resolve(&self, path: &str) -> Option<ResolvedModule> {
        (**self).resolve(path)
    }
}

/// Resolves nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

impl ModuleResolver for NoopResolver {
    fn resolve(&self, _path: &str) -> Option<ResolvedModule> {
        None
    }
}

/// In-memory modules keyed by dotted path
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    modules: HashMap<String, ResolvedModule>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module; its URI is `memory:///a/b.tl`
    pub fn with_module(mut self, path: &str, text: &str) -> Self {
        let uri = format!("memory:///{}.tl", path.replace('.', "/"));
        self.modules.insert(
            path.to_string(),
            ResolvedModule {
                uri,
                text: text.to_string(),
            },
        );
        self
    }
}

impl ModuleResolver for MemoryResolver {
    fn resolve(&self, path: &str) -> Option<ResolvedModule> {
        let found = self.modules.get(path).cloned();
        tracing::trace!(path, found = found.is_some(), "resolve module");
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_resolver() {
        let resolver = MemoryResolver::new().with_module("util.text", "func pad():\nend");
        let module = resolver.resolve("util.text").unwrap();
        assert_eq!(module.uri, "memory:///util/text.tl");
        assert!(resolver.resolve("util").is_none());
        assert!(NoopResolver.resolve("util.text").is_none());
    }
}
