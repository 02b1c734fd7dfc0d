//! Imported modules read from disk
//!
//! `a.b.c` maps to `<search path>/a/b/c.<extension>`; the first search path
//! holding the file wins. Fetched texts stay in an LRU cache until the server
//! clears it on save.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lru::LruCache;
use tl_analysis::{ModuleResolver, ResolvedModule};
use tower_lsp::lsp_types::Url;
use tracing::{debug, trace};

/// Modules kept in memory
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct FsModuleResolver {
    search_paths: Vec<PathBuf>,
    extension: String,
    cache: Mutex<LruCache<String, ResolvedModule>>,
}

impl FsModuleResolver {
    pub fn new(search_paths: Vec<PathBuf>, extension: impl Into<String>) -> Self {
        Self::with_capacity(search_paths, extension, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(
        search_paths: Vec<PathBuf>,
        extension: impl Into<String>,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            search_paths,
            extension: extension.into(),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Candidate file for a dotted path under one search root
    pub fn module_file(&self, root: &Path, dotted: &str) -> Option<PathBuf> {
        let mut path = root.to_path_buf();
        for segment in dotted.split('.') {
            if segment.is_empty() {
                return None;
            }
            path.push(segment);
        }
        path.set_extension(&self.extension);
        Some(path)
    }

    /// Forget every cached module
    pub fn clear(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        debug!(entries = cache.len(), "module cache cleared");
        cache.clear();
    }

    fn read(&self, dotted: &str) -> Option<ResolvedModule> {
        for root in &self.search_paths {
            let path = self.module_file(root, dotted)?;
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    let uri = file_uri(&path);
                    trace!(module = dotted, %uri, "module read from disk");
                    return Some(ResolvedModule { uri, text });
                }
                Err(error) => {
                    trace!(module = dotted, path = %path.display(), %error, "module not here");
                }
            }
        }
        None
    }
}

impl ModuleResolver for FsModuleResolver {
    fn resolve(&self, path: &str) -> Option<ResolvedModule> {
        {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(module) = cache.get(path) {
                trace!(module = path, "module cache hit");
                return Some(module.clone());
            }
        }

        let module = self.read(path)?;
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.put(path.to_string(), module.clone());
        Some(module)
    }
}

fn file_uri(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    match Url::from_file_path(&absolute) {
        Ok(url) => url.to_string(),
        Err(()) => format!("file://{}", absolute.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_module(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_resolves_dotted_path() {
        let dir = TempDir::new().unwrap();
        write_module(dir.path(), "util/text.tl", "func pad():\nend");

        let resolver = FsModuleResolver::new(vec![dir.path().to_path_buf()], "tl");
        let module = resolver.resolve("util.text").unwrap();

        assert_eq!(module.text, "func pad():\nend");
        assert!(module.uri.starts_with("file://"));
        assert!(module.uri.ends_with("util/text.tl"));
        assert!(resolver.resolve("util.missing").is_none());
    }

    #[test]
    fn test_first_search_path_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_module(second.path(), "shared.tl", "const WHERE = 2");
        write_module(first.path(), "shared.tl", "const WHERE = 1");

        let resolver = FsModuleResolver::new(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            "tl",
        );
        assert_eq!(resolver.resolve("shared").unwrap().text, "const WHERE = 1");
    }

    #[test]
    fn test_cache_until_cleared() {
        let dir = TempDir::new().unwrap();
        write_module(dir.path(), "m.tl", "const V = 1");

        let resolver = FsModuleResolver::new(vec![dir.path().to_path_buf()], "tl");
        assert!(resolver.resolve("m").is_some());

        fs::remove_file(dir.path().join("m.tl")).unwrap();
        assert!(resolver.resolve("m").is_some());

        resolver.clear();
        assert!(resolver.resolve("m").is_none());
    }

    #[test]
    fn test_module_file_layout() {
        let resolver = FsModuleResolver::new(vec![PathBuf::from("/tmp")], "tl");
        assert!(resolver.module_file(Path::new("/tmp"), "a..b").is_none());
        assert_eq!(
            resolver.module_file(Path::new("/root"), "a.b"),
            Some(PathBuf::from("/root/a/b.tl"))
        );
    }
}
