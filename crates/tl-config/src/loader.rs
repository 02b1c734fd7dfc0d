//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{AnalysisConfig, LspConfig, ProjectConfig};
use crate::{
    ConfigError, ConfigResult, DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_DIAGNOSTICS, PROJECT_CONFIG_FILE,
};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.tl/config.toml) - lowest priority
/// 2. Project config (tl.toml) - overrides global
/// 3. Environment variables (TL_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration, with environment overrides applied
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where tl.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Read global settings from `path` instead of ~/.tl/config.toml
    pub fn with_global_config(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find tl.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        self.finish(project_root, project_config)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());
        self.finish(project_root, project_config)
    }

    fn finish(
        &mut self,
        project_root: Option<PathBuf>,
        project_config: ProjectConfig,
    ) -> ConfigResult<Config> {
        let global_config = match self.load_global_config() {
            Ok(config) => config,
            Err(error) => {
                warn!(%error, "ignoring global configuration");
                GlobalConfig::default()
            }
        };

        let project_config = apply_env_overrides(project_config)?;

        debug!(
            root = ?project_root,
            package = ?project_config.package_name(),
            "configuration loaded"
        );
        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); the default config when no
    /// tl.toml exists up to the filesystem root
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.tl/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        // Global config is optional
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Get the global configuration directory (~/.tl)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".tl"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply environment variable overrides to the analysis section
///
/// Empty values are treated as unset.
fn apply_env_overrides(mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
    let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

    let mut overrides = AnalysisConfig::default();

    if let Some(strategy) = var("TL_SCOPE_STRATEGY") {
        overrides.scope_strategy = Some(strategy.trim().to_ascii_lowercase());
    }

    if let Some(rules) = var("TL_DISABLED_RULES") {
        overrides.disabled_rules = Some(
            rules
                .split(',')
                .map(str::trim)
                .filter(|rule| !rule.is_empty())
                .map(str::to_string)
                .collect(),
        );
    }

    if let Some(max) = var("TL_MAX_DIAGNOSTICS") {
        let max = max
            .trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "TL_MAX_DIAGNOSTICS".to_string(),
                reason: e.to_string(),
            })?;
        overrides.max_diagnostics = Some(max);
    }

    if overrides != AnalysisConfig::default() {
        overrides.validate()?;
        config
            .analysis
            .get_or_insert_with(Default::default)
            .merge(&overrides);
    }

    Ok(config)
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Get the package name
    pub fn package_name(&self) -> Option<&str> {
        self.project.package_name()
    }

    /// Check if this is a project (has tl.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    fn analysis<'a, T>(&'a self, field: impl Fn(&'a AnalysisConfig) -> Option<T>) -> Option<T> {
        self.project
            .analysis
            .as_ref()
            .and_then(&field)
            .or_else(|| self.global.analysis.as_ref().and_then(&field))
    }

    fn lsp<'a, T>(&'a self, field: impl Fn(&'a LspConfig) -> Option<T>) -> Option<T> {
        self.project
            .lsp
            .as_ref()
            .and_then(&field)
            .or_else(|| self.global.lsp.as_ref().and_then(&field))
    }

    /// Rule codes or names to skip (project > global > none)
    pub fn disabled_rules(&self) -> Vec<String> {
        self.analysis(|a| a.disabled_rules.clone()).unwrap_or_default()
    }

    /// Scope strategy name (project > global > "tree")
    pub fn scope_strategy(&self) -> &str {
        self.analysis(|a| a.scope_strategy.as_deref())
            .unwrap_or("tree")
    }

    pub fn max_diagnostics(&self) -> usize {
        self.analysis(|a| a.max_diagnostics)
            .unwrap_or(DEFAULT_MAX_DIAGNOSTICS)
    }

    /// Module search directories resolved against the project root; the
    /// root itself when none are configured
    pub fn module_search_paths(&self) -> Vec<PathBuf> {
        let root = self.project_root.clone().unwrap_or_else(|| PathBuf::from("."));
        let configured = self
            .project
            .modules
            .as_ref()
            .map(|m| m.search_paths.as_slice())
            .unwrap_or_default();
        if configured.is_empty() {
            return vec![root];
        }
        configured.iter().map(|path| root.join(path)).collect()
    }

    /// Module file extension without the leading dot
    pub fn module_extension(&self) -> &str {
        self.project
            .modules
            .as_ref()
            .and_then(|m| m.extension.as_deref())
            .map(|ext| ext.trim_start_matches('.'))
            .unwrap_or("tl")
    }

    /// Catalog extension file resolved against the project root
    pub fn catalog_path(&self) -> Option<PathBuf> {
        let path = &self.project.catalog.as_ref()?.path;
        Some(match &self.project_root {
            Some(root) => root.join(path),
            None => path.clone(),
        })
    }

    pub fn lsp_diagnostics(&self) -> bool {
        self.lsp(|l| l.diagnostics).unwrap_or(true)
    }

    pub fn lsp_hover(&self) -> bool {
        self.lsp(|l| l.hover).unwrap_or(true)
    }

    pub fn lsp_completion(&self) -> bool {
        self.lsp(|l| l.completion).unwrap_or(true)
    }

    pub fn debounce_ms(&self) -> u64 {
        self.lsp(|l| l.debounce_ms).unwrap_or(DEFAULT_DEBOUNCE_MS)
    }
}
