//! Project Configuration (tl.toml)
//!
//! Handles project-level configuration stored in `tl.toml` at the project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Accepted values of `analysis.scope_strategy`
pub const SCOPE_STRATEGIES: &[&str] = &["tree", "backward-scan"];

/// Project configuration from tl.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Package metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageConfig>,

    /// Rule selection and limits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisConfig>,

    /// Where imported modules are looked up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<ModulesConfig>,

    /// Catalog extension
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogConfig>,

    /// Language server settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lsp: Option<LspConfig>,
}

/// Package metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    /// Package name
    pub name: String,
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Rule codes (`TL5001`) or names (`untyped-parameter`) to skip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_rules: Option<Vec<String>>,

    /// `tree` (default) or `backward-scan`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_strategy: Option<String>,

    /// Cap on diagnostics per document (default: 500)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_diagnostics: Option<usize>,
}

/// Module lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ModulesConfig {
    /// Directories searched for `a/b/c.tl`, relative to the project root
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<PathBuf>,

    /// Module file extension (default: "tl")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

/// Catalog extension configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// TOML catalog merged over the built-in one
    pub path: PathBuf,
}

/// Language server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LspConfig {
    /// Publish diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<bool>,

    /// Answer hover requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<bool>,

    /// Answer completion requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<bool>,

    /// Delay between the last change and re-analysis (default: 250)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = read_config(path)?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(pkg) = &self.package {
            if pkg.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "package.name".to_string(),
                    reason: "name cannot be empty".to_string(),
                });
            }
        }

        if let Some(analysis) = &self.analysis {
            analysis.validate()?;
        }

        if let Some(modules) = &self.modules {
            if let Some(extension) = &modules.extension {
                if extension.trim_start_matches('.').is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "modules.extension".to_string(),
                        reason: "extension cannot be empty".to_string(),
                    });
                }
            }
        }

        if let Some(lsp) = &self.lsp {
            lsp.validate()?;
        }

        Ok(())
    }

    /// Get the package name, if present
    pub fn package_name(&self) -> Option<&str> {
        self.package.as_ref().map(|p| p.name.as_str())
    }

    /// Merge another project config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ProjectConfig) {
        if other.package.is_some() {
            self.package = other.package.clone();
        }
        if let Some(analysis) = &other.analysis {
            self.analysis
                .get_or_insert_with(Default::default)
                .merge(analysis);
        }
        if other.modules.is_some() {
            self.modules = other.modules.clone();
        }
        if other.catalog.is_some() {
            self.catalog = other.catalog.clone();
        }
        if let Some(lsp) = &other.lsp {
            self.lsp.get_or_insert_with(Default::default).merge(lsp);
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(rules) = &self.disabled_rules {
            for rule in rules {
                if !is_valid_rule(rule) {
                    return Err(ConfigError::InvalidValue {
                        field: "analysis.disabled_rules".to_string(),
                        reason: format!("'{}' is not a rule code like TL5001 or a rule name", rule),
                    });
                }
            }
        }

        if let Some(strategy) = &self.scope_strategy {
            if !SCOPE_STRATEGIES.contains(&strategy.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "analysis.scope_strategy".to_string(),
                    reason: format!(
                        "unknown strategy '{}', expected one of: {}",
                        strategy,
                        SCOPE_STRATEGIES.join(", ")
                    ),
                });
            }
        }

        if self.max_diagnostics == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "analysis.max_diagnostics".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Other config takes precedence for set fields
    pub fn merge(&mut self, other: &AnalysisConfig) {
        if other.disabled_rules.is_some() {
            self.disabled_rules = other.disabled_rules.clone();
        }
        if other.scope_strategy.is_some() {
            self.scope_strategy = other.scope_strategy.clone();
        }
        if other.max_diagnostics.is_some() {
            self.max_diagnostics = other.max_diagnostics;
        }
    }
}

impl LspConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.debounce_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "lsp.debounce_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Other config takes precedence for set fields
    pub fn merge(&mut self, other: &LspConfig) {
        if other.diagnostics.is_some() {
            self.diagnostics = other.diagnostics;
        }
        if other.hover.is_some() {
            self.hover = other.hover;
        }
        if other.completion.is_some() {
            self.completion = other.completion;
        }
        if other.debounce_ms.is_some() {
            self.debounce_ms = other.debounce_ms;
        }
    }
}

pub(crate) fn read_config(path: &Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::IoError(e)
        }
    })
}

/// `TLnnnn`, or a kebab-case rule name
pub(crate) fn is_valid_rule(rule: &str) -> bool {
    if let Some(digits) = rule.strip_prefix("TL") {
        return digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit());
    }
    !rule.is_empty()
        && !rule.starts_with('-')
        && !rule.ends_with('-')
        && rule.chars().all(|c| c.is_ascii_lowercase() || c == '-')
}
