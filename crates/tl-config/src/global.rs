//! Global Configuration (~/.tl/config.toml)
//!
//! User-level defaults for analysis and the language server. Every project
//! setting of the same name overrides these.

use crate::project::{read_config, AnalysisConfig, LspConfig};
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.tl/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Analysis defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisConfig>,

    /// LSP defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lsp: Option<LspConfig>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = read_config(path)?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(analysis) = &self.analysis {
            analysis.validate()?;
        }
        if let Some(lsp) = &self.lsp {
            lsp.validate()?;
        }
        Ok(())
    }

    /// Get the global config file path (~/.tl/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".tl").join("config.toml"))
    }

    /// Merge another global config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &GlobalConfig) {
        if let Some(analysis) = &other.analysis {
            self.analysis
                .get_or_insert_with(Default::default)
                .merge(analysis);
        }
        if let Some(lsp) = &other.lsp {
            self.lsp.get_or_insert_with(Default::default).merge(lsp);
        }
    }
}
