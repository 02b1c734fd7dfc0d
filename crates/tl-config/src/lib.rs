//! TL Configuration System
//!
//! Provides configuration for the TL analysis tools:
//! - Project configuration (tl.toml)
//! - Global user configuration (~/.tl/config.toml)
//! - Environment overrides and precedence
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.tl/config.toml)
//! 2. Project config (tl.toml, found by walking up from the start directory)
//! 3. Environment variables (TL_SCOPE_STRATEGY, TL_DISABLED_RULES, TL_MAX_DIAGNOSTICS)
//! 4. CLI flags (applied by the caller)
//!
//! # Example
//!
//! ```no_run
//! use tl_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("{}", config.scope_strategy());
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "tl.toml";

/// Diagnostics reported per document when nothing is configured
pub const DEFAULT_MAX_DIAGNOSTICS: usize = 500;

/// Language server change debounce when nothing is configured
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::{AnalysisConfig, LspConfig, ProjectConfig};
