//! Project configuration with command-line overrides on top

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tl_analysis::{Analyzer, ScopeStrategy};
use tl_config::{Config, ConfigLoader};

/// Analysis flags shared by `check` and `hover`
#[derive(Debug, Clone, Default)]
pub struct AnalysisFlags {
    /// Rules disabled in addition to the configured ones
    pub disable: Vec<String>,
    /// Overrides the configured scope strategy
    pub scope_strategy: Option<String>,
}

/// Load tl.toml (walking up from `start_dir`), the global config and
/// environment overrides
pub fn load(start_dir: &Path) -> Result<Config> {
    ConfigLoader::new()
        .load_from_directory(start_dir)
        .with_context(|| format!("Invalid configuration for {}", start_dir.display()))
}

/// Analyzer for `config` with `flags` applied last
pub fn analyzer(config: &Config, flags: &AnalysisFlags) -> Result<Analyzer> {
    let analyzer = tl_lsp::settings::analyzer_for(config);
    let mut options = analyzer.options().clone();
    options
        .disabled_rules
        .extend(flags.disable.iter().cloned());
    if let Some(strategy) = &flags.scope_strategy {
        options.scope_strategy = ScopeStrategy::parse(strategy)
            .ok_or_else(|| anyhow!("Unknown scope strategy '{}'", strategy))?;
    }
    Ok(analyzer.with_options(options))
}
