//! Configuration to analyzer and server switches
//!
//! Precedence follows the config loader, with the client's
//! `initializationOptions` applied last like command-line flags.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tl_analysis::{AnalysisOptions, Analyzer, Catalog, ScopeStrategy};
use tl_config::Config;
use tracing::warn;

use crate::resolver::FsModuleResolver;

/// Everything a request handler needs, cheap to clone
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub analyzer: Analyzer,
    pub resolver: Arc<FsModuleResolver>,
    pub diagnostics: bool,
    pub hover: bool,
    pub completion: bool,
    pub debounce: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ServerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            analyzer: analyzer_for(config),
            resolver: Arc::new(FsModuleResolver::new(
                config.module_search_paths(),
                config.module_extension(),
            )),
            diagnostics: config.lsp_diagnostics(),
            hover: config.lsp_hover(),
            completion: config.lsp_completion(),
            debounce: Duration::from_millis(config.debounce_ms()),
        }
    }

    /// Apply client-provided overrides
    pub fn with_client_options(mut self, client: &InitializationOptions) -> Self {
        let mut options = self.analyzer.options().clone();
        if let Some(rules) = &client.disabled_rules {
            options.disabled_rules = rules.iter().cloned().collect();
        }
        if let Some(strategy) = &client.scope_strategy {
            match ScopeStrategy::parse(strategy) {
                Some(strategy) => options.scope_strategy = strategy,
                None => warn!(strategy = %strategy, "unknown scope strategy from client"),
            }
        }
        if let Some(max) = client.max_diagnostics.filter(|&max| max > 0) {
            options.max_diagnostics = max;
        }
        if let Some(ms) = client.debounce_ms.filter(|&ms| ms > 0) {
            self.debounce = Duration::from_millis(ms);
        }
        self.analyzer = self.analyzer.with_options(options);
        self
    }
}

/// `initializationOptions` understood by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitializationOptions {
    pub disabled_rules: Option<Vec<String>>,
    pub scope_strategy: Option<String>,
    pub max_diagnostics: Option<usize>,
    pub debounce_ms: Option<u64>,
}

impl InitializationOptions {
    /// Parse the raw JSON; anything malformed is ignored with a warning
    pub fn from_json(value: Option<serde_json::Value>) -> Self {
        match value {
            None | Some(serde_json::Value::Null) => Self::default(),
            Some(value) => serde_json::from_value(value).unwrap_or_else(|error| {
                warn!(%error, "ignoring malformed initializationOptions");
                Self::default()
            }),
        }
    }
}

/// Analyzer with the built-in catalog, the configured catalog extension and
/// the configured analysis options
pub fn analyzer_for(config: &Config) -> Analyzer {
    let mut catalog = Catalog::builtin();
    if let Some(path) = config.catalog_path() {
        match Catalog::load_file(&path) {
            Ok(extension) => catalog.extend(extension),
            Err(error) => warn!(%error, "catalog extension ignored"),
        }
    }

    let scope_strategy = ScopeStrategy::parse(config.scope_strategy()).unwrap_or_else(|| {
        warn!(strategy = config.scope_strategy(), "unknown scope strategy, using tree");
        ScopeStrategy::default()
    });
    let options = AnalysisOptions {
        disabled_rules: config.disabled_rules().into_iter().collect(),
        scope_strategy,
        max_diagnostics: config.max_diagnostics(),
    };
    Analyzer::with_catalog(catalog).with_options(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = ServerSettings::default();
        assert!(settings.diagnostics && settings.hover && settings.completion);
        assert_eq!(settings.debounce, Duration::from_millis(250));
        assert_eq!(settings.analyzer.options(), &AnalysisOptions::default());
    }

    #[test]
    fn test_config_reaches_analyzer() {
        let config = Config {
            project: toml_config(
                r#"
[analysis]
disabled_rules = ["TL5001"]
scope_strategy = "backward-scan"
max_diagnostics = 9

[lsp]
completion = false
"#,
            ),
            ..Default::default()
        };
        let settings = ServerSettings::from_config(&config);
        let options = settings.analyzer.options();
        assert!(options.disabled_rules.contains("TL5001"));
        assert_eq!(options.scope_strategy, ScopeStrategy::BackwardScan);
        assert_eq!(options.max_diagnostics, 9);
        assert!(!settings.completion);
    }

    #[test]
    fn test_catalog_extension_is_loaded() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("extra.toml"),
            "[globals.shout]\nparams = [\"text: String\"]\nreturns = \"String\"\n",
        )
        .unwrap();
        let config = Config {
            project: toml_config("[catalog]\npath = \"extra.toml\"\n"),
            project_root: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let analyzer = analyzer_for(&config);
        assert!(analyzer.catalog().global("shout").is_some());
        assert!(analyzer.catalog().global("print").is_some());
    }

    #[test]
    fn test_missing_catalog_extension_falls_back() {
        let config = Config {
            project: toml_config("[catalog]\npath = \"absent.toml\"\n"),
            project_root: Some(PathBuf::from("/nonexistent")),
            ..Default::default()
        };
        assert!(analyzer_for(&config).catalog().global("print").is_some());
    }

    #[test]
    fn test_client_options() {
        let client = InitializationOptions::from_json(Some(json!({
            "disabledRules": ["TL8004"],
            "debounceMs": 40,
            "maxDiagnostics": 0
        })));
        let settings = ServerSettings::default().with_client_options(&client);
        assert!(settings.analyzer.options().disabled_rules.contains("TL8004"));
        assert_eq!(settings.debounce, Duration::from_millis(40));
        assert_eq!(settings.analyzer.options().max_diagnostics, 500);

        let malformed = InitializationOptions::from_json(Some(json!({ "debounceMs": "soon" })));
        assert_eq!(malformed, InitializationOptions::default());
    }

    /// Project section parsed and validated the way the loader does
    fn toml_config(text: &str) -> tl_config::ProjectConfig {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tl.toml");
        fs::write(&path, text).unwrap();
        tl_config::ProjectConfig::load_from_file(&path).unwrap()
    }
}
