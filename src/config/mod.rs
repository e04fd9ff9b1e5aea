use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod defaults;

use defaults::*;

use crate::utils::regex_guard::RegexGuardConfig;

/// Application configuration, loaded from a TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Enrichment policy owned by the caller, not by the extraction core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Whether show info extraction runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Path to the pattern document; the bundled default set is used
    /// when unset
    #[serde(default)]
    pub pattern_file: Option<PathBuf>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            pattern_file: None,
        }
    }
}

/// Limits applied when compiling user-supplied patterns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum `{m,n}` repetition count accepted in a pattern
    #[serde(default = "default_max_quantifier_limit")]
    pub max_quantifier_limit: usize,
    /// Maximum compiled regex program size in bytes
    #[serde(default = "default_regex_size_limit")]
    pub regex_size_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_quantifier_limit: default_max_quantifier_limit(),
            regex_size_limit: default_regex_size_limit(),
        }
    }
}

impl From<&EngineConfig> for RegexGuardConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_quantifier_limit: config.max_quantifier_limit,
            size_limit: config.regex_size_limit,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults
    /// when the file does not exist
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            debug!("no config file at {config_file}, using defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_enrichment_with_bundled_patterns() {
        let config = Config::default();
        assert!(config.enrichment.enabled);
        assert_eq!(config.enrichment.pattern_file, None);
        assert_eq!(config.engine.max_quantifier_limit, 100);
    }

    #[test]
    fn partial_toml_fills_missing_fields_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [enrichment]
            pattern_file = "patterns/uk.xml"
            "#,
        )
        .unwrap();
        assert!(config.enrichment.enabled);
        assert_eq!(
            config.enrichment.pattern_file,
            Some(PathBuf::from("patterns/uk.xml"))
        );
        assert_eq!(config.engine.regex_size_limit, default_regex_size_limit());
    }

    #[test]
    fn enrichment_can_be_disabled() {
        let config: Config = toml::from_str("[enrichment]\nenabled = false\n").unwrap();
        assert!(!config.enrichment.enabled);
    }
}
