//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration from a YAML file.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::EngineConfig;

/// Loads and validates the engine configuration.
///
/// # File Layout
///
/// ```text
/// config/
/// └── engine.yaml   # server, store, sync and reporting sections
/// ```
///
/// # Example
///
/// ```no_run
/// use incentive_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/engine.yaml").unwrap();
/// println!("Sync concurrency: {}", loader.config().sync.max_concurrency);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified YAML file.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - The file is missing (`ConfigNotFound`)
    /// - The file contains invalid YAML or invalid values (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::parse(&content, &path_str)
    }

    /// Parses configuration from YAML text.
    ///
    /// `origin` is only used in error messages.
    pub fn from_yaml_str(content: &str, origin: &str) -> EngineResult<Self> {
        Self::parse(content, origin)
    }

    fn parse(content: &str, origin: &str) -> EngineResult<Self> {
        // An empty document means "all defaults".
        let config: EngineConfig = if content.trim().is_empty() {
            EngineConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?
        };

        Self::validate(&config, origin)?;
        Ok(Self { config })
    }

    fn validate(config: &EngineConfig, origin: &str) -> EngineResult<()> {
        let invalid = |message: &str| EngineError::ConfigParseError {
            path: origin.to_string(),
            message: message.to_string(),
        };

        if config.store.timeout_ms == 0 {
            return Err(invalid("store.timeout_ms must be greater than zero"));
        }
        if config.sync.max_concurrency == 0 {
            return Err(invalid("sync.max_concurrency must be greater than zero"));
        }
        if config.reporting.decimal_places > 10 {
            return Err(invalid("reporting.decimal_places must be at most 10"));
        }
        Ok(())
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_load_full_document() {
        let yaml = r#"
server:
  host: 0.0.0.0
  port: 8080
store:
  timeout_ms: 500
sync:
  max_concurrency: 4
reporting:
  decimal_places: 3
"#;
        let loader = ConfigLoader::from_yaml_str(yaml, "inline").unwrap();
        let config = loader.config();

        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.store_timeout(), Duration::from_millis(500));
        assert_eq!(config.sync.max_concurrency, 4);
        assert_eq!(config.reporting.decimal_places, 3);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let loader = ConfigLoader::from_yaml_str("sync:\n  max_concurrency: 2\n", "inline").unwrap();
        let config = loader.config();

        assert_eq!(config.sync.max_concurrency, 2);
        assert_eq!(config.store.timeout_ms, 2000);
        assert_eq!(config.reporting.decimal_places, 2);
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_empty_document_is_default() {
        let loader = ConfigLoader::from_yaml_str("", "inline").unwrap();
        assert_eq!(loader.into_config(), EngineConfig::default());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let result = ConfigLoader::from_yaml_str("sync:\n  max_concurrency: 0\n", "engine.yaml");

        match result.unwrap_err() {
            EngineError::ConfigParseError { path, message } => {
                assert_eq!(path, "engine.yaml");
                assert!(message.contains("max_concurrency"));
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = ConfigLoader::from_yaml_str("store:\n  timeout_ms: 0\n", "engine.yaml");
        assert!(matches!(
            result,
            Err(EngineError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml_returns_parse_error() {
        let result = ConfigLoader::from_yaml_str("sync: [unclosed", "engine.yaml");
        assert!(matches!(
            result,
            Err(EngineError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_missing_file_returns_not_found() {
        let result = ConfigLoader::load("/definitely/not/here/engine.yaml");

        match result.unwrap_err() {
            EngineError::ConfigNotFound { path } => {
                assert!(path.contains("engine.yaml"));
            }
            other => panic!("Expected ConfigNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_repository_config_file_loads() {
        let loader = ConfigLoader::load("./config/engine.yaml").unwrap();
        assert_eq!(loader.config().sync.max_concurrency, 8);
    }
}
