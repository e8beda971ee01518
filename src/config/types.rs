//! Configuration types for the incentive engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the engine YAML file. Every section is optional in
//! the file and falls back to its `Default`.

use std::time::Duration;

use serde::Deserialize;

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// The interface to bind.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Backing-store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Upper bound for every store call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { timeout_ms: 2000 }
    }
}

/// Billing sync settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum number of staff aggregated or written concurrently.
    pub max_concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { max_concurrency: 8 }
    }
}

/// Reporting settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Decimal places used when rounding monetary values for display.
    pub decimal_places: u32,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self { decimal_places: 2 }
    }
}

/// The complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Store settings.
    pub store: StoreConfig,
    /// Sync settings.
    pub sync: SyncConfig,
    /// Reporting settings.
    pub reporting: ReportingConfig,
}

impl EngineConfig {
    /// Returns the store timeout as a [`Duration`].
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store.timeout_ms)
    }

    /// Returns the `host:port` string the server binds to.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
