//! Configuration loading and management for the incentive engine.
//!
//! This module provides functionality to load engine settings (server
//! address, store timeout, sync concurrency, reporting precision) from a YAML
//! file.
//!
//! # Example
//!
//! ```no_run
//! use incentive_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/engine.yaml").unwrap();
//! println!("Listening on {}", config.config().server_addr());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{EngineConfig, ReportingConfig, ServerConfig, StoreConfig, SyncConfig};
