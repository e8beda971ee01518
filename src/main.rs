//! HTTP server for the Staff Incentive Engine.

use std::sync::Arc;

use incentive_engine::api::{AppState, create_router};
use incentive_engine::config::{ConfigLoader, EngineConfig};
use incentive_engine::error::EngineError;
use incentive_engine::services::IncentiveEngine;
use incentive_engine::store::{MemoryStore, Stores};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_ENV: &str = "INCENTIVE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./config/engine.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("incentive_engine=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config()?;
    let stores = Stores::in_memory(Arc::new(MemoryStore::new()), config.store_timeout());
    let engine = IncentiveEngine::new(stores, &config);
    let router = create_router(AppState::new(engine, &config));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        addr = %addr,
        store_timeout_ms = config.store.timeout_ms,
        max_concurrency = config.sync.max_concurrency,
        "Incentive engine listening"
    );
    axum::serve(listener, router).await?;
    Ok(())
}

fn load_config() -> Result<EngineConfig, EngineError> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    match ConfigLoader::load(&path) {
        Ok(loader) => {
            info!(path = %path, "Loaded engine configuration");
            Ok(loader.into_config())
        }
        Err(EngineError::ConfigNotFound { path }) => {
            warn!(path = %path, "Configuration file not found, using defaults");
            Ok(EngineConfig::default())
        }
        Err(err) => Err(err),
    }
}
