//! Application state for the Staff Incentive Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::services::IncentiveEngine;

/// Shared application state.
///
/// Holds the incentive engine and the reporting precision used to round
/// monetary values in responses.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<IncentiveEngine>,
    decimal_places: u32,
}

impl AppState {
    /// Creates a new application state around `engine`.
    pub fn new(engine: IncentiveEngine, config: &EngineConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            decimal_places: config.reporting.decimal_places,
        }
    }

    /// Returns the incentive engine.
    pub fn engine(&self) -> &IncentiveEngine {
        &self.engine
    }

    /// Decimal places for monetary values in responses.
    pub fn decimal_places(&self) -> u32 {
        self.decimal_places
    }
}
