//! HTTP API module for the Staff Incentive Engine.
//!
//! This module exposes sync, rule management, balance, and single-period
//! incentive queries as REST endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{ReviewRequest, SyncRequest};
pub use response::{ApiError, RulesUpdated};
pub use state::AppState;
