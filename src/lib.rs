//! Staff Incentive Engine
//!
//! This crate turns billing invoices into per-staff daily sales, applies a
//! two-tier ("cliff") incentive formula under append-only versioned rules,
//! and reconciles earned incentives against approved payouts.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
