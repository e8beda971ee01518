//! Calculation logic for the Staff Incentive Engine.
//!
//! This module contains the pure functions of the engine: per-staff sales
//! aggregation over a day's invoices, and the two-tier cliff formula applied
//! to daily records and to month-summed sales. Nothing here performs I/O.

mod incentive;
mod sales_aggregation;

pub use incentive::{
    DAILY_INCENTIVE_RULE_ID, MONTHLY_INCENTIVE_RULE_ID, compute_daily, compute_monthly,
    select_tier,
};
pub use sales_aggregation::aggregate_staff_sales;
