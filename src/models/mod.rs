//! Core data models for the Staff Incentive Engine.
//!
//! This module contains all the domain models used throughout the engine:
//! versioned incentive rules, daily sale records, billing invoices, staff,
//! payouts, and the results the services report.

mod daily_sale;
mod incentive_result;
mod invoice;
mod payout;
mod period;
mod report;
mod rule;
mod staff;

pub use daily_sale::{DailySaleKey, DailySaleRecord, MonthlySales, ReviewCounts, SalesAggregate};
pub use incentive_result::{AuditStep, IncentiveCalculation, IncentiveTier};
pub use invoice::{Invoice, ItemType, LineItem};
pub use payout::{IncentivePayout, PayoutStatus};
pub use period::{YearMonth, day_window, days_in_month};
pub use report::{DailyIncentive, MonthlyIncentive, StaffBalance, SyncReport};
pub use rule::{
    ApplyOn, CurrentRules, IncentiveConfig, IncentiveDraft, IncentiveRule, ResolvedRule,
    RuleDraft, RuleSet, RuleSubmission, RuleType, RuleVersion, SalesConfig, SalesDraft,
    TargetConfig, TargetDraft,
};
pub use staff::Staff;
