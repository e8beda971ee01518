//! Incentive services.
//!
//! - [`RuleResolver`] answers "which rule was in effect at this instant"
//! - [`BillingSyncEngine`] turns a day of invoices into daily sale records
//! - [`BalanceService`] reconciles earned incentives with approved payouts
//! - [`IncentiveEngine`] is the facade the HTTP layer talks to

mod balance;
mod billing_sync;
mod engine;
mod rule_resolver;

pub use balance::BalanceService;
pub use billing_sync::BillingSyncEngine;
pub use engine::IncentiveEngine;
pub use rule_resolver::{RuleHistory, RuleResolver, select_version};
