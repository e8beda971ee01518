//! Reports returned by the sync and balance services.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DailySaleRecord, IncentiveCalculation, MonthlySales, ResolvedRule, YearMonth};

/// Outcome of syncing one tenant day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// The synced tenant.
    pub tenant_id: String,
    /// The synced day.
    pub date: NaiveDate,
    /// Number of invoices found in the day window.
    pub invoices_scanned: usize,
    /// Staff ids whose records were written.
    pub updated: Vec<String>,
    /// The daily rule snapshot shared by every written record.
    pub applied_rule: ResolvedRule,
}

impl SyncReport {
    /// Number of records written.
    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }
}

/// Earned versus paid incentives for one staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffBalance {
    /// The owning tenant.
    pub tenant_id: String,
    /// The staff member.
    pub staff_id: String,
    /// Daily plus monthly incentives earned.
    pub total_earned: Decimal,
    /// Approved payouts.
    pub total_paid: Decimal,
    /// `total_earned - total_paid`; negative when advances exceed earnings.
    pub balance: Decimal,
    /// Portion of `total_earned` from daily records.
    pub daily_earned: Decimal,
    /// Portion of `total_earned` from monthly incentives.
    pub monthly_earned: Decimal,
    /// Number of daily records counted.
    pub records_counted: usize,
    /// Number of months with sales activity counted.
    pub months_counted: usize,
}

impl StaffBalance {
    /// Returns a copy with monetary values rounded for display.
    pub fn rounded(&self, decimal_places: u32) -> Self {
        Self {
            total_earned: self.total_earned.round_dp(decimal_places),
            total_paid: self.total_paid.round_dp(decimal_places),
            balance: self.balance.round_dp(decimal_places),
            daily_earned: self.daily_earned.round_dp(decimal_places),
            monthly_earned: self.monthly_earned.round_dp(decimal_places),
            ..self.clone()
        }
    }
}

/// The incentive earned on one stored day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyIncentive {
    /// The stored record, including its frozen rule.
    pub record: DailySaleRecord,
    /// The cliff calculation against the frozen rule.
    pub calculation: IncentiveCalculation,
}

impl DailyIncentive {
    /// Returns a copy with monetary values rounded for display.
    pub fn rounded(&self, decimal_places: u32) -> Self {
        Self {
            record: self.record.clone(),
            calculation: self.calculation.rounded(decimal_places),
        }
    }
}

/// The incentive earned over one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyIncentive {
    /// The month.
    pub year_month: YearMonth,
    /// Sales summed over the month's daily records.
    pub sales: MonthlySales,
    /// The monthly rule in effect at month end, if any.
    pub rule: Option<ResolvedRule>,
    /// The cliff calculation; zero when no rule applies.
    pub calculation: IncentiveCalculation,
}

impl MonthlyIncentive {
    /// Returns a copy with monetary values rounded for display.
    pub fn rounded(&self, decimal_places: u32) -> Self {
        Self {
            calculation: self.calculation.rounded(decimal_places),
            ..self.clone()
        }
    }
}
