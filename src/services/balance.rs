//! Earned-versus-paid balance reconciliation.
//!
//! Earned incentives come from two sources with different rule lifetimes:
//! daily amounts use the rule frozen into each record at sync time, while
//! monthly amounts resolve the monthly rule live with the month's last
//! instant as cutoff. A month without a monthly rule earns nothing.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::calculation::{MONTHLY_INCENTIVE_RULE_ID, compute_daily, compute_monthly};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    DailyIncentive, DailySaleKey, DailySaleRecord, IncentiveCalculation, MonthlyIncentive,
    MonthlySales, PayoutStatus, ResolvedRule, RuleType, StaffBalance, YearMonth,
};
use crate::store::Stores;

use super::RuleResolver;

/// Computes single-period incentives and the outstanding staff balance.
#[derive(Clone)]
pub struct BalanceService {
    stores: Stores,
    resolver: RuleResolver,
}

impl BalanceService {
    /// Creates a balance service over the given stores.
    pub fn new(stores: Stores, resolver: RuleResolver) -> Self {
        Self { stores, resolver }
    }

    /// Returns the staff member's positive salary.
    ///
    /// # Errors
    ///
    /// `NotFound` when the staff member does not exist, `Configuration` when
    /// the salary is missing or not positive.
    pub async fn staff_salary(&self, tenant_id: &str, staff_id: &str) -> EngineResult<Decimal> {
        let staff = self
            .stores
            .call("get_staff", self.stores.staff.get_staff(tenant_id, staff_id))
            .await?
            .ok_or_else(|| EngineError::not_found("Staff", staff_id))?;
        staff.require_salary()
    }

    /// Calculates the balance for one staff member.
    ///
    /// The balance is `total_earned - total_paid` and is reported as-is, so
    /// it is negative when approved advances exceed earnings.
    pub async fn get_staff_balance(
        &self,
        tenant_id: &str,
        staff_id: &str,
    ) -> EngineResult<StaffBalance> {
        let salary = self.staff_salary(tenant_id, staff_id).await?;
        let records = self.records(tenant_id, staff_id).await?;

        let mut daily_earned = Decimal::ZERO;
        for record in &records {
            daily_earned = add(daily_earned, compute_daily(record, salary)?.amount)?;
        }

        let mut months: BTreeMap<YearMonth, MonthlySales> = BTreeMap::new();
        for record in &records {
            months.entry(record.month()).or_default().add(record);
        }

        let monthly_rules = self.resolver.history(tenant_id, RuleType::Monthly).await?;
        let mut monthly_earned = Decimal::ZERO;
        for (month, sales) in &months {
            if let Some(resolved) = monthly_rules.resolve_at(month.end_cutoff()) {
                let amount = compute_monthly(sales, salary, &resolved.rule)?.amount;
                monthly_earned = add(monthly_earned, amount)?;
            }
        }

        let total_paid: Decimal = self
            .stores
            .call(
                "payouts_for_staff",
                self.stores
                    .payouts
                    .payouts_for_staff(tenant_id, staff_id, Some(PayoutStatus::Approved)),
            )
            .await?
            .iter()
            .filter(|payout| payout.is_approved())
            .map(|payout| payout.amount)
            .sum();

        let total_earned = add(daily_earned, monthly_earned)?;
        debug!(
            tenant_id = %tenant_id,
            staff_id = %staff_id,
            records = records.len(),
            months = months.len(),
            total_earned = %total_earned,
            total_paid = %total_paid,
            "Computed staff balance"
        );

        Ok(StaffBalance {
            tenant_id: tenant_id.to_string(),
            staff_id: staff_id.to_string(),
            total_earned,
            total_paid,
            balance: total_earned - total_paid,
            daily_earned,
            monthly_earned,
            records_counted: records.len(),
            months_counted: months.len(),
        })
    }

    /// Calculates the incentive for one stored day against its frozen rule.
    pub async fn daily_incentive(
        &self,
        tenant_id: &str,
        staff_id: &str,
        date: NaiveDate,
    ) -> EngineResult<DailyIncentive> {
        let salary = self.staff_salary(tenant_id, staff_id).await?;
        let key = DailySaleKey::new(tenant_id, staff_id, date);
        let record = self
            .stores
            .call("get_daily_sale", self.stores.daily_sales.get(&key))
            .await?
            .ok_or_else(|| {
                EngineError::not_found("Daily sale record", format!("{}/{}", staff_id, date))
            })?;

        let calculation = compute_daily(&record, salary)?;
        Ok(DailyIncentive {
            record,
            calculation,
        })
    }

    /// Calculates the incentive for one calendar month.
    ///
    /// A month without records sums to zero sales; a month without a monthly
    /// rule in effect at its end earns nothing.
    pub async fn monthly_incentive(
        &self,
        tenant_id: &str,
        staff_id: &str,
        year_month: YearMonth,
    ) -> EngineResult<MonthlyIncentive> {
        let salary = self.staff_salary(tenant_id, staff_id).await?;
        let records = self.records(tenant_id, staff_id).await?;
        let sales = MonthlySales::from_records(
            records
                .iter()
                .filter(|record| year_month.contains(record.date)),
        );

        let rule = self
            .resolver
            .resolve_merged(tenant_id, RuleType::Monthly, year_month.end_cutoff())
            .await?;
        let calculation = monthly_calculation(&sales, salary, rule.as_ref(), year_month)?;

        Ok(MonthlyIncentive {
            year_month,
            sales,
            rule,
            calculation,
        })
    }

    async fn records(&self, tenant_id: &str, staff_id: &str) -> EngineResult<Vec<DailySaleRecord>> {
        self.stores
            .call(
                "list_daily_sales",
                self.stores.daily_sales.list_for_staff(tenant_id, staff_id),
            )
            .await
    }
}

fn monthly_calculation(
    sales: &MonthlySales,
    salary: Decimal,
    rule: Option<&ResolvedRule>,
    year_month: YearMonth,
) -> EngineResult<IncentiveCalculation> {
    match rule {
        Some(resolved) => compute_monthly(sales, salary, &resolved.rule),
        None => Ok(IncentiveCalculation::no_rule(
            MONTHLY_INCENTIVE_RULE_ID,
            format!("No monthly rule in effect at the end of {}", year_month),
        )),
    }
}

fn add(total: Decimal, amount: Decimal) -> EngineResult<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| EngineError::CalculationError {
            message: "total earned exceeds the supported decimal range".to_string(),
        })
}
