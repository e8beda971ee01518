//! Cliff incentive calculation.
//!
//! This module applies the two-tier incentive formula to a day's or a
//! month's sales. The amount is a step function of the achieved value:
//!
//! | achieved            | amount             |
//! |---------------------|--------------------|
//! | `< target`          | 0                  |
//! | `>= target`         | `base * rate`      |
//! | `>= 2 * target`     | `base * double_rate` |
//!
//! Both comparisons are inclusive and nothing is interpolated between tiers.
//! Every multiplication is checked; a result beyond `Decimal`'s range is a
//! [`EngineError::CalculationError`], never a panic.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    ApplyOn, AuditStep, DailySaleRecord, IncentiveCalculation, IncentiveRule, IncentiveTier,
    MonthlySales, days_in_month,
};

/// Rule identifier recorded on daily audit steps.
pub const DAILY_INCENTIVE_RULE_ID: &str = "daily_incentive";

/// Rule identifier recorded on monthly audit steps.
pub const MONTHLY_INCENTIVE_RULE_ID: &str = "monthly_incentive";

/// Sales and review totals for one period, before any rule flags apply.
#[derive(Debug, Clone, Copy)]
struct PeriodSales {
    service_sale: Decimal,
    product_sale: Decimal,
    reviews_with_name: u64,
    reviews_with_photo: u64,
}

impl PeriodSales {
    /// Sales counted by the rule plus review credits.
    fn achieved(&self, rule: &IncentiveRule) -> EngineResult<Decimal> {
        let sales = &rule.sales;
        let mut achieved = Decimal::ZERO;
        if sales.include_service_sale {
            achieved = add(achieved, self.service_sale, "achieved")?;
        }
        if sales.include_product_sale {
            achieved = add(achieved, self.product_sale, "achieved")?;
        }
        let name_credit = mul(
            Decimal::from(self.reviews_with_name),
            sales.review_name_value,
            "review name credit",
        )?;
        let photo_credit = mul(
            Decimal::from(self.reviews_with_photo),
            sales.review_photo_value,
            "review photo credit",
        )?;
        achieved = add(achieved, name_credit, "achieved")?;
        add(achieved, photo_credit, "achieved")
    }

    fn base(&self, rule: &IncentiveRule, achieved: Decimal) -> Decimal {
        match rule.incentive.apply_on {
            ApplyOn::ServiceSaleOnly => self.service_sale,
            ApplyOn::TotalSaleValue => achieved,
        }
    }
}

fn overflow(quantity: &str) -> EngineError {
    EngineError::CalculationError {
        message: format!("{} exceeds the supported decimal range", quantity),
    }
}

fn add(a: Decimal, b: Decimal, quantity: &str) -> EngineResult<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow(quantity))
}

fn mul(a: Decimal, b: Decimal, quantity: &str) -> EngineResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow(quantity))
}

/// Selects the tier and rate for an achieved value.
///
/// # Example
///
/// ```
/// use incentive_engine::calculation::select_tier;
/// use incentive_engine::models::{IncentiveRule, IncentiveTier};
/// use rust_decimal::Decimal;
///
/// let rule = IncentiveRule::builtin_default();
/// let target = Decimal::from(5000);
///
/// let (tier, rate) = select_tier(Decimal::from(10000), target, &rule);
/// assert_eq!(tier, IncentiveTier::Double);
/// assert_eq!(rate, Decimal::new(10, 2));
/// ```
pub fn select_tier(
    achieved: Decimal,
    target: Decimal,
    rule: &IncentiveRule,
) -> (IncentiveTier, Decimal) {
    if achieved < target {
        (IncentiveTier::BelowTarget, Decimal::ZERO)
    } else if target
        .checked_mul(Decimal::TWO)
        .is_some_and(|double_target| achieved >= double_target)
    {
        (IncentiveTier::Double, rule.incentive.double_rate)
    } else {
        (IncentiveTier::Standard, rule.incentive.rate)
    }
}

fn apply_cliff(
    rule_id: &str,
    rule_name: &str,
    target: Decimal,
    sales: PeriodSales,
    rule: &IncentiveRule,
    mut input: serde_json::Value,
) -> EngineResult<IncentiveCalculation> {
    let achieved = sales.achieved(rule)?;
    let base = sales.base(rule, achieved);
    let (tier, rate_applied) = select_tier(achieved, target, rule);
    let amount = mul(base, rate_applied, "incentive amount")?;

    let reasoning = match tier {
        IncentiveTier::BelowTarget => format!(
            "Achieved {} is below target {}; no incentive",
            achieved, target
        ),
        IncentiveTier::Standard => format!(
            "Achieved {} reached target {}; {} x rate {} = {}",
            achieved, target, base, rate_applied, amount
        ),
        IncentiveTier::Double => format!(
            "Achieved {} reached twice target {}; {} x double rate {} = {}",
            achieved, target, base, rate_applied, amount
        ),
    };

    if let serde_json::Value::Object(map) = &mut input {
        map.insert(
            "service_sale".to_string(),
            serde_json::json!(sales.service_sale.to_string()),
        );
        map.insert(
            "product_sale".to_string(),
            serde_json::json!(sales.product_sale.to_string()),
        );
        map.insert(
            "reviews_with_name".to_string(),
            serde_json::json!(sales.reviews_with_name),
        );
        map.insert(
            "reviews_with_photo".to_string(),
            serde_json::json!(sales.reviews_with_photo),
        );
    }

    Ok(IncentiveCalculation {
        target,
        achieved,
        base,
        tier,
        rate_applied,
        amount,
        audit_step: AuditStep {
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            input,
            output: serde_json::json!({
                "target": target.to_string(),
                "achieved": achieved.to_string(),
                "base": base.to_string(),
                "tier": tier,
                "rate_applied": rate_applied.to_string(),
                "amount": amount.to_string()
            }),
            reasoning,
        },
    })
}

/// Calculates the daily incentive for a stored record.
///
/// The record's own frozen `applied_rule` is used, never a freshly-resolved
/// rule. The target is the salary multiple pro-rated over the days of the
/// record's month.
///
/// # Arguments
///
/// * `record` - The synced daily sale record
/// * `staff_salary` - The staff member's monthly salary (already validated as positive)
///
/// # Errors
///
/// `CalculationError` when an intermediate value overflows `Decimal`.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::compute_daily;
/// use incentive_engine::models::{DailySaleKey, DailySaleRecord, IncentiveRule, SalesAggregate};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// // April has 30 days: target = 30000 * 5 / 30 = 5000
/// let key = DailySaleKey::new("t1", "stf_001", NaiveDate::from_ymd_opt(2026, 4, 10).unwrap());
/// let sales = SalesAggregate {
///     service_sale: Decimal::from(4000),
///     product_sale: Decimal::from(2000),
///     customer_count: 3,
/// };
/// let record = DailySaleRecord::new(key, sales, IncentiveRule::builtin_default());
///
/// let result = compute_daily(&record, Decimal::from(30000)).unwrap();
/// assert_eq!(result.target, Decimal::from(5000));
/// assert_eq!(result.amount, Decimal::from(300));
/// ```
pub fn compute_daily(
    record: &DailySaleRecord,
    staff_salary: Decimal,
) -> EngineResult<IncentiveCalculation> {
    let rule = &record.applied_rule;
    let days = days_in_month(record.date);
    let target = mul(staff_salary, rule.target.multiplier, "daily target")? / Decimal::from(days);

    let sales = PeriodSales {
        service_sale: record.service_sale,
        product_sale: record.product_sale,
        reviews_with_name: u64::from(record.reviews_with_name),
        reviews_with_photo: u64::from(record.reviews_with_photo),
    };

    let input = serde_json::json!({
        "date": record.date.to_string(),
        "staff_salary": staff_salary.to_string(),
        "multiplier": rule.target.multiplier.to_string(),
        "days_in_month": days
    });

    apply_cliff(
        DAILY_INCENTIVE_RULE_ID,
        "Daily Incentive",
        target,
        sales,
        rule,
        input,
    )
}

/// Calculates the monthly incentive for summed month sales.
///
/// The target is the full salary multiple (no pro-ration); the monthly rule's
/// own sales flags decide what counts toward the achieved value. Fails like
/// [`compute_daily`] on overflow.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::compute_monthly;
/// use incentive_engine::models::{IncentiveRule, IncentiveTier, MonthlySales};
/// use rust_decimal::Decimal;
///
/// let month = MonthlySales {
///     service_sale: Decimal::from(100_000),
///     product_sale: Decimal::from(20_000),
///     ..MonthlySales::default()
/// };
/// let mut rule = IncentiveRule::builtin_default();
/// rule.target.multiplier = Decimal::from(3);
///
/// // target = 30000 * 3 = 90000; achieved = 120000
/// let result = compute_monthly(&month, Decimal::from(30000), &rule).unwrap();
/// assert_eq!(result.tier, IncentiveTier::Standard);
/// assert_eq!(result.amount, Decimal::from(6000));
/// ```
pub fn compute_monthly(
    month: &MonthlySales,
    staff_salary: Decimal,
    rule: &IncentiveRule,
) -> EngineResult<IncentiveCalculation> {
    let target = mul(staff_salary, rule.target.multiplier, "monthly target")?;

    let sales = PeriodSales {
        service_sale: month.service_sale,
        product_sale: month.product_sale,
        reviews_with_name: month.reviews_with_name,
        reviews_with_photo: month.reviews_with_photo,
    };

    let input = serde_json::json!({
        "staff_salary": staff_salary.to_string(),
        "multiplier": rule.target.multiplier.to_string(),
        "days_recorded": month.days_recorded
    });

    apply_cliff(
        MONTHLY_INCENTIVE_RULE_ID,
        "Monthly Incentive",
        target,
        sales,
        rule,
        input,
    )
}
