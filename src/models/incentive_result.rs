//! Incentive calculation result models.
//!
//! This module contains the [`IncentiveCalculation`] type returned by the
//! calculator, along with the [`AuditStep`] that records how each amount was
//! reached.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of the cliff the achieved value landed on.
///
/// # Example
///
/// ```
/// use incentive_engine::models::IncentiveTier;
///
/// let tier = IncentiveTier::Double;
/// assert_eq!(serde_json::to_string(&tier).unwrap(), "\"double\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncentiveTier {
    /// Achieved value below target; no incentive.
    BelowTarget,
    /// Target reached; the standard rate applies.
    Standard,
    /// Twice the target reached; the double rate applies.
    Double,
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The outcome of applying the cliff formula to one period.
///
/// All values are kept at full precision; rounding is left to the reporting
/// boundary via [`IncentiveCalculation::rounded`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveCalculation {
    /// The value that had to be reached.
    pub target: Decimal,
    /// The value reached (sales plus review credits).
    pub achieved: Decimal,
    /// The value the rate is applied to.
    pub base: Decimal,
    /// The tier selected by the threshold comparison.
    pub tier: IncentiveTier,
    /// The rate applied (zero below target).
    pub rate_applied: Decimal,
    /// The incentive earned.
    pub amount: Decimal,
    /// How the amount was reached.
    pub audit_step: AuditStep,
}

impl IncentiveCalculation {
    /// A zero result for a period without an applicable rule.
    pub fn no_rule(rule_id: &str, reason: impl Into<String>) -> Self {
        Self {
            target: Decimal::ZERO,
            achieved: Decimal::ZERO,
            base: Decimal::ZERO,
            tier: IncentiveTier::BelowTarget,
            rate_applied: Decimal::ZERO,
            amount: Decimal::ZERO,
            audit_step: AuditStep {
                rule_id: rule_id.to_string(),
                rule_name: "No Applicable Rule".to_string(),
                input: serde_json::Value::Null,
                output: serde_json::json!({ "amount": "0" }),
                reasoning: reason.into(),
            },
        }
    }

    /// Returns a copy with monetary values rounded for display.
    pub fn rounded(&self, decimal_places: u32) -> Self {
        Self {
            target: self.target.round_dp(decimal_places),
            achieved: self.achieved.round_dp(decimal_places),
            base: self.base.round_dp(decimal_places),
            amount: self.amount.round_dp(decimal_places),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_rounded_only_touches_money() {
        let calc = IncentiveCalculation {
            target: dec("4838.709677419354838709677419"),
            achieved: dec("5000"),
            base: dec("5000"),
            tier: IncentiveTier::Standard,
            rate_applied: dec("0.0525"),
            amount: dec("262.5"),
            audit_step: AuditStep {
                rule_id: "daily_incentive".to_string(),
                rule_name: "Daily Incentive".to_string(),
                input: serde_json::Value::Null,
                output: serde_json::Value::Null,
                reasoning: String::new(),
            },
        };

        let rounded = calc.rounded(2);

        assert_eq!(rounded.target, dec("4838.71"));
        assert_eq!(rounded.amount, dec("262.50"));
        assert_eq!(rounded.rate_applied, dec("0.0525"));
        assert_eq!(rounded.tier, IncentiveTier::Standard);
    }

    #[test]
    fn test_no_rule_is_zero() {
        let calc = IncentiveCalculation::no_rule("monthly_incentive", "no monthly rule");
        assert_eq!(calc.amount, Decimal::ZERO);
        assert_eq!(calc.tier, IncentiveTier::BelowTarget);
        assert_eq!(calc.audit_step.reasoning, "no monthly rule");
    }
}
