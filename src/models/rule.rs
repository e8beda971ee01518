//! Incentive rule models.
//!
//! Rules are stored as immutable [`RuleVersion`]s holding a [`RuleDraft`]
//! (every field optional, as tenants may save partially-filled settings).
//! Calculations only ever see a fully-populated [`IncentiveRule`], produced
//! by merging a draft onto a complete base rule with [`RuleDraft::merge_onto`].

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Largest accepted salary multiplier for a target.
pub const MAX_TARGET_MULTIPLIER: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Largest accepted incentive rate (100%).
pub const MAX_RATE: Decimal = Decimal::ONE;

/// Largest accepted money value on a rule.
pub const MAX_MONEY_VALUE: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// The kind of incentive rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Per-day cliff incentive, snapshotted into each daily sale record.
    Daily,
    /// Per-calendar-month cliff incentive, resolved at query time.
    Monthly,
    /// Package sale incentive.
    Package,
    /// Gift card sale incentive.
    GiftCard,
}

impl RuleType {
    /// Every rule type, in the order a rule set lists them.
    pub const ALL: [RuleType; 4] = [
        RuleType::Daily,
        RuleType::Monthly,
        RuleType::Package,
        RuleType::GiftCard,
    ];

    /// Returns the snake_case name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Daily => "daily",
            RuleType::Monthly => "monthly",
            RuleType::Package => "package",
            RuleType::GiftCard => "gift_card",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                EngineError::validation("rule_type", format!("unknown rule type '{}'", s))
            })
    }
}

/// Which sales figure the incentive rate is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOn {
    /// The rate applies to the full achieved value.
    TotalSaleValue,
    /// The rate applies to service sales only.
    ServiceSaleOnly,
}

/// Target settings of a resolved rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Salary multiplier that defines the target.
    pub multiplier: Decimal,
    /// Fixed threshold used by package and gift card rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<Decimal>,
}

/// Which sales count toward the achieved value, and what reviews are worth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesConfig {
    /// Count service sales toward the achieved value.
    pub include_service_sale: bool,
    /// Count product sales toward the achieved value.
    pub include_product_sale: bool,
    /// Count package sales toward the achieved value.
    pub include_package_sale: bool,
    /// Count gift card sales toward the achieved value.
    pub include_gift_card_sale: bool,
    /// Value credited per review that names the staff member.
    pub review_name_value: Decimal,
    /// Value credited per review that carries a photo.
    pub review_photo_value: Decimal,
}

/// Rate settings of a resolved rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveConfig {
    /// Rate applied once the target is reached.
    pub rate: Decimal,
    /// Rate applied once twice the target is reached.
    pub double_rate: Decimal,
    /// The base the rate is applied to.
    pub apply_on: ApplyOn,
}

/// A fully-populated incentive rule.
///
/// This is the shape embedded into daily sale records as the frozen
/// snapshot, and the only shape the calculator accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveRule {
    /// Target settings.
    pub target: TargetConfig,
    /// Sales settings.
    pub sales: SalesConfig,
    /// Rate settings.
    pub incentive: IncentiveConfig,
}

impl IncentiveRule {
    /// The built-in rule used when a tenant has never stored a daily rule,
    /// and the base that partial stored rules are merged onto.
    ///
    /// # Example
    ///
    /// ```
    /// use incentive_engine::models::{ApplyOn, IncentiveRule};
    /// use rust_decimal::Decimal;
    ///
    /// let rule = IncentiveRule::builtin_default();
    /// assert_eq!(rule.target.multiplier, Decimal::from(5));
    /// assert_eq!(rule.incentive.rate, Decimal::new(5, 2));
    /// assert_eq!(rule.incentive.double_rate, Decimal::new(10, 2));
    /// assert_eq!(rule.incentive.apply_on, ApplyOn::TotalSaleValue);
    /// ```
    pub fn builtin_default() -> Self {
        Self {
            target: TargetConfig {
                multiplier: Decimal::from(5),
                target_value: None,
            },
            sales: SalesConfig {
                include_service_sale: true,
                include_product_sale: true,
                include_package_sale: false,
                include_gift_card_sale: false,
                review_name_value: Decimal::from(200),
                review_photo_value: Decimal::from(300),
            },
            incentive: IncentiveConfig {
                rate: Decimal::new(5, 2),
                double_rate: Decimal::new(10, 2),
                apply_on: ApplyOn::TotalSaleValue,
            },
        }
    }
}

/// Target section of a stored rule document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetDraft {
    /// Salary multiplier.
    pub multiplier: Option<Decimal>,
    /// Fixed threshold for package and gift card rules.
    pub target_value: Option<Decimal>,
}

/// Sales section of a stored rule document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesDraft {
    /// Count service sales.
    pub include_service_sale: Option<bool>,
    /// Count product sales.
    pub include_product_sale: Option<bool>,
    /// Count package sales.
    pub include_package_sale: Option<bool>,
    /// Count gift card sales.
    pub include_gift_card_sale: Option<bool>,
    /// Value per named review.
    pub review_name_value: Option<Decimal>,
    /// Value per photo review.
    pub review_photo_value: Option<Decimal>,
}

/// Incentive section of a stored rule document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncentiveDraft {
    /// Standard tier rate.
    pub rate: Option<Decimal>,
    /// Double tier rate.
    pub double_rate: Option<Decimal>,
    /// Rate base.
    pub apply_on: Option<ApplyOn>,
}

/// A stored rule document, possibly partial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleDraft {
    /// Target section.
    pub target: TargetDraft,
    /// Sales section.
    pub sales: SalesDraft,
    /// Incentive section.
    pub incentive: IncentiveDraft,
}

impl RuleDraft {
    /// Fills every missing field of this draft from `base`.
    ///
    /// # Example
    ///
    /// ```
    /// use incentive_engine::models::{IncentiveRule, RuleDraft};
    /// use rust_decimal::Decimal;
    ///
    /// let mut draft = RuleDraft::default();
    /// draft.incentive.rate = Some(Decimal::new(8, 2));
    ///
    /// let rule = draft.merge_onto(&IncentiveRule::builtin_default());
    /// assert_eq!(rule.incentive.rate, Decimal::new(8, 2));
    /// assert_eq!(rule.incentive.double_rate, Decimal::new(10, 2));
    /// ```
    pub fn merge_onto(&self, base: &IncentiveRule) -> IncentiveRule {
        IncentiveRule {
            target: TargetConfig {
                multiplier: self.target.multiplier.unwrap_or(base.target.multiplier),
                target_value: self.target.target_value.or(base.target.target_value),
            },
            sales: SalesConfig {
                include_service_sale: self
                    .sales
                    .include_service_sale
                    .unwrap_or(base.sales.include_service_sale),
                include_product_sale: self
                    .sales
                    .include_product_sale
                    .unwrap_or(base.sales.include_product_sale),
                include_package_sale: self
                    .sales
                    .include_package_sale
                    .unwrap_or(base.sales.include_package_sale),
                include_gift_card_sale: self
                    .sales
                    .include_gift_card_sale
                    .unwrap_or(base.sales.include_gift_card_sale),
                review_name_value: self
                    .sales
                    .review_name_value
                    .unwrap_or(base.sales.review_name_value),
                review_photo_value: self
                    .sales
                    .review_photo_value
                    .unwrap_or(base.sales.review_photo_value),
            },
            incentive: IncentiveConfig {
                rate: self.incentive.rate.unwrap_or(base.incentive.rate),
                double_rate: self
                    .incentive
                    .double_rate
                    .unwrap_or(base.incentive.double_rate),
                apply_on: self.incentive.apply_on.unwrap_or(base.incentive.apply_on),
            },
        }
    }

    /// Rejects values outside the ranges the calculator accepts.
    ///
    /// The multiplier must lie in `(0, 1000]`, rates in `[0, 1]` and money
    /// values in `[0, 1e12]`.
    pub fn validate(&self, rule_type: RuleType) -> EngineResult<()> {
        let field = |name: &str| format!("{}.{}", rule_type, name);

        if let Some(multiplier) = self.target.multiplier {
            if multiplier <= Decimal::ZERO {
                return Err(EngineError::validation(
                    field("target.multiplier"),
                    "must be greater than zero",
                ));
            }
            if multiplier > MAX_TARGET_MULTIPLIER {
                return Err(EngineError::validation(
                    field("target.multiplier"),
                    format!("must not exceed {}", MAX_TARGET_MULTIPLIER),
                ));
            }
        }

        let bounded = [
            ("target.target_value", self.target.target_value, MAX_MONEY_VALUE),
            ("sales.review_name_value", self.sales.review_name_value, MAX_MONEY_VALUE),
            ("sales.review_photo_value", self.sales.review_photo_value, MAX_MONEY_VALUE),
            ("incentive.rate", self.incentive.rate, MAX_RATE),
            ("incentive.double_rate", self.incentive.double_rate, MAX_RATE),
        ];
        for (name, value, max) in bounded {
            let Some(value) = value else { continue };
            if value < Decimal::ZERO {
                return Err(EngineError::validation(field(name), "must not be negative"));
            }
            if value > max {
                return Err(EngineError::validation(
                    field(name),
                    format!("must not exceed {}", max),
                ));
            }
        }
        Ok(())
    }
}

impl From<&IncentiveRule> for RuleDraft {
    fn from(rule: &IncentiveRule) -> Self {
        Self {
            target: TargetDraft {
                multiplier: Some(rule.target.multiplier),
                target_value: rule.target.target_value,
            },
            sales: SalesDraft {
                include_service_sale: Some(rule.sales.include_service_sale),
                include_product_sale: Some(rule.sales.include_product_sale),
                include_package_sale: Some(rule.sales.include_package_sale),
                include_gift_card_sale: Some(rule.sales.include_gift_card_sale),
                review_name_value: Some(rule.sales.review_name_value),
                review_photo_value: Some(rule.sales.review_photo_value),
            },
            incentive: IncentiveDraft {
                rate: Some(rule.incentive.rate),
                double_rate: Some(rule.incentive.double_rate),
                apply_on: Some(rule.incentive.apply_on),
            },
        }
    }
}

/// An immutable stored rule version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleVersion {
    /// Unique identifier of this version.
    pub id: Uuid,
    /// The owning tenant.
    pub tenant_id: String,
    /// The rule kind.
    pub rule_type: RuleType,
    /// Store-assigned insertion order; breaks ties on equal `created_at`.
    pub sequence: u64,
    /// When this version took effect.
    pub created_at: DateTime<Utc>,
    /// The stored document.
    pub draft: RuleDraft,
}

impl RuleVersion {
    /// Ordering key for "latest version" queries.
    pub fn version_key(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.sequence)
    }
}

/// One document per rule type, submitted together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Daily rule document.
    pub daily: RuleDraft,
    /// Monthly rule document.
    pub monthly: RuleDraft,
    /// Package rule document.
    pub package: RuleDraft,
    /// Gift card rule document.
    pub gift_card: RuleDraft,
}

impl RuleSet {
    /// Returns the documents paired with their type, in [`RuleType::ALL`] order.
    pub fn entries(&self) -> [(RuleType, &RuleDraft); 4] {
        [
            (RuleType::Daily, &self.daily),
            (RuleType::Monthly, &self.monthly),
            (RuleType::Package, &self.package),
            (RuleType::GiftCard, &self.gift_card),
        ]
    }

    /// Validates every document in the set.
    pub fn validate(&self) -> EngineResult<()> {
        self.entries()
            .into_iter()
            .try_for_each(|(rule_type, draft)| draft.validate(rule_type))
    }
}

/// A rule submission as received from a caller; every type is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSubmission {
    /// Daily rule document.
    pub daily: Option<RuleDraft>,
    /// Monthly rule document.
    pub monthly: Option<RuleDraft>,
    /// Package rule document.
    pub package: Option<RuleDraft>,
    /// Gift card rule document.
    pub gift_card: Option<RuleDraft>,
}

impl RuleSubmission {
    /// Converts into a complete [`RuleSet`], rejecting partial submissions.
    ///
    /// # Example
    ///
    /// ```
    /// use incentive_engine::models::{RuleDraft, RuleSubmission};
    ///
    /// let partial = RuleSubmission {
    ///     daily: Some(RuleDraft::default()),
    ///     ..RuleSubmission::default()
    /// };
    /// let error = partial.into_rule_set().unwrap_err();
    /// assert!(error.to_string().contains("monthly, package, gift_card"));
    /// ```
    pub fn into_rule_set(self) -> EngineResult<RuleSet> {
        match (self.daily, self.monthly, self.package, self.gift_card) {
            (Some(daily), Some(monthly), Some(package), Some(gift_card)) => {
                let set = RuleSet {
                    daily,
                    monthly,
                    package,
                    gift_card,
                };
                set.validate()?;
                Ok(set)
            }
            (daily, monthly, package, gift_card) => {
                let missing: Vec<&str> = [
                    (RuleType::Daily, daily.is_none()),
                    (RuleType::Monthly, monthly.is_none()),
                    (RuleType::Package, package.is_none()),
                    (RuleType::GiftCard, gift_card.is_none()),
                ]
                .into_iter()
                .filter(|(_, is_missing)| *is_missing)
                .map(|(rule_type, _)| rule_type.as_str())
                .collect();
                Err(EngineError::validation(
                    "rules",
                    format!("all four rule types are required; missing {}", missing.join(", ")),
                ))
            }
        }
    }
}

/// A rule as it applies at some instant, with the version it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRule {
    /// The rule kind.
    pub rule_type: RuleType,
    /// The stored version, or `None` for the built-in default.
    pub version_id: Option<Uuid>,
    /// When the stored version took effect.
    pub effective_from: Option<DateTime<Utc>>,
    /// The fully-populated rule.
    pub rule: IncentiveRule,
}

impl ResolvedRule {
    /// Resolves `version` by merging it onto the built-in default.
    pub fn from_version(version: &RuleVersion) -> Self {
        Self {
            rule_type: version.rule_type,
            version_id: Some(version.id),
            effective_from: Some(version.created_at),
            rule: version.draft.merge_onto(&IncentiveRule::builtin_default()),
        }
    }

    /// The built-in default for `rule_type`.
    pub fn builtin(rule_type: RuleType) -> Self {
        Self {
            rule_type,
            version_id: None,
            effective_from: None,
            rule: IncentiveRule::builtin_default(),
        }
    }

    /// True when no stored version was found.
    pub fn is_builtin(&self) -> bool {
        self.version_id.is_none()
    }
}

/// The latest rule of every type for a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentRules {
    /// Daily rule; the built-in default when none is stored.
    pub daily: ResolvedRule,
    /// Monthly rule, if any.
    pub monthly: Option<ResolvedRule>,
    /// Package rule, if any.
    pub package: Option<ResolvedRule>,
    /// Gift card rule, if any.
    pub gift_card: Option<ResolvedRule>,
}
