//! Time-travel rule resolution.
//!
//! Rules are never edited in place; each change is a new [`RuleVersion`].
//! The rule in effect at an instant is the version with the greatest
//! `(created_at, sequence)` among those created at or before that instant.
//! `sequence` breaks ties between versions stored with identical timestamps.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::EngineResult;
use crate::models::{CurrentRules, ResolvedRule, RuleType, RuleVersion};
use crate::store::Stores;

/// Picks the version in effect at `cutoff` (inclusive).
///
/// # Example
///
/// ```
/// use incentive_engine::models::{RuleDraft, RuleType, RuleVersion};
/// use incentive_engine::services::select_version;
/// use chrono::{TimeZone, Utc};
/// use uuid::Uuid;
///
/// let at = |day| Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0).unwrap();
/// let version = |sequence, day| RuleVersion {
///     id: Uuid::new_v4(),
///     tenant_id: "t1".to_string(),
///     rule_type: RuleType::Daily,
///     sequence,
///     created_at: at(day),
///     draft: RuleDraft::default(),
/// };
/// let versions = [version(1, 1), version(2, 10)];
///
/// assert_eq!(select_version(&versions, at(9)).unwrap().sequence, 1);
/// assert_eq!(select_version(&versions, at(10)).unwrap().sequence, 2);
/// assert!(select_version(&versions, at(1) - chrono::TimeDelta::seconds(1)).is_none());
/// ```
pub fn select_version(versions: &[RuleVersion], cutoff: DateTime<Utc>) -> Option<&RuleVersion> {
    versions
        .iter()
        .filter(|v| v.created_at <= cutoff)
        .max_by_key(|v| v.version_key())
}

/// Every version of one rule type for one tenant, loaded once and queried
/// at many cutoffs.
#[derive(Debug, Clone)]
pub struct RuleHistory {
    rule_type: RuleType,
    versions: Vec<RuleVersion>,
}

impl RuleHistory {
    /// Wraps loaded versions.
    pub fn new(rule_type: RuleType, versions: Vec<RuleVersion>) -> Self {
        Self {
            rule_type,
            versions,
        }
    }

    /// The raw version in effect at `cutoff`.
    pub fn version_at(&self, cutoff: DateTime<Utc>) -> Option<&RuleVersion> {
        select_version(&self.versions, cutoff)
    }

    /// The merged rule in effect at `cutoff`.
    ///
    /// Daily always resolves, falling back to the built-in default. Other
    /// types resolve to `None` when no version exists, meaning the period
    /// earns nothing from that rule.
    pub fn resolve_at(&self, cutoff: DateTime<Utc>) -> Option<ResolvedRule> {
        match self.version_at(cutoff) {
            Some(version) => Some(ResolvedRule::from_version(version)),
            None if self.rule_type == RuleType::Daily => {
                Some(ResolvedRule::builtin(RuleType::Daily))
            }
            None => None,
        }
    }

    /// All versions, oldest first by `(created_at, sequence)`.
    pub fn into_sorted(mut self) -> Vec<RuleVersion> {
        self.versions.sort_by_key(|v| v.version_key());
        self.versions
    }
}

/// Resolves the rule in effect for a tenant at a given instant.
#[derive(Clone)]
pub struct RuleResolver {
    stores: Stores,
}

impl RuleResolver {
    /// Creates a resolver over the given stores.
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Loads every version of a rule type.
    pub async fn history(&self, tenant_id: &str, rule_type: RuleType) -> EngineResult<RuleHistory> {
        let versions = self
            .stores
            .call("rule_versions", self.stores.rules.versions(tenant_id, rule_type))
            .await?;
        Ok(RuleHistory::new(rule_type, versions))
    }

    /// Returns the stored version in effect at `cutoff`, if any.
    pub async fn resolve(
        &self,
        tenant_id: &str,
        rule_type: RuleType,
        cutoff: DateTime<Utc>,
    ) -> EngineResult<Option<RuleVersion>> {
        let history = self.history(tenant_id, rule_type).await?;
        Ok(history.version_at(cutoff).cloned())
    }

    /// Returns the merged rule in effect at `cutoff`; see [`RuleHistory::resolve_at`].
    pub async fn resolve_merged(
        &self,
        tenant_id: &str,
        rule_type: RuleType,
        cutoff: DateTime<Utc>,
    ) -> EngineResult<Option<ResolvedRule>> {
        let resolved = self
            .history(tenant_id, rule_type)
            .await?
            .resolve_at(cutoff);
        debug!(
            tenant_id = %tenant_id,
            rule_type = %rule_type,
            cutoff = %cutoff,
            version_id = ?resolved.as_ref().and_then(|r| r.version_id),
            "Resolved rule"
        );
        Ok(resolved)
    }

    /// Returns the fully-populated daily rule in effect at `cutoff`.
    pub async fn resolve_daily(
        &self,
        tenant_id: &str,
        cutoff: DateTime<Utc>,
    ) -> EngineResult<ResolvedRule> {
        let resolved = self
            .resolve_merged(tenant_id, RuleType::Daily, cutoff)
            .await?;
        Ok(resolved.unwrap_or_else(|| ResolvedRule::builtin(RuleType::Daily)))
    }

    /// Returns the latest version of every rule type.
    pub async fn current(&self, tenant_id: &str) -> EngineResult<CurrentRules> {
        let now = DateTime::<Utc>::MAX_UTC;
        Ok(CurrentRules {
            daily: self.resolve_daily(tenant_id, now).await?,
            monthly: self.resolve_merged(tenant_id, RuleType::Monthly, now).await?,
            package: self.resolve_merged(tenant_id, RuleType::Package, now).await?,
            gift_card: self.resolve_merged(tenant_id, RuleType::GiftCard, now).await?,
        })
    }
}
