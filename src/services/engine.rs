//! The engine facade exposed to callers and the HTTP layer.

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CurrentRules, DailyIncentive, DailySaleKey, DailySaleRecord, MonthlyIncentive, ReviewCounts,
    RuleSubmission, RuleType, RuleVersion, StaffBalance, SyncReport, YearMonth,
};
use crate::store::Stores;

use super::{BalanceService, BillingSyncEngine, RuleResolver};

/// Entry point for every incentive operation.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use incentive_engine::config::EngineConfig;
/// use incentive_engine::services::IncentiveEngine;
/// use incentive_engine::store::{MemoryStore, Stores};
///
/// let config = EngineConfig::default();
/// let stores = Stores::in_memory(Arc::new(MemoryStore::new()), config.store_timeout());
/// let engine = IncentiveEngine::new(stores, &config);
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let rules = runtime.block_on(engine.get_rules("tenant_a")).unwrap();
/// assert!(rules.daily.is_builtin());
/// assert!(rules.monthly.is_none());
/// ```
#[derive(Clone)]
pub struct IncentiveEngine {
    stores: Stores,
    resolver: RuleResolver,
    billing: BillingSyncEngine,
    balances: BalanceService,
}

impl IncentiveEngine {
    /// Wires the services over `stores` using the sync settings in `config`.
    pub fn new(stores: Stores, config: &EngineConfig) -> Self {
        let resolver = RuleResolver::new(stores.clone());
        let billing = BillingSyncEngine::new(
            stores.clone(),
            resolver.clone(),
            config.sync.max_concurrency,
        );
        let balances = BalanceService::new(stores.clone(), resolver.clone());
        Self {
            stores,
            resolver,
            billing,
            balances,
        }
    }

    /// Recomputes one tenant day from billing; see [`BillingSyncEngine::sync_day`].
    pub async fn sync(
        &self,
        tenant_id: &str,
        date: NaiveDate,
        staff_ids: &[String],
    ) -> EngineResult<SyncReport> {
        self.billing.sync_day(tenant_id, date, staff_ids).await
    }

    /// Returns the latest version of each rule type.
    pub async fn get_rules(&self, tenant_id: &str) -> EngineResult<CurrentRules> {
        self.resolver.current(tenant_id).await
    }

    /// Stores a new version of all four rule types at once.
    ///
    /// A submission missing any type is rejected and nothing is stored.
    pub async fn set_rules(
        &self,
        tenant_id: &str,
        submission: RuleSubmission,
    ) -> EngineResult<Vec<RuleVersion>> {
        if tenant_id.trim().is_empty() {
            return Err(EngineError::validation("tenant_id", "must not be empty"));
        }
        let rules = submission.into_rule_set()?;

        let versions = self
            .stores
            .call(
                "insert_rule_set",
                self.stores.rules.insert_rule_set(tenant_id, rules, Utc::now()),
            )
            .await?;
        info!(
            tenant_id = %tenant_id,
            versions = versions.len(),
            "Stored new rule versions"
        );
        Ok(versions)
    }

    /// Returns every stored version of a rule type, oldest first.
    pub async fn rule_history(
        &self,
        tenant_id: &str,
        rule_type: RuleType,
    ) -> EngineResult<Vec<RuleVersion>> {
        Ok(self.resolver.history(tenant_id, rule_type).await?.into_sorted())
    }

    /// Returns the earned-versus-paid balance of a staff member.
    pub async fn get_balance(&self, tenant_id: &str, staff_id: &str) -> EngineResult<StaffBalance> {
        self.balances.get_staff_balance(tenant_id, staff_id).await
    }

    /// Returns the incentive for one stored day.
    pub async fn get_daily_incentive(
        &self,
        tenant_id: &str,
        staff_id: &str,
        date: NaiveDate,
    ) -> EngineResult<DailyIncentive> {
        self.balances.daily_incentive(tenant_id, staff_id, date).await
    }

    /// Returns the incentive for one calendar month.
    pub async fn get_monthly_incentive(
        &self,
        tenant_id: &str,
        staff_id: &str,
        year_month: YearMonth,
    ) -> EngineResult<MonthlyIncentive> {
        self.balances
            .monthly_incentive(tenant_id, staff_id, year_month)
            .await
    }

    /// Sets the manually-entered review counts of a synced day.
    ///
    /// The day must already have been synced; later syncs keep these counts.
    pub async fn record_reviews(
        &self,
        tenant_id: &str,
        staff_id: &str,
        date: NaiveDate,
        reviews: ReviewCounts,
    ) -> EngineResult<DailySaleRecord> {
        let key = DailySaleKey::new(tenant_id, staff_id, date);
        let record = self
            .stores
            .call(
                "set_reviews",
                self.stores.daily_sales.set_reviews(&key, reviews),
            )
            .await?
            .ok_or_else(|| {
                EngineError::not_found("Daily sale record", format!("{}/{}", staff_id, date))
            })?;
        info!(
            tenant_id = %tenant_id,
            staff_id = %staff_id,
            date = %date,
            with_name = reviews.with_name,
            with_photo = reviews.with_photo,
            "Recorded reviews"
        );
        Ok(record)
    }

    /// Returns every stored daily record of a staff member, oldest first.
    pub async fn list_daily_sales(
        &self,
        tenant_id: &str,
        staff_id: &str,
    ) -> EngineResult<Vec<DailySaleRecord>> {
        self.stores
            .call(
                "list_daily_sales",
                self.stores.daily_sales.list_for_staff(tenant_id, staff_id),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RuleDraft;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn engine() -> IncentiveEngine {
        let config = EngineConfig::default();
        let stores = Stores::in_memory(Arc::new(MemoryStore::new()), config.store_timeout());
        IncentiveEngine::new(stores, &config)
    }

    fn full_submission(rate: Decimal) -> RuleSubmission {
        let mut daily = RuleDraft::default();
        daily.incentive.rate = Some(rate);
        RuleSubmission {
            daily: Some(daily),
            monthly: Some(RuleDraft::default()),
            package: Some(RuleDraft::default()),
            gift_card: Some(RuleDraft::default()),
        }
    }

    #[tokio::test]
    async fn test_set_rules_inserts_all_four_types() {
        let engine = engine();

        let versions = engine
            .set_rules("tenant_a", full_submission(Decimal::new(6, 2)))
            .await
            .unwrap();

        assert_eq!(versions.len(), 4);
        assert!(versions.iter().all(|v| v.created_at == versions[0].created_at));
        let rules = engine.get_rules("tenant_a").await.unwrap();
        assert_eq!(rules.daily.rule.incentive.rate, Decimal::new(6, 2));
        assert!(rules.monthly.is_some());
    }

    #[tokio::test]
    async fn test_partial_submission_is_rejected_and_nothing_stored() {
        let engine = engine();
        let mut submission = full_submission(Decimal::new(6, 2));
        submission.gift_card = None;

        let error = engine.set_rules("tenant_a", submission).await.unwrap_err();

        assert!(matches!(error, EngineError::Validation { .. }));
        assert!(error.to_string().contains("gift_card"));
        for rule_type in RuleType::ALL {
            assert!(engine.rule_history("tenant_a", rule_type).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_invalid_rule_values_are_rejected() {
        let engine = engine();
        let mut submission = full_submission(Decimal::new(6, 2));
        if let Some(daily) = submission.daily.as_mut() {
            daily.target.multiplier = Some(Decimal::ZERO);
        }

        let error = engine.set_rules("tenant_a", submission).await.unwrap_err();
        assert!(matches!(error, EngineError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_rule_history_is_oldest_first() {
        let engine = engine();
        engine.set_rules("tenant_a", full_submission(Decimal::new(6, 2))).await.unwrap();
        engine.set_rules("tenant_a", full_submission(Decimal::new(8, 2))).await.unwrap();

        let history = engine.rule_history("tenant_a", RuleType::Daily).await.unwrap();

        assert_eq!(history.len(), 2);
        assert!(history[0].version_key() < history[1].version_key());
        assert_eq!(history[1].draft.incentive.rate, Some(Decimal::new(8, 2)));
    }

    #[tokio::test]
    async fn test_record_reviews_requires_synced_day() {
        let engine = engine();
        let error = engine
            .record_reviews(
                "tenant_a",
                "stf_001",
                NaiveDate::from_ymd_opt(2026, 4, 10).unwrap(),
                ReviewCounts { with_name: 1, with_photo: 0 },
            )
            .await
            .unwrap_err();
        assert!(matches!(error, EngineError::NotFound { .. }));
    }
}
