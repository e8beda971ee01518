//! In-memory implementation of every store.
//!
//! Backs the standalone binary and the test suite. The external
//! collaborators (billing, staff, payouts) are seeded with the `put_*`
//! methods. Failures and latency can be injected to exercise the engine's
//! error paths.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    DailySaleKey, DailySaleRecord, IncentivePayout, IncentiveRule, Invoice, PayoutStatus,
    ReviewCounts, RuleSet, RuleType, RuleVersion, SalesAggregate, Staff,
};

use super::{DailySaleStore, InvoiceSource, PayoutLedger, RuleStore, StaffDirectory};

/// A store operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// Reading rule versions.
    RuleRead,
    /// Inserting a rule set.
    RuleWrite,
    /// Reading invoices.
    InvoiceRead,
    /// Reading daily sale records.
    DailySaleRead,
    /// Writing daily sale records.
    DailySaleWrite,
    /// Reading staff.
    StaffRead,
    /// Reading payouts.
    PayoutRead,
}

#[derive(Default)]
struct RuleLog {
    next_sequence: u64,
    versions: HashMap<(String, RuleType), Vec<RuleVersion>>,
}

/// Stores everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    rules: RwLock<RuleLog>,
    daily_sales: RwLock<HashMap<DailySaleKey, DailySaleRecord>>,
    invoices: RwLock<Vec<Invoice>>,
    staff: RwLock<HashMap<(String, String), Staff>>,
    payouts: RwLock<Vec<IncentivePayout>>,
    fail_points: RwLock<HashSet<FailPoint>>,
    fail_upsert_for: RwLock<HashSet<String>>,
    latency: RwLock<Option<Duration>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a staff record.
    pub async fn put_staff(&self, staff: Staff) {
        let key = (staff.tenant_id.clone(), staff.id.clone());
        self.staff.write().await.insert(key, staff);
    }

    /// Adds an invoice to the billing source.
    pub async fn put_invoice(&self, invoice: Invoice) {
        self.invoices.write().await.push(invoice);
    }

    /// Adds or replaces a payout, matched by id.
    pub async fn put_payout(&self, payout: IncentivePayout) {
        let mut payouts = self.payouts.write().await;
        match payouts.iter_mut().find(|p| p.id == payout.id) {
            Some(existing) => *existing = payout,
            None => payouts.push(payout),
        }
    }

    /// Moves a payout to a new status. Returns false if the id is unknown.
    pub async fn set_payout_status(&self, payout_id: &str, status: PayoutStatus) -> bool {
        let mut payouts = self.payouts.write().await;
        match payouts.iter_mut().find(|p| p.id == payout_id) {
            Some(payout) => {
                payout.status = status;
                payout.decided_at = match status {
                    PayoutStatus::Pending => None,
                    PayoutStatus::Approved | PayoutStatus::Rejected => Some(Utc::now()),
                };
                true
            }
            None => false,
        }
    }

    /// Makes every call through `point` fail with a transient error.
    pub async fn set_fail(&self, point: FailPoint, fail: bool) {
        let mut points = self.fail_points.write().await;
        if fail {
            points.insert(point);
        } else {
            points.remove(&point);
        }
    }

    /// Makes daily sale upserts touching one staff member fail.
    pub async fn set_fail_upsert_for(&self, staff_id: &str, fail: bool) {
        let mut staff = self.fail_upsert_for.write().await;
        if fail {
            staff.insert(staff_id.to_string());
        } else {
            staff.remove(staff_id);
        }
    }

    /// Delays every store call by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().await = latency;
    }

    /// Total number of daily sale records across all tenants.
    pub async fn daily_sale_count(&self) -> usize {
        self.daily_sales.read().await.len()
    }

    async fn enter(&self, point: FailPoint, operation: &str) -> EngineResult<()> {
        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_points.read().await.contains(&point) {
            return Err(EngineError::transient(operation, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn insert_rule_set(
        &self,
        tenant_id: &str,
        rules: RuleSet,
        created_at: DateTime<Utc>,
    ) -> EngineResult<Vec<RuleVersion>> {
        self.enter(FailPoint::RuleWrite, "insert_rule_set").await?;

        let mut log = self.rules.write().await;
        let mut inserted = Vec::with_capacity(RuleType::ALL.len());
        for (rule_type, draft) in rules.entries() {
            log.next_sequence += 1;
            let version = RuleVersion {
                id: Uuid::new_v4(),
                tenant_id: tenant_id.to_string(),
                rule_type,
                sequence: log.next_sequence,
                created_at,
                draft: draft.clone(),
            };
            log.versions
                .entry((tenant_id.to_string(), rule_type))
                .or_default()
                .push(version.clone());
            inserted.push(version);
        }
        Ok(inserted)
    }

    async fn versions(
        &self,
        tenant_id: &str,
        rule_type: RuleType,
    ) -> EngineResult<Vec<RuleVersion>> {
        self.enter(FailPoint::RuleRead, "rule_versions").await?;

        let log = self.rules.read().await;
        Ok(log
            .versions
            .get(&(tenant_id.to_string(), rule_type))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl DailySaleStore for MemoryStore {
    async fn upsert_sales(
        &self,
        key: DailySaleKey,
        sales: SalesAggregate,
        applied_rule: IncentiveRule,
    ) -> EngineResult<DailySaleRecord> {
        self.enter(FailPoint::DailySaleWrite, "upsert_daily_sale").await?;
        if self.fail_upsert_for.read().await.contains(&key.staff_id) {
            return Err(EngineError::transient("upsert_daily_sale", "injected failure"));
        }

        // Single write lock: the insert-or-update is one atomic step.
        let mut records = self.daily_sales.write().await;
        let record = records
            .entry(key.clone())
            .and_modify(|record| record.apply_sync(sales.clone(), applied_rule.clone()))
            .or_insert_with(|| DailySaleRecord::new(key, sales, applied_rule));
        Ok(record.clone())
    }

    async fn upsert_sales_batch(
        &self,
        rows: Vec<(DailySaleKey, SalesAggregate)>,
        applied_rule: IncentiveRule,
    ) -> EngineResult<Vec<DailySaleRecord>> {
        self.enter(FailPoint::DailySaleWrite, "upsert_daily_sales").await?;
        {
            let failing = self.fail_upsert_for.read().await;
            if let Some((key, _)) = rows.iter().find(|(key, _)| failing.contains(&key.staff_id)) {
                return Err(EngineError::transient(
                    "upsert_daily_sales",
                    format!("injected failure for staff '{}'", key.staff_id),
                ));
            }
        }

        // One write lock for the whole batch: readers see all rows or none.
        let mut records = self.daily_sales.write().await;
        Ok(rows
            .into_iter()
            .map(|(key, sales)| {
                records
                    .entry(key.clone())
                    .and_modify(|record| record.apply_sync(sales.clone(), applied_rule.clone()))
                    .or_insert_with(|| DailySaleRecord::new(key, sales, applied_rule.clone()))
                    .clone()
            })
            .collect())
    }

    async fn get(&self, key: &DailySaleKey) -> EngineResult<Option<DailySaleRecord>> {
        self.enter(FailPoint::DailySaleRead, "get_daily_sale").await?;
        Ok(self.daily_sales.read().await.get(key).cloned())
    }

    async fn list_for_staff(
        &self,
        tenant_id: &str,
        staff_id: &str,
    ) -> EngineResult<Vec<DailySaleRecord>> {
        self.enter(FailPoint::DailySaleRead, "list_daily_sales").await?;

        let records = self.daily_sales.read().await;
        let mut found: Vec<DailySaleRecord> = records
            .values()
            .filter(|r| r.tenant_id == tenant_id && r.staff_id == staff_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.date);
        Ok(found)
    }

    async fn set_reviews(
        &self,
        key: &DailySaleKey,
        reviews: ReviewCounts,
    ) -> EngineResult<Option<DailySaleRecord>> {
        self.enter(FailPoint::DailySaleWrite, "set_reviews").await?;

        let mut records = self.daily_sales.write().await;
        Ok(records.get_mut(key).map(|record| {
            record.reviews_with_name = reviews.with_name;
            record.reviews_with_photo = reviews.with_photo;
            record.clone()
        }))
    }
}

#[async_trait]
impl InvoiceSource for MemoryStore {
    async fn invoices_between(
        &self,
        tenant_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<Invoice>> {
        self.enter(FailPoint::InvoiceRead, "invoices_between").await?;

        let invoices = self.invoices.read().await;
        Ok(invoices
            .iter()
            .filter(|i| i.tenant_id == tenant_id && i.created_at >= start && i.created_at <= end)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StaffDirectory for MemoryStore {
    async fn get_staff(&self, tenant_id: &str, staff_id: &str) -> EngineResult<Option<Staff>> {
        self.enter(FailPoint::StaffRead, "get_staff").await?;

        let staff = self.staff.read().await;
        Ok(staff
            .get(&(tenant_id.to_string(), staff_id.to_string()))
            .cloned())
    }
}

#[async_trait]
impl PayoutLedger for MemoryStore {
    async fn payouts_for_staff(
        &self,
        tenant_id: &str,
        staff_id: &str,
        status: Option<PayoutStatus>,
    ) -> EngineResult<Vec<IncentivePayout>> {
        self.enter(FailPoint::PayoutRead, "payouts_for_staff").await?;

        let payouts = self.payouts.read().await;
        Ok(payouts
            .iter()
            .filter(|p| p.tenant_id == tenant_id && p.staff_id == staff_id)
            .filter(|p| status.is_none_or(|s| p.status == s))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RuleDraft;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    fn rule_set() -> RuleSet {
        RuleSet {
            daily: RuleDraft::default(),
            monthly: RuleDraft::default(),
            package: RuleDraft::default(),
            gift_card: RuleDraft::default(),
        }
    }

    fn key() -> DailySaleKey {
        DailySaleKey::new("tenant_a", "stf_001", NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
    }

    fn sales(service: i64) -> SalesAggregate {
        SalesAggregate {
            service_sale: Decimal::from(service),
            product_sale: Decimal::ZERO,
            customer_count: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_rule_set_assigns_consecutive_sequences() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let first = store.insert_rule_set("tenant_a", rule_set(), at).await.unwrap();
        let second = store.insert_rule_set("tenant_a", rule_set(), at).await.unwrap();

        let sequences: Vec<u64> = first.iter().chain(&second).map(|v| v.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(
            store.versions("tenant_a", RuleType::Daily).await.unwrap().len(),
            2
        );
        assert!(store.versions("tenant_b", RuleType::Daily).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_rule_insert_stores_nothing() {
        let store = MemoryStore::new();
        store.set_fail(FailPoint::RuleWrite, true).await;

        let result = store.insert_rule_set("tenant_a", rule_set(), Utc::now()).await;

        assert!(result.unwrap_err().is_retryable());
        for rule_type in RuleType::ALL {
            assert!(store.versions("tenant_a", rule_type).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_preserves_reviews() {
        let store = MemoryStore::new();
        let rule = IncentiveRule::builtin_default();

        store.upsert_sales(key(), sales(100), rule.clone()).await.unwrap();
        store
            .set_reviews(&key(), ReviewCounts { with_name: 2, with_photo: 1 })
            .await
            .unwrap();
        let updated = store.upsert_sales(key(), sales(250), rule).await.unwrap();

        assert_eq!(updated.service_sale, Decimal::from(250));
        assert_eq!(updated.reviews_with_name, 2);
        assert_eq!(updated.reviews_with_photo, 1);
        assert_eq!(store.daily_sale_count().await, 1);
    }

    #[tokio::test]
    async fn test_batch_upsert_writes_all_rows_or_none() {
        let store = MemoryStore::new();
        let rule = IncentiveRule::builtin_default();
        let other = DailySaleKey::new("tenant_a", "stf_002", key().date);
        store.upsert_sales(key(), sales(100), rule.clone()).await.unwrap();
        store
            .set_reviews(&key(), ReviewCounts { with_name: 1, with_photo: 1 })
            .await
            .unwrap();

        store.set_fail_upsert_for("stf_002", true).await;
        let result = store
            .upsert_sales_batch(
                vec![(key(), sales(300)), (other.clone(), sales(50))],
                rule.clone(),
            )
            .await;
        assert!(result.unwrap_err().is_retryable());
        assert_eq!(
            store.get(&key()).await.unwrap().unwrap().service_sale,
            Decimal::from(100)
        );
        assert!(store.get(&other).await.unwrap().is_none());

        store.set_fail_upsert_for("stf_002", false).await;
        let written = store
            .upsert_sales_batch(vec![(key(), sales(300)), (other, sales(50))], rule)
            .await
            .unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].service_sale, Decimal::from(300));
        assert_eq!(written[0].reviews_with_name, 1);
        assert_eq!(written[1].service_sale, Decimal::from(50));
        assert_eq!(store.daily_sale_count().await, 2);
    }

    #[tokio::test]
    async fn test_set_reviews_on_missing_record_returns_none() {
        let store = MemoryStore::new();
        let result = store
            .set_reviews(&key(), ReviewCounts { with_name: 1, with_photo: 0 })
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_invoices_between_is_inclusive_and_tenant_scoped() {
        let store = MemoryStore::new();
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 15, 23, 59, 59).unwrap();
        for (id, tenant, at) in [
            ("inv_1", "tenant_a", start),
            ("inv_2", "tenant_a", end),
            ("inv_3", "tenant_b", start),
            ("inv_4", "tenant_a", end + chrono::TimeDelta::seconds(1)),
        ] {
            store
                .put_invoice(Invoice {
                    id: id.to_string(),
                    tenant_id: tenant.to_string(),
                    created_at: at,
                    customer_id: "cus_1".to_string(),
                    line_items: vec![],
                })
                .await;
        }

        let found = store.invoices_between("tenant_a", start, end).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["inv_1", "inv_2"]);
    }

    #[tokio::test]
    async fn test_payout_status_filter() {
        let store = MemoryStore::new();
        for (id, status) in [("p1", PayoutStatus::Approved), ("p2", PayoutStatus::Pending)] {
            store
                .put_payout(IncentivePayout {
                    id: id.to_string(),
                    tenant_id: "tenant_a".to_string(),
                    staff_id: "stf_001".to_string(),
                    amount: Decimal::from(100),
                    status,
                    requested_at: Utc::now(),
                    decided_at: None,
                })
                .await;
        }

        let approved = store
            .payouts_for_staff("tenant_a", "stf_001", Some(PayoutStatus::Approved))
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);

        assert!(store.set_payout_status("p2", PayoutStatus::Approved).await);
        assert!(!store.set_payout_status("missing", PayoutStatus::Approved).await);

        let all = store.payouts_for_staff("tenant_a", "stf_001", None).await.unwrap();
        assert!(all.iter().all(|p| p.is_approved() && p.decided_at.is_some()));
    }

    #[tokio::test]
    async fn test_concurrent_upserts_keep_one_record() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert_sales(key(), sales(i), IncentiveRule::builtin_default())
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.daily_sale_count().await, 1);
    }
}
