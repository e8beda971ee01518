//! Storage interfaces for the incentive engine.
//!
//! The engine owns two stores (rule versions and daily sale records) and reads
//! from three external collaborators (billing invoices, the staff directory,
//! and the payout ledger). Each is an async trait so any backing database can
//! be plugged in; [`MemoryStore`] implements all five in memory.
//!
//! Every call made through [`Stores::call`] is bounded by the configured
//! timeout; an elapsed timeout surfaces as a retryable
//! [`EngineError::TransientStore`].

mod memory;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    DailySaleKey, DailySaleRecord, IncentivePayout, IncentiveRule, Invoice, PayoutStatus,
    ReviewCounts, RuleSet, RuleType, RuleVersion, SalesAggregate, Staff,
};

pub use memory::{FailPoint, MemoryStore};

/// Append-only storage of rule versions.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Inserts one new version per rule type, atomically.
    ///
    /// All four versions share `created_at` and receive consecutive
    /// sequence numbers in [`RuleType::ALL`] order. Either all four are
    /// stored or none are.
    async fn insert_rule_set(
        &self,
        tenant_id: &str,
        rules: RuleSet,
        created_at: DateTime<Utc>,
    ) -> EngineResult<Vec<RuleVersion>>;

    /// Returns every stored version of a rule type, in insertion order.
    async fn versions(&self, tenant_id: &str, rule_type: RuleType)
    -> EngineResult<Vec<RuleVersion>>;
}

/// Storage of daily sale records, unique per (tenant, staff, date).
#[async_trait]
pub trait DailySaleStore: Send + Sync {
    /// Atomically inserts or updates the record for `key`.
    ///
    /// On insert, review counts start at zero. On update, only the sales
    /// fields and the applied rule are overwritten; review counts are kept.
    /// Implementations must perform this as one conditional write, never as a
    /// separate read followed by a write.
    async fn upsert_sales(
        &self,
        key: DailySaleKey,
        sales: SalesAggregate,
        applied_rule: IncentiveRule,
    ) -> EngineResult<DailySaleRecord>;

    /// Upserts every `(key, sales)` row with the same applied rule, as one
    /// all-or-nothing write.
    ///
    /// Each row follows the [`upsert_sales`](Self::upsert_sales) semantics.
    /// If any row cannot be written, no row is written and the whole batch
    /// fails. Records are returned in input order.
    async fn upsert_sales_batch(
        &self,
        rows: Vec<(DailySaleKey, SalesAggregate)>,
        applied_rule: IncentiveRule,
    ) -> EngineResult<Vec<DailySaleRecord>>;

    /// Returns the record for `key`, if any.
    async fn get(&self, key: &DailySaleKey) -> EngineResult<Option<DailySaleRecord>>;

    /// Returns every record of a staff member, oldest first.
    async fn list_for_staff(
        &self,
        tenant_id: &str,
        staff_id: &str,
    ) -> EngineResult<Vec<DailySaleRecord>>;

    /// Overwrites the review counts of an existing record.
    ///
    /// Returns `None` when no record exists for `key`.
    async fn set_reviews(
        &self,
        key: &DailySaleKey,
        reviews: ReviewCounts,
    ) -> EngineResult<Option<DailySaleRecord>>;
}

/// Read access to billing invoices.
#[async_trait]
pub trait InvoiceSource: Send + Sync {
    /// Returns the tenant's invoices with `start <= created_at <= end`.
    async fn invoices_between(
        &self,
        tenant_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<Invoice>>;
}

/// Read access to staff records.
#[async_trait]
pub trait StaffDirectory: Send + Sync {
    /// Looks up a staff member of a tenant.
    async fn get_staff(&self, tenant_id: &str, staff_id: &str) -> EngineResult<Option<Staff>>;
}

/// Read access to incentive payouts.
#[async_trait]
pub trait PayoutLedger: Send + Sync {
    /// Returns a staff member's payouts, optionally filtered by status.
    async fn payouts_for_staff(
        &self,
        tenant_id: &str,
        staff_id: &str,
        status: Option<PayoutStatus>,
    ) -> EngineResult<Vec<IncentivePayout>>;
}

/// Handles to every store the engine uses, plus the call timeout.
#[derive(Clone)]
pub struct Stores {
    /// Rule versions.
    pub rules: Arc<dyn RuleStore>,
    /// Daily sale records.
    pub daily_sales: Arc<dyn DailySaleStore>,
    /// Billing invoices.
    pub invoices: Arc<dyn InvoiceSource>,
    /// Staff directory.
    pub staff: Arc<dyn StaffDirectory>,
    /// Payout ledger.
    pub payouts: Arc<dyn PayoutLedger>,
    timeout: Duration,
}

impl Stores {
    /// Bundles store handles with a per-call timeout.
    pub fn new(
        rules: Arc<dyn RuleStore>,
        daily_sales: Arc<dyn DailySaleStore>,
        invoices: Arc<dyn InvoiceSource>,
        staff: Arc<dyn StaffDirectory>,
        payouts: Arc<dyn PayoutLedger>,
        timeout: Duration,
    ) -> Self {
        Self {
            rules,
            daily_sales,
            invoices,
            staff,
            payouts,
            timeout,
        }
    }

    /// Uses one [`MemoryStore`] for every role.
    pub fn in_memory(store: Arc<MemoryStore>, timeout: Duration) -> Self {
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            timeout,
        )
    }

    /// Runs a store call under the configured timeout.
    pub async fn call<T, F>(&self, operation: &str, fut: F) -> EngineResult<T>
    where
        F: Future<Output = EngineResult<T>>,
    {
        with_timeout(self.timeout, operation, fut).await
    }
}

/// Runs `fut`, mapping an elapsed `timeout` to [`EngineError::TransientStore`].
pub async fn with_timeout<T, F>(timeout: Duration, operation: &str, fut: F) -> EngineResult<T>
where
    F: Future<Output = EngineResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::transient(
            operation,
            format!("timed out after {}ms", timeout.as_millis()),
        )),
    }
}
