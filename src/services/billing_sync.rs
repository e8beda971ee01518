//! Billing-to-sales synchronization.
//!
//! A sync recomputes one tenant day from the billing source:
//!
//! 1. resolve the daily rule at the end of the day (the snapshot),
//! 2. fetch the day's invoices once,
//! 3. aggregate each staff member's sales in a bounded task pool over the
//!    shared invoice slice,
//! 4. write every `(tenant, staff, date)` record in one all-or-nothing batch
//!    upsert.
//!
//! Any failure aborts the whole sync with nothing written, so a day never
//! mixes rule snapshots. Recomputation is idempotent and a failed sync can be
//! retried as is.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::calculation::aggregate_staff_sales;
use crate::error::{EngineError, EngineResult};
use crate::models::{DailySaleKey, Invoice, SalesAggregate, SyncReport, day_window};
use crate::store::Stores;

use super::RuleResolver;

/// Aggregates billing invoices into daily sale records.
#[derive(Clone)]
pub struct BillingSyncEngine {
    stores: Stores,
    resolver: RuleResolver,
    max_concurrency: usize,
}

impl BillingSyncEngine {
    /// Creates a sync engine running at most `max_concurrency` staff tasks at once.
    pub fn new(stores: Stores, resolver: RuleResolver, max_concurrency: usize) -> Self {
        Self {
            stores,
            resolver,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Syncs one tenant day for the given staff.
    ///
    /// # Returns
    ///
    /// A [`SyncReport`] listing every written staff record, or an error if:
    /// - `tenant_id` or `staff_ids` is empty (`Validation`)
    /// - rule resolution, invoice retrieval or the batch write fails
    ///   (`TransientStore`)
    ///
    /// On error no record is written.
    pub async fn sync_day(
        &self,
        tenant_id: &str,
        date: NaiveDate,
        staff_ids: &[String],
    ) -> EngineResult<SyncReport> {
        let started = Instant::now();
        let staff_ids = validate_request(tenant_id, staff_ids)?;
        let (day_start, day_end) = day_window(date);

        let applied_rule = self.resolver.resolve_daily(tenant_id, day_end).await?;
        let invoices: Arc<[Invoice]> = self
            .stores
            .call(
                "invoices_between",
                self.stores
                    .invoices
                    .invoices_between(tenant_id, day_start, day_end),
            )
            .await?
            .into();

        info!(
            tenant_id = %tenant_id,
            date = %date,
            staff_count = staff_ids.len(),
            invoices = invoices.len(),
            rule_version = ?applied_rule.version_id,
            "Syncing sales day"
        );

        let aggregates = self.aggregate_all(&staff_ids, invoices.clone()).await?;

        let mut report = SyncReport {
            tenant_id: tenant_id.to_string(),
            date,
            invoices_scanned: invoices.len(),
            updated: Vec::new(),
            applied_rule,
        };
        self.write_all(&mut report, aggregates).await?;

        info!(
            tenant_id = %tenant_id,
            date = %date,
            updated = report.updated_count(),
            duration_us = started.elapsed().as_micros(),
            "Sales day synced"
        );
        Ok(report)
    }

    /// Fans out per-staff aggregation; fails if any task fails.
    async fn aggregate_all(
        &self,
        staff_ids: &[String],
        invoices: Arc<[Invoice]>,
    ) -> EngineResult<Vec<(String, SalesAggregate)>> {
        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for (index, staff_id) in staff_ids.iter().cloned().enumerate() {
            let permit = acquire(&permits).await?;
            let invoices = invoices.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let sales = aggregate_staff_sales(&invoices, &staff_id);
                (index, staff_id, sales)
            });
        }

        let mut aggregates = Vec::with_capacity(staff_ids.len());
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|e| EngineError::CalculationError {
                message: format!("sales aggregation task failed: {}", e),
            })?;
            aggregates.push(result);
        }
        aggregates.sort_by_key(|(index, _, _)| *index);

        Ok(aggregates
            .into_iter()
            .map(|(_, staff_id, sales)| (staff_id, sales))
            .collect())
    }

    /// Writes every staff record in one all-or-nothing batch upsert.
    async fn write_all(
        &self,
        report: &mut SyncReport,
        aggregates: Vec<(String, SalesAggregate)>,
    ) -> EngineResult<()> {
        let rows = aggregates
            .into_iter()
            .map(|(staff_id, sales)| {
                (DailySaleKey::new(report.tenant_id.clone(), staff_id, report.date), sales)
            })
            .collect();

        let written = self
            .stores
            .call(
                "upsert_daily_sales",
                self.stores
                    .daily_sales
                    .upsert_sales_batch(rows, report.applied_rule.rule.clone()),
            )
            .await
            .inspect_err(|error| {
                warn!(
                    tenant_id = %report.tenant_id,
                    date = %report.date,
                    error = %error,
                    "Daily sale batch write failed; no record written"
                );
            })?;

        report.updated = written.into_iter().map(|record| record.staff_id).collect();
        Ok(())
    }
}

async fn acquire(permits: &Arc<Semaphore>) -> EngineResult<tokio::sync::OwnedSemaphorePermit> {
    permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| EngineError::CalculationError {
            message: format!("sync worker pool closed: {}", e),
        })
}

/// Rejects empty input and drops duplicate staff ids, keeping first occurrence.
fn validate_request(tenant_id: &str, staff_ids: &[String]) -> EngineResult<Vec<String>> {
    if tenant_id.trim().is_empty() {
        return Err(EngineError::validation("tenant_id", "must not be empty"));
    }
    if staff_ids.is_empty() {
        return Err(EngineError::validation("staff_ids", "must not be empty"));
    }
    if staff_ids.iter().any(|id| id.trim().is_empty()) {
        return Err(EngineError::validation(
            "staff_ids",
            "must not contain empty ids",
        ));
    }

    let mut seen = HashSet::new();
    Ok(staff_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect())
}
