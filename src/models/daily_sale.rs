//! Daily sale records and the aggregates derived from them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{IncentiveRule, YearMonth};

/// Identity of a daily sale record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DailySaleKey {
    /// The owning tenant.
    pub tenant_id: String,
    /// The staff member.
    pub staff_id: String,
    /// The UTC day.
    pub date: NaiveDate,
}

impl DailySaleKey {
    /// Creates a key.
    pub fn new(tenant_id: impl Into<String>, staff_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            staff_id: staff_id.into(),
            date,
        }
    }
}

/// Sales figures recomputed from invoices on every sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesAggregate {
    /// Sum of service line items.
    pub service_sale: Decimal,
    /// Sum of product line items.
    pub product_sale: Decimal,
    /// Distinct customers served.
    pub customer_count: u32,
}

/// Manually entered review counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCounts {
    /// Reviews naming the staff member.
    pub with_name: u32,
    /// Reviews carrying a photo.
    pub with_photo: u32,
}

/// One staff member's sales for one day, with the rule frozen at sync time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySaleRecord {
    /// The owning tenant.
    pub tenant_id: String,
    /// The staff member.
    pub staff_id: String,
    /// The UTC day.
    pub date: NaiveDate,
    /// Sum of service line items.
    pub service_sale: Decimal,
    /// Sum of product line items.
    pub product_sale: Decimal,
    /// Distinct customers served.
    pub customer_count: u32,
    /// Reviews naming the staff member.
    pub reviews_with_name: u32,
    /// Reviews carrying a photo.
    pub reviews_with_photo: u32,
    /// Daily rule snapshot taken when the record was last synced.
    pub applied_rule: IncentiveRule,
    /// When the sales fields were last recomputed.
    pub synced_at: DateTime<Utc>,
}

impl DailySaleRecord {
    /// Creates a freshly-synced record with zero review counts.
    pub fn new(key: DailySaleKey, sales: SalesAggregate, applied_rule: IncentiveRule) -> Self {
        Self {
            tenant_id: key.tenant_id,
            staff_id: key.staff_id,
            date: key.date,
            service_sale: sales.service_sale,
            product_sale: sales.product_sale,
            customer_count: sales.customer_count,
            reviews_with_name: 0,
            reviews_with_photo: 0,
            applied_rule,
            synced_at: Utc::now(),
        }
    }

    /// Overwrites the synced fields, leaving review counts untouched.
    pub fn apply_sync(&mut self, sales: SalesAggregate, applied_rule: IncentiveRule) {
        self.service_sale = sales.service_sale;
        self.product_sale = sales.product_sale;
        self.customer_count = sales.customer_count;
        self.applied_rule = applied_rule;
        self.synced_at = Utc::now();
    }

    /// Returns the record's key.
    pub fn key(&self) -> DailySaleKey {
        DailySaleKey::new(self.tenant_id.clone(), self.staff_id.clone(), self.date)
    }

    /// Returns the record's review counts.
    pub fn reviews(&self) -> ReviewCounts {
        ReviewCounts {
            with_name: self.reviews_with_name,
            with_photo: self.reviews_with_photo,
        }
    }

    /// The calendar month the record belongs to.
    pub fn month(&self) -> YearMonth {
        YearMonth::of(self.date)
    }
}

/// Sales summed across every daily record of a calendar month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySales {
    /// Sum of service sales.
    pub service_sale: Decimal,
    /// Sum of product sales.
    pub product_sale: Decimal,
    /// Sum of named reviews.
    pub reviews_with_name: u64,
    /// Sum of photo reviews.
    pub reviews_with_photo: u64,
    /// Number of daily records folded in.
    pub days_recorded: u32,
}

impl MonthlySales {
    /// Folds one daily record into the month.
    pub fn add(&mut self, record: &DailySaleRecord) {
        self.service_sale += record.service_sale;
        self.product_sale += record.product_sale;
        self.reviews_with_name += u64::from(record.reviews_with_name);
        self.reviews_with_photo += u64::from(record.reviews_with_photo);
        self.days_recorded += 1;
    }

    /// Sums the given records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a DailySaleRecord>) -> Self {
        let mut month = Self::default();
        for record in records {
            month.add(record);
        }
        month
    }
}
