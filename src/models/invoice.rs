//! Billing invoice models, as read from the billing source.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The kind of item a line bills for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// A service performed by staff.
    Service,
    /// A retail product.
    Product,
    /// A prepaid package.
    Package,
    /// A gift card.
    GiftCard,
}

/// A single billed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The staff member credited with the line.
    pub staff_id: String,
    /// What was billed.
    pub item_type: ItemType,
    /// The price after discounts.
    pub final_price: Decimal,
}

/// An invoice issued by the billing system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice identifier.
    pub id: String,
    /// The owning tenant.
    pub tenant_id: String,
    /// When the invoice was created.
    pub created_at: DateTime<Utc>,
    /// The billed customer.
    pub customer_id: String,
    /// The billed lines.
    pub line_items: Vec<LineItem>,
}

impl Invoice {
    /// Returns true when at least one line is credited to `staff_id`.
    pub fn involves_staff(&self, staff_id: &str) -> bool {
        self.line_items.iter().any(|item| item.staff_id == staff_id)
    }
}
