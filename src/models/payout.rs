//! Incentive payout models, as read from the payout ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Approval state of a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Awaiting a decision.
    Pending,
    /// Paid out; counts against the balance.
    Approved,
    /// Declined.
    Rejected,
}

/// A request to pay out earned incentives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentivePayout {
    /// Payout identifier.
    pub id: String,
    /// The owning tenant.
    pub tenant_id: String,
    /// The staff member being paid.
    pub staff_id: String,
    /// Requested amount.
    pub amount: Decimal,
    /// Current approval state.
    pub status: PayoutStatus,
    /// When the payout was requested.
    pub requested_at: DateTime<Utc>,
    /// When the payout was approved or rejected.
    #[serde(default)]
    pub decided_at: Option<DateTime<Utc>>,
}

impl IncentivePayout {
    /// Returns true if the payout counts as paid.
    pub fn is_approved(&self) -> bool {
        self.status == PayoutStatus::Approved
    }
}
