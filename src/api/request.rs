//! Request types for the Staff Incentive Engine API.
//!
//! Rule submissions use [`RuleSubmission`](crate::models::RuleSubmission)
//! directly as the request body.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::ReviewCounts;

/// Request body for `POST /tenants/:tenant_id/sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    /// The UTC day to sync.
    pub date: NaiveDate,
    /// The staff whose records are recomputed.
    pub staff_ids: Vec<String>,
}

/// Request body for `PUT /tenants/:tenant_id/staff/:staff_id/reviews/:date`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Reviews naming the staff member.
    #[serde(default)]
    pub with_name: u32,
    /// Reviews carrying a photo.
    #[serde(default)]
    pub with_photo: u32,
}

impl From<ReviewRequest> for ReviewCounts {
    fn from(req: ReviewRequest) -> Self {
        ReviewCounts {
            with_name: req.with_name,
            with_photo: req.with_photo,
        }
    }
}
