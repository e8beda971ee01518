//! Staff model, as read from the staff directory.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A staff member eligible for incentives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    /// Unique identifier for the staff member.
    pub id: String,
    /// The owning tenant.
    pub tenant_id: String,
    /// Monthly salary. Must be positive for any incentive calculation.
    pub salary: Option<Decimal>,
    /// Job title.
    #[serde(default)]
    pub position: String,
}

impl Staff {
    /// Returns the salary, or a configuration error when it is missing or
    /// not positive.
    ///
    /// # Examples
    ///
    /// ```
    /// use incentive_engine::models::Staff;
    /// use rust_decimal::Decimal;
    ///
    /// let staff = Staff {
    ///     id: "stf_001".to_string(),
    ///     tenant_id: "tenant_a".to_string(),
    ///     salary: Some(Decimal::from(30000)),
    ///     position: "Stylist".to_string(),
    /// };
    /// assert_eq!(staff.require_salary().unwrap(), Decimal::from(30000));
    /// ```
    pub fn require_salary(&self) -> EngineResult<Decimal> {
        match self.salary {
            Some(salary) if salary > Decimal::ZERO => Ok(salary),
            Some(salary) => Err(EngineError::Configuration {
                reason: format!(
                    "staff '{}' has non-positive salary {}",
                    self.id, salary
                ),
            }),
            None => Err(EngineError::Configuration {
                reason: format!("staff '{}' has no salary configured", self.id),
            }),
        }
    }
}
