//! Error types for the Staff Incentive Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while syncing sales, resolving
//! rules, and computing incentive balances.

use thiserror::Error;

/// The main error type for the Staff Incentive Engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application. Only
/// [`EngineError::TransientStore`] is retryable; every other variant is
/// terminal and carries the precise reason.
///
/// # Example
///
/// ```
/// use incentive_engine::error::EngineError;
///
/// let error = EngineError::Configuration {
///     reason: "staff 'stf_001' has no positive salary".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Configuration error: staff 'stf_001' has no positive salary"
/// );
/// assert!(!error.is_retryable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Engine configuration file could not be parsed or holds invalid values.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Business configuration required for a calculation is missing.
    ///
    /// Raised for a missing or non-positive salary, or a required rule type
    /// that has no stored version and no built-in default.
    #[error("Configuration error: {reason}")]
    Configuration {
        /// Why the calculation cannot proceed.
        reason: String,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "Staff", "Daily sale record").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The request was malformed.
    #[error("Invalid request field '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },

    /// The backing store failed or timed out. Safe to retry.
    #[error("Store operation '{operation}' failed: {message}")]
    TransientStore {
        /// The store operation that failed.
        operation: String,
        /// A description of the failure.
        message: String,
    },
}

impl EngineError {
    /// Returns true when the caller may retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::TransientStore { .. })
    }

    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub(crate) fn transient(operation: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::TransientStore {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
