//! # Error Types
//!
//! Domain-specific error types for parking-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  parking-core errors (this file)                                       │
//! │  ├── CoreError        - Domain rejections, each tagged with a kind     │
//! │  ├── ErrorKind        - Validation | Conflict | NotFound |             │
//! │  │                      InsufficientTime | Forbidden                   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  parking-db errors (separate crate)                                    │
//! │  └── DbError          - Database failures, or a wrapped CoreError      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → Rejection → caller      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Messages Per Error
//! `Display` is the diagnostic message (ids, minutes, states) meant for logs.
//! [`CoreError::user_message`] is the short text a cashier sees.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::access::Role;

// =============================================================================
// Error Kind
// =============================================================================

/// Machine-distinguishable category of a rejection.
///
/// None of these are retried by the core; the caller decides what to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or out-of-range input. Caller-correctable.
    Validation,
    /// The operation would break an invariant (e.g. a second open register).
    Conflict,
    /// Missing entity, or an entity in the wrong state for the transition.
    NotFound,
    /// Billing tolerance has not elapsed yet. Amount due is zero.
    InsufficientTime,
    /// The actor's role is below what the operation requires.
    Forbidden,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Field-level input failure.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Billing method configuration is not acceptable.
    ///
    /// ## When This Occurs
    /// - Unknown category string
    /// - Block length outside the category's range
    /// - A non-zero block length given for a fixed-amount method
    #[error("Invalid billing configuration: {reason}")]
    InvalidBillingConfig { reason: String },

    /// Billing method exists but was disabled.
    #[error("Billing method {id} is disabled")]
    BillingMethodInactive { id: String },

    /// A register is already open for that calendar day.
    #[error("Cash register {register_id} is already open for {day}")]
    RegisterAlreadyOpen { day: NaiveDate, register_id: String },

    /// The plate already has an entry with status INSIDE.
    #[error("Plate {plate} already has a vehicle inside: entry {entry_id}")]
    VehicleAlreadyInside { plate: String, entry_id: String },

    /// A financial record was already voided.
    #[error("{entity} {id} was already voided")]
    AlreadyVoided { entity: String, id: String },

    /// Entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Entity exists but its state does not allow the transition.
    ///
    /// ## User Workflow
    /// ```text
    /// Close register (already CLOSED)
    ///      │
    ///      ▼
    /// InvalidState { entity: "Cash register", current: "closed", expected: "open" }
    ///      │
    ///      ▼
    /// UI shows: "Cash register is closed"
    /// ```
    #[error("{entity} {id} is {current}, expected {expected}")]
    InvalidState {
        entity: String,
        id: String,
        current: String,
        expected: String,
    },

    /// Stay is within the free grace window, or negative (entry after now).
    #[error(
        "Insufficient time: stay of {stay_minutes} min within tolerance of {tolerance_minutes} min"
    )]
    InsufficientTime {
        stay_minutes: i64,
        tolerance_minutes: i64,
    },

    /// Role check failed.
    #[error("Role {actual} cannot {action}: requires {required}")]
    Forbidden {
        actual: Role,
        required: Role,
        action: String,
    },
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidState error.
    pub fn invalid_state(
        entity: impl Into<String>,
        id: impl Into<String>,
        current: impl ToString,
        expected: impl ToString,
    ) -> Self {
        CoreError::InvalidState {
            entity: entity.into(),
            id: id.into(),
            current: current.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Creates an InvalidBillingConfig error.
    pub fn billing_config(reason: impl Into<String>) -> Self {
        CoreError::InvalidBillingConfig {
            reason: reason.into(),
        }
    }

    /// Returns the machine-distinguishable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_)
            | CoreError::InvalidBillingConfig { .. }
            | CoreError::BillingMethodInactive { .. } => ErrorKind::Validation,
            CoreError::RegisterAlreadyOpen { .. }
            | CoreError::VehicleAlreadyInside { .. }
            | CoreError::AlreadyVoided { .. } => ErrorKind::Conflict,
            CoreError::NotFound { .. } | CoreError::InvalidState { .. } => ErrorKind::NotFound,
            CoreError::InsufficientTime { .. } => ErrorKind::InsufficientTime,
            CoreError::Forbidden { .. } => ErrorKind::Forbidden,
        }
    }

    /// Returns the message to show the operator.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Validation(e) => e.to_string(),
            CoreError::InvalidBillingConfig { reason } => {
                format!("Invalid billing method: {}", reason)
            }
            CoreError::BillingMethodInactive { .. } => {
                "This billing method is disabled".to_string()
            }
            CoreError::RegisterAlreadyOpen { .. } => {
                "A cash register is already open for today".to_string()
            }
            CoreError::VehicleAlreadyInside { plate, .. } => {
                format!("Vehicle {} is already parked", plate)
            }
            CoreError::AlreadyVoided { entity, .. } => format!("{} was already voided", entity),
            CoreError::NotFound { entity, .. } => format!("{} not found", entity),
            CoreError::InvalidState {
                entity, current, ..
            } => format!("{} is {}", entity, current),
            CoreError::InsufficientTime { stay_minutes, .. } if *stay_minutes < 0 => {
                "Entry time is later than the current time".to_string()
            }
            CoreError::InsufficientTime { .. } => {
                "No charge yet: the vehicle is still within the tolerance period".to_string()
            }
            CoreError::Forbidden { .. } => {
                "You do not have permission to perform this action".to_string()
            }
        }
    }

    /// Returns true when this is a "no charge yet" outcome rather than a failure.
    pub fn is_insufficient_time(&self) -> bool {
        self.kind() == ErrorKind::InsufficientTime
    }
}

// =============================================================================
// Rejection (serialized form)
// =============================================================================

/// What the request layer receives when a core operation is rejected.
///
/// ```json
/// {
///   "kind": "CONFLICT",
///   "message": "A cash register is already open for today",
///   "detail": "Cash register 4f1c... is already open for 2026-10-16"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rejection {
    pub kind: ErrorKind,
    /// User-facing message.
    pub message: String,
    /// Diagnostic message for logs.
    pub detail: String,
}

impl From<&CoreError> for Rejection {
    fn from(err: &CoreError) -> Self {
        Rejection {
            kind: err.kind(),
            message: err.user_message(),
            detail: err.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., unparsable time or amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
