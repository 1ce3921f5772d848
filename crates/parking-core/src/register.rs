//! # Cash Register Rules
//!
//! State guards and money movement for the daily till. Storage applies these
//! rules inside its transactions; nothing here touches the database.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   (no row) ── open ──► OPEN ── close ──► CLOSED ── reopen ──► OPEN ...  │
//! │                         │                  ▲                            │
//! │                         │                  │                            │
//! │                         └─ every INSIDE vehicle becomes SYSTEM_DELETED  │
//! │                            in the same transaction as the status flip  │
//! │                                                                         │
//! │   At most one OPEN register per business-zone calendar day.            │
//! │   Reopen never brings evicted vehicles back.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Financial Deltas
//! ```text
//! category          subtotal column                  finalValue
//! ───────────────── ──────────────────────────────── ──────────────
//! vehicleEntry      vehicle_entry_total_cents        + direction
//! generalSale       general_sale_total_cents         + direction
//! outgoingExpense   outgoing_expense_total_cents     - direction
//! ```

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CashRegister, RegisterStatus};
use crate::validation::validate_price_cents;

/// Entity name used in register errors.
pub const REGISTER_ENTITY: &str = "Cash register";

/// Timestamp layout of audit notes (`16/10/2026 22:30:00`).
pub const AUDIT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

// =============================================================================
// Financial Delta
// =============================================================================

/// Which running subtotal a financial event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum DeltaCategory {
    VehicleEntry,
    GeneralSale,
    OutgoingExpense,
}

impl DeltaCategory {
    /// Register column holding this category's subtotal.
    pub fn subtotal_column(&self) -> &'static str {
        match self {
            DeltaCategory::VehicleEntry => "vehicle_entry_total_cents",
            DeltaCategory::GeneralSale => "general_sale_total_cents",
            DeltaCategory::OutgoingExpense => "outgoing_expense_total_cents",
        }
    }

    /// Whether the category adds cash to the drawer.
    pub fn is_income(&self) -> bool {
        !matches!(self, DeltaCategory::OutgoingExpense)
    }
}

impl fmt::Display for DeltaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeltaCategory::VehicleEntry => write!(f, "vehicleEntry"),
            DeltaCategory::GeneralSale => write!(f, "generalSale"),
            DeltaCategory::OutgoingExpense => write!(f, "outgoingExpense"),
        }
    }
}

/// Increment records an event, decrement voids it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DeltaDirection {
    Increment,
    Decrement,
}

impl DeltaDirection {
    #[inline]
    pub fn sign(&self) -> i64 {
        match self {
            DeltaDirection::Increment => 1,
            DeltaDirection::Decrement => -1,
        }
    }
}

/// One financial event against a register.
///
/// The caller applies each delta exactly once, in the same transaction as the
/// record it accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinancialDelta {
    pub category: DeltaCategory,
    /// Magnitude; the direction carries the sign.
    pub amount: Money,
    pub direction: DeltaDirection,
}

impl FinancialDelta {
    /// Builds a delta, rejecting negative magnitudes.
    pub fn new(
        category: DeltaCategory,
        amount: Money,
        direction: DeltaDirection,
    ) -> CoreResult<Self> {
        // a delta is a whole charge or total, so only the sign is checked
        if amount.cents() < 0 {
            return Err(ValidationError::OutOfRange {
                field: "amount".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }
        Ok(FinancialDelta {
            category,
            amount,
            direction,
        })
    }

    pub fn increment(category: DeltaCategory, amount: Money) -> CoreResult<Self> {
        FinancialDelta::new(category, amount, DeltaDirection::Increment)
    }

    pub fn decrement(category: DeltaCategory, amount: Money) -> CoreResult<Self> {
        FinancialDelta::new(category, amount, DeltaDirection::Decrement)
    }

    /// Signed change of the category subtotal.
    pub fn subtotal_change(&self) -> Money {
        Money::from_cents(self.amount.cents() * self.direction.sign())
    }

    /// Signed change of `final_value`.
    pub fn balance_change(&self) -> Money {
        if self.category.is_income() {
            self.subtotal_change()
        } else {
            -self.subtotal_change()
        }
    }
}

// =============================================================================
// Lifecycle Guards
// =============================================================================

/// Actions that move a persisted register between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterAction {
    Close,
    Reopen,
}

impl RegisterAction {
    /// Status the register must be in for this action.
    pub fn required_status(&self) -> RegisterStatus {
        match self {
            RegisterAction::Close => RegisterStatus::Open,
            RegisterAction::Reopen => RegisterStatus::Closed,
        }
    }

    /// Status after the action.
    pub fn target_status(&self) -> RegisterStatus {
        match self {
            RegisterAction::Close => RegisterStatus::Closed,
            RegisterAction::Reopen => RegisterStatus::Open,
        }
    }
}

/// Checks that `action` is allowed and returns the resulting status.
///
/// A register in the wrong state is reported as `InvalidState`, which
/// callers see as NotFound.
pub fn transition(register: &CashRegister, action: RegisterAction) -> CoreResult<RegisterStatus> {
    let required = action.required_status();
    if register.status != required {
        return Err(CoreError::invalid_state(
            REGISTER_ENTITY,
            register.id.clone(),
            register.status,
            required,
        ));
    }
    Ok(action.target_status())
}

/// Money-moving flows only run against an OPEN register.
pub fn ensure_open(register: &CashRegister) -> CoreResult<()> {
    if !register.is_open() {
        return Err(CoreError::invalid_state(
            REGISTER_ENTITY,
            register.id.clone(),
            register.status,
            RegisterStatus::Open,
        ));
    }
    Ok(())
}

/// The opening float may be zero but never negative.
pub fn validate_initial_value(initial_value: Money) -> CoreResult<()> {
    validate_price_cents(initial_value.cents(), "initial_value")?;
    Ok(())
}

// =============================================================================
// Audit Notes
// =============================================================================

/// Note appended to a vehicle evicted by a register close.
pub fn eviction_note(at: DateTime<Tz>) -> String {
    format!(
        "vehicle removed by system at {}",
        at.format(AUDIT_TIMESTAMP_FORMAT)
    )
}

/// Appends `note` on its own line.
pub fn append_note(existing: &str, note: &str) -> String {
    let existing = existing.trim_end();
    if existing.is_empty() {
        note.to_string()
    } else {
        format!("{}\n{}", existing, note)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
