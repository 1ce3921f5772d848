//! # Domain Types
//!
//! Core domain types used throughout the parking till.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ BillingMethod   │   │  VehicleEntry   │   │  CashRegister   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  category       │◄──│  billing_method │   │  status         │       │
//! │  │  tolerance      │   │  plate          │──►│  opening_day    │       │
//! │  │  time_unit      │   │  status         │   │  final_value    │       │
//! │  │  car/moto value │   │  entry/exit     │   │  subtotals      │       │
//! │  └─────────────────┘   └─────────────────┘   └────────▲────────┘       │
//! │                                                       │                 │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────┴────────┐       │
//! │  │VehicleTransaction│  │      Sale       │   │    Expense      │       │
//! │  │ (exit charge)   │   │ (general sale)  │   │ (outgoing cash) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │        every financial record references its register by id            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Soft State, Never Hard Deletes
//! Billing methods are disabled, vehicle entries move to DELETED or
//! SYSTEM_DELETED, sales/expenses/transactions get a `voided_at` stamp.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::billing::BillingRates;
use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Billing Category
// =============================================================================

/// How a billing method turns a stay into an amount.
///
/// Wire and storage names are the ones the managers' UI has always sent:
/// `POR_HORA`, `POR_MINUTO`, `VALOR_FIXO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum BillingCategory {
    /// One block of 1..=1440 minutes.
    #[serde(rename = "POR_HORA")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "POR_HORA"))]
    PerHour,
    /// One block of 1..=59 minutes.
    #[serde(rename = "POR_MINUTO")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "POR_MINUTO"))]
    PerMinute,
    /// Flat price, no time blocks.
    #[serde(rename = "VALOR_FIXO")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "VALOR_FIXO"))]
    FixedAmount,
}

impl BillingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCategory::PerHour => "POR_HORA",
            BillingCategory::PerMinute => "POR_MINUTO",
            BillingCategory::FixedAmount => "VALOR_FIXO",
        }
    }
}

impl fmt::Display for BillingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "POR_HORA" | "PER_HORA" | "PER_HOUR" => Ok(BillingCategory::PerHour),
            "POR_MINUTO" | "PER_MINUTO" | "PER_MINUTE" => Ok(BillingCategory::PerMinute),
            "VALOR_FIXO" | "FIXED_AMOUNT" => Ok(BillingCategory::FixedAmount),
            other => Err(CoreError::billing_config(format!(
                "unknown category '{}'; valid options: POR_HORA, POR_MINUTO, VALOR_FIXO",
                other
            ))),
        }
    }
}

// =============================================================================
// Vehicle Category
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    Car,
    Motorcycle,
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleCategory::Car => write!(f, "car"),
            VehicleCategory::Motorcycle => write!(f, "motorcycle"),
        }
    }
}

impl FromStr for VehicleCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "car" | "carro" => Ok(VehicleCategory::Car),
            "motorcycle" | "moto" => Ok(VehicleCategory::Motorcycle),
            other => Err(CoreError::Validation(
                crate::error::ValidationError::InvalidFormat {
                    field: "category".to_string(),
                    reason: format!("'{}' is not car or motorcycle", other),
                },
            )),
        }
    }
}

// =============================================================================
// Statuses
// =============================================================================

/// Lifecycle of a vehicle entry.
///
/// ```text
///            check_in
///               │
///               ▼
///   ┌────────► INSIDE ──── check_out ────► EXITED
///   │           │  │
///   │ reactivate│  └── register close ───► SYSTEM_DELETED ──┐
///   │           ▼                                           │
///   └──────── DELETED (staff soft delete)                   │
///   └───────────────────────── reactivate ◄─────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Inside,
    Exited,
    Deleted,
    SystemDeleted,
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleStatus::Inside => write!(f, "inside"),
            VehicleStatus::Exited => write!(f, "exited"),
            VehicleStatus::Deleted => write!(f, "deleted"),
            VehicleStatus::SystemDeleted => write!(f, "system_deleted"),
        }
    }
}

/// Persisted register states. "Not created" is the absence of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegisterStatus {
    Open,
    Closed,
}

impl fmt::Display for RegisterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterStatus::Open => write!(f, "open"),
            RegisterStatus::Closed => write!(f, "closed"),
        }
    }
}

// =============================================================================
// Billing Method
// =============================================================================

/// A configured pricing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BillingMethod {
    pub id: String,
    pub category: BillingCategory,
    /// Grace minutes per block, 0..=59.
    pub tolerance_minutes: i64,
    /// Block length in minutes; 0 iff category is VALOR_FIXO.
    pub time_unit_minutes: i64,
    /// Price of one block (or the flat price) for cars.
    pub car_value_cents: i64,
    /// Price of one block (or the flat price) for motorcycles.
    pub moto_value_cents: i64,
    /// Human-readable summary generated at validation time.
    pub description: String,
    /// Disabled methods stay referenced by old entries but can't be assigned.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl BillingMethod {
    /// The read-only subset the calculator needs.
    pub fn rates(&self) -> BillingRates {
        BillingRates {
            time_unit_minutes: self.time_unit_minutes,
            tolerance_minutes: self.tolerance_minutes,
            car_value: Money::from_cents(self.car_value_cents),
            moto_value: Money::from_cents(self.moto_value_cents),
        }
    }
}

/// Input for creating or editing a billing method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBillingMethod {
    /// Raw category text, validated by `validate_configuration`.
    pub category: String,
    /// Block length as `hh:mm:ss`; ignored (or `00:00:00`) for VALOR_FIXO.
    pub time: Option<String>,
    pub tolerance_minutes: i64,
    pub car_value_cents: i64,
    pub moto_value_cents: i64,
}

// =============================================================================
// Vehicle Entry
// =============================================================================

/// A parked (or formerly parked) vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct VehicleEntry {
    pub id: String,
    /// Register that was open when the vehicle checked in.
    pub register_id: String,
    /// Normalized plate (uppercase, no separators).
    pub plate: String,
    pub category: VehicleCategory,
    pub billing_method_id: String,
    #[ts(as = "String")]
    pub entry_time: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub exit_time: Option<DateTime<Utc>>,
    pub status: VehicleStatus,
    /// Free-text notes; system audit lines are appended here.
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for a vehicle check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewVehicleEntry {
    pub register_id: String,
    pub plate: String,
    pub category: VehicleCategory,
    pub billing_method_id: String,
    pub description: Option<String>,
}

/// The charge recorded when a vehicle exits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct VehicleTransaction {
    pub id: String,
    pub register_id: String,
    pub vehicle_entry_id: String,
    pub amount_cents: i64,
    pub stay_minutes: i64,
    pub blocks: i64,
    pub operator_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
}

impl VehicleTransaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Cash Register
// =============================================================================

/// The till for one business day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashRegister {
    pub id: String,
    /// Who opened it.
    pub operator_id: String,
    pub status: RegisterStatus,
    #[ts(as = "String")]
    pub opening_date: DateTime<Utc>,
    /// Calendar day of `opening_date` in the business zone.
    #[ts(as = "String")]
    pub opening_day: NaiveDate,
    #[ts(as = "Option<String>")]
    pub closing_date: Option<DateTime<Utc>>,
    pub initial_value_cents: i64,
    /// Running balance.
    pub final_value_cents: i64,
    pub vehicle_entry_total_cents: i64,
    pub general_sale_total_cents: i64,
    pub outgoing_expense_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CashRegister {
    #[inline]
    pub fn initial_value(&self) -> Money {
        Money::from_cents(self.initial_value_cents)
    }

    #[inline]
    pub fn final_value(&self) -> Money {
        Money::from_cents(self.final_value_cents)
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == RegisterStatus::Open
    }
}

// =============================================================================
// Sales & Expenses
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub register_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub total_cents: i64,
    pub operator_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub register_id: String,
    pub description: String,
    pub amount_cents: i64,
    pub operator_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
}

impl Expense {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewExpense {
    pub description: String,
    pub amount_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_category_from_str() {
        assert_eq!(
            "POR_HORA".parse::<BillingCategory>().unwrap(),
            BillingCategory::PerHour
        );
        assert_eq!(
            "per_hora".parse::<BillingCategory>().unwrap(),
            BillingCategory::PerHour
        );
        assert_eq!(
            "POR_MINUTO".parse::<BillingCategory>().unwrap(),
            BillingCategory::PerMinute
        );
        assert_eq!(
            "VALOR_FIXO".parse::<BillingCategory>().unwrap(),
            BillingCategory::FixedAmount
        );
        assert!("DIARIA".parse::<BillingCategory>().is_err());
    }

    #[test]
    fn test_billing_category_serde_names() {
        let json = serde_json::to_string(&BillingCategory::PerMinute).unwrap();
        assert_eq!(json, "\"POR_MINUTO\"");
        let back: BillingCategory = serde_json::from_str("\"VALOR_FIXO\"").unwrap();
        assert_eq!(back, BillingCategory::FixedAmount);
    }

    #[test]
    fn test_vehicle_category_from_str() {
        assert_eq!("car".parse::<VehicleCategory>().unwrap(), VehicleCategory::Car);
        assert_eq!(
            "Moto".parse::<VehicleCategory>().unwrap(),
            VehicleCategory::Motorcycle
        );
        assert!("truck".parse::<VehicleCategory>().is_err());
    }

    #[test]
    fn test_vehicle_status_serde() {
        let json = serde_json::to_string(&VehicleStatus::SystemDeleted).unwrap();
        assert_eq!(json, "\"SYSTEM_DELETED\"");
    }
}
