//! # parking-core: Pure Business Logic for the Parking Till
//!
//! Billing rules and cash-register rules as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Parking Till Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Request layer (external)                        │   │
//! │  │   routing, auth, PDF tickets, dashboards                        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Actor + inputs                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ parking-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  billing  │  │ register  │  │  vehicle  │  │   clock   │  │   │
//! │  │   │ validate  │  │  guards   │  │  guards   │  │  IANA tz  │  │   │
//! │  │   │ amount due│  │  deltas   │  │exit charge│  │ day window│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  parking-db (Storage Layer)                     │   │
//! │  │        SQLite transactions, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`billing`] - Billing-method validation and amount due
//! - [`register`] - Register transitions and financial deltas
//! - [`vehicle`] - Vehicle entry guards and exit charge
//! - [`clock`] - Business time zone, day windows, stay minutes
//! - [`money`] - Integer-cent money
//! - [`types`] - Domain records
//! - [`access`] - Role checks
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use parking_core::billing::{amount_for_stay, validate_configuration};
//! use parking_core::{Money, VehicleCategory};
//!
//! let config = validate_configuration(
//!     "POR_HORA", Some("01:00:00"), 10, Money::from_cents(500), Money::from_cents(300),
//! ).unwrap();
//! assert_eq!(config.time_unit_minutes, 60);
//!
//! let rates = parking_core::billing::BillingRates {
//!     time_unit_minutes: config.time_unit_minutes,
//!     tolerance_minutes: config.tolerance_minutes,
//!     car_value: Money::from_cents(500),
//!     moto_value: Money::from_cents(300),
//! };
//! let due = amount_for_stay(65, VehicleCategory::Car, &rates).unwrap();
//! assert_eq!(due.amount.cents(), 500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod billing;
pub mod clock;
pub mod error;
pub mod money;
pub mod register;
pub mod types;
pub mod validation;
pub mod vehicle;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{Actor, Role};
pub use clock::BusinessClock;
pub use error::{CoreError, CoreResult, ErrorKind, Rejection, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency prefix used in billing descriptions.
pub const CURRENCY_SYMBOL: &str = "R$";

/// Zone used when none is configured.
///
/// ## Business Reason
/// The lot closes its till by local calendar day, not by UTC midnight.
pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";

/// Upper bound of the per-block tolerance, in minutes.
pub const MAX_TOLERANCE_MINUTES: i64 = 59;

/// Longest block of a POR_HORA method (one full day).
pub const MAX_PER_HOUR_BLOCK_MINUTES: i64 = 1440;

/// Longest block of a POR_MINUTO method.
pub const MAX_PER_MINUTE_BLOCK_MINUTES: i64 = 59;

/// The only time text a VALOR_FIXO method accepts.
pub const FIXED_AMOUNT_TIME_SENTINEL: &str = "00:00:00";

/// Plate length bounds after normalization.
pub const MIN_PLATE_LENGTH: usize = 5;
pub const MAX_PLATE_LENGTH: usize = 8;

/// Maximum quantity of a single sale line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest single price or expense accepted: R$ 1.000.000,00.
///
/// Keeps `price × blocks` and `price × quantity` far from `i64` overflow.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Longest description accepted for sales and expenses.
pub const MAX_DESCRIPTION_LENGTH: usize = 200;
