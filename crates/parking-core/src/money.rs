//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Billing a stay: 3 blocks × R$ 3,35 must be exactly R$ 10,05,           │
//! │  and the till balance must match to the cent after a day of entries.   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    335 cents × 3 = 1005 cents. "Round to two decimals" is exact.       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use parking_core::money::Money;
//!
//! let block = Money::from_cents(500);         // R$ 5,00
//! let due = block.multiply_blocks(3);         // Some(R$ 15,00)
//! assert_eq!(due.map(|m| m.to_decimal_comma()).as_deref(), Some("15,00"));
//!
//! let parsed = Money::parse("12,50").unwrap();
//! assert_eq!(parsed.cents(), 1250);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::CURRENCY_SYMBOL;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for balance decrements
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  BillingMethod.car_value_cents ──► amount due ──► VehicleTransaction    │
/// │                                                       │                 │
/// │  Sale.total_cents ─────────────────────────────────┐  │                 │
/// │  Expense.amount_cents ─────────────────────────────┤  ▼                 │
/// │                                                    └► FinancialDelta    │
/// │                                                          │              │
/// │                                       CashRegister.final_value_cents   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use parking_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // R$ 10,99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Price of `blocks` consumed billing blocks, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use parking_core::money::Money;
    ///
    /// let block = Money::from_cents(350); // R$ 3,50
    /// assert_eq!(block.multiply_blocks(4), Some(Money::from_cents(1400)));
    /// assert_eq!(block.multiply_blocks(i64::MAX), None);
    /// ```
    #[inline]
    pub const fn multiply_blocks(&self, blocks: i64) -> Option<Self> {
        match self.0.checked_mul(blocks) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Formats as a decimal-comma number with two places: `1234,50`.
    pub fn to_decimal_comma(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{},{:02}", sign, self.units().abs(), self.cents_part())
    }

    /// Parses a decimal amount written with either separator.
    ///
    /// Accepted: `"5"`, `"5,5"`, `"5,50"`, `"5.50"`, `"1.234,56"`, `"-2,00"`.
    /// When a comma is present, dots are thousands separators.
    pub fn parse(input: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let normalized = if body.contains(',') {
            body.replace('.', "").replace(',', ".")
        } else {
            body.to_string()
        };

        let (int_part, frac_part) = match normalized.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (normalized.as_str(), ""),
        };

        if int_part.is_empty() || !int_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected digits before the decimal separator"));
        }
        if frac_part.len() > 2 || !frac_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("at most two decimal places"));
        }

        let units: i64 = int_part.parse().map_err(|_| invalid("amount too large"))?;
        let minor: i64 = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<i64>().map_err(|_| invalid("bad decimals"))? * 10,
            _ => frac_part.parse().map_err(|_| invalid("bad decimals"))?,
        };

        let cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the currency symbol and a decimal comma: `R$ 5,00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", CURRENCY_SYMBOL, self.to_decimal_comma())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
