//! # Billing Calculator
//!
//! Pure functions that validate a billing method and turn a stay into an
//! amount due.
//!
//! ## Block Consumption
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POR_HORA, block = 60 min, tolerance = 10 min, car = R$ 5,00            │
//! │                                                                         │
//! │  stay (min)   0 ──── 10 │ 11 ─────────── 70 │ 71 ─────────── 140 │ 141…  │
//! │  blocks          free   │        1          │         2          │  3    │
//! │  amount        R$ 0,00  │     R$ 5,00       │     R$ 10,00       │       │
//! │                                                                         │
//! │  Each block is worth (time unit + tolerance) minutes: the tolerance is │
//! │  granted again for every block, not only once at the start.           │
//! │                                                                         │
//! │  VALOR_FIXO: the flat price, whatever the stay.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use parking_core::billing::{amount_for_stay, BillingRates};
//! use parking_core::money::Money;
//! use parking_core::VehicleCategory;
//!
//! let rates = BillingRates {
//!     time_unit_minutes: 60,
//!     tolerance_minutes: 10,
//!     car_value: Money::from_cents(500),
//!     moto_value: Money::from_cents(300),
//! };
//!
//! let due = amount_for_stay(65, VehicleCategory::Car, &rates).unwrap();
//! assert_eq!(due.amount.cents(), 500);
//! assert_eq!(due.blocks, 1);
//! ```

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{BillingCategory, VehicleCategory};
use crate::validation::{validate_price_cents, validate_tolerance};
use crate::{FIXED_AMOUNT_TIME_SENTINEL, MAX_PER_HOUR_BLOCK_MINUTES, MAX_PER_MINUTE_BLOCK_MINUTES};

// =============================================================================
// Types
// =============================================================================

/// The read-only billing inputs of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillingRates {
    /// Block length; 0 means flat price.
    pub time_unit_minutes: i64,
    pub tolerance_minutes: i64,
    pub car_value: Money,
    pub moto_value: Money,
}

impl BillingRates {
    /// Price of one block for the given vehicle.
    pub fn base_value(&self, category: VehicleCategory) -> Money {
        match category {
            VehicleCategory::Car => self.car_value,
            VehicleCategory::Motorcycle => self.moto_value,
        }
    }
}

/// Result of a successful configuration check, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillingConfiguration {
    pub category: BillingCategory,
    pub time_unit_minutes: i64,
    pub tolerance_minutes: i64,
    pub description: String,
}

/// What a stay costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AmountDue {
    pub amount: Money,
    /// Blocks consumed; 1 for a flat price.
    pub blocks: i64,
    pub stay_minutes: i64,
}

// =============================================================================
// Configuration Validation
// =============================================================================

/// Validates a billing method before it is stored.
///
/// ## Rules
/// - `POR_HORA`: `raw_time` parses to 1..=1440 minutes
/// - `POR_MINUTO`: `raw_time` parses to 1..=59 minutes
/// - `VALOR_FIXO`: `raw_time` absent or `"00:00:00"`; block length forced to 0
/// - tolerance in 0..=59; prices non-negative
///
/// ## Example
/// ```rust
/// use parking_core::billing::validate_configuration;
/// use parking_core::money::Money;
///
/// let ok = validate_configuration(
///     "POR_HORA", Some("01:00:00"), 10, Money::from_cents(500), Money::from_cents(300),
/// ).unwrap();
/// assert_eq!(ok.time_unit_minutes, 60);
///
/// assert!(validate_configuration(
///     "POR_HORA", Some("25:00:00"), 10, Money::zero(), Money::zero(),
/// ).is_err());
/// ```
pub fn validate_configuration(
    category: &str,
    raw_time: Option<&str>,
    tolerance_minutes: i64,
    car_value: Money,
    moto_value: Money,
) -> CoreResult<BillingConfiguration> {
    let category: BillingCategory = category.parse()?;

    let time_unit_minutes = match category {
        BillingCategory::PerHour => {
            block_minutes_in_range(raw_time, 1, MAX_PER_HOUR_BLOCK_MINUTES, category)?
        }
        BillingCategory::PerMinute => {
            block_minutes_in_range(raw_time, 1, MAX_PER_MINUTE_BLOCK_MINUTES, category)?
        }
        BillingCategory::FixedAmount => {
            if let Some(raw) = raw_time {
                if raw.trim() != FIXED_AMOUNT_TIME_SENTINEL {
                    return Err(CoreError::billing_config(format!(
                        "VALOR_FIXO does not take a block length (got '{}')",
                        raw
                    )));
                }
            }
            0
        }
    };

    validate_tolerance(tolerance_minutes)?;
    validate_price_cents(car_value.cents(), "car_value")?;
    validate_price_cents(moto_value.cents(), "moto_value")?;

    Ok(BillingConfiguration {
        category,
        time_unit_minutes,
        tolerance_minutes,
        description: describe(category, time_unit_minutes, tolerance_minutes, car_value, moto_value),
    })
}

fn block_minutes_in_range(
    raw_time: Option<&str>,
    min: i64,
    max: i64,
    category: BillingCategory,
) -> CoreResult<i64> {
    let raw = raw_time.ok_or_else(|| ValidationError::Required {
        field: "time".to_string(),
    })?;
    let minutes = parse_clock_minutes(raw)?;

    if minutes < min || minutes > max {
        return Err(CoreError::billing_config(format!(
            "{} block must be between {} and {} minutes, got {}",
            category, min, max, minutes
        )));
    }

    Ok(minutes)
}

/// Parses `hh:mm:ss` into whole minutes: `h*60 + m + round(s/60)`.
///
/// Components are not range-checked individually: `"25:00:00"` is 1500 and
/// `"00:60:00"` is 60, so the category range decides.
pub fn parse_clock_minutes(raw: &str) -> CoreResult<i64> {
    let invalid = || ValidationError::InvalidFormat {
        field: "time".to_string(),
        reason: format!("expected hh:mm:ss, got '{}'", raw),
    };

    let parts: Vec<&str> = raw.trim().split(':').collect();
    if parts.len() != 3 {
        return Err(invalid().into());
    }

    let mut values = [0i64; 3];
    for (slot, part) in values.iter_mut().zip(&parts) {
        if part.is_empty() || part.len() > 4 || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid().into());
        }
        *slot = part.parse().map_err(|_| invalid())?;
    }

    let [hours, minutes, seconds] = values;
    // half-up: 30 seconds count as a minute
    Ok(hours * 60 + minutes + (seconds + 30) / 60)
}

/// `90` → `"01h30"`.
fn format_block(minutes: i64) -> String {
    format!("{:02}h{:02}", minutes / 60, minutes % 60)
}

fn describe(
    category: BillingCategory,
    time_unit_minutes: i64,
    tolerance_minutes: i64,
    car_value: Money,
    moto_value: Money,
) -> String {
    match category {
        BillingCategory::PerHour => format!(
            "Hourly: {} per car / {} per motorcycle every {}, {} min tolerance",
            car_value,
            moto_value,
            format_block(time_unit_minutes),
            tolerance_minutes
        ),
        BillingCategory::PerMinute => format!(
            "Per minute: {} per car / {} per motorcycle every {} min, {} min tolerance",
            car_value, moto_value, time_unit_minutes, tolerance_minutes
        ),
        BillingCategory::FixedAmount => format!(
            "Fixed: {} per car / {} per motorcycle",
            car_value, moto_value
        ),
    }
}

// =============================================================================
// Amount Due
// =============================================================================

/// Computes what a vehicle owes at `now`.
///
/// Both instants are in the business zone by type; the stay is floored to
/// whole minutes.
///
/// ## Returns
/// * `Ok(AmountDue)` - amount rounded to cents
/// * `Err(CoreError::InsufficientTime)` - negative stay, or a time-based
///   method still within its tolerance (amount due is zero)
pub fn compute_amount_due(
    entry_time: DateTime<Tz>,
    category: VehicleCategory,
    rates: &BillingRates,
    now: DateTime<Tz>,
) -> CoreResult<AmountDue> {
    let stay_minutes = (now - entry_time).num_milliseconds().div_euclid(60_000);
    amount_for_stay(stay_minutes, category, rates)
}

/// Same as [`compute_amount_due`] for an already computed stay.
pub fn amount_for_stay(
    stay_minutes: i64,
    category: VehicleCategory,
    rates: &BillingRates,
) -> CoreResult<AmountDue> {
    let insufficient = CoreError::InsufficientTime {
        stay_minutes,
        tolerance_minutes: rates.tolerance_minutes,
    };

    if stay_minutes < 0 {
        return Err(insufficient);
    }

    let base_value = rates.base_value(category);

    if rates.time_unit_minutes <= 0 {
        return Ok(AmountDue {
            amount: base_value,
            blocks: 1,
            stay_minutes,
        });
    }

    if stay_minutes <= rates.tolerance_minutes {
        return Err(insufficient);
    }

    let blocks = consumed_blocks(stay_minutes, rates.time_unit_minutes, rates.tolerance_minutes);
    let amount = base_value
        .multiply_blocks(blocks)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "amount_due".to_string(),
            min: 0,
            max: i64::MAX,
        })?;

    Ok(AmountDue {
        amount,
        blocks,
        stay_minutes,
    })
}

/// Number of `(time_unit + tolerance)` slices needed to cover the stay.
///
/// Equivalent to subtracting one slice at a time while time remains.
fn consumed_blocks(stay_minutes: i64, time_unit_minutes: i64, tolerance_minutes: i64) -> i64 {
    let slice = time_unit_minutes + tolerance_minutes;
    stay_minutes / slice + i64::from(stay_minutes % slice != 0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::{Duration, TimeZone};

    fn hourly() -> BillingRates {
        BillingRates {
            time_unit_minutes: 60,
            tolerance_minutes: 10,
            car_value: Money::from_cents(500),
            moto_value: Money::from_cents(300),
        }
    }

    fn per_minute() -> BillingRates {
        BillingRates {
            time_unit_minutes: 15,
            tolerance_minutes: 5,
            car_value: Money::from_cents(100),
            moto_value: Money::from_cents(50),
        }
    }

    fn fixed() -> BillingRates {
        BillingRates {
            time_unit_minutes: 0,
            tolerance_minutes: 10,
            car_value: Money::from_cents(2000),
            moto_value: Money::from_cents(1000),
        }
    }

    /// Reference loop: subtract one block (plus its tolerance) at a time.
    fn blocks_by_subtraction(stay: i64, unit: i64, tolerance: i64) -> i64 {
        let mut remaining = stay;
        let mut blocks = 0;
        while remaining > 0 {
            blocks += 1;
            remaining -= unit + tolerance;
        }
        blocks
    }

    #[test]
    fn test_within_tolerance_is_insufficient_time() {
        for rates in [hourly(), per_minute()] {
            for stay in 0..=rates.tolerance_minutes {
                let err = amount_for_stay(stay, VehicleCategory::Car, &rates).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::InsufficientTime, "stay {}", stay);
            }
        }
    }

    #[test]
    fn test_block_boundaries() {
        for rates in [hourly(), per_minute()] {
            let base = rates.car_value;
            let tol = rates.tolerance_minutes;
            let unit = rates.time_unit_minutes;

            let one_over = amount_for_stay(tol + 1, VehicleCategory::Car, &rates).unwrap();
            assert_eq!(one_over.amount, base);

            let full = amount_for_stay(unit + tol, VehicleCategory::Car, &rates).unwrap();
            assert_eq!(full.amount, base);
            assert_eq!(full.blocks, 1);

            let rolled = amount_for_stay(unit + tol + 1, VehicleCategory::Car, &rates).unwrap();
            assert_eq!(Some(rolled.amount), base.multiply_blocks(2));
            assert_eq!(rolled.blocks, 2);
        }
    }

    #[test]
    fn test_concrete_hourly_scenario() {
        // 65 min with a 60+10 block: one block, not ceil(65/60) = 2
        let tz = chrono_tz::America::Sao_Paulo;
        let entry = tz.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
        let now = entry + Duration::minutes(65);

        let due = compute_amount_due(entry, VehicleCategory::Car, &hourly(), now).unwrap();
        assert_eq!(due.amount, Money::from_cents(500));
        assert_eq!(due.blocks, 1);
        assert_eq!(due.stay_minutes, 65);

        let moto = compute_amount_due(entry, VehicleCategory::Motorcycle, &hourly(), now).unwrap();
        assert_eq!(moto.amount, Money::from_cents(300));
    }

    #[test]
    fn test_block_count_matches_subtraction() {
        for rates in [hourly(), per_minute()] {
            for stay in (rates.tolerance_minutes + 1)..600 {
                let due = amount_for_stay(stay, VehicleCategory::Car, &rates).unwrap();
                assert_eq!(
                    due.blocks,
                    blocks_by_subtraction(stay, rates.time_unit_minutes, rates.tolerance_minutes),
                    "stay {}",
                    stay
                );
            }
        }
    }

    #[test]
    fn test_fixed_amount_ignores_stay() {
        for stay in [0, 1, 10_000] {
            let due = amount_for_stay(stay, VehicleCategory::Car, &fixed()).unwrap();
            assert_eq!(due.amount, Money::from_cents(2000));
        }
        let moto = amount_for_stay(3, VehicleCategory::Motorcycle, &fixed()).unwrap();
        assert_eq!(moto.amount, Money::from_cents(1000));
    }

    #[test]
    fn test_negative_stay_rejected() {
        let tz = chrono_tz::America::Sao_Paulo;
        let entry = tz.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
        let now = entry - Duration::minutes(5);

        for rates in [hourly(), fixed()] {
            let err = compute_amount_due(entry, VehicleCategory::Car, &rates, now).unwrap_err();
            assert!(err.is_insufficient_time());
        }
    }

    #[test]
    fn test_parse_clock_minutes() {
        assert_eq!(parse_clock_minutes("01:00:00").unwrap(), 60);
        assert_eq!(parse_clock_minutes("25:00:00").unwrap(), 1500);
        assert_eq!(parse_clock_minutes("00:60:00").unwrap(), 60);
        assert_eq!(parse_clock_minutes("00:10:29").unwrap(), 10);
        assert_eq!(parse_clock_minutes("00:10:30").unwrap(), 11);

        assert!(parse_clock_minutes("01:00").is_err());
        assert!(parse_clock_minutes("aa:00:00").is_err());
        assert!(parse_clock_minutes("").is_err());
    }

    #[test]
    fn test_validate_per_hour_range() {
        let zero = Money::zero();
        assert!(validate_configuration("PER_HORA", Some("25:00:00"), 10, zero, zero).is_err());

        let ok = validate_configuration("PER_HORA", Some("24:00:00"), 10, zero, zero).unwrap();
        assert_eq!(ok.time_unit_minutes, 1440);
        assert_eq!(ok.category, BillingCategory::PerHour);

        assert!(validate_configuration("POR_HORA", Some("00:00:00"), 10, zero, zero).is_err());
        assert!(validate_configuration("POR_HORA", None, 10, zero, zero).is_err());
    }

    #[test]
    fn test_validate_per_minute_range() {
        let zero = Money::zero();
        assert!(validate_configuration("POR_MINUTO", Some("00:60:00"), 0, zero, zero).is_err());

        let ok = validate_configuration("POR_MINUTO", Some("00:59:00"), 0, zero, zero).unwrap();
        assert_eq!(ok.time_unit_minutes, 59);
    }

    #[test]
    fn test_validate_fixed_amount() {
        let zero = Money::zero();
        let err = validate_configuration("VALOR_FIXO", Some("00:05:00"), 0, zero, zero).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let none = validate_configuration("VALOR_FIXO", None, 0, zero, zero).unwrap();
        assert_eq!(none.time_unit_minutes, 0);

        let sentinel = validate_configuration("VALOR_FIXO", Some("00:00:00"), 0, zero, zero).unwrap();
        assert_eq!(sentinel.time_unit_minutes, 0);
    }

    #[test]
    fn test_validate_rejects_unknown_category_and_bad_tolerance() {
        let zero = Money::zero();
        assert!(validate_configuration("DIARIA", Some("01:00:00"), 10, zero, zero).is_err());
        assert!(validate_configuration("POR_HORA", Some("01:00:00"), 60, zero, zero).is_err());
        assert!(validate_configuration("POR_HORA", Some("01:00:00"), -1, zero, zero).is_err());
        assert!(validate_configuration(
            "POR_HORA",
            Some("01:00:00"),
            10,
            Money::from_cents(-1),
            zero
        )
        .is_err());
    }

    #[test]
    fn test_description_embeds_prices_and_block() {
        let cfg = validate_configuration(
            "POR_HORA",
            Some("01:30:00"),
            10,
            Money::from_cents(500),
            Money::from_cents(350),
        )
        .unwrap();
        assert_eq!(
            cfg.description,
            "Hourly: R$ 5,00 per car / R$ 3,50 per motorcycle every 01h30, 10 min tolerance"
        );

        let cfg = validate_configuration(
            "VALOR_FIXO",
            None,
            0,
            Money::from_cents(2000),
            Money::from_cents(1000),
        )
        .unwrap();
        assert_eq!(cfg.description, "Fixed: R$ 20,00 per car / R$ 10,00 per motorcycle");
    }

    #[test]
    fn test_price_above_limit_rejected() {
        let err = validate_configuration(
            "POR_HORA",
            Some("01:00:00"),
            10,
            Money::from_cents(i64::MAX / 2 + 1),
            Money::from_cents(300),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(validate_configuration(
            "POR_HORA",
            Some("01:00:00"),
            10,
            Money::from_cents(crate::MAX_PRICE_CENTS),
            Money::from_cents(300),
        )
        .is_ok());
    }

    #[test]
    fn test_overflowing_charge_is_an_error() {
        let rates = BillingRates {
            car_value: Money::from_cents(i64::MAX / 2 + 1),
            ..hourly()
        };

        let err = amount_for_stay(71, VehicleCategory::Car, &rates).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        // absurd stay at the highest accepted price
        let rates = BillingRates {
            time_unit_minutes: 1,
            tolerance_minutes: 0,
            car_value: Money::from_cents(crate::MAX_PRICE_CENTS),
            moto_value: Money::zero(),
        };
        assert!(amount_for_stay(i64::MAX, VehicleCategory::Car, &rates).is_err());
    }
}
