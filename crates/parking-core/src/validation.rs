//! # Validation Module
//!
//! Input validation for the parking till.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request layer                                                │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Plate format, tolerance range, prices, quantities                 │
//! │  └── Normalization (plates are stored uppercase, no separators)        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on statuses and categories                      │
//! │  └── Partial UNIQUE indexes (one open register / one plate inside)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use parking_core::validation::{normalize_plate, validate_quantity};
//!
//! assert_eq!(normalize_plate("abc-1d23").unwrap(), "ABC1D23");
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::{
    MAX_DESCRIPTION_LENGTH, MAX_ITEM_QUANTITY, MAX_PLATE_LENGTH, MAX_PRICE_CENTS,
    MAX_TOLERANCE_MINUTES, MIN_PLATE_LENGTH,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Normalizes and validates a license plate.
///
/// ## Rules
/// - Hyphens and spaces are dropped, letters uppercased
/// - What remains must be 5 to 8 ASCII letters or digits
///
/// ## Example
/// ```rust
/// use parking_core::validation::normalize_plate;
///
/// assert_eq!(normalize_plate(" abc 1234 ").unwrap(), "ABC1234");
/// assert!(normalize_plate("AB-1").is_err());
/// assert!(normalize_plate("ABC*123").is_err());
/// ```
pub fn normalize_plate(raw: &str) -> ValidationResult<String> {
    let plate: String = raw
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if plate.is_empty() {
        return Err(ValidationError::Required {
            field: "plate".to_string(),
        });
    }

    if !plate.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "plate".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    if plate.len() < MIN_PLATE_LENGTH {
        return Err(ValidationError::TooShort {
            field: "plate".to_string(),
            min: MIN_PLATE_LENGTH,
        });
    }

    if plate.len() > MAX_PLATE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "plate".to_string(),
            max: MAX_PLATE_LENGTH,
        });
    }

    Ok(plate)
}

/// Validates a sale or expense description and returns it trimmed.
pub fn validate_description(description: &str) -> ValidationResult<String> {
    let description = description.trim();

    if description.is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }

    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LENGTH,
        });
    }

    Ok(description.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a per-block tolerance: 0..=59 minutes.
pub fn validate_tolerance(minutes: i64) -> ValidationResult<()> {
    if !(0..=MAX_TOLERANCE_MINUTES).contains(&minutes) {
        return Err(ValidationError::OutOfRange {
            field: "tolerance".to_string(),
            min: 0,
            max: MAX_TOLERANCE_MINUTES,
        });
    }

    Ok(())
}

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (courtesy parking)
/// - At most [`MAX_PRICE_CENTS`](crate::MAX_PRICE_CENTS)
///
/// ## Example
/// ```rust
/// use parking_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(500, "car_value").is_ok());
/// assert!(validate_price_cents(0, "car_value").is_ok());
/// assert!(validate_price_cents(-100, "car_value").is_err());
/// assert!(validate_price_cents(i64::MAX, "car_value").is_err());
/// ```
pub fn validate_price_cents(cents: i64, field: &str) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates an amount that must move money: strictly positive cents.
pub fn validate_positive_amount(cents: i64, field: &str) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plate() {
        assert_eq!(normalize_plate("ABC1234").unwrap(), "ABC1234");
        assert_eq!(normalize_plate("abc-1234").unwrap(), "ABC1234");
        assert_eq!(normalize_plate("bra2e19").unwrap(), "BRA2E19");
        assert_eq!(normalize_plate("  xyz 987 ").unwrap(), "XYZ987");

        assert!(normalize_plate("").is_err());
        assert!(normalize_plate(" - ").is_err());
        assert!(normalize_plate("AB12").is_err());
        assert!(normalize_plate("ABCDE12345").is_err());
        assert!(normalize_plate("ABC.123").is_err());
        assert!(normalize_plate("ÁBC1234").is_err());
    }

    #[test]
    fn test_validate_description() {
        assert_eq!(validate_description("  Car wash ").unwrap(), "Car wash");
        assert!(validate_description("   ").is_err());
        assert!(validate_description(&"x".repeat(MAX_DESCRIPTION_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_tolerance() {
        assert!(validate_tolerance(0).is_ok());
        assert!(validate_tolerance(59).is_ok());
        assert!(validate_tolerance(60).is_err());
        assert!(validate_tolerance(-1).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_price_cents(0, "price").is_ok());
        assert!(validate_price_cents(-1, "price").is_err());
        assert!(validate_price_cents(MAX_PRICE_CENTS, "price").is_ok());
        assert!(matches!(
            validate_price_cents(MAX_PRICE_CENTS + 1, "price"),
            Err(ValidationError::OutOfRange { max: MAX_PRICE_CENTS, .. })
        ));
        assert!(validate_positive_amount(MAX_PRICE_CENTS + 1, "amount").is_err());

        assert!(validate_positive_amount(1, "amount").is_ok());
        assert!(validate_positive_amount(0, "amount").is_err());
        assert!(validate_positive_amount(-50, "amount").is_err());
    }
}
