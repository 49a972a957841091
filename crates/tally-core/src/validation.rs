//! # Validation Module
//!
//! Caller-side checks. The cart engine itself accepts whatever it is given
//! (a 150% discount is stored as-is); screens run these before calling it,
//! and the checkout path runs the required-field checks before touching the
//! store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Screen                                                       │
//! │  └── validate_discount, parse_iso_date ← THIS MODULE                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Checkout                                                     │
//! │  └── validate_payment_mode, validate_amount_paid ← THIS MODULE         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  └── NOT NULL, CHECK, foreign keys                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::cart::Discount;
use crate::error::ValidationError;
use crate::money::{Money, BPS_SCALE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest payment mode label accepted by checkout.
pub const MAX_PAYMENT_MODE_LEN: usize = 32;

/// Validates a discount before it is handed to the cart.
///
/// ## Rules
/// - Percentage: 0% to 100% (0 to 10000 bps)
/// - Fixed: not negative
///
/// ```rust
/// use tally_core::cart::Discount;
/// use tally_core::validation::validate_discount;
/// use tally_core::Money;
///
/// assert!(validate_discount(&Discount::Percentage(1500)).is_ok());
/// assert!(validate_discount(&Discount::Percentage(10001)).is_err());
/// assert!(validate_discount(&Discount::Fixed(Money::from_cents(-1))).is_err());
/// ```
pub fn validate_discount(discount: &Discount) -> ValidationResult<()> {
    match discount {
        Discount::Percentage(bps) if !(0..=BPS_SCALE).contains(bps) => {
            Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: BPS_SCALE,
            })
        }
        Discount::Fixed(amount) if amount.is_negative() => {
            Err(ValidationError::MustNotBeNegative {
                field: "discount".to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Validates the payment mode given to checkout.
///
/// ## Returns
/// The trimmed, lowercased mode (`" Cash "` → `"cash"`).
pub fn validate_payment_mode(mode: &str) -> ValidationResult<String> {
    let mode = mode.trim();

    if mode.is_empty() {
        return Err(ValidationError::Required {
            field: "payment_mode".to_string(),
        });
    }

    if mode.len() > MAX_PAYMENT_MODE_LEN {
        return Err(ValidationError::TooLong {
            field: "payment_mode".to_string(),
            max: MAX_PAYMENT_MODE_LEN,
        });
    }

    Ok(mode.to_lowercase())
}

/// Validates the amount tendered at checkout. Zero is allowed (credit sale).
pub fn validate_amount_paid(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "amount_paid".to_string(),
        });
    }

    Ok(())
}

/// Parses a zero-padded ISO `YYYY-MM-DD` date.
///
/// ```rust
/// use tally_core::validation::parse_iso_date;
///
/// assert!(parse_iso_date("from", "2024-03-01").is_ok());
/// assert!(parse_iso_date("from", "2024-3-1").is_err());
/// ```
pub fn parse_iso_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    let value = value.trim();

    // Strings are compared lexicographically in storage, so padding matters
    if value.len() != 10 {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected zero-padded YYYY-MM-DD".to_string(),
        });
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(&Discount::Percentage(0)).is_ok());
        assert!(validate_discount(&Discount::Percentage(10_000)).is_ok());
        assert!(validate_discount(&Discount::Percentage(-1)).is_err());
        assert!(validate_discount(&Discount::Percentage(10_001)).is_err());
        assert!(validate_discount(&Discount::Fixed(Money::zero())).is_ok());
        assert!(validate_discount(&Discount::Fixed(Money::from_cents(-5))).is_err());
    }

    #[test]
    fn test_validate_payment_mode() {
        assert_eq!(validate_payment_mode(" Cash ").unwrap(), "cash");
        assert!(validate_payment_mode("").is_err());
        assert!(validate_payment_mode("   ").is_err());
        assert!(validate_payment_mode(&"x".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_amount_paid() {
        assert!(validate_amount_paid(Money::zero()).is_ok());
        assert!(validate_amount_paid(Money::from_cents(100)).is_ok());
        assert_eq!(
            validate_amount_paid(Money::from_cents(-1)),
            Err(ValidationError::MustNotBeNegative {
                field: "amount_paid".to_string()
            })
        );
    }

    #[test]
    fn test_parse_iso_date() {
        let date = parse_iso_date("to", "2024-12-31").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert!(parse_iso_date("to", "2024-02-30").is_err());
        assert!(parse_iso_date("to", "31/12/2024").is_err());
    }
}
