//! # Money Module
//!
//! Provides the `Money` type used for every amount in the ledger, the reports
//! and the cart.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Reports sum thousands of rows; the cart identity                       │
//! │                                                                         │
//! │    grand_total == subtotal - discount_total + tax_total                 │
//! │                                                                         │
//! │  must hold after every edit. With integer cents both are exact.         │
//! │  Percentages (tax, discounts) are basis points: 825 = 8.25%.            │
//! │  Rounding happens once, at the cent, half away from zero.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1099);
//! let line = price * 3;
//! assert_eq!(line.cents(), 3297);
//! assert_eq!(line.percentage(1000).cents(), 330); // 10% of $32.97
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Basis points in 100%.
pub const BPS_SCALE: i64 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// Signed: opening balances, statement balances and net figures go negative.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Reads a nullable storage amount. `NULL` (e.g. `SUM` over no rows)
    /// counts as zero.
    #[inline]
    pub fn from_nullable(value: Option<Money>) -> Self {
        value.unwrap_or_default()
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
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

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps negative values to zero.
    #[inline]
    pub fn non_negative(self) -> Self {
        Money(self.0.max(0))
    }

    /// Returns `bps` basis points of this amount, rounded half away from zero.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1000).percentage(825).cents(), 83);
    /// assert_eq!(Money::from_cents(-1000).percentage(825).cents(), -83);
    /// ```
    pub fn percentage(&self, bps: i64) -> Money {
        let product = self.0 as i128 * bps as i128;
        let half = (BPS_SCALE / 2) as i128;
        let rounded = if product >= 0 {
            (product + half) / BPS_SCALE as i128
        } else {
            (product - half) / BPS_SCALE as i128
        };
        Money(rounded as i64)
    }

    /// Calculates tax on this amount at the given rate.
    ///
    /// ## User Workflow
    /// ```text
    /// Line: $10.00 after item discount
    ///      │
    ///      ▼
    /// calculate_tax(8.25%) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Tax: $0.83
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.percentage(rate.bps() as i64)
    }

    /// Multiplies by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Divides into `parts` equal shares rounded half away from zero.
    /// Returns zero when `parts` is zero.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(5000).divide_by(5).cents(), 1000);
    /// assert_eq!(Money::from_cents(1000).divide_by(3).cents(), 333);
    /// assert_eq!(Money::from_cents(1000).divide_by(0).cents(), 0);
    /// ```
    pub fn divide_by(&self, parts: i64) -> Money {
        if parts == 0 {
            return Money::zero();
        }
        let value = self.0 as i128;
        let parts = parts as i128;
        // (2a + sign(a)·|b|) / 2b rounds a/b half away from zero
        let numerator = 2 * value + value.signum() * parts.abs();
        Money((numerator / (2 * parts)) as i64)
    }

    /// Ratio of this amount to `whole`, or 0.0 when `whole` is not positive.
    /// Display only.
    pub fn ratio_of(&self, whole: Money) -> f64 {
        if whole.0 <= 0 {
            return 0.0;
        }
        self.0 as f64 / whole.0 as f64
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering. Screens format with the store's currency
/// settings instead.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);
        assert_eq!(vec![a, b, b].into_iter().sum::<Money>().cents(), 2000);
    }

    #[test]
    fn test_percentage_rounds_half_away_from_zero() {
        // 8.25% of $10.00 = 82.5 cents
        assert_eq!(Money::from_cents(1000).percentage(825).cents(), 83);
        assert_eq!(Money::from_cents(-1000).percentage(825).cents(), -83);
        // 10% of $1.04 = 10.4 cents
        assert_eq!(Money::from_cents(104).percentage(1000).cents(), 10);
        assert_eq!(Money::from_cents(5000).percentage(0).cents(), 0);
    }

    #[test]
    fn test_tax_calculation() {
        let amount = Money::from_cents(1000);
        assert_eq!(amount.calculate_tax(TaxRate::from_bps(1000)).cents(), 100);
        assert_eq!(amount.calculate_tax(TaxRate::zero()).cents(), 0);
    }

    #[test]
    fn test_divide_by() {
        assert_eq!(Money::from_cents(5000).divide_by(5).cents(), 1000);
        assert_eq!(Money::from_cents(1001).divide_by(2).cents(), 501);
        assert_eq!(Money::from_cents(-1001).divide_by(2).cents(), -501);
        assert_eq!(Money::from_cents(700).divide_by(0).cents(), 0);
    }

    #[test]
    fn test_nullable_and_clamp() {
        assert_eq!(Money::from_nullable(None), Money::zero());
        assert_eq!(Money::from_nullable(Some(Money::from_cents(7))).cents(), 7);
        assert_eq!(Money::from_cents(-7).non_negative(), Money::zero());
    }

    #[test]
    fn test_ratio_of() {
        let profit = Money::from_cents(250);
        assert!((profit.ratio_of(Money::from_cents(1000)) - 0.25).abs() < 1e-9);
        assert_eq!(profit.ratio_of(Money::zero()), 0.0);
    }
}
