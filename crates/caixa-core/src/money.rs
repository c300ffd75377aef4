//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In the browser:                                                        │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A cart of 3 × R$ 0,10 with 10% off would show R$ 0,27000000000000002   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer centavos                                         │
//! │    30 cents × 1000 bps / 10000 = 3 cents discount, exactly              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use caixa_core::money::Money;
//! use caixa_core::types::{Percentage, Weight};
//!
//! let price = Money::from_cents(1099); // R$10.99
//! let line = price * 3;                // R$32.97
//! assert_eq!(line.cents(), 3297);
//!
//! // 1.5 kg at R$10.99/kg
//! let weighed = price.multiply_weight(Weight::from_grams(1500));
//! assert_eq!(weighed.cents(), 1649);
//!
//! // 10% of R$32.97, rounded half up
//! assert_eq!(line.percentage_of(Percentage::from_bps(1000)).cents(), 330);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::{Percentage, Weight};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (centavos for BRL).
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts and change are computed by subtraction
///   and may transiently go negative before flooring
/// - **Single field tuple struct**: zero-cost abstraction over i64
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► CartItem base ──► item discount ──► line subtotal
///                                                          │
///           promotions ──► global discount ──► loyalty ──► total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (reais) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    ///
    /// Every subtotal and total in the pipeline passes through this:
    /// a discount larger than the amount it applies to yields zero,
    /// never a negative line.
    #[inline]
    pub const fn floor_zero(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Multiplies money by a unit quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Prices a weight against a per-kilogram price.
    ///
    /// `price × grams / 1000`, rounded half up (i128 intermediate).
    pub fn multiply_weight(&self, weight: Weight) -> Money {
        let cents = (self.0 as i128 * weight.grams() as i128 + 500).div_euclid(1000);
        Money(cents as i64)
    }

    /// Returns `rate` of this amount, rounded half up.
    ///
    /// ## Implementation
    /// `(amount * bps + 5000) / 10000` using i128 to avoid overflow.
    ///
    /// ```rust
    /// use caixa_core::money::Money;
    /// use caixa_core::types::Percentage;
    ///
    /// let subtotal = Money::from_cents(3000);
    /// assert_eq!(subtotal.percentage_of(Percentage::from_bps(1000)).cents(), 300);
    /// ```
    pub fn percentage_of(&self, rate: Percentage) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000).div_euclid(10000);
        Money(cents as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    pub fn apply_percentage_discount(&self, rate: Percentage) -> Money {
        *self - self.percentage_of(rate)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display. The UI formats with its own locale rules.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}R${}.{:02}", sign, self.major().abs(), self.minor())
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

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "R$10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-R$5.50");
        assert_eq!(format!("{}", Money::zero()), "R$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_floor_zero() {
        assert_eq!(Money::from_cents(-1).floor_zero(), Money::zero());
        assert_eq!(Money::from_cents(10).floor_zero().cents(), 10);
    }

    #[test]
    fn test_percentage_of_rounds_half_up() {
        // 10% of R$30.00 = R$3.00
        assert_eq!(
            Money::from_cents(3000)
                .percentage_of(Percentage::from_bps(1000))
                .cents(),
            300
        );
        // 15% of R$0.05 = 0.75 cent → 1 cent
        assert_eq!(
            Money::from_cents(5)
                .percentage_of(Percentage::from_bps(1500))
                .cents(),
            1
        );
    }

    #[test]
    fn test_percentage_discount() {
        let subtotal = Money::from_cents(10000);
        let discounted = subtotal.apply_percentage_discount(Percentage::from_bps(1000));
        assert_eq!(discounted.cents(), 9000);
    }

    #[test]
    fn test_multiply_weight() {
        // R$20.00/kg × 0.250 kg = R$5.00
        let per_kg = Money::from_cents(2000);
        assert_eq!(per_kg.multiply_weight(Weight::from_grams(250)).cents(), 500);

        // R$9.99/kg × 0.333 kg = 332.667 → 333 cents
        let per_kg = Money::from_cents(999);
        assert_eq!(per_kg.multiply_weight(Weight::from_grams(333)).cents(), 333);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }
}
