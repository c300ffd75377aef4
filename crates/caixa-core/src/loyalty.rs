//! # Loyalty Redeemer
//!
//! Stages a one-time point redemption against the current purchase.
//!
//! ```text
//! available = 500 pts, point value = R$0.05, purchase = R$12.00
//!
//! cap = min(500, floor(1200 / 5)) = 240 pts
//!
//! redeem(0)    → cleared
//! redeem(50)   → BelowMinimumRedemption (program minimum 100)
//! redeem(240)  → discount R$12.00, available shows 260
//! redeem(300)  → RedemptionExceedsCap
//! ```
//!
//! Nothing is written until checkout: the balance shown as available is
//! the stored balance minus what is staged.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Conversion rules of a loyalty program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoyaltyProgram {
    pub id: String,
    pub name: String,
    /// Value of one point in cents.
    pub point_value_cents: i64,
    /// Smallest redemption allowed per sale.
    pub min_points_redeem: i64,
    /// Points earned per currency unit (R$1.00) spent.
    pub earn_points_per_unit: f64,
    pub is_active: bool,
}

impl LoyaltyProgram {
    #[inline]
    pub fn point_value(&self) -> Money {
        Money::from_cents(self.point_value_cents)
    }

    /// Points earned on a paid amount: floor(amount in reais × earn rate).
    pub fn points_earned(&self, amount: Money) -> i64 {
        points_earned(self, amount)
    }
}

/// Points earned on a paid amount: floor(amount in reais × earn rate).
///
/// Inactive programs and non-positive amounts earn nothing.
pub fn points_earned(program: &LoyaltyProgram, amount: Money) -> i64 {
    if !program.is_active || !amount.is_positive() || program.earn_points_per_unit <= 0.0 {
        return 0;
    }
    let reais = amount.cents() as f64 / 100.0;
    (reais * program.earn_points_per_unit + 1e-9).floor() as i64
}

/// A customer's balance together with their program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerPoints {
    pub customer_id: String,
    pub available_points: i64,
    pub program: LoyaltyProgram,
}

/// Staged redemption state for one sale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoyaltyRedeemer {
    points: Option<CustomerPoints>,
    redeemed: i64,
}

impl LoyaltyRedeemer {
    pub fn new() -> Self {
        LoyaltyRedeemer::default()
    }

    /// Loads a customer's balance, dropping any staged redemption.
    pub fn load(&mut self, points: Option<CustomerPoints>) {
        self.points = points;
        self.redeemed = 0;
    }

    /// Forgets the customer and the staged redemption.
    pub fn reset(&mut self) {
        self.load(None);
    }

    pub fn customer_points(&self) -> Option<&CustomerPoints> {
        self.points.as_ref()
    }

    fn active(&self) -> CoreResult<&CustomerPoints> {
        self.points
            .as_ref()
            .filter(|p| p.program.is_active && p.program.point_value_cents > 0)
            .ok_or(CoreError::NoLoyaltyProgram)
    }

    /// min(stored balance, floor(max_discount / point value)).
    pub fn max_redeemable(&self, max_discount: Money) -> i64 {
        match self.active() {
            Ok(points) => {
                let by_value = max_discount.floor_zero().cents() / points.program.point_value_cents;
                points.available_points.max(0).min(by_value)
            }
            Err(_) => 0,
        }
    }

    /// Stages a redemption. `0` clears it.
    ///
    /// ## Errors
    /// - `NoLoyaltyProgram`: no customer balance, or program inactive
    /// - `BelowMinimumRedemption`: under the program minimum
    /// - `RedemptionExceedsCap`: over balance or purchase value
    pub fn redeem(&mut self, points: i64, max_discount: Money) -> CoreResult<Money> {
        if points == 0 {
            self.redeemed = 0;
            return Ok(Money::zero());
        }

        let program = &self.active()?.program;
        if points < program.min_points_redeem || points < 0 {
            return Err(CoreError::BelowMinimumRedemption {
                requested: points,
                min: program.min_points_redeem,
            });
        }

        let cap = self.max_redeemable(max_discount);
        if points > cap {
            return Err(CoreError::RedemptionExceedsCap {
                requested: points,
                max: cap,
            });
        }

        self.redeemed = points;
        Ok(self.discount())
    }

    /// Zeroes the staged discount; the points show as available again.
    pub fn remove_redemption(&mut self) {
        self.redeemed = 0;
    }

    /// Staged points.
    pub fn redeemed_points(&self) -> i64 {
        self.redeemed
    }

    /// Stored balance minus staged points.
    pub fn available(&self) -> i64 {
        self.points
            .as_ref()
            .map_or(0, |p| p.available_points - self.redeemed)
    }

    /// Staged points × point value.
    pub fn discount(&self) -> Money {
        match &self.points {
            Some(points) => points.program.point_value().multiply_quantity(self.redeemed),
            None => Money::zero(),
        }
    }

    /// True if the staged redemption still fits under `max_discount`.
    pub fn fits(&self, max_discount: Money) -> bool {
        self.redeemed == 0 || self.redeemed <= self.max_redeemable(max_discount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> LoyaltyProgram {
        LoyaltyProgram {
            id: "prog-1".to_string(),
            name: "Clube".to_string(),
            point_value_cents: 5,
            min_points_redeem: 100,
            earn_points_per_unit: 1.0,
            is_active: true,
        }
    }

    fn redeemer(available: i64) -> LoyaltyRedeemer {
        let mut r = LoyaltyRedeemer::new();
        r.load(Some(CustomerPoints {
            customer_id: "c-1".to_string(),
            available_points: available,
            program: program(),
        }));
        r
    }

    #[test]
    fn test_cap_is_min_of_balance_and_value() {
        let r = redeemer(500);
        assert_eq!(r.max_redeemable(Money::from_cents(1200)), 240);
        assert_eq!(r.max_redeemable(Money::from_cents(100_000)), 500);
        // floor: 1204 / 5 = 240.8
        assert_eq!(r.max_redeemable(Money::from_cents(1204)), 240);
    }

    #[test]
    fn test_below_minimum_rejected() {
        let mut r = redeemer(500);
        let err = r.redeem(50, Money::from_cents(10_000)).unwrap_err();
        assert!(matches!(err, CoreError::BelowMinimumRedemption { min: 100, .. }));
        assert_eq!(r.redeemed_points(), 0);
    }

    #[test]
    fn test_redeem_exact_cap() {
        let mut r = redeemer(500);
        let max_discount = Money::from_cents(1203);

        let cap = r.max_redeemable(max_discount);
        let discount = r.redeem(cap, max_discount).unwrap();

        assert_eq!(cap, 240);
        assert_eq!(discount.cents(), 1200);
        assert_eq!(r.available(), 260);
    }

    #[test]
    fn test_above_cap_rejected() {
        let mut r = redeemer(500);
        let err = r.redeem(241, Money::from_cents(1200)).unwrap_err();
        assert!(matches!(err, CoreError::RedemptionExceedsCap { max: 240, .. }));
    }

    #[test]
    fn test_remove_and_zero_restore_availability() {
        let mut r = redeemer(500);
        r.redeem(200, Money::from_cents(10_000)).unwrap();
        assert_eq!(r.discount().cents(), 1000);

        r.remove_redemption();
        assert_eq!(r.discount(), Money::zero());
        assert_eq!(r.available(), 500);

        r.redeem(200, Money::from_cents(10_000)).unwrap();
        r.redeem(0, Money::from_cents(10_000)).unwrap();
        assert_eq!(r.available(), 500);
    }

    #[test]
    fn test_no_program() {
        let mut r = LoyaltyRedeemer::new();
        assert_eq!(r.max_redeemable(Money::from_cents(1000)), 0);
        assert!(matches!(
            r.redeem(100, Money::from_cents(1000)).unwrap_err(),
            CoreError::NoLoyaltyProgram
        ));
    }

    #[test]
    fn test_staged_redemption_fit() {
        let mut r = redeemer(500);
        r.redeem(200, Money::from_cents(1000)).unwrap();

        assert!(r.fits(Money::from_cents(1000)));
        assert!(!r.fits(Money::from_cents(500)));
    }

    #[test]
    fn test_points_earned_floors() {
        let p = program();
        assert_eq!(points_earned(&p, Money::from_cents(2799)), 27);
        assert_eq!(p.points_earned(Money::from_cents(100)), 1);
        assert_eq!(points_earned(&p, Money::zero()), 0);

        let mut inactive = program();
        inactive.is_active = false;
        assert_eq!(points_earned(&inactive, Money::from_cents(10_000)), 0);
    }
}
