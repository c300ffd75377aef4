//! # Promotion Evaluator
//!
//! Decides which promotion (at most one) applies to each cart line and how
//! much it takes off.
//!
//! ## Evaluation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Promotion Evaluation (per line)                      │
//! │                                                                         │
//! │  promotions (backend order: oldest first)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  is_active_at(now)?  ── flag, date window, time-of-day window          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  applies_to(line)?   ── scope, min quantity, min value                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  discount_for(line)  ── rule arithmetic, capped at line subtotal       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SelectionPolicy     ── FirstMatch: first positive discount wins       │
//! │                         LargestDiscount: biggest wins, ties → earlier  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Option<AppliedPromotion>                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartItem;
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Percentage;
use crate::validation::validate_rate;

// =============================================================================
// Rules
// =============================================================================

/// What a promotion does to a matching line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromotionRule {
    /// Percentage of the line subtotal, optionally capped.
    Percentage {
        rate: Percentage,
        max_discount_cents: Option<i64>,
    },

    /// Fixed amount off the line.
    FixedAmount { amount_cents: i64 },

    /// Every group of `buy + get` units gets `get` units free.
    BuyXGetY { buy: i64, get: i64 },

    /// Rate grows by `step` for each unit from `min_quantity` on, up to
    /// `max_rate`.
    ///
    /// ```text
    /// min_quantity = 3, step = 5%, max_rate = 15%
    ///
    /// qty:   1   2   3   4   5   6   7
    /// rate:  0   0   5% 10% 15% 15% 15%
    /// ```
    Progressive {
        min_quantity: i64,
        step: Percentage,
        max_rate: Percentage,
    },

    /// Same as `Percentage`, but only during the daily time window.
    HappyHour {
        rate: Percentage,
        max_discount_cents: Option<i64>,
    },
}

impl PromotionRule {
    /// Stable type tag, matches the serde representation.
    pub fn kind(&self) -> &'static str {
        match self {
            PromotionRule::Percentage { .. } => "percentage",
            PromotionRule::FixedAmount { .. } => "fixed_amount",
            PromotionRule::BuyXGetY { .. } => "buy_x_get_y",
            PromotionRule::Progressive { .. } => "progressive",
            PromotionRule::HappyHour { .. } => "happy_hour",
        }
    }

    /// Progressive rate for a quantity. Zero below `min_quantity`.
    pub fn progressive_rate(min_quantity: i64, step: Percentage, max_rate: Percentage, qty: i64) -> Percentage {
        if qty < min_quantity {
            return Percentage::zero();
        }
        let steps = (qty - min_quantity + 1) as u64;
        let bps = (step.bps() as u64).saturating_mul(steps).min(max_rate.bps() as u64);
        Percentage::from_bps(bps as u32)
    }

    /// Raw discount for a line, before the subtotal cap.
    fn raw_discount(&self, item: &CartItem) -> Money {
        let subtotal = item.subtotal();
        match *self {
            PromotionRule::Percentage {
                rate,
                max_discount_cents,
            }
            | PromotionRule::HappyHour {
                rate,
                max_discount_cents,
            } => {
                let discount = subtotal.percentage_of(rate);
                match max_discount_cents {
                    Some(max) => discount.min(Money::from_cents(max)),
                    None => discount,
                }
            }
            PromotionRule::FixedAmount { amount_cents } => Money::from_cents(amount_cents),
            PromotionRule::BuyXGetY { buy, get } => {
                let group = buy + get;
                if group <= 0 {
                    return Money::zero();
                }
                let free_units = (item.units() / group) * get;
                item.unit_price().multiply_quantity(free_units)
            }
            PromotionRule::Progressive {
                min_quantity,
                step,
                max_rate,
            } => {
                let rate = Self::progressive_rate(min_quantity, step, max_rate, item.units());
                subtotal.percentage_of(rate)
            }
        }
    }

    fn describe(&self) -> String {
        match *self {
            PromotionRule::Percentage { rate, .. } => format!("{} off", rate),
            PromotionRule::FixedAmount { amount_cents } => {
                format!("{} off", Money::from_cents(amount_cents))
            }
            PromotionRule::BuyXGetY { buy, get } => format!("Buy {} get {} free", buy, get),
            PromotionRule::Progressive { max_rate, .. } => {
                format!("Progressive discount up to {}", max_rate)
            }
            PromotionRule::HappyHour { rate, .. } => format!("Happy hour {} off", rate),
        }
    }

    fn validate(&self) -> CoreResult<()> {
        match *self {
            PromotionRule::Percentage {
                rate,
                max_discount_cents,
            }
            | PromotionRule::HappyHour {
                rate,
                max_discount_cents,
            } => {
                validate_rate("rate", rate)?;
                if max_discount_cents.is_some_and(|m| m < 0) {
                    return Err(ValidationError::OutOfRange {
                        field: "max_discount".to_string(),
                        min: 0,
                        max: i64::MAX,
                    }
                    .into());
                }
            }
            PromotionRule::FixedAmount { amount_cents } => {
                if amount_cents <= 0 {
                    return Err(ValidationError::MustBePositive {
                        field: "amount".to_string(),
                    }
                    .into());
                }
            }
            PromotionRule::BuyXGetY { buy, get } => {
                if buy <= 0 || get <= 0 {
                    return Err(ValidationError::MustBePositive {
                        field: "buy/get quantity".to_string(),
                    }
                    .into());
                }
            }
            PromotionRule::Progressive {
                min_quantity,
                step,
                max_rate,
            } => {
                if min_quantity <= 0 {
                    return Err(ValidationError::MustBePositive {
                        field: "min_quantity".to_string(),
                    }
                    .into());
                }
                validate_rate("step", step)?;
                validate_rate("max_rate", max_rate)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Scope & Window
// =============================================================================

/// Which lines a promotion can apply to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "ids", rename_all = "snake_case")]
pub enum PromotionScope {
    #[default]
    AllProducts,
    Products(Vec<String>),
    Categories(Vec<String>),
}

impl PromotionScope {
    pub fn matches(&self, item: &CartItem) -> bool {
        match self {
            PromotionScope::AllProducts => true,
            PromotionScope::Products(ids) => ids.iter().any(|id| *id == item.product_id),
            PromotionScope::Categories(ids) => item
                .category_id
                .as_ref()
                .is_some_and(|cat| ids.iter().any(|id| id == cat)),
        }
    }
}

/// When a promotion is valid.
///
/// Dates are inclusive on both ends. The time-of-day window is half-open
/// (`[start, end)`) and wraps past midnight when `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidityWindow {
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub start_time: Option<NaiveTime>,
    #[ts(as = "Option<String>")]
    pub end_time: Option<NaiveTime>,
}

impl ValidityWindow {
    /// A window with no restriction.
    pub fn always() -> Self {
        ValidityWindow::default()
    }

    /// Restricts to a daily time-of-day window.
    pub fn daily(start: NaiveTime, end: NaiveTime) -> Self {
        ValidityWindow {
            start_time: Some(start),
            end_time: Some(end),
            ..ValidityWindow::default()
        }
    }

    /// True if either time-of-day bound is set.
    pub fn has_time_of_day(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }

    pub fn contains(&self, now: NaiveDateTime) -> bool {
        let date = now.date();
        if self.start_date.is_some_and(|start| date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| date > end) {
            return false;
        }

        let time = now.time();
        match (self.start_time, self.end_time) {
            (None, None) => true,
            (Some(start), None) => time >= start,
            (None, Some(end)) => time < end,
            (Some(start), Some(end)) if start <= end => time >= start && time < end,
            (Some(start), Some(end)) => time >= start || time < end,
        }
    }
}

// =============================================================================
// Promotion
// =============================================================================

/// A promotion as loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Promotion {
    pub id: String,
    pub name: String,
    pub rule: PromotionRule,
    pub scope: PromotionScope,
    pub window: ValidityWindow,
    pub is_active: bool,
    /// Line must hold at least this many units.
    pub min_quantity: Option<i64>,
    /// Line subtotal must be at least this much.
    pub min_value_cents: Option<i64>,
}

impl Promotion {
    /// Creates an active, always-valid promotion over all products.
    pub fn new(id: impl Into<String>, name: impl Into<String>, rule: PromotionRule) -> Self {
        Promotion {
            id: id.into(),
            name: name.into(),
            rule,
            scope: PromotionScope::AllProducts,
            window: ValidityWindow::always(),
            is_active: true,
            min_quantity: None,
            min_value_cents: None,
        }
    }

    pub fn with_scope(mut self, scope: PromotionScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_window(mut self, window: ValidityWindow) -> Self {
        self.window = window;
        self
    }

    /// Active flag, date window and time window. A happy hour without a
    /// time-of-day window is never active.
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        if !self.is_active {
            return false;
        }
        if matches!(self.rule, PromotionRule::HappyHour { .. }) && !self.window.has_time_of_day() {
            return false;
        }
        self.window.contains(now)
    }

    /// Scope and line conditions.
    pub fn applies_to(&self, item: &CartItem) -> bool {
        if !self.scope.matches(item) {
            return false;
        }
        if self.min_quantity.is_some_and(|min| item.units() < min) {
            return false;
        }
        if self.min_value_cents.is_some_and(|min| item.subtotal_cents < min) {
            return false;
        }
        true
    }

    /// Discount on a line, capped at the line subtotal. Zero when the
    /// promotion does not apply.
    pub fn discount_for(&self, item: &CartItem) -> Money {
        if !self.applies_to(item) {
            return Money::zero();
        }
        self.rule
            .raw_discount(item)
            .floor_zero()
            .min(item.subtotal().floor_zero())
    }

    /// Checks rule parameters before a promotion is stored.
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            }
            .into());
        }
        if let (Some(start), Some(end)) = (self.window.start_date, self.window.end_date) {
            if start > end {
                return Err(ValidationError::InvalidFormat {
                    field: "window".to_string(),
                    reason: "start date is after end date".to_string(),
                }
                .into());
            }
        }
        self.rule.validate()
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// Tie-break when several promotions match the same line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// First promotion in list order with a positive discount.
    #[default]
    FirstMatch,
    /// Largest discount; ties keep the earlier promotion.
    LargestDiscount,
}

/// A promotion chosen for one cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPromotion {
    pub line_id: String,
    pub promotion_id: String,
    pub promotion_name: String,
    pub discount_cents: i64,
    pub description: String,
}

impl AppliedPromotion {
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }
}

/// Evaluates a list of promotions against cart lines.
#[derive(Debug, Clone, Copy)]
pub struct PromotionEvaluator<'a> {
    promotions: &'a [Promotion],
    policy: SelectionPolicy,
}

impl<'a> PromotionEvaluator<'a> {
    pub fn new(promotions: &'a [Promotion], policy: SelectionPolicy) -> Self {
        PromotionEvaluator { promotions, policy }
    }

    /// At most one AppliedPromotion per line, in line order.
    pub fn evaluate(&self, items: &[CartItem], now: NaiveDateTime) -> Vec<AppliedPromotion> {
        let active: Vec<&Promotion> = self
            .promotions
            .iter()
            .filter(|p| p.is_active_at(now))
            .collect();

        items
            .iter()
            .filter_map(|item| self.select(&active, item))
            .collect()
    }

    fn select(&self, active: &[&Promotion], item: &CartItem) -> Option<AppliedPromotion> {
        let mut best: Option<(&Promotion, Money)> = None;

        for promotion in active {
            let discount = promotion.discount_for(item);
            if !discount.is_positive() {
                continue;
            }
            match self.policy {
                SelectionPolicy::FirstMatch => {
                    best = Some((promotion, discount));
                    break;
                }
                SelectionPolicy::LargestDiscount => {
                    if best.map_or(true, |(_, current)| discount > current) {
                        best = Some((promotion, discount));
                    }
                }
            }
        }

        best.map(|(promotion, discount)| AppliedPromotion {
            line_id: item.line_id.clone(),
            promotion_id: promotion.id.clone(),
            promotion_name: promotion.name.clone(),
            discount_cents: discount.cents(),
            description: promotion.rule.describe(),
        })
    }
}

/// Sum of applied promotion discounts.
pub fn total_discount(applied: &[AppliedPromotion]) -> Money {
    applied.iter().map(AppliedPromotion::discount).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::types::Product;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn line(price_cents: i64, qty: i64) -> CartItem {
        let mut cart = Cart::new();
        let product = Product::new("p-1", "SKU-1", "Refrigerante", price_cents).in_category("bebidas");
        let id = cart.add_item(&product).unwrap();
        cart.update_quantity(&id, qty).unwrap();
        cart.line(&id).unwrap().clone()
    }

    fn percentage(bps: u32, max: Option<i64>) -> PromotionRule {
        PromotionRule::Percentage {
            rate: Percentage::from_bps(bps),
            max_discount_cents: max,
        }
    }

    #[test]
    fn test_percentage_respects_cap() {
        let item = line(1000, 10);

        let uncapped = Promotion::new("a", "10%", percentage(1000, None));
        assert_eq!(uncapped.discount_for(&item).cents(), 1000);

        let capped = Promotion::new("b", "10% max R$5", percentage(1000, Some(500)));
        assert_eq!(capped.discount_for(&item).cents(), 500);
    }

    #[test]
    fn test_fixed_amount_capped_at_subtotal() {
        let item = line(300, 1);
        let promo = Promotion::new("f", "R$5 off", PromotionRule::FixedAmount { amount_cents: 500 });
        assert_eq!(promo.discount_for(&item).cents(), 300);
    }

    #[test]
    fn test_buy_two_get_one() {
        let item = line(1000, 7);
        let promo = Promotion::new("b", "Leve 3 pague 2", PromotionRule::BuyXGetY { buy: 2, get: 1 });

        let discount = promo.discount_for(&item);
        assert_eq!(discount.cents(), 2000);
        assert_eq!((item.subtotal() - discount).cents(), 5000);
    }

    #[test]
    fn test_buy_x_get_y_below_group_size() {
        let item = line(1000, 2);
        let promo = Promotion::new("b", "Leve 3 pague 2", PromotionRule::BuyXGetY { buy: 2, get: 1 });
        assert!(promo.discount_for(&item).is_zero());
    }

    #[test]
    fn test_progressive_is_monotonic_and_capped() {
        let step = Percentage::from_bps(500);
        let max = Percentage::from_bps(1500);

        let mut previous = Percentage::zero();
        for qty in 1..50 {
            let rate = PromotionRule::progressive_rate(3, step, max, qty);
            assert!(rate >= previous, "rate decreased at qty {}", qty);
            assert!(rate <= max);
            previous = rate;
        }

        assert_eq!(PromotionRule::progressive_rate(3, step, max, 2), Percentage::zero());
        assert_eq!(PromotionRule::progressive_rate(3, step, max, 3).bps(), 500);
        assert_eq!(PromotionRule::progressive_rate(3, step, max, 4).bps(), 1000);
        assert_eq!(PromotionRule::progressive_rate(3, step, max, 10).bps(), 1500);
    }

    #[test]
    fn test_happy_hour_window_edges() {
        let promo = Promotion::new(
            "h",
            "Happy hour",
            PromotionRule::HappyHour {
                rate: Percentage::from_bps(2000),
                max_discount_cents: None,
            },
        )
        .with_window(ValidityWindow::daily(
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        ));

        assert!(!promo.is_active_at(at(16, 59)));
        assert!(promo.is_active_at(at(17, 0)));
        assert!(promo.is_active_at(at(18, 59)));
        assert!(!promo.is_active_at(at(19, 0)));
    }

    #[test]
    fn test_happy_hour_wraps_midnight() {
        let window = ValidityWindow::daily(
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
        );

        assert!(window.contains(at(23, 30)));
        assert!(window.contains(at(1, 59)));
        assert!(!window.contains(at(2, 0)));
        assert!(!window.contains(at(12, 0)));
    }

    #[test]
    fn test_happy_hour_without_time_window_is_inactive() {
        let promo = Promotion::new(
            "h",
            "Happy hour",
            PromotionRule::HappyHour {
                rate: Percentage::from_bps(2000),
                max_discount_cents: None,
            },
        );
        assert!(!promo.is_active_at(noon()));
    }

    #[test]
    fn test_date_window_is_inclusive() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let promo = Promotion::new("d", "Dia", percentage(1000, None)).with_window(ValidityWindow {
            start_date: Some(day),
            end_date: Some(day),
            ..ValidityWindow::default()
        });

        assert!(promo.is_active_at(day.and_hms_opt(0, 0, 0).unwrap()));
        assert!(promo.is_active_at(day.and_hms_opt(23, 59, 59).unwrap()));
        assert!(!promo.is_active_at(day.succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap()));
    }

    #[test]
    fn test_inactive_flag_excludes_promotion() {
        let mut promo = Promotion::new("a", "10%", percentage(1000, None));
        promo.is_active = false;

        let promotions = vec![promo];
        let applied = PromotionEvaluator::new(&promotions, SelectionPolicy::FirstMatch)
            .evaluate(&[line(1000, 1)], noon());
        assert!(applied.is_empty());
    }

    #[test]
    fn test_scope_and_conditions() {
        let item = line(1000, 2);

        let by_category = Promotion::new("c", "Bebidas", percentage(1000, None))
            .with_scope(PromotionScope::Categories(vec!["bebidas".to_string()]));
        assert!(by_category.applies_to(&item));

        let other_product = Promotion::new("p", "Outro", percentage(1000, None))
            .with_scope(PromotionScope::Products(vec!["p-2".to_string()]));
        assert!(!other_product.applies_to(&item));

        let mut min_qty = Promotion::new("q", "Min 3", percentage(1000, None));
        min_qty.min_quantity = Some(3);
        assert!(!min_qty.applies_to(&item));

        let mut min_value = Promotion::new("v", "Min R$20", percentage(1000, None));
        min_value.min_value_cents = Some(2000);
        assert!(min_value.applies_to(&item));
    }

    #[test]
    fn test_first_match_uses_list_order() {
        let promotions = vec![
            Promotion::new("small", "5%", percentage(500, None)),
            Promotion::new("large", "20%", percentage(2000, None)),
        ];
        let items = [line(1000, 1)];

        let first = PromotionEvaluator::new(&promotions, SelectionPolicy::FirstMatch).evaluate(&items, noon());
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].promotion_id, "small");

        let largest =
            PromotionEvaluator::new(&promotions, SelectionPolicy::LargestDiscount).evaluate(&items, noon());
        assert_eq!(largest[0].promotion_id, "large");
        assert_eq!(largest[0].discount_cents, 200);
    }

    #[test]
    fn test_first_match_skips_zero_discounts() {
        let promotions = vec![
            Promotion::new("bxgy", "Leve 3", PromotionRule::BuyXGetY { buy: 2, get: 1 }),
            Promotion::new("pct", "10%", percentage(1000, None)),
        ];

        let applied = PromotionEvaluator::new(&promotions, SelectionPolicy::FirstMatch)
            .evaluate(&[line(1000, 1)], noon());
        assert_eq!(applied[0].promotion_id, "pct");
    }

    #[test]
    fn test_discount_never_exceeds_line_subtotal() {
        let promotions = vec![
            Promotion::new("a", "R$100", PromotionRule::FixedAmount { amount_cents: 10_000 }),
            Promotion::new("b", "100%", percentage(10_000, None)),
            Promotion::new("c", "Leve 2 pague 1", PromotionRule::BuyXGetY { buy: 1, get: 1 }),
        ];

        for qty in 1..20 {
            let item = line(333, qty);
            for promo in &promotions {
                assert!(promo.discount_for(&item) <= item.subtotal());
            }
        }
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert!(Promotion::new("a", "ok", percentage(1000, None)).validate().is_ok());
        assert!(Promotion::new("a", "big", percentage(10_001, None)).validate().is_err());
        assert!(Promotion::new("a", "zero", PromotionRule::BuyXGetY { buy: 0, get: 1 })
            .validate()
            .is_err());
        assert!(Promotion::new("a", " ", percentage(1000, None)).validate().is_err());
    }
}
