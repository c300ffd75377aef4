//! # Checkout
//!
//! Final totals, checkout preconditions, tender validation and the
//! finalized sale handed to storage.
//!
//! ## Totals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal            Σ line subtotals (after item discounts)           │
//! │  − promotions        Σ AppliedPromotion discounts                      │
//! │  − global            operator discount on the subtotal                 │
//! │  − loyalty           staged points × point value                       │
//! │  ─────────────────                                                      │
//! │  = total             floored at zero                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Finalization
//! ```text
//! ensure_ready ──► validate_tenders ──► build_sale ──► create_sale (storage)
//!                                                          │
//!                       stock, shift totals, loyalty, commission
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::{Cart, CartItem};
use crate::error::{CoreError, CoreResult};
use crate::loyalty::LoyaltyRedeemer;
use crate::money::Money;
use crate::promotion::{total_discount, AppliedPromotion};
use crate::shift::CashShift;
use crate::types::{Customer, PaymentMethod, Percentage, Tender};
use crate::validation::validate_payment_amount;

// =============================================================================
// Totals
// =============================================================================

/// Full price breakdown of the sale in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTotals {
    /// Σ line subtotals, item discounts already taken.
    pub subtotal_cents: i64,
    /// Σ item discounts (informational, already inside the subtotal).
    pub item_discount_cents: i64,
    pub promotion_discount_cents: i64,
    pub global_discount_cents: i64,
    pub loyalty_discount_cents: i64,
    pub total_cents: i64,
}

impl CheckoutTotals {
    /// Computes totals. The loyalty discount is clamped to what is left
    /// after promotions and the global discount.
    pub fn compute(cart: &Cart, applied: &[AppliedPromotion], loyalty: Money) -> Self {
        let cart_totals = cart.totals();
        let subtotal = Money::from_cents(cart_totals.subtotal_cents);
        let promotions = total_discount(applied);
        let global = Money::from_cents(cart_totals.discount_cents);

        let before_loyalty = (subtotal - promotions - global).floor_zero();
        let loyalty = loyalty.floor_zero().min(before_loyalty);

        CheckoutTotals {
            subtotal_cents: subtotal.cents(),
            item_discount_cents: cart.items().iter().map(CartItem::discount_value).sum::<Money>().cents(),
            promotion_discount_cents: promotions.cents(),
            global_discount_cents: global.cents(),
            loyalty_discount_cents: loyalty.cents(),
            total_cents: (before_loyalty - loyalty).cents(),
        }
    }

    /// Purchase value a loyalty redemption may cover.
    pub fn before_loyalty(&self) -> Money {
        Money::from_cents(self.subtotal_cents - self.promotion_discount_cents - self.global_discount_cents)
            .floor_zero()
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Every discount on the sale, item discounts included.
    pub fn total_discount(&self) -> Money {
        Money::from_cents(
            self.item_discount_cents
                + self.promotion_discount_cents
                + self.global_discount_cents
                + self.loyalty_discount_cents,
        )
    }
}

// =============================================================================
// Preconditions & Tenders
// =============================================================================

/// Checks that the sale can be submitted.
///
/// ## Rules
/// - Cart has at least one line
/// - An open shift exists
/// - A staged redemption still fits under the current purchase value
///   (the cart may have shrunk since it was staged)
pub fn ensure_ready(
    cart: &Cart,
    shift: Option<&CashShift>,
    totals: &CheckoutTotals,
    loyalty: &LoyaltyRedeemer,
) -> CoreResult<()> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    if !shift.is_some_and(CashShift::is_open) {
        return Err(CoreError::ShiftClosed);
    }

    let cap = loyalty.max_redeemable(totals.before_loyalty());
    if loyalty.redeemed_points() > cap {
        return Err(CoreError::RedemptionExceedsCap {
            requested: loyalty.redeemed_points(),
            max: cap,
        });
    }

    Ok(())
}

/// Amount paid and change owed for a set of tenders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TenderSummary {
    pub paid_cents: i64,
    pub change_cents: i64,
}

/// Validates the payments entered at the tender screen.
///
/// ## Rules
/// - At least one tender, unless the total is zero
/// - Every amount positive
/// - Σ amounts ≥ total
/// - Change only from cash: non-cash tenders must not exceed the total
/// - Fiado needs an identified customer, within their credit limit
pub fn validate_tenders(
    tenders: &[Tender],
    total: Money,
    customer: Option<&Customer>,
) -> CoreResult<TenderSummary> {
    if tenders.is_empty() {
        if total.is_zero() {
            return Ok(TenderSummary {
                paid_cents: 0,
                change_cents: 0,
            });
        }
        return Err(CoreError::invalid_payment("no payment entered"));
    }

    for tender in tenders {
        validate_payment_amount(tender.amount())?;
    }

    let sum_of = |method: Option<PaymentMethod>| -> Money {
        tenders
            .iter()
            .filter(|t| method.map_or(true, |m| t.method == m))
            .map(Tender::amount)
            .sum()
    };

    let fiado = sum_of(Some(PaymentMethod::Fiado));
    if fiado.is_positive() {
        let customer = customer.ok_or(CoreError::FiadoWithoutCustomer)?;
        if let Some(limit) = customer.credit_limit_cents {
            if fiado.cents() > limit {
                return Err(CoreError::invalid_payment(format!(
                    "store credit of {} exceeds the customer's limit of {}",
                    fiado,
                    Money::from_cents(limit)
                )));
            }
        }
    }

    let paid = sum_of(None);
    if paid < total {
        return Err(CoreError::invalid_payment(format!(
            "{} missing",
            total - paid
        )));
    }

    let non_cash = paid - sum_of(Some(PaymentMethod::Cash));
    if non_cash > total {
        return Err(CoreError::invalid_payment(
            "change can only be given for cash payments",
        ));
    }

    Ok(TenderSummary {
        paid_cents: paid.cents(),
        change_cents: (paid - total).cents(),
    })
}

// =============================================================================
// Finalized Sale
// =============================================================================

/// A line of a finalized sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price_cents: i64,
    /// Units; 1 for weighed lines.
    pub quantity: i64,
    pub weight_grams: Option<i64>,
    pub item_discount_cents: i64,
    pub promotion_id: Option<String>,
    pub promotion_discount_cents: i64,
    /// Line subtotal minus promotion.
    pub line_total_cents: i64,
}

/// The record submitted to storage when a sale is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedSale {
    pub id: String,
    pub receipt_number: String,
    pub shift_id: String,
    pub operator_id: String,
    pub seller_id: Option<String>,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub lines: Vec<SaleLine>,
    pub tenders: Vec<Tender>,
    pub totals: CheckoutTotals,
    pub paid_cents: i64,
    pub change_cents: i64,
    pub points_redeemed: i64,
    pub points_earned: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Who, where and when a sale is made.
#[derive(Debug, Clone)]
pub struct SaleContext {
    pub shift_id: String,
    pub operator_id: String,
    pub seller_id: Option<String>,
    pub device_id: String,
    pub now: DateTime<Utc>,
}

/// Receipt number: `YYYYMMDD-DEVICE-XXXXXXXX`, the suffix taken from the
/// sale id.
pub fn receipt_number(now: DateTime<Utc>, device_id: &str, sale_id: &str) -> String {
    let suffix: String = sale_id
        .chars()
        .filter(char::is_ascii_hexdigit)
        .take(8)
        .collect::<String>()
        .to_uppercase();
    format!("{}-{}-{}", now.format("%Y%m%d"), device_id, suffix)
}

/// Assembles the finalized sale from the priced cart.
///
/// Validates tenders against the computed total. Points earned come from
/// the customer's program on the amount actually charged.
pub fn build_sale(
    cart: &Cart,
    applied: &[AppliedPromotion],
    loyalty: &LoyaltyRedeemer,
    tenders: Vec<Tender>,
    ctx: SaleContext,
) -> CoreResult<FinalizedSale> {
    let totals = CheckoutTotals::compute(cart, applied, loyalty.discount());
    let summary = validate_tenders(&tenders, totals.total(), cart.customer())?;

    let lines = cart
        .items()
        .iter()
        .map(|item| {
            let promotion = applied.iter().find(|a| a.line_id == item.line_id);
            let promotion_discount = promotion.map_or(0, |a| a.discount_cents);
            SaleLine {
                product_id: item.product_id.clone(),
                sku: item.sku.clone(),
                name: item.name.clone(),
                unit_price_cents: item.unit_price_cents,
                quantity: item.units(),
                weight_grams: item.weight().map(|w| w.grams()),
                item_discount_cents: item.discount_value().cents(),
                promotion_id: promotion.map(|a| a.promotion_id.clone()),
                promotion_discount_cents: promotion_discount,
                line_total_cents: (item.subtotal_cents - promotion_discount).max(0),
            }
        })
        .collect();

    let points_earned = loyalty
        .customer_points()
        .map_or(0, |p| p.program.points_earned(totals.total()));

    let id = Uuid::new_v4().to_string();
    Ok(FinalizedSale {
        receipt_number: receipt_number(ctx.now, &ctx.device_id, &id),
        id,
        shift_id: ctx.shift_id,
        operator_id: ctx.operator_id,
        seller_id: ctx.seller_id,
        customer_id: cart.customer().map(|c| c.id.clone()),
        customer_name: cart
            .customer()
            .map_or(crate::UNIDENTIFIED_CUSTOMER, Customer::display_name)
            .to_string(),
        lines,
        tenders,
        totals,
        paid_cents: summary.paid_cents,
        change_cents: summary.change_cents,
        points_redeemed: loyalty.redeemed_points(),
        points_earned,
        created_at: ctx.now,
    })
}

// =============================================================================
// Follow-up Records
// =============================================================================

/// Stock to take out per product: units, or grams for weighed lines.
/// Lines of the same product are merged.
pub fn stock_movements(sale: &FinalizedSale) -> Vec<(String, i64)> {
    let mut movements: Vec<(String, i64)> = Vec::new();
    for line in &sale.lines {
        let amount = line.weight_grams.unwrap_or(line.quantity);
        match movements.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, total)) => *total += amount,
            None => movements.push((line.product_id.clone(), amount)),
        }
    }
    movements
}

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyEntryKind {
    Earned,
    Redeemed,
}

/// A movement on a customer's points balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyLedgerEntry {
    pub id: String,
    pub customer_id: String,
    pub sale_id: String,
    pub kind: LoyaltyEntryKind,
    /// Always positive; `kind` gives the direction.
    pub points: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Redeemed and earned entries for an identified customer's sale.
pub fn loyalty_entries(sale: &FinalizedSale) -> Vec<LoyaltyLedgerEntry> {
    let Some(customer_id) = &sale.customer_id else {
        return Vec::new();
    };

    [
        (LoyaltyEntryKind::Redeemed, sale.points_redeemed),
        (LoyaltyEntryKind::Earned, sale.points_earned),
    ]
    .into_iter()
    .filter(|(_, points)| *points > 0)
    .map(|(kind, points)| LoyaltyLedgerEntry {
        id: Uuid::new_v4().to_string(),
        customer_id: customer_id.clone(),
        sale_id: sale.id.clone(),
        kind,
        points,
        created_at: sale.created_at,
    })
    .collect()
}

/// Seller commission on a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRecord {
    pub id: String,
    pub sale_id: String,
    pub seller_id: String,
    pub base_cents: i64,
    pub rate: Percentage,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Commission on the sale total, when there is a seller and a rate.
pub fn commission_for(sale: &FinalizedSale, rate: Percentage) -> Option<CommissionRecord> {
    let seller_id = sale.seller_id.clone()?;
    if rate.is_zero() {
        return None;
    }

    let base = sale.totals.total();
    Some(CommissionRecord {
        id: Uuid::new_v4().to_string(),
        sale_id: sale.id.clone(),
        seller_id,
        base_cents: base.cents(),
        rate,
        amount_cents: base.percentage_of(rate).cents(),
        created_at: sale.created_at,
    })
}

// =============================================================================
// Receipt
// =============================================================================

/// Text lines of a sale receipt, ready for the UI to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Store name and address lines printed above the items.
    pub header: Vec<String>,
    pub receipt_number: String,
    pub customer_name: String,
    pub lines: Vec<String>,
    pub summary: Vec<(String, String)>,
}

impl Receipt {
    pub fn from_sale(sale: &FinalizedSale) -> Self {
        let lines = sale
            .lines
            .iter()
            .map(|l| {
                let measure = match l.weight_grams {
                    Some(grams) => format!("{:.3} kg", grams as f64 / 1000.0),
                    None => format!("{} x {}", l.quantity, Money::from_cents(l.unit_price_cents)),
                };
                format!("{} {} {}", l.name, measure, Money::from_cents(l.line_total_cents))
            })
            .collect();

        let t = &sale.totals;
        let mut summary = vec![("Subtotal".to_string(), Money::from_cents(t.subtotal_cents).to_string())];
        for (label, cents) in [
            ("Promotions", t.promotion_discount_cents),
            ("Discount", t.global_discount_cents),
            ("Loyalty", t.loyalty_discount_cents),
        ] {
            if cents > 0 {
                summary.push((label.to_string(), Money::from_cents(-cents).to_string()));
            }
        }
        summary.push(("Total".to_string(), t.total().to_string()));
        for tender in &sale.tenders {
            summary.push((tender.method.as_str().to_string(), tender.amount().to_string()));
        }
        if sale.change_cents > 0 {
            summary.push(("Change".to_string(), Money::from_cents(sale.change_cents).to_string()));
        }

        Receipt {
            header: Vec::new(),
            receipt_number: sale.receipt_number.clone(),
            customer_name: sale.customer_name.clone(),
            lines,
            summary,
        }
    }

    /// Sets the header lines; blank lines are dropped.
    pub fn with_header<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header = lines
            .into_iter()
            .map(Into::into)
            .filter(|line: &String| !line.trim().is_empty())
            .collect();
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loyalty::{CustomerPoints, LoyaltyProgram};
    use crate::promotion::{Promotion, PromotionEvaluator, PromotionRule, SelectionPolicy};
    use crate::shift::{ShiftStatus, ShiftTotals};
    use crate::types::{Discount, Product, Weight};
    use chrono::TimeZone;

    fn open_shift() -> CashShift {
        CashShift {
            id: "s-1".to_string(),
            operator_id: "op-1".to_string(),
            register_name: "Caixa 01".to_string(),
            status: ShiftStatus::Open,
            opening_balance_cents: 0,
            totals: ShiftTotals::default(),
            opened_at: Utc::now(),
            closed_at: None,
            counted_cash_cents: None,
        }
    }

    fn ctx() -> SaleContext {
        SaleContext {
            shift_id: "s-1".to_string(),
            operator_id: "op-1".to_string(),
            seller_id: Some("seller-1".to_string()),
            device_id: "CX01".to_string(),
            now: Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
        }
    }

    fn redeemer(available: i64) -> LoyaltyRedeemer {
        let mut r = LoyaltyRedeemer::new();
        r.load(Some(CustomerPoints {
            customer_id: "c-1".to_string(),
            available_points: available,
            program: LoyaltyProgram {
                id: "prog".to_string(),
                name: "Clube".to_string(),
                point_value_cents: 10,
                min_points_redeem: 10,
                earn_points_per_unit: 1.0,
                is_active: true,
            },
        }));
        r
    }

    fn cart_with(price: i64, qty: i64) -> Cart {
        let mut cart = Cart::new();
        let id = cart.add_item(&Product::new("p-1", "SKU-1", "Café", price)).unwrap();
        cart.update_quantity(&id, qty).unwrap();
        cart
    }

    #[test]
    fn test_totals_formula() {
        let mut cart = cart_with(1000, 7);
        cart.set_global_discount(Discount::Amount(Money::from_cents(500))).unwrap();

        let promotions = vec![Promotion::new("b", "Leve 3", PromotionRule::BuyXGetY { buy: 2, get: 1 })];
        let applied = PromotionEvaluator::new(&promotions, SelectionPolicy::FirstMatch)
            .evaluate(cart.items(), ctx().now.naive_utc());

        let totals = CheckoutTotals::compute(&cart, &applied, Money::from_cents(300));
        assert_eq!(totals.subtotal_cents, 7000);
        assert_eq!(totals.promotion_discount_cents, 2000);
        assert_eq!(totals.global_discount_cents, 500);
        assert_eq!(totals.loyalty_discount_cents, 300);
        assert_eq!(totals.total_cents, 4200);
        assert_eq!(totals.before_loyalty().cents(), 4500);
    }

    #[test]
    fn test_total_never_negative() {
        let mut cart = cart_with(1000, 1);
        cart.set_global_discount(Discount::Amount(Money::from_cents(900))).unwrap();

        let totals = CheckoutTotals::compute(&cart, &[], Money::from_cents(5000));
        assert_eq!(totals.loyalty_discount_cents, 100);
        assert_eq!(totals.total_cents, 0);
    }

    #[test]
    fn test_ensure_ready_preconditions() {
        let empty = Cart::new();
        let totals = CheckoutTotals::default();
        let loyalty = LoyaltyRedeemer::new();
        let shift = open_shift();

        assert!(matches!(
            ensure_ready(&empty, Some(&shift), &totals, &loyalty).unwrap_err(),
            CoreError::EmptyCart
        ));

        let cart = cart_with(1000, 1);
        let totals = CheckoutTotals::compute(&cart, &[], Money::zero());
        assert!(matches!(
            ensure_ready(&cart, None, &totals, &loyalty).unwrap_err(),
            CoreError::ShiftClosed
        ));

        let mut closed = open_shift();
        closed.status = ShiftStatus::Closed;
        assert!(ensure_ready(&cart, Some(&closed), &totals, &loyalty).is_err());

        assert!(ensure_ready(&cart, Some(&shift), &totals, &loyalty).is_ok());
    }

    #[test]
    fn test_ensure_ready_rejects_stale_redemption() {
        let mut cart = cart_with(1000, 5);
        let mut loyalty = redeemer(1000);
        loyalty.redeem(400, Money::from_cents(5000)).unwrap();

        let line_id = cart.items()[0].line_id.clone();
        cart.update_quantity(&line_id, 1).unwrap();
        let totals = CheckoutTotals::compute(&cart, &[], loyalty.discount());

        let err = ensure_ready(&cart, Some(&open_shift()), &totals, &loyalty).unwrap_err();
        assert!(matches!(err, CoreError::RedemptionExceedsCap { max: 100, .. }));
    }

    #[test]
    fn test_tenders_split_with_cash_change() {
        let tenders = vec![
            Tender::new(PaymentMethod::Pix, 2000),
            Tender::new(PaymentMethod::Cash, 1000),
        ];
        let summary = validate_tenders(&tenders, Money::from_cents(2700), None).unwrap();
        assert_eq!(summary.paid_cents, 3000);
        assert_eq!(summary.change_cents, 300);
    }

    #[test]
    fn test_tenders_rejections() {
        let total = Money::from_cents(2700);

        assert!(validate_tenders(&[], total, None).is_err());
        assert!(validate_tenders(&[], Money::zero(), None).is_ok());
        assert!(validate_tenders(&[Tender::new(PaymentMethod::Cash, 2000)], total, None).is_err());
        assert!(validate_tenders(&[Tender::new(PaymentMethod::Cash, 0)], total, None).is_err());

        let over_card = [Tender::new(PaymentMethod::CreditCard, 3000)];
        assert!(matches!(
            validate_tenders(&over_card, total, None).unwrap_err(),
            CoreError::InvalidPayment { .. }
        ));

        let fiado = [Tender::new(PaymentMethod::Fiado, 2700)];
        assert!(matches!(
            validate_tenders(&fiado, total, None).unwrap_err(),
            CoreError::FiadoWithoutCustomer
        ));

        let mut customer = Customer::new("c-1", "Ana");
        assert!(validate_tenders(&fiado, total, Some(&customer)).is_ok());
        customer.credit_limit_cents = Some(1000);
        assert!(validate_tenders(&fiado, total, Some(&customer)).is_err());
    }

    #[test]
    fn test_build_sale() {
        let mut cart = cart_with(1000, 3);
        let banana = Product::new("p-2", "BAN", "Banana", 600).by_weight();
        cart.add_weighed_item(&banana, Weight::from_grams(1500)).unwrap();
        cart.add_weighed_item(&banana, Weight::from_grams(500)).unwrap();
        cart.set_customer(Some(Customer::new("c-1", "")));

        let loyalty = redeemer(0);
        let sale = build_sale(
            &cart,
            &[],
            &loyalty,
            vec![Tender::new(PaymentMethod::Cash, 5000)],
            ctx(),
        )
        .unwrap();

        assert_eq!(sale.totals.total_cents, 3000 + 900 + 300);
        assert_eq!(sale.change_cents, 800);
        assert_eq!(sale.customer_name, crate::UNIDENTIFIED_CUSTOMER);
        assert_eq!(sale.points_earned, 42);
        assert_eq!(sale.lines.len(), 3);
        assert!(sale.receipt_number.starts_with("20240615-CX01-"));

        let stock = stock_movements(&sale);
        assert_eq!(stock, vec![("p-1".to_string(), 3), ("p-2".to_string(), 2000)]);

        let entries = loyalty_entries(&sale);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, LoyaltyEntryKind::Earned);

        let commission = commission_for(&sale, Percentage::from_bps(250)).unwrap();
        assert_eq!(commission.base_cents, 4200);
        assert_eq!(commission.amount_cents, 105);
        assert!(commission_for(&sale, Percentage::zero()).is_none());

        let receipt = Receipt::from_sale(&sale);
        assert!(receipt.header.is_empty());
        assert_eq!(receipt.lines.len(), 3);
        assert_eq!(receipt.summary.last().unwrap().0, "Change");

        let receipt = receipt.with_header(["Mercadinho Boa Vista", "", "Rua das Flores, 10"]);
        assert_eq!(receipt.header, vec!["Mercadinho Boa Vista", "Rua das Flores, 10"]);
    }

    #[test]
    fn test_build_sale_without_customer() {
        let cart = cart_with(1000, 1);
        let sale = build_sale(
            &cart,
            &[],
            &LoyaltyRedeemer::new(),
            vec![Tender::new(PaymentMethod::DebitCard, 1000)],
            ctx(),
        )
        .unwrap();

        assert!(sale.customer_id.is_none());
        assert_eq!(sale.customer_name, crate::UNIDENTIFIED_CUSTOMER);
        assert!(loyalty_entries(&sale).is_empty());
    }
}
