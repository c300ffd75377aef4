//! # Cart Store
//!
//! Line items, quantities, per-item discounts and the global discount of
//! the sale in progress.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action          Cart Method               Effect              │
//! │  ───────────────          ───────────               ──────              │
//! │                                                                         │
//! │  Scan product ──────────► add_item() ─────────────► qty += 1 or new    │
//! │                                                                         │
//! │  Weigh product ─────────► add_weighed_item() ─────► new fixed line     │
//! │                                                                         │
//! │  F2 quantity ───────────► update_quantity() ──────► qty = n (0 drops)  │
//! │                                                                         │
//! │  F4 item discount ──────► apply_item_discount() ──► line repriced      │
//! │                                                                         │
//! │  F5 total discount ─────► set_global_discount() ──► totals repriced    │
//! │                                                                         │
//! │  F7 delete item ────────► remove_item()                                │
//! │                                                                         │
//! │  F8 cancel / checkout ──► clear() ────────────────► empty, no customer │
//! │                                                                         │
//! │  Every mutation reprices the touched line and refreshes the totals.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Customer, Discount, Product, Weight};
use crate::validation::{validate_discount, validate_price_cents, validate_quantity, validate_weight};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// How much of a product a line holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LineMeasure {
    /// Counted units; incremented by repeated scans.
    Units(i64),
    /// A fixed weighing; behaves as quantity 1 and cannot be incremented.
    Weighed(Weight),
}

/// A line in the cart.
///
/// ## Design Notes
/// Product data is frozen when the line is created, so the cart keeps
/// showing the scanned price even if the product is edited mid-sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Line identifier (UUID v4). Weighed products can appear on several
    /// lines, so the product id alone does not identify a line.
    pub line_id: String,

    pub product_id: String,
    pub sku: String,
    pub name: String,

    /// Price at the time of adding; per kilogram for weighed lines.
    pub unit_price_cents: i64,

    /// Category snapshot for category-scoped promotions.
    pub category_id: Option<String>,

    pub measure: LineMeasure,

    /// Operator-entered line discount.
    pub discount: Discount,

    /// Base minus line discount, floored at zero. Refreshed on every mutation.
    pub subtotal_cents: i64,
}

impl CartItem {
    fn from_product(product: &Product, measure: LineMeasure) -> Self {
        let mut item = CartItem {
            line_id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            category_id: product.category_id.clone(),
            measure,
            discount: Discount::None,
            subtotal_cents: 0,
        };
        item.reprice();
        item
    }

    /// Unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Units counted for quantity-based rules; weighed lines count as 1.
    pub fn units(&self) -> i64 {
        match self.measure {
            LineMeasure::Units(qty) => qty,
            LineMeasure::Weighed(_) => 1,
        }
    }

    /// Returns the weighing of a weighed line.
    pub fn weight(&self) -> Option<Weight> {
        match self.measure {
            LineMeasure::Units(_) => None,
            LineMeasure::Weighed(weight) => Some(weight),
        }
    }

    /// Returns true for lines created through weight entry.
    pub fn is_weighed(&self) -> bool {
        matches!(self.measure, LineMeasure::Weighed(_))
    }

    /// Undiscounted amount: price × quantity, or price × kilograms.
    pub fn base(&self) -> Money {
        match self.measure {
            LineMeasure::Units(qty) => self.unit_price().multiply_quantity(qty),
            LineMeasure::Weighed(weight) => self.unit_price().multiply_weight(weight),
        }
    }

    /// Value of the line discount against the base.
    pub fn discount_value(&self) -> Money {
        self.discount.value_on(self.base())
    }

    /// Line subtotal computed from scratch.
    pub fn computed_subtotal(&self) -> Money {
        (self.base() - self.discount_value()).floor_zero()
    }

    /// Line subtotal as maintained by the cart.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    fn reprice(&mut self) {
        self.subtotal_cents = self.computed_subtotal().cents();
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Cart-level totals, before promotions and loyalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_units: i64,
    /// Sum of line subtotals.
    pub subtotal_cents: i64,
    /// Global discount applied to the subtotal.
    pub discount_cents: i64,
    /// Subtotal minus global discount, floored at zero.
    pub total_cents: i64,
}

// =============================================================================
// Cart
// =============================================================================

/// The cart of the sale in progress.
///
/// ## Invariants
/// - Unit lines are unique per product (scanning again increments)
/// - Weighed lines are never merged
/// - Quantity is always > 0 (setting 0 removes the line)
/// - `totals()` always equals `recomputed_totals()`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<CartItem>,
    customer: Option<Customer>,
    global_discount: Discount,
    totals: CartTotals,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds one unit of a product.
    ///
    /// ## Behavior
    /// - Product already on a unit line: quantity + 1
    /// - Otherwise: new line with quantity 1
    /// - Product sold by weight: `RequiresWeight`, the caller runs weight
    ///   entry and then calls [`Cart::add_weighed_item`]
    ///
    /// ## Returns
    /// The id of the line that received the unit.
    pub fn add_item(&mut self, product: &Product) -> CoreResult<String> {
        Self::check_sellable(product)?;

        if product.sold_by_weight {
            return Err(CoreError::RequiresWeight(product.name.clone()));
        }

        let existing = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product.id && !i.is_weighed());

        if let Some(item) = existing {
            let new_qty = item.units() + 1;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.measure = LineMeasure::Units(new_qty);
            item.reprice();
            let line_id = item.line_id.clone();
            self.refresh_totals();
            return Ok(line_id);
        }

        self.push_line(CartItem::from_product(product, LineMeasure::Units(1)))
    }

    /// Adds a weighed product as a new fixed-weight line.
    pub fn add_weighed_item(&mut self, product: &Product, weight: Weight) -> CoreResult<String> {
        Self::check_sellable(product)?;
        validate_weight(weight)?;

        if !product.sold_by_weight {
            return Err(ValidationError::InvalidFormat {
                field: "weight".to_string(),
                reason: format!("{} is sold by unit", product.name),
            }
            .into());
        }

        self.push_line(CartItem::from_product(product, LineMeasure::Weighed(weight)))
    }

    /// Sets the quantity of a unit line.
    ///
    /// ## Behavior
    /// - Quantity ≤ 0: removes the line (same as `remove_item`)
    /// - Weighed line: rejected
    /// - Existing line discount is kept and re-applied
    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(line_id).map(|_| ());
        }

        validate_quantity(quantity).map_err(|_| CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        })?;

        let item = self.line_mut(line_id)?;
        if item.is_weighed() {
            return Err(CoreError::WeighedLine(line_id.to_string()));
        }

        item.measure = LineMeasure::Units(quantity);
        item.reprice();
        self.refresh_totals();
        Ok(())
    }

    /// Removes a line and returns it.
    pub fn remove_item(&mut self, line_id: &str) -> CoreResult<CartItem> {
        let index = self
            .items
            .iter()
            .position(|i| i.line_id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;

        let removed = self.items.remove(index);
        self.refresh_totals();
        Ok(removed)
    }

    /// Applies (or replaces) a line discount.
    ///
    /// The line is repriced from its undiscounted base, so applying
    /// `Discount::None` restores price × quantity exactly.
    pub fn apply_item_discount(&mut self, line_id: &str, discount: Discount) -> CoreResult<()> {
        validate_discount(&discount)?;

        let item = self.line_mut(line_id)?;
        item.discount = discount;
        item.reprice();
        self.refresh_totals();
        Ok(())
    }

    /// Sets the discount on the whole sale.
    pub fn set_global_discount(&mut self, discount: Discount) -> CoreResult<()> {
        validate_discount(&discount)?;

        self.global_discount = discount;
        self.refresh_totals();
        Ok(())
    }

    /// Attaches or detaches the customer.
    pub fn set_customer(&mut self, customer: Option<Customer>) {
        self.customer = customer;
    }

    /// Empties the cart and resets customer and global discount.
    pub fn clear(&mut self) {
        self.items.clear();
        self.customer = None;
        self.global_discount = Discount::None;
        self.refresh_totals();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn line(&self, line_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.line_id == line_id)
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn global_discount(&self) -> Discount {
        self.global_discount
    }

    /// Totals maintained across mutations.
    pub fn totals(&self) -> CartTotals {
        self.totals
    }

    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.totals.subtotal_cents)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Totals computed from scratch, ignoring every cached value.
    pub fn recomputed_totals(&self) -> CartTotals {
        let subtotal: Money = self.items.iter().map(CartItem::computed_subtotal).sum();
        Self::totals_for(&self.items, subtotal, self.global_discount)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn check_sellable(product: &Product) -> CoreResult<()> {
        if !product.is_active {
            return Err(CoreError::ProductInactive(product.name.clone()));
        }
        validate_price_cents(product.price_cents)?;
        Ok(())
    }

    fn push_line(&mut self, item: CartItem) -> CoreResult<String> {
        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        let line_id = item.line_id.clone();
        self.items.push(item);
        self.refresh_totals();
        Ok(line_id)
    }

    fn line_mut(&mut self, line_id: &str) -> CoreResult<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|i| i.line_id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))
    }

    fn refresh_totals(&mut self) {
        let subtotal: Money = self.items.iter().map(CartItem::subtotal).sum();
        self.totals = Self::totals_for(&self.items, subtotal, self.global_discount);
    }

    fn totals_for(items: &[CartItem], subtotal: Money, global: Discount) -> CartTotals {
        let discount = global.value_on(subtotal);
        CartTotals {
            item_count: items.len(),
            total_units: items.iter().map(CartItem::units).sum(),
            subtotal_cents: subtotal.cents(),
            discount_cents: discount.cents(),
            total_cents: (subtotal - discount).floor_zero().cents(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Percentage;

    fn product(id: &str, price_cents: i64) -> Product {
        Product::new(id, format!("SKU-{}", id), format!("Product {}", id), price_cents)
    }

    #[test]
    fn test_add_item_creates_then_increments() {
        let mut cart = Cart::new();
        let p = product("1", 999);

        let first = cart.add_item(&p).unwrap();
        let second = cart.add_item(&p).unwrap();

        assert_eq!(first, second);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.totals().total_units, 2);
        assert_eq!(cart.totals().subtotal_cents, 1998);
    }

    #[test]
    fn test_add_weighed_product_requires_weight() {
        let mut cart = Cart::new();
        let banana = product("b", 699).by_weight();

        let err = cart.add_item(&banana).unwrap_err();
        assert!(matches!(err, CoreError::RequiresWeight(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_weighed_lines_are_separate_and_fixed() {
        let mut cart = Cart::new();
        let banana = product("b", 699).by_weight();

        let a = cart.add_weighed_item(&banana, Weight::from_grams(1000)).unwrap();
        let b = cart.add_weighed_item(&banana, Weight::from_grams(500)).unwrap();

        assert_ne!(a, b);
        assert_eq!(cart.items().len(), 2);
        // 6.99 + 3.495 → 350 (half up)
        assert_eq!(cart.totals().subtotal_cents, 699 + 350);
        assert_eq!(cart.totals().total_units, 2);

        let err = cart.update_quantity(&a, 3).unwrap_err();
        assert!(matches!(err, CoreError::WeighedLine(_)));
    }

    #[test]
    fn test_weighing_a_unit_product_is_rejected() {
        let mut cart = Cart::new();
        let err = cart
            .add_weighed_item(&product("1", 100), Weight::from_grams(100))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_inactive_product_rejected() {
        let mut cart = Cart::new();
        let mut p = product("1", 100);
        p.is_active = false;

        assert!(matches!(
            cart.add_item(&p).unwrap_err(),
            CoreError::ProductInactive(_)
        ));
    }

    #[test]
    fn test_update_quantity_zero_equals_remove() {
        let p1 = product("1", 500);
        let p2 = product("2", 300);

        let mut via_update = Cart::new();
        let line = via_update.add_item(&p1).unwrap();
        via_update.add_item(&p2).unwrap();

        let mut via_remove = via_update.clone();

        via_update.update_quantity(&line, 0).unwrap();
        via_remove.remove_item(&line).unwrap();

        assert_eq!(via_update.items(), via_remove.items());
        assert_eq!(via_update.totals(), via_remove.totals());
    }

    #[test]
    fn test_update_quantity_keeps_item_discount() {
        let mut cart = Cart::new();
        let line = cart.add_item(&product("1", 1000)).unwrap();
        cart.apply_item_discount(&line, Discount::Percentage(Percentage::from_bps(1000)))
            .unwrap();

        cart.update_quantity(&line, 4).unwrap();

        // 4 × 10.00 = 40.00, minus 10% = 36.00
        assert_eq!(cart.line(&line).unwrap().subtotal_cents, 3600);
    }

    #[test]
    fn test_quantity_limits() {
        let mut cart = Cart::new();
        let line = cart.add_item(&product("1", 100)).unwrap();

        assert!(matches!(
            cart.update_quantity(&line, MAX_ITEM_QUANTITY + 1).unwrap_err(),
            CoreError::QuantityTooLarge { .. }
        ));
        assert!(matches!(
            cart.update_quantity("missing", 2).unwrap_err(),
            CoreError::LineNotFound(_)
        ));
    }

    #[test]
    fn test_cart_line_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add_item(&product(&i.to_string(), 100)).unwrap();
        }

        let err = cart.add_item(&product("overflow", 100)).unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));

        // Scanning an existing product still works at the limit
        cart.add_item(&product("0", 100)).unwrap();
    }

    #[test]
    fn test_item_discount_round_trip() {
        let mut cart = Cart::new();
        let line = cart.add_item(&product("1", 1234)).unwrap();
        cart.update_quantity(&line, 3).unwrap();

        cart.apply_item_discount(&line, Discount::Amount(Money::from_cents(500)))
            .unwrap();
        assert_eq!(cart.line(&line).unwrap().subtotal_cents, 3702 - 500);

        cart.apply_item_discount(&line, Discount::None).unwrap();
        assert_eq!(cart.line(&line).unwrap().subtotal_cents, 1234 * 3);
    }

    #[test]
    fn test_item_discount_floors_at_zero() {
        let mut cart = Cart::new();
        let line = cart.add_item(&product("1", 300)).unwrap();

        cart.apply_item_discount(&line, Discount::Amount(Money::from_cents(1000)))
            .unwrap();

        assert_eq!(cart.line(&line).unwrap().subtotal_cents, 0);
        assert_eq!(cart.totals().total_cents, 0);
    }

    #[test]
    fn test_invalid_discount_rejected() {
        let mut cart = Cart::new();
        let line = cart.add_item(&product("1", 300)).unwrap();

        let err = cart
            .apply_item_discount(&line, Discount::Percentage(Percentage::from_bps(12_000)))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(cart.line(&line).unwrap().discount.is_none());
    }

    #[test]
    fn test_global_percentage_discount_scenario() {
        let mut cart = Cart::new();
        let line = cart.add_item(&product("1", 1000)).unwrap();
        cart.update_quantity(&line, 3).unwrap();

        assert_eq!(cart.totals().subtotal_cents, 3000);

        cart.set_global_discount(Discount::Percentage(Percentage::from_bps(1000)))
            .unwrap();

        assert_eq!(cart.totals().discount_cents, 300);
        assert_eq!(cart.totals().total_cents, 2700);
    }

    #[test]
    fn test_global_amount_discount_floors_total() {
        let mut cart = Cart::new();
        cart.add_item(&product("1", 1000)).unwrap();

        cart.set_global_discount(Discount::Amount(Money::from_cents(5000)))
            .unwrap();

        assert_eq!(cart.totals().discount_cents, 1000);
        assert_eq!(cart.totals().total_cents, 0);
    }

    #[test]
    fn test_clear_resets_customer_and_discount() {
        let mut cart = Cart::new();
        cart.add_item(&product("1", 999)).unwrap();
        cart.set_customer(Some(Customer::new("c-1", "Ana")));
        cart.set_global_discount(Discount::Amount(Money::from_cents(100)))
            .unwrap();

        cart.clear();

        assert!(cart.is_empty());
        assert!(cart.customer().is_none());
        assert_eq!(cart.global_discount(), Discount::None);
        assert_eq!(cart.totals(), CartTotals::default());
    }

    #[test]
    fn test_totals_never_drift_from_fresh_recompute() {
        let products: Vec<Product> = (0..6).map(|i| product(&i.to_string(), 137 * (i + 1))).collect();
        let mut cart = Cart::new();

        // Deterministic pseudo-random operation sequence
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for step in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;

            let pick = (seed % products.len() as u64) as usize;
            match seed % 5 {
                0 | 1 => {
                    let _ = cart.add_item(&products[pick]);
                }
                2 => {
                    if let Some(line) = cart.items().get(pick % cart.items().len().max(1)) {
                        let id = line.line_id.clone();
                        cart.update_quantity(&id, (seed % 7) as i64 - 1).unwrap();
                    }
                }
                3 => {
                    if let Some(line) = cart.items().first() {
                        let id = line.line_id.clone();
                        cart.remove_item(&id).unwrap();
                    }
                }
                _ => {
                    if let Some(line) = cart.items().last() {
                        let id = line.line_id.clone();
                        let discount = if step % 2 == 0 {
                            Discount::Percentage(Percentage::from_bps((seed % 10_000) as u32))
                        } else {
                            Discount::Amount(Money::from_cents((seed % 900) as i64))
                        };
                        cart.apply_item_discount(&id, discount).unwrap();
                    }
                }
            }

            let expected: i64 = cart.items().iter().map(|i| i.computed_subtotal().cents()).sum();
            assert_eq!(cart.totals().subtotal_cents, expected, "drift at step {}", step);
            assert_eq!(cart.totals(), cart.recomputed_totals());
        }
    }
}
