//! # Domain Types
//!
//! Core domain types shared by the cart, the promotion evaluator and the
//! checkout.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │     Tender      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, sku        │   │  id, name       │   │  method         │       │
//! │  │  price_cents    │   │  document       │   │  amount_cents   │       │
//! │  │  sold_by_weight │   │  credit limit   │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Percentage    │   │     Weight      │   │    Discount     │       │
//! │  │  bps (u32)      │   │  grams (i64)    │   │  None           │       │
//! │  │  1000 = 10%     │   │  1500 = 1.5 kg  │   │  Percentage(%)  │       │
//! │  └─────────────────┘   └─────────────────┘   │  Amount(R$)     │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Percentage
// =============================================================================

/// A rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10% and 10000 bps = 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// 100%.
    pub const FULL: Percentage = Percentage(10_000);

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Creates a rate from a percentage (for convenience, e.g. config input).
    pub fn from_percentage(pct: f64) -> Self {
        Percentage((pct * 100.0).round().max(0.0) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns the smaller of two rates.
    #[inline]
    pub fn min(self, other: Percentage) -> Percentage {
        Percentage(self.0.min(other.0))
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::zero()
    }
}

impl std::fmt::Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
        }
    }
}

// =============================================================================
// Weight
// =============================================================================

/// A weight in grams, for products sold by the kilogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Weight(i64);

impl Weight {
    /// Creates a weight from grams.
    #[inline]
    pub const fn from_grams(grams: i64) -> Self {
        Weight(grams)
    }

    /// Creates a weight from kilograms as read from a scale (e.g. 1.235).
    pub fn from_kilograms(kg: f64) -> Self {
        Weight((kg * 1000.0).round() as i64)
    }

    /// Returns the weight in grams.
    #[inline]
    pub const fn grams(&self) -> i64 {
        self.0
    }

    /// Returns the weight in kilograms (display only).
    #[inline]
    pub fn kilograms(&self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A discount entered by the operator, either on a line or on the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// No discount.
    #[default]
    None,
    /// Percentage of the amount it applies to.
    Percentage(Percentage),
    /// Absolute amount off.
    Amount(Money),
}

impl Discount {
    /// Computes the discount value against `base`, never more than `base`.
    ///
    /// ```rust
    /// use caixa_core::money::Money;
    /// use caixa_core::types::{Discount, Percentage};
    ///
    /// let base = Money::from_cents(1000);
    /// assert_eq!(Discount::Percentage(Percentage::from_bps(2500)).value_on(base).cents(), 250);
    /// assert_eq!(Discount::Amount(Money::from_cents(1500)).value_on(base).cents(), 1000);
    /// ```
    pub fn value_on(&self, base: Money) -> Money {
        let base = base.floor_zero();
        let value = match self {
            Discount::None => Money::zero(),
            Discount::Percentage(rate) => base.percentage_of(*rate),
            Discount::Amount(amount) => amount.floor_zero(),
        };
        value.min(base)
    }

    /// Returns true if this is `Discount::None` or a zero value.
    pub fn is_none(&self) -> bool {
        match self {
            Discount::None => true,
            Discount::Percentage(rate) => rate.is_zero(),
            Discount::Amount(amount) => amount.is_zero(),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product as seen by the checkout (read-only snapshot from storage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Barcode (EAN-13, etc.).
    pub barcode: Option<String>,

    /// Display name shown to the operator and on the receipt.
    pub name: String,

    /// Unit price in cents; price per kilogram when `sold_by_weight`.
    pub price_cents: i64,

    /// Cost in cents (for margin reports).
    pub cost_cents: Option<i64>,

    /// Category, used by category-scoped promotions.
    pub category_id: Option<String>,

    /// Whether this product is priced by the kilogram.
    pub sold_by_weight: bool,

    /// Whether to track inventory for this product.
    pub track_inventory: bool,

    /// Stock level: units, or grams for weighed products.
    pub stock: Option<i64>,

    /// Whether product is active (soft delete).
    pub is_active: bool,
}

impl Product {
    /// Creates an active unit-priced product with no inventory tracking.
    pub fn new(
        id: impl Into<String>,
        sku: impl Into<String>,
        name: impl Into<String>,
        price_cents: i64,
    ) -> Self {
        Product {
            id: id.into(),
            sku: sku.into(),
            barcode: None,
            name: name.into(),
            price_cents,
            cost_cents: None,
            category_id: None,
            sold_by_weight: false,
            track_inventory: false,
            stock: None,
            is_active: true,
        }
    }

    /// Marks the product as priced per kilogram.
    pub fn by_weight(mut self) -> Self {
        self.sold_by_weight = true;
        self
    }

    /// Sets the product category.
    pub fn in_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer that may be attached to a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// CPF/CNPJ.
    pub document: Option<String>,
    pub phone: Option<String>,
    /// Maximum open store credit (fiado) in cents; `None` means unlimited.
    pub credit_limit_cents: Option<i64>,
    pub is_active: bool,
}

impl Customer {
    /// Creates an active customer with only an id and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Customer {
            id: id.into(),
            name: name.into(),
            document: None,
            phone: None,
            credit_limit_cents: None,
            is_active: true,
        }
    }

    /// Returns the name to print, defaulting blank names.
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            crate::UNIDENTIFIED_CUSTOMER
        } else {
            name
        }
    }
}

// =============================================================================
// Payment Method / Tender
// =============================================================================

/// How (part of) a sale was paid.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash; the only method that can produce change.
    Cash,
    CreditCard,
    DebitCard,
    /// Instant bank transfer.
    Pix,
    /// Store credit, settled later by the customer.
    Fiado,
}

impl PaymentMethod {
    /// Stable lowercase name, matches the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Fiado => "fiado",
        }
    }
}

/// One payment entered at the tender screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tender {
    pub method: PaymentMethod,
    /// Amount handed over in cents (for cash, may exceed what is owed).
    pub amount_cents: i64,
}

impl Tender {
    /// Creates a tender.
    pub fn new(method: PaymentMethod, amount_cents: i64) -> Self {
        Tender {
            method,
            amount_cents,
        }
    }

    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
