//! # caixa-core: Pure Business Logic for Caixa POS
//!
//! This crate holds the pricing pipeline of the checkout screen as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Caixa POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web UI (checkout screen)                     │   │
//! │  │    Search ──► Cart ──► Discounts ──► Payment ──► Receipt       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                caixa-checkout (session layer)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ caixa-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌────────┐ ┌───────────┐ ┌─────────┐ ┌──────────┐ ┌───────┐ │   │
//! │  │   │  cart  │ │ promotion │ │ loyalty │ │ checkout │ │ shift │ │   │
//! │  │   └────────┘ └───────────┘ └─────────┘ └──────────┘ └───────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    caixa-db (SQLite)                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (Product, Customer, Percentage, Weight, ...)
//! - [`cart`] - Cart store: lines, item discounts, global discount
//! - [`promotion`] - Promotion rules and the per-line evaluator
//! - [`loyalty`] - Point redemption and earning
//! - [`checkout`] - Totals aggregation, tender validation, sale assembly
//! - [`shift`] - Cash register shift totals and reconciliation
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use caixa_core::cart::Cart;
//! use caixa_core::types::{Discount, Percentage};
//! # use caixa_core::types::Product;
//! # let coffee = Product::new("p-1", "CAFE-500", "Café 500g", 1000);
//!
//! let mut cart = Cart::new();
//! let line_id = cart.add_item(&coffee).unwrap();
//! cart.update_quantity(&line_id, 3).unwrap();
//! cart.set_global_discount(Discount::Percentage(Percentage::from_bps(1000))).unwrap();
//!
//! assert_eq!(cart.totals().subtotal_cents, 3000);
//! assert_eq!(cart.totals().discount_cents, 300);
//! assert_eq!(cart.totals().total_cents, 2700);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod loyalty;
pub mod money;
pub mod promotion;
pub mod shift;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps a sale printable on one receipt roll.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single unit line.
///
/// ## Business Reason
/// Catches typos at the quantity prompt (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Display name used when a sale has no identified customer.
pub const UNIDENTIFIED_CUSTOMER: &str = "Cliente não identificado";
