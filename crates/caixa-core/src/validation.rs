//! # Validation Module
//!
//! Input validation for operator-entered values.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web UI                                                       │
//! │  └── Disables actions that cannot succeed (empty cart, no points)      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (called by cart/loyalty/checkout)                │
//! │  └── Quantity, weight, discount and tender bounds                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database constraints                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Discount, Percentage, Weight};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Heaviest single weighing accepted (50 kg), catches scale misreads.
pub const MAX_WEIGHT_GRAMS: i64 = 50_000;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a unit quantity.
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

/// Validates a weight read from the scale or typed by the operator.
///
/// ```rust
/// use caixa_core::types::Weight;
/// use caixa_core::validation::validate_weight;
///
/// assert!(validate_weight(Weight::from_grams(1250)).is_ok());
/// assert!(validate_weight(Weight::from_grams(0)).is_err());
/// ```
pub fn validate_weight(weight: Weight) -> ValidationResult<()> {
    if weight.grams() <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "weight".to_string(),
        });
    }

    if weight.grams() > MAX_WEIGHT_GRAMS {
        return Err(ValidationError::OutOfRange {
            field: "weight".to_string(),
            min: 1,
            max: MAX_WEIGHT_GRAMS,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a rate in basis points (0% to 100%).
pub fn validate_rate(field: &str, rate: Percentage) -> ValidationResult<()> {
    if rate > Percentage::FULL {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: Percentage::FULL.bps() as i64,
        });
    }

    Ok(())
}

/// Validates an operator-entered discount.
///
/// ## Rules
/// - Percentage: 0% to 100%
/// - Amount: non-negative (amounts larger than the base are floored later)
pub fn validate_discount(discount: &Discount) -> ValidationResult<()> {
    match discount {
        Discount::None => Ok(()),
        Discount::Percentage(rate) => validate_rate("discount", *rate),
        Discount::Amount(amount) => {
            if amount.is_negative() {
                Err(ValidationError::OutOfRange {
                    field: "discount".to_string(),
                    min: 0,
                    max: i64::MAX,
                })
            } else {
                Ok(())
            }
        }
    }
}

/// Validates a tender amount.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a search term typed in the product/customer search box.
///
/// ## Returns
/// The trimmed term.
pub fn validate_search_term(term: &str) -> ValidationResult<String> {
    let term = term.trim();

    if term.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(term.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
