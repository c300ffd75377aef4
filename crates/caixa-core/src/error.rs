//! # Error Types
//!
//! Domain-specific error types for caixa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  caixa-core errors (this file)                                         │
//! │  ├── CoreError        - Cart, promotion, loyalty, checkout rules       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  caixa-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  caixa-checkout errors                                                 │
//! │  └── CheckoutError    - What the UI sees (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → Notification      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the pricing pipeline.
///
/// None of these are fatal: each one is scoped to a single operator action
/// and the UI recovers by correcting the input or retrying.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No cart line with the given id.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Unit quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// The product is sold by weight and must go through weight entry.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan "Banana" (sold by weight)
    ///      │
    ///      ▼
    /// add_item() → RequiresWeight
    ///      │
    ///      ▼
    /// UI opens the scale / weight prompt → add_weighed_item(product, 1.250 kg)
    /// ```
    #[error("Product {0} is sold by weight")]
    RequiresWeight(String),

    /// Weighed lines carry a fixed weight and cannot change quantity.
    #[error("Line {0} is weighed; its quantity cannot be changed")]
    WeighedLine(String),

    /// Product is inactive and cannot be sold.
    #[error("Product {0} is not available for sale")]
    ProductInactive(String),

    /// Loyalty redemption below the program's per-transaction minimum.
    #[error("At least {min} points must be redeemed (requested {requested})")]
    BelowMinimumRedemption { requested: i64, min: i64 },

    /// Loyalty redemption above the available balance or purchase value.
    #[error("Cannot redeem {requested} points; at most {max} allowed")]
    RedemptionExceedsCap { requested: i64, max: i64 },

    /// Loyalty operation without a loaded program or customer balance.
    #[error("Customer has no active loyalty program")]
    NoLoyaltyProgram,

    /// Checkout attempted with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Checkout attempted without an open cash register shift.
    #[error("No open cash register shift")]
    ShiftClosed,

    /// Tenders do not cover the sale, or are otherwise malformed.
    #[error("Invalid payment: {reason}")]
    InvalidPayment { reason: String },

    /// Store credit requires a known customer.
    #[error("Store credit (fiado) requires an identified customer")]
    FiadoWithoutCustomer,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidPayment error.
    pub fn invalid_payment(reason: impl Into<String>) -> Self {
        CoreError::InvalidPayment {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid key name).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
