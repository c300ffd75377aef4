//! # Checkout Error Type
//!
//! Unified error type for session operations, serializable for the UI.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UI action ──► CheckoutSession::xxx()                                  │
//! │                       │                                                 │
//! │         CoreError ────┤  (rule violation: empty cart, redemption cap)  │
//! │         DbError ──────┤  (backend call failed)                         │
//! │                       ▼                                                 │
//! │                CheckoutError { code, message }                         │
//! │                       │                                                 │
//! │                       ├──► returned to the caller                      │
//! │                       └──► pushed as an error notification             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! What the UI receives:
//! ```json
//! { "code": "LOYALTY_ERROR", "message": "At least 100 points must be redeemed (requested 50)" }
//! ```

use serde::Serialize;
use ts_rs::TS;

use caixa_core::CoreError;
use caixa_db::DbError;

/// Error returned by checkout session operations.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, customer or line not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Cart rule violated (limits, weighed lines, inactive product)
    CartError,

    /// Loyalty redemption rejected
    LoyaltyError,

    /// No open cash register shift
    ShiftClosed,

    /// Tenders rejected
    PaymentError,

    /// Storage call failed
    DatabaseError,

    /// Configuration could not be loaded
    ConfigError,

    /// Internal error
    Internal,
}

/// Result alias for session operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

impl CheckoutError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CheckoutError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        CheckoutError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CheckoutError::new(ErrorCode::ValidationError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        CheckoutError::new(ErrorCode::ConfigError, message)
    }
}

impl From<DbError> for CheckoutError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CheckoutError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => CheckoutError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                CheckoutError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConstraintViolation { message } => {
                tracing::error!("Constraint violation: {}", message);
                CheckoutError::new(ErrorCode::ValidationError, "Rejected by storage constraint")
            }
            DbError::InvalidData { entity, reason } => {
                tracing::error!(entity = %entity, "Invalid stored data: {}", reason);
                CheckoutError::new(ErrorCode::DatabaseError, format!("Invalid {} data", entity))
            }
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => {
                CheckoutError::new(ErrorCode::DatabaseError, "Database unavailable")
            }
            DbError::MigrationFailed(_) => {
                CheckoutError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) | DbError::Internal(e) => {
                tracing::error!("Database operation failed: {}", e);
                CheckoutError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for CheckoutError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::LineNotFound(_) => ErrorCode::NotFound,
            CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::RequiresWeight(_)
            | CoreError::WeighedLine(_)
            | CoreError::ProductInactive(_)
            | CoreError::EmptyCart => ErrorCode::CartError,
            CoreError::BelowMinimumRedemption { .. }
            | CoreError::RedemptionExceedsCap { .. }
            | CoreError::NoLoyaltyProgram => ErrorCode::LoyaltyError,
            CoreError::ShiftClosed => ErrorCode::ShiftClosed,
            CoreError::InvalidPayment { .. } | CoreError::FiadoWithoutCustomer => ErrorCode::PaymentError,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        CheckoutError::new(code, err.to_string())
    }
}

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CheckoutError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_codes() {
        assert_eq!(CheckoutError::from(CoreError::EmptyCart).code, ErrorCode::CartError);
        assert_eq!(CheckoutError::from(CoreError::ShiftClosed).code, ErrorCode::ShiftClosed);
        assert_eq!(
            CheckoutError::from(CoreError::NoLoyaltyProgram).code,
            ErrorCode::LoyaltyError
        );
        assert_eq!(
            CheckoutError::from(CoreError::FiadoWithoutCustomer).code,
            ErrorCode::PaymentError
        );
    }

    #[test]
    fn test_db_errors_hide_internals() {
        let err = CheckoutError::from(DbError::QueryFailed("syntax error near SELECT".into()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("SELECT"));

        let err = CheckoutError::from(DbError::not_found("Product", "p-1"));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Product not found: p-1");
    }

    #[test]
    fn test_serializes_screaming_code() {
        let json = serde_json::to_string(&CheckoutError::from(CoreError::EmptyCart)).unwrap();
        assert_eq!(json, r#"{"code":"CART_ERROR","message":"Cart is empty"}"#);
    }
}
