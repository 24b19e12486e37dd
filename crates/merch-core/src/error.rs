//! # Error Types
//!
//! Domain-specific error types for merch-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  merch-core errors (this file)                                          │
//! │  ├── LedgerError      - Business rule and storage outcomes              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  merch-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                       (converted into LedgerError at the trait seam)   │
//! │                                                                         │
//! │  merch-shop errors (in app)                                             │
//! │  └── ApiError         - What callers see (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → LedgerError ← DbError,  LedgerError → ApiError│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Business vs Storage
//! Every variant except `Storage` is a *business outcome*: it is detected
//! before anything is persisted and the scope is rolled back. `Storage` covers
//! I/O and transaction-management failures and is never retried here.

use thiserror::Error;

use crate::coins::Coins;

// =============================================================================
// Ledger Error
// =============================================================================

/// Errors returned by the Ledger Service and the capability traits.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Referenced user does not exist.
    ///
    /// ## When This Occurs
    /// - The authenticated user id has no row (account removed out of band)
    /// - `SendCoin` names a receiver that never logged in
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Catalog item does not exist.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Sender and receiver resolve to the same user.
    #[error("Cannot send coins to yourself")]
    SelfTransfer,

    /// Balance is below the transfer amount or item price.
    ///
    /// ## User Workflow
    /// ```text
    /// BuyItem("pink-hoody")
    ///      │
    ///      ▼
    /// Check balance: available=120, price=500
    ///      │
    ///      ▼
    /// InsufficientBalance { available: 120, required: 500 }
    ///      │
    ///      ▼
    /// Scope rolled back, nothing persisted
    /// ```
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Coins, required: Coins },

    /// Crediting the receiver would overflow the balance column.
    #[error("Balance overflow")]
    BalanceOverflow,

    /// Storage reported a uniqueness violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any lower-level I/O or transaction-management failure.
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl LedgerError {
    /// Stable machine-readable code for the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::UserNotFound(_) => "NOT_FOUND",
            LedgerError::ItemNotFound(_) => "ITEM_NOT_FOUND",
            LedgerError::SelfTransfer => "SELF_TRANSFER",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::BalanceOverflow => "BALANCE_OVERFLOW",
            LedgerError::Conflict(_) => "CONFLICT",
            LedgerError::Storage(_) => "STORAGE_FAILURE",
            LedgerError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// True for rule violations the caller caused, false for storage failures.
    pub fn is_business_error(&self) -> bool {
        !matches!(self, LedgerError::Storage(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised at the service boundary before any scope is opened.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. whitespace in a user name).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LedgerError::InsufficientBalance {
            available: Coins::new(120),
            required: Coins::new(500),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance: available 120, required 500"
        );
        assert_eq!(LedgerError::SelfTransfer.to_string(), "Cannot send coins to yourself");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "item".to_string(),
        };
        assert_eq!(err.to_string(), "item is required");

        let err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        assert_eq!(err.to_string(), "amount must be positive");
    }

    #[test]
    fn test_validation_converts_to_ledger_error() {
        let validation_err = ValidationError::Required {
            field: "username".to_string(),
        };
        let err: LedgerError = validation_err.into();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_business_classification() {
        assert!(LedgerError::SelfTransfer.is_business_error());
        assert!(LedgerError::Conflict("users.name".into()).is_business_error());
        assert!(!LedgerError::Storage("disk I/O error".into()).is_business_error());
        assert_eq!(LedgerError::Storage("x".into()).error_code(), "STORAGE_FAILURE");
    }
}
