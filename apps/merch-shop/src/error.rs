//! # API Error Type
//!
//! Unified error type for the command layer.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Merch Shop                         │
//! │                                                                         │
//! │  Command Function  ── Result<T, ApiError>                               │
//! │         │                                                               │
//! │         ├── AuthError::InvalidToken ───────────► UNAUTHORIZED           │
//! │         ├── AuthError::InvalidCredentials ─────► INVALID_CREDENTIALS    │
//! │         ├── LedgerError::InsufficientBalance ──► INSUFFICIENT_BALANCE   │
//! │         ├── LedgerError::Validation ───────────► VALIDATION_ERROR       │
//! │         └── LedgerError::Storage ── logged ────► DATABASE_ERROR         │
//! │                                                  (generic message)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The CLI prints the serialized error on stdout and exits non-zero.

use merch_core::LedgerError;
use serde::Serialize;

use crate::auth::AuthError;
use crate::config::ConfigError;

/// API error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_BALANCE",
///   "message": "Insufficient balance: available 120, required 500"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// User not found (404)
    NotFound,

    /// Catalog item not found (404)
    ItemNotFound,

    /// Sender and receiver are the same user (400)
    SelfTransfer,

    /// Balance too low (400)
    InsufficientBalance,

    /// Uniqueness conflict (409)
    Conflict,

    /// Input validation failed (400)
    ValidationError,

    /// Missing, invalid or expired token (401)
    Unauthorized,

    /// Wrong password for an existing user (401)
    InvalidCredentials,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal error (500)
    Internal,
}

impl ErrorCode {
    /// Process exit status used by the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCode::Unauthorized | ErrorCode::InvalidCredentials => 3,
            ErrorCode::DatabaseError | ErrorCode::Internal => 1,
            _ => 2,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts ledger errors to API errors.
impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UserNotFound(_) => ApiError::new(ErrorCode::NotFound, err.to_string()),
            LedgerError::ItemNotFound(_) => {
                ApiError::new(ErrorCode::ItemNotFound, err.to_string())
            }
            LedgerError::SelfTransfer => ApiError::new(ErrorCode::SelfTransfer, err.to_string()),
            LedgerError::InsufficientBalance { .. } | LedgerError::BalanceOverflow => {
                ApiError::new(ErrorCode::InsufficientBalance, err.to_string())
            }
            LedgerError::Conflict(_) => ApiError::new(ErrorCode::Conflict, err.to_string()),
            LedgerError::Validation(e) => ApiError::validation(e.to_string()),
            LedgerError::Storage(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Storage failure: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts authentication errors to API errors.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(e) => {
                tracing::debug!("Token rejected: {}", e);
                ApiError::unauthorized("Invalid or expired token")
            }
            AuthError::InvalidCredentials => {
                ApiError::new(ErrorCode::InvalidCredentials, err.to_string())
            }
            AuthError::TokenGeneration(e) | AuthError::Hashing(e) => {
                tracing::error!("Authentication internals failed: {}", e);
                ApiError::internal("Authentication failed")
            }
            AuthError::Ledger(e) => e.into(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
