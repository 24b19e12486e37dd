//! # Validation Module
//!
//! Input checks run at the service boundary, before any scope is opened.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command handlers (merch-shop)                                │
//! │  ├── Token verification                                                │
//! │  └── Request deserialization                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services                                                     │
//! │  └── THIS MODULE: amount, item name, credentials                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (balance >= 0), CHECK (amount > 0)                          │
//! │  └── UNIQUE (name), UNIQUE (user_id, item_id)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::coins::Coins;
use crate::error::ValidationError;
use crate::{MAX_ITEM_NAME_LEN, MAX_PASSWORD_LEN, MAX_USERNAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Credentials
// =============================================================================

/// Validates a login name.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - No whitespace anywhere
///
/// ## Example
/// ```rust
/// use merch_core::validation::validate_username;
///
/// assert!(validate_username("alice").is_ok());
/// assert!(validate_username("").is_err());
/// assert!(validate_username("al ice").is_err());
/// ```
pub fn validate_username(name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if name.chars().count() > MAX_USERNAME_LEN {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: MAX_USERNAME_LEN,
        });
    }

    if name.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Validates a password before hashing.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() > MAX_PASSWORD_LEN {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: MAX_PASSWORD_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Ledger Inputs
// =============================================================================

/// Validates a transfer amount and wraps it as [`Coins`].
///
/// Zero and negative amounts are rejected before any load.
pub fn validate_amount(amount: i64) -> ValidationResult<Coins> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(Coins::new(amount))
}

/// Validates a catalog item name supplied by a caller.
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "item".to_string(),
        });
    }

    if name.chars().count() > MAX_ITEM_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "item".to_string(),
            max: MAX_ITEM_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("bob_the-builder.42").is_ok());
        assert!(validate_username(&"a".repeat(64)).is_ok());

        assert!(matches!(
            validate_username(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_username(&"a".repeat(65)),
            Err(ValidationError::TooLong { max: 64, .. })
        ));
        assert!(matches!(
            validate_username("alice\t"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password(&"p".repeat(128)).is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(200).unwrap(), Coins::new(200));
        assert!(matches!(
            validate_amount(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_amount(-5).is_err());
    }

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("t-shirt").is_ok());
        assert!(validate_item_name("").is_err());
        assert!(validate_item_name("   ").is_err());
        assert!(validate_item_name(&"x".repeat(101)).is_err());
    }
}
