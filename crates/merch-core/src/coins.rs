//! # Coins Module
//!
//! Provides the `Coins` type for balances, prices and transfer amounts.
//!
//! ## Why a Newtype?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE NEGATIVE BALANCE PROBLEM                                           │
//! │                                                                         │
//! │  With a bare integer:                                                   │
//! │    balance = balance - price      → -60 slips through  ❌               │
//! │                                                                         │
//! │  With Coins:                                                            │
//! │    balance.checked_debit(price)   → None, caller must handle it        │
//! │                                                                         │
//! │  There is no `Sub` impl. Every debit goes through the checked path.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use merch_core::coins::Coins;
//!
//! let balance = Coins::new(100);
//! let after = balance.checked_debit(Coins::new(30)).unwrap();
//! assert_eq!(after.amount(), 70);
//!
//! let received = after.checked_credit(Coins::new(5)).unwrap();
//! assert_eq!(received, Coins::new(75));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Coins Type
// =============================================================================

/// An integer count of virtual coins.
///
/// Stored as `i64` so it maps directly onto SQLite INTEGER columns. Values
/// loaded from storage are never negative (the schema has CHECK constraints),
/// and the ledger only produces new values through [`Coins::checked_debit`]
/// and [`Coins::checked_credit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Coins(i64);

impl Coins {
    /// Zero coins.
    pub const ZERO: Coins = Coins(0);

    /// Wraps a raw coin count.
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Coins(amount)
    }

    /// Returns the raw coin count.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtracts `other`, returning `None` if the result would be negative.
    ///
    /// ## User Workflow
    /// ```text
    /// BuyItem("hoody")
    ///      │
    ///      ▼
    /// balance.checked_debit(price) ← THIS FUNCTION
    ///      │
    ///      ├── Some(new_balance) → persist
    ///      └── None              → InsufficientBalance, rollback
    /// ```
    #[inline]
    pub fn checked_debit(self, other: Coins) -> Option<Coins> {
        self.0
            .checked_sub(other.0)
            .filter(|remaining| *remaining >= 0)
            .map(Coins)
    }

    /// Adds `other`, returning `None` on integer overflow.
    #[inline]
    pub fn checked_credit(self, other: Coins) -> Option<Coins> {
        self.0.checked_add(other.0).map(Coins)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for Coins {
    fn from(amount: i64) -> Self {
        Coins(amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_within_balance() {
        let balance = Coins::new(1000);
        assert_eq!(balance.checked_debit(Coins::new(80)), Some(Coins::new(920)));
        assert_eq!(balance.checked_debit(balance), Some(Coins::ZERO));
    }

    #[test]
    fn test_debit_never_goes_negative() {
        let balance = Coins::new(50);
        assert_eq!(balance.checked_debit(Coins::new(51)), None);
        assert_eq!(Coins::ZERO.checked_debit(Coins::new(1)), None);
    }

    #[test]
    fn test_credit_overflow() {
        let near_max = Coins::new(i64::MAX - 1);
        assert_eq!(near_max.checked_credit(Coins::new(1)), Some(Coins::new(i64::MAX)));
        assert_eq!(near_max.checked_credit(Coins::new(2)), None);
    }

    #[test]
    fn test_checks() {
        assert!(Coins::ZERO.is_zero());
        assert!(!Coins::ZERO.is_positive());
        assert!(Coins::new(1).is_positive());
        assert!(!Coins::new(-1).is_positive());
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&Coins::new(720)).unwrap();
        assert_eq!(json, "720");

        let back: Coins = serde_json::from_str("1200").unwrap();
        assert_eq!(back, Coins::new(1200));
    }

    #[test]
    fn test_display() {
        assert_eq!(Coins::new(200).to_string(), "200");
        assert_eq!(format!("{:>5}", Coins::new(80)), "   80");
    }
}
