//! # Domain Types
//!
//! Entities persisted by the storage layer, and the read models the Ledger
//! Service assembles from them.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │      Item       │   │  Transaction    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  from_id (FK)   │       │
//! │  │  name (unique)  │   │  name (unique)  │   │  to_id (FK)     │       │
//! │  │  password_hash  │   │  price > 0      │   │  amount > 0     │       │
//! │  │  balance >= 0   │   └────────┬────────┘   │  append-only    │       │
//! │  └────────┬────────┘            │            └─────────────────┘       │
//! │           │      ┌──────────────┴──┐                                    │
//! │           └─────►│  InventoryItem  │  one row per (user, item)          │
//! │                  │  quantity >= 1  │  incremented, never set            │
//! │                  └─────────────────┘                                    │
//! │                                                                         │
//! │  Read models (serialized): InfoResponse, InventoryEntry, CoinHistory   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coins::Coins;

/// Storage identity of a user.
pub type UserId = i64;

/// Storage identity of a catalog item.
pub type ItemId = i64;

// =============================================================================
// User
// =============================================================================

/// A shop participant holding a coin balance.
///
/// Created on first successful authentication, mutated only by the Ledger
/// Service inside a read-write scope, never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: UserId,

    /// Unique display name, also the login name.
    pub name: String,

    /// PHC-format password hash. Never serialized.
    pub password_hash: String,

    /// Current balance. Non-negative at every commit boundary.
    pub balance: Coins,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub password_hash: String,
    pub balance: Coins,
}

// =============================================================================
// Item
// =============================================================================

/// A catalog entry. Immutable after seeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price: Coins,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inventory
// =============================================================================

/// How many of one item a user owns.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryItem {
    pub id: i64,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inventory row joined with its item, as listed for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub item_price: Coins,
    pub quantity: i64,
}

// =============================================================================
// Transaction
// =============================================================================

/// One coin movement. Append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: i64,
    pub from_id: UserId,
    pub to_id: UserId,
    pub amount: Coins,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub from_id: UserId,
    pub to_id: UserId,
    pub amount: Coins,
}

/// Outgoing transaction joined with the receiver's name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SentTransfer {
    pub id: i64,
    pub to_user_id: UserId,
    pub to_user_name: String,
    pub amount: Coins,
    pub created_at: DateTime<Utc>,
}

/// Incoming transaction joined with the sender's name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReceivedTransfer {
    pub id: i64,
    pub from_user_id: UserId,
    pub from_user_name: String,
    pub amount: Coins,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Read Models
// =============================================================================

/// Result of `GetInfo`: balance, inventory and coin history.
///
/// ## JSON Shape
/// ```text
/// {
///   "coins": 720,
///   "inventory": [{ "type": "t-shirt", "quantity": 1 }],
///   "coinHistory": {
///     "received": [{ "fromUser": "bob", "amount": 50 }],
///     "sent":     [{ "toUser": "bob", "amount": 200 }]
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub coins: Coins,
    pub inventory: Vec<InventoryEntry>,
    pub coin_history: CoinHistory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    /// Item name.
    #[serde(rename = "type")]
    pub item_type: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinHistory {
    pub received: Vec<ReceivedEntry>,
    pub sent: Vec<SentEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedEntry {
    pub from_user: String,
    pub amount: Coins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentEntry {
    pub to_user: String,
    pub amount: Coins,
}

impl From<InventoryLine> for InventoryEntry {
    fn from(line: InventoryLine) -> Self {
        InventoryEntry {
            item_type: line.item_name,
            quantity: line.quantity,
        }
    }
}

impl From<SentTransfer> for SentEntry {
    fn from(t: SentTransfer) -> Self {
        SentEntry {
            to_user: t.to_user_name,
            amount: t.amount,
        }
    }
}

impl From<ReceivedTransfer> for ReceivedEntry {
    fn from(t: ReceivedTransfer) -> Self {
        ReceivedEntry {
            from_user: t.from_user_name,
            amount: t.amount,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_response_json_shape() {
        let info = InfoResponse {
            coins: Coins::new(720),
            inventory: vec![InventoryEntry {
                item_type: "t-shirt".into(),
                quantity: 1,
            }],
            coin_history: CoinHistory {
                received: vec![],
                sent: vec![SentEntry {
                    to_user: "bob".into(),
                    amount: Coins::new(200),
                }],
            },
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "coins": 720,
                "inventory": [{ "type": "t-shirt", "quantity": 1 }],
                "coinHistory": {
                    "received": [],
                    "sent": [{ "toUser": "bob", "amount": 200 }]
                }
            })
        );
    }

    #[test]
    fn test_received_entry_from_transfer() {
        let entry: ReceivedEntry = ReceivedTransfer {
            id: 7,
            from_user_id: 1,
            from_user_name: "alice".into(),
            amount: Coins::new(200),
            created_at: Utc::now(),
        }
        .into();
        assert_eq!(entry.from_user, "alice");
        assert_eq!(entry.amount, Coins::new(200));
    }
}
