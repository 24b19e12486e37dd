//! # merch-core: Ledger Rules for the Merch Shop
//!
//! This crate is the **heart** of the merch shop. It owns the entity model,
//! the coin arithmetic and the Ledger Service that moves coins between users
//! and spends them on catalog items.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Merch Shop Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/merch-shop (commands)                      │   │
//! │  │    authenticate, get_info, send_coin, buy_item                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ authenticated user id                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ merch-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   coins   │  │  service  │  │   store   │  │   │
//! │  │   │   User    │  │   Coins   │  │  Ledger   │  │ UnitOfWork│  │   │
//! │  │   │   Item    │  │  checked  │  │  Service  │  │ Repos     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO SQL • NO NETWORK • RULES WRITTEN AGAINST TRAITS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │ UnitOfWork trait                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │     merch-db (SQLite)      or      memory::MemoryStore           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (User, Item, InventoryItem, Transaction) and read models
//! - [`coins`] - `Coins` value type with checked debit/credit
//! - [`error`] - Ledger and validation errors
//! - [`validation`] - Input validation at the service boundary
//! - [`store`] - Repository and Unit of Work capability traits
//! - [`service`] - The Ledger Service (GetInfo, SendCoin, BuyItem)
//! - [`memory`] - In-memory `UnitOfWork` used by tests
//!
//! ## Example Usage
//!
//! ```rust
//! use merch_core::Coins;
//!
//! let balance = Coins::new(1000);
//! let price = Coins::new(80);
//!
//! assert_eq!(balance.checked_debit(price), Some(Coins::new(920)));
//! assert_eq!(price.checked_debit(balance), None); // never below zero
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coins;
pub mod error;
pub mod memory;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use coins::Coins;
pub use error::{LedgerError, LedgerResult, ValidationError};
pub use service::LedgerService;
pub use store::{
    IsolationLevel, LedgerRepository, Repositories, TransactionScope, TxOptions, UnitOfWork,
    UserRepository,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Balance granted to a user on first successful authentication.
///
/// The application config can override it; this is the default.
pub const START_BALANCE: i64 = 1000;

/// Maximum length of a user name.
pub const MAX_USERNAME_LEN: usize = 64;

/// Maximum length of a password accepted for hashing.
pub const MAX_PASSWORD_LEN: usize = 128;

/// Maximum length of a catalog item name.
pub const MAX_ITEM_NAME_LEN: usize = 100;
