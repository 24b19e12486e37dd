//! # Store Capabilities
//!
//! The traits the Ledger Service is written against. Storage crates
//! implement them; the service never sees SQL or connections.
//!
//! ## Scope Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Unit of Work                                    │
//! │                                                                         │
//! │  UnitOfWork::begin_transaction(TxOptions)                               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Box<dyn TransactionScope> ─────────────────────────────┐               │
//! │        │                                                │               │
//! │        ├── users()  → Box<dyn UserRepository>    (borrows the scope)    │
//! │        ├── ledger() → Box<dyn LedgerRepository>  (borrows the scope)    │
//! │        │                                                │               │
//! │        ├── commit(self)   ─┐  exactly one, consumes      │               │
//! │        └── rollback(self) ─┘  the scope                  │               │
//! │                                                         │               │
//! │  Dropped without either → implementation rolls back ────┘               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `commit` and `rollback` take `self: Box<Self>`, so calling both, or
//! calling one twice, does not compile. Repositories borrow the scope
//! mutably, so they cannot outlive it and never open their own transaction.
//! Scopes are leaf-level: there is no way to begin a scope from a scope.

use async_trait::async_trait;

use crate::error::LedgerResult;
use crate::types::{
    InventoryLine, Item, ItemId, NewTransaction, NewUser, ReceivedTransfer, SentTransfer, Transaction,
    User, UserId,
};

// =============================================================================
// Transaction Options
// =============================================================================

/// Isolation level requested for a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    ReadCommitted,
    #[default]
    RepeatableRead,
    Serializable,
}

/// Options for [`UnitOfWork::begin_transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOptions {
    pub isolation: IsolationLevel,
    pub read_only: bool,
}

impl TxOptions {
    /// A scope that only reads.
    pub const fn read_only(isolation: IsolationLevel) -> Self {
        TxOptions {
            isolation,
            read_only: true,
        }
    }

    /// A scope that may mutate balances and inventory.
    pub const fn read_write(isolation: IsolationLevel) -> Self {
        TxOptions {
            isolation,
            read_only: false,
        }
    }
}

// =============================================================================
// Repositories
// =============================================================================

/// User lookup and mutation.
///
/// Lookups return `Ok(None)` for a missing user; absence is not an error here.
#[async_trait]
pub trait UserRepository: Send {
    async fn find_by_id(&mut self, id: UserId) -> LedgerResult<Option<User>>;

    async fn find_by_name(&mut self, name: &str) -> LedgerResult<Option<User>>;

    /// Inserts a user. A taken name fails with `LedgerError::Conflict`.
    async fn create(&mut self, user: &NewUser) -> LedgerResult<User>;

    /// Full save of a loaded user.
    async fn update(&mut self, user: &User) -> LedgerResult<()>;
}

/// Catalog, transaction and inventory access.
#[async_trait]
pub trait LedgerRepository: Send {
    async fn find_item_by_name(&mut self, name: &str) -> LedgerResult<Option<Item>>;

    async fn create_transaction(&mut self, tx: &NewTransaction) -> LedgerResult<Transaction>;

    /// Transactions sent by `user_id`, oldest first.
    async fn list_outgoing(&mut self, user_id: UserId) -> LedgerResult<Vec<SentTransfer>>;

    /// Transactions received by `user_id`, oldest first.
    async fn list_incoming(&mut self, user_id: UserId) -> LedgerResult<Vec<ReceivedTransfer>>;

    async fn list_inventory(&mut self, user_id: UserId) -> LedgerResult<Vec<InventoryLine>>;

    /// Creates the (user, item) row at quantity 1 or increments it by 1.
    ///
    /// Must be a single storage-level upsert, never a read followed by a write.
    async fn add_inventory_item(&mut self, user_id: UserId, item_id: ItemId) -> LedgerResult<()>;
}

/// A handle exposing repository accessors bound to one connection.
pub trait Repositories: Send {
    fn users(&mut self) -> Box<dyn UserRepository + '_>;

    fn ledger(&mut self) -> Box<dyn LedgerRepository + '_>;
}

// =============================================================================
// Unit of Work
// =============================================================================

/// An open transaction. Must be finished with exactly one of `commit` or
/// `rollback`.
#[async_trait]
pub trait TransactionScope: Repositories {
    fn options(&self) -> TxOptions;

    async fn commit(self: Box<Self>) -> LedgerResult<()>;

    async fn rollback(self: Box<Self>) -> LedgerResult<()>;
}

/// Produces transactional scopes over a backing store.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Non-transactional handle. Each repository call runs on its own.
    async fn session(&self) -> LedgerResult<Box<dyn Repositories>>;

    async fn begin_transaction(&self, options: TxOptions)
        -> LedgerResult<Box<dyn TransactionScope>>;
}
