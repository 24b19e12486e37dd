//! # In-Memory Store
//!
//! A [`UnitOfWork`] over plain collections, for exercising the Ledger
//! Service without a database.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Arc<RwLock<MemoryState>>                                               │
//! │                                                                         │
//! │  read-only scope:   read lock → clone snapshot → release               │
//! │                     (repeatable reads, writes rejected)                 │
//! │                                                                         │
//! │  read-write scope:  owned write lock held until commit/rollback/drop    │
//! │                     mutations go to a working copy                      │
//! │                     commit publishes it, anything else discards it     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, warn};

use crate::coins::Coins;
use crate::error::{LedgerError, LedgerResult};
use crate::store::{
    LedgerRepository, Repositories, TransactionScope, TxOptions, UnitOfWork, UserRepository,
};
use crate::types::{
    InventoryItem, InventoryLine, Item, ItemId, NewTransaction, NewUser, ReceivedTransfer,
    SentTransfer, Transaction, User, UserId,
};

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    items: BTreeMap<ItemId, Item>,
    inventory: BTreeMap<(UserId, ItemId), InventoryItem>,
    transactions: Vec<Transaction>,
    last_user_id: i64,
    last_item_id: i64,
    last_inventory_id: i64,
    last_transaction_id: i64,
}

impl MemoryState {
    fn user_by_id(&self, id: UserId) -> Option<User> {
        self.users.get(&id).cloned()
    }

    fn user_by_name(&self, name: &str) -> Option<User> {
        self.users.values().find(|u| u.name == name).cloned()
    }

    fn create_user(&mut self, new: &NewUser) -> LedgerResult<User> {
        if self.users.values().any(|u| u.name == new.name) {
            return Err(LedgerError::Conflict(format!("users.name: {}", new.name)));
        }
        if new.balance < Coins::ZERO {
            return Err(LedgerError::Storage("balance must not be negative".into()));
        }

        self.last_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: self.last_user_id,
            name: new.name.clone(),
            password_hash: new.password_hash.clone(),
            balance: new.balance,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn update_user(&mut self, user: &User) -> LedgerResult<()> {
        if user.balance < Coins::ZERO {
            return Err(LedgerError::Storage("balance must not be negative".into()));
        }
        if self
            .users
            .values()
            .any(|u| u.id != user.id && u.name == user.name)
        {
            return Err(LedgerError::Conflict(format!("users.name: {}", user.name)));
        }

        let stored = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| LedgerError::UserNotFound(user.id.to_string()))?;
        *stored = User {
            updated_at: Utc::now(),
            ..user.clone()
        };
        Ok(())
    }

    fn item_by_name(&self, name: &str) -> Option<Item> {
        self.items.values().find(|i| i.name == name).cloned()
    }

    fn insert_item(&mut self, name: &str, price: Coins) -> LedgerResult<Item> {
        if self.items.values().any(|i| i.name == name) {
            return Err(LedgerError::Conflict(format!("items.name: {name}")));
        }
        if !price.is_positive() {
            return Err(LedgerError::Storage("price must be positive".into()));
        }

        self.last_item_id += 1;
        let item = Item {
            id: self.last_item_id,
            name: name.to_string(),
            price,
            created_at: Utc::now(),
        };
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    fn create_transaction(&mut self, new: &NewTransaction) -> LedgerResult<Transaction> {
        if !new.amount.is_positive() {
            return Err(LedgerError::Storage("amount must be positive".into()));
        }
        if !self.users.contains_key(&new.from_id) || !self.users.contains_key(&new.to_id) {
            return Err(LedgerError::Storage("transaction references a missing user".into()));
        }

        self.last_transaction_id += 1;
        let tx = Transaction {
            id: self.last_transaction_id,
            from_id: new.from_id,
            to_id: new.to_id,
            amount: new.amount,
            created_at: Utc::now(),
        };
        self.transactions.push(tx.clone());
        Ok(tx)
    }

    fn user_name(&self, id: UserId) -> String {
        self.users
            .get(&id)
            .map(|u| u.name.clone())
            .unwrap_or_default()
    }

    fn outgoing(&self, user_id: UserId) -> Vec<SentTransfer> {
        self.transactions
            .iter()
            .filter(|t| t.from_id == user_id)
            .map(|t| SentTransfer {
                id: t.id,
                to_user_id: t.to_id,
                to_user_name: self.user_name(t.to_id),
                amount: t.amount,
                created_at: t.created_at,
            })
            .collect()
    }

    fn incoming(&self, user_id: UserId) -> Vec<ReceivedTransfer> {
        self.transactions
            .iter()
            .filter(|t| t.to_id == user_id)
            .map(|t| ReceivedTransfer {
                id: t.id,
                from_user_id: t.from_id,
                from_user_name: self.user_name(t.from_id),
                amount: t.amount,
                created_at: t.created_at,
            })
            .collect()
    }

    fn inventory_of(&self, user_id: UserId) -> Vec<InventoryLine> {
        self.inventory
            .range((user_id, ItemId::MIN)..=(user_id, ItemId::MAX))
            .filter_map(|(_, row)| {
                self.items.get(&row.item_id).map(|item| InventoryLine {
                    item_id: item.id,
                    item_name: item.name.clone(),
                    item_price: item.price,
                    quantity: row.quantity,
                })
            })
            .collect()
    }

    fn add_inventory_item(&mut self, user_id: UserId, item_id: ItemId) -> LedgerResult<()> {
        if !self.users.contains_key(&user_id) || !self.items.contains_key(&item_id) {
            return Err(LedgerError::Storage("inventory references a missing row".into()));
        }

        let now = Utc::now();
        match self.inventory.get_mut(&(user_id, item_id)) {
            Some(row) => {
                row.quantity += 1;
                row.updated_at = now;
            }
            None => {
                self.last_inventory_id += 1;
                self.inventory.insert(
                    (user_id, item_id),
                    InventoryItem {
                        id: self.last_inventory_id,
                        user_id,
                        item_id,
                        quantity: 1,
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }
        Ok(())
    }
}

// =============================================================================
// Store
// =============================================================================

/// In-memory [`UnitOfWork`]. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a catalog item.
    pub async fn insert_item(&self, name: &str, price: i64) -> LedgerResult<Item> {
        self.state.write().await.insert_item(name, Coins::new(price))
    }

    /// Adds a user directly, bypassing registration.
    pub async fn add_user(&self, user: NewUser) -> LedgerResult<User> {
        self.state.write().await.create_user(&user)
    }

    pub async fn user_by_name(&self, name: &str) -> Option<User> {
        self.state.read().await.user_by_name(name)
    }

    pub async fn transaction_count(&self) -> usize {
        self.state.read().await.transactions.len()
    }
}

#[async_trait]
impl UnitOfWork for MemoryStore {
    async fn session(&self) -> LedgerResult<Box<dyn Repositories>> {
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
        }))
    }

    async fn begin_transaction(
        &self,
        options: TxOptions,
    ) -> LedgerResult<Box<dyn TransactionScope>> {
        let scope = if options.read_only {
            MemoryScope {
                working: self.state.read().await.clone(),
                guard: None,
                options,
                finished: false,
            }
        } else {
            let guard = Arc::clone(&self.state).write_owned().await;
            MemoryScope {
                working: (*guard).clone(),
                guard: Some(guard),
                options,
                finished: false,
            }
        };
        debug!(read_only = options.read_only, "Memory scope opened");
        Ok(Box::new(scope))
    }
}

// =============================================================================
// Scope
// =============================================================================

struct MemoryScope {
    working: MemoryState,
    guard: Option<OwnedRwLockWriteGuard<MemoryState>>,
    options: TxOptions,
    finished: bool,
}

impl Repositories for MemoryScope {
    fn users(&mut self) -> Box<dyn UserRepository + '_> {
        Box::new(ScopedRepo {
            state: &mut self.working,
            read_only: self.options.read_only,
        })
    }

    fn ledger(&mut self) -> Box<dyn LedgerRepository + '_> {
        Box::new(ScopedRepo {
            state: &mut self.working,
            read_only: self.options.read_only,
        })
    }
}

#[async_trait]
impl TransactionScope for MemoryScope {
    fn options(&self) -> TxOptions {
        self.options
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        let mut scope = self;
        scope.finished = true;
        if let Some(mut guard) = scope.guard.take() {
            *guard = std::mem::take(&mut scope.working);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> LedgerResult<()> {
        let mut scope = self;
        scope.finished = true;
        scope.guard = None;
        Ok(())
    }
}

impl Drop for MemoryScope {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                read_only = self.options.read_only,
                "Memory scope dropped without commit or rollback; discarding changes"
            );
        }
    }
}

/// Repositories over a scope's working copy.
struct ScopedRepo<'a> {
    state: &'a mut MemoryState,
    read_only: bool,
}

impl ScopedRepo<'_> {
    fn writable(&mut self) -> LedgerResult<&mut MemoryState> {
        if self.read_only {
            return Err(LedgerError::Storage(
                "write attempted in a read-only scope".into(),
            ));
        }
        Ok(&mut *self.state)
    }
}

#[async_trait]
impl UserRepository for ScopedRepo<'_> {
    async fn find_by_id(&mut self, id: UserId) -> LedgerResult<Option<User>> {
        Ok(self.state.user_by_id(id))
    }

    async fn find_by_name(&mut self, name: &str) -> LedgerResult<Option<User>> {
        Ok(self.state.user_by_name(name))
    }

    async fn create(&mut self, user: &NewUser) -> LedgerResult<User> {
        self.writable()?.create_user(user)
    }

    async fn update(&mut self, user: &User) -> LedgerResult<()> {
        self.writable()?.update_user(user)
    }
}

#[async_trait]
impl LedgerRepository for ScopedRepo<'_> {
    async fn find_item_by_name(&mut self, name: &str) -> LedgerResult<Option<Item>> {
        Ok(self.state.item_by_name(name))
    }

    async fn create_transaction(&mut self, tx: &NewTransaction) -> LedgerResult<Transaction> {
        self.writable()?.create_transaction(tx)
    }

    async fn list_outgoing(&mut self, user_id: UserId) -> LedgerResult<Vec<SentTransfer>> {
        Ok(self.state.outgoing(user_id))
    }

    async fn list_incoming(&mut self, user_id: UserId) -> LedgerResult<Vec<ReceivedTransfer>> {
        Ok(self.state.incoming(user_id))
    }

    async fn list_inventory(&mut self, user_id: UserId) -> LedgerResult<Vec<InventoryLine>> {
        Ok(self.state.inventory_of(user_id))
    }

    async fn add_inventory_item(&mut self, user_id: UserId, item_id: ItemId) -> LedgerResult<()> {
        self.writable()?.add_inventory_item(user_id, item_id)
    }
}

// =============================================================================
// Session
// =============================================================================

/// Non-transactional handle: every call takes the lock on its own.
struct MemorySession {
    state: Arc<RwLock<MemoryState>>,
}

impl Repositories for MemorySession {
    fn users(&mut self) -> Box<dyn UserRepository + '_> {
        Box::new(SessionRepo { state: &self.state })
    }

    fn ledger(&mut self) -> Box<dyn LedgerRepository + '_> {
        Box::new(SessionRepo { state: &self.state })
    }
}

struct SessionRepo<'a> {
    state: &'a RwLock<MemoryState>,
}

#[async_trait]
impl UserRepository for SessionRepo<'_> {
    async fn find_by_id(&mut self, id: UserId) -> LedgerResult<Option<User>> {
        Ok(self.state.read().await.user_by_id(id))
    }

    async fn find_by_name(&mut self, name: &str) -> LedgerResult<Option<User>> {
        Ok(self.state.read().await.user_by_name(name))
    }

    async fn create(&mut self, user: &NewUser) -> LedgerResult<User> {
        self.state.write().await.create_user(user)
    }

    async fn update(&mut self, user: &User) -> LedgerResult<()> {
        self.state.write().await.update_user(user)
    }
}

#[async_trait]
impl LedgerRepository for SessionRepo<'_> {
    async fn find_item_by_name(&mut self, name: &str) -> LedgerResult<Option<Item>> {
        Ok(self.state.read().await.item_by_name(name))
    }

    async fn create_transaction(&mut self, tx: &NewTransaction) -> LedgerResult<Transaction> {
        self.state.write().await.create_transaction(tx)
    }

    async fn list_outgoing(&mut self, user_id: UserId) -> LedgerResult<Vec<SentTransfer>> {
        Ok(self.state.read().await.outgoing(user_id))
    }

    async fn list_incoming(&mut self, user_id: UserId) -> LedgerResult<Vec<ReceivedTransfer>> {
        Ok(self.state.read().await.incoming(user_id))
    }

    async fn list_inventory(&mut self, user_id: UserId) -> LedgerResult<Vec<InventoryLine>> {
        Ok(self.state.read().await.inventory_of(user_id))
    }

    async fn add_inventory_item(&mut self, user_id: UserId, item_id: ItemId) -> LedgerResult<()> {
        self.state.write().await.add_inventory_item(user_id, item_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::IsolationLevel;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            password_hash: "hash".to_string(),
            balance: Coins::new(1000),
        }
    }

    fn rw() -> TxOptions {
        TxOptions::read_write(IsolationLevel::RepeatableRead)
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let store = MemoryStore::new();

        let mut scope = store.begin_transaction(rw()).await.unwrap();
        scope.users().create(&new_user("alice")).await.unwrap();
        scope.commit().await.unwrap();

        assert!(store.user_by_name("alice").await.is_some());
    }

    #[tokio::test]
    async fn test_rollback_discards_changes() {
        let store = MemoryStore::new();

        let mut scope = store.begin_transaction(rw()).await.unwrap();
        scope.users().create(&new_user("alice")).await.unwrap();
        scope.rollback().await.unwrap();

        assert!(store.user_by_name("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_scope_discards_changes() {
        let store = MemoryStore::new();

        {
            let mut scope = store.begin_transaction(rw()).await.unwrap();
            scope.users().create(&new_user("alice")).await.unwrap();
        }

        assert!(store.user_by_name("alice").await.is_none());
        // The write lock was released by the drop.
        let scope = store.begin_transaction(rw()).await.unwrap();
        scope.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_read_only_scope_rejects_writes() {
        let store = MemoryStore::new();
        let mut scope = store
            .begin_transaction(TxOptions::read_only(IsolationLevel::RepeatableRead))
            .await
            .unwrap();

        assert!(scope.options().read_only);
        let err = scope.users().create(&new_user("alice")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
        scope.commit().await.unwrap();
        assert!(store.user_by_name("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_read_only_scope_sees_snapshot() {
        let store = MemoryStore::new();
        let alice = store.add_user(new_user("alice")).await.unwrap();

        let mut reader = store
            .begin_transaction(TxOptions::read_only(IsolationLevel::RepeatableRead))
            .await
            .unwrap();

        let mut writer = store.begin_transaction(rw()).await.unwrap();
        let mut changed = writer.users().find_by_id(alice.id).await.unwrap().unwrap();
        changed.balance = Coins::new(1);
        writer.users().update(&changed).await.unwrap();
        writer.commit().await.unwrap();

        let seen = reader.users().find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(seen.balance, Coins::new(1000));
        reader.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_unique_names() {
        let store = MemoryStore::new();
        store.add_user(new_user("alice")).await.unwrap();
        let err = store.add_user(new_user("alice")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));

        store.insert_item("cup", 20).await.unwrap();
        assert!(matches!(
            store.insert_item("cup", 30).await,
            Err(LedgerError::Conflict(_))
        ));
        assert!(store.insert_item("free", 0).await.is_err());
    }

    #[tokio::test]
    async fn test_inventory_upsert_increments() {
        let store = MemoryStore::new();
        let alice = store.add_user(new_user("alice")).await.unwrap();
        let cup = store.insert_item("cup", 20).await.unwrap();
        let pen = store.insert_item("pen", 10).await.unwrap();

        let mut scope = store.begin_transaction(rw()).await.unwrap();
        scope.ledger().add_inventory_item(alice.id, cup.id).await.unwrap();
        scope.ledger().add_inventory_item(alice.id, cup.id).await.unwrap();
        scope.ledger().add_inventory_item(alice.id, pen.id).await.unwrap();
        scope.commit().await.unwrap();

        let mut session = store.session().await.unwrap();
        let lines = session.ledger().list_inventory(alice.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].item_name, "cup");
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[1].item_name, "pen");
        assert_eq!(lines[1].quantity, 1);
    }

    #[tokio::test]
    async fn test_session_history_joins_names() {
        let store = MemoryStore::new();
        let alice = store.add_user(new_user("alice")).await.unwrap();
        let bob = store.add_user(new_user("bob")).await.unwrap();

        let mut session = store.session().await.unwrap();
        session
            .ledger()
            .create_transaction(&NewTransaction {
                from_id: alice.id,
                to_id: bob.id,
                amount: Coins::new(15),
            })
            .await
            .unwrap();

        let sent = session.ledger().list_outgoing(alice.id).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_user_name, "bob");

        let received = session.ledger().list_incoming(bob.id).await.unwrap();
        assert_eq!(received[0].from_user_name, "alice");
        assert!(session.ledger().list_incoming(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_non_positive_transaction() {
        let store = MemoryStore::new();
        let alice = store.add_user(new_user("alice")).await.unwrap();
        let bob = store.add_user(new_user("bob")).await.unwrap();

        let mut session = store.session().await.unwrap();
        let err = session
            .ledger()
            .create_transaction(&NewTransaction {
                from_id: alice.id,
                to_id: bob.id,
                amount: Coins::ZERO,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
    }
}
