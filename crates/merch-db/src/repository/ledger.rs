//! # Ledger Repository
//!
//! Catalog lookups, the transaction log and inventory rows.
//!
//! ## Purchase Upsert
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INSERT INTO inventory_items (user_id, item_id, quantity, ...)          │
//! │  VALUES (?, ?, 1, ...)                                                  │
//! │  ON CONFLICT (user_id, item_id)                                         │
//! │  DO UPDATE SET quantity = inventory_items.quantity + 1                  │
//! │                                                                         │
//! │  first purchase  → row created at quantity 1                            │
//! │  repeat purchase → same row, quantity + 1                               │
//! │  one statement, no read-then-write race                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use merch_core::{
    InventoryLine, Item, ItemId, LedgerRepository, LedgerResult, NewTransaction,
    ReceivedTransfer, SentTransfer, Transaction, UserId,
};

/// Repository for catalog, transaction and inventory operations.
pub struct SqliteLedgerRepository<'c> {
    conn: &'c mut SqliteConnection,
    read_only: bool,
}

impl<'c> SqliteLedgerRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection, read_only: bool) -> Self {
        SqliteLedgerRepository { conn, read_only }
    }

    fn ensure_writable(&self) -> DbResult<()> {
        if self.read_only {
            return Err(DbError::ReadOnly);
        }
        Ok(())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Gets a catalog item by its unique name.
    pub async fn get_item_by_name(&mut self, name: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            "SELECT id, name, price, created_at FROM items WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(item)
    }

    /// Lists the whole catalog ordered by name.
    pub async fn list_items(&mut self) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT id, name, price, created_at FROM items ORDER BY name",
        )
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(items)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Appends a coin movement to the log.
    pub async fn insert_transaction(&mut self, new: &NewTransaction) -> DbResult<Transaction> {
        self.ensure_writable()?;
        debug!(from_id = new.from_id, to_id = new.to_id, amount = %new.amount, "Recording transaction");

        let tx = sqlx::query_as::<_, Transaction>(
            "INSERT INTO transactions (from_id, to_id, amount, created_at) \
             VALUES (?1, ?2, ?3, ?4) \
             RETURNING id, from_id, to_id, amount, created_at",
        )
        .bind(new.from_id)
        .bind(new.to_id)
        .bind(new.amount)
        .bind(Utc::now())
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(tx)
    }

    /// Transactions sent by `user_id`, joined with the receiver's name.
    pub async fn outgoing(&mut self, user_id: UserId) -> DbResult<Vec<SentTransfer>> {
        let rows = sqlx::query_as::<_, SentTransfer>(
            r#"
            SELECT
                t.id,
                t.to_id   AS to_user_id,
                u.name    AS to_user_name,
                t.amount,
                t.created_at
            FROM transactions t
            INNER JOIN users u ON u.id = t.to_id
            WHERE t.from_id = ?1
            ORDER BY t.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows)
    }

    /// Transactions received by `user_id`, joined with the sender's name.
    pub async fn incoming(&mut self, user_id: UserId) -> DbResult<Vec<ReceivedTransfer>> {
        let rows = sqlx::query_as::<_, ReceivedTransfer>(
            r#"
            SELECT
                t.id,
                t.from_id AS from_user_id,
                u.name    AS from_user_name,
                t.amount,
                t.created_at
            FROM transactions t
            INNER JOIN users u ON u.id = t.from_id
            WHERE t.to_id = ?1
            ORDER BY t.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows)
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    /// A user's inventory joined with item metadata.
    pub async fn inventory(&mut self, user_id: UserId) -> DbResult<Vec<InventoryLine>> {
        let rows = sqlx::query_as::<_, InventoryLine>(
            r#"
            SELECT
                ii.item_id,
                i.name   AS item_name,
                i.price  AS item_price,
                ii.quantity
            FROM inventory_items ii
            INNER JOIN items i ON i.id = ii.item_id
            WHERE ii.user_id = ?1
            ORDER BY ii.item_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows)
    }

    /// Creates the (user, item) row at quantity 1, or increments it.
    pub async fn upsert_inventory(&mut self, user_id: UserId, item_id: ItemId) -> DbResult<()> {
        self.ensure_writable()?;
        debug!(user_id, item_id, "Incrementing inventory");

        sqlx::query(
            r#"
            INSERT INTO inventory_items (user_id, item_id, quantity, created_at, updated_at)
            VALUES (?1, ?2, 1, ?3, ?3)
            ON CONFLICT (user_id, item_id)
            DO UPDATE SET
                quantity = inventory_items.quantity + 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(item_id)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerRepository for SqliteLedgerRepository<'_> {
    async fn find_item_by_name(&mut self, name: &str) -> LedgerResult<Option<Item>> {
        Ok(self.get_item_by_name(name).await?)
    }

    async fn create_transaction(&mut self, tx: &NewTransaction) -> LedgerResult<Transaction> {
        Ok(self.insert_transaction(tx).await?)
    }

    async fn list_outgoing(&mut self, user_id: UserId) -> LedgerResult<Vec<SentTransfer>> {
        Ok(self.outgoing(user_id).await?)
    }

    async fn list_incoming(&mut self, user_id: UserId) -> LedgerResult<Vec<ReceivedTransfer>> {
        Ok(self.incoming(user_id).await?)
    }

    async fn list_inventory(&mut self, user_id: UserId) -> LedgerResult<Vec<InventoryLine>> {
        Ok(self.inventory(user_id).await?)
    }

    async fn add_inventory_item(&mut self, user_id: UserId, item_id: ItemId) -> LedgerResult<()> {
        Ok(self.upsert_inventory(user_id, item_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::user::SqliteUserRepository;
    use crate::seed::seed_catalog;
    use merch_core::{Coins, NewUser, User};

    async fn setup() -> (Database, User, User) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_catalog(&db).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let mut users = SqliteUserRepository::new(&mut conn, false);
        let make = |name: &str| NewUser {
            name: name.to_string(),
            password_hash: "hash".to_string(),
            balance: Coins::new(1000),
        };
        let alice = users.insert(&make("alice")).await.unwrap();
        let bob = users.insert(&make("bob")).await.unwrap();
        drop(conn);

        (db, alice, bob)
    }

    #[tokio::test]
    async fn test_find_item() {
        let (db, _alice, _bob) = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let mut repo = SqliteLedgerRepository::new(&mut conn, true);

        let shirt = repo.get_item_by_name("t-shirt").await.unwrap().unwrap();
        assert_eq!(shirt.price, Coins::new(80));
        assert!(repo.get_item_by_name("spaceship").await.unwrap().is_none());
        assert_eq!(repo.list_items().await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_upsert_increments_single_row() {
        let (db, alice, _bob) = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let mut repo = SqliteLedgerRepository::new(&mut conn, false);

        let cup = repo.get_item_by_name("cup").await.unwrap().unwrap();
        repo.upsert_inventory(alice.id, cup.id).await.unwrap();
        repo.upsert_inventory(alice.id, cup.id).await.unwrap();

        let lines = repo.inventory(alice.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item_name, "cup");
        assert_eq!(lines[0].item_price, Coins::new(20));
        assert_eq!(lines[0].quantity, 2);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_history_joins_names() {
        let (db, alice, bob) = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let mut repo = SqliteLedgerRepository::new(&mut conn, false);

        let recorded = repo
            .insert_transaction(&NewTransaction {
                from_id: alice.id,
                to_id: bob.id,
                amount: Coins::new(200),
            })
            .await
            .unwrap();
        assert_eq!(recorded.amount, Coins::new(200));

        let sent = repo.outgoing(alice.id).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_user_name, "bob");
        assert_eq!(sent[0].to_user_id, bob.id);

        let received = repo.incoming(bob.id).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].from_user_name, "alice");

        assert!(repo.incoming(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_amount_rejected_by_schema() {
        let (db, alice, bob) = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let mut repo = SqliteLedgerRepository::new(&mut conn, false);

        let err = repo
            .insert_transaction(&NewTransaction {
                from_id: alice.id,
                to_id: bob.id,
                amount: Coins::ZERO,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_unknown_user_rejected_by_foreign_key() {
        let (db, alice, _bob) = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let mut repo = SqliteLedgerRepository::new(&mut conn, false);

        let err = repo
            .insert_transaction(&NewTransaction {
                from_id: alice.id,
                to_id: 9999,
                amount: Coins::new(1),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_read_only_rejects_upsert() {
        let (db, alice, _bob) = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let mut repo = SqliteLedgerRepository::new(&mut conn, true);

        let err = repo.upsert_inventory(alice.id, 1).await.unwrap_err();
        assert!(matches!(err, DbError::ReadOnly));
    }
}
