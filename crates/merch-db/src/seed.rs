//! # Catalog Seeding
//!
//! Idempotent insert of the merch catalog. Runs at application startup and
//! from the `seed` binary.

use chrono::Utc;
use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;

/// The default merch catalog: `(name, price)`.
pub const DEFAULT_CATALOG: &[(&str, i64)] = &[
    ("t-shirt", 80),
    ("cup", 20),
    ("book", 50),
    ("pen", 10),
    ("powerbank", 200),
    ("hoody", 300),
    ("umbrella", 200),
    ("socks", 10),
    ("wallet", 50),
    ("pink-hoody", 500),
];

/// Inserts the default catalog. Returns how many items were added.
pub async fn seed_catalog(db: &Database) -> DbResult<usize> {
    seed_items(db, DEFAULT_CATALOG).await
}

/// Inserts `items` that are not present yet, in one transaction.
///
/// Existing names are left untouched (`ON CONFLICT(name) DO NOTHING`), so
/// running it again adds nothing.
pub async fn seed_items(db: &Database, items: &[(&str, i64)]) -> DbResult<usize> {
    let mut tx = db.pool().begin().await?;
    let now = Utc::now();
    let mut added = 0usize;

    for (name, price) in items {
        let result = sqlx::query(
            "INSERT INTO items (name, price, created_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(*name)
        .bind(*price)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        added += result.rows_affected() as usize;
    }

    tx.commit().await?;
    info!(added, total = items.len(), "Catalog seeded");
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use crate::error::DbError;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert_eq!(seed_catalog(&db).await.unwrap(), DEFAULT_CATALOG.len());
        assert_eq!(seed_catalog(&db).await.unwrap(), 0);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 10);
    }

    #[tokio::test]
    async fn test_seed_adds_only_missing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_items(&db, &[("cup", 20)]).await.unwrap();

        assert_eq!(seed_catalog(&db).await.unwrap(), DEFAULT_CATALOG.len() - 1);
    }

    #[tokio::test]
    async fn test_seed_rejects_free_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = seed_items(&db, &[("sticker", 0)]).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
