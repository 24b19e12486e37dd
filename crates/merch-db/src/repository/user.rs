//! # User Repository
//!
//! Database operations for users, bound to one connection or transaction.
//!
//! ## Key Operations
//! - Lookup by id and by unique name
//! - Registration insert (`RETURNING` the stored row)
//! - Full save of a loaded user (balance changes)

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use merch_core::{LedgerResult, NewUser, User, UserId, UserRepository};

const USER_COLUMNS: &str = "id, name, password_hash, balance, created_at, updated_at";

/// Repository for user database operations.
///
/// ## Usage
/// ```rust,ignore
/// let mut repo = SqliteUserRepository::new(&mut *tx, false);
/// let alice = repo.get_by_name("alice").await?;
/// ```
pub struct SqliteUserRepository<'c> {
    conn: &'c mut SqliteConnection,
    read_only: bool,
}

impl<'c> SqliteUserRepository<'c> {
    /// Creates a repository over `conn`. Writes fail when `read_only` is set.
    pub fn new(conn: &'c mut SqliteConnection, read_only: bool) -> Self {
        SqliteUserRepository { conn, read_only }
    }

    fn ensure_writable(&self) -> DbResult<()> {
        if self.read_only {
            return Err(DbError::ReadOnly);
        }
        Ok(())
    }

    /// Gets a user by id.
    ///
    /// ## Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - User not found
    pub async fn get_by_id(&mut self, id: UserId) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(user)
    }

    /// Gets a user by name.
    pub async fn get_by_name(&mut self, name: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE name = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(name)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(user)
    }

    /// Inserts a new user and returns the stored row.
    ///
    /// A taken name fails with [`DbError::UniqueViolation`].
    pub async fn insert(&mut self, new: &NewUser) -> DbResult<User> {
        self.ensure_writable()?;
        debug!(name = %new.name, "Inserting user");

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (name, password_hash, balance, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&new.name)
            .bind(&new.password_hash)
            .bind(new.balance)
            .bind(now)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &new.name),
                other => other,
            })
    }

    /// Saves every mutable column of `user`.
    pub async fn save(&mut self, user: &User) -> DbResult<()> {
        self.ensure_writable()?;
        debug!(user_id = user.id, balance = %user.balance, "Saving user");

        let result = sqlx::query(
            "UPDATE users SET name = ?1, password_hash = ?2, balance = ?3, updated_at = ?4 \
             WHERE id = ?5",
        )
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.balance)
        .bind(Utc::now())
        .bind(user.id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user.id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository<'_> {
    async fn find_by_id(&mut self, id: UserId) -> LedgerResult<Option<User>> {
        Ok(self.get_by_id(id).await?)
    }

    async fn find_by_name(&mut self, name: &str) -> LedgerResult<Option<User>> {
        Ok(self.get_by_name(name).await?)
    }

    async fn create(&mut self, user: &NewUser) -> LedgerResult<User> {
        Ok(self.insert(user).await?)
    }

    async fn update(&mut self, user: &User) -> LedgerResult<()> {
        Ok(self.save(user).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
