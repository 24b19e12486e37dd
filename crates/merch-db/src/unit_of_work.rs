//! # SQLite Unit of Work
//!
//! Opens transactional scopes on the pool and hands out repositories bound
//! to the scope's connection.
//!
//! ## Isolation Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TxOptions              SQLite                 Effect                   │
//! │  ─────────────────────  ─────────────────────  ───────────────────────  │
//! │  read_only = true       BEGIN DEFERRED         WAL snapshot taken on    │
//! │                                                first read, repeatable   │
//! │                                                                         │
//! │  read_only = false      BEGIN IMMEDIATE        write lock taken at      │
//! │                                                begin; a second writer   │
//! │                                                waits (busy_timeout),    │
//! │                                                then reads the committed │
//! │                                                balance                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite transactions are serializable, so every requested isolation level
//! is met or exceeded.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, warn};

use crate::error::DbError;
use crate::repository::{SqliteLedgerRepository, SqliteUserRepository};
use merch_core::{
    LedgerRepository, LedgerResult, Repositories, TransactionScope, TxOptions, UnitOfWork,
    UserRepository,
};

/// [`UnitOfWork`] backed by a [`SqlitePool`].
#[derive(Debug, Clone)]
pub struct SqliteUnitOfWork {
    pool: SqlitePool,
}

impl SqliteUnitOfWork {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteUnitOfWork { pool }
    }
}

fn begin_statement(options: &TxOptions) -> &'static str {
    if options.read_only {
        "BEGIN DEFERRED"
    } else {
        "BEGIN IMMEDIATE"
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn session(&self) -> LedgerResult<Box<dyn Repositories>> {
        let conn = self.pool.acquire().await.map_err(DbError::from)?;
        Ok(Box::new(SqliteSession { conn }))
    }

    async fn begin_transaction(
        &self,
        options: TxOptions,
    ) -> LedgerResult<Box<dyn TransactionScope>> {
        let statement = begin_statement(&options);
        let tx = self
            .pool
            .begin_with(statement)
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(
            isolation = ?options.isolation,
            read_only = options.read_only,
            statement,
            "Scope opened"
        );

        Ok(Box::new(SqliteTransactionScope {
            tx,
            options,
            guard: ScopeGuard::armed(options.read_only),
        }))
    }
}

// =============================================================================
// Transaction Scope
// =============================================================================

struct SqliteTransactionScope {
    tx: Transaction<'static, Sqlite>,
    options: TxOptions,
    guard: ScopeGuard,
}

impl Repositories for SqliteTransactionScope {
    fn users(&mut self) -> Box<dyn UserRepository + '_> {
        Box::new(SqliteUserRepository::new(&mut self.tx, self.options.read_only))
    }

    fn ledger(&mut self) -> Box<dyn LedgerRepository + '_> {
        Box::new(SqliteLedgerRepository::new(&mut self.tx, self.options.read_only))
    }
}

#[async_trait]
impl TransactionScope for SqliteTransactionScope {
    fn options(&self) -> TxOptions {
        self.options
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        let SqliteTransactionScope { tx, mut guard, .. } = *self;
        guard.disarm();
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Scope committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> LedgerResult<()> {
        let SqliteTransactionScope { tx, mut guard, .. } = *self;
        guard.disarm();
        tx.rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Scope rolled back");
        Ok(())
    }
}

/// Logs a scope that was dropped unfinished. sqlx rolls the transaction
/// back when its `Transaction` is dropped.
struct ScopeGuard {
    armed: bool,
    read_only: bool,
}

impl ScopeGuard {
    fn armed(read_only: bool) -> Self {
        ScopeGuard {
            armed: true,
            read_only,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!(
                read_only = self.read_only,
                "Scope dropped without commit or rollback; rolling back"
            );
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Non-transactional handle on one pooled connection (autocommit).
struct SqliteSession {
    conn: PoolConnection<Sqlite>,
}

impl Repositories for SqliteSession {
    fn users(&mut self) -> Box<dyn UserRepository + '_> {
        Box::new(SqliteUserRepository::new(&mut self.conn, false))
    }

    fn ledger(&mut self) -> Box<dyn LedgerRepository + '_> {
        Box::new(SqliteLedgerRepository::new(&mut self.conn, false))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
