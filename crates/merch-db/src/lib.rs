//! # merch-db: Database Layer for the Merch Shop
//!
//! SQLite implementation of the merch-core capability traits, using sqlx
//! for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Merch Shop Data Flow                             │
//! │                                                                         │
//! │  LedgerService::send_coin(...)                                         │
//! │       │  uow.begin_transaction(read_write)                              │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     merch-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  UnitOfWork   │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  + Repos      │    │  + Seed      │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ BEGIN IMMED.  │    │ 001_init.sql │  │   │
//! │  │   │ WAL, FK on    │    │ UserRepo      │    │ catalog      │  │   │
//! │  │   │               │    │ LedgerRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (merch.db)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - User and ledger repositories
//! - [`unit_of_work`] - Transaction scopes
//! - [`seed`] - Catalog seeding
//!
//! ## Usage
//!
//! ```rust,ignore
//! use merch_db::{seed_catalog, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("merch.db")).await?;
//! seed_catalog(&db).await?;
//!
//! let ledger = LedgerService::new(Arc::new(db.unit_of_work()));
//! ledger.buy_item(user_id, "cup").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{SqliteLedgerRepository, SqliteUserRepository};
pub use seed::{seed_catalog, DEFAULT_CATALOG};
pub use unit_of_work::SqliteUnitOfWork;
