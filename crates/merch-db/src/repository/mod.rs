//! # Repository Module
//!
//! SQLite implementations of the merch-core repository traits.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  LedgerService                                                         │
//! │       │  scope.users().find_by_id(id)                                   │
//! │       ▼                                                                 │
//! │  SqliteUserRepository<'c>  ── borrows ──►  &mut SqliteConnection        │
//! │  SqliteLedgerRepository<'c>                (the scope's transaction,    │
//! │                                             or a session connection)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Repositories never begin or commit; the Unit of Work owns that.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SqliteUserRepository`] - User lookup, registration, balance saves
//! - [`SqliteLedgerRepository`] - Catalog, transaction log, inventory

pub mod ledger;
pub mod user;

pub use ledger::SqliteLedgerRepository;
pub use user::SqliteUserRepository;
