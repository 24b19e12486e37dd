//! # Merch Shop
//!
//! Command layer of the merch shop: employees log in, receive coins, send
//! them to each other and spend them on merch.
//!
//! ## Module Organization
//! ```text
//! merch_shop/
//! ├── lib.rs          ◄─── You are here
//! ├── config.rs       ◄─── Environment configuration
//! ├── auth.rs         ◄─── JWT + argon2
//! ├── services/
//! │   └── auth_service.rs ◄─── Login / first-use registration
//! ├── state.rs        ◄─── AppState (database, services)
//! ├── commands/
//! │   ├── auth.rs     ◄─── authenticate
//! │   └── ledger.rs   ◄─── get_info, send_coin, buy_item
//! ├── cli.rs          ◄─── clap definitions, dispatch
//! └── error.rs        ◄─── ApiError
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `DATABASE_PATH` - SQLite file (default: ./merch.db)
//! - `DB_MAX_CONNECTIONS` / `DB_MIN_CONNECTIONS` - pool size (default: 5 / 1)
//! - `DB_CONNECT_TIMEOUT_SECS` - pool acquire timeout (default: 30)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_LIFETIME_SECS` - Token lifetime (default: 86400)
//! - `START_BALANCE` - Coins granted on first login (default: 1000)

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod services;
pub mod state;

// Re-exports
pub use config::AppConfig;
pub use error::{ApiError, ErrorCode};
pub use state::AppState;
