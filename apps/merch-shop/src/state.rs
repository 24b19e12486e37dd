//! # Application State
//!
//! Everything a command needs, built once at startup.
//!
//! ## Startup Sequence
//! ```text
//! AppConfig ──► Database::new (pool + migrations)
//!                   │
//!                   ▼
//!               seed_catalog (idempotent)
//!                   │
//!                   ▼
//!               SqliteUnitOfWork ──┬──► LedgerService
//!                                  └──► AuthService (+ JwtManager)
//! ```
//!
//! `Database` holds a `SqlitePool` and both services only hold an `Arc` to
//! the unit of work, so the state is `Send + Sync` and commands can run
//! concurrently without extra locking.

use std::sync::Arc;

use merch_core::{LedgerError, LedgerService};
use merch_db::{seed_catalog, Database};
use tracing::info;

use crate::auth::JwtManager;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::services::AuthService;

/// Shared application state.
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub ledger: LedgerService,
    pub auth: AuthService,
    pub jwt: JwtManager,
}

impl AppState {
    /// Opens the database, applies migrations and seeds the catalog.
    pub async fn initialize(config: AppConfig) -> Result<Self, ApiError> {
        let db = Database::new(config.db_config())
            .await
            .map_err(LedgerError::from)?;

        let added = seed_catalog(&db).await.map_err(LedgerError::from)?;
        info!(
            database = %config.database_path,
            items_added = added,
            "Database ready"
        );

        let uow = Arc::new(db.unit_of_work());
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);

        Ok(AppState {
            ledger: LedgerService::new(uow.clone()),
            auth: AuthService::new(uow, jwt.clone(), config.start_balance()),
            jwt,
            db,
            config,
        })
    }

    /// Closes the connection pool.
    pub async fn shutdown(&self) {
        self.db.close().await;
    }
}
