//! Application configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable | Default |
//! |---|---|
//! | `DATABASE_PATH` | `./merch.db` (`:memory:` for a throwaway database) |
//! | `DB_MAX_CONNECTIONS` | `5` |
//! | `DB_MIN_CONNECTIONS` | `1` |
//! | `DB_CONNECT_TIMEOUT_SECS` | `30` |
//! | `JWT_SECRET` | development secret |
//! | `JWT_LIFETIME_SECS` | `86400` |
//! | `START_BALANCE` | `1000` |

use std::env;
use std::time::Duration;

use merch_core::{Coins, START_BALANCE};
use merch_db::DbConfig;
use serde::{Deserialize, Serialize};

const DEV_JWT_SECRET: &str = "merch-shop-dev-secret-change-in-production";

/// Merch shop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: String,

    /// Pool size ceiling
    pub db_max_connections: u32,

    /// Connections kept open
    pub db_min_connections: u32,

    /// Pool acquire timeout in seconds
    pub db_connect_timeout_secs: u64,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Coins granted on first login
    pub start_balance: i64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// `load` passes the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = AppConfig {
            database_path: read("DATABASE_PATH", "./merch.db"),

            db_max_connections: read("DB_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            db_min_connections: read("DB_MIN_CONNECTIONS", "1")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MIN_CONNECTIONS".to_string()))?,

            db_connect_timeout_secs: read("DB_CONNECT_TIMEOUT_SECS", "30")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_CONNECT_TIMEOUT_SECS".to_string()))?,

            // In production, this MUST be set via environment variable
            jwt_secret: read("JWT_SECRET", DEV_JWT_SECRET),

            jwt_lifetime_secs: read("JWT_LIFETIME_SECS", "86400") // 24 hours
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()))?,

            start_balance: lookup("START_BALANCE")
                .map(|raw| raw.parse::<i64>())
                .unwrap_or(Ok(START_BALANCE))
                .map_err(|_| ConfigError::InvalidValue("START_BALANCE".to_string()))?,
        };

        if config.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("DATABASE_PATH".to_string()));
        }
        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if config.db_max_connections == 0 || config.db_min_connections > config.db_max_connections
        {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }
        if config.start_balance <= 0 {
            return Err(ConfigError::NonPositiveStartBalance(config.start_balance));
        }

        Ok(config)
    }

    /// Balance granted to newly registered users.
    pub fn start_balance(&self) -> Coins {
        Coins::new(self.start_balance)
    }

    /// Builds the pool configuration.
    pub fn db_config(&self) -> DbConfig {
        let config = if self.database_path == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.database_path)
                .max_connections(self.db_max_connections)
                .min_connections(self.db_min_connections)
        };
        config.connect_timeout(Duration::from_secs(self.db_connect_timeout_secs))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("START_BALANCE must be positive, got {0}")]
    NonPositiveStartBalance(i64),
}
