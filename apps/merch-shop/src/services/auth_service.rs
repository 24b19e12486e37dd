//! Registration and login.
//!
//! The first successful `authenticate` for a name creates the user with the
//! configured starting balance. Later calls must present the same password.
//!
//! ```text
//! authenticate(name, password)
//!      │  validate name / password
//!      ▼
//! session ── find_by_name ──┬── Some(user) ── verify hash ── token
//!                           │
//!                           └── None ── hash (no scope open)
//!                                          │
//!                                          ▼
//!                           read-write scope ── create ── commit ── token
//!                                          │
//!                           Conflict (racing first login)
//!                                          └── rollback, re-read, verify
//! ```
//!
//! Hashing and verification run with no scope open. The read-write scope
//! covers only the insert.

use std::sync::Arc;

use merch_core::validation::{validate_password, validate_username};
use merch_core::{Coins, IsolationLevel, LedgerError, NewUser, TxOptions, UnitOfWork, User};
use tracing::{info, instrument, warn};

use crate::auth::{hash_password, verify_password, AuthError, JwtManager};

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    uow: Arc<dyn UnitOfWork>,
    jwt: JwtManager,
    start_balance: Coins,
}

impl AuthService {
    /// Create a new authentication service.
    pub fn new(uow: Arc<dyn UnitOfWork>, jwt: JwtManager, start_balance: Coins) -> Self {
        AuthService {
            uow,
            jwt,
            start_balance,
        }
    }

    /// Log in (registering on first use) and issue a token.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, AuthError> {
        validate_username(username).map_err(LedgerError::from)?;
        validate_password(password).map_err(LedgerError::from)?;

        let user = match self.find_user(username).await? {
            Some(user) => check_password(user, password).await?,
            None => self.register(username, password).await?,
        };

        self.jwt.generate_token(user.id)
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AuthError> {
        let mut session = self.uow.session().await?;
        let user = session.users().find_by_name(username).await?;
        Ok(user)
    }

    async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let new_user = NewUser {
            name: username.to_string(),
            password_hash: hash_blocking(password).await?,
            balance: self.start_balance,
        };

        let mut scope = self
            .uow
            .begin_transaction(TxOptions::read_write(IsolationLevel::RepeatableRead))
            .await?;
        let created = scope.users().create(&new_user).await;

        match created {
            Ok(user) => {
                scope.commit().await?;
                info!(user_id = user.id, balance = %user.balance, "User registered");
                Ok(user)
            }
            Err(LedgerError::Conflict(_)) => {
                if let Err(rollback_err) = scope.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                let user = self
                    .find_user(username)
                    .await?
                    .ok_or_else(|| LedgerError::UserNotFound(username.to_string()))?;
                check_password(user, password).await
            }
            Err(err) => {
                if let Err(rollback_err) = scope.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err.into())
            }
        }
    }
}

async fn check_password(user: User, password: &str) -> Result<User, AuthError> {
    let password = password.to_string();
    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?;

    if matches {
        Ok(user)
    } else {
        warn!(user_id = user.id, "Password mismatch");
        Err(AuthError::InvalidCredentials)
    }
}

async fn hash_blocking(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use merch_core::memory::MemoryStore;

    fn service(store: &MemoryStore) -> (AuthService, JwtManager) {
        let jwt = JwtManager::new("test-secret", 3600);
        let service = AuthService::new(Arc::new(store.clone()), jwt.clone(), Coins::new(1000));
        (service, jwt)
    }

    #[tokio::test]
    async fn test_first_login_registers() {
        let store = MemoryStore::new();
        let (auth, jwt) = service(&store);

        let token = auth.authenticate("alice", "pw").await.unwrap();

        let alice = store.user_by_name("alice").await.unwrap();
        assert_eq!(jwt.validate_token(&token).unwrap(), alice.id);
        assert_eq!(alice.balance, Coins::new(1000));
        assert_ne!(alice.password_hash, "pw");
    }

    #[tokio::test]
    async fn test_second_login_reuses_account() {
        let store = MemoryStore::new();
        let (auth, jwt) = service(&store);

        let first = auth.authenticate("alice", "pw").await.unwrap();
        let second = auth.authenticate("alice", "pw").await.unwrap();

        assert_eq!(
            jwt.validate_token(&first).unwrap(),
            jwt.validate_token(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let store = MemoryStore::new();
        let (auth, _) = service(&store);

        auth.authenticate("alice", "pw").await.unwrap();
        let err = auth.authenticate("alice", "nope").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_invalid_input_creates_nothing() {
        let store = MemoryStore::new();
        let (auth, _) = service(&store);

        for (name, password) in [("", "pw"), ("al ice", "pw"), ("alice", "")] {
            let err = auth.authenticate(name, password).await.unwrap_err();
            assert!(matches!(err, AuthError::Ledger(LedgerError::Validation(_))));
        }
        assert!(store.user_by_name("alice").await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_logins_create_one_user() {
        let store = MemoryStore::new();
        let (auth, jwt) = service(&store);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let auth = auth.clone();
            handles.push(tokio::spawn(async move {
                auth.authenticate("bob", "pw").await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            ids.push(jwt.validate_token(&token).unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }
}
