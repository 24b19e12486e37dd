//! # Commands Module
//!
//! The four user-facing operations. Each takes `&AppState`, checks the token
//! first (except `authenticate`) and returns `Result<T, ApiError>`.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports, token check)
//! ├── auth.rs     ◄─── authenticate
//! └── ledger.rs   ◄─── get_info, send_coin, buy_item
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Command Flow                                    │
//! │                                                                         │
//! │  merch-shop send-coin --token T --to bob --amount 200                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  send_coin(&state, "T", SendCoinRequest { to_user, amount })            │
//! │         │                                                               │
//! │         ├── authorize("T") ──► JwtManager::validate_token ──► user id   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  LedgerService::send_coin(user id, "bob", 200)                          │
//! │         │                                                               │
//! │         │ (JSON serialization)                                          │
//! │         ▼                                                               │
//! │  stdout: {"status":"ok"}   or   {"code":"...","message":"..."}          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod ledger;

pub use auth::{authenticate, AuthRequest, AuthResponse};
pub use ledger::{buy_item, get_info, send_coin, SendCoinRequest};

use merch_core::UserId;

use crate::auth::extract_bearer_token;
use crate::error::ApiError;
use crate::state::AppState;

/// Resolves a token (with or without `Bearer `) to the caller's user id.
pub(crate) fn authorize(state: &AppState, token: &str) -> Result<UserId, ApiError> {
    let token = extract_bearer_token(token).ok_or_else(|| ApiError::unauthorized("Missing token"))?;
    Ok(state.jwt.validate_token(token)?)
}
