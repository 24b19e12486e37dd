//! # Ledger Commands
//!
//! Thin wrappers over [`LedgerService`](merch_core::LedgerService): resolve
//! the caller from the token, delegate, convert the error.

use merch_core::InfoResponse;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::authorize;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of a coin transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCoinRequest {
    pub to_user: String,
    pub amount: i64,
}

/// Balance, inventory and coin history of the caller.
pub async fn get_info(state: &AppState, token: &str) -> Result<InfoResponse, ApiError> {
    let user_id = authorize(state, token)?;
    Ok(state.ledger.get_info(user_id).await?)
}

/// Transfers coins from the caller to `request.to_user`.
pub async fn send_coin(
    state: &AppState,
    token: &str,
    request: SendCoinRequest,
) -> Result<(), ApiError> {
    let user_id = authorize(state, token)?;
    debug!(user_id, to = %request.to_user, amount = request.amount, "send_coin");

    state
        .ledger
        .send_coin(user_id, &request.to_user, request.amount)
        .await?;
    Ok(())
}

/// Buys one unit of `item` for the caller.
pub async fn buy_item(state: &AppState, token: &str, item: &str) -> Result<(), ApiError> {
    let user_id = authorize(state, token)?;
    state.ledger.buy_item(user_id, item).await?;
    Ok(())
}
