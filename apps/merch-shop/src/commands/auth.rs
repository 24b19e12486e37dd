//! # Auth Commands

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
}

/// Logs in, registering the user on first use.
pub async fn authenticate(state: &AppState, request: AuthRequest) -> Result<AuthResponse, ApiError> {
    let token = state
        .auth
        .authenticate(&request.username, &request.password)
        .await?;

    info!(username = %request.username, "Token issued");
    Ok(AuthResponse { token })
}
