//! Command line surface.
//!
//! ```bash
//! merch-shop auth --username alice --password secret
//! merch-shop info --token <TOKEN>
//! merch-shop send-coin --token <TOKEN> --to bob --amount 200
//! merch-shop buy --token <TOKEN> --item t-shirt
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};

use crate::commands::{self, AuthRequest, SendCoinRequest};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "merch-shop", version, about = "Merch shop coin ledger")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in, registering the user on first use. Prints a token.
    Auth {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Show balance, inventory and coin history.
    Info {
        #[arg(long)]
        token: String,
    },

    /// Send coins to another user.
    SendCoin {
        #[arg(long)]
        token: String,
        #[arg(long)]
        to: String,
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,
    },

    /// Buy one unit of a catalog item.
    Buy {
        #[arg(long)]
        token: String,
        #[arg(long)]
        item: String,
    },
}

/// Runs one command and returns its JSON result.
pub async fn execute(state: &AppState, command: Command) -> Result<Value, ApiError> {
    match command {
        Command::Auth { username, password } => {
            to_json(commands::authenticate(state, AuthRequest { username, password }).await?)
        }
        Command::Info { token } => to_json(commands::get_info(state, &token).await?),
        Command::SendCoin { token, to, amount } => {
            let request = SendCoinRequest {
                to_user: to,
                amount,
            };
            commands::send_coin(state, &token, request).await?;
            Ok(json!({ "status": "ok" }))
        }
        Command::Buy { token, item } => {
            commands::buy_item(state, &token, &item).await?;
            Ok(json!({ "status": "ok" }))
        }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send_coin() {
        let cli = Cli::try_parse_from([
            "merch-shop", "send-coin", "--token", "t", "--to", "bob", "--amount", "200",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::SendCoin { ref to, amount: 200, .. } if to == "bob"
        ));
    }

    #[test]
    fn test_negative_amount_reaches_validation() {
        let cli = Cli::try_parse_from([
            "merch-shop", "send-coin", "--token", "t", "--to", "bob", "--amount", "-5",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::SendCoin { amount: -5, .. }));
    }

    #[test]
    fn test_missing_argument() {
        assert!(Cli::try_parse_from(["merch-shop", "buy", "--token", "t"]).is_err());
    }
}
