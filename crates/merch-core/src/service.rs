//! # Ledger Service
//!
//! The business-rule layer. Every operation runs inside exactly one scope
//! from the [`UnitOfWork`] and either commits as a whole or rolls back.
//!
//! ## Operation Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Started ──► Validating ──► Mutating ──► Committed                      │
//! │                  │              │                                       │
//! │                  └──────────────┴──► RolledBack (first failure)         │
//! │                                                                         │
//! │  GetInfo   read-only  scope   load user, history, inventory             │
//! │  SendCoin  read-write scope   debit, credit, append Transaction         │
//! │  BuyItem   read-write scope   debit, upsert-increment inventory         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Argument checks (amount, item name) happen before a scope is opened.
//! The service holds no locks of its own; concurrent callers on the same
//! balance are serialized by the store's read-write scopes.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::coins::Coins;
use crate::error::{LedgerError, LedgerResult};
use crate::store::{IsolationLevel, TransactionScope, TxOptions, UnitOfWork};
use crate::types::{CoinHistory, InfoResponse, NewTransaction, UserId};
use crate::validation::{validate_amount, validate_item_name};

// =============================================================================
// Service
// =============================================================================

/// Balance-changing operations over a [`UnitOfWork`].
#[derive(Clone)]
pub struct LedgerService {
    uow: Arc<dyn UnitOfWork>,
}

impl LedgerService {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }

    /// Balance, inventory and coin history of `user_id`.
    #[instrument(skip(self))]
    pub async fn get_info(&self, user_id: UserId) -> LedgerResult<InfoResponse> {
        let mut scope = self
            .uow
            .begin_transaction(TxOptions::read_only(IsolationLevel::RepeatableRead))
            .await?;
        let outcome = load_info(scope.as_mut(), user_id).await;
        finish(scope, outcome).await
    }

    /// Moves `amount` coins from `from` to the user named `to_name`.
    #[instrument(skip(self))]
    pub async fn send_coin(&self, from: UserId, to_name: &str, amount: i64) -> LedgerResult<()> {
        let amount = validate_amount(amount)?;

        let mut scope = self
            .uow
            .begin_transaction(TxOptions::read_write(IsolationLevel::RepeatableRead))
            .await?;
        let outcome = transfer(scope.as_mut(), from, to_name, amount).await;
        finish(scope, outcome).await
    }

    /// Spends the item's price from `user_id` and adds one unit to their inventory.
    #[instrument(skip(self))]
    pub async fn buy_item(&self, user_id: UserId, item_name: &str) -> LedgerResult<()> {
        validate_item_name(item_name)?;

        let mut scope = self
            .uow
            .begin_transaction(TxOptions::read_write(IsolationLevel::RepeatableRead))
            .await?;
        let outcome = purchase(scope.as_mut(), user_id, item_name).await;
        finish(scope, outcome).await
    }
}

// =============================================================================
// Operation Bodies
// =============================================================================

async fn load_info(scope: &mut dyn TransactionScope, user_id: UserId) -> LedgerResult<InfoResponse> {
    let user = scope
        .users()
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;

    let sent = scope.ledger().list_outgoing(user_id).await?;
    let received = scope.ledger().list_incoming(user_id).await?;
    let inventory = scope.ledger().list_inventory(user_id).await?;

    debug!(
        sent = sent.len(),
        received = received.len(),
        inventory = inventory.len(),
        "Loaded account state"
    );

    Ok(InfoResponse {
        coins: user.balance,
        inventory: inventory.into_iter().map(Into::into).collect(),
        coin_history: CoinHistory {
            received: received.into_iter().map(Into::into).collect(),
            sent: sent.into_iter().map(Into::into).collect(),
        },
    })
}

async fn transfer(
    scope: &mut dyn TransactionScope,
    from: UserId,
    to_name: &str,
    amount: Coins,
) -> LedgerResult<()> {
    let mut sender = scope
        .users()
        .find_by_id(from)
        .await?
        .ok_or_else(|| LedgerError::UserNotFound(from.to_string()))?;

    let mut receiver = scope
        .users()
        .find_by_name(to_name)
        .await?
        .ok_or_else(|| LedgerError::UserNotFound(to_name.to_string()))?;

    if receiver.id == sender.id {
        return Err(LedgerError::SelfTransfer);
    }

    sender.balance = sender
        .balance
        .checked_debit(amount)
        .ok_or(LedgerError::InsufficientBalance {
            available: sender.balance,
            required: amount,
        })?;
    receiver.balance = receiver
        .balance
        .checked_credit(amount)
        .ok_or(LedgerError::BalanceOverflow)?;

    scope.users().update(&sender).await?;
    scope.users().update(&receiver).await?;
    scope
        .ledger()
        .create_transaction(&NewTransaction {
            from_id: sender.id,
            to_id: receiver.id,
            amount,
        })
        .await?;

    info!(
        to_id = receiver.id,
        sender_balance = %sender.balance,
        "Coins transferred"
    );
    Ok(())
}

async fn purchase(
    scope: &mut dyn TransactionScope,
    user_id: UserId,
    item_name: &str,
) -> LedgerResult<()> {
    let mut user = scope
        .users()
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;

    let item = scope
        .ledger()
        .find_item_by_name(item_name)
        .await?
        .ok_or_else(|| LedgerError::ItemNotFound(item_name.to_string()))?;

    user.balance = user
        .balance
        .checked_debit(item.price)
        .ok_or(LedgerError::InsufficientBalance {
            available: user.balance,
            required: item.price,
        })?;

    scope.users().update(&user).await?;
    scope.ledger().add_inventory_item(user.id, item.id).await?;

    info!(item_id = item.id, price = %item.price, balance = %user.balance, "Item purchased");
    Ok(())
}

/// Commits on success; rolls back on failure and returns the original error.
async fn finish<T: Send>(
    scope: Box<dyn TransactionScope>,
    outcome: LedgerResult<T>,
) -> LedgerResult<T> {
    match outcome {
        Ok(value) => {
            scope.commit().await?;
            Ok(value)
        }
        Err(err) => {
            // Storage failures are logged where they are mapped for the caller.
            if err.is_business_error() {
                warn!(code = err.error_code(), error = %err, "Operation rejected");
            }
            if let Err(rollback_err) = scope.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
