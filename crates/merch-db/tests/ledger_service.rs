//! End-to-end ledger operations over a file-backed SQLite database.

use std::sync::Arc;

use merch_core::{
    Coins, InventoryEntry, LedgerError, LedgerService, NewUser, ReceivedEntry, SentEntry,
    UnitOfWork, User,
};
use merch_db::{seed_catalog, Database, DbConfig};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    db: Database,
    service: LedgerService,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(DbConfig::new(dir.path().join("merch.db")).max_connections(4))
        .await
        .unwrap();
    seed_catalog(&db).await.unwrap();
    let service = LedgerService::new(Arc::new(db.unit_of_work()));
    Fixture {
        _dir: dir,
        db,
        service,
    }
}

async fn register(db: &Database, name: &str, balance: i64) -> User {
    let uow = db.unit_of_work();
    let mut session = uow.session().await.unwrap();
    let new_user = NewUser {
        name: name.to_string(),
        password_hash: "hash".to_string(),
        balance: Coins::new(balance),
    };
    let user = session.users().create(&new_user).await.unwrap();
    user
}

async fn balance_of(db: &Database, name: &str) -> Coins {
    let uow = db.unit_of_work();
    let mut session = uow.session().await.unwrap();
    let user = session.users().find_by_name(name).await.unwrap().unwrap();
    user.balance
}

async fn transaction_count(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
        .fetch_one(db.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn fresh_user_has_starting_balance_and_empty_history() {
    let fx = fixture().await;
    let alice = register(&fx.db, "alice", 1000).await;

    let info = fx.service.get_info(alice.id).await.unwrap();
    assert_eq!(info.coins, Coins::new(1000));
    assert!(info.inventory.is_empty());
    assert!(info.coin_history.received.is_empty());
    assert!(info.coin_history.sent.is_empty());
}

#[tokio::test]
async fn buy_then_send_scenario() {
    let fx = fixture().await;
    let alice = register(&fx.db, "alice", 1000).await;
    let bob = register(&fx.db, "bob", 1000).await;

    fx.service.buy_item(alice.id, "t-shirt").await.unwrap();
    let info = fx.service.get_info(alice.id).await.unwrap();
    assert_eq!(info.coins, Coins::new(920));
    assert_eq!(
        info.inventory,
        vec![InventoryEntry {
            item_type: "t-shirt".into(),
            quantity: 1
        }]
    );

    fx.service.send_coin(alice.id, "bob", 200).await.unwrap();

    let alice_info = fx.service.get_info(alice.id).await.unwrap();
    assert_eq!(alice_info.coins, Coins::new(720));
    assert_eq!(
        alice_info.coin_history.sent,
        vec![SentEntry {
            to_user: "bob".into(),
            amount: Coins::new(200)
        }]
    );

    let bob_info = fx.service.get_info(bob.id).await.unwrap();
    assert_eq!(bob_info.coins, Coins::new(1200));
    assert_eq!(
        bob_info.coin_history.received,
        vec![ReceivedEntry {
            from_user: "alice".into(),
            amount: Coins::new(200)
        }]
    );
    assert!(bob_info.coin_history.sent.is_empty());
}

#[tokio::test]
async fn repeat_purchase_increments_one_row() {
    let fx = fixture().await;
    let alice = register(&fx.db, "alice", 1000).await;

    fx.service.buy_item(alice.id, "pen").await.unwrap();
    fx.service.buy_item(alice.id, "pen").await.unwrap();

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items WHERE user_id = ?1")
        .bind(alice.id)
        .fetch_one(fx.db.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let info = fx.service.get_info(alice.id).await.unwrap();
    assert_eq!(info.coins, Coins::new(980));
    assert_eq!(info.inventory[0].quantity, 2);
}

#[tokio::test]
async fn overdraft_transfer_changes_nothing() {
    let fx = fixture().await;
    let alice = register(&fx.db, "alice", 100).await;
    register(&fx.db, "bob", 0).await;

    let err = fx.service.send_coin(alice.id, "bob", 101).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

    assert_eq!(balance_of(&fx.db, "alice").await, Coins::new(100));
    assert_eq!(balance_of(&fx.db, "bob").await, Coins::ZERO);
    assert_eq!(transaction_count(&fx.db).await, 0);
}

#[tokio::test]
async fn unaffordable_purchase_changes_nothing() {
    let fx = fixture().await;
    let alice = register(&fx.db, "alice", 499).await;

    let err = fx.service.buy_item(alice.id, "pink-hoody").await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

    let info = fx.service.get_info(alice.id).await.unwrap();
    assert_eq!(info.coins, Coins::new(499));
    assert!(info.inventory.is_empty());
}

#[tokio::test]
async fn self_transfer_and_unknown_targets() {
    let fx = fixture().await;
    let alice = register(&fx.db, "alice", 1000).await;

    assert!(matches!(
        fx.service.send_coin(alice.id, "alice", 5).await,
        Err(LedgerError::SelfTransfer)
    ));
    assert!(matches!(
        fx.service.send_coin(alice.id, "nobody", 5).await,
        Err(LedgerError::UserNotFound(_))
    ));
    assert!(matches!(
        fx.service.buy_item(alice.id, "spaceship").await,
        Err(LedgerError::ItemNotFound(_))
    ));
    assert!(matches!(
        fx.service.get_info(alice.id + 100).await,
        Err(LedgerError::UserNotFound(_))
    ));

    assert_eq!(balance_of(&fx.db, "alice").await, Coins::new(1000));
    assert_eq!(transaction_count(&fx.db).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_cannot_double_spend() {
    let fx = fixture().await;
    let alice = register(&fx.db, "alice", 100).await;
    register(&fx.db, "bob", 0).await;
    register(&fx.db, "carol", 0).await;

    let first = {
        let service = fx.service.clone();
        tokio::spawn(async move { service.send_coin(alice.id, "bob", 60).await })
    };
    let second = {
        let service = fx.service.clone();
        tokio::spawn(async move { service.send_coin(alice.id, "carol", 60).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let ok = results.iter().filter(|r| r.is_ok()).count();
    let insufficient = results
        .iter()
        .filter(|r| matches!(r, Err(LedgerError::InsufficientBalance { .. })))
        .count();

    assert_eq!(ok, 1);
    assert_eq!(insufficient, 1);
    assert_eq!(balance_of(&fx.db, "alice").await, Coins::new(40));
    assert_eq!(transaction_count(&fx.db).await, 1);

    let credited =
        balance_of(&fx.db, "bob").await.amount() + balance_of(&fx.db, "carol").await.amount();
    assert_eq!(credited, 60);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_purchases_spend_exactly_the_balance() {
    let fx = fixture().await;
    let alice = register(&fx.db, "alice", 100).await;

    let mut handles = Vec::new();
    for _ in 0..15 {
        let service = fx.service.clone();
        handles.push(tokio::spawn(async move {
            service.buy_item(alice.id, "socks").await
        }));
    }

    let mut bought = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            bought += 1;
        }
    }

    assert_eq!(bought, 10);
    let info = fx.service.get_info(alice.id).await.unwrap();
    assert_eq!(info.coins, Coins::ZERO);
    assert_eq!(info.inventory[0].quantity, 10);
}
