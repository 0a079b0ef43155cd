//! Postgres integration tests for the money repository, the unit of work
//! and the history query engine.
//!
//! Skipped when `DATABASE_URL` is not set.

#![allow(clippy::items_after_statements)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;
use moneta_core::currency::{Currency, RateCache};
use moneta_core::ledger::{
    CreditOrDebitCommand, LedgerError, LedgerService, TransferCommand, UnitOfWork,
};
use moneta_core::pagination::Cursor;
use moneta_core::query::{ListRequest, QueryService, TransactionPage};
use moneta_core::testing::StaticRates;
use moneta_db::entities::{account, financial_transaction};
use moneta_db::migration::{Migrator, MigratorTrait};
use moneta_db::{SeaUnitOfWork, TransactionQueryRepository};
use moneta_shared::types::{
    AccountId, Limit, SortDirection, SortField, SortSpec, TransactionId,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
use tokio::sync::OnceCell;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

async fn connect() -> Option<DatabaseConnection> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let db = Database::connect(&url)
        .await
        .expect("Failed to connect to database");
    MIGRATED
        .get_or_init(|| async {
            Migrator::up(&db, None).await.expect("Failed to migrate");
        })
        .await;
    Some(db)
}

async fn open_account(db: &DatabaseConnection, balance: i64) -> AccountId {
    let id = AccountId::new();
    account::ActiveModel {
        id: Set(id.into_inner()),
        balance: Set(balance),
    }
    .insert(db)
    .await
    .expect("Failed to create account");
    id
}

async fn balance_of(db: &DatabaseConnection, id: AccountId) -> i64 {
    account::Entity::find_by_id(id.into_inner())
        .one(db)
        .await
        .unwrap()
        .expect("account exists")
        .balance
}

fn ledger(db: &DatabaseConnection) -> LedgerService<SeaUnitOfWork> {
    LedgerService::new(SeaUnitOfWork::new(db.clone(), Duration::from_secs(10)))
}

fn transfer(key: Option<&str>, from: AccountId, to: AccountId, amount: i64) -> TransferCommand {
    TransferCommand::new(key, &from.to_string(), &to.to_string(), amount, "test").unwrap()
}

#[tokio::test]
async fn test_transfer_moves_money_and_records_entry() {
    let Some(db) = connect().await else { return };
    let alice = open_account(&db, 500).await;
    let bob = open_account(&db, 0).await;

    let id = ledger(&db)
        .transfer(transfer(None, alice, bob, 120))
        .await
        .unwrap();

    assert_eq!(balance_of(&db, alice).await, 380);
    assert_eq!(balance_of(&db, bob).await, 120);
    let entry = financial_transaction::Entity::find_by_id(id.into_inner())
        .one(&db)
        .await
        .unwrap()
        .expect("entry stored");
    assert_eq!(entry.amount, 120);
    assert_eq!(entry.from_id, Some(alice.into_inner()));
    assert_eq!(entry.to_id, Some(bob.into_inner()));
}

#[tokio::test]
async fn test_replayed_key_is_reported_and_changes_nothing() {
    let Some(db) = connect().await else { return };
    let alice = open_account(&db, 500).await;
    let bob = open_account(&db, 0).await;
    let key = uuid::Uuid::new_v4().to_string();
    let service = ledger(&db);

    let id = service
        .transfer(transfer(Some(&key), alice, bob, 100))
        .await
        .unwrap();
    let replay = service.transfer(transfer(Some(&key), alice, bob, 100)).await;

    assert!(matches!(replay, Err(LedgerError::DuplicateIdempotencyKey(replayed)) if replayed == id));
    assert_eq!(balance_of(&db, alice).await, 400);
    assert_eq!(balance_of(&db, bob).await, 100);
}

#[tokio::test]
async fn test_overdraft_rolls_back_entry() {
    let Some(db) = connect().await else { return };
    let alice = open_account(&db, 50).await;
    let bob = open_account(&db, 0).await;

    let command = transfer(None, alice, bob, 51);
    let id = command.id();
    let result = ledger(&db).transfer(command).await;

    assert!(matches!(result, Err(LedgerError::NotEnoughMoney)));
    assert_eq!(balance_of(&db, alice).await, 50);
    let entry = financial_transaction::Entity::find_by_id(id.into_inner())
        .one(&db)
        .await
        .unwrap();
    assert!(entry.is_none());
}

async fn entry_exists(db: &DatabaseConnection, id: TransactionId) -> bool {
    financial_transaction::Entity::find_by_id(id.into_inner())
        .one(db)
        .await
        .unwrap()
        .is_some()
}

#[tokio::test]
async fn test_panicking_job_rolls_back() {
    let Some(db) = connect().await else { return };
    let alice = open_account(&db, 500).await;
    let bob = open_account(&db, 0).await;
    let command = transfer(None, alice, bob, 200);
    let id = command.id();

    let uow = SeaUnitOfWork::new(db.clone(), Duration::from_secs(10));
    let result = uow
        .execute(move |repo| {
            async move {
                let written = repo.transfer(&command).await;
                if written.is_ok() {
                    panic!("job failed after writing");
                }
                written
            }
            .boxed()
        })
        .await;

    assert!(matches!(result, Err(LedgerError::Internal(_))));
    assert_eq!(balance_of(&db, alice).await, 500);
    assert_eq!(balance_of(&db, bob).await, 0);
    assert!(!entry_exists(&db, id).await);
}

#[tokio::test]
async fn test_slow_job_is_abandoned_after_timeout() {
    let Some(db) = connect().await else { return };
    let alice = open_account(&db, 500).await;
    let bob = open_account(&db, 0).await;
    let command = transfer(None, alice, bob, 200);
    let id = command.id();

    let uow = SeaUnitOfWork::new(db.clone(), Duration::from_millis(50));
    let result = uow
        .execute(move |repo| {
            async move {
                let written = repo.transfer(&command).await;
                tokio::time::sleep(Duration::from_secs(2)).await;
                written
            }
            .boxed()
        })
        .await;

    assert!(matches!(result, Err(LedgerError::Internal(_))));
    assert_eq!(balance_of(&db, alice).await, 500);
    assert!(!entry_exists(&db, id).await);
}

#[tokio::test]
async fn test_unknown_account_is_rejected() {
    let Some(db) = connect().await else { return };
    let alice = open_account(&db, 500).await;

    let result = ledger(&db)
        .transfer(transfer(None, alice, AccountId::new(), 10))
        .await;

    assert!(matches!(result, Err(LedgerError::AccountNotExist)));
    assert_eq!(balance_of(&db, alice).await, 500);
}

#[tokio::test]
async fn test_credit_and_debit() {
    let Some(db) = connect().await else { return };
    let alice = open_account(&db, 100).await;
    let service = ledger(&db);
    let command = |amount| {
        CreditOrDebitCommand::new(None, &alice.to_string(), amount, "external").unwrap()
    };

    service.credit_or_debit(command(-40)).await.unwrap();
    service.credit_or_debit(command(15)).await.unwrap();
    let overdraft = service.credit_or_debit(command(-500)).await;

    assert!(matches!(overdraft, Err(LedgerError::NotEnoughMoney)));
    assert_eq!(balance_of(&db, alice).await, 75);
}

#[tokio::test]
async fn test_concurrent_transfers_never_overdraw() {
    let Some(db) = connect().await else { return };
    let alice = open_account(&db, 100).await;
    let bob = open_account(&db, 0).await;
    let service = Arc::new(ledger(&db));

    let attempts = (0..10).map(|_| {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.transfer(transfer(None, alice, bob, 30)).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let committed = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(committed, 3);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, LedgerError::NotEnoughMoney))
    );
    assert_eq!(balance_of(&db, alice).await, 10);
    assert_eq!(balance_of(&db, bob).await, 90);
}

#[tokio::test]
async fn test_opposite_transfers_do_not_deadlock() {
    let Some(db) = connect().await else { return };
    let alice = open_account(&db, 1_000).await;
    let bob = open_account(&db, 1_000).await;
    let service = Arc::new(ledger(&db));

    let attempts = (0..20).map(|n| {
        let service = Arc::clone(&service);
        let (from, to) = if n % 2 == 0 { (alice, bob) } else { (bob, alice) };
        tokio::spawn(async move { service.transfer(transfer(None, from, to, 10)).await })
    });
    for result in join_all(attempts).await {
        result.unwrap().unwrap();
    }

    assert_eq!(balance_of(&db, alice).await, 1_000);
    assert_eq!(balance_of(&db, bob).await, 1_000);
}

fn descriptions(page: &TransactionPage) -> Vec<String> {
    page.transactions
        .iter()
        .map(|t| t.description.clone())
        .collect()
}

#[tokio::test]
async fn test_history_walks_forward_and_back() {
    let Some(db) = connect().await else { return };
    let alice = open_account(&db, 1_000).await;
    let bob = open_account(&db, 0).await;
    let service = ledger(&db);
    for n in 1..=5 {
        let command = TransferCommand::new(
            None,
            &alice.to_string(),
            &bob.to_string(),
            n * 10,
            format!("t{n}"),
        )
        .unwrap();
        service.transfer(command).await.unwrap();
    }

    let rates = Arc::new(RateCache::new(
        StaticRates::default(),
        Duration::from_secs(600),
    ));
    let queries = QueryService::new(TransactionQueryRepository::new(db.clone()), rates);

    for field in [SortField::ByDate, SortField::ByAmount] {
        let request = |cursor| ListRequest {
            account: alice,
            sort: SortSpec::new(field, SortDirection::Desc),
            cursor,
            limit: Limit::new(2).unwrap(),
        };

        let mut forward = Vec::new();
        let mut cursor = Cursor::empty();
        let last = loop {
            let page = queries.list_transactions(request(cursor)).await.unwrap();
            assert_eq!(page.count_item, 5);
            forward.push(descriptions(&page));
            if page.page.next.is_empty() {
                break page;
            }
            cursor = page.page.next;
        };
        assert_eq!(forward.concat(), ["t5", "t4", "t3", "t2", "t1"]);

        let mut backward = vec![descriptions(&last)];
        let mut cursor = last.page.previous;
        while !cursor.is_empty() {
            let page = queries.list_transactions(request(cursor)).await.unwrap();
            backward.push(descriptions(&page));
            cursor = page.page.previous;
        }
        forward.reverse();
        assert_eq!(backward, forward, "sort field {field:?}");
    }

    let received = queries
        .list_transactions(ListRequest {
            account: bob,
            sort: SortSpec::default(),
            cursor: Cursor::empty(),
            limit: Limit::new(30).unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(received.transactions.len(), 5);
    assert!(received.transactions.iter().all(|t| t.amount > 0));
    assert!(
        received
            .transactions
            .iter()
            .all(|t| t.counterparty == Some(alice))
    );

    let balance = queries.get_balance(bob, Currency::Rub).await.unwrap();
    assert_eq!(balance.amount, Decimal::from(150));
}
