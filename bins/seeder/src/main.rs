//! Database seeder for Moneta development and testing.
//!
//! Creates three demo accounts and a short transfer history, enough to page
//! through by date and by amount. Every id is fixed, so running the seeder
//! twice changes nothing.
//!
//! Usage: cargo run --bin seeder

use std::time::Duration;

use anyhow::Context;
use moneta_core::ledger::{LedgerError, LedgerService, TransferCommand};
use moneta_db::entities::account;
use moneta_db::migration::{Migrator, MigratorTrait};
use moneta_db::SeaUnitOfWork;
use moneta_shared::AppConfig;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

/// Demo accounts and their opening balances, in kopecks.
const ACCOUNTS: [(&str, i64); 3] = [
    ("00000000-0000-0000-0000-00000000a001", 1_000_000),
    ("00000000-0000-0000-0000-00000000a002", 250_000),
    ("00000000-0000-0000-0000-00000000a003", 0),
];

/// History as (idempotency key, from index, to index, amount, description).
const TRANSFERS: [(&str, usize, usize, i64, &str); 7] = [
    ("00000000-0000-0000-0000-00000000b001", 0, 1, 15_000, "Dinner split"),
    ("00000000-0000-0000-0000-00000000b002", 0, 2, 120_000, "Rent share"),
    ("00000000-0000-0000-0000-00000000b003", 1, 2, 4_500, "Coffee"),
    ("00000000-0000-0000-0000-00000000b004", 2, 0, 30_000, "Concert tickets"),
    ("00000000-0000-0000-0000-00000000b005", 0, 1, 250, "Parking"),
    ("00000000-0000-0000-0000-00000000b006", 1, 0, 80_000, "Loan repayment"),
    ("00000000-0000-0000-0000-00000000b007", 2, 1, 9_900, "Books"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = moneta_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("Failed to apply migrations")?;

    println!("Seeding accounts...");
    seed_accounts(&db).await?;

    println!("Seeding transfers...");
    seed_transfers(&db).await?;

    println!("Seeding complete!");
    Ok(())
}

/// Creates the demo accounts that do not exist yet.
async fn seed_accounts(db: &DatabaseConnection) -> anyhow::Result<()> {
    for (id, balance) in ACCOUNTS {
        let id = Uuid::parse_str(id)?;
        if account::Entity::find_by_id(id).one(db).await?.is_some() {
            println!("  Account {id} already exists, skipping...");
            continue;
        }

        account::ActiveModel {
            id: Set(id),
            balance: Set(balance),
        }
        .insert(db)
        .await?;
        println!("  Created account {id} with balance {balance}");
    }
    Ok(())
}

/// Replays the demo history. Already applied transfers come back as
/// duplicates and are skipped.
async fn seed_transfers(db: &DatabaseConnection) -> anyhow::Result<()> {
    let ledger = LedgerService::new(SeaUnitOfWork::new(db.clone(), Duration::from_secs(10)));

    for (key, from, to, amount, description) in TRANSFERS {
        let command = TransferCommand::new(
            Some(key),
            ACCOUNTS[from].0,
            ACCOUNTS[to].0,
            amount,
            description,
        )?;

        match ledger.transfer(command).await {
            Ok(id) => println!("  {description}: {id}"),
            Err(LedgerError::DuplicateIdempotencyKey(_)) => {
                println!("  {description} already applied, skipping...");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
