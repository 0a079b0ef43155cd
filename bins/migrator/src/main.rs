//! Schema migration runner for the Moneta ledger.
//!
//! Usage:
//!   migrator up      - Apply pending migrations
//!   migrator down    - Revert the last migration
//!   migrator status  - List applied and pending migrations
//!   migrator fresh   - Drop every table and migrate from scratch
//!
//! The connection string is read from `DATABASE_URL` (or `-u <url>`), the
//! same value the server takes from `MONETA__DATABASE__URL`.

use moneta_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The CLI installs its own tracing subscriber.
    cli::run_cli(Migrator).await;
}
