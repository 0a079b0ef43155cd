//! Postgres storage for the ledger.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for accounts and ledger entries
//! - The schema migration
//! - The transactional money repository and its unit of work
//! - The transaction history query engine

pub mod entities;
mod error;
pub mod migration;
pub mod repositories;

pub use repositories::{SeaMoneyRepository, SeaUnitOfWork, TransactionQueryRepository};

use std::time::Duration;

use moneta_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool sized from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .sqlx_logging(false);

    Database::connect(options).await
}
