//! Postgres unit of work.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use moneta_core::ledger::{LedgerError, MoneyRepository, UnitOfWork};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{error, warn};

use super::money::SeaMoneyRepository;

/// Runs each job in its own database transaction.
///
/// The transaction commits when the job returns `Ok` and rolls back
/// otherwise. A job that outlives the mutation timeout is abandoned; dropping
/// the open transaction rolls it back. Unexpected failures are logged here
/// and nowhere further up.
#[derive(Debug, Clone)]
pub struct SeaUnitOfWork {
    db: DatabaseConnection,
    timeout: Duration,
}

impl SeaUnitOfWork {
    /// Creates a new unit of work.
    #[must_use]
    pub const fn new(db: DatabaseConnection, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    async fn run<T, F>(&self, job: F) -> Result<T, LedgerError>
    where
        T: Send,
        F: for<'r> FnOnce(&'r dyn MoneyRepository) -> BoxFuture<'r, Result<T, LedgerError>>
            + Send,
    {
        let txn = self.db.begin().await.map_err(LedgerError::internal)?;

        let outcome = {
            let scope = SeaMoneyRepository::new(&txn);
            let repo: &dyn MoneyRepository = &scope;
            AssertUnwindSafe(job(repo))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(LedgerError::internal("mutation panicked")))
        };

        match outcome {
            Ok(value) => {
                txn.commit().await.map_err(LedgerError::internal)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(e) = txn.rollback().await {
                    warn!(error = %e, "Failed to roll back transaction");
                }
                Err(err)
            }
        }
    }
}

#[async_trait]
impl UnitOfWork for SeaUnitOfWork {
    async fn execute<T, F>(&self, job: F) -> Result<T, LedgerError>
    where
        T: Send,
        F: for<'r> FnOnce(&'r dyn MoneyRepository) -> BoxFuture<'r, Result<T, LedgerError>>
            + Send,
    {
        let result = tokio::time::timeout(self.timeout, self.run(job))
            .await
            .unwrap_or_else(|_| Err(LedgerError::internal("mutation timed out")));

        if let Err(err) = &result
            && !err.is_domain()
        {
            error!(
                error = %err,
                timeout_ms = self.timeout.as_millis(),
                "Mutation failed, transaction rolled back"
            );
        }
        result
    }
}
