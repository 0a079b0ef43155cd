//! Storage ports implemented by the database layer.

use async_trait::async_trait;
use futures::future::BoxFuture;
use moneta_shared::types::AccountId;

use super::command::{CreditOrDebitCommand, TransferCommand};
use super::error::LedgerError;
use crate::pagination::QueryPlan;
use crate::query::LedgerRow;

/// Balance-changing operations bound to one atomic scope.
///
/// Implementations translate storage failures into `NotEnoughMoney`,
/// `AccountNotExist`, or `DuplicateIdempotencyKey` and never return raw
/// storage errors.
#[async_trait]
pub trait MoneyRepository: Send + Sync {
    /// Records one ledger entry and moves `amount` from one account to the other.
    async fn transfer(&self, command: &TransferCommand) -> Result<(), LedgerError>;

    /// Records one ledger entry and applies a signed delta to one account.
    async fn credit_or_debit(&self, command: &CreditOrDebitCommand) -> Result<(), LedgerError>;
}

/// Opens one atomic scope per call.
///
/// The job receives a repository bound to the scope. The scope commits when
/// the job returns `Ok` and rolls back otherwise, including when the job
/// panics. Domain conditions come back verbatim; anything else is logged and
/// returned as `LedgerError::Internal`.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Runs `job` inside a fresh atomic scope.
    async fn execute<T, F>(&self, job: F) -> Result<T, LedgerError>
    where
        T: Send,
        F: for<'r> FnOnce(&'r dyn MoneyRepository) -> BoxFuture<'r, Result<T, LedgerError>>
            + Send;
}

/// Read side of the ledger.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Current balance, `None` when the account does not exist.
    async fn balance(&self, account: AccountId) -> Result<Option<i64>, LedgerError>;

    /// Number of entries touching the account, outgoing plus incoming.
    async fn count_transactions(&self, account: AccountId) -> Result<u64, LedgerError>;

    /// Executes a listing plan, returning rows in the plan's output order.
    async fn fetch_transactions(
        &self,
        account: AccountId,
        plan: &QueryPlan,
    ) -> Result<Vec<LedgerRow>, LedgerError>;
}
