//! Ledger mutation service.
//!
//! Each mutation runs in exactly one unit-of-work scope. The ledger entry id
//! is the idempotency key, so a replayed request collides on the entry's
//! primary key and surfaces as `DuplicateIdempotencyKey` with no balance change.

use futures::FutureExt;
use moneta_shared::types::TransactionId;
use tracing::{debug, info};

use super::command::{CreditOrDebitCommand, TransferCommand};
use super::error::LedgerError;
use super::ports::UnitOfWork;

/// Applies transfers and credits/debits atomically.
#[derive(Debug, Clone)]
pub struct LedgerService<U> {
    unit_of_work: U,
}

impl<U: UnitOfWork> LedgerService<U> {
    /// Creates a new ledger service.
    pub const fn new(unit_of_work: U) -> Self {
        Self { unit_of_work }
    }

    /// Moves money between two accounts.
    ///
    /// Returns the ledger entry id. A replay returns
    /// `LedgerError::DuplicateIdempotencyKey` carrying the same id.
    pub async fn transfer(&self, command: TransferCommand) -> Result<TransactionId, LedgerError> {
        let id = command.id();
        debug!(transaction_id = %id, from = %command.from(), to = %command.to(), "Applying transfer");

        self.unit_of_work
            .execute(move |repo| async move { repo.transfer(&command).await }.boxed())
            .await?;

        info!(transaction_id = %id, "Transfer committed");
        Ok(id)
    }

    /// Credits (positive amount) or debits (negative amount) one account.
    pub async fn credit_or_debit(
        &self,
        command: CreditOrDebitCommand,
    ) -> Result<TransactionId, LedgerError> {
        let id = command.id();
        debug!(
            transaction_id = %id,
            account_id = %command.account(),
            amount = command.amount(),
            "Applying credit or debit"
        );

        self.unit_of_work
            .execute(move |repo| async move { repo.credit_or_debit(&command).await }.boxed())
            .await?;

        info!(transaction_id = %id, "Credit or debit committed");
        Ok(id)
    }
}
