//! Object-safe view of the ledger services used by the handlers.

use std::sync::Arc;

use async_trait::async_trait;
use moneta_core::LedgerError;
use moneta_core::currency::{ConvertedAmount, Currency, RateCache, RateProvider};
use moneta_core::ledger::{
    CreditOrDebitCommand, LedgerService, TransactionStore, TransferCommand, UnitOfWork,
};
use moneta_core::query::{ListRequest, QueryService, TransactionPage};
use moneta_shared::types::{AccountId, TransactionId};

/// Ledger operations exposed over HTTP.
#[async_trait]
pub trait MoneyService: Send + Sync {
    /// Moves money between two accounts.
    async fn transfer(&self, command: TransferCommand) -> Result<TransactionId, LedgerError>;

    /// Credits or debits one account.
    async fn credit_or_debit(
        &self,
        command: CreditOrDebitCommand,
    ) -> Result<TransactionId, LedgerError>;

    /// Reads a balance in a display currency.
    async fn get_balance(
        &self,
        account: AccountId,
        currency: Currency,
    ) -> Result<ConvertedAmount, LedgerError>;

    /// Lists one page of an account's history.
    async fn list_transactions(&self, request: ListRequest)
    -> Result<TransactionPage, LedgerError>;
}

/// The write and read services behind one [`MoneyService`].
#[derive(Debug)]
pub struct MoneyServices<U, S, P> {
    ledger: LedgerService<U>,
    queries: QueryService<S, P>,
}

impl<U, S, P> MoneyServices<U, S, P>
where
    U: UnitOfWork,
    S: TransactionStore,
    P: RateProvider,
{
    /// Wires the services over a unit of work, a store and a rate cache.
    pub fn new(unit_of_work: U, store: S, rates: Arc<RateCache<P>>) -> Self {
        Self {
            ledger: LedgerService::new(unit_of_work),
            queries: QueryService::new(store, rates),
        }
    }
}

#[async_trait]
impl<U, S, P> MoneyService for MoneyServices<U, S, P>
where
    U: UnitOfWork,
    S: TransactionStore,
    P: RateProvider,
{
    async fn transfer(&self, command: TransferCommand) -> Result<TransactionId, LedgerError> {
        self.ledger.transfer(command).await
    }

    async fn credit_or_debit(
        &self,
        command: CreditOrDebitCommand,
    ) -> Result<TransactionId, LedgerError> {
        self.ledger.credit_or_debit(command).await
    }

    async fn get_balance(
        &self,
        account: AccountId,
        currency: Currency,
    ) -> Result<ConvertedAmount, LedgerError> {
        self.queries.get_balance(account, currency).await
    }

    async fn list_transactions(
        &self,
        request: ListRequest,
    ) -> Result<TransactionPage, LedgerError> {
        self.queries.list_transactions(request).await
    }
}
