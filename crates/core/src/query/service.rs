//! Balance reads and transaction history listings.

use std::sync::Arc;

use chrono::Utc;
use moneta_shared::types::AccountId;
use tracing::debug;

use super::types::{ListRequest, Transaction, TransactionPage};
use crate::currency::{ConvertedAmount, Currency, RateCache, RateProvider};
use crate::ledger::{LedgerError, TransactionStore};
use crate::pagination::{Window, strategy_for};

/// Read-side service over a [`TransactionStore`].
#[derive(Debug)]
pub struct QueryService<S, P> {
    store: S,
    rates: Arc<RateCache<P>>,
}

impl<S, P> QueryService<S, P>
where
    S: TransactionStore,
    P: RateProvider,
{
    /// Creates a new query service.
    pub const fn new(store: S, rates: Arc<RateCache<P>>) -> Self {
        Self { store, rates }
    }

    /// Returns an account's balance in `currency`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account does not exist
    /// - `FailedConvert` if a non-base currency cannot be converted
    pub async fn get_balance(
        &self,
        account: AccountId,
        currency: Currency,
    ) -> Result<ConvertedAmount, LedgerError> {
        let balance = self
            .store
            .balance(account)
            .await?
            .ok_or(LedgerError::NotFound)?;

        self.rates.convert(balance, currency).await
    }

    /// Returns one page of an account's history.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCursor` for an undecodable cursor, or the store's error.
    pub async fn list_transactions(
        &self,
        request: ListRequest,
    ) -> Result<TransactionPage, LedgerError> {
        let strategy = strategy_for(request.sort.field);
        let plan = strategy.plan(request.sort, &request.cursor, request.limit, Utc::now())?;

        let rows = self.store.fetch_transactions(request.account, &plan).await?;
        let total = self.store.count_transactions(request.account).await?;

        let window = Window::from_timestamps(rows.iter().map(|row| row.created_at));
        let page = strategy.derive_page(&plan, window, total);
        debug!(
            account_id = %request.account,
            rows = rows.len(),
            total,
            current = page.current,
            "Listed transactions"
        );

        Ok(TransactionPage {
            transactions: rows.into_iter().map(Transaction::from).collect(),
            page,
            count_item: total,
        })
    }
}
