//! In-memory implementations of the storage ports, for tests.
//!
//! [`InMemoryLedger`] mirrors the Postgres adapter's contract: the entry is
//! inserted before balances move, a duplicate id is reported before anything
//! else, unknown accounts fail the insert, and a negative balance fails the
//! scope. Scopes are serialized and applied to a working copy that is only
//! published on success.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use moneta_shared::types::{AccountId, SortDirection, TransactionId};
use rust_decimal::Decimal;

use crate::currency::{Currency, RateProvider, RateProviderError, RateTable};
use crate::ledger::{
    CreditOrDebitCommand, LedgerError, MoneyRepository, TransactionStore, TransferCommand,
    UnitOfWork,
};
use crate::pagination::QueryPlan;
use crate::query::{LedgerRow, NO_COUNTERPARTY};

#[derive(Debug, Clone)]
struct StoredEntry {
    id: TransactionId,
    description: String,
    amount: i64,
    from: Option<AccountId>,
    to: Option<AccountId>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    accounts: BTreeMap<AccountId, i64>,
    entries: Vec<StoredEntry>,
    ticks: i64,
}

impl LedgerState {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
            + Duration::seconds(self.ticks)
    }

    fn insert_entry(
        &mut self,
        id: TransactionId,
        description: &str,
        amount: i64,
        from: Option<AccountId>,
        to: Option<AccountId>,
    ) -> Result<(), LedgerError> {
        if self.entries.iter().any(|entry| entry.id == id) {
            return Err(LedgerError::DuplicateIdempotencyKey(id));
        }
        if [from, to]
            .into_iter()
            .flatten()
            .any(|account| !self.accounts.contains_key(&account))
        {
            return Err(LedgerError::AccountNotExist);
        }
        let created_at = self.next_timestamp();
        self.entries.push(StoredEntry {
            id,
            description: description.to_string(),
            amount,
            from,
            to,
            created_at,
        });
        Ok(())
    }

    fn apply(&mut self, account: AccountId, delta: i64) -> Result<(), LedgerError> {
        let balance = self
            .accounts
            .get_mut(&account)
            .ok_or(LedgerError::AccountNotExist)?;
        let updated = balance
            .checked_add(delta)
            .ok_or_else(|| LedgerError::internal("balance overflow"))?;
        if updated < 0 {
            return Err(LedgerError::NotEnoughMoney);
        }
        *balance = updated;
        Ok(())
    }

    fn rows_for(&self, account: AccountId) -> Vec<LedgerRow> {
        let outgoing = self
            .entries
            .iter()
            .filter(|entry| entry.from == Some(account))
            .map(|entry| Self::row(entry, entry.to, true));
        let incoming = self
            .entries
            .iter()
            .filter(|entry| entry.to == Some(account))
            .map(|entry| Self::row(entry, entry.from, false));
        outgoing.chain(incoming).collect()
    }

    fn row(entry: &StoredEntry, counterparty: Option<AccountId>, is_debit: bool) -> LedgerRow {
        LedgerRow {
            id: entry.id,
            description: entry.description.clone(),
            amount: entry.amount,
            counterparty: counterparty.map_or(NO_COUNTERPARTY, AccountId::into_inner),
            created_at: entry.created_at,
            is_debit,
        }
    }
}

fn sort_by_time(rows: &mut [LedgerRow], direction: SortDirection) {
    rows.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    if direction == SortDirection::Desc {
        rows.reverse();
    }
}

/// Shared in-memory ledger implementing [`UnitOfWork`] and [`TransactionStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
    scope: Arc<tokio::sync::Mutex<()>>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens an account with a starting balance.
    pub fn open_account(&self, balance: i64) -> AccountId {
        let id = AccountId::new();
        self.lock().accounts.insert(id, balance);
        id
    }

    /// Current balance of an account.
    #[must_use]
    pub fn balance_of(&self, account: AccountId) -> Option<i64> {
        self.lock().accounts.get(&account).copied()
    }

    /// Number of stored ledger entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns true if an entry with this id exists.
    #[must_use]
    pub fn has_entry(&self, id: TransactionId) -> bool {
        self.lock().entries.iter().any(|entry| entry.id == id)
    }
}

/// Repository bound to one in-memory scope.
struct MemoryScope {
    working: Mutex<LedgerState>,
}

impl MemoryScope {
    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.working.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MoneyRepository for MemoryScope {
    async fn transfer(&self, command: &TransferCommand) -> Result<(), LedgerError> {
        let mut state = self.lock();
        state.insert_entry(
            command.id(),
            command.description(),
            command.amount(),
            Some(command.from()),
            Some(command.to()),
        )?;
        let mut deltas = [
            (command.from(), -command.amount()),
            (command.to(), command.amount()),
        ];
        deltas.sort_by_key(|(account, _)| *account);
        for (account, delta) in deltas {
            state.apply(account, delta)?;
        }
        Ok(())
    }

    async fn credit_or_debit(&self, command: &CreditOrDebitCommand) -> Result<(), LedgerError> {
        let mut state = self.lock();
        let (from, to) = if command.is_debit() {
            (Some(command.account()), None)
        } else {
            (None, Some(command.account()))
        };
        state.insert_entry(
            command.id(),
            command.description(),
            command.amount(),
            from,
            to,
        )?;
        state.apply(command.account(), command.amount())
    }
}

#[async_trait]
impl UnitOfWork for InMemoryLedger {
    async fn execute<T, F>(&self, job: F) -> Result<T, LedgerError>
    where
        T: Send,
        F: for<'r> FnOnce(&'r dyn MoneyRepository) -> BoxFuture<'r, Result<T, LedgerError>>
            + Send,
    {
        let _serialized = self.scope.lock().await;
        let snapshot = self.lock().clone();
        let scope = MemoryScope {
            working: Mutex::new(snapshot),
        };

        let repo: &dyn MoneyRepository = &scope;
        let result = AssertUnwindSafe(job(repo))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(LedgerError::internal("mutation panicked")));

        if result.is_ok() {
            let working = scope.working.into_inner().unwrap_or_else(PoisonError::into_inner);
            *self.lock() = working;
        }
        result
    }
}

#[async_trait]
impl TransactionStore for InMemoryLedger {
    async fn balance(&self, account: AccountId) -> Result<Option<i64>, LedgerError> {
        Ok(self.balance_of(account))
    }

    async fn count_transactions(&self, account: AccountId) -> Result<u64, LedgerError> {
        Ok(self.lock().rows_for(account).len() as u64)
    }

    async fn fetch_transactions(
        &self,
        account: AccountId,
        plan: &QueryPlan,
    ) -> Result<Vec<LedgerRow>, LedgerError> {
        let rows = self.lock().rows_for(account);
        let window = match plan {
            QueryPlan::Seek(seek) => {
                let mut window: Vec<LedgerRow> = rows
                    .into_iter()
                    .filter(|row| seek.comparator.matches(row.created_at, seek.anchor))
                    .collect();
                sort_by_time(&mut window, seek.fetch_direction);
                window.truncate(seek.limit as usize);
                sort_by_time(&mut window, seek.output_direction);
                window
            }
            QueryPlan::Offset(offset) => {
                let mut window = rows;
                window.sort_by(|a, b| {
                    (a.amount.unsigned_abs(), a.created_at, a.id)
                        .cmp(&(b.amount.unsigned_abs(), b.created_at, b.id))
                });
                if offset.direction == SortDirection::Desc {
                    window.reverse();
                }
                window
                    .into_iter()
                    .skip(usize::try_from(offset.offset).unwrap_or(usize::MAX))
                    .take(offset.limit as usize)
                    .collect()
            }
        };
        Ok(window)
    }
}

/// Rate provider with a fixed table, or one that always fails.
#[derive(Debug, Clone)]
pub struct StaticRates {
    rates: Option<RateTable>,
}

impl StaticRates {
    /// Provider quoting the given rates.
    #[must_use]
    pub fn new(rates: RateTable) -> Self {
        Self { rates: Some(rates) }
    }

    /// Provider whose every request fails.
    #[must_use]
    pub fn unavailable() -> Self {
        Self { rates: None }
    }
}

impl Default for StaticRates {
    fn default() -> Self {
        Self::new(RateTable::from([
            (Currency::Usd, Decimal::new(111, 4)),
            (Currency::Eur, Decimal::new(102, 4)),
        ]))
    }
}

#[async_trait]
impl RateProvider for StaticRates {
    async fn latest_rates(&self, _base: Currency) -> Result<RateTable, RateProviderError> {
        self.rates
            .clone()
            .ok_or_else(|| RateProviderError::Request("provider unavailable".to_string()))
    }
}
