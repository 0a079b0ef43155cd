//! Transactional money repository.
//!
//! Every method runs inside the caller's database transaction. The ledger
//! entry is written before any balance moves, so a replayed idempotency key
//! fails on the primary key before touching an account. Balance updates are
//! applied in ascending account-id order.

use async_trait::async_trait;
use moneta_core::ledger::{CreditOrDebitCommand, LedgerError, MoneyRepository, TransferCommand};
use moneta_shared::types::{AccountId, TransactionId};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set};
use tracing::debug;

use crate::entities::{account, financial_transaction};
use crate::error::classify;

/// Money repository bound to one database transaction.
#[derive(Debug, Clone, Copy)]
pub struct SeaMoneyRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> SeaMoneyRepository<'a> {
    /// Binds a repository to an open transaction.
    #[must_use]
    pub const fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    async fn insert_entry(
        &self,
        id: TransactionId,
        description: &str,
        amount: i64,
        from: Option<AccountId>,
        to: Option<AccountId>,
    ) -> Result<(), LedgerError> {
        let entry = financial_transaction::ActiveModel {
            id: Set(id.into_inner()),
            description: Set(description.to_string()),
            amount: Set(amount),
            from_id: Set(from.map(AccountId::into_inner)),
            to_id: Set(to.map(AccountId::into_inner)),
            ..Default::default()
        };

        financial_transaction::Entity::insert(entry)
            .exec_without_returning(self.txn)
            .await
            .map_err(|e| classify(e, id))?;
        Ok(())
    }

    /// Adds `delta` to an account balance.
    ///
    /// The `account_balance_check` constraint rejects a negative result.
    async fn apply_delta(
        &self,
        entry: TransactionId,
        account_id: AccountId,
        delta: i64,
    ) -> Result<(), LedgerError> {
        let result = account::Entity::update_many()
            .col_expr(
                account::Column::Balance,
                Expr::col(account::Column::Balance).add(delta),
            )
            .filter(account::Column::Id.eq(account_id.into_inner()))
            .exec(self.txn)
            .await
            .map_err(|e| classify(e, entry))?;

        if result.rows_affected == 0 {
            return Err(LedgerError::AccountNotExist);
        }
        debug!(account_id = %account_id, delta, "Balance updated");
        Ok(())
    }
}

#[async_trait]
impl MoneyRepository for SeaMoneyRepository<'_> {
    async fn transfer(&self, command: &TransferCommand) -> Result<(), LedgerError> {
        self.insert_entry(
            command.id(),
            command.description(),
            command.amount(),
            Some(command.from()),
            Some(command.to()),
        )
        .await?;

        let mut deltas = [
            (command.from(), -command.amount()),
            (command.to(), command.amount()),
        ];
        deltas.sort_by_key(|(account_id, _)| *account_id);
        for (account_id, delta) in deltas {
            self.apply_delta(command.id(), account_id, delta).await?;
        }
        Ok(())
    }

    async fn credit_or_debit(&self, command: &CreditOrDebitCommand) -> Result<(), LedgerError> {
        let (from, to) = if command.is_debit() {
            (Some(command.account()), None)
        } else {
            (None, Some(command.account()))
        };

        self.insert_entry(
            command.id(),
            command.description(),
            command.amount(),
            from,
            to,
        )
        .await?;
        self.apply_delta(command.id(), command.account(), command.amount())
            .await
    }
}
