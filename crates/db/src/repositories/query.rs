//! Transaction history query engine.
//!
//! An account's history is the union of the entries it sent (`from_id`) and
//! the entries it received (`to_id`). Each side reports the other account as
//! the counterparty, or the nil UUID when there is none.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moneta_core::ledger::{LedgerError, TransactionStore};
use moneta_core::pagination::{OffsetPlan, QueryPlan, SeekPlan};
use moneta_core::query::LedgerRow;
use moneta_shared::types::{AccountId, TransactionId};
use sea_orm::{
    DatabaseBackend, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, Statement, Value,
};
use tracing::error;
use uuid::Uuid;

use crate::entities::account;

/// Both sides of an account's history. `$1` is the account id and
/// `{filter}` an optional extra predicate on `created_at`.
const HISTORY_SQL: &str = r"
SELECT id, description, amount,
       COALESCE(to_id, '00000000-0000-0000-0000-000000000000'::uuid) AS counterparty,
       created_at, TRUE AS is_debit
FROM financial_transaction
WHERE from_id = $1 {filter}
UNION ALL
SELECT id, description, amount,
       COALESCE(from_id, '00000000-0000-0000-0000-000000000000'::uuid) AS counterparty,
       created_at, FALSE AS is_debit
FROM financial_transaction
WHERE to_id = $1 {filter}
";

const COUNT_SQL: &str = r"
SELECT (SELECT COUNT(*) FROM financial_transaction WHERE from_id = $1)
     + (SELECT COUNT(*) FROM financial_transaction WHERE to_id = $1) AS total
";

#[derive(Debug, FromQueryResult)]
struct EntryRow {
    id: Uuid,
    description: String,
    amount: i64,
    counterparty: Uuid,
    created_at: DateTime<Utc>,
    is_debit: bool,
}

impl From<EntryRow> for LedgerRow {
    fn from(row: EntryRow) -> Self {
        Self {
            id: TransactionId::from_uuid(row.id),
            description: row.description,
            amount: row.amount,
            counterparty: row.counterparty,
            created_at: row.created_at,
            is_debit: row.is_debit,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    total: i64,
}

/// Read-only access to balances and transaction history.
#[derive(Debug, Clone)]
pub struct TransactionQueryRepository {
    db: DatabaseConnection,
}

impl TransactionQueryRepository {
    /// Creates a new query repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Builds the windowed seek query.
    ///
    /// The inner order picks the `limit` rows nearest the anchor, the outer
    /// order lays them out for the client.
    fn seek_statement(account_id: AccountId, plan: &SeekPlan) -> Statement {
        let filter = format!("AND created_at {} $2", plan.comparator.as_sql());
        let union = HISTORY_SQL.replace("{filter}", &filter);
        let fetch = plan.fetch_direction.as_sql();
        let output = plan.output_direction.as_sql();
        let sql = format!(
            "SELECT * FROM (
                SELECT * FROM ({union}) AS history
                ORDER BY created_at {fetch}, id {fetch}
                LIMIT $3
            ) AS page_rows
            ORDER BY created_at {output}, id {output}"
        );

        Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            sql,
            [
                Value::from(account_id.into_inner()),
                Value::from(plan.anchor),
                Value::from(i64::from(plan.limit)),
            ],
        )
    }

    /// Builds the offset query ordered by absolute amount.
    fn offset_statement(account_id: AccountId, plan: &OffsetPlan) -> Statement {
        let union = HISTORY_SQL.replace("{filter}", "");
        let dir = plan.direction.as_sql();
        let sql = format!(
            "SELECT * FROM ({union}) AS history
             ORDER BY ABS(amount) {dir}, created_at {dir}, id {dir}
             OFFSET $2 LIMIT $3"
        );

        Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            sql,
            [
                Value::from(account_id.into_inner()),
                Value::from(i64::try_from(plan.offset).unwrap_or(i64::MAX)),
                Value::from(i64::from(plan.limit)),
            ],
        )
    }
}

fn query_failed(err: DbErr) -> LedgerError {
    error!(error = %err, "Transaction query failed");
    LedgerError::internal(err)
}

#[async_trait]
impl TransactionStore for TransactionQueryRepository {
    async fn balance(&self, account_id: AccountId) -> Result<Option<i64>, LedgerError> {
        let found = account::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(query_failed)?;
        Ok(found.map(|model| model.balance))
    }

    async fn count_transactions(&self, account_id: AccountId) -> Result<u64, LedgerError> {
        let statement = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            COUNT_SQL,
            [Value::from(account_id.into_inner())],
        );
        let row = CountRow::find_by_statement(statement)
            .one(&self.db)
            .await
            .map_err(query_failed)?;
        Ok(row.map_or(0, |row| u64::try_from(row.total).unwrap_or(0)))
    }

    async fn fetch_transactions(
        &self,
        account_id: AccountId,
        plan: &QueryPlan,
    ) -> Result<Vec<LedgerRow>, LedgerError> {
        let statement = match plan {
            QueryPlan::Seek(seek) => Self::seek_statement(account_id, seek),
            QueryPlan::Offset(offset) => Self::offset_statement(account_id, offset),
        };
        let rows = EntryRow::find_by_statement(statement)
            .all(&self.db)
            .await
            .map_err(query_failed)?;
        Ok(rows.into_iter().map(LedgerRow::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moneta_core::pagination::{Comparator, PagePosition};
    use moneta_shared::types::SortDirection;

    #[test]
    fn test_seek_statement_windows_then_reorders() {
        let plan = SeekPlan {
            anchor: DateTime::<Utc>::UNIX_EPOCH,
            comparator: Comparator::Less,
            fetch_direction: SortDirection::Desc,
            output_direction: SortDirection::Asc,
            limit: 2,
            position: PagePosition::FIRST,
        };
        let sql = TransactionQueryRepository::seek_statement(AccountId::new(), &plan).sql;

        assert_eq!(sql.matches("AND created_at < $2").count(), 2);
        assert!(sql.contains("ORDER BY created_at DESC, id DESC"));
        assert!(sql.trim_end().ends_with("ORDER BY created_at ASC, id ASC"));
    }

    #[test]
    fn test_offset_statement_orders_by_absolute_amount() {
        let plan = OffsetPlan {
            offset: 4,
            limit: 2,
            direction: SortDirection::Asc,
            position: PagePosition::FIRST,
        };
        let statement = TransactionQueryRepository::offset_statement(AccountId::new(), &plan);

        assert!(!statement.sql.contains("{filter}"));
        assert!(statement.sql.contains("ORDER BY ABS(amount) ASC, created_at ASC, id ASC"));
        let values = statement.values.unwrap().0;
        assert_eq!(values[1], Value::from(4i64));
        assert_eq!(values[2], Value::from(2i64));
    }
}
