//! Initial schema: accounts and the ledger of financial transactions.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(LEDGER_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS financial_transaction CASCADE;
             DROP TABLE IF EXISTS account CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const LEDGER_SQL: &str = r"
CREATE TABLE account (
    id UUID PRIMARY KEY,
    balance BIGINT NOT NULL DEFAULT 0,
    CONSTRAINT account_balance_check CHECK (balance >= 0)
);

-- Ledger entries are never updated or deleted. The primary key doubles as
-- the idempotency key of the mutation that wrote the row.
CREATE TABLE financial_transaction (
    id UUID PRIMARY KEY,
    description TEXT NOT NULL DEFAULT '',
    amount BIGINT NOT NULL,
    from_id UUID NULL REFERENCES account(id),
    to_id UUID NULL REFERENCES account(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_has_side CHECK (from_id IS NOT NULL OR to_id IS NOT NULL)
);

-- History listings read one side at a time, ordered by time
CREATE INDEX idx_financial_transaction_from ON financial_transaction(from_id, created_at);
CREATE INDEX idx_financial_transaction_to ON financial_transaction(to_id, created_at);
";
