//! Read-side types: raw ledger rows, the per-account transaction view, and
//! listing requests.

use chrono::{DateTime, Utc};
use moneta_shared::types::{AccountId, Limit, SortDirection, SortField, SortSpec, TransactionId};
use serde::Serialize;
use uuid::Uuid;

use crate::ledger::LedgerError;
use crate::pagination::{Cursor, Page};

/// Counterparty value the store uses for entries with no other account.
pub const NO_COUNTERPARTY: Uuid = Uuid::nil();

/// One ledger entry as seen from one account, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    /// Ledger entry id.
    pub id: TransactionId,
    /// Free-text description.
    pub description: String,
    /// Stored signed amount.
    pub amount: i64,
    /// Other side of the entry, [`NO_COUNTERPARTY`] when there is none.
    pub counterparty: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// The viewing account is the entry's `from` side.
    pub is_debit: bool,
}

/// A ledger entry from the viewing account's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Ledger entry id.
    pub id: TransactionId,
    /// Amount with the sign the viewer sees: money leaving is negative.
    pub amount: i64,
    /// Other account, `None` for credits and debits.
    pub counterparty: Option<AccountId>,
    /// Free-text description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<LedgerRow> for Transaction {
    fn from(row: LedgerRow) -> Self {
        let (counterparty, amount) = if row.counterparty == NO_COUNTERPARTY {
            (None, row.amount)
        } else if row.is_debit {
            (Some(AccountId::from_uuid(row.counterparty)), -row.amount)
        } else {
            (Some(AccountId::from_uuid(row.counterparty)), row.amount)
        };

        Self {
            id: row.id,
            amount,
            counterparty,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// A validated history listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    /// Account whose history is listed.
    pub account: AccountId,
    /// Requested ordering.
    pub sort: SortSpec,
    /// Position, empty for the first page.
    pub cursor: Cursor,
    /// Page size.
    pub limit: Limit,
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

impl ListRequest {
    /// Parses raw query parameters. Absent or blank values take their defaults.
    ///
    /// # Errors
    ///
    /// - `InvalidAccountId` for a malformed account id
    /// - `UnsupportedSortField` / `UnsupportedSortDirection` for unknown codes
    /// - `InvalidRequest` for a limit outside `1..=30`
    pub fn parse(
        account: &str,
        cursor: Option<&str>,
        sort: Option<&str>,
        order: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Self, LedgerError> {
        let account = account
            .trim()
            .parse()
            .map_err(|_| LedgerError::InvalidAccountId)?;

        let field = match present(sort) {
            None => SortField::default(),
            Some(raw) => raw
                .parse()
                .ok()
                .and_then(SortField::from_code)
                .ok_or(LedgerError::UnsupportedSortField)?,
        };

        let direction = match present(order) {
            None => SortDirection::default(),
            Some(raw) => raw
                .parse()
                .ok()
                .and_then(SortDirection::from_code)
                .ok_or(LedgerError::UnsupportedSortDirection)?,
        };

        let limit = match present(limit) {
            None => Limit::default(),
            Some(raw) => raw
                .parse()
                .ok()
                .and_then(Limit::new)
                .ok_or(LedgerError::InvalidRequest)?,
        };

        Ok(Self {
            account,
            sort: SortSpec::new(field, direction),
            cursor: present(cursor).map_or_else(Cursor::empty, |raw| Cursor::from(raw.to_string())),
            limit,
        })
    }
}

/// One page of an account's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionPage {
    /// Entries in the requested order.
    pub transactions: Vec<Transaction>,
    /// Position and neighbouring cursors.
    pub page: Page,
    /// Total entries touching the account.
    pub count_item: u64,
}
