//! Validated mutation commands.
//!
//! Commands are only built through their constructors, so a command that
//! reaches the mutation core has a resolved idempotency key and valid fields.

use moneta_shared::types::{AccountId, TransactionId};

use super::error::LedgerError;

/// Resolves a client-supplied idempotency key.
///
/// A missing or blank key yields a fresh UUID v4.
///
/// # Errors
///
/// Returns `LedgerError::InvalidIdempotencyKey` if a key is present but is not a UUID.
pub fn resolve_idempotency_key(raw: Option<&str>) -> Result<TransactionId, LedgerError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(TransactionId::new()),
        Some(key) => key
            .parse()
            .map_err(|_| LedgerError::InvalidIdempotencyKey),
    }
}

fn parse_account(raw: &str) -> Result<AccountId, LedgerError> {
    raw.trim().parse().map_err(|_| LedgerError::InvalidAccountId)
}

/// A transfer between two accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCommand {
    id: TransactionId,
    from: AccountId,
    to: AccountId,
    amount: i64,
    description: String,
}

impl TransferCommand {
    /// Validates a transfer request.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if `amount <= 0`
    /// - `InvalidAccountId` if either account id is malformed
    /// - `TransferToSelf` if both ids name the same account
    /// - `InvalidIdempotencyKey` if a supplied key is not a UUID
    pub fn new(
        idempotency_key: Option<&str>,
        from: &str,
        to: &str,
        amount: i64,
        description: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidRequest);
        }
        let from = parse_account(from)?;
        let to = parse_account(to)?;
        if from == to {
            return Err(LedgerError::TransferToSelf);
        }
        let id = resolve_idempotency_key(idempotency_key)?;

        Ok(Self {
            id,
            from,
            to,
            amount,
            description: description.into(),
        })
    }

    /// Ledger entry id and idempotency key.
    #[must_use]
    pub const fn id(&self) -> TransactionId {
        self.id
    }

    /// Debited account.
    #[must_use]
    pub const fn from(&self) -> AccountId {
        self.from
    }

    /// Credited account.
    #[must_use]
    pub const fn to(&self) -> AccountId {
        self.to
    }

    /// Positive amount moved.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.amount
    }

    /// Free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A credit (positive amount) or debit (negative amount) against an external event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditOrDebitCommand {
    id: TransactionId,
    account: AccountId,
    amount: i64,
    description: String,
}

impl CreditOrDebitCommand {
    /// Validates a credit-or-debit request.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if `amount == 0`
    /// - `InvalidAccountId` if the account id is malformed
    /// - `InvalidIdempotencyKey` if a supplied key is not a UUID
    pub fn new(
        idempotency_key: Option<&str>,
        account: &str,
        amount: i64,
        description: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidRequest);
        }
        let account = parse_account(account)?;
        let id = resolve_idempotency_key(idempotency_key)?;

        Ok(Self {
            id,
            account,
            amount,
            description: description.into(),
        })
    }

    /// Ledger entry id and idempotency key.
    #[must_use]
    pub const fn id(&self) -> TransactionId {
        self.id
    }

    /// Affected account.
    #[must_use]
    pub const fn account(&self) -> AccountId {
        self.account
    }

    /// Signed amount: positive credits, negative debits.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.amount
    }

    /// Returns true for a debit.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        self.amount < 0
    }

    /// Free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}
