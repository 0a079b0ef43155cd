//! Translation of storage errors into ledger conditions.
//!
//! Postgres reports constraint failures through SQLSTATE codes. They are
//! matched here and nowhere else.

use moneta_core::LedgerError;
use moneta_shared::types::TransactionId;
use sea_orm::{DbErr, RuntimeErr};

/// `check_violation`
const CHECK_VIOLATION: &str = "23514";
/// `foreign_key_violation`
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// Check constraint guarding non-negative balances.
pub(crate) const BALANCE_CHECK: &str = "account_balance_check";

/// Maps a failed statement of the mutation writing `entry`.
pub(crate) fn classify(err: DbErr, entry: TransactionId) -> LedgerError {
    let condition = database_error(&err).and_then(|(code, constraint)| {
        condition_for(code.as_str(), constraint.as_deref(), entry)
    });
    condition.unwrap_or_else(|| LedgerError::internal(err))
}

/// Condition for a SQLSTATE code and the constraint that raised it.
fn condition_for(
    code: &str,
    constraint: Option<&str>,
    entry: TransactionId,
) -> Option<LedgerError> {
    match (code, constraint) {
        (CHECK_VIOLATION, Some(BALANCE_CHECK)) => Some(LedgerError::NotEnoughMoney),
        (FOREIGN_KEY_VIOLATION, _) => Some(LedgerError::AccountNotExist),
        (UNIQUE_VIOLATION, _) => Some(LedgerError::DuplicateIdempotencyKey(entry)),
        _ => None,
    }
}

/// Extracts the SQLSTATE code and constraint name from a driver error.
fn database_error(err: &DbErr) -> Option<(String, Option<String>)> {
    let runtime = match err {
        DbErr::Exec(runtime) | DbErr::Query(runtime) | DbErr::Conn(runtime) => runtime,
        _ => return None,
    };
    let RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) = runtime else {
        return None;
    };
    let code = db_err.code()?.into_owned();
    Some((code, db_err.constraint().map(str::to_string)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("23514", Some("account_balance_check"), 110)]
    #[case("23503", Some("financial_transaction_from_id_fkey"), 111)]
    #[case("23503", None, 111)]
    #[case("23505", Some("financial_transaction_pkey"), 112)]
    fn test_known_conditions(
        #[case] code: &str,
        #[case] constraint: Option<&str>,
        #[case] expected: u32,
    ) {
        let condition = condition_for(code, constraint, TransactionId::new()).unwrap();
        assert_eq!(condition.error_code(), expected);
    }

    #[test]
    fn test_duplicate_carries_entry_id() {
        let entry = TransactionId::new();
        let condition = condition_for(UNIQUE_VIOLATION, None, entry);
        assert!(matches!(
            condition,
            Some(LedgerError::DuplicateIdempotencyKey(id)) if id == entry
        ));
    }

    #[rstest]
    #[case("23514", Some("chk_has_side"))]
    #[case("23514", None)]
    #[case("40001", None)]
    #[case("57014", None)]
    fn test_other_codes_are_unclassified(#[case] code: &str, #[case] constraint: Option<&str>) {
        assert!(condition_for(code, constraint, TransactionId::new()).is_none());
    }

    #[test]
    fn test_non_driver_error_is_internal() {
        let err = classify(DbErr::Custom("boom".to_string()), TransactionId::new());
        assert!(matches!(err, LedgerError::Internal(_)));
    }
}
