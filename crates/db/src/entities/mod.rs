//! `SeaORM` entity definitions for the ledger tables.

pub mod account;
pub mod financial_transaction;

pub mod prelude {
    //! Entity re-exports.
    pub use super::account::Entity as Account;
    pub use super::financial_transaction::Entity as FinancialTransaction;
}
