//! Read side of the ledger: balances and paginated transaction history.

pub mod service;
pub mod types;

pub use service::QueryService;
pub use types::{LedgerRow, ListRequest, NO_COUNTERPARTY, Transaction, TransactionPage};
