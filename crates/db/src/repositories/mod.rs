//! Repository abstractions for data access.
//!
//! Repositories implement the ledger's storage ports on top of `SeaORM`,
//! hiding the Postgres details from the rest of the application.

pub mod money;
pub mod query;
pub mod unit_of_work;

pub use money::SeaMoneyRepository;
pub use query::TransactionQueryRepository;
pub use unit_of_work::SeaUnitOfWork;
