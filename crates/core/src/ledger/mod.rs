//! Idempotent ledger mutations.
//!
//! This module implements the write side of the ledger:
//! - Validated transfer and credit/debit commands
//! - Idempotency key resolution
//! - Storage ports (unit of work, money repository, transaction store)
//! - The mutation service
//! - Error types for every ledger operation

pub mod command;
pub mod error;
pub mod ports;
pub mod service;

#[cfg(test)]
mod service_props;

pub use command::{CreditOrDebitCommand, TransferCommand, resolve_idempotency_key};
pub use error::{BoxError, LedgerError};
pub use ports::{MoneyRepository, TransactionStore, UnitOfWork};
pub use service::LedgerService;
