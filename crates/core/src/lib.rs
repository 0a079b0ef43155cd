//! Core business logic for Moneta.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached through the ports in [`ledger::ports`].
//!
//! # Modules
//!
//! - `pagination` - Cursor codec and the seek/offset pagination strategies
//! - `query` - Balance reads and transaction history listings
//! - `ledger` - Idempotent transfers and credits/debits
//! - `currency` - Display-currency conversion with a TTL rate cache

pub mod currency;
pub mod ledger;
pub mod pagination;
pub mod query;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use ledger::LedgerError;
