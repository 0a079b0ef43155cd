//! Shared types and configuration for Moneta.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for accounts and ledger entries
//! - Sort and page-size types for transaction listings
//! - Configuration management

pub mod config;
pub mod types;

pub use config::AppConfig;
