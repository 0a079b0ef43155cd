//! Exchange-rate provider port.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use super::code::Currency;

/// Rates quoted per unit of a base currency.
pub type RateTable = HashMap<Currency, Decimal>;

/// Errors returned by a rate provider.
#[derive(Debug, Error)]
pub enum RateProviderError {
    /// The request to the provider failed.
    #[error("rate request failed: {0}")]
    Request(String),

    /// The provider answered without a quote for a required currency.
    #[error("rate response is missing {0}")]
    MissingRate(Currency),

    /// The provider quoted a rate that cannot be used.
    #[error("rate for {0} is not a positive decimal")]
    InvalidRate(Currency),
}

/// Source of the latest exchange rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetches the latest rates for every quoted currency against `base`.
    async fn latest_rates(&self, base: Currency) -> Result<RateTable, RateProviderError>;
}
