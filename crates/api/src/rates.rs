//! Exchange rates from freecurrencyapi.net.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use moneta_core::currency::{Currency, RateProvider, RateProviderError, RateTable};
use moneta_shared::config::CurrencyConfig;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

/// Body of the `latest` endpoint.
#[derive(Debug, Deserialize)]
struct LatestRates {
    data: HashMap<String, Decimal>,
}

/// [`RateProvider`] backed by the freecurrencyapi.net `latest` endpoint.
#[derive(Debug, Clone)]
pub struct FreeCurrencyApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FreeCurrencyApi {
    /// Builds the HTTP client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: &CurrencyConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_max_idle_per_host(config.max_idle_connections)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

/// Picks the quoted currencies out of a provider response.
fn rate_table(latest: &LatestRates) -> Result<RateTable, RateProviderError> {
    Currency::QUOTED
        .into_iter()
        .map(|currency| {
            let rate = latest
                .data
                .get(currency.code())
                .copied()
                .ok_or(RateProviderError::MissingRate(currency))?;
            if rate <= Decimal::ZERO {
                return Err(RateProviderError::InvalidRate(currency));
            }
            Ok((currency, rate))
        })
        .collect()
}

#[async_trait]
impl RateProvider for FreeCurrencyApi {
    async fn latest_rates(&self, base: Currency) -> Result<RateTable, RateProviderError> {
        let latest: LatestRates = self
            .client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str()), ("base_currency", base.code())])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RateProviderError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| RateProviderError::Request(e.to_string()))?;

        let table = rate_table(&latest)?;
        debug!(base = %base, quotes = table.len(), "Fetched exchange rates");
        Ok(table)
    }
}
