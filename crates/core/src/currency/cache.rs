//! TTL-cached exchange rates.
//!
//! The cache is owned by whoever builds it and shared behind an `Arc`. A read
//! that finds the table stale or empty refreshes it once; concurrent stale
//! reads may each refresh.

use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::code::Currency;
use super::conversion::{ConvertedAmount, convert_balance};
use super::provider::{RateProvider, RateProviderError, RateTable};
use crate::ledger::LedgerError;

#[derive(Debug, Default)]
struct CachedRates {
    rates: RateTable,
    refreshed_at: Option<Instant>,
}

impl CachedRates {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        !self.rates.is_empty()
            && self
                .refreshed_at
                .is_some_and(|at| now.saturating_duration_since(at) < ttl)
    }
}

/// Exchange-rate table refreshed from a [`RateProvider`] when older than its TTL.
#[derive(Debug)]
pub struct RateCache<P> {
    provider: P,
    ttl: Duration,
    state: RwLock<CachedRates>,
}

impl<P: RateProvider> RateCache<P> {
    /// Creates an empty cache. The first read triggers a refresh.
    pub fn new(provider: P, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            state: RwLock::new(CachedRates::default()),
        }
    }

    /// Returns the rate for `currency` per unit of the base currency.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::FailedConvert` if a needed refresh fails or the
    /// provider does not quote `currency`.
    pub async fn rate(&self, currency: Currency) -> Result<Decimal, LedgerError> {
        if currency == Currency::BASE {
            return Ok(Decimal::ONE);
        }

        {
            let state = self.state.read().await;
            if state.is_fresh(self.ttl, Instant::now()) {
                if let Some(rate) = state.rates.get(&currency) {
                    return Ok(*rate);
                }
            }
        }

        self.refresh().await?;

        let state = self.state.read().await;
        state
            .rates
            .get(&currency)
            .copied()
            .ok_or_else(|| LedgerError::failed_convert(RateProviderError::MissingRate(currency)))
    }

    /// Replaces the table with the provider's latest rates.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::FailedConvert` if the provider fails. The previous
    /// table is kept.
    pub async fn refresh(&self) -> Result<(), LedgerError> {
        let rates = self
            .provider
            .latest_rates(Currency::BASE)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to refresh exchange rates");
                LedgerError::failed_convert(e)
            })?;

        let mut state = self.state.write().await;
        debug!(quotes = rates.len(), "Exchange rates refreshed");
        state.rates = rates;
        state.refreshed_at = Some(Instant::now());
        Ok(())
    }

    /// Converts a base-currency balance into `currency`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::FailedConvert` if no usable rate is available.
    pub async fn convert(
        &self,
        balance: i64,
        currency: Currency,
    ) -> Result<ConvertedAmount, LedgerError> {
        let rate = self.rate(currency).await?;
        convert_balance(balance, currency, rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    #[async_trait]
    impl RateProvider for Arc<CountingProvider> {
        async fn latest_rates(&self, _base: Currency) -> Result<RateTable, RateProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(RateProviderError::Request("unavailable".to_string()));
            }
            Ok(RateTable::from([
                (Currency::Usd, dec!(0.0111)),
                (Currency::Eur, dec!(0.0102)),
            ]))
        }
    }

    fn cache() -> (Arc<CountingProvider>, RateCache<Arc<CountingProvider>>) {
        let provider = Arc::new(CountingProvider::default());
        let cache = RateCache::new(Arc::clone(&provider), Duration::from_secs(600));
        (provider, cache)
    }

    #[tokio::test(start_paused = true)]
    async fn test_base_currency_never_hits_provider() {
        let (provider, cache) = cache();
        assert_eq!(cache.rate(Currency::Rub).await.unwrap(), Decimal::ONE);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_rates_are_served_from_cache() {
        let (provider, cache) = cache();
        assert_eq!(cache.rate(Currency::Usd).await.unwrap(), dec!(0.0111));
        assert_eq!(cache.rate(Currency::Eur).await.unwrap(), dec!(0.0102));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_rates_are_refreshed() {
        let (provider, cache) = cache();
        cache.rate(Currency::Usd).await.unwrap();
        tokio::time::advance(Duration::from_secs(601)).await;
        cache.rate(Currency::Usd).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_is_failed_convert() {
        let (provider, cache) = cache();
        provider.failing.store(true, Ordering::SeqCst);
        assert!(matches!(
            cache.convert(100, Currency::Usd).await,
            Err(LedgerError::FailedConvert(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_convert_uses_cached_rate() {
        let (_, cache) = cache();
        let converted = cache.convert(9000, Currency::Usd).await.unwrap();
        assert_eq!(converted.amount, dec!(99.90));
        assert_eq!(converted.currency, Currency::Usd);
    }
}
