//! Price cache in front of a [`QuoteFetcher`].
//!
//! Lookups serve unexpired cached quotes and fetch only the misses. A
//! background poller keeps the cache warm for every supported token so
//! the snapshot endpoint answers without an upstream round trip.

use crate::{support, QuoteFetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use wallet_core::{Prices, PriceSource, Result as CoreResult, TokenPrice};

struct CachedQuote {
    quote: TokenPrice,
    stored_at: Instant,
}

impl CachedQuote {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

pub struct LastPrice<F: QuoteFetcher> {
    fetcher: F,
    chain_id: String,
    default_convert: String,
    ttl: Duration,
    cache: RwLock<HashMap<String, CachedQuote>>,
}

impl<F: QuoteFetcher> LastPrice<F> {
    pub fn new(
        fetcher: F,
        chain_id: impl Into<String>,
        default_convert: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            fetcher,
            chain_id: chain_id.into(),
            default_convert: default_convert.into(),
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Cached quotes merged with a fetch of whatever the cache cannot
    /// serve. The cache only holds quotes in the default convert
    /// currency, so other currencies go straight to the fetcher.
    pub async fn prices_for(
        &self,
        addresses: &[String],
        convert: &str,
    ) -> Result<Prices, crate::PriceClientError> {
        let use_cache = convert == self.default_convert;

        let mut prices = Prices::new();
        let mut misses = Vec::new();
        {
            let cache = self.cache.read().await;
            for address in addresses {
                let address = address.to_lowercase();
                match cache.get(&address).filter(|c| use_cache && c.is_fresh(self.ttl)) {
                    Some(cached) => {
                        prices.insert(address, cached.quote.clone());
                    }
                    None => misses.push(address),
                }
            }
        }

        if !misses.is_empty() {
            let fetched = self.fetcher.quotes_latest(&misses, convert).await?;
            if use_cache {
                self.store(&fetched).await;
            }
            prices.extend(fetched);
        }

        Ok(prices)
    }

    /// Unexpired cache contents. Never reaches upstream.
    pub async fn snapshot(&self) -> Prices {
        let cache = self.cache.read().await;
        cache
            .iter()
            .filter(|(_, cached)| cached.is_fresh(self.ttl))
            .map(|(address, cached)| (address.clone(), cached.quote.clone()))
            .collect()
    }

    /// Refetches every supported token on the configured chain once.
    pub async fn refresh(&self) {
        let addresses: Vec<String> = support::supported_tokens(&self.chain_id)
            .iter()
            .map(|address| address.to_string())
            .collect();
        match self
            .fetcher
            .quotes_latest(&addresses, &self.default_convert)
            .await
        {
            Ok(quotes) => {
                debug!("Refreshed {} quotes for chain {}", quotes.len(), self.chain_id);
                self.store(&quotes).await;
            }
            Err(e) => warn!("Price refresh for chain {} failed: {}", self.chain_id, e),
        }
    }

    async fn store(&self, quotes: &Prices) {
        if quotes.is_empty() {
            return;
        }
        let mut cache = self.cache.write().await;
        for (address, quote) in quotes {
            cache.insert(
                address.clone(),
                CachedQuote {
                    quote: quote.clone(),
                    stored_at: Instant::now(),
                },
            );
        }
    }
}

impl<F: QuoteFetcher + 'static> LastPrice<F> {
    /// Spawns the poll loop. The first refresh runs right away; refresh
    /// failures are logged and the loop keeps ticking.
    pub fn start_polling(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.refresh().await;
            }
        })
    }
}

#[async_trait]
impl<F: QuoteFetcher> PriceSource for LastPrice<F> {
    async fn get_prices(&self, addresses: &[String], convert: &str) -> CoreResult<Prices> {
        Ok(self.prices_for(addresses, convert).await?)
    }

    async fn latest_prices(&self) -> Prices {
        self.snapshot().await
    }
}
