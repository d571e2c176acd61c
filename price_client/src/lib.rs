//! Fiat price feed: CoinMarketCap quotes behind an in-memory TTL cache.
//!
//! `CoinMarketCapClient` talks to the quote API for the small set of
//! tokens the feed supports; `LastPrice` caches the answers, serves
//! snapshots, and keeps itself warm with a background poller. The cache
//! is what the rest of the system sees, through
//! `wallet_core::PriceSource`.

pub mod coinmarketcap;
pub mod last_price;
pub mod support;

pub use coinmarketcap::CoinMarketCapClient;
pub use last_price::LastPrice;

use async_trait::async_trait;
use thiserror::Error;
use wallet_core::{CoreError, Prices};

#[derive(Error, Debug)]
pub enum PriceClientError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Quote API error: {message}")]
    Api { message: String },
}

impl From<PriceClientError> for CoreError {
    fn from(e: PriceClientError) -> Self {
        CoreError::Price(e.to_string())
    }
}

/// Trait for the upstream quote API, kept narrow so the cache layer can
/// be driven by a scripted fetcher in tests.
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    /// Latest quotes for the given token addresses in `convert` currency,
    /// keyed by lowercase address. Unsupported addresses are absent from
    /// the result rather than errors.
    async fn quotes_latest(
        &self,
        addresses: &[String],
        convert: &str,
    ) -> Result<Prices, PriceClientError>;
}
