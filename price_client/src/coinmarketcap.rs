//! CoinMarketCap quotes client.
//!
//! The quote API prices assets by CoinMarketCap id, so requested contract
//! addresses are translated through the [`crate::support`] table on the
//! way in and back to addresses on the way out. Addresses the table does
//! not know are skipped; when nothing is left, no request goes out at
//! all.

use crate::{support, PriceClientError, QuoteFetcher};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use wallet_core::{Prices, TokenPrice};

#[derive(Debug, Deserialize)]
struct QuotesResponse {
    status: CmcStatus,
    #[serde(default)]
    data: HashMap<String, CmcAsset>,
}

#[derive(Debug, Deserialize)]
struct CmcStatus {
    error_code: i64,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CmcAsset {
    #[serde(default)]
    quote: HashMap<String, CmcQuote>,
}

#[derive(Debug, Deserialize)]
struct CmcQuote {
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CoinMarketCapClient {
    client: Client,
    base_url: String,
    api_key: String,
    chain_id: String,
}

impl CoinMarketCapClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        chain_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PriceClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            chain_id: chain_id.into(),
        })
    }
}

/// Requested addresses resolved against the support table, lowercased,
/// unsupported ones dropped.
fn supported_targets(chain_id: &str, addresses: &[String]) -> Vec<(String, u32)> {
    let mut targets = Vec::new();
    for address in addresses {
        let address = address.to_lowercase();
        match support::cmc_id(chain_id, &address) {
            Some(id) => targets.push((address, id)),
            None => debug!("No quote id for {} on chain {}", address, chain_id),
        }
    }
    targets
}

/// Maps a quote response back onto the requested addresses.
fn collect_quotes(
    targets: Vec<(String, u32)>,
    response: QuotesResponse,
    convert: &str,
) -> Prices {
    let mut prices = Prices::new();
    for (address, id) in targets {
        let quote = response
            .data
            .get(&id.to_string())
            .and_then(|asset| asset.quote.get(convert));
        match quote.and_then(|q| q.price) {
            Some(price) => {
                let last_updated = quote
                    .and_then(|q| q.last_updated)
                    .unwrap_or_else(Utc::now);
                prices.insert(
                    address,
                    TokenPrice {
                        price,
                        last_updated,
                    },
                );
            }
            None => warn!("Quote response carried no {} price for {}", convert, address),
        }
    }
    prices
}

#[async_trait]
impl QuoteFetcher for CoinMarketCapClient {
    async fn quotes_latest(
        &self,
        addresses: &[String],
        convert: &str,
    ) -> Result<Prices, PriceClientError> {
        let targets = supported_targets(&self.chain_id, addresses);
        if targets.is_empty() {
            return Ok(Prices::new());
        }

        let ids = targets
            .iter()
            .map(|(_, id)| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/v2/cryptocurrency/quotes/latest", self.base_url);
        debug!("GET {} ids={} convert={}", url, ids, convert);

        let response: QuotesResponse = self
            .client
            .get(&url)
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .header("Accept", "application/json")
            .query(&[("id", ids.as_str()), ("convert", convert)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status.error_code != 0 {
            return Err(PriceClientError::Api {
                message: response
                    .status
                    .error_message
                    .unwrap_or_else(|| format!("error code {}", response.status.error_code)),
            });
        }

        Ok(collect_quotes(targets, response, convert))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallet_core::NATIVE_COIN_ADDRESS;

    const RIF: &str = "0x2acc95758f8b5f583470ba265eb685a8f45fc9d5";

    #[test]
    fn targets_drop_unsupported_addresses() {
        let addresses = vec![
            NATIVE_COIN_ADDRESS.to_string(),
            "0x2ACC95758F8B5F583470BA265EB685A8F45FC9D5".to_string(),
            "0x2acc95758f8b5f583470ba265eb685a8f45fc9d".to_string(),
        ];

        let targets = supported_targets("30", &addresses);

        assert_eq!(
            targets,
            vec![
                (NATIVE_COIN_ADDRESS.to_string(), 3626),
                (RIF.to_string(), 3701),
            ]
        );
    }

    #[test]
    fn quotes_map_back_to_addresses() {
        let raw = r#"{
            "status": { "error_code": 0, "error_message": null },
            "data": {
                "3626": {
                    "id": 3626,
                    "quote": {
                        "USD": { "price": 65164.92, "last_updated": "2023-06-16T14:00:00.000Z" }
                    }
                },
                "3701": {
                    "id": 3701,
                    "quote": {
                        "USD": { "price": 0.06524069907625176, "last_updated": "2023-06-16T14:00:00.000Z" }
                    }
                }
            }
        }"#;
        let response: QuotesResponse = serde_json::from_str(raw).unwrap();
        let targets = vec![
            (NATIVE_COIN_ADDRESS.to_string(), 3626),
            (RIF.to_string(), 3701),
        ];

        let prices = collect_quotes(targets, response, "USD");

        assert_eq!(prices.len(), 2);
        assert_eq!(
            prices[RIF].price.to_string(),
            "0.06524069907625176"
        );
    }

    #[test]
    fn missing_quote_is_skipped() {
        let raw = r#"{
            "status": { "error_code": 0, "error_message": null },
            "data": {
                "3626": { "id": 3626, "quote": { "USD": { "price": null } } }
            }
        }"#;
        let response: QuotesResponse = serde_json::from_str(raw).unwrap();
        let targets = vec![
            (NATIVE_COIN_ADDRESS.to_string(), 3626),
            (RIF.to_string(), 3701),
        ];

        let prices = collect_quotes(targets, response, "USD");

        assert!(prices.is_empty());
    }

    #[test]
    fn error_status_parses() {
        let raw = r#"{
            "status": { "error_code": 1001, "error_message": "API key missing" },
            "data": {}
        }"#;

        let response: QuotesResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(response.status.error_code, 1001);
        assert_eq!(response.status.error_message.as_deref(), Some("API key missing"));
    }

    #[tokio::test]
    async fn all_unsupported_addresses_short_circuit() {
        // No route to this port; the call must not attempt the network.
        let client = CoinMarketCapClient::new(
            "http://127.0.0.1:9",
            "test-key",
            "30",
            Duration::from_secs(1),
        )
        .unwrap();

        let prices = client
            .quotes_latest(
                &["0x2acc95758f8b5f583470ba265eb685a8f45fc9d".to_string()],
                "USD",
            )
            .await
            .unwrap();

        assert!(prices.is_empty());
    }
}
