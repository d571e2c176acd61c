//! Facade tying the per-chain data sources, node providers, and the price
//! feed together behind the operations the HTTP layer exposes.

use crate::{
    native_coin_balance, reconciler, ChainDataSource, CoreError, Flow, NftInfo, NftInstance,
    NodeProvider, Page, PriceSource, Prices, Result, TokenInfo, TokenWithBalance,
    TransactionPageParams, TransactionRecord, TransferEvent,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Combined balances, prices, and history view for a single address.
#[derive(Debug, Clone, Serialize)]
pub struct AddressDetails {
    pub prices: Prices,
    pub tokens: Vec<TokenWithBalance>,
    pub transactions: Page<TransactionRecord>,
}

/// Per-chain service facade.
///
/// Chain support is fixed at construction: every configured chain id maps
/// to one data source and one node provider, and requests naming any other
/// id fail with [`CoreError::UnsupportedChain`].
pub struct AddressService {
    datasources: HashMap<String, Arc<dyn ChainDataSource>>,
    node_providers: HashMap<String, Arc<dyn NodeProvider>>,
    price_source: Arc<dyn PriceSource>,
}

impl AddressService {
    pub fn new(
        datasources: HashMap<String, Arc<dyn ChainDataSource>>,
        node_providers: HashMap<String, Arc<dyn NodeProvider>>,
        price_source: Arc<dyn PriceSource>,
    ) -> Self {
        Self {
            datasources,
            node_providers,
            price_source,
        }
    }

    pub fn supports_chain(&self, chain_id: &str) -> bool {
        self.datasources.contains_key(chain_id)
    }

    /// Chain ids with a configured data source, for validation messages.
    pub fn chain_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.datasources.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn datasource(&self, chain_id: &str) -> Result<Arc<dyn ChainDataSource>> {
        self.datasources
            .get(chain_id)
            .cloned()
            .ok_or_else(|| CoreError::UnsupportedChain(chain_id.to_string()))
    }

    fn node_provider(&self, chain_id: &str) -> Result<Arc<dyn NodeProvider>> {
        self.node_providers
            .get(chain_id)
            .cloned()
            .ok_or_else(|| CoreError::UnsupportedChain(chain_id.to_string()))
    }

    /// Token listing for a chain, collapsed to empty when the explorer
    /// is unreachable. Only an unknown chain id fails the call.
    pub async fn get_tokens(&self, chain_id: &str) -> Result<Vec<TokenInfo>> {
        match self.datasource(chain_id)?.get_tokens().await {
            Ok(tokens) => Ok(tokens),
            Err(e) => {
                warn!("Token listing failed on chain {}: {}", chain_id, e);
                Ok(Vec::new())
            }
        }
    }

    /// Transfer events for an address, collapsed to empty on upstream
    /// failure like the token listing.
    pub async fn get_events_by_address(
        &self,
        chain_id: &str,
        address: &str,
    ) -> Result<Vec<TransferEvent>> {
        let address = address.to_lowercase();
        match self
            .datasource(chain_id)?
            .get_events_by_address(&address)
            .await
        {
            Ok(events) => Ok(events),
            Err(e) => {
                warn!(
                    "Event lookup failed for {} on chain {}: {}",
                    address, chain_id, e
                );
                Ok(Vec::new())
            }
        }
    }

    /// Reconciled transaction history for an address.
    ///
    /// Fails when the native transaction list cannot be fetched; see
    /// [`reconciler::reconcile`] for how the supplementary sources degrade.
    pub async fn get_transactions_by_address(
        &self,
        chain_id: &str,
        address: &str,
        params: &TransactionPageParams,
        flow: Flow,
    ) -> Result<Page<TransactionRecord>> {
        let source = self.datasource(chain_id)?;
        reconciler::reconcile(source.as_ref(), &address.to_lowercase(), params, flow).await
    }

    /// ERC20 balances followed by the native-coin entry.
    ///
    /// The native balance comes from the node and is required; the token
    /// list comes from the explorer and collapses to empty when that
    /// upstream is down.
    pub async fn get_tokens_by_address(
        &self,
        chain_id: &str,
        address: &str,
    ) -> Result<Vec<TokenWithBalance>> {
        let address = address.to_lowercase();
        let balance = self.node_provider(chain_id)?.get_balance(&address).await?;
        let mut tokens = match self.datasource(chain_id)?.get_tokens_by_address(&address).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(
                    "Token balance lookup failed for {} on chain {}: {}",
                    address, chain_id, e
                );
                Vec::new()
            }
        };
        tokens.push(native_coin_balance(balance, chain_id));
        Ok(tokens)
    }

    /// Quotes for a comma-separated address list, normalized to lowercase.
    pub async fn get_prices(&self, addresses: &str, convert: &str) -> Result<Prices> {
        let addresses: Vec<String> = addresses
            .to_lowercase()
            .split(',')
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
        self.price_source.get_prices(&addresses, convert).await
    }

    pub async fn get_latest_prices(&self) -> Prices {
        self.price_source.latest_prices().await
    }

    /// The combined per-address view: cached prices, token balances, and
    /// reconciled history fetched together.
    ///
    /// Each of the three sections degrades on its own, so one dead
    /// upstream leaves the other sections populated. Only an unknown
    /// chain id fails the call outright.
    pub async fn get_address_details(
        &self,
        chain_id: &str,
        address: &str,
        params: &TransactionPageParams,
        flow: Flow,
    ) -> Result<AddressDetails> {
        self.datasource(chain_id)?;

        let (prices, tokens, transactions) = tokio::join!(
            self.get_latest_prices(),
            self.get_tokens_by_address(chain_id, address),
            self.get_transactions_by_address(chain_id, address, params, flow),
        );

        let tokens = tokens.unwrap_or_else(|e| {
            warn!(
                "Token section unavailable for {} on chain {}: {}",
                address, chain_id, e
            );
            Vec::new()
        });
        let transactions = transactions.unwrap_or_else(|e| {
            warn!(
                "Transaction section unavailable for {} on chain {}: {}",
                address, chain_id, e
            );
            Page::default()
        });

        Ok(AddressDetails {
            prices,
            tokens,
            transactions,
        })
    }

    pub async fn get_nft_info(&self, chain_id: &str, address: &str) -> Result<NftInfo> {
        self.datasource(chain_id)?
            .get_nft(&address.to_lowercase())
            .await
    }

    pub async fn get_nft_owned_by_address(
        &self,
        chain_id: &str,
        address: &str,
        nft_address: &str,
    ) -> Result<Vec<NftInstance>> {
        self.datasource(chain_id)?
            .get_nft_owned_by_address(&address.to_lowercase(), &nft_address.to_lowercase())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TokenInfo, TokenPrice, TransferEvent, InternalTransaction, NATIVE_COIN_ADDRESS};
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    const ADDRESS: &str = "0x1D81dD47B35fbBbA9E0BB0a9Bdd40D1E7eE6eB3A";

    #[derive(Default)]
    struct HappySource {
        tokens_fail: bool,
        transactions_fail: bool,
        listing_fail: bool,
        events_fail: bool,
    }

    #[async_trait]
    impl ChainDataSource for HappySource {
        async fn get_tokens(&self) -> Result<Vec<TokenInfo>> {
            if self.listing_fail {
                return Err(CoreError::Source("listing down".to_string()));
            }
            Ok(vec![TokenInfo {
                name: "tRIF Token".to_string(),
                symbol: "tRIF".to_string(),
                contract_address: "0x19f64674d8a5b4e652319f5e239efd3bc969a1fe".to_string(),
                decimals: 18,
            }])
        }

        async fn get_tokens_by_address(&self, _address: &str) -> Result<Vec<TokenWithBalance>> {
            if self.tokens_fail {
                return Err(CoreError::Source("token list down".to_string()));
            }
            Ok(vec![TokenWithBalance {
                name: "tRIF Token".to_string(),
                symbol: "tRIF".to_string(),
                contract_address: "0x19f64674d8a5b4e652319f5e239efd3bc969a1fe".to_string(),
                decimals: 18,
                balance: "7000000000000000000".to_string(),
            }])
        }

        async fn get_rbtc_balance_by_address(&self, _address: &str) -> Result<TokenWithBalance> {
            Err(CoreError::Source("unused".to_string()))
        }

        async fn get_transactions_by_address(
            &self,
            address: &str,
            _params: &TransactionPageParams,
        ) -> Result<Page<TransactionRecord>> {
            if self.transactions_fail {
                return Err(CoreError::Source("native list down".to_string()));
            }
            // The service must hand us the address already lowercased.
            assert_eq!(address, address.to_lowercase());
            Ok(Page {
                prev: None,
                next: Some("cursor".to_string()),
                data: vec![TransactionRecord {
                    hash: "0xa".to_string(),
                    nonce: 1,
                    block_hash: "0xb1".to_string(),
                    block_number: 10,
                    transaction_index: 0,
                    from: address.to_string(),
                    to: None,
                    gas: "21000".to_string(),
                    gas_price: "65164000".to_string(),
                    value: "0".to_string(),
                    input: "0x".to_string(),
                    timestamp: 1_690_000_000,
                    success: true,
                }],
            })
        }

        async fn get_events_by_address(&self, address: &str) -> Result<Vec<TransferEvent>> {
            if self.events_fail {
                return Err(CoreError::Source("events down".to_string()));
            }
            Ok(vec![TransferEvent {
                transaction_hash: "0xe1".to_string(),
                block_number: 12,
                from: address.to_string(),
                to: "0x09a1eda29f664ac8f68106f6ab7a97ca0a0d9608".to_string(),
                contract_address: "0x19f64674d8a5b4e652319f5e239efd3bc969a1fe".to_string(),
                value: "5000".to_string(),
                token_name: None,
                token_symbol: None,
                token_decimals: None,
                timestamp: 1_690_000_100,
            }])
        }

        async fn get_internal_transactions_by_address(
            &self,
            _address: &str,
        ) -> Result<Vec<InternalTransaction>> {
            Ok(Vec::new())
        }

        async fn get_transaction(&self, _hash: &str) -> Result<TransactionRecord> {
            Err(CoreError::Source("unused".to_string()))
        }

        async fn get_nft(&self, _address: &str) -> Result<NftInfo> {
            Err(CoreError::Source("unused".to_string()))
        }

        async fn get_nft_owned_by_address(
            &self,
            _address: &str,
            _nft_address: &str,
        ) -> Result<Vec<NftInstance>> {
            Ok(Vec::new())
        }
    }

    struct FixedNode {
        balance: Option<String>,
    }

    #[async_trait]
    impl NodeProvider for FixedNode {
        async fn get_balance(&self, _address: &str) -> Result<String> {
            self.balance
                .clone()
                .ok_or_else(|| CoreError::Node("node unreachable".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingPriceSource {
        requested: Mutex<Vec<String>>,
        snapshot: Prices,
    }

    #[async_trait]
    impl PriceSource for RecordingPriceSource {
        async fn get_prices(&self, addresses: &[String], _convert: &str) -> Result<Prices> {
            self.requested
                .lock()
                .unwrap()
                .extend(addresses.iter().cloned());
            Ok(Prices::new())
        }

        async fn latest_prices(&self) -> Prices {
            self.snapshot.clone()
        }
    }

    fn service_with(
        source: HappySource,
        node: FixedNode,
        prices: RecordingPriceSource,
    ) -> AddressService {
        let mut datasources: HashMap<String, Arc<dyn ChainDataSource>> = HashMap::new();
        datasources.insert("31".to_string(), Arc::new(source));
        let mut node_providers: HashMap<String, Arc<dyn NodeProvider>> = HashMap::new();
        node_providers.insert("31".to_string(), Arc::new(node));
        AddressService::new(datasources, node_providers, Arc::new(prices))
    }

    fn snapshot_with_rbtc() -> Prices {
        let mut prices = Prices::new();
        prices.insert(
            NATIVE_COIN_ADDRESS.to_string(),
            TokenPrice {
                price: Decimal::new(6516412, 2),
                last_updated: Utc::now(),
            },
        );
        prices
    }

    #[tokio::test]
    async fn token_list_ends_with_native_coin_entry() {
        let service = service_with(
            HappySource::default(),
            FixedNode {
                balance: Some("0x56900d33ca7fc0000".to_string()),
            },
            RecordingPriceSource::default(),
        );

        let tokens = service.get_tokens_by_address("31", ADDRESS).await.unwrap();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].symbol, "tRIF");
        assert_eq!(tokens[1].symbol, "tRBTC");
        assert_eq!(tokens[1].balance, "0x56900d33ca7fc0000");
    }

    #[tokio::test]
    async fn token_list_survives_explorer_outage() {
        let service = service_with(
            HappySource {
                tokens_fail: true,
                ..Default::default()
            },
            FixedNode {
                balance: Some("0x0".to_string()),
            },
            RecordingPriceSource::default(),
        );

        let tokens = service.get_tokens_by_address("31", ADDRESS).await.unwrap();

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].contract_address, NATIVE_COIN_ADDRESS);
    }

    #[tokio::test]
    async fn token_listing_collapses_to_empty_on_failure() {
        let service = service_with(
            HappySource {
                listing_fail: true,
                ..Default::default()
            },
            FixedNode { balance: None },
            RecordingPriceSource::default(),
        );

        let tokens = service.get_tokens("31").await.unwrap();

        assert!(tokens.is_empty());
        assert!(matches!(
            service.get_tokens("1").await,
            Err(CoreError::UnsupportedChain(_))
        ));
    }

    #[tokio::test]
    async fn event_lookup_collapses_to_empty_on_failure() {
        let service = service_with(
            HappySource::default(),
            FixedNode { balance: None },
            RecordingPriceSource::default(),
        );

        let events = service.get_events_by_address("31", ADDRESS).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].transaction_hash, "0xe1");

        let service = service_with(
            HappySource {
                events_fail: true,
                ..Default::default()
            },
            FixedNode { balance: None },
            RecordingPriceSource::default(),
        );

        let events = service.get_events_by_address("31", ADDRESS).await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn node_outage_fails_the_token_call() {
        let service = service_with(
            HappySource::default(),
            FixedNode { balance: None },
            RecordingPriceSource::default(),
        );

        let result = service.get_tokens_by_address("31", ADDRESS).await;

        assert!(matches!(result, Err(CoreError::Node(_))));
    }

    #[tokio::test]
    async fn details_populate_other_sections_when_prices_are_empty() {
        // Dead price poller means an empty snapshot, not a failure.
        let service = service_with(
            HappySource::default(),
            FixedNode {
                balance: Some("0x0".to_string()),
            },
            RecordingPriceSource::default(),
        );

        let details = service
            .get_address_details("31", ADDRESS, &TransactionPageParams::default(), Flow::All)
            .await
            .unwrap();

        assert!(details.prices.is_empty());
        assert_eq!(details.tokens.len(), 2);
        assert_eq!(details.transactions.data.len(), 1);
        assert_eq!(details.transactions.next.as_deref(), Some("cursor"));
    }

    #[tokio::test]
    async fn details_degrade_sections_independently() {
        let service = service_with(
            HappySource {
                transactions_fail: true,
                ..Default::default()
            },
            FixedNode {
                balance: Some("0x0".to_string()),
            },
            RecordingPriceSource {
                snapshot: snapshot_with_rbtc(),
                ..Default::default()
            },
        );

        let details = service
            .get_address_details("31", ADDRESS, &TransactionPageParams::default(), Flow::All)
            .await
            .unwrap();

        assert_eq!(details.prices.len(), 1);
        assert_eq!(details.tokens.len(), 2);
        assert!(details.transactions.data.is_empty());
        assert!(details.transactions.next.is_none());
    }

    #[tokio::test]
    async fn unknown_chain_is_rejected() {
        let service = service_with(
            HappySource::default(),
            FixedNode {
                balance: Some("0x0".to_string()),
            },
            RecordingPriceSource::default(),
        );

        let result = service
            .get_transactions_by_address(
                "1",
                ADDRESS,
                &TransactionPageParams::default(),
                Flow::All,
            )
            .await;

        assert!(matches!(result, Err(CoreError::UnsupportedChain(_))));
    }

    #[tokio::test]
    async fn price_requests_are_lowercased_and_split() {
        let recorder = Arc::new(RecordingPriceSource::default());
        let mut datasources: HashMap<String, Arc<dyn ChainDataSource>> = HashMap::new();
        datasources.insert("31".to_string(), Arc::new(HappySource::default()));
        let node_providers: HashMap<String, Arc<dyn NodeProvider>> = HashMap::new();
        let service = AddressService::new(datasources, node_providers, recorder.clone());

        service
            .get_prices("0xABCDEF,,0x19F64674d8A5B4E652319F5e239EFd3bc969A1FE", "USD")
            .await
            .unwrap();

        let requested = recorder.requested.lock().unwrap();
        assert_eq!(
            *requested,
            vec![
                "0xabcdef".to_string(),
                "0x19f64674d8a5b4e652319f5e239efd3bc969a1fe".to_string(),
            ]
        );
    }
}
