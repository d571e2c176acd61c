//! Blockscout-backed `ChainDataSource`.
//!
//! Transaction history, transfer events, and internal transactions come
//! from the Etherscan-compatible module/action endpoints; token listings,
//! balances, and NFT data come from the v2 REST API. This API has no
//! cursor pagination for transaction lists, so pages go out without
//! continuation tokens.

pub mod types;

use crate::error::ExplorerError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use types::{
    decode_result, keep_parsed, InternalTxItem, ModuleResponse, TokenListResponse,
    TokenTransferItem, TxInfoItem, TxListItem, V2AddressInfo, V2NftItem, V2NftPage,
    V2TokenBalance,
};
use wallet_core::{
    native_coin_balance, ChainDataSource, InternalTransaction, NftInfo, NftInstance, Page,
    Result as CoreResult, TokenInfo, TokenWithBalance, TransactionPageParams, TransactionRecord,
    TransferEvent,
};

#[derive(Debug, Clone)]
pub struct BlockscoutClient {
    client: Client,
    base_url: String,
    chain_id: String,
    nft_page_cap: u32,
}

impl BlockscoutClient {
    pub fn new(
        base_url: impl Into<String>,
        chain_id: impl Into<String>,
        timeout: Duration,
        nft_page_cap: u32,
    ) -> Result<Self, ExplorerError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            chain_id: chain_id.into(),
            nft_page_cap: nft_page_cap.max(1),
        })
    }

    async fn fetch_module<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, String)],
    ) -> Result<T, ExplorerError> {
        debug!("GET {} {:?}", self.base_url, params);
        let envelope: ModuleResponse = self
            .client
            .get(&self.base_url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        decode_result(envelope)
    }

    async fn fetch_v2<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ExplorerError> {
        let url = format!("{}/v2{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);
        let mut request = self.client.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }
        Ok(request.send().await?.error_for_status()?.json().await?)
    }

    async fn fetch_tokens(&self) -> Result<Vec<TokenInfo>, ExplorerError> {
        let response: TokenListResponse = self.fetch_v2("/tokens", &[]).await?;
        Ok(response
            .items
            .into_iter()
            .filter_map(|token| token.into_token_info())
            .collect())
    }

    async fn fetch_token_balances(
        &self,
        address: &str,
    ) -> Result<Vec<TokenWithBalance>, ExplorerError> {
        let path = format!("/addresses/{}/token-balances", address.to_lowercase());
        let balances: Vec<V2TokenBalance> = self.fetch_v2(&path, &[]).await?;
        Ok(balances
            .into_iter()
            .filter_map(|balance| balance.into_token_with_balance())
            .collect())
    }

    async fn fetch_rbtc_balance(&self, address: &str) -> Result<TokenWithBalance, ExplorerError> {
        let path = format!("/addresses/{}", address.to_lowercase());
        let info: V2AddressInfo = self.fetch_v2(&path, &[]).await?;
        let balance = info.coin_balance.unwrap_or_else(|| "0".to_string());
        Ok(native_coin_balance(balance, &self.chain_id))
    }

    async fn fetch_transactions(
        &self,
        address: &str,
        params: &TransactionPageParams,
    ) -> Result<Vec<TransactionRecord>, ExplorerError> {
        let query = [
            ("module", "account".to_string()),
            ("action", "txlist".to_string()),
            ("address", address.to_lowercase()),
            ("startblock", params.block_number.to_string()),
        ];
        let items: Vec<TxListItem> = self.fetch_module(&query).await?;
        Ok(items
            .into_iter()
            .filter_map(|item| keep_parsed(item.into_record()))
            .collect())
    }

    async fn fetch_events(&self, address: &str) -> Result<Vec<TransferEvent>, ExplorerError> {
        let query = [
            ("module", "account".to_string()),
            ("action", "tokentx".to_string()),
            ("address", address.to_lowercase()),
        ];
        let items: Vec<TokenTransferItem> = self.fetch_module(&query).await?;
        Ok(items
            .into_iter()
            .filter_map(|item| keep_parsed(item.into_event()))
            .collect())
    }

    async fn fetch_internal_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<InternalTransaction>, ExplorerError> {
        let query = [
            ("module", "account".to_string()),
            ("action", "txlistinternal".to_string()),
            ("address", address.to_lowercase()),
        ];
        let items: Vec<InternalTxItem> = self.fetch_module(&query).await?;
        Ok(items
            .into_iter()
            .filter_map(|item| keep_parsed(item.into_internal()))
            .collect())
    }

    async fn fetch_transaction(&self, hash: &str) -> Result<TransactionRecord, ExplorerError> {
        let query = [
            ("module", "transaction".to_string()),
            ("action", "gettxinfo".to_string()),
            ("txhash", hash.to_string()),
        ];
        let item: TxInfoItem = self.fetch_module(&query).await?;
        item.into_record()
    }

    async fn fetch_nft(&self, address: &str) -> Result<NftInfo, ExplorerError> {
        let path = format!("/tokens/{}", address.to_lowercase());
        let token: types::V2Token = self.fetch_v2(&path, &[]).await?;
        Ok(token.into_nft_info())
    }

    /// Walks the owned-NFT pages of `address` and keeps the instances
    /// belonging to `nft_address`. The walk stops at the configured page
    /// cap; very large collections come back truncated.
    async fn fetch_owned_nfts(
        &self,
        address: &str,
        nft_address: &str,
    ) -> Result<Vec<NftInstance>, ExplorerError> {
        let path = format!("/addresses/{}/nft", address.to_lowercase());
        let base_query = vec![("type".to_string(), "ERC-721".to_string())];

        let mut query = base_query.clone();
        let mut owned = Vec::new();
        let mut pages_fetched = 0;
        loop {
            let page: V2NftPage = self.fetch_v2(&path, &query).await?;
            pages_fetched += 1;
            owned.extend(
                page.items
                    .into_iter()
                    .filter(|item| item.token.address.eq_ignore_ascii_case(nft_address))
                    .map(V2NftItem::into_instance),
            );
            match page.next_page_params {
                None => break,
                Some(next) => {
                    if pages_fetched >= self.nft_page_cap {
                        warn!(
                            "NFT listing for {} truncated after {} pages",
                            address, pages_fetched
                        );
                        break;
                    }
                    query = base_query.clone();
                    query.extend(next_page_query(&next));
                }
            }
        }
        Ok(owned)
    }
}

/// Turns a `next_page_params` object into query parameters for the
/// following request. Non-scalar values never occur upstream and are
/// skipped.
fn next_page_query(params: &serde_json::Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

#[async_trait]
impl ChainDataSource for BlockscoutClient {
    async fn get_tokens(&self) -> CoreResult<Vec<TokenInfo>> {
        Ok(self.fetch_tokens().await?)
    }

    async fn get_tokens_by_address(&self, address: &str) -> CoreResult<Vec<TokenWithBalance>> {
        Ok(self.fetch_token_balances(address).await?)
    }

    async fn get_rbtc_balance_by_address(&self, address: &str) -> CoreResult<TokenWithBalance> {
        Ok(self.fetch_rbtc_balance(address).await?)
    }

    async fn get_transactions_by_address(
        &self,
        address: &str,
        params: &TransactionPageParams,
    ) -> CoreResult<Page<TransactionRecord>> {
        let data = self.fetch_transactions(address, params).await?;
        Ok(Page {
            prev: None,
            next: None,
            data,
        })
    }

    async fn get_events_by_address(&self, address: &str) -> CoreResult<Vec<TransferEvent>> {
        Ok(self.fetch_events(address).await?)
    }

    async fn get_internal_transactions_by_address(
        &self,
        address: &str,
    ) -> CoreResult<Vec<InternalTransaction>> {
        Ok(self.fetch_internal_transactions(address).await?)
    }

    async fn get_transaction(&self, hash: &str) -> CoreResult<TransactionRecord> {
        Ok(self.fetch_transaction(hash).await?)
    }

    async fn get_nft(&self, address: &str) -> CoreResult<NftInfo> {
        Ok(self.fetch_nft(address).await?)
    }

    async fn get_nft_owned_by_address(
        &self,
        address: &str,
        nft_address: &str,
    ) -> CoreResult<Vec<NftInstance>> {
        Ok(self.fetch_owned_nfts(address, nft_address).await?)
    }
}
