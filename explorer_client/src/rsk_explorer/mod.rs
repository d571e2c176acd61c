//! Rootstock-explorer-backed `ChainDataSource`.
//!
//! Every operation goes through the query-style `?module=...&action=...` API.
//! Transaction listings are cursor paginated: the envelope's `pages`
//! cursors pass through to the caller untouched and come back in later
//! requests as the `prev`/`next` parameters. NFT endpoints do not exist
//! in this API version.

pub mod types;

use crate::error::ExplorerError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use types::{
    ExplorerAddress, ExplorerEnvelope, ExplorerEvent, ExplorerInternalTransaction,
    ExplorerToken, ExplorerTransaction,
};
use wallet_core::{
    native_coin_balance, ChainDataSource, InternalTransaction, NftInfo, NftInstance, Page,
    Result as CoreResult, TokenInfo, TokenWithBalance, TransactionPageParams, TransactionRecord,
    TransferEvent,
};

#[derive(Debug, Clone)]
pub struct RskExplorerClient {
    client: Client,
    base_url: String,
    chain_id: String,
}

impl RskExplorerClient {
    pub fn new(
        base_url: impl Into<String>,
        chain_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ExplorerError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            chain_id: chain_id.into(),
        })
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, String)],
    ) -> Result<ExplorerEnvelope<T>, ExplorerError> {
        debug!("GET {} {:?}", self.base_url, params);
        Ok(self
            .client
            .get(&self.base_url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn fetch_transaction_page(
        &self,
        address: &str,
        params: &TransactionPageParams,
    ) -> Result<Page<TransactionRecord>, ExplorerError> {
        let mut query = vec![
            ("module", "transactions".to_string()),
            ("action", "getTransactionsByAddress".to_string()),
            ("address", address.to_lowercase()),
        ];
        if let Some(limit) = params.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(prev) = &params.prev {
            query.push(("prev", prev.clone()));
        }
        if let Some(next) = &params.next {
            query.push(("next", next.clone()));
        }
        if params.block_number > 0 {
            query.push(("blockNumber", params.block_number.to_string()));
        }

        let mut envelope: ExplorerEnvelope<Vec<ExplorerTransaction>> = self.fetch(&query).await?;
        let cursors = envelope.pages.take().unwrap_or_default();
        let data = envelope
            .into_data()?
            .into_iter()
            .map(ExplorerTransaction::into_record)
            .collect();
        Ok(Page {
            prev: cursors.prev,
            next: cursors.next,
            data,
        })
    }

    async fn fetch_transaction(&self, hash: &str) -> Result<TransactionRecord, ExplorerError> {
        let query = [
            ("module", "transactions".to_string()),
            ("action", "getTransaction".to_string()),
            ("hash", hash.to_string()),
        ];
        let envelope: ExplorerEnvelope<ExplorerTransaction> = self.fetch(&query).await?;
        Ok(envelope.into_data()?.into_record())
    }

    async fn fetch_events(&self, address: &str) -> Result<Vec<TransferEvent>, ExplorerError> {
        let query = [
            ("module", "events".to_string()),
            ("action", "getAllEventsByAddress".to_string()),
            ("address", address.to_lowercase()),
        ];
        let envelope: ExplorerEnvelope<Vec<ExplorerEvent>> = self.fetch(&query).await?;
        Ok(envelope
            .into_data()?
            .into_iter()
            .filter_map(ExplorerEvent::into_transfer)
            .collect())
    }

    async fn fetch_internal_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<InternalTransaction>, ExplorerError> {
        let query = [
            ("module", "internalTransactions".to_string()),
            ("action", "getInternalTransactionsByAddress".to_string()),
            ("address", address.to_lowercase()),
        ];
        let envelope: ExplorerEnvelope<Vec<ExplorerInternalTransaction>> =
            self.fetch(&query).await?;
        Ok(envelope
            .into_data()?
            .into_iter()
            .map(ExplorerInternalTransaction::into_internal)
            .collect())
    }

    async fn fetch_tokens(&self) -> Result<Vec<TokenInfo>, ExplorerError> {
        let query = [
            ("module", "tokens".to_string()),
            ("action", "getTokens".to_string()),
        ];
        let envelope: ExplorerEnvelope<Vec<ExplorerToken>> = self.fetch(&query).await?;
        Ok(envelope
            .into_data()?
            .into_iter()
            .filter_map(ExplorerToken::into_token_info)
            .collect())
    }

    async fn fetch_token_balances(
        &self,
        address: &str,
    ) -> Result<Vec<TokenWithBalance>, ExplorerError> {
        let query = [
            ("module", "addresses".to_string()),
            ("action", "getTokensByAddress".to_string()),
            ("address", address.to_lowercase()),
        ];
        let envelope: ExplorerEnvelope<Vec<ExplorerToken>> = self.fetch(&query).await?;
        Ok(envelope
            .into_data()?
            .into_iter()
            .filter_map(ExplorerToken::into_token_with_balance)
            .collect())
    }

    async fn fetch_rbtc_balance(&self, address: &str) -> Result<TokenWithBalance, ExplorerError> {
        let query = [
            ("module", "addresses".to_string()),
            ("action", "getAddress".to_string()),
            ("address", address.to_lowercase()),
        ];
        let envelope: ExplorerEnvelope<ExplorerAddress> = self.fetch(&query).await?;
        let info = envelope.into_data()?;
        let balance = info.balance.unwrap_or_else(|| "0x0".to_string());
        Ok(native_coin_balance(balance, &self.chain_id))
    }
}

#[async_trait]
impl ChainDataSource for RskExplorerClient {
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
        Ok(self.fetch_transaction_page(address, params).await?)
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

    async fn get_nft(&self, _address: &str) -> CoreResult<NftInfo> {
        Err(ExplorerError::Unsupported {
            operation: "getNft",
        }
        .into())
    }

    async fn get_nft_owned_by_address(
        &self,
        _address: &str,
        _nft_address: &str,
    ) -> CoreResult<Vec<NftInstance>> {
        Err(ExplorerError::Unsupported {
            operation: "getNftOwnedByAddress",
        }
        .into())
    }
}
