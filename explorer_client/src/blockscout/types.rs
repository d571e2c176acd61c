//! Wire shapes for the Blockscout API.
//!
//! The module/action endpoints (Etherscan compatible) carry every numeric
//! field as a string; the v2 REST endpoints use snake_case objects. Both
//! get parsed here and converted to `wallet_core` types before anything
//! else sees them.

use crate::error::ExplorerError;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use wallet_core::{
    InternalTransaction, NftInfo, NftInstance, TokenInfo, TokenWithBalance, TransactionRecord,
    TransferEvent,
};

/// Envelope of every module/action response.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleResponse {
    pub message: String,
    pub status: String,
    pub result: Value,
}

/// Unwraps a module/action envelope into its typed payload.
///
/// Blockscout signals errors with `status: "0"` and a bare string in
/// `result`, but also uses `status: "0"` for empty lists, so the payload
/// parse decides which case this is.
pub fn decode_result<T: serde::de::DeserializeOwned>(
    envelope: ModuleResponse,
) -> Result<T, ExplorerError> {
    match serde_json::from_value(envelope.result) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            if envelope.status != "1" {
                Err(ExplorerError::Api {
                    message: envelope.message,
                })
            } else {
                Err(ExplorerError::Json(e))
            }
        }
    }
}

/// Keeps successfully converted records and logs the rest away.
pub fn keep_parsed<T>(result: Result<T, ExplorerError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Dropping malformed upstream record: {}", e);
            None
        }
    }
}

fn parse_u64(field: &'static str, raw: &str) -> Result<u64, ExplorerError> {
    raw.parse().map_err(|_| ExplorerError::Parse {
        message: format!("{} is not a number: {:?}", field, raw),
    })
}

fn parse_i64(field: &'static str, raw: &str) -> Result<i64, ExplorerError> {
    raw.parse().map_err(|_| ExplorerError::Parse {
        message: format!("{} is not a number: {:?}", field, raw),
    })
}

/// `account/txlist` item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxListItem {
    pub block_hash: String,
    pub block_number: String,
    #[serde(default)]
    pub confirmations: String,
    #[serde(default)]
    pub contract_address: String,
    #[serde(default)]
    pub cumulative_gas_used: String,
    pub from: String,
    pub gas: String,
    pub gas_price: String,
    #[serde(default)]
    pub gas_used: String,
    pub hash: String,
    pub input: String,
    pub is_error: String,
    pub nonce: String,
    pub time_stamp: String,
    pub to: String,
    pub transaction_index: String,
    #[serde(default, rename = "txreceipt_status")]
    pub txreceipt_status: String,
    pub value: String,
}

impl TxListItem {
    pub fn into_record(self) -> Result<TransactionRecord, ExplorerError> {
        Ok(TransactionRecord {
            block_number: parse_u64("blockNumber", &self.block_number)?,
            nonce: parse_u64("nonce", &self.nonce)?,
            transaction_index: parse_u64("transactionIndex", &self.transaction_index)?,
            timestamp: parse_i64("timeStamp", &self.time_stamp)?,
            hash: self.hash,
            block_hash: self.block_hash,
            from: self.from,
            to: if self.to.is_empty() {
                None
            } else {
                Some(self.to)
            },
            gas: self.gas,
            gas_price: self.gas_price,
            value: self.value,
            input: self.input,
            success: self.is_error == "0",
        })
    }
}

/// `transaction/gettxinfo` result. Carries fewer fields than a txlist
/// item; the absent ones normalize to zero values so the merged history
/// keeps a single record shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxInfoItem {
    pub hash: String,
    pub block_number: String,
    pub time_stamp: String,
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub value: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub gas_limit: String,
    #[serde(default)]
    pub gas_price: String,
    #[serde(default)]
    pub gas_used: String,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub revert_reason: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub transaction_index: Option<String>,
}

impl TxInfoItem {
    pub fn into_record(self) -> Result<TransactionRecord, ExplorerError> {
        let nonce = match self.nonce.as_deref() {
            Some(raw) => parse_u64("nonce", raw)?,
            None => 0,
        };
        let transaction_index = match self.transaction_index.as_deref() {
            Some(raw) => parse_u64("transactionIndex", raw)?,
            None => 0,
        };
        Ok(TransactionRecord {
            block_number: parse_u64("blockNumber", &self.block_number)?,
            timestamp: parse_i64("timeStamp", &self.time_stamp)?,
            nonce,
            transaction_index,
            hash: self.hash,
            block_hash: self.block_hash.unwrap_or_default(),
            from: self.from,
            to: if self.to.is_empty() {
                None
            } else {
                Some(self.to)
            },
            gas: self.gas_limit,
            gas_price: self.gas_price,
            value: self.value,
            input: self.input,
            success: self.success.unwrap_or(true),
        })
    }
}

/// `account/tokentx` item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransferItem {
    pub block_hash: String,
    pub block_number: String,
    #[serde(default)]
    pub confirmations: String,
    pub contract_address: String,
    #[serde(default)]
    pub cumulative_gas_used: String,
    pub from: String,
    #[serde(default)]
    pub gas: String,
    #[serde(default)]
    pub gas_price: String,
    #[serde(default)]
    pub gas_used: String,
    pub hash: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub log_index: String,
    #[serde(default)]
    pub nonce: String,
    pub time_stamp: String,
    pub to: String,
    #[serde(default)]
    pub token_decimal: String,
    #[serde(default)]
    pub token_name: String,
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default)]
    pub transaction_index: String,
    pub value: String,
}

impl TokenTransferItem {
    pub fn into_event(self) -> Result<TransferEvent, ExplorerError> {
        Ok(TransferEvent {
            block_number: parse_u64("blockNumber", &self.block_number)?,
            timestamp: parse_i64("timeStamp", &self.time_stamp)?,
            transaction_hash: self.hash,
            from: self.from,
            to: self.to,
            contract_address: self.contract_address,
            value: self.value,
            token_name: Some(self.token_name),
            token_symbol: Some(self.token_symbol),
            token_decimals: self.token_decimal.parse().ok(),
        })
    }
}

/// `account/txlistinternal` item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalTxItem {
    pub block_number: String,
    #[serde(default)]
    pub call_type: String,
    #[serde(default)]
    pub contract_address: String,
    #[serde(default)]
    pub err_code: String,
    pub from: String,
    #[serde(default)]
    pub gas: String,
    #[serde(default)]
    pub gas_used: String,
    #[serde(default)]
    pub index: String,
    #[serde(default)]
    pub input: String,
    pub is_error: String,
    pub time_stamp: String,
    #[serde(default)]
    pub to: String,
    pub transaction_hash: String,
    #[serde(default, rename = "type")]
    pub item_type: String,
    pub value: String,
}

impl InternalTxItem {
    pub fn into_internal(self) -> Result<InternalTransaction, ExplorerError> {
        Ok(InternalTransaction {
            block_number: parse_u64("blockNumber", &self.block_number)?,
            timestamp: parse_i64("timeStamp", &self.time_stamp)?,
            transaction_hash: self.transaction_hash,
            from: self.from,
            to: self.to,
            value: self.value,
            call_type: if self.call_type.is_empty() {
                self.item_type
            } else {
                self.call_type
            },
            success: self.is_error == "0",
        })
    }
}

/// Token object shared by the v2 endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct V2Token {
    pub address: String,
    #[serde(default)]
    pub circulating_market_cap: Option<String>,
    #[serde(default)]
    pub decimals: Option<String>,
    #[serde(default)]
    pub exchange_rate: Option<String>,
    #[serde(default)]
    pub holders: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub total_supply: Option<String>,
    #[serde(rename = "type")]
    pub token_type: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl V2Token {
    /// Listing entry, skipped when the token has no name to show.
    pub fn into_token_info(self) -> Option<TokenInfo> {
        let name = self.name?;
        Some(TokenInfo {
            name,
            symbol: self.symbol.unwrap_or_default(),
            contract_address: self.address,
            decimals: self.decimals.and_then(|d| d.parse().ok()).unwrap_or(0),
        })
    }

    pub fn into_nft_info(self) -> NftInfo {
        NftInfo {
            address: self.address,
            name: self.name,
            symbol: self.symbol,
            token_type: self.token_type,
            holders: self.holders.and_then(|h| h.parse().ok()),
            total_supply: self.total_supply,
            icon_url: self.icon_url,
        }
    }
}

/// `/v2/tokens` page.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenListResponse {
    pub items: Vec<V2Token>,
    #[serde(default)]
    pub next_page_params: Option<Value>,
}

/// `/v2/addresses/{address}/token-balances` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct V2TokenBalance {
    pub token: V2Token,
    #[serde(default)]
    pub token_id: Option<Value>,
    #[serde(default)]
    pub token_instance: Option<Value>,
    pub value: String,
}

impl V2TokenBalance {
    /// Balance entry, skipped when the token has no name (the upstream
    /// reports spam transfers that way).
    pub fn into_token_with_balance(self) -> Option<TokenWithBalance> {
        let name = self.token.name?;
        Some(TokenWithBalance {
            name,
            symbol: self.token.symbol.unwrap_or_default(),
            contract_address: self.token.address,
            decimals: self.token.decimals.and_then(|d| d.parse().ok()).unwrap_or(0),
            balance: self.value,
        })
    }
}

/// `/v2/addresses/{address}` subset. The endpoint returns a much larger
/// object; only the balance matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct V2AddressInfo {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub coin_balance: Option<String>,
    #[serde(default)]
    pub block_number_balance_updated_at: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct V2NftMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
}

/// `/v2/addresses/{address}/nft` item.
#[derive(Debug, Clone, Deserialize)]
pub struct V2NftItem {
    #[serde(default)]
    pub id: Option<String>,
    pub token: V2Token,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub animation_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub metadata: Option<V2NftMetadata>,
}

impl V2NftItem {
    pub fn into_instance(self) -> NftInstance {
        let metadata = self.metadata.unwrap_or_default();
        NftInstance {
            id: self.id.unwrap_or_default(),
            token_address: self.token.address,
            name: metadata.name.or(self.token.name),
            description: metadata.description,
            image_url: self.image_url.or(metadata.image),
            animation_url: self.animation_url,
            external_url: self.external_url.or(metadata.external_url),
        }
    }
}

/// `/v2/addresses/{address}/nft` page.
#[derive(Debug, Clone, Deserialize)]
pub struct V2NftPage {
    pub items: Vec<V2NftItem>,
    #[serde(default)]
    pub next_page_params: Option<serde_json::Map<String, Value>>,
}
