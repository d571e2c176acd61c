pub mod address_service;
pub mod reconciler;

// Re-export the service facade and the reconciliation entry point
pub use address_service::{AddressDetails, AddressService};
pub use reconciler::reconcile;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Chain {0} is not supported")]
    UnsupportedChain(String),
    #[error("Explorer source error: {0}")]
    Source(String),
    #[error("Node provider error: {0}")]
    Node(String),
    #[error("Price source error: {0}")]
    Price(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Zero address standing in for the chain's native coin in token lists
/// and price maps.
pub const NATIVE_COIN_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Normalized on-chain transaction as served by the public API.
///
/// The hash is the identity of the record: the same transaction reported
/// by different upstream endpoints always carries the same hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Transaction hash, unique within a reconciled page
    pub hash: String,

    pub nonce: u64,

    pub block_hash: String,

    /// Block the transaction was mined in, the ordering key
    pub block_number: u64,

    pub transaction_index: u64,

    pub from: String,

    /// Missing for contract creations
    pub to: Option<String>,

    /// Gas limit as a raw integer string
    pub gas: String,

    /// Gas price in wei as a raw integer string
    pub gas_price: String,

    /// Transferred amount in wei as a raw integer string
    pub value: String,

    /// Call data, hex encoded
    pub input: String,

    /// Unix timestamp of the containing block
    pub timestamp: i64,

    /// False when the receipt reports a failed execution
    pub success: bool,
}

/// Token transfer event extracted from a transaction's logs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferEvent {
    /// Hash of the transaction that emitted the event
    pub transaction_hash: String,

    pub block_number: u64,

    pub from: String,

    pub to: String,

    /// Token contract that emitted the transfer
    pub contract_address: String,

    /// Token amount as a raw integer string
    pub value: String,

    /// Token metadata, present only when the source inlines it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_decimals: Option<u32>,

    pub timestamp: i64,
}

/// Value movement triggered by contract execution rather than by a
/// directly signed transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InternalTransaction {
    /// Hash of the enclosing transaction
    pub transaction_hash: String,

    pub block_number: u64,

    pub from: String,

    pub to: String,

    /// Raw amount moved by the internal call
    pub value: String,

    pub call_type: String,

    pub success: bool,

    pub timestamp: i64,
}

/// Direction filter for address history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    #[default]
    All,
    To,
    From,
}

/// One page of results together with the opaque cursors of its source.
///
/// Cursors are produced and consumed only by the data source that emitted
/// them; nothing else inspects their contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub prev: Option<String>,
    pub next: Option<String>,
    pub data: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            prev: None,
            next: None,
            data: Vec::new(),
        }
    }
}

/// Cursor and filter parameters for a transaction history query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPageParams {
    pub limit: Option<u32>,

    pub prev: Option<String>,

    pub next: Option<String>,

    /// Lowest block number supplementary records may come from
    pub block_number: u64,
}

/// Token metadata as listed by an explorer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub contract_address: String,
    pub decimals: u32,
}

/// Token metadata together with the queried address's balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenWithBalance {
    pub name: String,
    pub symbol: String,
    pub contract_address: String,
    pub decimals: u32,
    /// Raw balance in the token's smallest unit, encoding preserved
    /// from the source
    pub balance: String,
}

/// Wraps a raw native-coin balance as the pseudo-token entry appended to
/// token balance lists. Chain 31 is the Rootstock testnet, which prefixes
/// the symbol.
pub fn native_coin_balance(balance: impl Into<String>, chain_id: &str) -> TokenWithBalance {
    let symbol = if chain_id == "31" { "tRBTC" } else { "RBTC" };
    TokenWithBalance {
        name: "RBTC".to_string(),
        symbol: symbol.to_string(),
        contract_address: NATIVE_COIN_ADDRESS.to_string(),
        decimals: 18,
        balance: balance.into(),
    }
}

/// Collection-level NFT metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NftInfo {
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub token_type: String,
    pub holders: Option<u64>,
    pub total_supply: Option<String>,
    pub icon_url: Option<String>,
}

/// A single NFT instance owned by an address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NftInstance {
    pub id: String,
    pub token_address: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub animation_url: Option<String>,
    pub external_url: Option<String>,
}

/// Latest quote for a token in the requested fiat currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPrice {
    pub price: Decimal,
    pub last_updated: DateTime<Utc>,
}

/// Price map keyed by lowercase token contract address.
pub type Prices = HashMap<String, TokenPrice>;

/// Common view over records that reference an enclosing transaction.
///
/// Both transfer events and internal transactions only matter to the
/// history of an address when that address sits on the right side of the
/// movement; `matches_flow` is that check.
pub trait TransactionParticipant {
    fn transaction_hash(&self) -> &str;
    fn block_number(&self) -> u64;
    fn from(&self) -> &str;
    fn to(&self) -> &str;

    /// Whether the record involves `address` in the direction `flow`
    /// asks for. Address comparison is case-insensitive.
    fn matches_flow(&self, address: &str, flow: Flow) -> bool {
        let sent = self.from().eq_ignore_ascii_case(address);
        let received = self.to().eq_ignore_ascii_case(address);
        match flow {
            Flow::All => sent || received,
            Flow::From => sent,
            Flow::To => received,
        }
    }
}

impl TransactionParticipant for TransferEvent {
    fn transaction_hash(&self) -> &str {
        &self.transaction_hash
    }

    fn block_number(&self) -> u64 {
        self.block_number
    }

    fn from(&self) -> &str {
        &self.from
    }

    fn to(&self) -> &str {
        &self.to
    }
}

impl TransactionParticipant for InternalTransaction {
    fn transaction_hash(&self) -> &str {
        &self.transaction_hash
    }

    fn block_number(&self) -> u64 {
        self.block_number
    }

    fn from(&self) -> &str {
        &self.from
    }

    fn to(&self) -> &str {
        &self.to
    }
}

/// Trait for explorer-backed chain data.
///
/// One implementation exists per upstream explorer API flavor; callers
/// pick the implementation through a chain-id keyed map built at startup.
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    /// List the tokens the explorer knows about
    async fn get_tokens(&self) -> Result<Vec<TokenInfo>>;

    /// ERC20 balances held by an address
    async fn get_tokens_by_address(&self, address: &str) -> Result<Vec<TokenWithBalance>>;

    /// Native-coin balance of an address as tracked by the explorer
    async fn get_rbtc_balance_by_address(&self, address: &str) -> Result<TokenWithBalance>;

    /// One page of transactions sent or received by an address
    async fn get_transactions_by_address(
        &self,
        address: &str,
        params: &TransactionPageParams,
    ) -> Result<Page<TransactionRecord>>;

    /// Token transfer events involving an address
    async fn get_events_by_address(&self, address: &str) -> Result<Vec<TransferEvent>>;

    /// Internal transactions involving an address
    async fn get_internal_transactions_by_address(
        &self,
        address: &str,
    ) -> Result<Vec<InternalTransaction>>;

    /// Full record of a single transaction by hash
    async fn get_transaction(&self, hash: &str) -> Result<TransactionRecord>;

    /// Collection metadata for an NFT contract
    async fn get_nft(&self, address: &str) -> Result<NftInfo>;

    /// NFT instances of one collection owned by an address
    async fn get_nft_owned_by_address(
        &self,
        address: &str,
        nft_address: &str,
    ) -> Result<Vec<NftInstance>>;
}

/// Trait for on-chain state read straight from a node instead of an
/// explorer.
#[async_trait]
pub trait NodeProvider: Send + Sync {
    /// Current native-coin balance of `address`, hex encoded as the node
    /// returns it
    async fn get_balance(&self, address: &str) -> Result<String>;
}

/// Trait for fiat price quotes.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Quotes for the given token addresses, fetching whatever is not
    /// cached
    async fn get_prices(&self, addresses: &[String], convert: &str) -> Result<Prices>;

    /// The cached snapshot, never triggering a fetch
    async fn latest_prices(&self) -> Prices;
}
