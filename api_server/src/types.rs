use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wallet_core::Flow;

/// Standard API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Query parameters for chain-scoped lookups
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainQuery {
    pub chain_id: Option<String>,
}

/// Query parameters for transaction history and address details
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    pub chain_id: Option<String>,
    pub limit: Option<u32>,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub block_number: Option<u64>,
    #[serde(default)]
    pub flow: Flow,
}

/// Query parameters for price lookups
#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub addresses: Option<String>,
    pub convert: Option<String>,
}
