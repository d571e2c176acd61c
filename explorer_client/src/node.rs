//! JSON-RPC balance reads from a Rootstock node.
//!
//! Token lists need the live native balance, which explorers only track
//! with a delay; this goes straight to a public node instead.

use crate::error::ExplorerError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use wallet_core::{CoreError, NodeProvider, Result as CoreResult};

#[derive(Debug, Deserialize)]
pub struct RpcEnvelope<T> {
    pub jsonrpc: String,
    pub id: u64,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RskNodeClient {
    client: Client,
    url: String,
}

impl RskNodeClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ExplorerError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn rpc_request(&self, method: &str, params: Value) -> Result<Value, ExplorerError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        debug!("POST {} {}", self.url, method);
        let envelope: RpcEnvelope<Value> = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = envelope.error {
            return Err(ExplorerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        envelope.result.ok_or_else(|| ExplorerError::Rpc {
            code: 0,
            message: format!("{} returned no result", method),
        })
    }

    /// `eth_getBalance` at the latest block, hex string as returned.
    pub async fn balance(&self, address: &str) -> Result<String, ExplorerError> {
        let result = self
            .rpc_request("eth_getBalance", json!([address.to_lowercase(), "latest"]))
            .await?;
        result.as_str().map(str::to_string).ok_or_else(|| {
            ExplorerError::Parse {
                message: format!("eth_getBalance returned a non-string result: {}", result),
            }
        })
    }
}

#[async_trait]
impl NodeProvider for RskNodeClient {
    async fn get_balance(&self, address: &str) -> CoreResult<String> {
        self.balance(address)
            .await
            .map_err(|e| CoreError::Node(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_result_parses() {
        let raw = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "result": "0x56900d33ca7fc0000"
        }"#;

        let envelope: RpcEnvelope<Value> = serde_json::from_str(raw).unwrap();

        assert_eq!(envelope.jsonrpc, "2.0");
        assert_eq!(
            envelope.result.unwrap().as_str(),
            Some("0x56900d33ca7fc0000")
        );
        assert!(envelope.error.is_none());
    }

    #[test]
    fn envelope_with_error_parses() {
        let raw = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "invalid address" }
        }"#;

        let envelope: RpcEnvelope<Value> = serde_json::from_str(raw).unwrap();
        let error = envelope.error.unwrap();

        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "invalid address");
    }
}
