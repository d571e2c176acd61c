//! Wire shapes for the Rootstock explorer API.
//!
//! Unlike Blockscout, this backend returns numeric fields as JSON numbers
//! and wraps every payload in an envelope with optional `pages` cursors.

use crate::error::ExplorerError;
use serde::Deserialize;
use wallet_core::{
    InternalTransaction, TokenInfo, TokenWithBalance, TransactionRecord, TransferEvent,
};

/// Envelope of every response. `pages` shows up on paginated listings.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ExplorerEnvelope<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub pages: Option<PageCursors>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ExplorerEnvelope<T> {
    /// Payload of the envelope, or the upstream error message.
    pub fn into_data(self) -> Result<T, ExplorerError> {
        if let Some(message) = self.error {
            return Err(ExplorerError::Api { message });
        }
        self.data.ok_or_else(|| ExplorerError::Api {
            message: "response carried no data".to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageCursors {
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerTransaction {
    pub hash: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub block_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub transaction_index: u64,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub gas: u64,
    #[serde(default)]
    pub gas_price: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub input: String,
    pub timestamp: i64,
    #[serde(default)]
    pub receipt: Option<TransactionReceipt>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionReceipt {
    #[serde(default)]
    pub status: Option<String>,
}

impl ExplorerTransaction {
    pub fn into_record(self) -> TransactionRecord {
        // Pre-Byzantium receipts have no status field; those count as
        // successful, matching how the explorer itself renders them.
        let success = match self.receipt.and_then(|r| r.status) {
            Some(status) => status == "0x1" || status == "0x01",
            None => true,
        };
        TransactionRecord {
            hash: self.hash,
            nonce: self.nonce,
            block_hash: self.block_hash,
            block_number: self.block_number,
            transaction_index: self.transaction_index,
            from: self.from,
            to: self.to,
            gas: self.gas.to_string(),
            gas_price: self.gas_price,
            value: self.value,
            input: self.input,
            timestamp: self.timestamp,
            success,
        }
    }
}

/// Contract event as indexed by the explorer. For `Transfer` events the
/// `args` array is positional: `[from, to, value]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerEvent {
    #[serde(default)]
    pub event: Option<String>,
    pub address: String,
    pub tx_hash: String,
    pub block_number: u64,
    pub timestamp: i64,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ExplorerEvent {
    /// `Transfer` events become [`TransferEvent`]s; everything else
    /// (approvals, custom events) is skipped. The explorer does not
    /// inline token metadata, so those fields stay empty.
    pub fn into_transfer(self) -> Option<TransferEvent> {
        if self.event.as_deref() != Some("Transfer") {
            return None;
        }
        let mut args = self.args.into_iter();
        let from = args.next()?;
        let to = args.next()?;
        let value = args.next().unwrap_or_else(|| "0x0".to_string());
        Some(TransferEvent {
            transaction_hash: self.tx_hash,
            block_number: self.block_number,
            from,
            to,
            contract_address: self.address,
            value,
            token_name: None,
            token_symbol: None,
            token_decimals: None,
            timestamp: self.timestamp,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerInternalTransaction {
    pub transaction_hash: String,
    pub block_number: u64,
    pub timestamp: i64,
    #[serde(default)]
    pub internal_tx_id: Option<String>,
    pub action: InternalAction,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalAction {
    #[serde(default)]
    pub call_type: Option<String>,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl ExplorerInternalTransaction {
    pub fn into_internal(self) -> InternalTransaction {
        InternalTransaction {
            transaction_hash: self.transaction_hash,
            block_number: self.block_number,
            timestamp: self.timestamp,
            from: self.action.from,
            to: self.action.to.unwrap_or_default(),
            value: self.action.value.unwrap_or_else(|| "0x0".to_string()),
            call_type: self.action.call_type.unwrap_or_else(|| "call".to_string()),
            success: self.error.is_none(),
        }
    }
}

/// Token entry of the `tokens` and `addresses` modules. The same shape
/// serves the plain listing and the per-address balances.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerToken {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub balance: Option<String>,
}

impl ExplorerToken {
    pub fn into_token_info(self) -> Option<TokenInfo> {
        let name = self.name?;
        Some(TokenInfo {
            name,
            symbol: self.symbol.unwrap_or_default(),
            contract_address: self.address,
            decimals: self.decimals.unwrap_or(0),
        })
    }

    pub fn into_token_with_balance(self) -> Option<TokenWithBalance> {
        let name = self.name?;
        Some(TokenWithBalance {
            name,
            symbol: self.symbol.unwrap_or_default(),
            contract_address: self.address,
            decimals: self.decimals.unwrap_or(0),
            balance: self.balance.unwrap_or_else(|| "0x0".to_string()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerAddress {
    pub address: String,
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default, rename = "type")]
    pub address_type: Option<String>,
}
