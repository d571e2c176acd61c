//! Static tables of what the price feed understands.
//!
//! Quotes are keyed by CoinMarketCap asset id, not by contract address,
//! so only tokens listed here can be priced. Everything else is silently
//! absent from price responses, which is what wallets expect.

use wallet_core::NATIVE_COIN_ADDRESS;

/// Fiat currencies accepted as the `convert` parameter, exactly as the
/// quote API spells them.
pub const SUPPORTED_FIAT: &[&str] = &["USD", "EUR", "GBP", "JPY", "BRL", "ARS"];

pub fn is_fiat_supported(currency: &str) -> bool {
    SUPPORTED_FIAT.contains(&currency)
}

/// CoinMarketCap asset id for a token contract, per chain. Addresses
/// compare lowercased.
pub fn cmc_id(chain_id: &str, address: &str) -> Option<u32> {
    let address = address.to_lowercase();
    match chain_id {
        // Rootstock mainnet: RBTC, RIF, Sovryn
        "30" => match address.as_str() {
            NATIVE_COIN_ADDRESS => Some(3626),
            "0x2acc95758f8b5f583470ba265eb685a8f45fc9d5" => Some(3701),
            "0xefc78fc7d48b64958315949279ba181c2114abbd" => Some(8669),
            _ => None,
        },
        // Rootstock testnet: tRBTC and tRIF track their mainnet assets
        "31" => match address.as_str() {
            NATIVE_COIN_ADDRESS => Some(3626),
            "0x19f64674d8a5b4e652319f5e239efd3bc969a1fe" => Some(3701),
            _ => None,
        },
        _ => None,
    }
}

pub fn is_token_supported(chain_id: &str, address: &str) -> bool {
    cmc_id(chain_id, address).is_some()
}

/// Every priceable contract address of a chain, for the poller.
pub fn supported_tokens(chain_id: &str) -> Vec<&'static str> {
    match chain_id {
        "30" => vec![
            NATIVE_COIN_ADDRESS,
            "0x2acc95758f8b5f583470ba265eb685a8f45fc9d5",
            "0xefc78fc7d48b64958315949279ba181c2114abbd",
        ],
        "31" => vec![
            NATIVE_COIN_ADDRESS,
            "0x19f64674d8a5b4e652319f5e239efd3bc969a1fe",
        ],
        _ => Vec::new(),
    }
}
