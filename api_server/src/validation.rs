//! Request validation shared by the route handlers.
//!
//! Failures carry the exact messages the wallet frontends match on, so
//! the strings here are part of the API contract.

use crate::ApiError;
use wallet_core::address_service::AddressService;

pub const UNSUPPORTED_CHAIN: &str = "The current chainId is not supported";
pub const INVALID_ADDRESS: &str = "An address is invalid";
pub const UNSUPPORTED_CURRENCY: &str = "The current currency is not supported";

pub fn require_supported_chain(
    service: &AddressService,
    chain_id: &str,
) -> Result<(), ApiError> {
    if service.supports_chain(chain_id) {
        Ok(())
    } else {
        Err(ApiError::Validation(UNSUPPORTED_CHAIN.to_string()))
    }
}

pub fn require_valid_address(address: &str) -> Result<(), ApiError> {
    if is_address(address) {
        Ok(())
    } else {
        Err(ApiError::Validation(INVALID_ADDRESS.to_string()))
    }
}

pub fn require_supported_currency(convert: &str) -> Result<(), ApiError> {
    if price_client::support::is_fiat_supported(convert) {
        Ok(())
    } else {
        Err(ApiError::Validation(UNSUPPORTED_CURRENCY.to_string()))
    }
}

fn is_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksummed_and_lowercase_addresses_pass() {
        assert!(is_address("0x1D81dD47B35fbBbA9E0BB0a9Bdd40D1E7eE6eB3A"));
        assert!(is_address("0x1d81dd47b35fbbba9e0bb0a9bdd40d1e7ee6eb3a"));
    }

    #[test]
    fn malformed_addresses_fail() {
        // Too short, bad prefix, non-hex tail, empty.
        assert!(!is_address("0x1d81dd47b35fbbba9e0bb0a9bdd40d1e7ee6eb3"));
        assert!(!is_address("1d81dd47b35fbbba9e0bb0a9bdd40d1e7ee6eb3a00"));
        assert!(!is_address("0x1d81dd47b35fbbba9e0bb0a9bdd40d1e7ee6ebzz"));
        assert!(!is_address(""));
    }

    #[test]
    fn currency_check_uses_the_fiat_whitelist() {
        assert!(require_supported_currency("USD").is_ok());

        let result = require_supported_currency("XYZ");
        match result {
            Err(ApiError::Validation(message)) => assert_eq!(message, UNSUPPORTED_CURRENCY),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
