//! HTTP clients for the upstream chain data providers.
//!
//! Two explorer flavors are supported behind `wallet_core::ChainDataSource`:
//! the cursor-paginated Rootstock explorer API and the Etherscan-compatible
//! Blockscout API. `RskNodeClient` reads balances straight from a node over
//! JSON-RPC. Each adapter parses its own wire schema and hands out only the
//! normalized `wallet_core` types.

pub mod blockscout;
pub mod error;
pub mod node;
pub mod rsk_explorer;

pub use blockscout::BlockscoutClient;
pub use error::ExplorerError;
pub use node::RskNodeClient;
pub use rsk_explorer::RskExplorerClient;
