use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] ConfigError),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;

/// Which explorer backend serves a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    RskExplorer,
    Blockscout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// API server configuration
    pub api: ApiConfig,

    /// Served chains, keyed by chain id ("30", "31")
    pub chains: HashMap<String, ChainConfig>,

    /// Chain used when a request does not name one
    pub default_chain_id: String,

    /// CoinMarketCap API configuration
    pub coinmarketcap: CoinMarketCapConfig,

    /// Price cache and poller configuration
    pub prices: PricesConfig,

    /// NFT listing configuration
    pub nft: NftConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API server host
    pub host: String,

    /// API server port
    pub port: u16,

    /// Browser origins allowed through CORS
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Explorer backend flavour for this chain
    pub provider: ProviderKind,

    /// Explorer API base URL
    pub explorer_url: String,

    /// JSON-RPC node URL
    pub node_url: String,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinMarketCapConfig {
    /// CoinMarketCap API key
    pub api_key: String,

    /// CoinMarketCap API base URL
    pub api_base_url: String,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricesConfig {
    /// Poll interval for the background price refresh in seconds
    pub poll_interval_seconds: u64,

    /// How long a cached quote stays servable in seconds
    pub cache_ttl_seconds: u64,

    /// Currency quotes are cached in
    pub default_convert: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftConfig {
    /// Page cap for owned-NFT listings on paginated explorers
    pub owned_page_cap: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut chains = HashMap::new();
        chains.insert(
            "30".to_string(),
            ChainConfig {
                provider: ProviderKind::Blockscout,
                explorer_url: "https://rootstock.blockscout.com/api".to_string(),
                node_url: "https://public-node.rsk.co".to_string(),
                request_timeout_seconds: 30,
            },
        );
        chains.insert(
            "31".to_string(),
            ChainConfig {
                provider: ProviderKind::RskExplorer,
                explorer_url: "https://backend.explorer.testnet.rootstock.io/api".to_string(),
                node_url: "https://public-node.testnet.rsk.co".to_string(),
                request_timeout_seconds: 30,
            },
        );

        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_allowed_origins: vec![
                    "https://dapp.testnet.dao.rif.technology".to_string(),
                    "https://dapp.mainnet.dao.rif.technology".to_string(),
                    "https://rif-wallet-services.testnet.rifcomputing.net".to_string(),
                    "https://dao-backend.testnet.rifcomputing.net".to_string(),
                    "https://frontend.testnet.dao.rif.technology".to_string(),
                ],
            },
            chains,
            default_chain_id: "31".to_string(),
            coinmarketcap: CoinMarketCapConfig {
                api_key: "".to_string(), // Must be set in .env or config file
                api_base_url: "https://pro-api.coinmarketcap.com".to_string(),
                request_timeout_seconds: 30,
            },
            prices: PricesConfig {
                poll_interval_seconds: 300,
                cache_ttl_seconds: 300,
                default_convert: "USD".to_string(),
            },
            nft: NftConfig {
                owned_page_cap: 10,
            },
        }
    }
}

impl ChainConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl CoinMarketCapConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl PricesConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl SystemConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut config_builder = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&SystemConfig::default())?);

        // Add config file if it exists
        if config_path.as_ref().exists() {
            info!(
                "Loading configuration from: {}",
                config_path.as_ref().display()
            );
            config_builder = config_builder.add_source(File::from(config_path.as_ref()));
        } else {
            debug!("Config file not found, using defaults and environment variables");
        }

        // Add environment variables with prefix
        config_builder = config_builder.add_source(
            Environment::with_prefix("WALLET")
                .try_parsing(true)
                .separator("__")
                .list_separator(","),
        );

        let config = config_builder.build()?;
        let system_config: SystemConfig = config.try_deserialize()?;

        system_config.validate()?;

        if system_config.coinmarketcap.api_key.is_empty() {
            warn!("CoinMarketCap API key is not set, price lookups will fail");
        }

        Ok(system_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.api.port == 0 {
            return Err(ConfigurationError::InvalidValue(
                "API port cannot be 0".to_string(),
            ));
        }

        if self.chains.is_empty() {
            return Err(ConfigurationError::InvalidValue(
                "At least one chain must be configured".to_string(),
            ));
        }

        if !self.chains.contains_key(&self.default_chain_id) {
            return Err(ConfigurationError::InvalidValue(format!(
                "Default chain id '{}' has no chain configuration",
                self.default_chain_id
            )));
        }

        for (chain_id, chain) in &self.chains {
            if chain_id.parse::<u64>().is_err() {
                return Err(ConfigurationError::InvalidValue(format!(
                    "Chain id '{}' is not a decimal chain id",
                    chain_id
                )));
            }
            if chain.explorer_url.is_empty() {
                return Err(ConfigurationError::InvalidValue(format!(
                    "Explorer URL for chain '{}' is required",
                    chain_id
                )));
            }
            if chain.node_url.is_empty() {
                return Err(ConfigurationError::InvalidValue(format!(
                    "Node URL for chain '{}' is required",
                    chain_id
                )));
            }
            if chain.request_timeout_seconds == 0 {
                return Err(ConfigurationError::InvalidValue(format!(
                    "Request timeout for chain '{}' must be greater than 0",
                    chain_id
                )));
            }
        }

        if self.coinmarketcap.request_timeout_seconds == 0 {
            return Err(ConfigurationError::InvalidValue(
                "CoinMarketCap request timeout must be greater than 0".to_string(),
            ));
        }

        if self.prices.poll_interval_seconds == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Price poll interval must be greater than 0".to_string(),
            ));
        }

        if self.nft.owned_page_cap == 0 {
            return Err(ConfigurationError::InvalidValue(
                "NFT owned page cap must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn defaults_validate() {
        let config = SystemConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.default_chain_id, "31");
        assert_eq!(config.chains["31"].provider, ProviderKind::RskExplorer);
        assert_eq!(config.chains["30"].provider, ProviderKind::Blockscout);
    }

    #[test]
    fn unknown_default_chain_fails_validation() {
        let config = SystemConfig {
            default_chain_id: "99".to_string(),
            ..SystemConfig::default()
        };

        let result = config.validate();

        assert!(matches!(result, Err(ConfigurationError::InvalidValue(_))));
    }

    #[test]
    fn file_values_override_defaults() {
        let overrides = r#"
            default_chain_id = "30"

            [api]
            port = 8080

            [chains.30]
            explorer_url = "http://localhost:4444/api"
        "#;
        let config: SystemConfig = Config::builder()
            .add_source(Config::try_from(&SystemConfig::default()).unwrap())
            .add_source(File::from_str(overrides, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.default_chain_id, "30");
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.chains["30"].explorer_url, "http://localhost:4444/api");
        // Untouched fields keep their defaults.
        assert_eq!(config.chains["30"].node_url, "https://public-node.rsk.co");
        assert_eq!(config.api.host, "0.0.0.0");
    }

    #[test]
    fn provider_kind_uses_kebab_case_on_the_wire() {
        let parsed: ProviderKind = serde_json::from_str("\"rsk-explorer\"").unwrap();

        assert_eq!(parsed, ProviderKind::RskExplorer);
        assert_eq!(
            serde_json::to_string(&ProviderKind::Blockscout).unwrap(),
            "\"blockscout\""
        );
    }

    #[test]
    fn non_decimal_chain_ids_are_rejected() {
        let mut config = SystemConfig::default();
        let chain = config.chains["31"].clone();
        config.chains.insert("0x1f".to_string(), chain);

        let result = config.validate();

        assert!(matches!(result, Err(ConfigurationError::InvalidValue(_))));
    }

    #[test]
    fn zero_page_cap_is_rejected() {
        let config = SystemConfig {
            nft: NftConfig { owned_page_cap: 0 },
            ..SystemConfig::default()
        };

        assert!(config.validate().is_err());
    }
}
