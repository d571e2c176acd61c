use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use config_manager::{ProviderKind, SystemConfig};
use explorer_client::{BlockscoutClient, RskExplorerClient, RskNodeClient};
use price_client::{CoinMarketCapClient, LastPrice};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};
use wallet_core::address_service::AddressService;
use wallet_core::{ChainDataSource, CoreError, NodeProvider};

mod dapps;
mod handlers;
mod types;
mod validation;

use handlers::*;
use types::*;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: SystemConfig,
    pub address_service: Arc<AddressService>,
}

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Upstream error: {0}")]
    Upstream(#[from] CoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            // Chain support is validated up front, so this only fires
            // when a request races a config change. Still a caller bug.
            ApiError::Upstream(CoreError::UnsupportedChain(_)) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            timestamp: chrono::Utc::now(),
        });

        (status, body).into_response()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,api_server=debug".into()),
        )
        .init();

    info!("Starting wallet services API server...");

    // Load configuration
    let config = SystemConfig::load()?;
    info!("Configuration loaded successfully");

    // Price subsystem: quotes are chain-scoped, so the cache and poller
    // follow the default chain.
    let quote_client = CoinMarketCapClient::new(
        &config.coinmarketcap.api_base_url,
        &config.coinmarketcap.api_key,
        &config.default_chain_id,
        config.coinmarketcap.request_timeout(),
    )?;
    let last_price = Arc::new(LastPrice::new(
        quote_client,
        config.default_chain_id.clone(),
        config.prices.default_convert.clone(),
        config.prices.cache_ttl(),
    ));
    last_price.clone().start_polling(config.prices.poll_interval());
    info!(
        "Price poller started for chain {} (every {}s)",
        config.default_chain_id, config.prices.poll_interval_seconds
    );

    // One explorer client and one node client per configured chain
    let mut datasources: HashMap<String, Arc<dyn ChainDataSource>> = HashMap::new();
    let mut node_providers: HashMap<String, Arc<dyn NodeProvider>> = HashMap::new();
    for (chain_id, chain) in &config.chains {
        let source: Arc<dyn ChainDataSource> = match chain.provider {
            ProviderKind::RskExplorer => Arc::new(RskExplorerClient::new(
                &chain.explorer_url,
                chain_id,
                chain.request_timeout(),
            )?),
            ProviderKind::Blockscout => Arc::new(BlockscoutClient::new(
                &chain.explorer_url,
                chain_id,
                chain.request_timeout(),
                config.nft.owned_page_cap,
            )?),
        };
        datasources.insert(chain_id.clone(), source);
        node_providers.insert(
            chain_id.clone(),
            Arc::new(RskNodeClient::new(&chain.node_url, chain.request_timeout())?),
        );
        info!(
            "Configured chain {} ({:?}) using {}",
            chain_id, chain.provider, chain.explorer_url
        );
    }

    let address_service = Arc::new(AddressService::new(
        datasources,
        node_providers,
        last_price.clone(),
    ));

    // Create application state
    let app_state = AppState {
        config: config.clone(),
        address_service,
    };

    // Build the application router
    let app = create_router(app_state).await;

    info!("Available endpoints:");
    info!("   GET /tokens - Token listing for a chain");
    info!("   GET /address/:address/tokens - Token balances for an address");
    info!("   GET /address/:address/events - Token-transfer events for an address");
    info!("   GET /address/:address/transactions - Reconciled transaction history");
    info!("   GET /address/:address - Combined address view");
    info!("   GET /price - Quotes for token addresses");
    info!("   GET /latestPrices - Cached quote snapshot");
    info!("   GET /nfts/:nftAddress - NFT collection metadata");
    info!("   GET /address/:address/nfts/:nftAddress - NFT instances held by an address");
    info!("   GET /dapps - Registered dapps listing");
    info!("   GET /health - Health check");

    // Bind and serve
    let bind_addr = format!("{}:{}", config.api.host, config.api.port);
    info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the main application router
async fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .api
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Skipping malformed CORS origin: {}", origin);
                None
            }
        })
        .collect();
    // An empty whitelist means no browser could reach the API at all, so
    // it falls back to allowing any origin.
    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    }
    .allow_methods([Method::GET])
    .allow_headers(Any);

    Router::new()
        // Token and address lookups
        .route("/tokens", get(get_tokens))
        .route("/address/:address/tokens", get(get_address_tokens))
        .route("/address/:address/events", get(get_address_events))
        .route("/address/:address/transactions", get(get_address_transactions))
        .route("/address/:address/nfts/:nft_address", get(get_owned_nfts))
        .route("/address/:address", get(get_address_details))
        // Prices
        .route("/price", get(get_price))
        .route("/latestPrices", get(get_latest_prices))
        // NFTs and static listings
        .route("/nfts/:nft_address", get(get_nft_info))
        .route("/dapps", get(get_dapps))
        // Health check
        .route("/health", get(health_check))
        // Add CORS middleware
        .layer(ServiceBuilder::new().layer(cors).into_inner())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let response =
            ApiError::Validation(validation::INVALID_ADDRESS.to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_errors_map_to_internal_server_error() {
        let response = ApiError::Upstream(CoreError::Source("explorer down".to_string()))
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unknown_chain_from_the_service_maps_to_bad_request() {
        let response =
            ApiError::Upstream(CoreError::UnsupportedChain("1".to_string())).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn core_errors_convert_through_from() {
        let error: ApiError = CoreError::Node("node unreachable".to_string()).into();

        assert!(matches!(error, ApiError::Upstream(_)));
        assert!(error.to_string().contains("node unreachable"));
    }
}
