use crate::types::*;
use crate::{dapps, validation, ApiError, AppState};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use wallet_core::TransactionPageParams;

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Requested chain id, falling back to the configured default.
fn resolve_chain(state: &AppState, requested: Option<String>) -> Result<String, ApiError> {
    let chain_id = requested.unwrap_or_else(|| state.config.default_chain_id.clone());
    validation::require_supported_chain(&state.address_service, &chain_id)?;
    Ok(chain_id)
}

/// List the tokens known on a chain
pub async fn get_tokens(
    State(state): State<AppState>,
    Query(query): Query<ChainQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let chain_id = resolve_chain(&state, query.chain_id)?;

    let tokens = state.address_service.get_tokens(&chain_id).await?;
    Ok(Json(tokens))
}

/// Token balances for an address, native-coin entry last
pub async fn get_address_tokens(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<ChainQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let chain_id = resolve_chain(&state, query.chain_id)?;
    validation::require_valid_address(&address)?;

    let tokens = state
        .address_service
        .get_tokens_by_address(&chain_id, &address)
        .await?;
    Ok(Json(tokens))
}

/// Token-transfer events involving an address
pub async fn get_address_events(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<ChainQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let chain_id = resolve_chain(&state, query.chain_id)?;
    validation::require_valid_address(&address)?;

    let events = state
        .address_service
        .get_events_by_address(&chain_id, &address)
        .await?;
    Ok(Json(events))
}

/// Reconciled transaction history for an address
pub async fn get_address_transactions(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<TransactionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let chain_id = resolve_chain(&state, query.chain_id)?;
    validation::require_valid_address(&address)?;

    let params = TransactionPageParams {
        limit: query.limit,
        prev: query.prev,
        next: query.next,
        block_number: query.block_number.unwrap_or(0),
    };
    let page = state
        .address_service
        .get_transactions_by_address(&chain_id, &address, &params, query.flow)
        .await?;
    Ok(Json(page))
}

/// Combined prices, balances, and history view for an address
pub async fn get_address_details(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<TransactionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let chain_id = resolve_chain(&state, query.chain_id)?;
    validation::require_valid_address(&address)?;

    let params = TransactionPageParams {
        limit: query.limit,
        prev: query.prev,
        next: query.next,
        block_number: query.block_number.unwrap_or(0),
    };
    let details = state
        .address_service
        .get_address_details(&chain_id, &address, &params, query.flow)
        .await?;
    Ok(Json(details))
}

/// Prices for a comma-separated list of token addresses
pub async fn get_price(
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let convert = query.convert.unwrap_or_else(|| "USD".to_string());
    validation::require_supported_currency(&convert)?;

    let addresses = query.addresses.unwrap_or_default();
    for address in addresses.split(',') {
        validation::require_valid_address(address.trim())?;
    }

    let prices = state.address_service.get_prices(&addresses, &convert).await?;
    Ok(Json(prices))
}

/// Snapshot of every cached quote
pub async fn get_latest_prices(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.address_service.get_latest_prices().await)
}

/// Collection metadata for an NFT contract
pub async fn get_nft_info(
    State(state): State<AppState>,
    Path(nft_address): Path<String>,
    Query(query): Query<ChainQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let chain_id = resolve_chain(&state, query.chain_id)?;
    validation::require_valid_address(&nft_address)?;

    let nft = state
        .address_service
        .get_nft_info(&chain_id, &nft_address)
        .await?;
    Ok(Json(nft))
}

/// Instances of one NFT collection held by an address
pub async fn get_owned_nfts(
    State(state): State<AppState>,
    Path((address, nft_address)): Path<(String, String)>,
    Query(query): Query<ChainQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let chain_id = resolve_chain(&state, query.chain_id)?;
    validation::require_valid_address(&address)?;
    validation::require_valid_address(&nft_address)?;

    let instances = state
        .address_service
        .get_nft_owned_by_address(&chain_id, &address, &nft_address)
        .await?;
    Ok(Json(instances))
}

/// Registered dapps listing
pub async fn get_dapps() -> impl IntoResponse {
    Json(dapps::registered_dapps())
}
