//! Merges the three upstream views of an address's history into one page.
//!
//! Normal transactions come back paginated and drive the cursors. Token
//! transfer events and internal transactions are fetched on the side to
//! catch value movements the native list alone would miss (ERC20 sends,
//! contract-mediated transfers), then resolved to full transaction records
//! and appended.

use crate::{
    ChainDataSource, Flow, Page, Result, TransactionPageParams, TransactionParticipant,
    TransactionRecord,
};
use futures::future::join_all;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Builds the reconciled transaction page for `address`.
///
/// The native fetch is the primary operation: if it fails the whole call
/// fails, and its cursors are returned untouched. The supplementary
/// fetches and the per-hash detail lookups degrade individually instead,
/// so a flaky side source shrinks the result rather than erroring it.
pub async fn reconcile(
    source: &dyn ChainDataSource,
    address: &str,
    params: &TransactionPageParams,
    flow: Flow,
) -> Result<Page<TransactionRecord>> {
    let native = source.get_transactions_by_address(address, params).await?;

    let (events, internals) = tokio::join!(
        source.get_events_by_address(address),
        source.get_internal_transactions_by_address(address),
    );
    let events = events.unwrap_or_else(|e| {
        warn!("Transfer event lookup failed for {}: {}", address, e);
        Vec::new()
    });
    let internals = internals.unwrap_or_else(|e| {
        warn!("Internal transaction lookup failed for {}: {}", address, e);
        Vec::new()
    });

    let native_hashes: HashSet<&str> = native.data.iter().map(|tx| tx.hash.as_str()).collect();

    // First occurrence wins, events before internals, so the appended
    // records come out in a stable order.
    let mut seen: HashSet<String> = HashSet::new();
    let mut hashes: Vec<String> = Vec::new();
    let candidates = events
        .iter()
        .map(|e| e as &dyn TransactionParticipant)
        .chain(internals.iter().map(|i| i as &dyn TransactionParticipant));
    for record in candidates {
        if !record.matches_flow(address, flow) {
            continue;
        }
        if record.block_number() < params.block_number {
            continue;
        }
        if native_hashes.contains(record.transaction_hash()) {
            continue;
        }
        if seen.insert(record.transaction_hash().to_string()) {
            hashes.push(record.transaction_hash().to_string());
        }
    }

    debug!(
        "Resolving {} supplementary transactions for {}",
        hashes.len(),
        address
    );

    let lookups = join_all(hashes.iter().map(|hash| source.get_transaction(hash))).await;

    let mut data = native.data;
    for (hash, lookup) in hashes.iter().zip(lookups) {
        match lookup {
            Ok(tx) => data.push(tx),
            Err(e) => warn!("Dropping {} from merged history: {}", hash, e),
        }
    }

    Ok(Page {
        prev: native.prev,
        next: native.next,
        data,
    })
}
