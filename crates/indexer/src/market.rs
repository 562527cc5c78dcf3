//! Marketplace contract events: listings and bids.
//!
//! The contract emits these after any escrow transfer in the same
//! transaction, so by the time a log lands here the ownership map already
//! reflects the escrow move.

use crate::{abi, IndexError};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use phunk_chain::{LogRecord, TxRecord};
use phunk_primitives::{Bid, EventCoordinates, EventKind, IndexedEvent, Listing};
use phunk_storage::Datastore;
use tracing::{debug, warn};

fn decode<E: SolEvent>(log: &LogRecord) -> Option<E> {
    match E::decode_log_data(&log.data) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(target: "indexer::market", %err, log_index = log.log_index, "malformed marketplace log");
            None
        }
    }
}

pub(crate) async fn handle_log<S: Datastore>(
    store: &S,
    tx: &TxRecord,
    log: &LogRecord,
    coord: EventCoordinates,
    events: &mut Vec<IndexedEvent>,
) -> Result<(), IndexError> {
    let Some(topic0) = log.topic0().copied() else { return Ok(()) };

    if topic0 == abi::PhunkOffered::SIGNATURE_HASH {
        let Some(offered) = decode::<abi::PhunkOffered>(log) else { return Ok(()) };
        let hash_id = offered.phunkId;
        let Some(record) = store.ethscription_by_hash_id(hash_id).await? else {
            debug!(target: "indexer::market", %hash_id, "offer for unknown phunk");
            return Ok(());
        };
        // Stale-listing rule: an offer not placed by the legitimate previous
        // owner still overwrote any existing listing in the contract, so
        // drop ours and surface nothing.
        if record.prev_owner.is_some_and(|prev| prev != tx.from) {
            let removed = store.remove_listing(hash_id).await?;
            debug!(
                target: "indexer::market",
                %hash_id,
                seller = %tx.from,
                prev_owner = ?record.prev_owner,
                removed,
                "stale offer, listing dropped"
            );
            return Ok(());
        }
        store.get_or_create_user(tx.from, coord.block_timestamp).await?;
        store
            .upsert_listing(Listing {
                hash_id,
                seller: tx.from,
                min_value: offered.minValue,
                to_address: offered.toAddress,
                created_at: coord.block_timestamp,
            })
            .await?;
        events.push(IndexedEvent::new(
            EventKind::PhunkOffered,
            hash_id,
            tx.from,
            offered.toAddress,
            offered.minValue,
            &coord,
        ));
    } else if topic0 == abi::PhunkBought::SIGNATURE_HASH {
        let Some(bought) = decode::<abi::PhunkBought>(log) else { return Ok(()) };
        let removed = store.remove_listing(bought.phunkId).await?;
        if !removed {
            // Buy raced a cancellation; nothing to surface.
            debug!(target: "indexer::market", hash_id = %bought.phunkId, "buy without a listing");
            return Ok(());
        }
        store.get_or_create_user(bought.toAddress, coord.block_timestamp).await?;
        events.push(IndexedEvent::new(
            EventKind::PhunkBought,
            bought.phunkId,
            bought.fromAddress,
            bought.toAddress,
            bought.value,
            &coord,
        ));
    } else if topic0 == abi::PhunkNoLongerForSale::SIGNATURE_HASH {
        let Some(delisted) = decode::<abi::PhunkNoLongerForSale>(log) else { return Ok(()) };
        let removed = store.remove_listing(delisted.phunkId).await?;
        let record = store.ethscription_by_hash_id(delisted.phunkId).await?;
        if removed && record.is_some_and(|record| record.prev_owner == Some(tx.from)) {
            events.push(IndexedEvent::new(
                EventKind::PhunkNoLongerForSale,
                delisted.phunkId,
                tx.from,
                Address::ZERO,
                U256::ZERO,
                &coord,
            ));
        }
    } else if topic0 == abi::PhunkBidEntered::SIGNATURE_HASH {
        let Some(entered) = decode::<abi::PhunkBidEntered>(log) else { return Ok(()) };
        store.get_or_create_user(entered.fromAddress, coord.block_timestamp).await?;
        store
            .upsert_bid(Bid {
                hash_id: entered.phunkId,
                bidder: entered.fromAddress,
                value: entered.value,
                created_at: coord.block_timestamp,
            })
            .await?;
        events.push(IndexedEvent::new(
            EventKind::PhunkBidEntered,
            entered.phunkId,
            entered.fromAddress,
            Address::ZERO,
            entered.value,
            &coord,
        ));
    } else if topic0 == abi::PhunkBidWithdrawn::SIGNATURE_HASH {
        let Some(withdrawn) = decode::<abi::PhunkBidWithdrawn>(log) else { return Ok(()) };
        store.remove_bid(withdrawn.phunkId).await?;
        events.push(IndexedEvent::new(
            EventKind::PhunkBidWithdrawn,
            withdrawn.phunkId,
            withdrawn.fromAddress,
            Address::ZERO,
            withdrawn.value,
            &coord,
        ));
    }
    // Unknown topics from the marketplace address are skipped.

    Ok(())
}
