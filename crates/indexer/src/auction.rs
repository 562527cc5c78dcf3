//! Auction-house contract events.
//!
//! Settlement routes back through the ownership ledger with the same guards
//! as any other transfer; the usual case is that the contract's own ESIP
//! transfer log earlier in the transaction already moved the phunk, and the
//! guarded apply is then a no-op.

use crate::{
    abi,
    ownership::{OwnershipLedger, TransferRequest},
    IndexError,
};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use parking_lot::Mutex;
use phunk_chain::LogRecord;
use phunk_primitives::{Auction, AuctionBidEntry, AuctionParams, EventCoordinates, EventKind, IndexedEvent};
use phunk_storage::Datastore;
use tracing::{debug, warn};

fn decode<E: SolEvent>(log: &LogRecord) -> Option<E> {
    match E::decode_log_data(&log.data) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(target: "indexer::auction", %err, log_index = log.log_index, "malformed auction log");
            None
        }
    }
}

fn narrow(value: U256, what: &str) -> Option<u64> {
    match u64::try_from(value) {
        Ok(narrowed) => Some(narrowed),
        Err(_) => {
            warn!(target: "indexer::auction", %value, what, "auction field out of range");
            None
        }
    }
}

pub(crate) async fn handle_log<S: Datastore>(
    store: &S,
    params: &Mutex<AuctionParams>,
    log: &LogRecord,
    coord: EventCoordinates,
    events: &mut Vec<IndexedEvent>,
) -> Result<(), IndexError> {
    let Some(topic0) = log.topic0().copied() else { return Ok(()) };

    if topic0 == abi::AuctionCreated::SIGNATURE_HASH {
        let Some(created) = decode::<abi::AuctionCreated>(log) else { return Ok(()) };
        let (Some(auction_id), Some(start_time), Some(end_time)) = (
            narrow(created.auctionId, "auctionId"),
            narrow(created.startTime, "startTime"),
            narrow(created.endTime, "endTime"),
        ) else {
            return Ok(());
        };
        let defaults = params.lock().clone();
        store
            .create_auction(Auction {
                auction_id,
                hash_id: created.hashId,
                owner: created.owner,
                start_time,
                end_time,
                reserve_price: defaults.reserve_price,
                min_bid_increment_percentage: defaults.min_bid_increment_percentage,
                time_buffer: defaults.time_buffer,
                amount: U256::ZERO,
                bidder: None,
                settled: false,
                created_block: coord.block_number,
            })
            .await?;
        events.push(IndexedEvent::new(
            EventKind::AuctionCreated,
            created.hashId,
            created.owner,
            Address::ZERO,
            U256::ZERO,
            &coord,
        ));
    } else if topic0 == abi::AuctionBid::SIGNATURE_HASH {
        let Some(bid) = decode::<abi::AuctionBid>(log) else { return Ok(()) };
        let Some(auction_id) = narrow(bid.auctionId, "auctionId") else { return Ok(()) };
        let found = store
            .create_auction_bid(AuctionBidEntry {
                auction_id,
                bidder: bid.sender,
                value: bid.value,
                created_at: coord.block_timestamp,
            })
            .await?;
        if !found {
            debug!(target: "indexer::auction", auction_id, "bid on unknown auction");
            return Ok(());
        }
        store.get_or_create_user(bid.sender, coord.block_timestamp).await?;
        events.push(IndexedEvent::new(
            EventKind::AuctionBid,
            bid.hashId,
            bid.sender,
            Address::ZERO,
            bid.value,
            &coord,
        ));
    } else if topic0 == abi::AuctionExtended::SIGNATURE_HASH {
        let Some(extended) = decode::<abi::AuctionExtended>(log) else { return Ok(()) };
        let (Some(auction_id), Some(end_time)) =
            (narrow(extended.auctionId, "auctionId"), narrow(extended.endTime, "endTime"))
        else {
            return Ok(());
        };
        if store.extend_auction(auction_id, end_time).await? {
            events.push(IndexedEvent::new(
                EventKind::AuctionExtended,
                extended.hashId,
                Address::ZERO,
                Address::ZERO,
                U256::ZERO,
                &coord,
            ));
        }
    } else if topic0 == abi::AuctionSettled::SIGNATURE_HASH {
        let Some(settled) = decode::<abi::AuctionSettled>(log) else { return Ok(()) };
        let Some(auction_id) = narrow(settled.auctionId, "auctionId") else { return Ok(()) };
        if !store.settle_auction(auction_id, settled.winner, settled.amount).await? {
            debug!(target: "indexer::auction", auction_id, "settlement of unknown auction");
            return Ok(());
        }
        // Move ownership to the winner unless an ESIP transfer earlier in
        // this transaction already did; the guards make the repeat a no-op.
        let ledger = OwnershipLedger::new(store);
        ledger
            .apply(&TransferRequest {
                hash_id: settled.hashId,
                from: log.address,
                to: settled.winner,
                value: settled.amount,
                prev_owner_hint: None,
                coord,
            })
            .await?;
        events.push(IndexedEvent::new(
            EventKind::AuctionSettled,
            settled.hashId,
            log.address,
            settled.winner,
            settled.amount,
            &coord,
        ));
    } else if topic0 == abi::AuctionTimeBufferUpdated::SIGNATURE_HASH {
        let Some(updated) = decode::<abi::AuctionTimeBufferUpdated>(log) else { return Ok(()) };
        if let Some(time_buffer) = narrow(updated.timeBuffer, "timeBuffer") {
            params.lock().time_buffer = time_buffer;
        }
    } else if topic0 == abi::AuctionReservePriceUpdated::SIGNATURE_HASH {
        let Some(updated) = decode::<abi::AuctionReservePriceUpdated>(log) else { return Ok(()) };
        params.lock().reserve_price = updated.reservePrice;
    } else if topic0 == abi::AuctionMinBidIncrementPercentageUpdated::SIGNATURE_HASH {
        let Some(updated) = decode::<abi::AuctionMinBidIncrementPercentageUpdated>(log) else {
            return Ok(());
        };
        if let Ok(pct) = u8::try_from(updated.minBidIncrementPercentage) {
            params.lock().min_bid_increment_percentage = pct;
        }
    } else if topic0 == abi::AuctionDurationUpdated::SIGNATURE_HASH {
        let Some(updated) = decode::<abi::AuctionDurationUpdated>(log) else { return Ok(()) };
        if let Some(duration) = narrow(updated.duration, "duration") {
            params.lock().duration = duration;
        }
    }

    Ok(())
}
