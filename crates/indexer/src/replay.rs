//! Derived-state rebuild from the event log.
//!
//! State is a pure function of the event log. After a rollback deletes the
//! rows of disagreeing blocks, replaying the surviving events in order
//! restores ownership and the listing/bid/auction tables; points are left
//! alone, they re-sync on the next touch.

use crate::IndexError;
use phunk_primitives::{AuctionBidEntry, Bid, EventKind, Listing};
use phunk_storage::Datastore;
use tracing::debug;

pub(crate) async fn rebuild<S: Datastore>(
    store: &S,
    rollback_block: u64,
) -> Result<(), IndexError> {
    store.clear_market_state().await?;
    store.rollback_auctions(rollback_block).await?;

    let events = store.events_ordered().await?;
    for event in &events {
        match event.kind {
            EventKind::Created => {
                store.set_ownership(event.hash_id, event.to, None).await?;
            }
            EventKind::Transfer => {
                store.set_ownership(event.hash_id, event.to, Some(event.from)).await?;
            }
            EventKind::PhunkOffered => {
                store
                    .upsert_listing(Listing {
                        hash_id: event.hash_id,
                        seller: event.from,
                        min_value: event.value,
                        to_address: event.to,
                        created_at: event.block_timestamp,
                    })
                    .await?;
            }
            EventKind::PhunkBought | EventKind::PhunkNoLongerForSale => {
                store.remove_listing(event.hash_id).await?;
            }
            EventKind::PhunkBidEntered => {
                store
                    .upsert_bid(Bid {
                        hash_id: event.hash_id,
                        bidder: event.from,
                        value: event.value,
                        created_at: event.block_timestamp,
                    })
                    .await?;
            }
            EventKind::PhunkBidWithdrawn => {
                store.remove_bid(event.hash_id).await?;
            }
            // The auction row either survived the rollback or is gone with
            // its creating block; nothing to re-create here.
            EventKind::AuctionCreated => {}
            EventKind::AuctionBid => {
                if let Some(auction) = store.active_auction_by_hash(event.hash_id).await? {
                    store
                        .create_auction_bid(AuctionBidEntry {
                            auction_id: auction.auction_id,
                            bidder: event.from,
                            value: event.value,
                            created_at: event.block_timestamp,
                        })
                        .await?;
                }
            }
            // The moved deadline is not recorded on the generic event row.
            EventKind::AuctionExtended => {}
            EventKind::AuctionSettled => {
                if let Some(auction) = store.active_auction_by_hash(event.hash_id).await? {
                    store.settle_auction(auction.auction_id, event.to, event.value).await?;
                }
                store.set_ownership(event.hash_id, event.to, Some(event.from)).await?;
            }
        }
    }
    debug!(target: "indexer::replay", events = events.len(), rollback_block, "derived state rebuilt");
    Ok(())
}
