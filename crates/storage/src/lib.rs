//! Datastore interface for the phunk indexer.
//!
//! The pipeline relies on exactly three properties of the backing store:
//! unique constraints on `hash_id` and `sha`, an idempotent insert keyed by
//! the event id, and row-level atomicity for the compare-and-set owner
//! update. No cross-row transactions are required; re-applying a block is a
//! no-op because the event id makes duplicate inserts vanish.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use alloy_primitives::{Address, B256, U256};
use phunk_primitives::{
    Auction, AuctionBidEntry, Bid, Ethscription, IndexedEvent, Listing, User,
};
use std::collections::HashMap;

mod memory;

pub use memory::InMemoryDatastore;

/// Datastore failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique constraint on `hash_id` violated.
    #[error("ethscription {0} already exists")]
    DuplicateHashId(B256),
    /// Unique constraint on `sha` violated.
    #[error("sha {0} already inscribed")]
    DuplicateSha(B256),
    /// Backend-specific failure.
    #[error("datastore backend error: {0}")]
    Backend(String),
}

/// Row operations the core pipeline needs from a datastore.
///
/// The bundled implementation is [`InMemoryDatastore`]; a row-oriented
/// persistent store drops in behind the same trait.
#[async_trait::async_trait]
pub trait Datastore: Send + Sync {
    // === ethscriptions ===

    /// Inserts a freshly created ethscription. Fails on duplicate `hash_id`
    /// or `sha`.
    async fn add_ethscription(&self, row: Ethscription) -> Result<(), StoreError>;

    async fn ethscription_by_hash_id(&self, hash_id: B256)
        -> Result<Option<Ethscription>, StoreError>;

    async fn ethscription_by_sha(&self, sha: B256) -> Result<Option<Ethscription>, StoreError>;

    /// Compare-and-set ownership transfer: succeeds only while the row's
    /// owner still equals `expected_owner`, and then records that owner as
    /// `prev_owner`. Returns whether the swap happened.
    async fn update_owner(
        &self,
        hash_id: B256,
        expected_owner: Address,
        new_owner: Address,
    ) -> Result<bool, StoreError>;

    /// Sets the bridge escrow flag. Returns `false` when the row is missing.
    async fn lock_ethscription(&self, hash_id: B256, locked: bool) -> Result<bool, StoreError>;

    /// Unconditional ownership overwrite, used only by event replay.
    async fn set_ownership(
        &self,
        hash_id: B256,
        owner: Address,
        prev_owner: Option<Address>,
    ) -> Result<bool, StoreError>;

    /// Drops rows whose creating block is above `block`. Returns the number
    /// of rows removed.
    async fn delete_ethscriptions_created_above(&self, block: u64) -> Result<u64, StoreError>;

    // === collection dictionary ===

    /// Looks up the token id for a payload SHA in the pre-seeded dictionary.
    async fn check_is_ethscription_sha(&self, sha: B256) -> Result<Option<u64>, StoreError>;

    /// Seeds the SHA -> token id dictionary.
    async fn seed_collection(&self, entries: HashMap<B256, u64>) -> Result<(), StoreError>;

    // === events ===

    /// Appends event rows, skipping ids that already exist. Returns how many
    /// rows were actually inserted.
    async fn add_events(&self, events: &[IndexedEvent]) -> Result<u64, StoreError>;

    /// All events ordered by `(block_number, tx_index, stable_index)`.
    async fn events_ordered(&self) -> Result<Vec<IndexedEvent>, StoreError>;

    /// Drops events above `block`. Returns the number of rows removed.
    async fn delete_events_above(&self, block: u64) -> Result<u64, StoreError>;

    // === listings & bids ===

    async fn upsert_listing(&self, listing: Listing) -> Result<(), StoreError>;

    async fn listing_by_hash_id(&self, hash_id: B256) -> Result<Option<Listing>, StoreError>;

    /// Returns whether a listing actually existed.
    async fn remove_listing(&self, hash_id: B256) -> Result<bool, StoreError>;

    async fn upsert_bid(&self, bid: Bid) -> Result<(), StoreError>;

    async fn bid_by_hash_id(&self, hash_id: B256) -> Result<Option<Bid>, StoreError>;

    /// Returns whether a bid actually existed.
    async fn remove_bid(&self, hash_id: B256) -> Result<bool, StoreError>;

    /// Clears all listings and bids; replay rebuilds them from the event log.
    async fn clear_market_state(&self) -> Result<(), StoreError>;

    // === auctions ===

    async fn create_auction(&self, auction: Auction) -> Result<(), StoreError>;

    async fn auction_by_id(&self, auction_id: u64) -> Result<Option<Auction>, StoreError>;

    /// The unsettled auction for a hash, if any. Used by replay, where the
    /// generic event row no longer carries the auction id.
    async fn active_auction_by_hash(&self, hash_id: B256) -> Result<Option<Auction>, StoreError>;

    /// Records a bid: updates the auction's highest bid/bidder and appends to
    /// its bid history. Returns `false` when the auction is unknown.
    async fn create_auction_bid(&self, entry: AuctionBidEntry) -> Result<bool, StoreError>;

    /// Moves the auction deadline. Returns `false` when the auction is
    /// unknown.
    async fn extend_auction(&self, auction_id: u64, end_time: u64) -> Result<bool, StoreError>;

    /// Marks the auction settled. Returns `false` when the auction is
    /// unknown.
    async fn settle_auction(
        &self,
        auction_id: u64,
        winner: Address,
        amount: U256,
    ) -> Result<bool, StoreError>;

    /// Rollback support: deletes auctions created above `block` and resets
    /// the surviving rows' bid state (highest bid, bidder, settled flag, bid
    /// history) for replay.
    async fn rollback_auctions(&self, block: u64) -> Result<u64, StoreError>;

    // === users & points ===

    async fn get_or_create_user(&self, address: Address, created_at: u64)
        -> Result<User, StoreError>;

    /// Overwrites the mirrored point total.
    async fn update_user_points(&self, address: Address, points: u64) -> Result<(), StoreError>;

    // === checkpoint ===

    async fn last_block(&self, chain_id: u64) -> Result<Option<u64>, StoreError>;

    async fn update_last_block(
        &self,
        chain_id: u64,
        number: u64,
        timestamp: u64,
    ) -> Result<(), StoreError>;
}
