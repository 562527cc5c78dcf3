use crate::{Datastore, StoreError};
use alloy_primitives::{Address, B256, U256};
use parking_lot::RwLock;
use phunk_primitives::{
    Auction, AuctionBidEntry, Bid, Ethscription, IndexedEvent, Listing, User,
};
use std::collections::HashMap;

/// In-memory row store.
///
/// Backs tests and single-process deployments; all maps live under one lock,
/// which is more than enough for a single-writer pipeline with concurrent
/// readers.
#[derive(Debug, Default)]
pub struct InMemoryDatastore {
    inner: RwLock<Rows>,
}

#[derive(Debug, Default)]
struct Rows {
    ethscriptions: HashMap<B256, Ethscription>,
    sha_index: HashMap<B256, B256>,
    dictionary: HashMap<B256, u64>,
    events: HashMap<String, IndexedEvent>,
    listings: HashMap<B256, Listing>,
    bids: HashMap<B256, Bid>,
    auctions: HashMap<u64, Auction>,
    auction_bids: HashMap<u64, Vec<AuctionBidEntry>>,
    users: HashMap<Address, User>,
    checkpoints: HashMap<u64, (u64, u64)>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Datastore for InMemoryDatastore {
    async fn add_ethscription(&self, row: Ethscription) -> Result<(), StoreError> {
        let mut rows = self.inner.write();
        if rows.ethscriptions.contains_key(&row.hash_id) {
            return Err(StoreError::DuplicateHashId(row.hash_id));
        }
        if rows.sha_index.contains_key(&row.sha) {
            return Err(StoreError::DuplicateSha(row.sha));
        }
        rows.sha_index.insert(row.sha, row.hash_id);
        rows.ethscriptions.insert(row.hash_id, row);
        Ok(())
    }

    async fn ethscription_by_hash_id(
        &self,
        hash_id: B256,
    ) -> Result<Option<Ethscription>, StoreError> {
        Ok(self.inner.read().ethscriptions.get(&hash_id).cloned())
    }

    async fn ethscription_by_sha(&self, sha: B256) -> Result<Option<Ethscription>, StoreError> {
        let rows = self.inner.read();
        Ok(rows.sha_index.get(&sha).and_then(|hash| rows.ethscriptions.get(hash)).cloned())
    }

    async fn update_owner(
        &self,
        hash_id: B256,
        expected_owner: Address,
        new_owner: Address,
    ) -> Result<bool, StoreError> {
        let mut rows = self.inner.write();
        match rows.ethscriptions.get_mut(&hash_id) {
            Some(row) if row.owner == expected_owner => {
                row.prev_owner = Some(row.owner);
                row.owner = new_owner;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn lock_ethscription(&self, hash_id: B256, locked: bool) -> Result<bool, StoreError> {
        let mut rows = self.inner.write();
        match rows.ethscriptions.get_mut(&hash_id) {
            Some(row) => {
                row.locked = locked;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_ownership(
        &self,
        hash_id: B256,
        owner: Address,
        prev_owner: Option<Address>,
    ) -> Result<bool, StoreError> {
        let mut rows = self.inner.write();
        match rows.ethscriptions.get_mut(&hash_id) {
            Some(row) => {
                row.owner = owner;
                row.prev_owner = prev_owner;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_ethscriptions_created_above(&self, block: u64) -> Result<u64, StoreError> {
        let mut rows = self.inner.write();
        let doomed: Vec<B256> = rows
            .ethscriptions
            .values()
            .filter(|row| row.created_block > block)
            .map(|row| row.hash_id)
            .collect();
        for hash_id in &doomed {
            if let Some(row) = rows.ethscriptions.remove(hash_id) {
                rows.sha_index.remove(&row.sha);
            }
        }
        Ok(doomed.len() as u64)
    }

    async fn check_is_ethscription_sha(&self, sha: B256) -> Result<Option<u64>, StoreError> {
        Ok(self.inner.read().dictionary.get(&sha).copied())
    }

    async fn seed_collection(&self, entries: HashMap<B256, u64>) -> Result<(), StoreError> {
        self.inner.write().dictionary.extend(entries);
        Ok(())
    }

    async fn add_events(&self, events: &[IndexedEvent]) -> Result<u64, StoreError> {
        let mut rows = self.inner.write();
        let mut inserted = 0;
        for event in events {
            if !rows.events.contains_key(&event.tx_id) {
                rows.events.insert(event.tx_id.clone(), event.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn events_ordered(&self) -> Result<Vec<IndexedEvent>, StoreError> {
        let mut events: Vec<IndexedEvent> = self.inner.read().events.values().cloned().collect();
        events.sort_by_key(IndexedEvent::ordering);
        Ok(events)
    }

    async fn delete_events_above(&self, block: u64) -> Result<u64, StoreError> {
        let mut rows = self.inner.write();
        let before = rows.events.len();
        rows.events.retain(|_, event| event.block_number <= block);
        Ok((before - rows.events.len()) as u64)
    }

    async fn upsert_listing(&self, listing: Listing) -> Result<(), StoreError> {
        self.inner.write().listings.insert(listing.hash_id, listing);
        Ok(())
    }

    async fn listing_by_hash_id(&self, hash_id: B256) -> Result<Option<Listing>, StoreError> {
        Ok(self.inner.read().listings.get(&hash_id).cloned())
    }

    async fn remove_listing(&self, hash_id: B256) -> Result<bool, StoreError> {
        Ok(self.inner.write().listings.remove(&hash_id).is_some())
    }

    async fn upsert_bid(&self, bid: Bid) -> Result<(), StoreError> {
        self.inner.write().bids.insert(bid.hash_id, bid);
        Ok(())
    }

    async fn bid_by_hash_id(&self, hash_id: B256) -> Result<Option<Bid>, StoreError> {
        Ok(self.inner.read().bids.get(&hash_id).cloned())
    }

    async fn remove_bid(&self, hash_id: B256) -> Result<bool, StoreError> {
        Ok(self.inner.write().bids.remove(&hash_id).is_some())
    }

    async fn clear_market_state(&self) -> Result<(), StoreError> {
        let mut rows = self.inner.write();
        rows.listings.clear();
        rows.bids.clear();
        Ok(())
    }

    async fn create_auction(&self, auction: Auction) -> Result<(), StoreError> {
        self.inner.write().auctions.insert(auction.auction_id, auction);
        Ok(())
    }

    async fn auction_by_id(&self, auction_id: u64) -> Result<Option<Auction>, StoreError> {
        Ok(self.inner.read().auctions.get(&auction_id).cloned())
    }

    async fn active_auction_by_hash(&self, hash_id: B256) -> Result<Option<Auction>, StoreError> {
        Ok(self
            .inner
            .read()
            .auctions
            .values()
            .find(|auction| auction.hash_id == hash_id && !auction.settled)
            .cloned())
    }

    async fn create_auction_bid(&self, entry: AuctionBidEntry) -> Result<bool, StoreError> {
        let mut rows = self.inner.write();
        match rows.auctions.get_mut(&entry.auction_id) {
            Some(auction) => {
                auction.amount = entry.value;
                auction.bidder = Some(entry.bidder);
                rows.auction_bids.entry(entry.auction_id).or_default().push(entry);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn extend_auction(&self, auction_id: u64, end_time: u64) -> Result<bool, StoreError> {
        let mut rows = self.inner.write();
        match rows.auctions.get_mut(&auction_id) {
            Some(auction) => {
                auction.end_time = end_time;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn settle_auction(
        &self,
        auction_id: u64,
        winner: Address,
        amount: U256,
    ) -> Result<bool, StoreError> {
        let mut rows = self.inner.write();
        match rows.auctions.get_mut(&auction_id) {
            Some(auction) => {
                auction.settled = true;
                auction.bidder = Some(winner);
                auction.amount = amount;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rollback_auctions(&self, block: u64) -> Result<u64, StoreError> {
        let mut rows = self.inner.write();
        let doomed: Vec<u64> = rows
            .auctions
            .values()
            .filter(|auction| auction.created_block > block)
            .map(|auction| auction.auction_id)
            .collect();
        for id in &doomed {
            rows.auctions.remove(id);
            rows.auction_bids.remove(id);
        }
        for auction in rows.auctions.values_mut() {
            auction.amount = U256::ZERO;
            auction.bidder = None;
            auction.settled = false;
        }
        rows.auction_bids.clear();
        Ok(doomed.len() as u64)
    }

    async fn get_or_create_user(
        &self,
        address: Address,
        created_at: u64,
    ) -> Result<User, StoreError> {
        let mut rows = self.inner.write();
        Ok(*rows
            .users
            .entry(address)
            .or_insert(User { address, points: 0, created_at }))
    }

    async fn update_user_points(&self, address: Address, points: u64) -> Result<(), StoreError> {
        let mut rows = self.inner.write();
        rows.users
            .entry(address)
            .and_modify(|user| user.points = points)
            .or_insert(User { address, points, created_at: 0 });
        Ok(())
    }

    async fn last_block(&self, chain_id: u64) -> Result<Option<u64>, StoreError> {
        Ok(self.inner.read().checkpoints.get(&chain_id).map(|(number, _)| *number))
    }

    async fn update_last_block(
        &self,
        chain_id: u64,
        number: u64,
        timestamp: u64,
    ) -> Result<(), StoreError> {
        self.inner.write().checkpoints.insert(chain_id, (number, timestamp));
        Ok(())
    }
}
