use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// An active sell offer. At most one per hash.
///
/// A listing is only legitimate while the phunk sits in marketplace escrow
/// and its previous owner matches `seller`; the writers delete anything that
/// violates this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub hash_id: B256,
    pub seller: Address,
    /// Minimum accepted sale value in wei.
    pub min_value: U256,
    /// Targeted buyer, or the zero address for an open listing.
    pub to_address: Address,
    /// Timestamp of the block that created the listing.
    pub created_at: u64,
}

impl Listing {
    /// Whether the listing is restricted to a single buyer.
    pub fn is_targeted(&self) -> bool {
        !self.to_address.is_zero()
    }
}

/// An active buy offer. At most one per hash; replaced, never stacked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub hash_id: B256,
    pub bidder: Address,
    pub value: U256,
    pub created_at: u64,
}

/// An auction row, keyed by the contract-assigned auction id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub auction_id: u64,
    pub hash_id: B256,
    /// Owner that started the auction.
    pub owner: Address,
    pub start_time: u64,
    pub end_time: u64,
    pub reserve_price: U256,
    pub min_bid_increment_percentage: u8,
    /// Seconds an eligible late bid extends the auction by.
    pub time_buffer: u64,
    /// Highest bid so far; zero until the first bid lands.
    pub amount: U256,
    pub bidder: Option<Address>,
    pub settled: bool,
    /// Number of the block whose `AuctionCreated` event created this row.
    pub created_block: u64,
}

/// One entry of an auction's bid history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionBidEntry {
    pub auction_id: u64,
    pub bidder: Address,
    pub value: U256,
    pub created_at: u64,
}

/// Live auction-house parameters, maintained from the contract's
/// parameter-update events and snapshotted into each new [`Auction`] row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionParams {
    pub time_buffer: u64,
    pub reserve_price: U256,
    pub min_bid_increment_percentage: u8,
    pub duration: u64,
}

impl Default for AuctionParams {
    fn default() -> Self {
        // Contract deployment defaults; overridden by parameter-update events.
        Self {
            time_buffer: 15 * 60,
            reserve_price: U256::ZERO,
            min_bid_increment_percentage: 5,
            duration: 24 * 60 * 60,
        }
    }
}
