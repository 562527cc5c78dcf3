use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// The closed family of things the pipeline records.
///
/// Kinds are persisted under their wire names (`created`, `transfer`, and the
/// contract event names verbatim).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum EventKind {
    #[serde(rename = "created")]
    #[strum(serialize = "created")]
    Created,
    #[serde(rename = "transfer")]
    #[strum(serialize = "transfer")]
    Transfer,
    PhunkBought,
    PhunkOffered,
    PhunkNoLongerForSale,
    PhunkBidEntered,
    PhunkBidWithdrawn,
    AuctionCreated,
    AuctionBid,
    AuctionExtended,
    AuctionSettled,
}

/// Where in the chain an event came from.
///
/// `stable_index` is the log index for log-driven events, the transaction
/// index for calldata events, and the position within the batch for batch
/// transfer items. Together with the transaction hash it forms the
/// idempotency key for the events table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCoordinates {
    pub block_number: u64,
    pub block_hash: B256,
    pub block_timestamp: u64,
    pub tx_index: u64,
    pub tx_hash: B256,
    pub stable_index: u64,
}

impl EventCoordinates {
    /// The unique, replay-stable event id: lower-hex transaction hash joined
    /// with the stable index.
    pub fn event_id(&self) -> String {
        format!("{:x}-{}", self.tx_hash, self.stable_index)
    }

    /// The same coordinates with a different stable index.
    pub const fn with_stable_index(mut self, stable_index: u64) -> Self {
        self.stable_index = stable_index;
        self
    }
}

/// A row of the append-only event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedEvent {
    /// Unique id, see [`EventCoordinates::event_id`]. Re-inserting an existing
    /// id is a no-op at the datastore.
    pub tx_id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub hash_id: B256,
    pub from: Address,
    /// Zero address when not applicable.
    pub to: Address,
    /// Wei. Serialized as a decimal string.
    #[serde(with = "wei_string")]
    pub value: U256,
    pub block_number: u64,
    pub block_hash: B256,
    pub tx_index: u64,
    pub tx_hash: B256,
    pub block_timestamp: u64,
}

impl IndexedEvent {
    /// Builds an event row at the given chain coordinates.
    pub fn new(
        kind: EventKind,
        hash_id: B256,
        from: Address,
        to: Address,
        value: U256,
        coord: &EventCoordinates,
    ) -> Self {
        Self {
            tx_id: coord.event_id(),
            kind,
            hash_id,
            from,
            to,
            value,
            block_number: coord.block_number,
            block_hash: coord.block_hash,
            tx_index: coord.tx_index,
            tx_hash: coord.tx_hash,
            block_timestamp: coord.block_timestamp,
        }
    }

    /// Ordering key within the per-hash event sequence.
    pub fn ordering(&self) -> (u64, u64, u64) {
        (self.block_number, self.tx_index, self.stable_index())
    }

    /// The stable index encoded in the id suffix.
    pub fn stable_index(&self) -> u64 {
        stable_index_from_id(&self.tx_id)
    }
}

fn stable_index_from_id(tx_id: &str) -> u64 {
    tx_id.rsplit('-').next().and_then(|s| s.parse().ok()).unwrap_or_default()
}

mod wei_string {
    use alloy_primitives::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
