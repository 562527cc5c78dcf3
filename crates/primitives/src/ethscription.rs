use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// A minted inscription row.
///
/// Identified by the hash of the creating transaction; the payload SHA is
/// unique across all rows and must resolve in the pre-seeded collection
/// dictionary for the row to exist at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ethscription {
    /// Transaction hash of the creating transaction.
    pub hash_id: B256,
    /// SHA-256 of the normalized payload string.
    pub sha: B256,
    /// Token id assigned by the collection dictionary.
    pub token_id: u64,
    /// Sender of the creating transaction.
    pub creator: Address,
    /// Current holder.
    pub owner: Address,
    /// Holder immediately before `owner`; `None` only at creation.
    pub prev_owner: Option<Address>,
    /// Timestamp of the creating block.
    pub created_at: u64,
    /// Number of the creating block. Rows created above a rollback point are
    /// removed wholesale.
    pub created_block: u64,
    /// Held in bridge escrow.
    pub locked: bool,
}

impl Ethscription {
    /// Whether `who` is the current holder.
    pub fn is_owned_by(&self, who: Address) -> bool {
        self.owner == who
    }
}
