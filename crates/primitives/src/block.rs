use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// A processed block header held in the reorg window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedBlock {
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    pub timestamp: u64,
    /// Left the confirmation depth behind the head; no longer eligible for
    /// rollback.
    pub confirmed: bool,
}

impl ProcessedBlock {
    /// Whether `child` extends this block.
    pub fn is_parent_of(&self, child: &Self) -> bool {
        child.parent_hash == self.hash && child.number == self.number + 1
    }
}
