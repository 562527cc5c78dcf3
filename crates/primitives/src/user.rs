use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// A user row; created lazily the first time an address appears on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub address: Address,
    /// Point total mirrored from the points contract. Eventually consistent.
    pub points: u64,
    pub created_at: u64,
}
