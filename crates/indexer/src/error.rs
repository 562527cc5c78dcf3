use alloy_primitives::B256;
use phunk_chain::ChainError;
use phunk_storage::StoreError;

/// Pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The new block does not extend the processed-block window.
    #[error("reorg detected at block {number}: parent {parent_hash} does not extend {window_hash}")]
    ReorgDetected { number: u64, parent_hash: B256, window_hash: B256 },
    /// No unconfirmed window entry agrees with the chain anymore.
    #[error("reorg reaches below the confirmed window at block {0}")]
    ReorgBeyondWindow(u64),
    /// The bridge contract locked a hash the store has no row for.
    #[error("bridge locked unknown ethscription {0}")]
    BridgeInconsistency(B256),
    /// A block kept failing past the attempt cap.
    #[error("block {number} gave up after {attempts} attempts")]
    Exhausted {
        number: u64,
        attempts: u32,
        #[source]
        source: Box<IndexError>,
    },
}

impl IndexError {
    /// Whether another attempt at the same block may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Chain(err) => err.is_transient(),
            Self::Store(_) => true,
            Self::BridgeInconsistency(_)
            | Self::ReorgDetected { .. }
            | Self::ReorgBeyondWindow(_)
            | Self::Exhausted { .. } => false,
        }
    }
}
