use alloy_transport::TransportError;
use std::time::Duration;

/// Errors surfaced by chain access.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The requested block does not exist on the node yet. Usually means the
    /// head advanced past a reorg; retryable with a delay.
    #[error("block {0} not found")]
    BlockNotFound(u64),
    /// The RPC round-trip exceeded the per-call timeout.
    #[error("rpc call timed out after {0:?}")]
    Timeout(Duration),
    /// The node returned receipts that do not line up with the block body.
    #[error("block {number}: missing receipt for transaction {tx_hash}")]
    MissingReceipt { number: u64, tx_hash: alloy_primitives::B256 },
    /// Transport-level RPC failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Ethscriptions provider request failed.
    #[error("ethscriptions provider request failed: {0}")]
    Validator(#[from] reqwest::Error),
    /// A contract call returned bytes that do not decode as declared.
    #[error("failed to decode call return: {0}")]
    AbiDecode(#[from] alloy_sol_types::Error),
    /// The node answered with a block other than the one requested.
    #[error("requested block {requested}, node answered with {got}")]
    NumberMismatch { requested: u64, got: u64 },
}

impl ChainError {
    /// Whether the call may succeed if repeated.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::BlockNotFound(_) | Self::Timeout(_) | Self::MissingReceipt { .. } => true,
            Self::Transport(err) => !err.is_error_resp(),
            Self::Validator(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::AbiDecode(_) | Self::NumberMismatch { .. } => false,
        }
    }
}
