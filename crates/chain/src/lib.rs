//! Read-only JSON-RPC access for the phunk indexer.
//!
//! The pipeline never sees raw RPC shapes: the client converts blocks,
//! transactions, receipts and logs into the flat records below exactly once,
//! zipped by transaction hash and ordered by transaction index.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use alloy_primitives::{Address, Bytes, LogData, B256, U256};
use futures_util::stream::BoxStream;

mod client;
mod error;
mod validator;

pub use client::RpcChainClient;
pub use error::ChainError;
pub use validator::EthscriptionsValidator;

/// The header fields the pipeline cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    pub timestamp: u64,
}

/// A receipt log, flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Emitting contract.
    pub address: Address,
    /// Position of the log within the block.
    pub log_index: u64,
    pub data: LogData,
}

impl LogRecord {
    /// The event signature topic, if any.
    pub fn topic0(&self) -> Option<&B256> {
        self.data.topics().first()
    }
}

/// A confirmed transaction zipped with its receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRecord {
    pub tx_hash: B256,
    pub tx_index: u64,
    pub from: Address,
    /// `None` for contract creations.
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    /// Receipt status.
    pub success: bool,
    /// Receipt logs in `log_index` order.
    pub logs: Vec<LogRecord>,
}

/// A block with its transactions, ready for classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockData {
    pub header: BlockHeader,
    /// In `transaction_index` order.
    pub transactions: Vec<TxRecord>,
}

/// Read-only chain access used by the pipeline.
///
/// Two instances may be configured (L1 and L2); the block pipeline runs
/// against L1 only, the L2 instance is consulted by points distribution.
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    /// Current head number.
    async fn latest_block_number(&self) -> Result<u64, ChainError>;

    /// Full block with transactions zipped to their receipts.
    async fn block_with_receipts(&self, number: u64) -> Result<BlockData, ChainError>;

    /// Hash of the block currently at `number`, if any.
    async fn block_hash(&self, number: u64) -> Result<Option<B256>, ChainError>;

    /// Best-effort stream of new head numbers. The stream ends on transport
    /// failure; callers re-subscribe.
    async fn subscribe_heads(&self) -> Result<BoxStream<'static, u64>, ChainError>;

    /// The subset of `hash_ids` that are real, uniquely inscribed
    /// ethscriptions, in input order.
    async fn validate_ethscriptions(&self, hash_ids: &[B256]) -> Result<Vec<B256>, ChainError>;

    /// Current point total of `user` from the points contract.
    async fn points_balance(&self, user: Address) -> Result<U256, ChainError>;

    /// Current global points multiplier.
    async fn active_multiplier(&self) -> Result<U256, ChainError>;
}
