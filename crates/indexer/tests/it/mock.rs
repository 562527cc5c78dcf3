//! A scripted chain client and block builders shared by the tests.

use alloy_primitives::{Address, Bytes, LogData, B256, U256};
use futures_util::{stream, stream::BoxStream, StreamExt};
use parking_lot::Mutex;
use phunk_chain::{BlockData, BlockHeader, ChainClient, ChainError, LogRecord, TxRecord};
use phunk_config::ChainConfig;
use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;

pub const MARKET: Address = Address::repeat_byte(0xe1);
pub const AUCTION: Address = Address::repeat_byte(0xe2);
pub const POINTS: Address = Address::repeat_byte(0xe3);
pub const BRIDGE: Address = Address::repeat_byte(0xe4);

pub fn test_config() -> ChainConfig {
    ChainConfig {
        chain_id: 1,
        rpc_url: "ws://127.0.0.1:8546".into(),
        origin_block: 100,
        market_address: MARKET,
        auction_address: AUCTION,
        points_address: POINTS,
        bridge_address: BRIDGE,
        escrow_address: None,
        confirmations: 6,
        block_history: 30,
        segment_size: 64,
        retry_delay: Duration::from_millis(10),
        rpc_timeout: Duration::from_secs(1),
        max_block_attempts: 3,
    }
}

#[derive(Default)]
struct State {
    blocks: HashMap<u64, BlockData>,
    head: u64,
    valid: HashSet<B256>,
    points: HashMap<Address, U256>,
}

/// Chain client over a scripted set of blocks. The script can be swapped
/// mid-test to simulate a reorg.
#[derive(Default)]
pub struct MockChain {
    state: Mutex<State>,
    heads: Mutex<Option<UnboundedReceiver<u64>>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_block(&self, block: BlockData) {
        let mut state = self.state.lock();
        state.head = state.head.max(block.header.number);
        state.blocks.insert(block.header.number, block);
    }

    /// Replaces the scripted chain wholesale, as a reorg would.
    pub fn replace_blocks(&self, blocks: Vec<BlockData>) {
        let mut state = self.state.lock();
        state.blocks.clear();
        state.head = 0;
        for block in blocks {
            state.head = state.head.max(block.header.number);
            state.blocks.insert(block.header.number, block);
        }
    }

    pub fn set_valid(&self, hashes: impl IntoIterator<Item = B256>) {
        self.state.lock().valid = hashes.into_iter().collect();
    }

    pub fn set_points(&self, user: Address, points: U256) {
        self.state.lock().points.insert(user, points);
    }

    /// Wires up the head subscription; announcements sent on the returned
    /// sender reach the coordinator.
    pub fn head_sender(&self) -> UnboundedSender<u64> {
        let (tx, rx) = unbounded_channel();
        *self.heads.lock() = Some(rx);
        tx
    }
}

#[async_trait::async_trait]
impl ChainClient for MockChain {
    async fn latest_block_number(&self) -> Result<u64, ChainError> {
        Ok(self.state.lock().head)
    }

    async fn block_with_receipts(&self, number: u64) -> Result<BlockData, ChainError> {
        self.state
            .lock()
            .blocks
            .get(&number)
            .cloned()
            .ok_or(ChainError::BlockNotFound(number))
    }

    async fn block_hash(&self, number: u64) -> Result<Option<B256>, ChainError> {
        Ok(self.state.lock().blocks.get(&number).map(|block| block.header.hash))
    }

    async fn subscribe_heads(&self) -> Result<BoxStream<'static, u64>, ChainError> {
        match self.heads.lock().take() {
            Some(rx) => Ok(UnboundedReceiverStream::new(rx).boxed()),
            None => Ok(stream::pending().boxed()),
        }
    }

    async fn validate_ethscriptions(&self, hash_ids: &[B256]) -> Result<Vec<B256>, ChainError> {
        let state = self.state.lock();
        Ok(hash_ids.iter().copied().filter(|hash| state.valid.contains(hash)).collect())
    }

    async fn points_balance(&self, user: Address) -> Result<U256, ChainError> {
        Ok(self.state.lock().points.get(&user).copied().unwrap_or(U256::ZERO))
    }

    async fn active_multiplier(&self) -> Result<U256, ChainError> {
        Ok(U256::from(1))
    }
}

pub fn header(number: u64, hash_seed: u8, parent_seed: u8) -> BlockHeader {
    BlockHeader {
        number,
        hash: B256::repeat_byte(hash_seed),
        parent_hash: B256::repeat_byte(parent_seed),
        timestamp: number * 12,
    }
}

pub fn block(header: BlockHeader, transactions: Vec<TxRecord>) -> BlockData {
    BlockData { header, transactions }
}

pub fn tx(
    hash_seed: u8,
    tx_index: u64,
    from: Address,
    to: Address,
    input: impl Into<Bytes>,
) -> TxRecord {
    TxRecord {
        tx_hash: B256::repeat_byte(hash_seed),
        tx_index,
        from,
        to: Some(to),
        value: U256::ZERO,
        input: input.into(),
        success: true,
        logs: Vec::new(),
    }
}

pub fn with_logs(mut tx: TxRecord, logs: Vec<LogRecord>) -> TxRecord {
    tx.logs = logs;
    tx
}

pub fn log(address: Address, log_index: u64, data: LogData) -> LogRecord {
    LogRecord { address, log_index, data }
}
