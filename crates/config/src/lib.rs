//! Configuration for the phunk indexer.
//!
//! Everything is an explicit record handed to components at construction;
//! there is no process-wide mutable state. Loaded from a TOML file with
//! serde defaults for the tunables.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Error loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level indexer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The chain the pipeline runs against.
    pub l1: ChainConfig,
    /// Optional second chain, consulted only by points distribution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l2: Option<ChainConfig>,
    /// Base URL of the ethscriptions provider used for batch-transfer
    /// validation.
    pub ethscriptions_api_url: String,
    /// Path to the SHA -> token id dictionary JSON file.
    pub dictionary_path: String,
}

impl Config {
    /// Loads the configuration from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Per-chain configuration: endpoint, contract addresses, and pipeline
/// tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    /// WebSocket JSON-RPC endpoint.
    pub rpc_url: String,
    /// First block the indexer is interested in.
    pub origin_block: u64,
    pub market_address: Address,
    pub auction_address: Address,
    pub points_address: Address,
    pub bridge_address: Address,
    /// Marketplace escrow holder. Defaults to `market_address`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escrow_address: Option<Address>,
    /// Depth behind the head at which a block becomes confirmed.
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
    /// Length of the processed-block window.
    #[serde(default = "default_block_history")]
    pub block_history: usize,
    /// Hex characters per calldata word in batch transfers.
    #[serde(default = "default_segment_size")]
    pub segment_size: usize,
    /// Delay between attempts on a failed block.
    #[serde(with = "humantime_serde", default = "default_retry_delay")]
    pub retry_delay: Duration,
    /// Per-call RPC timeout.
    #[serde(with = "humantime_serde", default = "default_rpc_timeout")]
    pub rpc_timeout: Duration,
    /// Attempts per block before the error is fatal.
    #[serde(default = "default_max_block_attempts")]
    pub max_block_attempts: u32,
}

impl ChainConfig {
    /// The marketplace escrow holder address.
    pub fn escrow_address(&self) -> Address {
        self.escrow_address.unwrap_or(self.market_address)
    }
}

const fn default_confirmations() -> u64 {
    6
}

const fn default_block_history() -> usize {
    30
}

const fn default_segment_size() -> usize {
    64
}

const fn default_retry_delay() -> Duration {
    Duration::from_secs(5)
}

const fn default_rpc_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_max_block_attempts() -> u32 {
    5
}
