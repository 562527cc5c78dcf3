use metrics::{Counter, Gauge};
use metrics_derive::Metrics;

/// Pipeline metrics.
#[derive(Clone, Metrics)]
#[metrics(scope = "indexer")]
pub(crate) struct IndexerMetrics {
    /// Blocks fully processed.
    pub(crate) blocks_processed: Counter,
    /// Event rows inserted.
    pub(crate) events_written: Counter,
    /// Transfers rejected by the ownership guards.
    pub(crate) transfers_rejected: Counter,
    /// Chain reorganizations handled.
    pub(crate) reorgs_detected: Counter,
    /// Failed attempts at processing a block.
    pub(crate) block_retries: Counter,
    /// Most recently checkpointed block.
    pub(crate) last_block: Gauge,
}
