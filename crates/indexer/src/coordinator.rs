//! Backfill-then-tail coordination.
//!
//! One coordinator per chain: it drains the gap between the stored
//! checkpoint and the head, then follows the head subscription, always
//! through the same FIFO queue so ordering never depends on arrival order.

use crate::{
    metrics::IndexerMetrics, processor::Processor, queue::BlockQueue, reorg::ReorgGuard, replay,
    IndexError,
};
use futures_util::StreamExt;
use phunk_chain::ChainClient;
use phunk_config::ChainConfig;
use phunk_storage::Datastore;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

/// Drives the block pipeline for one chain.
pub struct Coordinator<C, S> {
    chain: Arc<C>,
    store: Arc<S>,
    config: ChainConfig,
    processor: Processor<C, S>,
    queue: Arc<BlockQueue>,
    guard: ReorgGuard,
    metrics: IndexerMetrics,
}

impl<C, S> std::fmt::Debug for Coordinator<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<C, S> Coordinator<C, S>
where
    C: ChainClient + 'static,
    S: Datastore + 'static,
{
    pub fn new(
        chain: Arc<C>,
        store: Arc<S>,
        config: ChainConfig,
        processor: Processor<C, S>,
    ) -> Self {
        let guard = ReorgGuard::new(config.block_history, config.confirmations);
        Self {
            chain,
            store,
            config,
            processor,
            queue: Arc::new(BlockQueue::new()),
            guard,
            metrics: IndexerMetrics::default(),
        }
    }

    /// Handle for enqueuing work from outside (tests, admin tooling).
    pub fn queue(&self) -> Arc<BlockQueue> {
        self.queue.clone()
    }

    /// Runs until `shutdown` flips to `true` or a fatal error surfaces.
    ///
    /// On shutdown the current block finishes and its checkpoint is durable
    /// before this returns.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), IndexError> {
        self.queue.clear();
        self.queue.pause();

        let start = match self.store.last_block(self.config.chain_id).await? {
            Some(last) => last + 1,
            None => self.config.origin_block,
        };
        let head = self.chain.latest_block_number().await?;
        info!(target: "indexer::coordinator", start, head, "backfilling to head");
        for number in start..=head {
            self.queue.enqueue(number);
        }
        self.queue.resume();
        self.spawn_head_task(shutdown.clone());

        loop {
            let item = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                item = self.queue.dequeue() => item,
            };
            let number = item.number;
            // Late head announcements for already-processed blocks are
            // no-ops.
            if let Some(last) = self.store.last_block(self.config.chain_id).await? {
                if number <= last {
                    trace!(target: "indexer::coordinator", number, last, "skipping processed block");
                    continue;
                }
            }
            if let Err(err) = self.process_with_retries(number).await {
                match err {
                    IndexError::ReorgDetected { .. } => {
                        self.metrics.reorgs_detected.increment(1);
                        warn!(target: "indexer::coordinator", %err, "chain reorganization");
                        self.handle_reorg().await?;
                    }
                    err => {
                        self.queue.pause();
                        error!(target: "indexer::coordinator", %err, number, "fatal pipeline error");
                        return Err(err);
                    }
                }
            }
        }

        self.queue.pause();
        info!(target: "indexer::coordinator", "coordinator stopped");
        Ok(())
    }

    /// Feeds head announcements into the queue, resubscribing whenever the
    /// transport drops.
    fn spawn_head_task(&self, mut shutdown: watch::Receiver<bool>) {
        let chain = self.chain.clone();
        let queue = self.queue.clone();
        let retry_delay = self.config.retry_delay;
        tokio::spawn(async move {
            loop {
                if *shutdown.borrow() {
                    return;
                }
                match chain.subscribe_heads().await {
                    Ok(mut heads) => loop {
                        tokio::select! {
                            biased;
                            _ = shutdown.changed() => return,
                            head = heads.next() => match head {
                                Some(number) => {
                                    trace!(target: "indexer::coordinator", number, "head announced");
                                    queue.enqueue(number);
                                }
                                None => break,
                            }
                        }
                    },
                    Err(err) => {
                        warn!(target: "indexer::coordinator", %err, "head subscription failed");
                    }
                }
                tokio::select! {
                    _ = shutdown.changed() => return,
                    _ = tokio::time::sleep(retry_delay) => {}
                }
            }
        });
    }

    async fn process_with_retries(&mut self, number: u64) -> Result<(), IndexError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.process_one(number).await {
                Ok(()) => return Ok(()),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempt < self.config.max_block_attempts => {
                    self.metrics.block_retries.increment(1);
                    warn!(
                        target: "indexer::coordinator",
                        %err,
                        number,
                        attempt,
                        "block attempt failed, retrying"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(err) => {
                    return Err(IndexError::Exhausted {
                        number,
                        attempts: attempt,
                        source: Box::new(err),
                    })
                }
            }
        }
    }

    async fn process_one(&mut self, number: u64) -> Result<(), IndexError> {
        let block = self.chain.block_with_receipts(number).await?;
        self.guard.check_extends(&block.header)?;
        self.processor.process_block(&block).await?;
        self.guard.push(&block.header);
        self.guard.promote_confirmed(number);
        self.store
            .update_last_block(self.config.chain_id, number, block.header.timestamp)
            .await?;
        self.metrics.last_block.set(number as f64);
        debug!(target: "indexer::coordinator", number, "checkpoint advanced");
        Ok(())
    }

    async fn handle_reorg(&mut self) -> Result<(), IndexError> {
        let fork = self.guard.find_fork_point(&*self.chain).await?;
        let events_dropped = self.store.delete_events_above(fork).await?;
        let rows_dropped = self.store.delete_ethscriptions_created_above(fork).await?;
        replay::rebuild(&*self.store, fork).await?;
        self.guard.truncate_above(fork);
        let timestamp = self.guard.last().map(|entry| entry.timestamp).unwrap_or_default();
        self.store.update_last_block(self.config.chain_id, fork, timestamp).await?;
        self.metrics.last_block.set(fork as f64);

        let head = self.chain.latest_block_number().await?;
        for number in fork + 1..=head {
            self.queue.enqueue(number);
        }
        info!(
            target: "indexer::coordinator",
            fork,
            events_dropped,
            rows_dropped,
            "rollback complete, re-enqueued to head"
        );
        Ok(())
    }
}
