//! Reorg detection over a sliding window of processed headers.

use crate::IndexError;
use phunk_chain::{BlockHeader, ChainClient};
use phunk_primitives::ProcessedBlock;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Sliding window of the most recently processed block headers.
///
/// Detects parent-hash discontinuities and promotes entries to `confirmed`
/// once they fall a configured depth behind the head. Confirmed entries are
/// no longer eligible for rollback.
#[derive(Debug)]
pub struct ReorgGuard {
    window: VecDeque<ProcessedBlock>,
    capacity: usize,
    confirmations: u64,
}

impl ReorgGuard {
    pub fn new(capacity: usize, confirmations: u64) -> Self {
        Self { window: VecDeque::with_capacity(capacity), capacity, confirmations }
    }

    pub fn last(&self) -> Option<&ProcessedBlock> {
        self.window.back()
    }

    /// Asserts that `header` extends the window. An empty window accepts
    /// anything (fresh start or post-rollback).
    pub fn check_extends(&self, header: &BlockHeader) -> Result<(), IndexError> {
        let Some(last) = self.window.back() else { return Ok(()) };
        if header.number == last.number + 1 && header.parent_hash == last.hash {
            return Ok(());
        }
        Err(IndexError::ReorgDetected {
            number: header.number,
            parent_hash: header.parent_hash,
            window_hash: last.hash,
        })
    }

    /// Appends a processed header and trims the window to capacity.
    pub fn push(&mut self, header: &BlockHeader) {
        self.window.push_back(ProcessedBlock {
            number: header.number,
            hash: header.hash,
            parent_hash: header.parent_hash,
            timestamp: header.timestamp,
            confirmed: false,
        });
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
    }

    /// Confirms every entry that is at least `confirmations` blocks behind
    /// `head`.
    pub fn promote_confirmed(&mut self, head: u64) {
        let boundary = head.saturating_sub(self.confirmations);
        for entry in &mut self.window {
            if entry.number <= boundary && !entry.confirmed {
                debug!(target: "indexer::reorg", number = entry.number, "block confirmed");
                entry.confirmed = true;
            }
        }
    }

    /// Finds the newest window entry whose hash still matches the chain,
    /// walking the unconfirmed tail newest to oldest. Falls back to the
    /// newest confirmed entry if it still agrees; anything deeper is fatal.
    pub async fn find_fork_point<C: ChainClient + ?Sized>(
        &self,
        chain: &C,
    ) -> Result<u64, IndexError> {
        for entry in self.window.iter().rev() {
            let on_chain = chain.block_hash(entry.number).await?;
            if on_chain == Some(entry.hash) {
                return Ok(entry.number);
            }
            if entry.confirmed {
                // A confirmed block no longer matches the chain; rolling it
                // back is not allowed.
                warn!(
                    target: "indexer::reorg",
                    number = entry.number,
                    expected = %entry.hash,
                    "confirmed block disagrees with chain"
                );
                return Err(IndexError::ReorgBeyondWindow(entry.number));
            }
        }
        let oldest = self.window.front().map(|entry| entry.number).unwrap_or_default();
        Err(IndexError::ReorgBeyondWindow(oldest))
    }

    /// Drops all entries above `number`.
    pub fn truncate_above(&mut self, number: u64) {
        while self.window.back().is_some_and(|entry| entry.number > number) {
            self.window.pop_back();
        }
    }

    #[cfg(test)]
    pub(crate) fn window(&self) -> &VecDeque<ProcessedBlock> {
        &self.window
    }
}
