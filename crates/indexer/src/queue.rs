//! The per-chain block work queue.
//!
//! FIFO over block numbers with idempotent enqueue, pause/resume and a
//! single consumer. Ordering is preserved by construction: one queue, one
//! worker per chain.

use parking_lot::Mutex;
use std::{
    collections::{HashSet, VecDeque},
    time::SystemTime,
};
use tokio::sync::Notify;

/// A queued unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedBlock {
    pub number: u64,
    pub discovered_at: SystemTime,
}

#[derive(Debug, Default)]
struct QueueInner {
    items: VecDeque<QueuedBlock>,
    queued: HashSet<u64>,
    paused: bool,
}

/// FIFO of block numbers for a single chain.
#[derive(Debug, Default)]
pub struct BlockQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
}

impl BlockQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a block to the back of the queue. Idempotent on the number while
    /// it is still queued; returns whether anything was added.
    pub fn enqueue(&self, number: u64) -> bool {
        let added = {
            let mut inner = self.inner.lock();
            if !inner.queued.insert(number) {
                return false;
            }
            inner.items.push_back(QueuedBlock { number, discovered_at: SystemTime::now() });
            true
        };
        self.notify.notify_one();
        added
    }

    /// Puts a block back at the front, ahead of everything else. Used by the
    /// worker to retry a failed block without giving up its slot.
    pub fn requeue_front(&self, number: u64) {
        {
            let mut inner = self.inner.lock();
            if !inner.queued.insert(number) {
                return;
            }
            inner.items.push_front(QueuedBlock { number, discovered_at: SystemTime::now() });
        }
        self.notify.notify_one();
    }

    pub fn pause(&self) {
        self.inner.lock().paused = true;
    }

    pub fn resume(&self) {
        self.inner.lock().paused = false;
        self.notify.notify_one();
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.items.clear();
        inner.queued.clear();
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits for the next block in FIFO order. Honors `pause`.
    pub async fn dequeue(&self) -> QueuedBlock {
        loop {
            let notified = self.notify.notified();
            {
                let mut inner = self.inner.lock();
                if !inner.paused {
                    if let Some(item) = inner.items.pop_front() {
                        inner.queued.remove(&item.number);
                        return item;
                    }
                }
            }
            notified.await;
        }
    }
}
