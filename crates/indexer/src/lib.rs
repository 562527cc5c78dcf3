//! Block-to-event processing pipeline for phunk ethscriptions.
//!
//! A single long-running worker per chain consumes block numbers from a
//! FIFO [`BlockQueue`], classifies each transaction, decodes the recognized
//! inscription and contract-event vocabularies, and applies them to the
//! ownership map and derived tables under a reorg-aware confirmation
//! window. Every mutation leaves a row in the append-only events table; the
//! event id makes reprocessing a block a no-op.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod abi;
mod auction;
mod bridge;
mod classify;
mod coordinator;
mod dictionary;
mod error;
mod market;
mod metrics;
mod ownership;
mod points;
mod processor;
mod queue;
mod reorg;
mod replay;

pub use bridge::BridgeOut;
pub use classify::{classify_calldata, CallClass};
pub use coordinator::Coordinator;
pub use dictionary::{load_dictionary, DictionaryError};
pub use error::IndexError;
pub use ownership::{OwnershipLedger, TransferRequest};
pub use processor::Processor;
pub use queue::{BlockQueue, QueuedBlock};
pub use reorg::ReorgGuard;
