//! Row and event types shared across the phunk indexer.
//!
//! Everything downstream of the block pipeline (datastore, writers, replay)
//! speaks in these types; raw RPC shapes never leave the chain client or the
//! decoders.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod block;
mod ethscription;
mod event;
mod market;
mod user;

pub use block::ProcessedBlock;
pub use ethscription::Ethscription;
pub use event::{EventCoordinates, EventKind, IndexedEvent};
pub use market::{Auction, AuctionBidEntry, AuctionParams, Bid, Listing};
pub use user::User;
