//! Bridge contract events: escrow locking for cross-layer mirroring.

use crate::{abi, IndexError};
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;
use phunk_chain::LogRecord;
use phunk_storage::Datastore;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// Work item handed to the external bridge-out worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeOut {
    pub hash_id: B256,
    pub prev_owner: Address,
    pub nonce: U256,
    pub value: U256,
}

pub(crate) async fn handle_log<S: Datastore>(
    store: &S,
    outbox: Option<&UnboundedSender<BridgeOut>>,
    log: &LogRecord,
) -> Result<(), IndexError> {
    let Some(topic0) = log.topic0().copied() else { return Ok(()) };

    if topic0 == abi::HashLocked::SIGNATURE_HASH {
        let locked = match abi::HashLocked::decode_log_data(&log.data) {
            Ok(locked) => locked,
            Err(err) => {
                warn!(target: "indexer::bridge", %err, "malformed HashLocked log");
                return Ok(());
            }
        };
        // The contract locked something we do not know: that is a real
        // inconsistency, not a skippable event.
        if !store.lock_ethscription(locked.hashId, true).await? {
            return Err(IndexError::BridgeInconsistency(locked.hashId));
        }
        info!(target: "indexer::bridge", hash_id = %locked.hashId, prev_owner = %locked.prevOwner, "hash locked for bridge");
        if let Some(outbox) = outbox {
            let _ = outbox.send(BridgeOut {
                hash_id: locked.hashId,
                prev_owner: locked.prevOwner,
                nonce: locked.nonce,
                value: locked.value,
            });
        }
    } else if topic0 == abi::HashUnlocked::SIGNATURE_HASH {
        let unlocked = match abi::HashUnlocked::decode_log_data(&log.data) {
            Ok(unlocked) => unlocked,
            Err(err) => {
                warn!(target: "indexer::bridge", %err, "malformed HashUnlocked log");
                return Ok(());
            }
        };
        if !store.lock_ethscription(unlocked.hashId, false).await? {
            warn!(target: "indexer::bridge", hash_id = %unlocked.hashId, "unlock of unknown hash");
        }
    }

    Ok(())
}
