//! The ownership state machine.
//!
//! Every ownership mutation in the system funnels through
//! [`OwnershipLedger::apply`]: direct calldata transfers, ESIP-1/2 log
//! transfers, batch items and auction settlements. Rejection is silent;
//! invalid transfers are the normal case on a public chain, not an error.

use crate::IndexError;
use alloy_primitives::{Address, B256, U256};
use phunk_primitives::{EventCoordinates, EventKind, IndexedEvent};
use phunk_storage::Datastore;
use tracing::trace;

/// One transfer attempt against the ownership map.
#[derive(Debug, Clone, Copy)]
pub struct TransferRequest {
    pub hash_id: B256,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    /// Expected previous owner, carried only by ESIP-2 style transfers.
    pub prev_owner_hint: Option<Address>,
    pub coord: EventCoordinates,
}

/// Applies transfers to the authoritative ownership map.
#[derive(Debug)]
pub struct OwnershipLedger<'a, S> {
    store: &'a S,
}

impl<'a, S: Datastore> OwnershipLedger<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Applies the transfer and records a `transfer` event when accepted.
    pub async fn apply_transfer(
        &self,
        request: TransferRequest,
        events: &mut Vec<IndexedEvent>,
    ) -> Result<bool, IndexError> {
        if !self.apply(&request).await? {
            return Ok(false);
        }
        events.push(IndexedEvent::new(
            EventKind::Transfer,
            request.hash_id,
            request.from,
            request.to,
            request.value,
            &request.coord,
        ));
        Ok(true)
    }

    /// Guarded ownership mutation without an event row. Used by auction
    /// settlement, whose own event row records the movement.
    pub async fn apply(&self, request: &TransferRequest) -> Result<bool, IndexError> {
        let Some(record) = self.store.ethscription_by_hash_id(request.hash_id).await? else {
            trace!(target: "indexer::ownership", hash_id = %request.hash_id, "transfer of unknown hash rejected");
            return Ok(false);
        };
        if record.owner != request.from {
            trace!(
                target: "indexer::ownership",
                hash_id = %request.hash_id,
                owner = %record.owner,
                from = %request.from,
                "transferrer is not the owner"
            );
            return Ok(false);
        }
        if let (Some(hint), Some(prev)) = (request.prev_owner_hint, record.prev_owner) {
            if hint != prev {
                trace!(
                    target: "indexer::ownership",
                    hash_id = %request.hash_id,
                    hint = %hint,
                    prev_owner = %prev,
                    "previous-owner hint disagrees"
                );
                return Ok(false);
            }
        }
        if !self.store.update_owner(request.hash_id, request.from, request.to).await? {
            // Lost the compare-and-set; somebody else moved it first.
            return Ok(false);
        }
        self.store.get_or_create_user(request.to, request.coord.block_timestamp).await?;
        trace!(
            target: "indexer::ownership",
            hash_id = %request.hash_id,
            from = %request.from,
            to = %request.to,
            "ownership transferred"
        );
        Ok(true)
    }
}
