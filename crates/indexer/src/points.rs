//! Points contract events.
//!
//! Point totals are eventually consistent: the pipeline only notes which
//! users were touched during a block and then overwrites their totals from
//! the contract's view function. Failures are logged and swallowed; any
//! later touch re-syncs the total.

use crate::abi;
use alloy_primitives::Address;
use alloy_sol_types::SolEvent;
use phunk_chain::{ChainClient, LogRecord};
use phunk_storage::Datastore;
use std::collections::HashSet;
use tracing::{trace, warn};

/// Collects the touched user out of a points-contract log.
pub(crate) fn collect(log: &LogRecord, users: &mut HashSet<Address>) {
    if log.topic0() != Some(&abi::PointsAdded::SIGNATURE_HASH) {
        return;
    }
    match abi::PointsAdded::decode_log_data(&log.data) {
        Ok(added) => {
            users.insert(added.user);
        }
        Err(err) => {
            warn!(target: "indexer::points", %err, log_index = log.log_index, "malformed points log");
        }
    }
}

/// Overwrites the stored totals for every touched user.
pub(crate) async fn sync_totals<C, S>(
    chain: &C,
    store: &S,
    users: &HashSet<Address>,
    timestamp: u64,
) where
    C: ChainClient + ?Sized,
    S: Datastore,
{
    for user in users {
        let points = match chain.points_balance(*user).await {
            Ok(points) => u64::try_from(points).unwrap_or(u64::MAX),
            Err(err) => {
                warn!(target: "indexer::points", %err, user = %user, "points lookup failed, will re-sync later");
                continue;
            }
        };
        if let Err(err) = store.get_or_create_user(*user, timestamp).await {
            warn!(target: "indexer::points", %err, user = %user, "user row unavailable");
            continue;
        }
        if let Err(err) = store.update_user_points(*user, points).await {
            warn!(target: "indexer::points", %err, user = %user, "points write failed, will re-sync later");
            continue;
        }
        trace!(target: "indexer::points", user = %user, points, "points synced");
    }
}
