//! Per-block processing.
//!
//! Transactions are walked in `transaction_index` order, logs within a
//! transaction in `log_index` order; every ordering-sensitive mutation
//! happens on this single-threaded path. Events are collected per block and
//! written once, before the caller advances the checkpoint.

use crate::{
    abi, auction,
    bridge::{self, BridgeOut},
    classify::{classify_calldata, CallClass},
    market,
    metrics::IndexerMetrics,
    ownership::{OwnershipLedger, TransferRequest},
    points, IndexError,
};
use alloy_primitives::{Address, B256};
use alloy_sol_types::SolEvent;
use phunk_chain::{BlockData, BlockHeader, ChainClient, LogRecord, TxRecord};
use phunk_config::ChainConfig;
use phunk_primitives::{
    AuctionParams, Ethscription, EventCoordinates, EventKind, IndexedEvent,
};
use phunk_storage::Datastore;
use sha2::{Digest, Sha256};
use std::{collections::HashSet, sync::Arc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, trace, warn};

/// State accumulated while walking one block.
#[derive(Debug, Default)]
struct BlockContext {
    events: Vec<IndexedEvent>,
    points_users: HashSet<Address>,
}

/// Classifies and applies everything inside a block.
pub struct Processor<C, S> {
    chain: Arc<C>,
    store: Arc<S>,
    config: ChainConfig,
    auction_params: parking_lot::Mutex<AuctionParams>,
    bridge_out: Option<UnboundedSender<BridgeOut>>,
    metrics: IndexerMetrics,
}

impl<C, S> std::fmt::Debug for Processor<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<C: ChainClient, S: Datastore> Processor<C, S> {
    pub fn new(chain: Arc<C>, store: Arc<S>, config: ChainConfig) -> Self {
        Self {
            chain,
            store,
            config,
            auction_params: parking_lot::Mutex::new(AuctionParams::default()),
            bridge_out: None,
            metrics: IndexerMetrics::default(),
        }
    }

    /// Attaches the channel feeding the external bridge-out worker.
    pub fn with_bridge_out(mut self, outbox: UnboundedSender<BridgeOut>) -> Self {
        self.bridge_out = Some(outbox);
        self
    }

    const fn word_len(&self) -> usize {
        // Config counts hex characters, calldata comes as bytes.
        self.config.segment_size / 2
    }

    /// Processes one block. Idempotent: re-running a block re-derives the
    /// same mutations, and the event ids make duplicate rows vanish.
    pub async fn process_block(&self, block: &BlockData) -> Result<(), IndexError> {
        let mut ctx = BlockContext::default();
        for tx in &block.transactions {
            self.process_transaction(&block.header, tx, &mut ctx).await?;
        }
        points::sync_totals(
            &*self.chain,
            &*self.store,
            &ctx.points_users,
            block.header.timestamp,
        )
        .await;

        let inserted = self.store.add_events(&ctx.events).await?;
        self.metrics.events_written.increment(inserted);
        self.metrics.blocks_processed.increment(1);
        debug!(
            target: "indexer::processor",
            number = block.header.number,
            transactions = block.transactions.len(),
            events = ctx.events.len(),
            inserted,
            "block processed"
        );
        Ok(())
    }

    async fn process_transaction(
        &self,
        header: &BlockHeader,
        tx: &TxRecord,
        ctx: &mut BlockContext,
    ) -> Result<(), IndexError> {
        if !tx.success || tx.input.is_empty() {
            return Ok(());
        }
        let base = EventCoordinates {
            block_number: header.number,
            block_hash: header.hash,
            block_timestamp: header.timestamp,
            tx_index: tx.tx_index,
            tx_hash: tx.tx_hash,
            stable_index: tx.tx_index,
        };

        match classify_calldata(&tx.input, self.word_len()) {
            CallClass::Creation(payload) => {
                self.process_creation(header, tx, &payload, base, ctx).await?;
            }
            CallClass::ForeignDataUri => {
                trace!(target: "indexer::processor", tx_hash = %tx.tx_hash, "foreign data uri, transaction ignored");
                return Ok(());
            }
            CallClass::Transfer(hash_id) => {
                self.apply_calldata_transfer(tx, hash_id, base, ctx).await?;
            }
            CallClass::Batch(words) => {
                self.process_batch(tx, words, base, ctx).await?;
            }
            CallClass::None => {}
        }

        for log in &tx.logs {
            self.process_log(tx, log, base, ctx).await?;
        }
        Ok(())
    }

    async fn process_creation(
        &self,
        header: &BlockHeader,
        tx: &TxRecord,
        payload: &str,
        coord: EventCoordinates,
        ctx: &mut BlockContext,
    ) -> Result<(), IndexError> {
        let sha = B256::from_slice(&Sha256::digest(payload.as_bytes()));
        let Some(token_id) = self.store.check_is_ethscription_sha(sha).await? else {
            trace!(target: "indexer::processor", %sha, "payload not in collection dictionary");
            return Ok(());
        };
        if self.store.ethscription_by_sha(sha).await?.is_some() {
            // First inscription wins.
            trace!(target: "indexer::processor", %sha, "sha already inscribed");
            return Ok(());
        }

        let owner = tx.to.unwrap_or(Address::ZERO);
        self.store.get_or_create_user(tx.from, header.timestamp).await?;
        self.store.get_or_create_user(owner, header.timestamp).await?;
        self.store
            .add_ethscription(Ethscription {
                hash_id: tx.tx_hash,
                sha,
                token_id,
                creator: tx.from,
                owner,
                prev_owner: None,
                created_at: header.timestamp,
                created_block: header.number,
                locked: false,
            })
            .await?;
        ctx.events.push(IndexedEvent::new(
            EventKind::Created,
            tx.tx_hash,
            tx.from,
            owner,
            tx.value,
            &coord,
        ));
        info!(
            target: "indexer::processor",
            hash_id = %tx.tx_hash,
            token_id,
            owner = %owner,
            "ethscription created"
        );
        Ok(())
    }

    async fn apply_calldata_transfer(
        &self,
        tx: &TxRecord,
        hash_id: B256,
        coord: EventCoordinates,
        ctx: &mut BlockContext,
    ) -> Result<(), IndexError> {
        let ledger = OwnershipLedger::new(&*self.store);
        let accepted = ledger
            .apply_transfer(
                TransferRequest {
                    hash_id,
                    from: tx.from,
                    to: tx.to.unwrap_or(Address::ZERO),
                    value: tx.value,
                    prev_owner_hint: None,
                    coord,
                },
                &mut ctx.events,
            )
            .await?;
        if !accepted {
            self.metrics.transfers_rejected.increment(1);
        }
        Ok(())
    }

    async fn process_batch(
        &self,
        tx: &TxRecord,
        words: Vec<B256>,
        base: EventCoordinates,
        ctx: &mut BlockContext,
    ) -> Result<(), IndexError> {
        let valid: HashSet<B256> =
            self.chain.validate_ethscriptions(&words).await?.into_iter().collect();
        if valid.is_empty() {
            trace!(target: "indexer::processor", tx_hash = %tx.tx_hash, "batch contained no valid ethscriptions");
            return Ok(());
        }
        for (position, word) in words.iter().enumerate() {
            if !valid.contains(word) {
                continue;
            }
            self.apply_calldata_transfer(
                tx,
                *word,
                base.with_stable_index(position as u64),
                ctx,
            )
            .await?;
        }
        Ok(())
    }

    async fn process_log(
        &self,
        tx: &TxRecord,
        log: &LogRecord,
        base: EventCoordinates,
        ctx: &mut BlockContext,
    ) -> Result<(), IndexError> {
        let Some(topic0) = log.topic0().copied() else { return Ok(()) };
        let coord = base.with_stable_index(log.log_index);

        if topic0 == abi::ethscriptions_protocol_TransferEthscription::SIGNATURE_HASH {
            match abi::ethscriptions_protocol_TransferEthscription::decode_log_data(&log.data) {
                Ok(transfer) => {
                    let ledger = OwnershipLedger::new(&*self.store);
                    let accepted = ledger
                        .apply_transfer(
                            TransferRequest {
                                hash_id: transfer.ethscriptionId,
                                from: log.address,
                                to: transfer.recipient,
                                value: tx.value,
                                prev_owner_hint: None,
                                coord,
                            },
                            &mut ctx.events,
                        )
                        .await?;
                    if !accepted {
                        self.metrics.transfers_rejected.increment(1);
                    }
                }
                Err(err) => {
                    warn!(target: "indexer::processor", %err, "malformed ESIP-1 log");
                }
            }
        } else if topic0
            == abi::ethscriptions_protocol_TransferEthscriptionForPreviousOwner::SIGNATURE_HASH
        {
            match abi::ethscriptions_protocol_TransferEthscriptionForPreviousOwner::decode_log_data(
                &log.data,
            ) {
                Ok(transfer) => {
                    let ledger = OwnershipLedger::new(&*self.store);
                    let accepted = ledger
                        .apply_transfer(
                            TransferRequest {
                                hash_id: transfer.ethscriptionId,
                                from: log.address,
                                to: transfer.recipient,
                                value: tx.value,
                                prev_owner_hint: Some(transfer.previousOwner),
                                coord,
                            },
                            &mut ctx.events,
                        )
                        .await?;
                    if !accepted {
                        self.metrics.transfers_rejected.increment(1);
                    }
                }
                Err(err) => {
                    warn!(target: "indexer::processor", %err, "malformed ESIP-2 log");
                }
            }
        } else if log.address == self.config.market_address {
            market::handle_log(&*self.store, tx, log, coord, &mut ctx.events).await?;
        } else if log.address == self.config.auction_address {
            auction::handle_log(&*self.store, &self.auction_params, log, coord, &mut ctx.events)
                .await?;
        } else if log.address == self.config.points_address {
            points::collect(log, &mut ctx.points_users);
        } else if log.address == self.config.bridge_address {
            bridge::handle_log(&*self.store, self.bridge_out.as_ref(), log).await?;
        }
        Ok(())
    }
}
