//! Processor-level scenarios: creations, transfers, marketplace, auctions,
//! bridge and points.

use crate::mock::{
    block, header, log, test_config, tx, with_logs, MockChain, AUCTION, BRIDGE, MARKET, POINTS,
};
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::SolEvent;
use phunk_indexer::{abi, IndexError, Processor};
use phunk_primitives::{Ethscription, EventKind, Listing};
use phunk_storage::{Datastore, InMemoryDatastore};
use sha2::{Digest, Sha256};
use std::{collections::HashMap, sync::Arc};

const AAA: Address = Address::repeat_byte(0xaa);
const BBB: Address = Address::repeat_byte(0xbb);
const CCC: Address = Address::repeat_byte(0xcc);
const PAYLOAD: &str = "data:image/svg+xml,<svg>phunk</svg>";

fn payload_sha() -> B256 {
    B256::from_slice(&Sha256::digest(PAYLOAD.as_bytes()))
}

fn setup() -> (Arc<MockChain>, Arc<InMemoryDatastore>, Processor<MockChain, InMemoryDatastore>) {
    let chain = Arc::new(MockChain::new());
    let store = Arc::new(InMemoryDatastore::new());
    let processor = Processor::new(chain.clone(), store.clone(), test_config());
    (chain, store, processor)
}

async fn seed_dictionary(store: &InMemoryDatastore, token_id: u64) {
    store.seed_collection(HashMap::from([(payload_sha(), token_id)])).await.unwrap();
}

async fn seed_phunk(store: &InMemoryDatastore, owner: Address, prev_owner: Option<Address>) -> B256 {
    let hash_id = B256::repeat_byte(0x11);
    store
        .add_ethscription(Ethscription {
            hash_id,
            sha: payload_sha(),
            token_id: 42,
            creator: AAA,
            owner,
            prev_owner,
            created_at: 1200,
            created_block: 100,
            locked: false,
        })
        .await
        .unwrap();
    hash_id
}

#[tokio::test]
async fn creation_mints_dictionary_payload() {
    let (_chain, store, processor) = setup();
    seed_dictionary(&store, 42).await;

    let creation = tx(0x11, 0, AAA, BBB, PAYLOAD.as_bytes().to_vec());
    processor.process_block(&block(header(100, 1, 0), vec![creation])).await.unwrap();

    let row = store.ethscription_by_hash_id(B256::repeat_byte(0x11)).await.unwrap().unwrap();
    assert_eq!(row.owner, BBB);
    assert_eq!(row.creator, AAA);
    assert_eq!(row.prev_owner, None);
    assert_eq!(row.token_id, 42);
    assert_eq!(row.created_block, 100);

    let events = store.events_ordered().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Created);
    assert_eq!(events[0].from, AAA);
    assert_eq!(events[0].to, BBB);
}

#[tokio::test]
async fn creation_ignores_unknown_sha_and_duplicates() {
    let (_chain, store, processor) = setup();

    // Unknown sha: nothing happens.
    let creation = tx(0x11, 0, AAA, BBB, PAYLOAD.as_bytes().to_vec());
    processor.process_block(&block(header(100, 1, 0), vec![creation.clone()])).await.unwrap();
    assert!(store.ethscription_by_sha(payload_sha()).await.unwrap().is_none());

    // Seeded: first inscription wins, the second is silently dropped.
    seed_dictionary(&store, 42).await;
    processor.process_block(&block(header(101, 2, 1), vec![creation])).await.unwrap();
    let duplicate = tx(0x12, 0, CCC, CCC, PAYLOAD.as_bytes().to_vec());
    processor.process_block(&block(header(102, 3, 2), vec![duplicate])).await.unwrap();

    let row = store.ethscription_by_sha(payload_sha()).await.unwrap().unwrap();
    assert_eq!(row.hash_id, B256::repeat_byte(0x11));
    assert_eq!(row.owner, BBB);
    assert_eq!(store.events_ordered().await.unwrap().len(), 1);
}

#[tokio::test]
async fn foreign_data_uri_ignores_the_whole_transaction() {
    let (_chain, store, processor) = setup();
    let hash_id = seed_phunk(&store, BBB, None).await;

    // Even the marketplace log in the same transaction is skipped.
    let bid_log = log(
        MARKET,
        0,
        abi::PhunkBidEntered { phunkId: hash_id, fromAddress: CCC, value: U256::from(7) }
            .encode_log_data(),
    );
    let foreign = with_logs(tx(0x21, 0, CCC, MARKET, b"data:text/plain,hello".to_vec()), vec![bid_log]);
    processor.process_block(&block(header(101, 2, 1), vec![foreign])).await.unwrap();

    assert!(store.bid_by_hash_id(hash_id).await.unwrap().is_none());
    assert!(store.events_ordered().await.unwrap().is_empty());
}

#[tokio::test]
async fn direct_transfer_moves_ownership() {
    let (_chain, store, processor) = setup();
    let hash_id = seed_phunk(&store, BBB, None).await;

    let transfer = tx(0x21, 0, BBB, CCC, hash_id.to_vec());
    processor.process_block(&block(header(101, 2, 1), vec![transfer])).await.unwrap();

    let row = store.ethscription_by_hash_id(hash_id).await.unwrap().unwrap();
    assert_eq!(row.owner, CCC);
    assert_eq!(row.prev_owner, Some(BBB));
    let events = store.events_ordered().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Transfer);
}

#[tokio::test]
async fn direct_transfer_from_non_owner_changes_nothing() {
    let (_chain, store, processor) = setup();
    let hash_id = seed_phunk(&store, Address::repeat_byte(0x22), None).await;

    let transfer = tx(0x21, 0, BBB, CCC, hash_id.to_vec());
    processor.process_block(&block(header(101, 2, 1), vec![transfer])).await.unwrap();

    let row = store.ethscription_by_hash_id(hash_id).await.unwrap().unwrap();
    assert_eq!(row.owner, Address::repeat_byte(0x22));
    assert!(store.events_ordered().await.unwrap().is_empty());
}

#[tokio::test]
async fn batch_transfer_applies_validated_words_in_order() {
    let (chain, store, processor) = setup();

    // Three phunks; w1 and w3 owned by the sender, w2 exists but is not a
    // valid ethscription per the provider.
    let words = [B256::repeat_byte(0x31), B256::repeat_byte(0x32), B256::repeat_byte(0x33)];
    for (i, word) in words.iter().enumerate() {
        store
            .add_ethscription(Ethscription {
                hash_id: *word,
                sha: B256::repeat_byte(0x40 + i as u8),
                token_id: i as u64,
                creator: AAA,
                owner: BBB,
                prev_owner: None,
                created_at: 0,
                created_block: 90,
                locked: false,
            })
            .await
            .unwrap();
    }
    chain.set_valid([words[0], words[2]]);

    let mut calldata = Vec::new();
    for word in &words {
        calldata.extend_from_slice(word.as_slice());
    }
    let batch = tx(0x21, 0, BBB, CCC, calldata);
    processor.process_block(&block(header(101, 2, 1), vec![batch])).await.unwrap();

    assert_eq!(
        store.ethscription_by_hash_id(words[0]).await.unwrap().unwrap().owner,
        CCC
    );
    assert_eq!(
        store.ethscription_by_hash_id(words[1]).await.unwrap().unwrap().owner,
        BBB
    );
    assert_eq!(
        store.ethscription_by_hash_id(words[2]).await.unwrap().unwrap().owner,
        CCC
    );

    let events = store.events_ordered().await.unwrap();
    assert_eq!(events.len(), 2);
    // Stable index is the position within the batch.
    assert!(events[0].tx_id.ends_with("-0"));
    assert!(events[1].tx_id.ends_with("-2"));
}

#[tokio::test]
async fn esip_log_transfers_honor_prev_owner_hint() {
    let (_chain, store, processor) = setup();
    let hash_id = seed_phunk(&store, MARKET, Some(AAA)).await;

    // ESIP-2 with a wrong hint is rejected.
    let bad = log(
        MARKET,
        0,
        abi::ethscriptions_protocol_TransferEthscriptionForPreviousOwner {
            previousOwner: BBB,
            recipient: CCC,
            ethscriptionId: hash_id,
        }
        .encode_log_data(),
    );
    processor
        .process_block(&block(header(101, 2, 1), vec![with_logs(tx(0x21, 0, AAA, MARKET, vec![0x01]), vec![bad])]))
        .await
        .unwrap();
    assert_eq!(store.ethscription_by_hash_id(hash_id).await.unwrap().unwrap().owner, MARKET);

    // Matching hint passes; the emitting contract is the transferrer.
    let good = log(
        MARKET,
        0,
        abi::ethscriptions_protocol_TransferEthscriptionForPreviousOwner {
            previousOwner: AAA,
            recipient: CCC,
            ethscriptionId: hash_id,
        }
        .encode_log_data(),
    );
    processor
        .process_block(&block(header(102, 3, 2), vec![with_logs(tx(0x22, 0, AAA, MARKET, vec![0x01]), vec![good])]))
        .await
        .unwrap();
    let row = store.ethscription_by_hash_id(hash_id).await.unwrap().unwrap();
    assert_eq!(row.owner, CCC);
    assert_eq!(row.prev_owner, Some(MARKET));
}

#[tokio::test]
async fn stale_offer_drops_listing_without_event() {
    let (_chain, store, processor) = setup();
    let hash_id = seed_phunk(&store, MARKET, Some(AAA)).await;
    store
        .upsert_listing(Listing {
            hash_id,
            seller: AAA,
            min_value: U256::from(1),
            to_address: Address::ZERO,
            created_at: 0,
        })
        .await
        .unwrap();

    // Offer placed by someone who is not the legitimate previous owner.
    let offered = log(
        MARKET,
        0,
        abi::PhunkOffered {
            phunkId: hash_id,
            toAddress: Address::ZERO,
            minValue: U256::from(10u64.pow(18)),
        }
        .encode_log_data(),
    );
    processor
        .process_block(&block(header(101, 2, 1), vec![with_logs(tx(0x21, 0, BBB, MARKET, vec![0x01]), vec![offered])]))
        .await
        .unwrap();

    assert!(store.listing_by_hash_id(hash_id).await.unwrap().is_none());
    assert!(store.events_ordered().await.unwrap().is_empty());
}

#[tokio::test]
async fn offer_by_prev_owner_creates_listing() {
    let (_chain, store, processor) = setup();
    let hash_id = seed_phunk(&store, MARKET, Some(AAA)).await;

    let offered = log(
        MARKET,
        0,
        abi::PhunkOffered { phunkId: hash_id, toAddress: CCC, minValue: U256::from(5) }
            .encode_log_data(),
    );
    processor
        .process_block(&block(header(101, 2, 1), vec![with_logs(tx(0x21, 0, AAA, MARKET, vec![0x01]), vec![offered])]))
        .await
        .unwrap();

    let listing = store.listing_by_hash_id(hash_id).await.unwrap().unwrap();
    assert_eq!(listing.seller, AAA);
    assert_eq!(listing.min_value, U256::from(5));
    assert_eq!(listing.to_address, CCC);

    let events = store.events_ordered().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::PhunkOffered);
}

#[tokio::test]
async fn bought_emits_only_when_a_listing_was_removed() {
    let (_chain, store, processor) = setup();
    let hash_id = seed_phunk(&store, MARKET, Some(AAA)).await;

    // No listing yet: the buy raced a cancellation, nothing surfaces.
    let bought = log(
        MARKET,
        0,
        abi::PhunkBought { phunkId: hash_id, value: U256::from(9), fromAddress: AAA, toAddress: CCC }
            .encode_log_data(),
    );
    processor
        .process_block(&block(header(101, 2, 1), vec![with_logs(tx(0x21, 0, CCC, MARKET, vec![0x01]), vec![bought.clone()])]))
        .await
        .unwrap();
    assert!(store.events_ordered().await.unwrap().is_empty());

    // With a listing in place the buy is surfaced.
    store
        .upsert_listing(Listing {
            hash_id,
            seller: AAA,
            min_value: U256::from(9),
            to_address: Address::ZERO,
            created_at: 0,
        })
        .await
        .unwrap();
    processor
        .process_block(&block(header(102, 3, 2), vec![with_logs(tx(0x22, 0, CCC, MARKET, vec![0x01]), vec![bought])]))
        .await
        .unwrap();

    assert!(store.listing_by_hash_id(hash_id).await.unwrap().is_none());
    let events = store.events_ordered().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::PhunkBought);
    assert_eq!(events[0].value, U256::from(9));
}

#[tokio::test]
async fn delist_event_requires_prev_owner_caller() {
    let (_chain, store, processor) = setup();
    let hash_id = seed_phunk(&store, MARKET, Some(AAA)).await;
    store
        .upsert_listing(Listing {
            hash_id,
            seller: AAA,
            min_value: U256::from(1),
            to_address: Address::ZERO,
            created_at: 0,
        })
        .await
        .unwrap();

    // Removed by someone else: listing goes away, no event.
    let delist = log(MARKET, 0, abi::PhunkNoLongerForSale { phunkId: hash_id }.encode_log_data());
    processor
        .process_block(&block(header(101, 2, 1), vec![with_logs(tx(0x21, 0, BBB, MARKET, vec![0x01]), vec![delist.clone()])]))
        .await
        .unwrap();
    assert!(store.listing_by_hash_id(hash_id).await.unwrap().is_none());
    assert!(store.events_ordered().await.unwrap().is_empty());

    // Removed by the previous owner: event emitted.
    store
        .upsert_listing(Listing {
            hash_id,
            seller: AAA,
            min_value: U256::from(1),
            to_address: Address::ZERO,
            created_at: 0,
        })
        .await
        .unwrap();
    processor
        .process_block(&block(header(102, 3, 2), vec![with_logs(tx(0x22, 0, AAA, MARKET, vec![0x01]), vec![delist])]))
        .await
        .unwrap();
    let events = store.events_ordered().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::PhunkNoLongerForSale);
}

#[tokio::test]
async fn bids_replace_never_stack() {
    let (_chain, store, processor) = setup();
    let hash_id = seed_phunk(&store, MARKET, Some(AAA)).await;

    let first = log(
        MARKET,
        0,
        abi::PhunkBidEntered { phunkId: hash_id, fromAddress: BBB, value: U256::from(5) }
            .encode_log_data(),
    );
    let second = log(
        MARKET,
        1,
        abi::PhunkBidEntered { phunkId: hash_id, fromAddress: CCC, value: U256::from(8) }
            .encode_log_data(),
    );
    processor
        .process_block(&block(
            header(101, 2, 1),
            vec![with_logs(tx(0x21, 0, BBB, MARKET, vec![0x01]), vec![first, second])],
        ))
        .await
        .unwrap();

    let bid = store.bid_by_hash_id(hash_id).await.unwrap().unwrap();
    assert_eq!(bid.bidder, CCC);
    assert_eq!(bid.value, U256::from(8));

    let withdrawn = log(
        MARKET,
        0,
        abi::PhunkBidWithdrawn { phunkId: hash_id, fromAddress: CCC, value: U256::from(8) }
            .encode_log_data(),
    );
    processor
        .process_block(&block(header(102, 3, 2), vec![with_logs(tx(0x22, 0, CCC, MARKET, vec![0x01]), vec![withdrawn])]))
        .await
        .unwrap();
    assert!(store.bid_by_hash_id(hash_id).await.unwrap().is_none());

    let kinds: Vec<EventKind> =
        store.events_ordered().await.unwrap().into_iter().map(|event| event.kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::PhunkBidEntered, EventKind::PhunkBidEntered, EventKind::PhunkBidWithdrawn]
    );
}

#[tokio::test]
async fn auction_lifecycle_settles_to_winner() {
    let (_chain, store, processor) = setup();
    let hash_id = seed_phunk(&store, AUCTION, Some(AAA)).await;

    let created = log(
        AUCTION,
        0,
        abi::AuctionCreated {
            hashId: hash_id,
            owner: AAA,
            auctionId: U256::from(7),
            startTime: U256::from(1000),
            endTime: U256::from(2000),
        }
        .encode_log_data(),
    );
    processor
        .process_block(&block(header(101, 2, 1), vec![with_logs(tx(0x21, 0, AAA, AUCTION, vec![0x01]), vec![created])]))
        .await
        .unwrap();

    let bid = log(
        AUCTION,
        0,
        abi::AuctionBid {
            hashId: hash_id,
            auctionId: U256::from(7),
            sender: BBB,
            value: U256::from(100),
            extended: false,
        }
        .encode_log_data(),
    );
    let extended = log(
        AUCTION,
        1,
        abi::AuctionExtended { hashId: hash_id, auctionId: U256::from(7), endTime: U256::from(2600) }
            .encode_log_data(),
    );
    processor
        .process_block(&block(header(102, 3, 2), vec![with_logs(tx(0x22, 0, BBB, AUCTION, vec![0x01]), vec![bid, extended])]))
        .await
        .unwrap();

    let auction = store.auction_by_id(7).await.unwrap().unwrap();
    assert_eq!(auction.bidder, Some(BBB));
    assert_eq!(auction.amount, U256::from(100));
    assert_eq!(auction.end_time, 2600);
    assert!(!auction.settled);

    let settled = log(
        AUCTION,
        0,
        abi::AuctionSettled {
            hashId: hash_id,
            auctionId: U256::from(7),
            winner: BBB,
            amount: U256::from(100),
        }
        .encode_log_data(),
    );
    processor
        .process_block(&block(header(103, 4, 3), vec![with_logs(tx(0x23, 0, BBB, AUCTION, vec![0x01]), vec![settled])]))
        .await
        .unwrap();

    let auction = store.auction_by_id(7).await.unwrap().unwrap();
    assert!(auction.settled);
    // Settlement moved the escrowed phunk to the winner.
    let row = store.ethscription_by_hash_id(hash_id).await.unwrap().unwrap();
    assert_eq!(row.owner, BBB);
    assert_eq!(row.prev_owner, Some(AUCTION));

    let kinds: Vec<EventKind> =
        store.events_ordered().await.unwrap().into_iter().map(|event| event.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::AuctionCreated,
            EventKind::AuctionBid,
            EventKind::AuctionExtended,
            EventKind::AuctionSettled,
        ]
    );
}

#[tokio::test]
async fn bridge_lock_flags_row_and_notifies_worker() {
    let chain = Arc::new(MockChain::new());
    let store = Arc::new(InMemoryDatastore::new());
    let (outbox, mut inbox) = tokio::sync::mpsc::unbounded_channel();
    let processor =
        Processor::new(chain, store.clone(), test_config()).with_bridge_out(outbox);
    let hash_id = seed_phunk(&store, BBB, Some(AAA)).await;

    let locked = log(
        BRIDGE,
        0,
        abi::HashLocked { prevOwner: BBB, hashId: hash_id, nonce: U256::from(1), value: U256::from(2) }
            .encode_log_data(),
    );
    processor
        .process_block(&block(header(101, 2, 1), vec![with_logs(tx(0x21, 0, BBB, BRIDGE, vec![0x01]), vec![locked])]))
        .await
        .unwrap();

    assert!(store.ethscription_by_hash_id(hash_id).await.unwrap().unwrap().locked);
    let item = inbox.recv().await.unwrap();
    assert_eq!(item.hash_id, hash_id);
    assert_eq!(item.prev_owner, BBB);

    let unlocked =
        log(BRIDGE, 0, abi::HashUnlocked { prevOwner: BBB, hashId: hash_id }.encode_log_data());
    processor
        .process_block(&block(header(102, 3, 2), vec![with_logs(tx(0x22, 0, BBB, BRIDGE, vec![0x01]), vec![unlocked])]))
        .await
        .unwrap();
    assert!(!store.ethscription_by_hash_id(hash_id).await.unwrap().unwrap().locked);
}

#[tokio::test]
async fn bridge_lock_of_unknown_hash_fails_the_block() {
    let (_chain, _store, processor) = setup();

    let locked = log(
        BRIDGE,
        0,
        abi::HashLocked {
            prevOwner: BBB,
            hashId: B256::repeat_byte(0x77),
            nonce: U256::ZERO,
            value: U256::ZERO,
        }
        .encode_log_data(),
    );
    let result = processor
        .process_block(&block(header(101, 2, 1), vec![with_logs(tx(0x21, 0, BBB, BRIDGE, vec![0x01]), vec![locked])]))
        .await;
    assert_matches::assert_matches!(result, Err(IndexError::BridgeInconsistency(_)));
}

#[tokio::test]
async fn points_totals_overwritten_from_view_call() {
    let (chain, store, processor) = setup();
    chain.set_points(AAA, U256::from(500));

    let added =
        log(POINTS, 0, abi::PointsAdded { user: AAA, amount: U256::from(50) }.encode_log_data());
    processor
        .process_block(&block(header(101, 2, 1), vec![with_logs(tx(0x21, 0, AAA, POINTS, vec![0x01]), vec![added])]))
        .await
        .unwrap();

    let user = store.get_or_create_user(AAA, 0).await.unwrap();
    assert_eq!(user.points, 500);
}

#[tokio::test]
async fn reprocessing_a_block_is_a_no_op() {
    let (_chain, store, processor) = setup();
    seed_dictionary(&store, 42).await;

    let creation = tx(0x11, 0, AAA, BBB, PAYLOAD.as_bytes().to_vec());
    let hash_id = B256::repeat_byte(0x11);
    let transfer = tx(0x21, 1, BBB, CCC, Bytes::copy_from_slice(hash_id.as_slice()));
    let b = block(header(100, 1, 0), vec![creation, transfer]);

    processor.process_block(&b).await.unwrap();
    let events_before = store.events_ordered().await.unwrap();
    let row_before = store.ethscription_by_hash_id(hash_id).await.unwrap().unwrap();

    processor.process_block(&b).await.unwrap();
    assert_eq!(store.events_ordered().await.unwrap(), events_before);
    assert_eq!(
        store.ethscription_by_hash_id(hash_id).await.unwrap().unwrap(),
        row_before
    );
}
