// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::confirmation::{ConfirmationError, ConfirmationResult};
use crate::events::BridgeMessage;
use crate::store::{StoreError, StoreResult};
use relayer_schema::models::BridgeMessageEvent;
use std::time::Duration;
use tokio::sync::Mutex;

// ============================================================================
// Mock collaborators
// ============================================================================

#[derive(Default)]
struct MockStore {
    saved: Mutex<Vec<NewBridgeMessageEvent>>,
    fail: bool,
}

impl MockStore {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    async fn saved_count(&self) -> usize {
        self.saved.lock().await.len()
    }
}

#[async_trait::async_trait]
impl EventStore for MockStore {
    async fn save_event(&self, event: NewBridgeMessageEvent) -> StoreResult<i64> {
        if self.fail {
            return Err(StoreError::Query("insert failed".to_string()));
        }
        let mut saved = self.saved.lock().await;
        saved.push(event);
        Ok(saved.len() as i64)
    }

    async fn find_by_status(&self, _status: EventStatus) -> StoreResult<Vec<BridgeMessageEvent>> {
        Ok(vec![])
    }
}

#[derive(Default)]
struct MockQueue {
    published: Mutex<Vec<(String, Vec<u8>)>>,
    fail: bool,
}

impl MockQueue {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    async fn published_count(&self) -> usize {
        self.published.lock().await.len()
    }
}

#[async_trait::async_trait]
impl Queue for MockQueue {
    async fn publish(&self, queue_name: &str, payload: Vec<u8>) -> Result<(), QueueError> {
        if self.fail {
            return Err(QueueError::Publish("broker down".to_string()));
        }
        self.published
            .lock()
            .await
            .push((queue_name.to_string(), payload));
        Ok(())
    }
}

/// Chain client with a fixed view: the tx (if mined) sits far below the head,
/// so any confirmation requirement is met immediately.
struct ConfirmedClient;

#[async_trait::async_trait]
impl ConfirmationClient for ConfirmedClient {
    async fn tx_block_number(&self, _tx_hash: &str) -> ConfirmationResult<Option<u64>> {
        Ok(Some(100))
    }

    async fn latest_block_number(&self) -> ConfirmationResult<u64> {
        Ok(200)
    }
}

/// Chain client that never sees the transaction mined.
struct NeverMinedClient;

#[async_trait::async_trait]
impl ConfirmationClient for NeverMinedClient {
    async fn tx_block_number(&self, _tx_hash: &str) -> ConfirmationResult<Option<u64>> {
        Ok(None)
    }

    async fn latest_block_number(&self) -> ConfirmationResult<u64> {
        Ok(200)
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn test_config() -> IndexerConfig {
    let mut config = IndexerConfig::new(1, 2);
    config.confirmation_timeout = Duration::from_millis(50);
    config.confirmation_poll_interval = Duration::from_millis(1);
    config
}

fn test_event(dest_chain_id: u64, removed: bool) -> MessageProcessedEvent {
    MessageProcessedEvent {
        message: BridgeMessage {
            dest_chain_id,
            src_owner: "0x00000000000000000000000000000000000000aa".to_string(),
            data: vec![0xde, 0xad, 0xbe, 0xef],
            value: 1_000_000_000_000_000_000,
        },
        tx_hash: "0xabc123".to_string(),
        log_index: 0,
        block_number: 4242,
        removed,
    }
}

struct Harness {
    indexer: Indexer<MockStore, MockQueue, ConfirmedClient>,
    store: Arc<MockStore>,
    queue: Arc<MockQueue>,
}

fn harness(store: MockStore, queue: MockQueue) -> Harness {
    let store = Arc::new(store);
    let queue = Arc::new(queue);
    let indexer = Indexer::new(
        test_config(),
        store.clone(),
        queue.clone(),
        Arc::new(ConfirmedClient),
    )
    .unwrap()
    .with_metrics(Arc::new(IndexerMetrics::new_for_testing()));

    Harness {
        indexer,
        store,
        queue,
    }
}

// ============================================================================
// Skip outcomes: success with no side effects
// ============================================================================

#[tokio::test]
async fn test_wrong_chain_is_noop_success() {
    telemetry_subscribers::init_for_testing();
    let h = harness(MockStore::default(), MockQueue::default());
    let cancel = CancellationToken::new();

    h.indexer
        .handle_message_processed_event(&test_event(5, false), true, WatchMode::Live, &cancel)
        .await
        .unwrap();

    assert_eq!(h.store.saved_count().await, 0);
    assert_eq!(h.queue.published_count().await, 0);
}

#[tokio::test]
async fn test_removed_event_is_noop_success() {
    let h = harness(MockStore::default(), MockQueue::default());
    let cancel = CancellationToken::new();

    h.indexer
        .handle_message_processed_event(&test_event(1, true), true, WatchMode::Live, &cancel)
        .await
        .unwrap();

    assert_eq!(h.store.saved_count().await, 0);
    assert_eq!(h.queue.published_count().await, 0);
}

#[tokio::test]
async fn test_past_block_crawl_is_noop_success() {
    // The identical event is persisted in live mode (covered below); in
    // crawl mode it was already handled in its original live pass.
    let h = harness(MockStore::default(), MockQueue::default());
    let cancel = CancellationToken::new();

    h.indexer
        .handle_message_processed_event(
            &test_event(1, false),
            false,
            WatchMode::CrawlPastBlocks,
            &cancel,
        )
        .await
        .unwrap();

    assert_eq!(h.store.saved_count().await, 0);
    assert_eq!(h.queue.published_count().await, 0);
}

// ============================================================================
// Happy path: persist once, publish once
// ============================================================================

#[tokio::test]
async fn test_live_event_persisted_and_published() {
    telemetry_subscribers::init_for_testing();
    let h = harness(MockStore::default(), MockQueue::default());
    let cancel = CancellationToken::new();
    let event = test_event(1, false);

    h.indexer
        .handle_message_processed_event(&event, true, WatchMode::Live, &cancel)
        .await
        .unwrap();

    assert_eq!(h.store.saved_count().await, 1);
    assert_eq!(h.queue.published_count().await, 1);

    let saved = h.store.saved.lock().await;
    let record = &saved[0];
    assert_eq!(record.status, EventStatus::New);
    assert_eq!(record.event_type, EVENT_KIND_MESSAGE_PROCESSED);
    assert_eq!(record.chain_id, 1);
    assert_eq!(record.msg_hash, MSG_HASH_PLACEHOLDER);
    assert_eq!(record.message_owner, event.message.src_owner);
    assert_eq!(record.message_data, event.message.data);
    assert_eq!(record.message_value, "1000000000000000000");
    assert_eq!(record.block_id, 4242);

    // The raw representation round-trips to the original event.
    let raw: MessageProcessedEvent = serde_json::from_value(record.data.clone()).unwrap();
    assert_eq!(raw, event);
}

#[tokio::test]
async fn test_handoff_references_persisted_record() {
    let h = harness(MockStore::default(), MockQueue::default());
    let cancel = CancellationToken::new();
    let event = test_event(1, false);

    h.indexer
        .handle_message_processed_event(&event, true, WatchMode::Live, &cancel)
        .await
        .unwrap();

    let published = h.queue.published.lock().await;
    let (queue_name, payload) = &published[0];
    assert_eq!(queue_name, "1-2-MessageProcessed-queue");

    let body: QueueMessageProcessedBody = serde_json::from_slice(payload).unwrap();
    assert_eq!(body.id, 1); // id returned by the first save_event call
    assert_eq!(body.event, event);
}

#[tokio::test]
async fn test_confirmation_wait_skipped_when_not_required() {
    // A client that would never confirm must not be consulted when the
    // crawler says confirmation-waiting is not required.
    let store = Arc::new(MockStore::default());
    let queue = Arc::new(MockQueue::default());
    let indexer = Indexer::new(
        test_config(),
        store.clone(),
        queue.clone(),
        Arc::new(NeverMinedClient),
    )
    .unwrap();
    let cancel = CancellationToken::new();

    indexer
        .handle_message_processed_event(&test_event(1, false), false, WatchMode::Live, &cancel)
        .await
        .unwrap();

    assert_eq!(store.saved_count().await, 1);
    assert_eq!(queue.published_count().await, 1);
}

// ============================================================================
// Failure paths
// ============================================================================

#[tokio::test]
async fn test_confirmation_timeout_aborts_before_persist() {
    let store = Arc::new(MockStore::default());
    let queue = Arc::new(MockQueue::default());
    let indexer = Indexer::new(
        test_config(),
        store.clone(),
        queue.clone(),
        Arc::new(NeverMinedClient),
    )
    .unwrap();
    let cancel = CancellationToken::new();

    let err = indexer
        .handle_message_processed_event(&test_event(1, false), true, WatchMode::Live, &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.step(), "confirmation");
    assert!(matches!(
        err,
        ProcessError::Confirmation(ConfirmationError::Timeout(_))
    ));
    assert!(!err.is_post_persist());
    assert_eq!(store.saved_count().await, 0);
    assert_eq!(queue.published_count().await, 0);
}

#[tokio::test]
async fn test_cancellation_aborts_before_persist() {
    let store = Arc::new(MockStore::default());
    let queue = Arc::new(MockQueue::default());
    let indexer = Indexer::new(
        test_config(),
        store.clone(),
        queue.clone(),
        Arc::new(NeverMinedClient),
    )
    .unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = indexer
        .handle_message_processed_event(&test_event(1, false), true, WatchMode::Live, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProcessError::Confirmation(ConfirmationError::Cancelled)
    ));
    assert_eq!(store.saved_count().await, 0);
    assert_eq!(queue.published_count().await, 0);
}

#[tokio::test]
async fn test_storage_failure_surfaces_without_publish() {
    let h = harness(MockStore::failing(), MockQueue::default());
    let cancel = CancellationToken::new();

    let err = h
        .indexer
        .handle_message_processed_event(&test_event(1, false), true, WatchMode::Live, &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.step(), "storage");
    assert!(!err.is_post_persist());
    assert_eq!(h.queue.published_count().await, 0);
}

#[tokio::test]
async fn test_publish_failure_leaves_orphaned_record() {
    telemetry_subscribers::init_for_testing();
    let h = harness(MockStore::default(), MockQueue::failing());
    let cancel = CancellationToken::new();

    let err = h
        .indexer
        .handle_message_processed_event(&test_event(1, false), true, WatchMode::Live, &cancel)
        .await
        .unwrap_err();

    // Post-persist failure is distinguishable and names the orphan.
    assert_eq!(err.step(), "publish");
    assert!(err.is_post_persist());
    assert_eq!(err.orphaned_record_id(), Some(1));

    // The record is not rolled back.
    assert_eq!(h.store.saved_count().await, 1);
}

// ============================================================================
// Queue naming
// ============================================================================

#[tokio::test]
async fn test_queue_name_is_deterministic() {
    let h = harness(MockStore::default(), MockQueue::default());
    assert_eq!(h.indexer.queue_name(), "1-2-MessageProcessed-queue");
    assert_eq!(h.indexer.queue_name(), h.indexer.queue_name());
}

#[tokio::test]
async fn test_invalid_config_rejected_at_construction() {
    let result = Indexer::new(
        IndexerConfig::new(1, 1),
        Arc::new(MockStore::default()),
        Arc::new(MockQueue::default()),
        Arc::new(ConfirmedClient),
    );
    assert!(result.is_err());
}
