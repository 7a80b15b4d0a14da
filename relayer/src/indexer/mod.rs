// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! MessageProcessed event pipeline
//!
//! One logical task per incoming event, many events in flight at once:
//!
//! ```text
//! ChainSyncer
//!      │
//!      ▼ (MessageProcessedEvent)
//! Indexer::handle_message_processed_event()
//!      │
//!      ├─► validate ──────────► skip (wrong chain / removed / re-crawl)
//!      │
//!      ├─► wait for confirmations (live watch only)
//!      │
//!      ├─► EventStore::save_event ──► record id
//!      │
//!      └─► Queue::publish({id, event})
//! ```
//!
//! The persist and publish steps are two independent commits with no
//! transaction spanning both. A crash or publish failure between them
//! leaves a committed record with no handoff task; such orphans stay in
//! status `new` and are found via `EventStore::find_by_status` by an
//! external sweep. Nothing here retries: failed events are re-delivered
//! by the upstream crawler.

use crate::config::IndexerConfig;
use crate::confirmation::{wait_for_confirmations, ConfirmationClient};
use crate::error::{ProcessError, ProcessResult};
use crate::events::{MessageProcessedEvent, WatchMode};
use crate::metrics::IndexerMetrics;
use crate::queue::{Queue, QueueError, QueueMessageProcessedBody};
use crate::store::EventStore;
use crate::validator::{validate, ValidationOutcome};
use relayer_schema::models::{
    EventStatus, NewBridgeMessageEvent, EVENT_KIND_MESSAGE_PROCESSED, MSG_HASH_PLACEHOLDER,
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Event name component of the handoff queue name.
const EVENT_NAME_MESSAGE_PROCESSED: &str = "MessageProcessed";

/// Confirmation-and-handoff pipeline for one indexed chain.
///
/// Holds the immutable chain identity plus the store, queue and chain
/// client seams. Cheap to share behind an `Arc`; every event is handled by
/// an independent call.
pub struct Indexer<S, Q, C> {
    config: IndexerConfig,
    store: Arc<S>,
    queue: Arc<Q>,
    confirmation_client: Arc<C>,
    metrics: Option<Arc<IndexerMetrics>>,
}

impl<S, Q, C> Indexer<S, Q, C>
where
    S: EventStore,
    Q: Queue,
    C: ConfirmationClient,
{
    pub fn new(
        config: IndexerConfig,
        store: Arc<S>,
        queue: Arc<Q>,
        confirmation_client: Arc<C>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            queue,
            confirmation_client,
            metrics: None,
        })
    }

    /// Attach metrics for monitoring
    pub fn with_metrics(mut self, metrics: Arc<IndexerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Name of the handoff queue, stable per indexer so downstream workers
    /// can be partitioned by chain.
    pub fn queue_name(&self) -> String {
        format!(
            "{}-{}-{}-queue",
            self.config.src_chain_id, self.config.dest_chain_id, EVENT_NAME_MESSAGE_PROCESSED
        )
    }

    /// Handle an individual MessageProcessed event.
    ///
    /// Terminal on the first of: a skip outcome (success, no side effects),
    /// a committed handoff (success), or any step failure (surfaced
    /// unretried). `wait_confirmations` is supplied by the crawler; it is
    /// never set for past-block crawls since historical blocks are final.
    pub async fn handle_message_processed_event(
        &self,
        event: &MessageProcessedEvent,
        wait_confirmations: bool,
        watch_mode: WatchMode,
        cancel: &CancellationToken,
    ) -> ProcessResult<()> {
        info!(
            "[Indexer] MessageProcessed event found: tx={}",
            event.tx_hash
        );

        if let Some(m) = &self.metrics {
            m.events_received.inc();
        }

        let result = self
            .process(event, wait_confirmations, watch_mode, cancel)
            .await;

        if let Err(e) = &result {
            if let Some(m) = &self.metrics {
                m.err_pipeline.with_label_values(&[e.step()]).inc();
            }
            if let Some(record_id) = e.orphaned_record_id() {
                if let Some(m) = &self.metrics {
                    m.orphaned_records.inc();
                }
                // Post-persist failure: the record exists but no handoff was
                // enqueued. Logged distinctly so operators can tell this
                // apart from an event that was never processed.
                error!(
                    "[Indexer] Handoff publish failed AFTER persist, record {} orphaned: tx={} err={}",
                    record_id, event.tx_hash, e
                );
            } else {
                warn!(
                    "[Indexer] Event processing failed at step '{}': tx={} err={}",
                    e.step(),
                    event.tx_hash,
                    e
                );
            }
        }

        result
    }

    async fn process(
        &self,
        event: &MessageProcessedEvent,
        wait_confirmations: bool,
        watch_mode: WatchMode,
        cancel: &CancellationToken,
    ) -> ProcessResult<()> {
        let outcome = validate(event, self.config.src_chain_id, watch_mode);

        if let Some(m) = &self.metrics {
            m.events_by_outcome
                .with_label_values(&[outcome.as_str()])
                .inc();
        }

        match outcome {
            ValidationOutcome::Accept => {}
            ValidationOutcome::SkipWrongChain => {
                info!(
                    "[Indexer] Skipping event, wrong chainID: messageDestChainID={} indexerSrcChainID={}",
                    event.message.dest_chain_id, self.config.src_chain_id
                );
                return Ok(());
            }
            ValidationOutcome::SkipRemoved => {
                info!("[Indexer] Event is removed: tx={}", event.tx_hash);
                return Ok(());
            }
            ValidationOutcome::SkipAlreadyHandled => {
                // Past-block crawl re-scan; this message was already handled
                // in its original live pass.
                info!(
                    "[Indexer] Skipping event, already handled: tx={}",
                    event.tx_hash
                );
                return Ok(());
            }
        }

        if wait_confirmations {
            let started = Instant::now();
            wait_for_confirmations(
                self.confirmation_client.as_ref(),
                self.config.confirmations,
                &event.tx_hash,
                self.config.confirmation_timeout,
                self.config.confirmation_poll_interval,
                cancel,
            )
            .await?;

            if let Some(m) = &self.metrics {
                m.confirmation_wait_latency
                    .observe(started.elapsed().as_secs_f64());
            }
        }

        let raw = serde_json::to_value(event).map_err(ProcessError::Serialization)?;

        let record = NewBridgeMessageEvent {
            data: raw,
            status: EventStatus::New,
            event_type: EVENT_KIND_MESSAGE_PROCESSED,
            chain_id: self.config.src_chain_id as i64,
            msg_hash: MSG_HASH_PLACEHOLDER.to_string(),
            message_owner: event.message.src_owner.clone(),
            message_data: event.message.data.clone(),
            message_value: event.message.value.to_string(),
            block_id: event.block_number as i64,
        };

        let id = self.store.save_event(record).await?;

        if let Some(m) = &self.metrics {
            m.events_persisted.inc();
        }

        let body = QueueMessageProcessedBody {
            id,
            event: event.clone(),
        };
        let payload = serde_json::to_vec(&body).map_err(|e| ProcessError::Publish {
            record_id: id,
            source: QueueError::Serialization(e.to_string()),
        })?;

        self.queue
            .publish(&self.queue_name(), payload)
            .await
            .map_err(|e| ProcessError::Publish {
                record_id: id,
                source: e,
            })?;

        if let Some(m) = &self.metrics {
            m.handoffs_published.inc();
        }

        info!(
            "[Indexer] Event persisted and handed off: tx={} record={}",
            event.tx_hash, id
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests;
