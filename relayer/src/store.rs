// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Durable event storage
//!
//! Persisting a record is the single authoritative point after which a
//! handoff task is produced. The store does not dedup on its own: the
//! upstream crawler must not double-deliver the same logical event without
//! idempotency handling of its own (the deployment can add a unique
//! constraint over the `(chain_id, block_id)` index if it needs one).

use async_trait::async_trait;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use relayer_pg_db::Db;
use relayer_schema::models::{BridgeMessageEvent, EventStatus, NewBridgeMessageEvent};
use relayer_schema::schema::bridge_message_events;
use thiserror::Error;
use tracing::debug;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing event records
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),
}

/// Storage seam for accepted events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Write a new record and return its generated id.
    async fn save_event(&self, event: NewBridgeMessageEvent) -> StoreResult<i64>;

    /// All records with the given status, oldest first.
    ///
    /// `find_by_status(EventStatus::New)` is the reconciliation hook for
    /// the persist-then-publish gap: a persisted record whose handoff was
    /// never enqueued stays `new` forever, so an external sweep can find
    /// it here and re-check its handoff.
    async fn find_by_status(&self, status: EventStatus) -> StoreResult<Vec<BridgeMessageEvent>>;
}

/// PostgreSQL-backed [`EventStore`].
#[derive(Clone)]
pub struct PgEventStore {
    db: Db,
}

impl PgEventStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn save_event(&self, event: NewBridgeMessageEvent) -> StoreResult<i64> {
        let mut conn = self
            .db
            .connect()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let id: i64 = diesel::insert_into(bridge_message_events::table)
            .values(&event)
            .returning(bridge_message_events::id)
            .get_result(&mut conn)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        debug!(
            "[EventStore] Saved event record id={} chain={} block={}",
            id, event.chain_id, event.block_id
        );

        Ok(id)
    }

    async fn find_by_status(&self, status: EventStatus) -> StoreResult<Vec<BridgeMessageEvent>> {
        use relayer_schema::schema::bridge_message_events::dsl;

        let mut conn = self
            .db
            .connect()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        dsl::bridge_message_events
            .filter(dsl::status.eq(status))
            .order(dsl::id.asc())
            .select(BridgeMessageEvent::as_select())
            .load(&mut conn)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }
}
