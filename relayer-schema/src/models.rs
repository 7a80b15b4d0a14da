// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Row models for the `bridge_message_events` table

use crate::schema::bridge_message_events;
use chrono::NaiveDateTime;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Numeric kind code for MessageProcessed events.
pub const EVENT_KIND_MESSAGE_PROCESSED: i32 = 1;

/// Placeholder written to `msg_hash` at index time. The downstream
/// processor fills in the real message hash when it executes the relay.
pub const MSG_HASH_PLACEHOLDER: &str = "0x";

/// Lifecycle status of a persisted event record.
///
/// This indexer only ever writes `New`; the downstream processor moves
/// records to `Done` or `Failed`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow, Serialize, Deserialize,
)]
#[diesel(sql_type = Text)]
pub enum EventStatus {
    New,
    Done,
    Failed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::New => "new",
            EventStatus::Done => "done",
            EventStatus::Failed => "failed",
        }
    }

    /// Parse EventStatus from string
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(EventStatus::New),
            "done" => Some(EventStatus::Done),
            "failed" => Some(EventStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql<Text, Pg> for EventStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for EventStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let s = std::str::from_utf8(bytes.as_bytes())?;
        Self::parse_str(s).ok_or_else(|| format!("Unknown event status: {}", s).into())
    }
}

/// Insertable record for an accepted MessageProcessed event.
///
/// `id` and `emitted_at` are generated by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bridge_message_events)]
pub struct NewBridgeMessageEvent {
    /// Full serialized source event (raw representation)
    pub data: serde_json::Value,
    pub status: EventStatus,
    /// Numeric event kind code (see [`EVENT_KIND_MESSAGE_PROCESSED`])
    pub event_type: i32,
    /// Chain this indexer serves
    pub chain_id: i64,
    pub msg_hash: String,
    /// Message owner address (hex)
    pub message_owner: String,
    /// Opaque message payload bytes
    pub message_data: Vec<u8>,
    /// Message value as a decimal string (wei-scale values overflow i64)
    pub message_value: String,
    /// Block the event was emitted in
    pub block_id: i64,
}

/// A persisted MessageProcessed event row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bridge_message_events)]
#[diesel(check_for_backend(Pg))]
pub struct BridgeMessageEvent {
    pub id: i64,
    pub data: serde_json::Value,
    pub status: EventStatus,
    pub event_type: i32,
    pub chain_id: i64,
    pub msg_hash: String,
    pub message_owner: String,
    pub message_data: Vec<u8>,
    pub message_value: String,
    pub block_id: i64,
    pub emitted_at: NaiveDateTime,
}
