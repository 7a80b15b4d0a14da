// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Event types consumed from the chain syncer

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bridge message carried by a MessageProcessed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeMessage {
    /// Chain the message is destined for
    pub dest_chain_id: u64,
    /// Owner address on the source chain (hex)
    pub src_owner: String,
    /// Opaque message payload
    pub data: Vec<u8>,
    /// Value attached to the message (wei-scale)
    pub value: u128,
}

/// A MessageProcessed event as observed on chain.
///
/// Identity is `(tx_hash, log_index)`. Immutable once observed; `removed`
/// is set by the syncer when the emitting block was dropped from the
/// canonical chain after observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageProcessedEvent {
    pub message: BridgeMessage,
    /// Transaction hash the event was emitted from (hex)
    pub tx_hash: String,
    /// Position of the log within the transaction
    pub log_index: u32,
    /// Block the event was emitted in
    pub block_number: u64,
    /// True if the emitting block was excluded from the canonical chain
    pub removed: bool,
}

impl MessageProcessedEvent {
    /// Stable identity for logging and dedup at the storage layer.
    pub fn event_key(&self) -> String {
        format!("{}:{}", self.tx_hash, self.log_index)
    }
}

/// Operating mode of the upstream crawler, supplied per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchMode {
    /// Real-time forward observation of new blocks
    Live,
    /// Retrospective re-scan of a historical block range
    CrawlPastBlocks,
}

impl fmt::Display for WatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchMode::Live => write!(f, "live"),
            WatchMode::CrawlPastBlocks => write!(f, "crawl-past-blocks"),
        }
    }
}
