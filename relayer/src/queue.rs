// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Handoff queue seam
//!
//! Accepted events are handed to an asynchronous downstream processor via
//! a named queue. The broker itself lives outside this crate; callers
//! supply a [`Queue`] implementation wrapping whatever broker the
//! deployment runs. Ownership of a message transfers to the broker on a
//! successful publish.

use crate::events::MessageProcessedEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Errors that can occur while publishing a handoff
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("publish failed: {0}")]
    Publish(String),
}

/// Body enqueued for the downstream message processor.
///
/// `id` joins back to the persisted event record; the event copy lets the
/// processor rebuild the relay transaction without a read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessageProcessedBody {
    pub id: i64,
    pub event: MessageProcessedEvent,
}

/// Queue seam for handoff publication.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Enqueue `payload` on the named queue.
    async fn publish(&self, queue_name: &str, payload: Vec<u8>) -> Result<(), QueueError>;
}

/// In-memory [`Queue`] for local runs and tests.
///
/// Published payloads are buffered per queue name until drained.
#[derive(Default)]
pub struct MemoryQueue {
    buffers: RwLock<HashMap<String, Vec<Vec<u8>>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything buffered for `queue_name`.
    pub async fn drain(&self, queue_name: &str) -> Vec<Vec<u8>> {
        let mut buffers = self.buffers.write().await;
        buffers.remove(queue_name).unwrap_or_default()
    }

    /// Number of payloads currently buffered for `queue_name`.
    pub async fn len(&self, queue_name: &str) -> usize {
        let buffers = self.buffers.read().await;
        buffers.get(queue_name).map(|b| b.len()).unwrap_or(0)
    }

    pub async fn is_empty(&self, queue_name: &str) -> bool {
        self.len(queue_name).await == 0
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    async fn publish(&self, queue_name: &str, payload: Vec<u8>) -> Result<(), QueueError> {
        let mut buffers = self.buffers.write().await;
        buffers
            .entry(queue_name.to_string())
            .or_default()
            .push(payload);

        debug!("[MemoryQueue] Published message on '{}'", queue_name);
        Ok(())
    }
}
