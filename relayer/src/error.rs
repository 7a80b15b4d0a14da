// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::confirmation::ConfirmationError;
use crate::queue::QueueError;
use crate::store::StoreError;
use thiserror::Error;

/// A failure in one step of the event-processing pipeline.
///
/// Validation outcomes are not errors and never appear here; everything
/// past the validation stage is surfaced to the caller unretried. The
/// variant records which step failed so operators can distinguish "never
/// processed" from "processed but not handed off".
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("confirmation wait failed: {0}")]
    Confirmation(#[from] ConfirmationError),

    #[error("event serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("event persistence failed: {0}")]
    Storage(#[from] StoreError),

    /// The record was committed but the handoff was not enqueued; the
    /// record is orphaned until an external sweep reconciles it.
    #[error("handoff publish failed for record {record_id}: {source}")]
    Publish {
        record_id: i64,
        #[source]
        source: QueueError,
    },
}

pub type ProcessResult<T> = Result<T, ProcessError>;

impl ProcessError {
    /// Returns a short string identifying the failed step for metrics labels
    pub fn step(&self) -> &'static str {
        match self {
            ProcessError::Confirmation(_) => "confirmation",
            ProcessError::Serialization(_) => "serialization",
            ProcessError::Storage(_) => "storage",
            ProcessError::Publish { .. } => "publish",
        }
    }

    /// True when a durable record was already committed before the failure.
    pub fn is_post_persist(&self) -> bool {
        matches!(self, ProcessError::Publish { .. })
    }

    /// Id of the record left without a handoff task, if any.
    pub fn orphaned_record_id(&self) -> Option<i64> {
        match self {
            ProcessError::Publish { record_id, .. } => Some(*record_id),
            _ => None,
        }
    }
}
