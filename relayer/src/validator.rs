// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pure classification of incoming MessageProcessed events.
//!
//! The same event stream may be observed by indexers tracking different
//! chains; only the indexer whose chain the message is destined for acts
//! on it. Reorged-out events and events re-seen during a past-block crawl
//! are suppressed here, before any I/O happens.

use crate::events::{MessageProcessedEvent, WatchMode};

/// Outcome of validating an event against this indexer's chain and the
/// crawler's current mode. Non-`Accept` outcomes are successful no-ops,
/// never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Proceed to confirmation-waiting and persistence
    Accept,
    /// Message is destined for a different chain
    SkipWrongChain,
    /// Emitting block was dropped from the canonical chain
    SkipRemoved,
    /// Re-seen during a past-block crawl; already handled in its live pass
    SkipAlreadyHandled,
}

impl ValidationOutcome {
    pub fn is_accept(&self) -> bool {
        matches!(self, ValidationOutcome::Accept)
    }

    /// Returns a short string identifying the outcome for metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationOutcome::Accept => "accept",
            ValidationOutcome::SkipWrongChain => "skip_wrong_chain",
            ValidationOutcome::SkipRemoved => "skip_removed",
            ValidationOutcome::SkipAlreadyHandled => "skip_already_handled",
        }
    }
}

/// Classify an event. Check order matters: chain match is the cheapest and
/// most authoritative filter, then the reorg flag, then mode suppression.
pub fn validate(
    event: &MessageProcessedEvent,
    src_chain_id: u64,
    watch_mode: WatchMode,
) -> ValidationOutcome {
    if event.message.dest_chain_id != src_chain_id {
        return ValidationOutcome::SkipWrongChain;
    }

    if event.removed {
        return ValidationOutcome::SkipRemoved;
    }

    // Past-block crawling re-scans historical ranges for recovery. An event
    // found there was already fully handled in its original live pass.
    if watch_mode == WatchMode::CrawlPastBlocks {
        return ValidationOutcome::SkipAlreadyHandled;
    }

    ValidationOutcome::Accept
}
