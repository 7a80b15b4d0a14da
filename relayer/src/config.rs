// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Indexer pipeline configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the MessageProcessed event pipeline.
///
/// Chain ids are fixed at startup for the process lifetime; the rest are
/// tunables for the confirmation wait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Chain this indexer serves; only messages destined here are handled
    pub src_chain_id: u64,

    /// Counterpart chain, used to derive the handoff queue name
    pub dest_chain_id: u64,

    /// Blocks that must be built on top of an event's transaction before
    /// it is acted on
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,

    /// Upper bound on a single confirmation wait
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout: Duration,

    /// Interval between confirmation-depth queries
    #[serde(default = "default_confirmation_poll_interval")]
    pub confirmation_poll_interval: Duration,
}

fn default_confirmations() -> u64 {
    3
}

fn default_confirmation_timeout() -> Duration {
    Duration::from_secs(180)
}

fn default_confirmation_poll_interval() -> Duration {
    Duration::from_secs(5)
}

impl IndexerConfig {
    pub fn new(src_chain_id: u64, dest_chain_id: u64) -> Self {
        Self {
            src_chain_id,
            dest_chain_id,
            confirmations: default_confirmations(),
            confirmation_timeout: default_confirmation_timeout(),
            confirmation_poll_interval: default_confirmation_poll_interval(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.src_chain_id == self.dest_chain_id {
            anyhow::bail!(
                "src and dest chain ids must differ, got {}",
                self.src_chain_id
            );
        }
        if self.confirmation_poll_interval >= self.confirmation_timeout {
            anyhow::bail!(
                "confirmation poll interval {:?} must be shorter than timeout {:?}",
                self.confirmation_poll_interval,
                self.confirmation_timeout
            );
        }
        Ok(())
    }
}
