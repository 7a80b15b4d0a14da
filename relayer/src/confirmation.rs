// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Confirmation-depth waiting
//!
//! Live-watch events are acted on only once their transaction has a target
//! number of blocks built on top of it, so that a shallow reorg cannot
//! retract an event this indexer has already handed off. The wait is
//! deadline-bound and cancellable; past-block crawls never need it because
//! historical blocks are already final.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Result type for confirmation waiting
pub type ConfirmationResult<T> = Result<T, ConfirmationError>;

/// Errors that can occur while waiting for confirmations
#[derive(Debug, Error)]
pub enum ConfirmationError {
    #[error("timed out after {0:?} waiting for confirmations")]
    Timeout(Duration),

    #[error("confirmation wait cancelled")]
    Cancelled,

    #[error("RPC error: {0}")]
    Rpc(String),
}

/// Chain access needed to observe confirmation depth.
///
/// Implementors wrap the chain client of whichever chain this indexer
/// watches. The trait is deliberately narrow: the crawling layer owns the
/// full client.
#[async_trait]
pub trait ConfirmationClient: Send + Sync {
    /// Block number the transaction was included in, or `None` while the
    /// transaction is not yet mined (or was dropped from the chain).
    async fn tx_block_number(&self, tx_hash: &str) -> ConfirmationResult<Option<u64>>;

    /// Latest block number on the chain
    async fn latest_block_number(&self) -> ConfirmationResult<u64>;
}

/// Block until `tx_hash` has at least `required` blocks built on top of its
/// inclusion block, polling every `poll_interval`.
///
/// Fails with [`ConfirmationError::Timeout`] once `timeout` elapses and with
/// [`ConfirmationError::Cancelled`] as soon as `cancel` fires; RPC failures
/// propagate immediately. The caller abandons the event on any failure and
/// relies on the upstream crawler to re-deliver it.
pub async fn wait_for_confirmations<C: ConfirmationClient + ?Sized>(
    client: &C,
    required: u64,
    tx_hash: &str,
    timeout: Duration,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> ConfirmationResult<()> {
    let deadline = time::sleep(timeout);
    tokio::pin!(deadline);

    let mut interval = time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("[Confirmation] Wait cancelled for tx {}", tx_hash);
                return Err(ConfirmationError::Cancelled);
            }
            _ = &mut deadline => {
                info!("[Confirmation] Wait timed out for tx {}", tx_hash);
                return Err(ConfirmationError::Timeout(timeout));
            }
            _ = interval.tick() => {
                let Some(tx_block) = client.tx_block_number(tx_hash).await? else {
                    debug!("[Confirmation] tx {} not yet mined", tx_hash);
                    continue;
                };

                let latest = client.latest_block_number().await?;
                let depth = latest.saturating_sub(tx_block);

                if depth >= required {
                    debug!(
                        "[Confirmation] tx {} confirmed: depth={} required={}",
                        tx_hash, depth, required
                    );
                    return Ok(());
                }

                debug!(
                    "[Confirmation] tx {} waiting: depth={} required={}",
                    tx_hash, depth, required
                );
            }
        }
    }
}
