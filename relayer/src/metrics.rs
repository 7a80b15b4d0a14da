// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Histogram, IntCounter, IntCounterVec, Registry,
};

const CONFIRMATION_WAIT_SEC_BUCKETS: &[f64] = &[
    0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10., 15., 30., 60., 90., 120., 180., 240., 300.,
];

#[derive(Clone, Debug)]
pub struct IndexerMetrics {
    /// MessageProcessed events seen, before validation
    pub(crate) events_received: IntCounter,
    /// Validation outcomes by label (accept / skip_*)
    pub(crate) events_by_outcome: IntCounterVec,
    pub(crate) events_persisted: IntCounter,
    pub(crate) handoffs_published: IntCounter,
    /// Pipeline failures by step label
    pub(crate) err_pipeline: IntCounterVec,
    /// Records committed whose handoff publish failed (orphans)
    pub(crate) orphaned_records: IntCounter,
    pub(crate) confirmation_wait_latency: Histogram,
}

impl IndexerMetrics {
    pub fn new(registry: &Registry) -> Self {
        Self {
            events_received: register_int_counter_with_registry!(
                "relayer_indexer_events_received",
                "Total number of MessageProcessed events received from the syncer",
                registry,
            )
            .unwrap(),
            events_by_outcome: register_int_counter_vec_with_registry!(
                "relayer_indexer_events_by_outcome",
                "Validation outcomes of received events",
                &["outcome"],
                registry,
            )
            .unwrap(),
            events_persisted: register_int_counter_with_registry!(
                "relayer_indexer_events_persisted",
                "Total number of event records committed to the store",
                registry,
            )
            .unwrap(),
            handoffs_published: register_int_counter_with_registry!(
                "relayer_indexer_handoffs_published",
                "Total number of handoff tasks enqueued for the processor",
                registry,
            )
            .unwrap(),
            err_pipeline: register_int_counter_vec_with_registry!(
                "relayer_indexer_err_pipeline",
                "Pipeline failures by step",
                &["step"],
                registry,
            )
            .unwrap(),
            orphaned_records: register_int_counter_with_registry!(
                "relayer_indexer_orphaned_records",
                "Records committed without a corresponding handoff task",
                registry,
            )
            .unwrap(),
            confirmation_wait_latency: register_histogram_with_registry!(
                "relayer_indexer_confirmation_wait_latency",
                "Time spent waiting for confirmation depth, in seconds",
                CONFIRMATION_WAIT_SEC_BUCKETS.to_vec(),
                registry,
            )
            .unwrap(),
        }
    }

    pub fn new_for_testing() -> Self {
        Self::new(&Registry::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_cleanly() {
        let registry = Registry::new();
        let metrics = IndexerMetrics::new(&registry);

        metrics.events_received.inc();
        metrics.events_by_outcome.with_label_values(&["accept"]).inc();
        metrics.err_pipeline.with_label_values(&["publish"]).inc();
        metrics.confirmation_wait_latency.observe(1.5);

        assert_eq!(metrics.events_received.get(), 1);
        assert!(!registry.gather().is_empty());
    }

    #[test]
    fn test_duplicate_registration_panics() {
        // Metric names are registered once per registry; constructing twice
        // against the same registry is a programmer error.
        let registry = Registry::new();
        let _metrics = IndexerMetrics::new(&registry);
        let result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                IndexerMetrics::new(&registry)
            }));
        assert!(result.is_err());
    }
}
