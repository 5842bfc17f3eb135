//! # Metrics
//!
//! Counters for reconciliation passes, requeues, external mutations and AWS calls.

use anyhow::Result;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;

/// Global Prometheus metrics registry
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "provider_aws_reconciliations_total",
            "Total number of reconciliation passes",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "provider_aws_reconciliation_errors_total",
            "Total number of failed reconciliation passes",
        ),
        &["kind", "class"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "provider_aws_reconciliation_duration_seconds",
            "Duration of reconciliation passes in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "provider_aws_requeues_total",
            "Total number of requeues by reason",
        ),
        &["kind", "reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static EXTERNAL_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "provider_aws_external_operations_total",
            "Total number of create, update and delete calls against external resources",
        ),
        &["kind", "operation"],
    )
    .expect("Failed to create EXTERNAL_OPERATIONS_TOTAL metric - this should never happen")
});

static AWS_CALLS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "provider_aws_api_calls_total",
            "Total number of AWS API calls by operation and outcome",
        ),
        &["service", "operation", "outcome"],
    )
    .expect("Failed to create AWS_CALLS_TOTAL metric - this should never happen")
});

/// Register all metrics with the Prometheus registry
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(EXTERNAL_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(AWS_CALLS_TOTAL.clone()))?;
    Ok(())
}

/// Render the registry in the Prometheus text format
pub fn gather() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(kind: &str, transient: bool) {
    let class = if transient { "transient" } else { "permanent" };
    RECONCILIATION_ERRORS_TOTAL
        .with_label_values(&[kind, class])
        .inc();
}

pub fn observe_reconciliation_duration(kind: &str, seconds: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[kind])
        .observe(seconds);
}

pub fn increment_requeues(kind: &str, reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[kind, reason]).inc();
}

pub fn record_external_operation(kind: &str, operation: &str) {
    EXTERNAL_OPERATIONS_TOTAL
        .with_label_values(&[kind, operation])
        .inc();
}

pub fn record_aws_call(service: &str, operation: &str, outcome: &str) {
    AWS_CALLS_TOTAL
        .with_label_values(&[service, operation, outcome])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_per_label() {
        let before = AWS_CALLS_TOTAL
            .with_label_values(&["elasticache", "DescribeReplicationGroups", "success"])
            .get();
        record_aws_call("elasticache", "DescribeReplicationGroups", "success");
        let after = AWS_CALLS_TOTAL
            .with_label_values(&["elasticache", "DescribeReplicationGroups", "success"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn requeue_reasons_are_labelled() {
        increment_requeues("ReplicationGroup", "short-wait");
        assert!(
            REQUEUES_TOTAL
                .with_label_values(&["ReplicationGroup", "short-wait"])
                .get()
                >= 1
        );
    }
}
