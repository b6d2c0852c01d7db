//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `file_picker_reconciliations_total` - Total number of reconciliations
//! - `file_picker_reconciliation_errors_total` - Reconciliation errors by reason
//! - `file_picker_reconciliation_duration_seconds` - Duration of reconciliation operations
//! - `file_picker_reconciliations_skipped_total` - Reconciliations that were no-ops, by reason
//! - `file_picker_files_selected_total` - Total number of files selected and persisted
//! - `file_picker_listing_requests_total` - Total number of remote listing requests
//! - `file_picker_listing_duration_seconds` - Duration of remote listing requests
//! - `file_picker_listing_errors_total` - Listing errors by kind
//! - `file_picker_requeues_total` - Requeues scheduled by the error policy, by reason

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "file_picker_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "file_picker_reconciliation_errors_total",
            "Total number of reconciliation errors by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "file_picker_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static RECONCILIATIONS_SKIPPED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "file_picker_reconciliations_skipped_total",
            "Total number of reconciliations that made no change, by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create RECONCILIATIONS_SKIPPED_TOTAL metric - this should never happen")
});

static FILES_SELECTED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "file_picker_files_selected_total",
        "Total number of files selected and persisted",
    )
    .expect("Failed to create FILES_SELECTED_TOTAL metric - this should never happen")
});

static LISTING_REQUESTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "file_picker_listing_requests_total",
        "Total number of remote listing requests",
    )
    .expect("Failed to create LISTING_REQUESTS_TOTAL metric - this should never happen")
});

static LISTING_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "file_picker_listing_duration_seconds",
            "Duration of remote listing requests in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 20.0]),
    )
    .expect("Failed to create LISTING_DURATION metric - this should never happen")
});

static LISTING_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "file_picker_listing_errors_total",
            "Total number of remote listing errors by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create LISTING_ERRORS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "file_picker_requeues_total",
            "Total number of requeues scheduled by the error policy, by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

/// Register all metrics with the controller registry
///
/// # Errors
/// Returns an error if a metric is registered twice.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATIONS_SKIPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(FILES_SELECTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(LISTING_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(LISTING_DURATION.clone()))?;
    REGISTRY.register(Box::new(LISTING_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    Ok(())
}

/// Gather all registered metric families
#[must_use]
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(reason: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_reconciliations_skipped(reason: &str) {
    RECONCILIATIONS_SKIPPED_TOTAL
        .with_label_values(&[reason])
        .inc();
}

pub fn increment_files_selected() {
    FILES_SELECTED_TOTAL.inc();
}

pub fn increment_listing_requests() {
    LISTING_REQUESTS_TOTAL.inc();
}

pub fn observe_listing_duration(duration: f64) {
    LISTING_DURATION.observe(duration);
}

pub fn increment_listing_errors(kind: &str) {
    LISTING_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}
