//! Recommendation Metrics
//!
//! Prometheus metrics for the recommendation pipeline

use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};
use std::time::Duration;

static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "recipe_recommendation_requests_total",
        "Total recommendation requests by result path (personalized/fallback/empty)",
        &["path"]
    )
    .expect("Failed to register recommendation requests metric")
});

static SOURCE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "recipe_recommendation_source_failures_total",
        "Store reads that failed or timed out and were degraded to empty",
        &["source"]
    )
    .expect("Failed to register recommendation source failures metric")
});

static DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "recipe_recommendation_duration_seconds",
        "End-to-end recommendation latency",
        &["path"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register recommendation duration metric")
});

static CANDIDATES: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "recipe_recommendation_candidates",
        "Number of recipes scored per signal",
        &["signal"],
        vec![0.0, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]
    )
    .expect("Failed to register recommendation candidates metric")
});

/// Record which path served a request
pub fn record_request(path: &str) {
    REQUESTS_TOTAL.with_label_values(&[path]).inc();
}

/// Record a degraded store read
pub fn record_source_failure(source: &str) {
    SOURCE_FAILURES_TOTAL.with_label_values(&[source]).inc();
}

pub fn record_duration(path: &str, duration: Duration) {
    DURATION_SECONDS
        .with_label_values(&[path])
        .observe(duration.as_secs_f64());
}

/// Record how many candidates a signal (content/collaborative/fused) produced
pub fn record_candidates(signal: &str, count: usize) {
    CANDIDATES.with_label_values(&[signal]).observe(count as f64);
}
