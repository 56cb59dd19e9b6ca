//! Prometheus metrics for mail delivery.
//!
//! - Attempt and delivery outcome counters
//! - Delivery latency (compose through final attempt)
//! - Background task and database pool gauges

mod helpers;

pub use helpers::{encode_metrics, MailMetrics, PoolMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "greenlight";

lazy_static! {
    // ============================================================================
    // Mail Metrics
    // ============================================================================

    /// Individual transport attempts by outcome (success, failure, timeout)
    pub static ref MAIL_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_mail_attempts_total", METRIC_PREFIX),
        "Total SMTP delivery attempts",
        &["outcome"]
    ).unwrap();

    /// Logical sends by final outcome (sent, exhausted, compose_failed)
    pub static ref MAIL_DELIVERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_mail_deliveries_total", METRIC_PREFIX),
        "Total mail deliveries by final outcome",
        &["outcome"]
    ).unwrap();

    /// Time from first attempt to final outcome
    pub static ref MAIL_DELIVERY_DURATION: Histogram = register_histogram!(
        format!("{}_mail_delivery_duration_seconds", METRIC_PREFIX),
        "Mail delivery duration in seconds, including retries",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0]
    ).unwrap();

    /// Background sends currently running
    pub static ref MAIL_BACKGROUND_IN_FLIGHT: IntGauge = register_int_gauge!(
        format!("{}_mail_background_in_flight", METRIC_PREFIX),
        "Background mail deliveries currently in flight"
    ).unwrap();

    /// Background sends that panicked
    pub static ref MAIL_BACKGROUND_PANICS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_mail_background_panics_total", METRIC_PREFIX),
        "Total background mail deliveries that panicked"
    ).unwrap();

    // ============================================================================
    // Database Pool Metrics
    // ============================================================================

    /// Open connections in the pool
    pub static ref DB_POOL_SIZE: IntGauge = register_int_gauge!(
        format!("{}_db_pool_size", METRIC_PREFIX),
        "Open connections in the database pool"
    ).unwrap();

    /// Idle connections in the pool
    pub static ref DB_POOL_IDLE: IntGauge = register_int_gauge!(
        format!("{}_db_pool_idle", METRIC_PREFIX),
        "Idle connections in the database pool"
    ).unwrap();
}
