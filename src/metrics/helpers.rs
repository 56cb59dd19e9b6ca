//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    DB_POOL_IDLE, DB_POOL_SIZE, MAIL_ATTEMPTS_TOTAL, MAIL_BACKGROUND_IN_FLIGHT,
    MAIL_BACKGROUND_PANICS_TOTAL, MAIL_DELIVERIES_TOTAL, MAIL_DELIVERY_DURATION,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording mail delivery metrics
pub struct MailMetrics;

impl MailMetrics {
    pub fn record_attempt_success() {
        MAIL_ATTEMPTS_TOTAL.with_label_values(&["success"]).inc();
    }

    pub fn record_attempt_failure() {
        MAIL_ATTEMPTS_TOTAL.with_label_values(&["failure"]).inc();
    }

    pub fn record_attempt_timeout() {
        MAIL_ATTEMPTS_TOTAL.with_label_values(&["timeout"]).inc();
    }

    pub fn record_sent(duration: Duration) {
        MAIL_DELIVERIES_TOTAL.with_label_values(&["sent"]).inc();
        MAIL_DELIVERY_DURATION.observe(duration.as_secs_f64());
    }

    pub fn record_exhausted(duration: Duration) {
        MAIL_DELIVERIES_TOTAL.with_label_values(&["exhausted"]).inc();
        MAIL_DELIVERY_DURATION.observe(duration.as_secs_f64());
    }

    pub fn record_compose_failed() {
        MAIL_DELIVERIES_TOTAL
            .with_label_values(&["compose_failed"])
            .inc();
    }

    pub fn background_started() {
        MAIL_BACKGROUND_IN_FLIGHT.inc();
    }

    pub fn background_finished() {
        MAIL_BACKGROUND_IN_FLIGHT.dec();
    }

    pub fn record_background_panic() {
        MAIL_BACKGROUND_PANICS_TOTAL.inc();
    }
}

/// Helper struct for database pool gauges
pub struct PoolMetrics;

impl PoolMetrics {
    /// Snapshot pool occupancy (call when metrics are scraped)
    pub fn update(size: u32, idle: usize) {
        DB_POOL_SIZE.set(i64::from(size));
        DB_POOL_IDLE.set(idle as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mail_metrics_recorded() {
        let before = MAIL_DELIVERIES_TOTAL.with_label_values(&["sent"]).get();
        MailMetrics::record_sent(Duration::from_millis(10));
        let after = MAIL_DELIVERIES_TOTAL.with_label_values(&["sent"]).get();
        assert!(after > before);
    }

    #[test]
    fn test_encode_metrics_contains_prefix() {
        MailMetrics::record_attempt_failure();
        PoolMetrics::update(3, 1);

        let output = encode_metrics().unwrap();
        assert!(output.contains("greenlight_mail_attempts_total"));
        assert!(output.contains("greenlight_db_pool_size"));
    }
}
