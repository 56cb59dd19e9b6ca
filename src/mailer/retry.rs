//! Bounded retry policy and per-send attempt bookkeeping.

use std::time::Duration;

use super::transport::TransportError;
use crate::config::{DeliveryConfig, SmtpConfig};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed-delay retry: `max_attempts` tries, `delay` between consecutive tries,
/// each try bounded by `attempt_timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            ..Self::default()
        }
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn from_config(delivery: &DeliveryConfig, smtp: &SmtpConfig) -> Self {
        Self::new(delivery.max_attempts, delivery.retry_delay()).with_attempt_timeout(smtp.timeout())
    }
}

/// Attempt counter and most recent failure for one logical send.
///
/// Earlier failures are overwritten: only the last one is reported.
#[derive(Debug)]
pub struct DeliveryAttemptState {
    attempt: u32,
    max_attempts: u32,
    last_error: Option<TransportError>,
}

impl DeliveryAttemptState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 0,
            max_attempts: policy.max_attempts.max(1),
            last_error: None,
        }
    }

    /// Start the next attempt, returning its 1-based number, or `None` once
    /// the budget is spent.
    pub fn next_attempt(&mut self) -> Option<u32> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        self.attempt += 1;
        Some(self.attempt)
    }

    pub fn record_failure(&mut self, error: TransportError) {
        self.last_error = Some(error);
    }

    /// Attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn last_error(&self) -> Option<&TransportError> {
        self.last_error.as_ref()
    }

    pub fn into_last_error(self) -> Option<TransportError> {
        self.last_error
    }
}
