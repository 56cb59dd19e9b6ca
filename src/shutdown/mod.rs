//! Graceful shutdown for the notification service.
//!
//! Runs after the HTTP server has stopped accepting requests:
//! 1. Signals background tasks to stop
//! 2. Waits for in-flight mail deliveries, bounded by the drain timeout
//! 3. Closes the database pool, exactly once

use std::time::Duration;

use tokio::sync::broadcast;

use crate::mailer::BackgroundMailer;
use crate::postgres::PostgresPool;

/// Configuration for graceful shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time to wait for in-flight deliveries (default: 20 seconds)
    pub drain_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_secs(20),
        }
    }
}

/// Handles graceful shutdown of the notification service
pub struct GracefulShutdown {
    background: BackgroundMailer,
    pool: PostgresPool,
    shutdown_tx: broadcast::Sender<()>,
    config: ShutdownConfig,
}

impl GracefulShutdown {
    pub fn new(
        background: BackgroundMailer,
        pool: PostgresPool,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self::with_config(background, pool, shutdown_tx, ShutdownConfig::default())
    }

    pub fn with_config(
        background: BackgroundMailer,
        pool: PostgresPool,
        shutdown_tx: broadcast::Sender<()>,
        config: ShutdownConfig,
    ) -> Self {
        Self {
            background,
            pool,
            shutdown_tx,
            config,
        }
    }

    /// Execute graceful shutdown sequence
    #[tracing::instrument(
        name = "graceful_shutdown",
        skip(self),
        fields(in_flight = self.background.in_flight())
    )]
    pub async fn execute(self, reason: &str) -> ShutdownResult {
        let start = std::time::Instant::now();
        let mut result = ShutdownResult::default();

        tracing::info!(reason = %reason, "Starting graceful shutdown - Phase 1: Signaling background tasks");
        let _ = self.shutdown_tx.send(());

        tracing::info!("Phase 2: Draining background mail deliveries");
        result.deliveries_drained = self.background.shutdown(self.config.drain_timeout).await;
        result.deliveries_abandoned = self.background.in_flight();

        tracing::info!("Phase 3: Closing database pool");
        if !self.pool.is_closed() {
            self.pool.close().await;
        }
        result.pool_closed = self.pool.is_closed();

        result.duration = start.elapsed();
        result.success = result.deliveries_drained && result.pool_closed;

        tracing::info!(
            deliveries_drained = result.deliveries_drained,
            deliveries_abandoned = result.deliveries_abandoned,
            pool_closed = result.pool_closed,
            duration_ms = result.duration.as_millis(),
            "Graceful shutdown completed"
        );

        result
    }
}

/// Result of a graceful shutdown operation
#[derive(Debug, Default)]
pub struct ShutdownResult {
    /// Whether every phase completed in time
    pub success: bool,
    /// Whether all in-flight deliveries finished before the drain timeout
    pub deliveries_drained: bool,
    /// Deliveries still running when the drain timeout elapsed
    pub deliveries_abandoned: usize,
    /// Whether the database pool is closed
    pub pool_closed: bool,
    /// Total time taken for shutdown
    pub duration: Duration,
}
