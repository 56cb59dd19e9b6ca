//! Fire-and-forget delivery on tracked background tasks.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;
use tokio_util::task::TaskTracker;
use tracing::Instrument;
use uuid::Uuid;

use super::engine::Mailer;
use crate::metrics::MailMetrics;

#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("Mailer is shutting down")]
    ShuttingDown,
}

/// Runs [`Mailer::send`] on background tasks so request handlers can return
/// before delivery finishes.
///
/// A panic inside a delivery is caught and logged; it never takes the
/// process down. [`BackgroundMailer::shutdown`] waits for in-flight sends.
#[derive(Clone)]
pub struct BackgroundMailer {
    mailer: Mailer,
    tracker: TaskTracker,
}

impl BackgroundMailer {
    pub fn new(mailer: Mailer) -> Self {
        Self {
            mailer,
            tracker: TaskTracker::new(),
        }
    }

    pub fn mailer(&self) -> &Mailer {
        &self.mailer
    }

    /// Number of deliveries still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Queue a delivery and return its id immediately.
    pub fn spawn_send(
        &self,
        recipient: String,
        template: String,
        payload: serde_json::Value,
    ) -> Result<Uuid, BackgroundError> {
        if self.tracker.is_closed() {
            return Err(BackgroundError::ShuttingDown);
        }

        let delivery_id = Uuid::new_v4();
        let mailer = self.mailer.clone();
        let span = tracing::info_span!("mailer.background", %delivery_id);

        MailMetrics::background_started();
        self.tracker.spawn(
            async move {
                let outcome = AssertUnwindSafe(mailer.send(&recipient, &template, &payload))
                    .catch_unwind()
                    .await;

                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::error!(error = %e, "Background mail delivery failed");
                    }
                    Err(panic) => {
                        MailMetrics::record_background_panic();
                        tracing::error!(
                            panic = %panic_message(panic.as_ref()),
                            "Background mail delivery panicked"
                        );
                    }
                }
                MailMetrics::background_finished();
            }
            .instrument(span),
        );

        Ok(delivery_id)
    }

    /// Stop accepting work and wait up to `timeout` for in-flight deliveries.
    ///
    /// Returns `true` if every delivery finished in time.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        tracing::info!(in_flight = self.tracker.len(), "Draining background mail deliveries");

        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => {
                tracing::info!("Background mail deliveries drained");
                true
            }
            Err(_) => {
                tracing::warn!(
                    remaining = self.tracker.len(),
                    "Timed out waiting for background mail deliveries"
                );
                false
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(boxed.as_ref()), "kaboom");

        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
