//! Mail delivery with bounded, fixed-delay retry.

use std::sync::Arc;
use std::time::Instant;

use lettre::message::Mailbox;
use serde::Serialize;
use thiserror::Error;

use super::composer::{parse_mailbox, ComposeError, MessageComposer};
use super::envelope::MessageEnvelope;
use super::retry::{DeliveryAttemptState, RetryPolicy};
use super::transport::{MailTransport, SmtpTransport, TransportError};
use crate::config::Settings;
use crate::metrics::MailMetrics;
use crate::template::TemplateResolver;

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Rendering failed; no transport attempt was made.
    #[error("Failed to compose message: {0}")]
    Compose(#[from] ComposeError),

    /// Every attempt failed. Only the final attempt's error is kept.
    #[error("Delivery failed after {attempts} attempt(s): {last_error}")]
    Exhausted {
        attempts: u32,
        #[source]
        last_error: TransportError,
    },
}

impl DeliveryError {
    pub fn last_transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Exhausted { last_error, .. } => Some(last_error),
            Self::Compose(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum MailerSetupError {
    #[error(transparent)]
    Sender(#[from] ComposeError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Composes and delivers templated email.
///
/// Cloning is cheap; clones share the transport and template source.
#[derive(Clone)]
pub struct Mailer {
    composer: MessageComposer,
    transport: Arc<dyn MailTransport>,
    sender: Mailbox,
    policy: RetryPolicy,
}

impl Mailer {
    pub fn new(composer: MessageComposer, transport: Arc<dyn MailTransport>, sender: Mailbox) -> Self {
        Self {
            composer,
            transport,
            sender,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the production mailer: SMTP transport and embedded templates.
    pub fn from_settings(settings: &Settings) -> Result<Self, MailerSetupError> {
        let sender = parse_mailbox("sender", &settings.smtp.sender)?;
        let transport = SmtpTransport::from_config(&settings.smtp)?;
        let composer = MessageComposer::new(TemplateResolver::embedded());

        Ok(Self::new(composer, Arc::new(transport), sender)
            .with_policy(RetryPolicy::from_config(&settings.delivery, &settings.smtp)))
    }

    pub fn composer(&self) -> &MessageComposer {
        &self.composer
    }

    pub fn sender(&self) -> &Mailbox {
        &self.sender
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Compose `template` for `recipient` and deliver it.
    ///
    /// Returns once the message is accepted by the transport or every attempt
    /// has failed. Composition errors return immediately without any attempt.
    #[tracing::instrument(name = "mailer.send", skip(self, payload))]
    pub async fn send<P>(&self, recipient: &str, template: &str, payload: &P) -> Result<(), DeliveryError>
    where
        P: Serialize + ?Sized,
    {
        let envelope = match self.composer.compose(recipient, &self.sender, template, payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                MailMetrics::record_compose_failed();
                tracing::warn!(error = %e, "Failed to compose message");
                return Err(e.into());
            }
        };

        self.deliver(&envelope).await
    }

    /// Deliver an already composed envelope with bounded retry.
    ///
    /// Attempts run strictly one after another. The delay is applied between
    /// attempts only, never after the final one.
    pub async fn deliver(&self, envelope: &MessageEnvelope) -> Result<(), DeliveryError> {
        let started = Instant::now();
        let mut state = DeliveryAttemptState::new(&self.policy);

        while let Some(attempt) = state.next_attempt() {
            if attempt > 1 {
                tokio::time::sleep(self.policy.delay).await;
            }

            match self.attempt(envelope).await {
                Ok(()) => {
                    MailMetrics::record_attempt_success();
                    MailMetrics::record_sent(started.elapsed());
                    tracing::info!(
                        attempt,
                        recipient = %envelope.recipient.email,
                        "Mail delivered"
                    );
                    return Ok(());
                }
                Err(e) => {
                    if matches!(e, TransportError::Timeout(_)) {
                        MailMetrics::record_attempt_timeout();
                    } else {
                        MailMetrics::record_attempt_failure();
                    }
                    tracing::warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "Mail delivery attempt failed"
                    );
                    state.record_failure(e);
                }
            }
        }

        MailMetrics::record_exhausted(started.elapsed());
        let attempts = state.attempts();
        let last_error = state
            .into_last_error()
            .unwrap_or_else(|| TransportError::Smtp("no delivery attempt was made".to_string()));

        tracing::error!(
            attempts,
            recipient = %envelope.recipient.email,
            error = %last_error,
            "Mail delivery exhausted all attempts"
        );

        Err(DeliveryError::Exhausted {
            attempts,
            last_error,
        })
    }

    async fn attempt(&self, envelope: &MessageEnvelope) -> Result<(), TransportError> {
        let limit = self.policy.attempt_timeout;
        match tokio::time::timeout(limit, self.transport.send(envelope)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(limit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::InMemoryTemplates;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    const NOTE: &str = r#"{% macro subject() %}Note for {{ name }}{% endmacro %}
{% macro plainBody() %}Hello {{ name }}{% endmacro %}
{% macro htmlBody() %}<p>Hello {{ name }}</p>{% endmacro %}
"#;

    /// Fails with the scripted errors in order, then succeeds.
    struct ScriptedTransport {
        failures: Mutex<Vec<TransportError>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn new(mut failures: Vec<TransportError>) -> Self {
            failures.reverse();
            Self {
                failures: Mutex::new(failures),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MailTransport for ScriptedTransport {
        async fn send(&self, _envelope: &MessageEnvelope) -> Result<(), TransportError> {
            self.calls.lock().unwrap().push(Instant::now());
            match self.failures.lock().unwrap().pop() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
    }

    fn mailer(transport: Arc<ScriptedTransport>) -> Mailer {
        let templates = InMemoryTemplates::new().with("note.tmpl", NOTE);
        let composer = MessageComposer::new(TemplateResolver::new(Arc::new(templates)));
        let sender = "no-reply@greenlight.example".parse().unwrap();
        Mailer::new(composer, transport, sender)
            .with_policy(RetryPolicy::new(3, Duration::from_millis(20)))
    }

    fn smtp(msg: &str) -> TransportError {
        TransportError::Smtp(msg.to_string())
    }

    #[tokio::test]
    async fn test_send_succeeds_first_attempt() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        mailer(transport.clone())
            .send("alice@example.com", "note.tmpl", &json!({"name": "Alice"}))
            .await
            .unwrap();
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_send_recovers_on_third_attempt() {
        let transport = Arc::new(ScriptedTransport::new(vec![smtp("a"), smtp("b")]));
        mailer(transport.clone())
            .send("alice@example.com", "note.tmpl", &json!({"name": "Alice"}))
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        for pair in calls.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(20));
        }
    }

    #[tokio::test]
    async fn test_send_exhausted_reports_last_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            smtp("first"),
            smtp("second"),
            smtp("third"),
        ]));
        let err = mailer(transport.clone())
            .send("alice@example.com", "note.tmpl", &json!({"name": "Alice"}))
            .await
            .unwrap_err();

        assert_eq!(transport.calls().len(), 3);
        match err {
            DeliveryError::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, smtp("third"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_compose_failure_makes_no_attempt() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let err = mailer(transport.clone())
            .send("alice@example.com", "missing.tmpl", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Compose(_)));
        assert!(err.last_transport_error().is_none());
        assert!(transport.calls().is_empty());
    }
}
