//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use greenlight_notify::mailer::{
    MailTransport, Mailer, MessageComposer, MessageEnvelope, RetryPolicy, TransportError,
};
use greenlight_notify::template::{InMemoryTemplates, TemplateResolver};

pub const WELCOME: &str = r#"{% macro subject() %}Welcome, {{ name }}!{% endmacro %}
{% macro plainBody() %}Hi {{ name }}, your user ID is {{ user_id }}.{% endmacro %}
{% macro htmlBody() %}{% autoescape "html" %}<p>Hi {{ name }}, your user ID is {{ user_id }}.</p>{% endautoescape %}{% endmacro %}
"#;

/// HTML section needs `token`; the other sections do not.
pub const HTML_NEEDS_TOKEN: &str = r#"{% macro subject() %}Hello {{ name }}{% endmacro %}
{% macro plainBody() %}Hello {{ name }}{% endmacro %}
{% macro htmlBody() %}<p>{{ token }}</p>{% endmacro %}
"#;

pub const SENDER: &str = "Greenlight <no-reply@greenlight.example>";

pub fn templates() -> InMemoryTemplates {
    InMemoryTemplates::new()
        .with("welcome.tmpl", WELCOME)
        .with("html_needs_token.tmpl", HTML_NEEDS_TOKEN)
}

pub fn composer() -> MessageComposer {
    MessageComposer::new(TemplateResolver::new(Arc::new(templates())))
}

/// Recorded transport call
#[derive(Debug, Clone)]
pub struct Call {
    pub at: Instant,
    pub envelope: MessageEnvelope,
}

/// Transport that replays scripted outcomes, then succeeds.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<(), TransportError>>>,
    calls: Mutex<Vec<Call>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn script(outcomes: Vec<Result<(), TransportError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            ..Self::default()
        }
    }

    pub fn always_failing(times: usize) -> Self {
        Self::script(
            (1..=times)
                .map(|n| Err(TransportError::Smtp(format!("failure #{}", n))))
                .collect(),
        )
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for ScriptedTransport {
    async fn send(&self, envelope: &MessageEnvelope) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(Call {
            at: Instant::now(),
            envelope: envelope.clone(),
        });
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

pub fn mailer(transport: Arc<ScriptedTransport>, policy: RetryPolicy) -> Mailer {
    Mailer::new(composer(), transport, SENDER.parse().unwrap()).with_policy(policy)
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(10))
}
