//! Mail transport abstraction and the SMTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use thiserror::Error;

use super::envelope::MessageEnvelope;
use crate::config::SmtpConfig;

/// Port that expects TLS from the first byte instead of STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("SMTP attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to build message: {0}")]
    Message(String),
}

/// One delivery attempt of a composed message.
///
/// Implementations must be safe to share across concurrent sends.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, envelope: &MessageEnvelope) -> Result<(), TransportError>;
}

/// SMTP transport backed by lettre's pooled async client.
///
/// Cloning is cheap and clones share the underlying connection pool.
#[derive(Clone)]
pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, TransportError> {
        let tls_parameters = TlsParameters::new(config.host.clone())
            .map_err(|e| TransportError::Smtp(format!("TLS setup failed: {}", e)))?;

        let tls = if config.port == IMPLICIT_TLS_PORT {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(tls)
            .timeout(Some(config.timeout()));

        if let Some(username) = config.username.as_ref().filter(|u| !u.is_empty()) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                config.password.clone().unwrap_or_default(),
            ));
        }

        tracing::debug!(
            host = %config.host,
            port = config.port,
            "SMTP transport configured"
        );

        Ok(Self {
            inner: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, envelope: &MessageEnvelope) -> Result<(), TransportError> {
        let message = envelope
            .to_message()
            .map_err(|e| TransportError::Message(e.to_string()))?;

        self.inner
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| TransportError::Smtp(e.to_string()))
    }
}
