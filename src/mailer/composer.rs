//! Turns a template name and payload into a [`MessageEnvelope`].

use lettre::address::AddressError;
use lettre::message::Mailbox;
use serde::Serialize;
use thiserror::Error;

use super::envelope::{single_line, MessageEnvelope};
use crate::template::{Section, TemplateError, TemplateResolver};

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Invalid {role} address {address:?}: {source}")]
    InvalidAddress {
        role: &'static str,
        address: String,
        #[source]
        source: AddressError,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Parse a mailbox such as `alice@example.com` or `Alice <alice@example.com>`.
pub fn parse_mailbox(role: &'static str, address: &str) -> Result<Mailbox, ComposeError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|source| ComposeError::InvalidAddress {
            role,
            address: address.to_string(),
            source,
        })
}

/// Renders every section of a template into a message envelope.
#[derive(Clone)]
pub struct MessageComposer {
    resolver: TemplateResolver,
}

impl MessageComposer {
    pub fn new(resolver: TemplateResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    /// Compose a message. No network activity happens here, so any error is
    /// permanent and not worth retrying.
    pub fn compose<P>(
        &self,
        recipient: &str,
        sender: &Mailbox,
        template: &str,
        payload: &P,
    ) -> Result<MessageEnvelope, ComposeError>
    where
        P: Serialize + ?Sized,
    {
        let recipient = parse_mailbox("recipient", recipient)?;
        let bundle = self.resolver.resolve(template)?;

        let subject = bundle.render(Section::Subject, payload)?;
        let plain_body = bundle.render(Section::PlainBody, payload)?;
        let html_body = bundle.render(Section::HtmlBody, payload)?;

        Ok(MessageEnvelope {
            recipient,
            sender: sender.clone(),
            subject: single_line(&subject),
            plain_body,
            html_body,
        })
    }
}
