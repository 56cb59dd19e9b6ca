//! Email composition and delivery.
//!
//! - [`MessageComposer`]: template + payload into a [`MessageEnvelope`]
//! - [`Mailer`]: compose, then deliver with bounded fixed-delay retry
//! - [`BackgroundMailer`]: tracked fire-and-forget sends with panic recovery
//! - [`MailTransport`]: the seam between delivery and SMTP

mod background;
mod composer;
mod engine;
mod envelope;
mod retry;
mod transport;

pub use background::{BackgroundError, BackgroundMailer};
pub use composer::{parse_mailbox, ComposeError, MessageComposer};
pub use engine::{DeliveryError, Mailer, MailerSetupError};
pub use envelope::MessageEnvelope;
pub use retry::{
    DeliveryAttemptState, RetryPolicy, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_RETRY_DELAY,
};
pub use transport::{MailTransport, SmtpTransport, TransportError};
