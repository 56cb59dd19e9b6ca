//! Fully rendered message, ready for a transport.

use lettre::message::{Mailbox, MultiPart};
use lettre::Message;

/// A composed email with both body alternatives.
///
/// Produced fresh for every send and never shared between sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    pub recipient: Mailbox,
    pub sender: Mailbox,
    /// Always a single line
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
}

impl MessageEnvelope {
    /// Build a `multipart/alternative` message with the plain body as the
    /// primary part and the HTML body as the alternative.
    pub fn to_message(&self) -> Result<Message, lettre::error::Error> {
        Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(self.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                self.plain_body.clone(),
                self.html_body.clone(),
            ))
    }
}

/// Collapse all whitespace runs (including newlines) into single spaces.
pub(crate) fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
