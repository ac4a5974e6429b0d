use crate::domain::mail::{
    errors::TransportError,
    models::{address::Mailbox, message::MailMessage},
    ports::Transport,
};
use async_trait::async_trait;

/// Writes messages to the application log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogTransport;

impl LogTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for LogTransport {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &MailMessage) -> Result<(), TransportError> {
        tracing::info!(
            from = %message.sender().map(ToString::to_string).unwrap_or_default(),
            to = %join(message.to_recipients()),
            cc = %join(message.cc_recipients()),
            bcc = %join(message.bcc_recipients()),
            subject = message.subject_as_ref().map(|s| s.as_ref()).unwrap_or_default(),
            "Logged outgoing mail message"
        );
        tracing::debug!(
            html = message.html_as_ref().map(|h| h.as_ref()).unwrap_or_default(),
            text = message.text_as_ref().map(|t| t.as_ref()).unwrap_or_default(),
            "Logged mail message body"
        );
        Ok(())
    }
}

fn join(mailboxes: &[Mailbox]) -> String {
    mailboxes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
