use crate::domain::mail::{errors::TransportError, models::message::MailMessage, ports::Transport};
use async_trait::async_trait;
use std::sync::Mutex;

/// Keeps every message in memory instead of delivering it.
#[derive(Debug, Default)]
pub struct ArrayTransport {
    messages: Mutex<Vec<MailMessage>>,
}

impl ArrayTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<MailMessage> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Drops every captured message, returning them.
    pub fn flush(&self) -> Vec<MailMessage> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[async_trait]
impl Transport for ArrayTransport {
    fn name(&self) -> &str {
        "array"
    }

    async fn send(&self, message: &MailMessage) -> Result<(), TransportError> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ArrayTransport;
    use crate::domain::mail::models::{address::Mailbox, message::MailMessage};
    use crate::domain::mail::ports::Transport;

    #[tokio::test]
    async fn messages_are_kept_until_flushed() {
        let transport = ArrayTransport::new();
        let message = MailMessage::new()
            .to(Mailbox::parse("recipient@domain.com", None).unwrap())
            .text("Hello".try_into().unwrap());

        transport.send(&message).await.unwrap();
        transport.send(&message).await.unwrap();

        assert_eq!(transport.messages().len(), 2);
        assert_eq!(transport.flush(), vec![message.clone(), message]);
        assert!(transport.messages().is_empty());
    }
}
