use super::{
    errors::TransportError,
    models::message::{MailMessage, SentMessage},
    ports::Transport,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// The transport object the mailer dispatches through. Wraps whichever
/// driver the transport manager produced and stamps every delivery.
#[derive(Clone)]
pub struct MailTransport {
    transport: Arc<dyn Transport>,
}

impl MailTransport {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn driver_name(&self) -> &str {
        self.transport.name()
    }

    #[tracing::instrument(
        name = "Dispatch message through transport",
        skip(self, message),
        fields(driver = %self.transport.name(), message_id = tracing::field::Empty)
    )]
    pub async fn send(&self, message: MailMessage) -> Result<SentMessage, TransportError> {
        let message_id = Uuid::new_v4();
        tracing::Span::current().record("message_id", &tracing::field::display(message_id));

        self.transport.send(&message).await?;

        let accepted_recipients = message.recipients().count();
        tracing::info!(accepted_recipients, "Message handed over to transport");
        Ok(SentMessage {
            message_id,
            accepted_recipients,
            sent_at: Utc::now(),
            message,
        })
    }
}

impl std::fmt::Debug for MailTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailTransport")
            .field("driver", &self.transport.name())
            .finish()
    }
}
