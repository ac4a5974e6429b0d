use super::lettre_message;
use crate::configuration::SendmailSettings;
use crate::domain::mail::{errors::TransportError, models::message::MailMessage, ports::Transport};
use async_trait::async_trait;
use lettre::{AsyncSendmailTransport, AsyncTransport, Tokio1Executor};

/// Pipes messages into a local sendmail binary.
pub struct SendmailTransport {
    transport: AsyncSendmailTransport<Tokio1Executor>,
    command: String,
}

impl SendmailTransport {
    pub fn new(configuration: &SendmailSettings) -> Self {
        Self {
            transport: AsyncSendmailTransport::new_with_command(&configuration.command),
            command: configuration.command.clone(),
        }
    }
}

impl std::fmt::Debug for SendmailTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendmailTransport")
            .field("command", &self.command)
            .finish()
    }
}

#[async_trait]
impl Transport for SendmailTransport {
    fn name(&self) -> &str {
        "sendmail"
    }

    #[tracing::instrument(
        name = "Send message through sendmail",
        skip(self, message),
        fields(command = %self.command)
    )]
    async fn send(&self, message: &MailMessage) -> Result<(), TransportError> {
        let email = lettre_message(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| TransportError::Unexpected(anyhow::Error::from(e)))
    }
}
