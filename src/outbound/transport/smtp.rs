use super::lettre_message;
use crate::configuration::{SmtpEncryption, SmtpSettings};
use crate::domain::mail::{errors::TransportError, models::message::MailMessage, ports::Transport};
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use secrecy::ExposeSecret;

/// Delivers through an SMTP relay.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpTransport {
    /// Must be called from within a tokio runtime: the connection pool is
    /// driven by a background task.
    pub fn new(configuration: &SmtpSettings) -> Result<Self, TransportError> {
        tokio::runtime::Handle::try_current().map_err(|e| {
            TransportError::Unexpected(
                anyhow::Error::from(e).context("SMTP transport requires a tokio runtime"),
            )
        })?;

        let builder = match configuration.encryption {
            SmtpEncryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&configuration.host),
            SmtpEncryption::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&configuration.host)
            }
            SmtpEncryption::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
                &configuration.host,
            )),
        }
        .map_err(|e| TransportError::Unexpected(anyhow::Error::from(e)))?;

        let mut builder = builder
            .port(configuration.port)
            .timeout(Some(configuration.timeout()));
        if let (Some(username), Some(password)) = (&configuration.username, &configuration.password)
        {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            host: configuration.host.clone(),
        })
    }
}

impl std::fmt::Debug for SmtpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpTransport")
            .field("host", &self.host)
            .finish()
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    fn name(&self) -> &str {
        "smtp"
    }

    #[tracing::instrument(
        name = "Send message through SMTP",
        skip(self, message),
        fields(host = %self.host)
    )]
    async fn send(&self, message: &MailMessage) -> Result<(), TransportError> {
        let email = lettre_message(message)?;
        let response = self.transport.send(email).await.map_err(|e| {
            if e.is_permanent() {
                TransportError::Rejected(e.to_string())
            } else {
                TransportError::Unexpected(anyhow::Error::from(e))
            }
        })?;
        tracing::debug!(code = %response.code(), "SMTP relay accepted message");
        Ok(())
    }
}
