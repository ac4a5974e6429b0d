use crate::configuration::PostmarkSettings;
use crate::domain::mail::{
    errors::TransportError,
    models::{address::Mailbox, message::MailMessage},
    ports::Transport,
};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

/// Delivers through the Postmark HTTP API.
#[derive(Debug, Clone)]
pub struct PostmarkTransport {
    http_client: Client,
    base_url: String,
    authorization_token: Secret<String>,
}

impl PostmarkTransport {
    pub fn new(configuration: PostmarkSettings) -> Result<Self, TransportError> {
        let http_client = Client::builder()
            .timeout(configuration.timeout())
            .build()
            .map_err(|e| TransportError::Unexpected(anyhow::Error::from(e)))?;
        Ok(Self {
            http_client,
            base_url: configuration.base_url,
            authorization_token: configuration.authorization_token,
        })
    }
}

#[async_trait]
impl Transport for PostmarkTransport {
    fn name(&self) -> &str {
        "postmark"
    }

    #[tracing::instrument(name = "Send message through Postmark", skip(self, message))]
    async fn send(&self, message: &MailMessage) -> Result<(), TransportError> {
        let from = message
            .sender()
            .ok_or_else(|| TransportError::InvalidMessage("message has no sender".into()))?
            .to_string();
        let to = join(message.to_recipients());
        let cc = join(message.cc_recipients());
        let bcc = join(message.bcc_recipients());
        let reply_to = join(message.reply_to_recipients());
        let request_body = SendEmailRequest {
            from: &from,
            to: to.as_deref(),
            cc: cc.as_deref(),
            bcc: bcc.as_deref(),
            reply_to: reply_to.as_deref(),
            subject: message.subject_as_ref().map(|s| s.as_ref()),
            html_body: message.html_as_ref().map(|h| h.as_ref()),
            text_body: message.text_as_ref().map(|t| t.as_ref()),
        };

        let url = format!("{}/email", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await
            .map_err(anyhow::Error::from)?;

        if response.status().is_client_error() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected(format!("{}: {}", status, detail)));
        }
        response.error_for_status().map_err(anyhow::Error::from)?;
        Ok(())
    }
}

fn join(mailboxes: &[Mailbox]) -> Option<String> {
    if mailboxes.is_empty() {
        return None;
    }
    Some(
        mailboxes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    )
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cc: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bcc: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_body: Option<&'a str>,
}
