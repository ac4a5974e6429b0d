use super::address::Mailbox;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MessageError {
    #[error("Invalid email subject {0}")]
    InvalidSubject(String),
    #[error("Invalid email Html content: {0}")]
    InvalidHtmlContent(String),
    #[error("Invalid email text content: {0}")]
    InvalidTextContent(String),
    #[error("Message has no sender")]
    MissingSender,
    #[error("Message has no recipients")]
    MissingRecipients,
    #[error("Message has neither an html nor a text body")]
    MissingBody,
}

#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct EmailSubject(String);

impl TryFrom<String> for EmailSubject {
    type Error = MessageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EmailSubject::try_from(value.as_str())
    }
}

impl TryFrom<&str> for EmailSubject {
    type Error = MessageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err(MessageError::InvalidSubject(
                "EmailSubject cannot be empty.".into(),
            ))
        } else if value.contains(['\r', '\n']) {
            Err(MessageError::InvalidSubject(
                "EmailSubject cannot contain line breaks.".into(),
            ))
        } else {
            Ok(Self(value.to_string()))
        }
    }
}

impl AsRef<str> for EmailSubject {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct EmailHtmlContent(String);

impl TryFrom<String> for EmailHtmlContent {
    type Error = MessageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if !value.is_empty() {
            Ok(Self(value))
        } else {
            Err(MessageError::InvalidHtmlContent(
                "EmailHtmlContent cannot be empty.".into(),
            ))
        }
    }
}

impl TryFrom<&str> for EmailHtmlContent {
    type Error = MessageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        EmailHtmlContent::try_from(value.to_string())
    }
}

impl AsRef<str> for EmailHtmlContent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct EmailTextContent(String);

impl TryFrom<String> for EmailTextContent {
    type Error = MessageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if !value.is_empty() {
            Ok(Self(value))
        } else {
            Err(MessageError::InvalidTextContent(
                "EmailTextContent cannot be empty.".into(),
            ))
        }
    }
}

impl TryFrom<&str> for EmailTextContent {
    type Error = MessageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        EmailTextContent::try_from(value.to_string())
    }
}

impl AsRef<str> for EmailTextContent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An outgoing message. Setters consume and return `self` so a message can
/// be assembled in one expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MailMessage {
    from: Option<Mailbox>,
    reply_to: Vec<Mailbox>,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    subject: Option<EmailSubject>,
    html: Option<EmailHtmlContent>,
    text: Option<EmailTextContent>,
}

impl MailMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, mailbox: Mailbox) -> Self {
        self.from = Some(mailbox);
        self
    }

    pub fn reply_to(mut self, mailbox: Mailbox) -> Self {
        self.reply_to.push(mailbox);
        self
    }

    pub fn to(mut self, mailbox: Mailbox) -> Self {
        self.to.push(mailbox);
        self
    }

    pub fn cc(mut self, mailbox: Mailbox) -> Self {
        self.cc.push(mailbox);
        self
    }

    pub fn bcc(mut self, mailbox: Mailbox) -> Self {
        self.bcc.push(mailbox);
        self
    }

    pub fn subject(mut self, subject: EmailSubject) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn html(mut self, html: EmailHtmlContent) -> Self {
        self.html = Some(html);
        self
    }

    pub fn text(mut self, text: EmailTextContent) -> Self {
        self.text = Some(text);
        self
    }

    pub fn sender(&self) -> Option<&Mailbox> {
        self.from.as_ref()
    }

    pub fn reply_to_recipients(&self) -> &[Mailbox] {
        &self.reply_to
    }

    pub fn to_recipients(&self) -> &[Mailbox] {
        &self.to
    }

    pub fn cc_recipients(&self) -> &[Mailbox] {
        &self.cc
    }

    pub fn bcc_recipients(&self) -> &[Mailbox] {
        &self.bcc
    }

    pub fn subject_as_ref(&self) -> Option<&EmailSubject> {
        self.subject.as_ref()
    }

    pub fn html_as_ref(&self) -> Option<&EmailHtmlContent> {
        self.html.as_ref()
    }

    pub fn text_as_ref(&self) -> Option<&EmailTextContent> {
        self.text.as_ref()
    }

    /// Every envelope recipient: to, cc and bcc.
    pub fn recipients(&self) -> impl Iterator<Item = &Mailbox> {
        self.to.iter().chain(self.cc.iter()).chain(self.bcc.iter())
    }

    pub(crate) fn set_default_sender(&mut self, mailbox: &Mailbox) {
        if self.from.is_none() {
            self.from = Some(mailbox.clone());
        }
    }

    pub(crate) fn set_default_reply_to(&mut self, mailbox: &Mailbox) {
        if self.reply_to.is_empty() {
            self.reply_to.push(mailbox.clone());
        }
    }

    pub(crate) fn redirect_to(&mut self, mailbox: &Mailbox) {
        self.to = vec![mailbox.clone()];
        self.cc.clear();
        self.bcc.clear();
    }

    pub fn validate(&self) -> Result<(), MessageError> {
        if self.from.is_none() {
            return Err(MessageError::MissingSender);
        }
        if self.recipients().next().is_none() {
            return Err(MessageError::MissingRecipients);
        }
        if self.html.is_none() && self.text.is_none() {
            return Err(MessageError::MissingBody);
        }
        Ok(())
    }
}

/// Receipt for a message handed over to a transport.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message_id: Uuid,
    pub accepted_recipients: usize,
    pub sent_at: DateTime<Utc>,
    pub message: MailMessage,
}
