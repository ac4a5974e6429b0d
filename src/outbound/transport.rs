use crate::domain::mail::{
    errors::TransportError,
    models::{address::Mailbox, message::MailMessage},
};
use lettre::message::{header::ContentType, MultiPart, SinglePart};

pub mod array;
pub mod log;
pub mod manager;
pub mod postmark;
pub mod sendmail;
pub mod smtp;

pub use manager::TransportManager;

fn lettre_mailbox(mailbox: &Mailbox) -> Result<lettre::message::Mailbox, TransportError> {
    let address = mailbox
        .address()
        .as_ref()
        .parse::<lettre::Address>()
        .map_err(|e| TransportError::InvalidMessage(format!("{}: {}", mailbox.address(), e)))?;
    Ok(lettre::message::Mailbox::new(
        mailbox.name().map(|n| n.as_ref().to_string()),
        address,
    ))
}

/// Encodes a message for the lettre based drivers (smtp, sendmail).
pub(crate) fn lettre_message(message: &MailMessage) -> Result<lettre::Message, TransportError> {
    let from = message
        .sender()
        .ok_or_else(|| TransportError::InvalidMessage("message has no sender".into()))?;

    let mut builder = lettre::Message::builder().from(lettre_mailbox(from)?);
    for mailbox in message.reply_to_recipients() {
        builder = builder.reply_to(lettre_mailbox(mailbox)?);
    }
    for mailbox in message.to_recipients() {
        builder = builder.to(lettre_mailbox(mailbox)?);
    }
    for mailbox in message.cc_recipients() {
        builder = builder.cc(lettre_mailbox(mailbox)?);
    }
    for mailbox in message.bcc_recipients() {
        builder = builder.bcc(lettre_mailbox(mailbox)?);
    }
    if let Some(subject) = message.subject_as_ref() {
        builder = builder.subject(subject.as_ref());
    }

    let html = message.html_as_ref().map(|h| h.as_ref().to_string());
    let text = message.text_as_ref().map(|t| t.as_ref().to_string());
    let encoded = match (html, text) {
        (Some(html), Some(text)) => {
            builder.multipart(MultiPart::alternative_plain_html(text, html))
        }
        (Some(html), None) => builder.singlepart(SinglePart::html(html)),
        (None, Some(text)) => builder.singlepart(SinglePart::plain(text)),
        (None, None) => builder.header(ContentType::TEXT_PLAIN).body(String::new()),
    };
    encoded.map_err(|e| TransportError::InvalidMessage(e.to_string()))
}
