use crate::domain::mail::models::{address::AddressError, message::MessageError};
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
    #[error("Invalid message: {0}")]
    InvalidMessage(#[from] MessageError),
    #[error("Failed to render view: {0}")]
    View(#[from] ViewError),
    #[error("Failed to deliver message: {0}")]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ViewError {
    #[error("Invalid view name: {0}")]
    InvalidName(String),
    #[error("No hint path defined for namespace [{0}]")]
    UnknownNamespace(String),
    #[error("View [{view}] not found, searched {searched:?}")]
    NotFound {
        view: String,
        searched: Vec<PathBuf>,
    },
    #[error("Markdown theme [{0}] not found")]
    ThemeNotFound(String),
    #[error("Failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("Mail driver [{0}] is not supported")]
    UnsupportedDriver(String),
    #[error("Mail driver [{driver}] requires the `mail.{section}` configuration section")]
    MissingConfiguration {
        driver: String,
        section: &'static str,
    },
    #[error("Message cannot be encoded: {0}")]
    InvalidMessage(String),
    #[error("Message was rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}
