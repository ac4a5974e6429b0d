use async_trait::async_trait;
use std::path::PathBuf;

use super::{
    errors::{TransportError, ViewError},
    models::{address::AddressError, message::MailMessage, view_data::ViewData},
};

#[async_trait]
///  A mechanism able to deliver a message: SMTP relay, HTTP API, log, ...
pub trait Transport: Send + Sync + 'static {
    /// Driver name the transport was created for
    fn name(&self) -> &str;

    /// Asynchronously hands `message` over for delivery
    async fn send(&self, message: &MailMessage) -> Result<(), TransportError>;
}

/// Locates and renders named views
pub trait ViewRenderer: Send + Sync + 'static {
    fn render(&self, view: &str, data: &ViewData) -> Result<String, ViewError>;

    /// Renders `view` with `namespace` resolving to `paths` for this call only
    fn render_with_namespace(
        &self,
        view: &str,
        data: &ViewData,
        namespace: &str,
        paths: &[PathBuf],
    ) -> Result<String, ViewError>;

    fn exists(&self, view: &str) -> bool;
}

/// Holds the addresses applied to every outgoing message
pub trait GlobalAddresses {
    fn always_from(&mut self, address: &str, name: Option<&str>) -> Result<(), AddressError>;

    fn always_reply_to(&mut self, address: &str, name: Option<&str>) -> Result<(), AddressError>;

    fn always_to(&mut self, address: &str, name: Option<&str>) -> Result<(), AddressError>;
}
