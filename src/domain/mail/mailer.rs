use super::{
    errors::MailError,
    markdown::Markdown,
    models::{
        address::{AddressError, Mailbox},
        message::{EmailHtmlContent, EmailTextContent, MailMessage, SentMessage},
        view_data::ViewData,
    },
    ports::{GlobalAddresses, ViewRenderer},
    transport::MailTransport,
};
use std::sync::Arc;

pub struct Mailer {
    views: Arc<dyn ViewRenderer>,
    transport: Arc<MailTransport>,
    from: Option<Mailbox>,
    reply_to: Option<Mailbox>,
    to: Option<Mailbox>,
}

impl Mailer {
    pub fn new(views: Arc<dyn ViewRenderer>, transport: Arc<MailTransport>) -> Self {
        Self {
            views,
            transport,
            from: None,
            reply_to: None,
            to: None,
        }
    }

    /// Sender used by every message that does not set one itself.
    pub fn always_from(&mut self, address: &str, name: Option<&str>) -> Result<(), AddressError> {
        self.from = Some(Mailbox::parse(address, name)?);
        Ok(())
    }

    /// Reply-to used by every message that does not set one itself.
    pub fn always_reply_to(
        &mut self,
        address: &str,
        name: Option<&str>,
    ) -> Result<(), AddressError> {
        self.reply_to = Some(Mailbox::parse(address, name)?);
        Ok(())
    }

    /// Redirects every message to a single recipient, dropping cc and bcc.
    pub fn always_to(&mut self, address: &str, name: Option<&str>) -> Result<(), AddressError> {
        self.to = Some(Mailbox::parse(address, name)?);
        Ok(())
    }

    pub fn global_from(&self) -> Option<&Mailbox> {
        self.from.as_ref()
    }

    pub fn global_reply_to(&self) -> Option<&Mailbox> {
        self.reply_to.as_ref()
    }

    pub fn global_to(&self) -> Option<&Mailbox> {
        self.to.as_ref()
    }

    pub fn transport(&self) -> &Arc<MailTransport> {
        &self.transport
    }

    pub fn render(&self, view: &str, data: &ViewData) -> Result<String, MailError> {
        Ok(self.views.render(view, data)?)
    }

    #[tracing::instrument(
        name = "Send mail message",
        skip(self, message),
        fields(driver = %self.transport.driver_name())
    )]
    pub async fn send(&self, mut message: MailMessage) -> Result<SentMessage, MailError> {
        self.apply_global_addresses(&mut message);
        message.validate()?;
        Ok(self.transport.send(message).await?)
    }

    /// Renders `html_view` (and `text_view` when given) into the message body
    /// before sending it.
    pub async fn send_view(
        &self,
        html_view: &str,
        text_view: Option<&str>,
        data: &ViewData,
        message: MailMessage,
    ) -> Result<SentMessage, MailError> {
        let html = EmailHtmlContent::try_from(self.views.render(html_view, data)?)?;
        let mut message = message.html(html);
        if let Some(text_view) = text_view {
            let text = EmailTextContent::try_from(self.views.render(text_view, data)?)?;
            message = message.text(text);
        }
        self.send(message).await
    }

    pub async fn send_markdown(
        &self,
        markdown: &Markdown,
        view: &str,
        data: &ViewData,
        message: MailMessage,
    ) -> Result<SentMessage, MailError> {
        let html = EmailHtmlContent::try_from(markdown.render(view, data)?)?;
        let text = EmailTextContent::try_from(markdown.render_text(view, data)?)?;
        self.send(message.html(html).text(text)).await
    }

    fn apply_global_addresses(&self, message: &mut MailMessage) {
        if let Some(from) = &self.from {
            message.set_default_sender(from);
        }
        if let Some(reply_to) = &self.reply_to {
            message.set_default_reply_to(reply_to);
        }
        if let Some(to) = &self.to {
            message.redirect_to(to);
        }
    }
}

impl GlobalAddresses for Mailer {
    fn always_from(&mut self, address: &str, name: Option<&str>) -> Result<(), AddressError> {
        Mailer::always_from(self, address, name)
    }

    fn always_reply_to(&mut self, address: &str, name: Option<&str>) -> Result<(), AddressError> {
        Mailer::always_reply_to(self, address, name)
    }

    fn always_to(&mut self, address: &str, name: Option<&str>) -> Result<(), AddressError> {
        Mailer::always_to(self, address, name)
    }
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("transport", &self.transport)
            .field("from", &self.from)
            .field("reply_to", &self.reply_to)
            .field("to", &self.to)
            .finish()
    }
}
