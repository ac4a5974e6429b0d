use crate::configuration::{GlobalAddress, MailSettings, Settings};
use crate::container::{type_key, Container, ServiceProvider};
use crate::domain::mail::{
    mailer::Mailer,
    markdown::{Markdown, MarkdownOptions},
    models::address::{AddressError, AddressType},
    ports::GlobalAddresses,
    transport::MailTransport,
};
use crate::outbound::{transport::TransportManager, views::ViewFactory};

pub const CONFIG: &str = "config";
pub const VIEW: &str = "view";
pub const MAILER: &str = "mailer";
pub const MAIL_TRANSPORT: &str = "mail.transport";
pub const TRANSPORT_MANAGER: &str = "mail.transport_manager";

/// Key of the markdown renderer; it is bound by type.
pub fn markdown_key() -> &'static str {
    type_key::<Markdown>()
}

/// Wires the mail services into the container. Expects `config`
/// ([`Settings`]) and `view` ([`ViewFactory`]) to be bound already.
#[derive(Debug, Default)]
pub struct MailServiceProvider;

impl MailServiceProvider {
    pub fn new() -> Self {
        Self
    }

    fn register_transport(&self, container: &Container) {
        container.singleton(TRANSPORT_MANAGER, |c| {
            let settings = c.make::<Settings>(CONFIG)?;
            Ok(TransportManager::new(settings.mail.clone()))
        });

        container.singleton(MAIL_TRANSPORT, |c| {
            let manager = c.make::<TransportManager>(TRANSPORT_MANAGER)?;
            Ok(MailTransport::new(manager.driver(None)?))
        });
    }

    fn register_mailer(&self, container: &Container) {
        container.singleton(MAILER, |c| {
            let settings = c.make::<Settings>(CONFIG)?;
            let views = c.make::<ViewFactory>(VIEW)?;
            let transport = c.make::<MailTransport>(MAIL_TRANSPORT)?;

            let mut mailer = Mailer::new(views, transport);
            for kind in AddressType::ALL {
                set_global_address(&mut mailer, &settings.mail, kind)?;
            }
            Ok(mailer)
        });
    }

    fn register_markdown_renderer(&self, container: &Container) {
        container.singleton_type(|c| {
            let settings = c.make::<Settings>(CONFIG)?;
            let views = c.make::<ViewFactory>(VIEW)?;
            Ok(Markdown::new(
                views,
                MarkdownOptions {
                    theme: settings.mail.markdown.theme.clone(),
                    paths: settings.mail.markdown.paths.clone(),
                },
            ))
        });
    }
}

impl ServiceProvider for MailServiceProvider {
    fn register(&self, container: &Container) {
        self.register_transport(container);
        self.register_mailer(container);
        self.register_markdown_renderer(container);
    }

    fn provides(&self) -> Vec<String> {
        vec![
            MAILER.to_string(),
            MAIL_TRANSPORT.to_string(),
            TRANSPORT_MANAGER.to_string(),
            markdown_key().to_string(),
        ]
    }

    fn is_deferred(&self) -> bool {
        true
    }
}

/// Pins the configured address of `kind` on the mailer. Values that are not
/// a mapping carrying an `address` are skipped.
pub fn set_global_address<M: GlobalAddresses + ?Sized>(
    mailer: &mut M,
    settings: &MailSettings,
    kind: AddressType,
) -> Result<(), AddressError> {
    let (address, name) = match settings.global_address(kind).and_then(GlobalAddress::parts) {
        Some(parts) => parts,
        None => return Ok(()),
    };

    tracing::debug!(kind = %kind, address, "Setting global mail address");
    match kind {
        AddressType::From => mailer.always_from(address, name),
        AddressType::ReplyTo => mailer.always_reply_to(address, name),
        AddressType::To => mailer.always_to(address, name),
    }
}
