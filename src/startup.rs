use crate::configuration::Settings;
use crate::container::{Container, ContainerError};
use crate::domain::mail::{mailer::Mailer, markdown::Markdown};
use crate::outbound::{transport::TransportManager, views::ViewFactory};
use crate::provider::{MailServiceProvider, CONFIG, MAILER, TRANSPORT_MANAGER, VIEW};
use std::sync::Arc;

/// Application with its container wired: `config` and `view` are bound
/// eagerly, the mail services lazily through [`MailServiceProvider`].
pub struct Application {
    container: Container,
}

impl Application {
    pub fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let container = Container::new();

        let views = ViewFactory::new(configuration.view.paths.clone());
        container.instance(CONFIG, configuration);
        container.instance(VIEW, views);
        container.register_provider(Arc::new(MailServiceProvider::new()));

        Ok(Self { container })
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn mailer(&self) -> Result<Arc<Mailer>, ContainerError> {
        self.container.make(MAILER)
    }

    pub fn markdown(&self) -> Result<Arc<Markdown>, ContainerError> {
        self.container.make_type()
    }

    pub fn transport_manager(&self) -> Result<Arc<TransportManager>, ContainerError> {
        self.container.make(TRANSPORT_MANAGER)
    }
}
