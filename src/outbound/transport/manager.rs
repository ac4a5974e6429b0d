use super::{
    array::ArrayTransport, log::LogTransport, postmark::PostmarkTransport,
    sendmail::SendmailTransport, smtp::SmtpTransport,
};
use crate::configuration::MailSettings;
use crate::domain::mail::{errors::TransportError, ports::Transport};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub type TransportCreator =
    Arc<dyn Fn(&MailSettings) -> Result<Arc<dyn Transport>, TransportError> + Send + Sync>;

/// Creates transports by driver name and keeps each one once created.
pub struct TransportManager {
    settings: MailSettings,
    default_driver: RwLock<Option<String>>,
    drivers: RwLock<HashMap<String, Arc<dyn Transport>>>,
    custom_creators: RwLock<HashMap<String, TransportCreator>>,
}

impl TransportManager {
    pub fn new(settings: MailSettings) -> Self {
        Self {
            settings,
            default_driver: RwLock::new(None),
            drivers: RwLock::new(HashMap::new()),
            custom_creators: RwLock::new(HashMap::new()),
        }
    }

    pub fn default_driver(&self) -> String {
        self.default_driver
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .unwrap_or_else(|| self.settings.driver.clone())
    }

    pub fn set_default_driver(&self, name: impl Into<String>) {
        *self
            .default_driver
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(name.into());
    }

    /// Returns the transport for `name` (the default driver when `None`),
    /// creating it on first use.
    pub fn driver(&self, name: Option<&str>) -> Result<Arc<dyn Transport>, TransportError> {
        let name = name.map(str::to_string).unwrap_or_else(|| self.default_driver());

        if let Some(transport) = self
            .drivers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&name)
        {
            return Ok(Arc::clone(transport));
        }

        let created = self.create_driver(&name)?;
        let mut drivers = self.drivers.write().unwrap_or_else(|e| e.into_inner());
        let transport = drivers.entry(name.clone()).or_insert(created);
        tracing::debug!(driver = %name, "Mail transport created");
        Ok(Arc::clone(transport))
    }

    /// Registers a custom driver. Custom drivers shadow built-in ones with the
    /// same name.
    pub fn extend<F>(&self, name: impl Into<String>, creator: F)
    where
        F: Fn(&MailSettings) -> Result<Arc<dyn Transport>, TransportError> + Send + Sync + 'static,
    {
        self.custom_creators
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), Arc::new(creator));
    }

    /// Names of the drivers created so far.
    pub fn drivers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .drivers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn create_driver(&self, name: &str) -> Result<Arc<dyn Transport>, TransportError> {
        let custom = self
            .custom_creators
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned();
        if let Some(creator) = custom {
            return creator(&self.settings);
        }

        match name {
            "smtp" => {
                let smtp = self.settings.smtp.as_ref().ok_or_else(|| {
                    TransportError::MissingConfiguration {
                        driver: name.to_string(),
                        section: "smtp",
                    }
                })?;
                Ok(Arc::new(SmtpTransport::new(smtp)?))
            }
            "sendmail" => Ok(Arc::new(SendmailTransport::new(&self.settings.sendmail))),
            "postmark" => {
                let postmark = self.settings.postmark.clone().ok_or_else(|| {
                    TransportError::MissingConfiguration {
                        driver: name.to_string(),
                        section: "postmark",
                    }
                })?;
                Ok(Arc::new(PostmarkTransport::new(postmark)?))
            }
            "log" => Ok(Arc::new(LogTransport::new())),
            "array" => Ok(Arc::new(ArrayTransport::new())),
            other => Err(TransportError::UnsupportedDriver(other.to_string())),
        }
    }
}

impl std::fmt::Debug for TransportManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportManager")
            .field("default_driver", &self.default_driver())
            .field("drivers", &self.drivers())
            .finish()
    }
}
