use crate::domain::mail::models::address::AddressType;
use secrecy::Secret;
use serde::de::IgnoredAny;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::path::PathBuf;

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Settings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub view: ViewSettings,
    pub mail: MailSettings,
}

impl Settings {
    pub fn log_level(&self) -> String {
        self.general.log_level.clone()
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct GeneralSettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct ViewSettings {
    #[serde(default = "default_view_paths")]
    pub paths: Vec<PathBuf>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            paths: default_view_paths(),
        }
    }
}

fn default_view_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("resources/views")]
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct MailSettings {
    #[serde(default = "default_driver")]
    pub driver: String,
    #[serde(default)]
    pub from: Option<GlobalAddress>,
    #[serde(default)]
    pub reply_to: Option<GlobalAddress>,
    #[serde(default)]
    pub to: Option<GlobalAddress>,
    #[serde(default)]
    pub markdown: MarkdownSettings,
    #[serde(default)]
    pub smtp: Option<SmtpSettings>,
    #[serde(default)]
    pub sendmail: SendmailSettings,
    #[serde(default)]
    pub postmark: Option<PostmarkSettings>,
}

impl MailSettings {
    pub fn global_address(&self, kind: AddressType) -> Option<&GlobalAddress> {
        match kind {
            AddressType::From => self.from.as_ref(),
            AddressType::ReplyTo => self.reply_to.as_ref(),
            AddressType::To => self.to.as_ref(),
        }
    }
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            from: None,
            reply_to: None,
            to: None,
            markdown: MarkdownSettings::default(),
            smtp: None,
            sendmail: SendmailSettings::default(),
            postmark: None,
        }
    }
}

fn default_driver() -> String {
    "smtp".into()
}

/// A configured `from`/`reply_to`/`to` value.
///
/// Only a mapping with an `address` field is usable; every other shape is
/// kept as `Malformed` and ignored by the mailer wiring.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum GlobalAddress {
    Mailbox {
        address: String,
        #[serde(default)]
        name: Option<String>,
    },
    Malformed(IgnoredAny),
}

impl GlobalAddress {
    pub fn parts(&self) -> Option<(&str, Option<&str>)> {
        match self {
            GlobalAddress::Mailbox { address, name } => Some((address, name.as_deref())),
            GlobalAddress::Malformed(_) => None,
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct MarkdownSettings {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

impl Default for MarkdownSettings {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            paths: Vec::new(),
        }
    }
}

fn default_theme() -> String {
    "default".into()
}

#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SmtpEncryption {
    Tls,
    Starttls,
    None,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub encryption: SmtpEncryption,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret<String>>,
    #[serde(default = "default_smtp_timeout")]
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl SmtpSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

fn default_smtp_timeout() -> u64 {
    10_000
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct SendmailSettings {
    #[serde(default = "default_sendmail_command")]
    pub command: String,
}

impl Default for SendmailSettings {
    fn default() -> Self {
        Self {
            command: default_sendmail_command(),
        }
    }
}

fn default_sendmail_command() -> String {
    "/usr/sbin/sendmail".into()
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct PostmarkSettings {
    pub base_url: String,
    pub authorization_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl PostmarkSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let configuration_directory = base_path.join("configuration");

    let environment = parse_environment(std::env::var("APP_ENVIRONMENT").ok())?;

    let mut settings = config::Config::default();
    settings.merge(config::File::from(configuration_directory.join("base")).required(true))?;
    settings.merge(
        config::File::from(configuration_directory.join(environment.as_str())).required(true),
    )?;
    // e.g. `APP_MAIL__FROM__ADDRESS=noreply@example.com`
    settings.merge(config::Environment::with_prefix("app").separator("__"))?;

    settings.try_into()
}

/// `APP_ENVIRONMENT` defaults to `local`.
fn parse_environment(value: Option<String>) -> Result<Environment, config::ConfigError> {
    value
        .unwrap_or_else(|| "local".into())
        .try_into()
        .map_err(|e: String| {
            config::ConfigError::Message(format!("Failed to parse APP_ENVIRONMENT: {}", e))
        })
}
