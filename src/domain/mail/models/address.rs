use unicode_segmentation::UnicodeSegmentation;
use validator::validate_email;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AddressError {
    #[error("{0} is not a valid email address")]
    InvalidAddress(String),
    #[error("Display name cannot be empty or whitespace.")]
    EmptyName,
    #[error(
        "Display name is too long (maximum allowed is {} characters).",
        DisplayName::MAX_LENGTH
    )]
    NameTooLong,
    #[error("Display name contains control characters: {0:?}")]
    NameContainsControlCharacters(String),
}

#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(s: String) -> Result<EmailAddress, AddressError> {
        if validate_email(&s) {
            Ok(Self(s))
        } else {
            Err(AddressError::InvalidAddress(s))
        }
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<EmailAddress> for String {
    fn from(address: EmailAddress) -> Self {
        address.0
    }
}

#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    const MAX_LENGTH: usize = 256;

    /// Header values are built from display names, so line breaks and other
    /// control characters are rejected outright.
    pub fn parse(s: String) -> Result<DisplayName, AddressError> {
        if s.trim().is_empty() {
            return Err(AddressError::EmptyName);
        }
        if s.graphemes(true).count() > DisplayName::MAX_LENGTH {
            return Err(AddressError::NameTooLong);
        }
        if s.chars().any(char::is_control) {
            return Err(AddressError::NameContainsControlCharacters(s));
        }
        Ok(Self(s))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Mailbox {
    address: EmailAddress,
    name: Option<DisplayName>,
}

impl Mailbox {
    pub fn new(address: EmailAddress, name: Option<DisplayName>) -> Self {
        Self { address, name }
    }

    /// An empty or blank name is treated as no name at all.
    pub fn parse(address: &str, name: Option<&str>) -> Result<Mailbox, AddressError> {
        let address = EmailAddress::parse(address.trim().to_string())?;
        let name = match name {
            Some(n) if !n.trim().is_empty() => Some(DisplayName::parse(n.to_string())?),
            _ => None,
        };
        Ok(Self { address, name })
    }

    pub fn address(&self) -> &EmailAddress {
        &self.address
    }

    pub fn name(&self) -> Option<&DisplayName> {
        self.name.as_ref()
    }
}

impl From<EmailAddress> for Mailbox {
    fn from(address: EmailAddress) -> Self {
        Self {
            address,
            name: None,
        }
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            None => write!(f, "{}", self.address),
            Some(name) if needs_quoting(name.as_ref()) => {
                let escaped = name.as_ref().replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{}\" <{}>", escaped, self.address)
            }
            Some(name) => write!(f, "{} <{}>", name, self.address),
        }
    }
}

fn needs_quoting(name: &str) -> bool {
    const SPECIALS: [char; 13] = ['(', ')', '<', '>', '[', ']', ':', ';', '@', '\\', ',', '.', '"'];
    name.chars().any(|c| SPECIALS.contains(&c))
}

/// The kinds of address a mailer can pin globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    From,
    ReplyTo,
    To,
}

impl AddressType {
    pub const ALL: [AddressType; 3] = [AddressType::From, AddressType::ReplyTo, AddressType::To];

    pub fn config_key(&self) -> &'static str {
        match self {
            AddressType::From => "from",
            AddressType::ReplyTo => "reply_to",
            AddressType::To => "to",
        }
    }
}

impl std::fmt::Display for AddressType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.config_key())
    }
}
