pub mod errors;
pub mod mailer;
pub mod markdown;
pub mod models;
pub mod ports;
pub mod transport;
