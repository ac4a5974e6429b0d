mod helpers;
mod mailer;
mod markdown;
mod provider;
