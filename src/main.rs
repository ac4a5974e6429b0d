use anyhow::Context;
use mailroom::configuration::get_configuration;
use mailroom::domain::mail::models::{
    address::Mailbox, message::MailMessage, view_data::ViewData,
};
use mailroom::outbound::telemetry::init_logger;
use mailroom::startup::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().context("Failed to read configuration")?;
    init_logger("mailroom", &configuration.log_level(), std::io::stdout);

    let recipient = std::env::args()
        .nth(1)
        .context("Usage: mailroom <recipient>")?;
    let recipient = Mailbox::parse(&recipient, None)?;

    let application = Application::build(configuration)?;
    let mailer = application.mailer()?;
    let markdown = application.markdown()?;

    let data = ViewData::new()
        .with("name", recipient.address().to_string())
        .with("app_name", "Mailroom");
    let message = MailMessage::new()
        .to(recipient)
        .subject("Welcome to Mailroom".try_into()?);

    let sent = mailer
        .send_markdown(&markdown, "emails.welcome", &data, message)
        .await?;
    tracing::info!(message_id = %sent.message_id, "Welcome mail sent");
    Ok(())
}
