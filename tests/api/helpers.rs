use mailroom::configuration::{get_configuration, Settings};
use mailroom::domain::mail::ports::Transport;
use mailroom::outbound::telemetry::init_logger;
use mailroom::outbound::transport::array::ArrayTransport;
use mailroom::startup::Application;
use once_cell::sync::Lazy;
use std::sync::Arc;

pub const CAPTURE_DRIVER: &str = "capture";

pub struct TestApp {
    pub application: Application,
    pub outbox: Arc<ArrayTransport>,
}

static TRACING: Lazy<()> = Lazy::new(|| {
    let c = get_configuration().expect("Failed to read configuration");
    let default_filter_level = c.general.log_level;
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        init_logger(&subscriber_name, &default_filter_level, std::io::stdout);
    } else {
        init_logger(&subscriber_name, &default_filter_level, std::io::sink);
    }
});

pub fn configuration() -> Settings {
    Lazy::force(&TRACING);
    let mut c = get_configuration().expect("Failed to read configuration");
    c.mail.driver = CAPTURE_DRIVER.into();
    c
}

/// Builds the application with every mail sent through the `capture` driver,
/// which stores messages in `outbox`.
pub fn spawn_app() -> TestApp {
    spawn_app_with(|_| {})
}

pub fn spawn_app_with<F>(customise: F) -> TestApp
where
    F: FnOnce(&mut Settings),
{
    let mut c = configuration();
    customise(&mut c);

    let application = Application::build(c).expect("Failed to build application.");
    let outbox = Arc::new(ArrayTransport::new());
    let captured = Arc::clone(&outbox);
    application
        .transport_manager()
        .expect("Failed to resolve the transport manager.")
        .extend(CAPTURE_DRIVER, move |_| {
            Ok(Arc::clone(&captured) as Arc<dyn Transport>)
        });

    TestApp {
        application,
        outbox,
    }
}
