use crate::helpers::{configuration, spawn_app, spawn_app_with, CAPTURE_DRIVER};
use mailroom::configuration::GlobalAddress;
use mailroom::container::{ContainerError, ServiceProvider};
use mailroom::domain::mail::{
    errors::TransportError, models::address::AddressError, transport::MailTransport,
};
use mailroom::provider::{
    markdown_key, MailServiceProvider, MAILER, MAIL_TRANSPORT, TRANSPORT_MANAGER,
};
use mailroom::startup::Application;
use serde::de::IgnoredAny;
use std::sync::Arc;

fn mailbox(address: &str, name: Option<&str>) -> Option<GlobalAddress> {
    Some(GlobalAddress::Mailbox {
        address: address.into(),
        name: name.map(str::to_string),
    })
}

#[test]
fn provider_is_deferred_and_lists_the_keys_it_provides() {
    let provider = MailServiceProvider::new();

    assert!(provider.is_deferred());
    assert_eq!(
        provider.provides(),
        vec![
            MAILER.to_string(),
            MAIL_TRANSPORT.to_string(),
            TRANSPORT_MANAGER.to_string(),
            markdown_key().to_string(),
        ]
    );
}

#[test]
fn mail_services_are_not_built_until_requested() {
    let app = Application::build(configuration()).unwrap();
    let container = app.container();

    for key in [MAILER, MAIL_TRANSPORT, TRANSPORT_MANAGER, markdown_key()] {
        assert!(container.bound(key), "{} should be bound", key);
        assert!(!container.resolved(key), "{} should not be resolved", key);
    }

    app.transport_manager().unwrap();

    assert!(container.resolved(TRANSPORT_MANAGER));
    assert!(!container.resolved(MAIL_TRANSPORT));
    assert!(!container.resolved(MAILER));
    assert!(!container.resolved(markdown_key()));
}

#[test]
fn resolving_the_mailer_builds_its_transport_chain() {
    let app = spawn_app();
    let container = app.application.container();

    app.application.mailer().unwrap();

    assert!(container.resolved(MAILER));
    assert!(container.resolved(MAIL_TRANSPORT));
    assert!(container.resolved(TRANSPORT_MANAGER));
    assert!(!container.resolved(markdown_key()));
}

#[test]
fn mail_services_are_shared_singletons() {
    let app = spawn_app();
    let container = app.application.container();

    let first = app.application.mailer().unwrap();
    let second = app.application.mailer().unwrap();
    let transport = container.make::<MailTransport>(MAIL_TRANSPORT).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(first.transport(), &transport));
    assert!(Arc::ptr_eq(
        &app.application.markdown().unwrap(),
        &app.application.markdown().unwrap()
    ));
}

#[test]
fn mail_transport_uses_the_default_driver() {
    let app = spawn_app();

    let transport = app
        .application
        .container()
        .make::<MailTransport>(MAIL_TRANSPORT)
        .unwrap();

    assert_eq!(transport.driver_name(), CAPTURE_DRIVER);
}

#[test]
fn configured_global_addresses_are_applied_to_the_mailer() {
    let app = spawn_app_with(|c| {
        c.mail.reply_to = mailbox("replies@example.com", None);
        c.mail.to = mailbox("sink@example.com", Some("Sink"));
    });

    let mailer = app.application.mailer().unwrap();

    assert_eq!(
        mailer.global_from().unwrap().to_string(),
        "Mailroom <hello@example.com>"
    );
    assert_eq!(
        mailer.global_reply_to().unwrap().to_string(),
        "replies@example.com"
    );
    assert_eq!(
        mailer.global_to().unwrap().to_string(),
        "Sink <sink@example.com>"
    );
}

#[test]
fn absent_or_malformed_addresses_are_ignored() {
    let app = spawn_app_with(|c| {
        c.mail.from = None;
        c.mail.reply_to = Some(GlobalAddress::Malformed(IgnoredAny));
    });

    let mailer = app.application.mailer().unwrap();

    assert!(mailer.global_from().is_none());
    assert!(mailer.global_reply_to().is_none());
    assert!(mailer.global_to().is_none());
}

#[test]
fn an_invalid_configured_address_makes_the_mailer_fail() {
    let app = spawn_app_with(|c| {
        c.mail.from = mailbox("definitely-not-an-address", None);
    });

    match app.application.mailer() {
        Err(ContainerError::Resolution { key, source }) => {
            assert_eq!(key, MAILER);
            assert!(source.downcast_ref::<AddressError>().is_some());
        }
        other => panic!("Expected a resolution error, got {:?}", other),
    }
    assert!(!app.application.container().resolved(MAILER));
}

#[test]
fn an_unsupported_default_driver_makes_the_mailer_fail() {
    let app = spawn_app_with(|c| {
        c.mail.driver = "pigeon".into();
    });

    let error = anyhow::Error::from(app.application.mailer().unwrap_err());

    let unsupported = error.chain().any(|e| {
        matches!(
            e.downcast_ref::<TransportError>(),
            Some(TransportError::UnsupportedDriver(name)) if name == "pigeon"
        )
    });
    assert!(unsupported, "Unexpected error chain: {:?}", error);
}

#[test]
fn markdown_is_bound_by_type_with_the_configured_options() {
    let app = spawn_app_with(|c| {
        c.mail.markdown.theme = "sunset".into();
    });
    let configured = configuration().mail.markdown.paths;

    let markdown = app.application.markdown().unwrap();

    assert_eq!(markdown.theme(), "sunset");
    assert_eq!(markdown.component_paths(), configured.as_slice());
}

#[test]
fn smtp_driver_outside_a_runtime_fails_instead_of_panicking() {
    let app = spawn_app_with(|c| {
        c.mail.driver = "smtp".into();
    });

    let error = anyhow::Error::from(app.application.mailer().unwrap_err());

    let unexpected = error
        .chain()
        .any(|e| matches!(e.downcast_ref::<TransportError>(), Some(TransportError::Unexpected(_))));
    assert!(unexpected, "Unexpected error chain: {:?}", error);
}
