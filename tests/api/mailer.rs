use crate::helpers::{spawn_app, spawn_app_with};
use mailroom::configuration::{GlobalAddress, PostmarkSettings};
use mailroom::domain::mail::errors::MailError;
use mailroom::domain::mail::models::{
    address::Mailbox,
    message::{MailMessage, MessageError},
    view_data::ViewData,
};
use secrecy::Secret;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mailbox(address: &str) -> Mailbox {
    Mailbox::parse(address, None).unwrap()
}

fn welcome_data() -> ViewData {
    ViewData::new()
        .with("name", "Ursula")
        .with("app_name", "Mailroom")
}

#[tokio::test]
async fn markdown_mail_is_delivered_through_postmark() {
    let email_server = MockServer::start().await;
    let app = spawn_app_with(|c| {
        c.mail.driver = "postmark".into();
        c.mail.postmark = Some(PostmarkSettings {
            base_url: email_server.uri(),
            authorization_token: Secret::new("server-token".into()),
            timeout_milliseconds: 2000,
        });
    });

    Mock::given(path("/email"))
        .and(method("POST"))
        .and(header_exists("X-Postmark-Server-Token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&email_server)
        .await;

    let mailer = app.application.mailer().unwrap();
    let markdown = app.application.markdown().unwrap();
    let message = MailMessage::new()
        .to(mailbox("ursula@example.com"))
        .subject("Welcome".try_into().unwrap());

    let sent = mailer
        .send_markdown(&markdown, "emails.welcome", &welcome_data(), message)
        .await
        .unwrap();

    assert_eq!(sent.accepted_recipients, 1);
    let request = &email_server.received_requests().await.unwrap()[0];
    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["From"], "Mailroom <hello@example.com>");
    assert_eq!(body["To"], "ursula@example.com");
    assert_eq!(body["Subject"], "Welcome");
    let html = body["HtmlBody"].as_str().unwrap();
    assert!(html.contains("<h1>Welcome, Ursula!</h1>"));
    assert!(html.contains("mail-body"));
    let text = body["TextBody"].as_str().unwrap();
    assert!(text.contains("Welcome, Ursula!"));
    assert!(text.contains("the Mailroom team"));
    assert!(!text.contains('<'));
}

#[tokio::test]
async fn postmark_rejections_surface_as_transport_errors() {
    let email_server = MockServer::start().await;
    let app = spawn_app_with(|c| {
        c.mail.driver = "postmark".into();
        c.mail.postmark = Some(PostmarkSettings {
            base_url: email_server.uri(),
            authorization_token: Secret::new("server-token".into()),
            timeout_milliseconds: 2000,
        });
    });

    Mock::given(path("/email"))
        .respond_with(ResponseTemplate::new(422))
        .expect(1)
        .mount(&email_server)
        .await;

    let mailer = app.application.mailer().unwrap();
    let message = MailMessage::new()
        .to(mailbox("ursula@example.com"))
        .text("Hello".try_into().unwrap());

    let outcome = mailer.send(message).await;

    assert!(matches!(outcome, Err(MailError::Transport(_))));
}

#[tokio::test]
async fn configured_sender_is_used_when_the_message_has_none() {
    let app = spawn_app();
    let mailer = app.application.mailer().unwrap();

    mailer
        .send(
            MailMessage::new()
                .to(mailbox("ursula@example.com"))
                .text("Hello".try_into().unwrap()),
        )
        .await
        .unwrap();

    let sent = app.outbox.messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].sender().unwrap().to_string(),
        "Mailroom <hello@example.com>"
    );
}

#[tokio::test]
async fn explicit_sender_wins_over_the_configured_one() {
    let app = spawn_app();
    let mailer = app.application.mailer().unwrap();

    mailer
        .send(
            MailMessage::new()
                .from(mailbox("someone@example.com"))
                .to(mailbox("ursula@example.com"))
                .text("Hello".try_into().unwrap()),
        )
        .await
        .unwrap();

    assert_eq!(
        app.outbox.messages()[0].sender(),
        Some(&mailbox("someone@example.com"))
    );
}

#[tokio::test]
async fn configured_recipient_redirects_every_message() {
    let app = spawn_app_with(|c| {
        c.mail.to = Some(GlobalAddress::Mailbox {
            address: "sink@example.com".into(),
            name: None,
        });
    });
    let mailer = app.application.mailer().unwrap();

    mailer
        .send(
            MailMessage::new()
                .to(mailbox("ursula@example.com"))
                .cc(mailbox("copy@example.com"))
                .bcc(mailbox("hidden@example.com"))
                .text("Hello".try_into().unwrap()),
        )
        .await
        .unwrap();

    let sent = &app.outbox.messages()[0];
    assert_eq!(sent.to_recipients(), &[mailbox("sink@example.com")]);
    assert!(sent.cc_recipients().is_empty());
    assert!(sent.bcc_recipients().is_empty());
}

#[tokio::test]
async fn views_are_rendered_into_the_message_body() {
    let views = TempDir::new().unwrap();
    fs::write(
        views.path().join("greeting.html"),
        "<p>Hello {{ name }}</p>",
    )
    .unwrap();
    fs::write(views.path().join("greeting_text.txt"), "Hello {{ name }}").unwrap();
    let app = spawn_app_with(|c| {
        c.view.paths = vec![views.path().to_path_buf()];
    });
    let mailer = app.application.mailer().unwrap();
    let data = ViewData::new().with("name", "<Ursula>");

    mailer
        .send_view(
            "greeting",
            Some("greeting_text"),
            &data,
            MailMessage::new().to(mailbox("ursula@example.com")),
        )
        .await
        .unwrap();

    let sent = &app.outbox.messages()[0];
    assert_eq!(sent.html_as_ref().unwrap().as_ref(), "<p>Hello &lt;Ursula&gt;</p>");
    assert_eq!(sent.text_as_ref().unwrap().as_ref(), "Hello &lt;Ursula&gt;");
}

#[tokio::test]
async fn a_missing_view_is_reported_and_nothing_is_sent() {
    let app = spawn_app();
    let mailer = app.application.mailer().unwrap();

    let outcome = mailer
        .send_view(
            "emails.does_not_exist",
            None,
            &ViewData::new(),
            MailMessage::new().to(mailbox("ursula@example.com")),
        )
        .await;

    assert!(matches!(outcome, Err(MailError::View(_))));
    assert!(app.outbox.messages().is_empty());
}

#[tokio::test]
async fn messages_without_recipients_are_refused() {
    let app = spawn_app();
    let mailer = app.application.mailer().unwrap();

    let outcome = mailer
        .send(MailMessage::new().text("Hello".try_into().unwrap()))
        .await;

    assert!(matches!(
        outcome,
        Err(MailError::InvalidMessage(MessageError::MissingRecipients))
    ));
    assert!(app.outbox.messages().is_empty());
}
