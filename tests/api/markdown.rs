use crate::helpers::{spawn_app, spawn_app_with};
use mailroom::domain::mail::errors::ViewError;
use mailroom::domain::mail::models::view_data::ViewData;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn data(name: &str) -> ViewData {
    ViewData::new()
        .with("name", name)
        .with("app_name", "Mailroom")
}

#[test]
fn welcome_mail_renders_inside_the_bundled_layout() {
    let app = spawn_app();
    let markdown = app.application.markdown().unwrap();

    let html = markdown.render("emails.welcome", &data("Ursula")).unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<h1>Welcome, Ursula!</h1>"));
    assert!(html.contains(".mail-body"));
}

#[test]
fn text_rendering_keeps_the_markdown_source_readable() {
    let app = spawn_app();
    let markdown = app.application.markdown().unwrap();

    let text = markdown
        .render_text("emails.welcome", &data("Tom & Jerry"))
        .unwrap();

    assert!(text.starts_with("# Welcome, Tom & Jerry!"));
    assert!(text.ends_with("the Mailroom team"));
}

#[test]
fn configured_component_paths_override_the_bundled_layout_and_theme() {
    let components = TempDir::new().unwrap();
    write(
        components.path(),
        "html/layout.html",
        "<main><style>{!! style !!}</style>{!! slot !!}</main>",
    );
    write(components.path(), "html/themes/sunset.css", "h1 { color: orange; }");
    write(components.path(), "text/layout.txt", "{!! slot !!}\n--\nSent by {{ app_name }}");
    let app = spawn_app_with(|c| {
        c.mail.markdown.theme = "sunset".into();
        c.mail.markdown.paths = vec![components.path().to_path_buf()];
    });
    let markdown = app.application.markdown().unwrap();

    let html = markdown.render("emails.welcome", &data("Ursula")).unwrap();
    let text = markdown.render_text("emails.welcome", &data("Ursula")).unwrap();

    assert!(html.starts_with("<main><style>h1 { color: orange; }</style><h1>"));
    assert!(text.ends_with("--\nSent by Mailroom"));
}

#[test]
fn an_unknown_theme_is_an_error() {
    let app = spawn_app_with(|c| {
        c.mail.markdown.theme = "neon".into();
    });
    let markdown = app.application.markdown().unwrap();

    let outcome = markdown.render("emails.welcome", &data("Ursula"));

    assert!(matches!(outcome, Err(ViewError::ThemeNotFound(theme)) if theme == "neon"));
}

#[test]
fn a_missing_markdown_view_is_not_found() {
    let app = spawn_app();
    let markdown = app.application.markdown().unwrap();

    let outcome = markdown.render("emails.goodbye", &data("Ursula"));

    assert!(matches!(outcome, Err(ViewError::NotFound { view, .. }) if view == "emails.goodbye"));
}

#[test]
fn theme_changes_on_the_shared_renderer_apply_to_later_renders() {
    let app = spawn_app();
    let markdown = app.application.markdown().unwrap();

    app.application.markdown().unwrap().set_theme("neon");

    assert_eq!(markdown.theme(), "neon");
    assert!(matches!(
        markdown.render("emails.welcome", &data("Ursula")),
        Err(ViewError::ThemeNotFound(_))
    ));
}
