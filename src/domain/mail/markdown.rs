use super::{errors::ViewError, models::view_data::ViewData, ports::ViewRenderer};
use pulldown_cmark::{html, Options, Parser};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

const MAIL_NAMESPACE: &str = "mail";
const LAYOUT_VIEW: &str = "mail::layout";
const DEFAULT_THEME: &str = "default";

const BUILT_IN_HTML_LAYOUT: &str = include_str!("../../../resources/views/mail/html/layout.html");
const BUILT_IN_TEXT_LAYOUT: &str = include_str!("../../../resources/views/mail/text/layout.txt");
const BUILT_IN_DEFAULT_THEME: &str =
    include_str!("../../../resources/views/mail/html/themes/default.css");

#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    pub theme: String,
    pub paths: Vec<PathBuf>,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.into(),
            paths: Vec::new(),
        }
    }
}

/// Turns markdown views into themed HTML and plain text mail bodies.
///
/// Component lookups (`mail::layout`, `themes/{theme}.css`) go through the
/// configured paths first, `{path}/html` for HTML and `{path}/text` for text,
/// and fall back to the layout and `default` theme bundled with the crate.
pub struct Markdown {
    views: Arc<dyn ViewRenderer>,
    theme: RwLock<String>,
    paths: Vec<PathBuf>,
}

impl Markdown {
    pub fn new(views: Arc<dyn ViewRenderer>, options: MarkdownOptions) -> Self {
        Self {
            views,
            theme: RwLock::new(options.theme),
            paths: options.paths,
        }
    }

    #[tracing::instrument(name = "Render markdown mail", skip(self, data))]
    pub fn render(&self, view: &str, data: &ViewData) -> Result<String, ViewError> {
        let html_paths = self.html_component_paths();
        let contents = self
            .views
            .render_with_namespace(view, data, MAIL_NAMESPACE, &html_paths)?;

        let layout_data = data
            .clone()
            .with("slot", Self::parse(&contents))
            .with("style", self.theme_css(&html_paths)?);
        self.render_layout(&layout_data, &html_paths, BUILT_IN_HTML_LAYOUT)
    }

    #[tracing::instrument(name = "Render markdown mail as text", skip(self, data))]
    pub fn render_text(&self, view: &str, data: &ViewData) -> Result<String, ViewError> {
        let text_paths = self.text_component_paths();
        let contents = self
            .views
            .render_with_namespace(view, data, MAIL_NAMESPACE, &text_paths)?;

        let layout_data = data.clone().with("slot", contents);
        let rendered = self.render_layout(&layout_data, &text_paths, BUILT_IN_TEXT_LAYOUT)?;
        Ok(normalize_text(&rendered))
    }

    pub fn parse(text: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        let parser = Parser::new_ext(text, options);
        let mut rendered = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut rendered, parser);
        rendered
    }

    pub fn theme(&self) -> String {
        self.theme.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Switches the theme of every later render, shared instances included.
    pub fn set_theme(&self, theme: impl Into<String>) {
        *self.theme.write().unwrap_or_else(|e| e.into_inner()) = theme.into();
    }

    pub fn component_paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn html_component_paths(&self) -> Vec<PathBuf> {
        self.paths.iter().map(|p| p.join("html")).collect()
    }

    pub fn text_component_paths(&self) -> Vec<PathBuf> {
        self.paths.iter().map(|p| p.join("text")).collect()
    }

    fn render_layout(
        &self,
        data: &ViewData,
        paths: &[PathBuf],
        built_in: &str,
    ) -> Result<String, ViewError> {
        match self
            .views
            .render_with_namespace(LAYOUT_VIEW, data, MAIL_NAMESPACE, paths)
        {
            Err(ViewError::NotFound { .. }) => Ok(data.interpolate(built_in)),
            rendered => rendered,
        }
    }

    fn theme_css(&self, html_paths: &[PathBuf]) -> Result<String, ViewError> {
        let theme = self.theme();
        let file_name = format!("{}.css", theme);
        for path in html_paths {
            let candidate = path.join("themes").join(&file_name);
            if candidate.is_file() {
                return read(&candidate);
            }
        }
        if theme == DEFAULT_THEME {
            Ok(BUILT_IN_DEFAULT_THEME.to_string())
        } else {
            Err(ViewError::ThemeNotFound(theme))
        }
    }
}

impl std::fmt::Debug for Markdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Markdown")
            .field("theme", &self.theme())
            .field("paths", &self.paths)
            .finish()
    }
}

fn read(path: &Path) -> Result<String, ViewError> {
    std::fs::read_to_string(path).map_err(|source| ViewError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Strips markup, decodes the common entities and squeezes runs of blank
/// lines down to one.
fn normalize_text(text: &str) -> String {
    let decoded = decode_entities(&strip_tags(text));

    let mut normalized = String::with_capacity(decoded.len());
    let mut blank_run = 0;
    for line in decoded.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        normalized.push_str(line);
        normalized.push('\n');
    }
    normalized.trim().to_string()
}

/// Removes element tags, comments and declarations. Autolinks keep their
/// target, any other `<` is plain text.
fn strip_tags(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        stripped.push_str(&rest[..start]);
        let candidate = &rest[start..];
        if let Some(len) = markup_len(candidate) {
            rest = &candidate[len..];
        } else if let Some(target) = autolink_target(candidate) {
            stripped.push_str(target);
            rest = &candidate[target.len() + 2..];
        } else {
            stripped.push('<');
            rest = &candidate[1..];
        }
    }
    stripped.push_str(rest);
    stripped
}

/// Length of the tag, comment or declaration `s` starts with.
fn markup_len(s: &str) -> Option<usize> {
    if let Some(comment) = s.strip_prefix("<!--") {
        return comment.find("-->").map(|end| end + 7);
    }
    let bytes = s.as_bytes();
    if s.starts_with("<!") {
        return match bytes.get(2) {
            Some(b) if b.is_ascii_alphabetic() => s.find('>').map(|end| end + 1),
            _ => None,
        };
    }

    let mut i = 1;
    if bytes.get(i) == Some(&b'/') {
        i += 1;
    }
    if !bytes.get(i).map_or(false, u8::is_ascii_alphabetic) {
        return None;
    }
    while bytes
        .get(i)
        .map_or(false, |b| b.is_ascii_alphanumeric() || *b == b'-')
    {
        i += 1;
    }

    loop {
        let next = skip_whitespace(bytes, i);
        match bytes.get(next) {
            Some(b'>') => return Some(next + 1),
            Some(b'/') if bytes.get(next + 1) == Some(&b'>') => return Some(next + 2),
            Some(_) if next > i => i = attribute_end(bytes, next)?,
            _ => return None,
        }
    }
}

/// End of a `name=value` attribute starting at `start`. Bare attribute
/// names are not accepted, so prose such as `a<b and c>d` is not a tag.
fn attribute_end(bytes: &[u8], start: usize) -> Option<usize> {
    let is_name_start = |b: &u8| b.is_ascii_alphabetic() || *b == b'_' || *b == b':';
    let is_name = |b: &u8| b.is_ascii_alphanumeric() || matches!(b, b'_' | b':' | b'.' | b'-');

    if !bytes.get(start).map_or(false, is_name_start) {
        return None;
    }
    let mut i = start + 1;
    while bytes.get(i).map_or(false, is_name) {
        i += 1;
    }

    i = skip_whitespace(bytes, i);
    if bytes.get(i) != Some(&b'=') {
        return None;
    }
    i = skip_whitespace(bytes, i + 1);

    match bytes.get(i) {
        Some(&quote) if quote == b'"' || quote == b'\'' => bytes[i + 1..]
            .iter()
            .position(|b| *b == quote)
            .map(|end| i + end + 2),
        Some(_) => {
            let value_start = i;
            while bytes.get(i).map_or(false, |b| {
                !b.is_ascii_whitespace() && !matches!(b, b'"' | b'\'' | b'=' | b'<' | b'>' | b'`')
            }) {
                i += 1;
            }
            (i > value_start).then(|| i)
        }
        None => None,
    }
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).map_or(false, u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

/// Target of an autolink such as `<https://example.com>`.
fn autolink_target(s: &str) -> Option<&str> {
    let end = s.find('>')?;
    let target = &s[1..end];
    let (scheme, rest) = target.split_once(':')?;
    let valid_scheme = scheme.len() >= 2
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'));
    let valid_rest = !rest.is_empty() && !rest.contains(|c: char| c.is_whitespace() || c == '<');
    (valid_scheme && valid_rest).then(|| target)
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
