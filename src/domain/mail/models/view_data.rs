use std::collections::BTreeMap;

const ESCAPED_OPEN: &str = "{{";
const ESCAPED_CLOSE: &str = "}}";
const RAW_OPEN: &str = "{!!";
const RAW_CLOSE: &str = "!!}";

/// Values available to a view while it renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewData(BTreeMap<String, String>);

impl ViewData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Substitutes `{{ key }}` with the HTML-escaped value and `{!! key !!}`
    /// with the raw value. Unknown keys render as nothing; a tag missing its
    /// closing delimiter is copied through unchanged.
    pub fn interpolate(&self, template: &str) -> String {
        let mut rendered = String::with_capacity(template.len());
        let mut rest = template;

        while let Some((start, open, close, escape)) = next_tag(rest) {
            rendered.push_str(&rest[..start]);
            let after_open = &rest[start + open.len()..];
            match after_open.find(close) {
                Some(end) => {
                    let key = after_open[..end].trim();
                    match self.get(key) {
                        Some(value) if escape => rendered.push_str(&escape_html(value)),
                        Some(value) => rendered.push_str(value),
                        None => tracing::debug!(key, "View references an unknown value"),
                    }
                    rest = &after_open[end + close.len()..];
                }
                None => {
                    rendered.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        rendered.push_str(rest);
        rendered
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ViewData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn next_tag(s: &str) -> Option<(usize, &'static str, &'static str, bool)> {
    let escaped = s.find(ESCAPED_OPEN);
    let raw = s.find(RAW_OPEN);
    match (escaped, raw) {
        (Some(e), Some(r)) if r < e => Some((r, RAW_OPEN, RAW_CLOSE, false)),
        (Some(e), _) => Some((e, ESCAPED_OPEN, ESCAPED_CLOSE, true)),
        (None, Some(r)) => Some((r, RAW_OPEN, RAW_CLOSE, false)),
        (None, None) => None,
    }
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
