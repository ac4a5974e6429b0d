use crate::domain::mail::{
    errors::ViewError, models::view_data::ViewData, ports::ViewRenderer,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

const NAMESPACE_DELIMITER: &str = "::";
const EXTENSIONS: [&str; 3] = ["md", "html", "txt"];

/// File backed views.
///
/// `emails.welcome` resolves to `emails/welcome.{md,html,txt}` under each
/// view path in order; `mail::layout` resolves under the hint paths
/// registered for the `mail` namespace.
#[derive(Debug)]
pub struct ViewFactory {
    paths: Vec<PathBuf>,
    hints: RwLock<HashMap<String, Vec<PathBuf>>>,
}

impl ViewFactory {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            hints: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_namespace(&self, namespace: &str, path: impl Into<PathBuf>) {
        let mut hints = self.hints.write().unwrap_or_else(|e| e.into_inner());
        hints
            .entry(namespace.to_string())
            .or_default()
            .push(path.into());
    }

    pub fn replace_namespace(&self, namespace: &str, paths: Vec<PathBuf>) {
        let mut hints = self.hints.write().unwrap_or_else(|e| e.into_inner());
        hints.insert(namespace.to_string(), paths);
    }

    fn find(&self, view: &str, hint: Option<(&str, &[PathBuf])>) -> Result<PathBuf, ViewError> {
        let (namespace, relative) = parse_name(view)?;

        let search_paths: Vec<PathBuf> = match namespace {
            None => self.paths.clone(),
            Some(ns) => match hint {
                Some((hinted, paths)) if hinted == ns => paths.to_vec(),
                _ => {
                    let hints = self.hints.read().unwrap_or_else(|e| e.into_inner());
                    hints
                        .get(ns)
                        .cloned()
                        .ok_or_else(|| ViewError::UnknownNamespace(ns.to_string()))?
                }
            },
        };

        let mut searched = Vec::with_capacity(search_paths.len() * EXTENSIONS.len());
        for base in &search_paths {
            for extension in EXTENSIONS {
                let candidate = base.join(&relative).with_extension(extension);
                if candidate.is_file() {
                    return Ok(candidate);
                }
                searched.push(candidate);
            }
        }
        Err(ViewError::NotFound {
            view: view.to_string(),
            searched,
        })
    }

    fn render_file(&self, path: &Path, data: &ViewData) -> Result<String, ViewError> {
        let source = fs::read_to_string(path).map_err(|source| ViewError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(data.interpolate(&source))
    }
}

impl ViewRenderer for ViewFactory {
    fn render(&self, view: &str, data: &ViewData) -> Result<String, ViewError> {
        let path = self.find(view, None)?;
        self.render_file(&path, data)
    }

    fn render_with_namespace(
        &self,
        view: &str,
        data: &ViewData,
        namespace: &str,
        paths: &[PathBuf],
    ) -> Result<String, ViewError> {
        let path = self.find(view, Some((namespace, paths)))?;
        self.render_file(&path, data)
    }

    fn exists(&self, view: &str) -> bool {
        self.find(view, None).is_ok()
    }
}

fn parse_name(view: &str) -> Result<(Option<&str>, PathBuf), ViewError> {
    let (namespace, name) = match view.split_once(NAMESPACE_DELIMITER) {
        Some((ns, name)) if !ns.is_empty() => (Some(ns), name),
        Some(_) => return Err(ViewError::InvalidName(view.to_string())),
        None => (None, view),
    };

    let mut relative = PathBuf::new();
    for segment in name.split('.') {
        let valid = !segment.is_empty()
            && segment != ".."
            && !segment.contains(['/', '\\', ':'])
            && !segment.starts_with('.');
        if !valid {
            return Err(ViewError::InvalidName(view.to_string()));
        }
        relative.push(segment);
    }
    Ok((namespace, relative))
}
