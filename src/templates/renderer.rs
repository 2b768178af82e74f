//! minijinja-backed renderer for the pages directory.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::SystemTime;

use minijinja::{path_loader, Environment, ErrorKind};
use serde_json::{Map, Value};

use crate::templates::{Renderer, TemplateError};

/// Renders templates stored under a pages root.
pub struct PagesRenderer {
    root: PathBuf,
    env: RwLock<Environment<'static>>,
    modified: Mutex<HashMap<String, SystemTime>>,
}

impl PagesRenderer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut env = Environment::new();
        env.set_loader(path_loader(root.clone()));

        Self {
            root,
            env: RwLock::new(env),
            modified: Mutex::new(HashMap::new()),
        }
    }

    /// Record `name`'s mtime; true when it changed since the last render.
    fn is_stale(&self, name: &str, mtime: SystemTime) -> bool {
        let mut modified = self.modified.lock().unwrap_or_else(PoisonError::into_inner);
        modified
            .insert(name.to_string(), mtime)
            .is_some_and(|previous| previous != mtime)
    }
}

impl Renderer for PagesRenderer {
    fn render(&self, name: &str, variables: &Map<String, Value>) -> Result<String, TemplateError> {
        let mtime = fs::metadata(self.root.join(name))
            .and_then(|meta| meta.modified())
            .map_err(|_| TemplateError::NotFound(name.to_string()))?;

        if self.is_stale(name, mtime) {
            tracing::debug!(template = %name, "Template modified, clearing cache");
            self.env
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .clear_templates();
        }

        let env = self.env.read().unwrap_or_else(PoisonError::into_inner);
        let template = env.get_template(name).map_err(|err| match err.kind() {
            ErrorKind::TemplateNotFound => TemplateError::NotFound(name.to_string()),
            _ => TemplateError::Render {
                name: name.to_string(),
                source: err,
            },
        })?;

        template.render(variables).map_err(|source| TemplateError::Render {
            name: name.to_string(),
            source,
        })
    }
}
