//! Route table construction.
//!
//! # Responsibilities
//! - Turn program units into program routes
//! - Walk the pages root and attach templates to routes
//! - Merge program and template discovered for the same (method, path)
//! - Reject tables the HTTP matcher could not mount
//!
//! # Design Decisions
//! - Keyed by (method, template) in a sorted map: listing order is stable
//!   no matter what order files were discovered in
//! - Page stems named after a method target the parent directory's route;
//!   any other page serves GET and POST at its own path
//! - Private files and directories are skipped at every depth

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};

use walkdir::WalkDir;

use crate::routing::path::{compile_parent, compile_path, is_private};
use crate::routing::{CompiledPath, Method, Program, ProgramUnit, Route, RouteError};

/// Extensions recognised as page templates by default.
pub const DEFAULT_TEMPLATE_EXTENSIONS: [&str; 4] = ["html", "htm", "jinja", "j2"];

type RouteKey = (Method, String);

/// Immutable set of routes, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<RouteKey, Route>,
}

impl RouteTable {
    pub fn get(&self, method: Method, path: &str) -> Option<&Route> {
        self.routes.get(&(method, path.to_string()))
    }

    /// Routes in (method, path) order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    /// Routes grouped by URI template, for mounting one path at a time.
    pub fn by_path(&self) -> BTreeMap<&str, Vec<&Route>> {
        let mut grouped: BTreeMap<&str, Vec<&Route>> = BTreeMap::new();
        for route in self.routes.values() {
            grouped.entry(route.path()).or_default().push(route);
        }
        grouped
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Display for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for route in self.routes.values() {
            write!(f, "{:<8}{}", route.method().as_str(), route.path())?;
            if let Some(program) = route.program() {
                let params: Vec<String> = route
                    .bindings()
                    .iter()
                    .map(|(name, role)| format!("{name}:{role}"))
                    .collect();
                write!(f, "  program({})", params.join(", "))?;
                if program.has_instance() {
                    f.write_str(" [instance]")?;
                }
            }
            if let Some(template) = route.template() {
                write!(f, "  template={template}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Collects program units and page templates into a [`RouteTable`].
#[derive(Debug)]
pub struct RouteTableBuilder {
    private_prefix: String,
    extensions: Vec<String>,
    routes: BTreeMap<RouteKey, Route>,
}

impl RouteTableBuilder {
    pub fn new(private_prefix: impl Into<String>) -> Self {
        Self {
            private_prefix: private_prefix.into(),
            extensions: DEFAULT_TEMPLATE_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            routes: BTreeMap::new(),
        }
    }

    /// Replace the set of file extensions treated as page templates.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Register every method handler a program unit exports.
    pub fn add_unit(&mut self, unit: ProgramUnit) -> Result<(), RouteError> {
        if is_private(unit.path(), &self.private_prefix) {
            tracing::debug!(unit = %unit.path().display(), "Skipping private program unit");
            return Ok(());
        }

        let path = compile_path(unit.path())?;
        for (method, program) in unit.programs() {
            self.add_program(method, path.clone(), program.clone())?;
        }
        Ok(())
    }

    /// Register one program, merging into an existing template route.
    pub fn add_program(&mut self, method: Method, path: CompiledPath, program: Program) -> Result<(), RouteError> {
        tracing::debug!(method = %method, path = %path.template(), "Registering program");
        let key = (method, path.template().to_string());
        match self.routes.get_mut(&key) {
            Some(route) => route.attach_program(program)?,
            None => {
                let route = Route::with_program(method, path, program)?;
                self.routes.insert(key, route);
            }
        }
        Ok(())
    }

    /// Walk the pages root and register every eligible template.
    ///
    /// A missing root registers nothing. Returns the number of pages found.
    pub fn scan_pages(&mut self, root: &Path) -> Result<usize, RouteError> {
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "No pages directory");
            return Ok(0);
        }

        let prefix = self.private_prefix.clone();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with(prefix.as_str())
            });

        let mut count = 0;
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            if !self.is_template(relative) {
                continue;
            }
            self.add_page(relative)?;
            count += 1;
        }

        Ok(count)
    }

    /// Register one page, given its path relative to the pages root.
    pub fn add_page(&mut self, relative: &Path) -> Result<(), RouteError> {
        if is_private(relative, &self.private_prefix) {
            tracing::debug!(page = %relative.display(), "Skipping private page");
            return Ok(());
        }

        let name = template_name(relative);
        let stem = relative.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default();

        match stem.parse::<Method>() {
            Ok(method) => {
                let path = compile_parent(relative)?;
                self.add_template(method, path, name)
            }
            Err(_) => {
                let path = compile_path(relative)?;
                for method in Method::PAGE_DEFAULTS {
                    self.add_template(method, path.clone(), name.clone())?;
                }
                Ok(())
            }
        }
    }

    fn add_template(&mut self, method: Method, path: CompiledPath, name: String) -> Result<(), RouteError> {
        tracing::debug!(method = %method, path = %path.template(), template = %name, "Registering template");
        let key = (method, path.template().to_string());
        match self.routes.get_mut(&key) {
            Some(route) => route.attach_template(name)?,
            None => {
                self.routes.insert(key, Route::with_template(method, path, name));
            }
        }
        Ok(())
    }

    fn is_template(&self, relative: &Path) -> bool {
        relative
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
    }

    /// Freeze the table, rejecting templates the matcher cannot mount together.
    pub fn build(self) -> Result<RouteTable, RouteError> {
        let mut root = SegmentNode::default();
        for route in self.routes.values() {
            root.insert(route.path())?;
        }

        Ok(RouteTable { routes: self.routes })
    }
}

/// One level of the URI template tree.
///
/// The matcher keeps a single capture child per node, so every template
/// reaching a node must use the same name at a capture position.
#[derive(Default)]
struct SegmentNode {
    statics: BTreeMap<String, SegmentNode>,
    capture: Option<CaptureChild>,
}

struct CaptureChild {
    name: String,
    first: String,
    node: Box<SegmentNode>,
}

impl SegmentNode {
    fn insert(&mut self, template: &str) -> Result<(), RouteError> {
        let mut node = self;
        for segment in template.split('/').skip(1) {
            node = match segment.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
                Some(name) => {
                    let child = node.capture.get_or_insert_with(|| CaptureChild {
                        name: name.to_string(),
                        first: template.to_string(),
                        node: Box::default(),
                    });
                    if child.name != name {
                        return Err(RouteError::ConflictingRoutes {
                            first: child.first.clone(),
                            second: template.to_string(),
                        });
                    }
                    child.node.as_mut()
                }
                None => node.statics.entry(segment.to_string()).or_default(),
            };
        }
        Ok(())
    }
}

/// Template name: the page's relative path with `/` separators.
fn template_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
