//! File-system path → URI template compilation.
//!
//! # Responsibilities
//! - Turn a unit path relative to its root into a URI template
//! - Collapse `index` stems into a trailing slash
//! - Rewrite `(name)` segments into `{name}` captures
//! - Decide whether a unit is private
//!
//! # Examples
//! ```text
//! index               → /
//! blog/index          → /blog/
//! blog/(slug)/view    → /blog/{slug}/view
//! (id)/index          → /{id}/
//! ```

use std::path::{Component, Path};

use crate::routing::RouteError;

/// Stem that maps to a directory's trailing slash.
pub const INDEX_STEM: &str = "index";

/// A compiled URI template with the capture names it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPath {
    template: String,
    captures: Vec<String>,
}

impl CompiledPath {
    /// The `{name}`-delimited template handed to the HTTP matcher.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Capture names in path order.
    pub fn captures(&self) -> &[String] {
        &self.captures
    }
}

/// Compile a unit path (directories + stem) into a URI template.
pub fn compile_path(relative: &Path) -> Result<CompiledPath, RouteError> {
    let mut segments = parent_segments(relative)?;
    let stem = relative
        .file_stem()
        .map(|stem| utf8(relative, stem.to_str()))
        .transpose()?
        .unwrap_or_default();

    if stem == INDEX_STEM {
        segments.push("");
    } else {
        segments.push(stem);
    }

    compile_segments(&display(relative), segments)
}

/// Compile only the directory part of a path.
///
/// Used by method-named pages such as `blog/get.html`, which target the
/// route of the directory that contains them.
pub fn compile_parent(relative: &Path) -> Result<CompiledPath, RouteError> {
    let segments = parent_segments(relative)?;
    compile_segments(&display(relative), segments)
}

/// Whether any component of `relative` starts with the private prefix.
///
/// The rule is transitive: a file inside a private directory is private.
pub fn is_private(relative: &Path, prefix: &str) -> bool {
    relative.components().any(|component| match component {
        Component::Normal(name) => name.to_string_lossy().starts_with(prefix),
        _ => false,
    })
}

fn parent_segments(relative: &Path) -> Result<Vec<&str>, RouteError> {
    let Some(parent) = relative.parent() else {
        return Ok(Vec::new());
    };

    parent
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(utf8(relative, name.to_str())),
            _ => None,
        })
        .collect()
}

fn compile_segments(source: &str, segments: Vec<&str>) -> Result<CompiledPath, RouteError> {
    let mut parts = Vec::with_capacity(segments.len());
    let mut captures: Vec<String> = Vec::new();

    for segment in segments {
        match capture_name(segment) {
            Some(name) => {
                if !is_capture_name(name) {
                    return Err(invalid(source, segment));
                }
                if captures.iter().any(|existing| existing == name) {
                    return Err(RouteError::DuplicateCapture {
                        path: source.to_string(),
                        name: name.to_string(),
                    });
                }
                captures.push(name.to_string());
                parts.push(format!("{{{name}}}"));
            }
            None => {
                if segment.contains(['{', '}']) {
                    return Err(invalid(source, segment));
                }
                parts.push(segment.to_string());
            }
        }
    }

    Ok(CompiledPath {
        template: format!("/{}", parts.join("/")),
        captures,
    })
}

fn capture_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('(')?.strip_suffix(')')
}

/// Capture names are identifiers. Anything else (notably a leading `*`)
/// would change how the matcher reads the segment.
fn is_capture_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn utf8<'a>(relative: &Path, value: Option<&'a str>) -> Result<&'a str, RouteError> {
    value.ok_or_else(|| invalid(&display(relative), "<non-utf8>"))
}

fn invalid(path: &str, segment: &str) -> RouteError {
    RouteError::InvalidSegment {
        path: path.to_string(),
        segment: segment.to_string(),
    }
}

fn display(relative: &Path) -> String {
    relative.to_string_lossy().replace('\\', "/")
}
