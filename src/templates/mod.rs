//! Page template rendering.
//!
//! # Data Flow
//! ```text
//! route.template (name relative to pages/)
//!     + program Output::Context (variables)
//!     → Renderer::render
//!     → HTML body
//! ```
//!
//! # Design Decisions
//! - Rendering sits behind a trait; dispatch never sees the engine
//! - A missing template is its own error, surfaced like a handler failure
//! - Compiled templates are dropped when a rendered file's mtime changes

pub mod renderer;

pub use renderer::PagesRenderer;

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors produced while rendering a page.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template with this name exists under the pages root.
    #[error("template not found: {0}")]
    NotFound(String),

    /// The engine failed to compile or evaluate the template.
    #[error("failed to render {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Renders a named template with a mapping of variables.
pub trait Renderer: Send + Sync {
    fn render(&self, name: &str, variables: &Map<String, Value>) -> Result<String, TemplateError>;
}
