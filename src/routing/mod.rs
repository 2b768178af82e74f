//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     ProgramUnit (declared unit path + method handlers)
//!     pages/**/* (template files on disk)
//!     → path.rs (unit path → URI template + capture names)
//!     → params.rs (handler parameters → roles)
//!     → table.rs (merge by (method, path), reject capture-name conflicts)
//!     → Freeze as immutable RouteTable
//!
//! Incoming Request:
//!     axum matches (method, URI template)
//!     → http::dispatch reads only the sources the route's roles need
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Parameter roles resolved once per route, stored as a closed enum
//! - Program and template discovery commute: merge order never matters
//! - Any configuration problem is fatal before the listener is bound

pub mod method;
pub mod params;
pub mod path;
pub mod program;
pub mod route;
pub mod table;

pub use method::Method;
pub use params::{ParamRole, ParameterBindings, RoleSet};
pub use path::{compile_path, is_private, CompiledPath};
pub use program::{Arguments, Invocation, Output, PageInstance, Program, ProgramUnit};
pub use route::Route;
pub use table::{RouteTable, RouteTableBuilder};

use thiserror::Error;

/// Load-time route configuration errors. Every variant aborts startup.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A path segment cannot be expressed as a URI template part.
    #[error("invalid path segment `{segment}` in `{path}`")]
    InvalidSegment { path: String, segment: String },

    /// The same capture name appears twice in one path.
    #[error("capture `{name}` is declared more than once in `{path}`")]
    DuplicateCapture { path: String, name: String },

    /// A program declares `self` but has no instance type.
    #[error("program for {method} {path} declares `self` but is not bound to an instance type")]
    MissingInstance { method: Method, path: String },

    /// A second program or template was found for an existing route.
    #[error("{method} {path} already has a {kind}")]
    AmbiguousMerge {
        method: Method,
        path: String,
        kind: &'static str,
    },

    /// Two URI templates name the same capture position differently.
    #[error("routes `{first}` and `{second}` capture the same segments under different names")]
    ConflictingRoutes { first: String, second: String },

    /// The pages directory could not be walked.
    #[error("failed to scan pages: {0}")]
    Scan(#[from] walkdir::Error),
}
