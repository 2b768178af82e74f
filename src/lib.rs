//! Convention-based web layer.
//!
//! Program units and pages map onto HTTP routes by their path; packet units
//! map onto named WebSocket messages. Everything is compiled into an
//! immutable [`Site`] at startup and served by [`HttpServer`].

pub mod config;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod packets;
pub mod routing;
pub mod templates;

pub use config::WebletConfig;
pub use handler::{HandlerError, HandlerResult};
pub use http::HttpServer;
pub use lifecycle::{Shutdown, Site, SiteBuilder, StartupError};
pub use packets::{FieldType, PacketArgs, PacketUnit, Schema};
pub use routing::{Arguments, Method, Output, PageInstance, Program, ProgramUnit};
