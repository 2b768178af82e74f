//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router built from the RouteTable, middleware)
//!     → dispatch.rs (bind arguments, run program, render template)
//!     → request.rs (request snapshot, query/form decoding)
//!     → HTML response
//!
//! WebSocket upgrade at the configured path
//!     → websocket.rs (read loop)
//!     → packets::PacketDispatcher
//! ```

pub mod dispatch;
pub mod request;
pub mod server;
pub mod websocket;

pub use dispatch::{DispatchError, HttpDispatcher};
pub use request::RequestContext;
pub use server::HttpServer;
