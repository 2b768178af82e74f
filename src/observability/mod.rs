//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (load summary, registrations, protocol and handler errors)
//!     → tower-http TraceLayer spans per HTTP request, tagged with x-request-id
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - `RUST_LOG` always wins over the configured level

pub mod logging;

pub use logging::init_logging;
