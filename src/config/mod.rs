//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! weblet.toml
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → WebletConfig (validated, immutable)
//!     → SiteBuilder and HttpServer
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig, SiteConfig, TimeoutConfig,
    WebletConfig,
};
pub use validation::{validate_config, ValidationError};
