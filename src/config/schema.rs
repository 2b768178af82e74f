//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::routing::table::DEFAULT_TEMPLATE_EXTENSIONS;

/// Root configuration for a weblet site.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WebletConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Site layout on disk.
    pub site: SiteConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Where the site lives and how its files are interpreted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root of the site; relative directories below are resolved against it.
    pub base_dir: PathBuf,

    /// Page templates, relative to `base_dir`.
    pub pages_dir: PathBuf,

    /// Files and directories starting with this prefix are never routed.
    pub private_prefix: String,

    /// File extensions treated as page templates.
    pub template_extensions: Vec<String>,

    /// WebSocket entrypoints. An empty list disables the endpoint.
    pub websocket_paths: Vec<String>,
}

impl SiteConfig {
    pub fn pages_root(&self) -> PathBuf {
        self.base_dir.join(&self.pages_dir)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            pages_dir: PathBuf::from("pages"),
            private_prefix: "_".to_string(),
            template_extensions: DEFAULT_TEMPLATE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            websocket_paths: vec!["/ws".to_string()],
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
