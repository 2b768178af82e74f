//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check addresses, paths and filter directives parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WebletConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::config::schema::WebletConfig;

/// One rejected setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted key of the offending setting, e.g. `site.private_prefix`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint and report all violations.
pub fn validate_config(config: &WebletConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }

    if config.site.private_prefix.is_empty() {
        errors.push(ValidationError::new("site.private_prefix", "must not be empty"));
    }

    if config.site.template_extensions.is_empty() {
        errors.push(ValidationError::new(
            "site.template_extensions",
            "at least one extension is required",
        ));
    }

    let ws_paths = &config.site.websocket_paths;
    for (index, ws_path) in ws_paths.iter().enumerate() {
        if !ws_path.starts_with('/') || ws_path.contains(['{', '}']) {
            errors.push(ValidationError::new(
                "site.websocket_paths",
                format!("`{ws_path}` must start with '/' and contain no captures"),
            ));
        } else if ws_paths[..index].contains(ws_path) {
            errors.push(ValidationError::new(
                "site.websocket_paths",
                format!("`{ws_path}` is listed more than once"),
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than 0"));
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("`{}` is not a valid filter", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&WebletConfig::default()), Ok(()));
    }

    #[test]
    fn test_all_errors_are_reported() {
        let mut config = WebletConfig::default();
        config.listener.bind_address = "nowhere".to_string();
        config.site.private_prefix.clear();
        config.site.websocket_paths = vec!["ws".to_string()];
        config.timeouts.request_secs = 0;
        config.limits.max_body_bytes = 0;

        let fields: Vec<&str> = validate_config(&config)
            .unwrap_err()
            .iter()
            .map(|err| err.field)
            .collect();
        assert_eq!(
            fields,
            [
                "listener.bind_address",
                "site.private_prefix",
                "site.websocket_paths",
                "timeouts.request_secs",
                "limits.max_body_bytes",
            ]
        );
    }

    #[test]
    fn test_websocket_paths() {
        let mut config = WebletConfig::default();
        config.site.websocket_paths.clear();
        assert!(validate_config(&config).is_ok());

        config.site.websocket_paths = vec!["/ws".to_string(), "/live".to_string()];
        assert!(validate_config(&config).is_ok());

        config.site.websocket_paths = vec!["/ws/{room}".to_string(), String::new()];
        assert_eq!(validate_config(&config).unwrap_err().len(), 2);

        config.site.websocket_paths = vec!["/ws".to_string(), "/ws".to_string()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].message, "`/ws` is listed more than once");
    }
}
