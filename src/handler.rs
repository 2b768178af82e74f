//! Types shared by program and packet handlers.
//!
//! # Design Decisions
//! - Handlers are type-erased behind `Arc<dyn Fn>` returning boxed futures
//! - User code reports failures through a single error type
//! - Handler errors are never recovered here; dispatch engines decide

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Boxed, sendable future returned by erased handlers.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Error raised inside user-supplied handler code.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Plain failure message.
    #[error("{0}")]
    Message(String),

    /// A required argument was not bound.
    #[error("missing argument `{0}`")]
    MissingArgument(String),

    /// A class program received an instance of the wrong type.
    #[error("program instance has an unexpected type")]
    InstanceMismatch,

    /// Any other error produced by user code.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    /// Create an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

/// Result type for handler invocations.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// JSON type name used in user-facing error messages.
pub(crate) fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "dictionary",
    }
}
