//! Wire envelope: `["dotted.packet.name", {"arg": value, ...}]`.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::handler::json_type;

/// A structurally valid inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// Why an inbound message is not a valid envelope.
///
/// JSON object keys are always strings once decoded, so argument keys need
/// no separate check.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    #[error("the packet should be a list [packet name, {{arg1: whatever, ...}}]")]
    NotAList,

    #[error(
        "two (2) elements should be included in the list: the packet name (as a string) \
         and the arguments (as a dictionary)"
    )]
    WrongLength,

    #[error("the first element should be a string, but {0} received")]
    NameNotString(&'static str),

    #[error("the second element should be a dictionary, but {0} received")]
    ArgumentsNotDictionary(&'static str),
}

impl Envelope {
    /// Parse and check one text frame.
    pub fn parse(message: &str) -> Result<Self, EnvelopeError> {
        let Value::Array(items) = serde_json::from_str::<Value>(message)? else {
            return Err(EnvelopeError::NotAList);
        };

        let Ok([name, arguments]) = <[Value; 2]>::try_from(items) else {
            return Err(EnvelopeError::WrongLength);
        };

        let Value::String(name) = name else {
            return Err(EnvelopeError::NameNotString(json_type(&name)));
        };

        let Value::Object(arguments) = arguments else {
            return Err(EnvelopeError::ArgumentsNotDictionary(json_type(&arguments)));
        };

        Ok(Self { name, arguments })
    }
}
