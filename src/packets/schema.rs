//! Declared argument schemas for packets.
//!
//! Each packet states the arguments it accepts. A field without a default
//! is required; a field with a default is filled in when absent. Fields
//! typed [`FieldType::Any`] accept every JSON value unchecked.
//!
//! ```
//! use serde_json::json;
//! use weblet::packets::{FieldType, Schema};
//!
//! let schema = Schema::new()
//!     .required("text", FieldType::String)
//!     .optional("times", FieldType::Integer, json!(1));
//!
//! let args = schema.validate(json!({"text": "hi"}).as_object().unwrap()).unwrap();
//! assert_eq!(args.get::<i64>("times").unwrap(), 1);
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::handler::{json_type, HandlerError, HandlerResult};

/// JSON type a field must hold.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Any value, unchecked.
    Any,
    Boolean,
    /// A number without a fractional part.
    Integer,
    /// Any number.
    Number,
    String,
    List,
    Dictionary,
    /// The inner type, or `null`.
    Nullable(Box<FieldType>),
}

impl FieldType {
    pub fn nullable(inner: FieldType) -> Self {
        FieldType::Nullable(Box::new(inner))
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Any => true,
            FieldType::Boolean => value.is_boolean(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::String => value.is_string(),
            FieldType::List => value.is_array(),
            FieldType::Dictionary => value.is_object(),
            FieldType::Nullable(inner) => value.is_null() || inner.accepts(value),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Any => f.write_str("any"),
            FieldType::Boolean => f.write_str("boolean"),
            FieldType::Integer => f.write_str("integer"),
            FieldType::Number => f.write_str("number"),
            FieldType::String => f.write_str("string"),
            FieldType::List => f.write_str("list"),
            FieldType::Dictionary => f.write_str("dictionary"),
            FieldType::Nullable(inner) => write!(f, "{inner} or null"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Field {
    name: String,
    kind: FieldType,
    default: Option<Value>,
}

/// Ordered list of declared packet arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field that must be present.
    pub fn required(self, name: impl Into<String>, kind: FieldType) -> Self {
        self.field(name.into(), kind, None)
    }

    /// Declare a field that takes `default` when absent.
    pub fn optional(self, name: impl Into<String>, kind: FieldType, default: Value) -> Self {
        self.field(name.into(), kind, Some(default))
    }

    fn field(mut self, name: String, kind: FieldType, default: Option<Value>) -> Self {
        self.fields.retain(|field| field.name != name);
        self.fields.push(Field { name, kind, default });
        self
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    /// Check `arguments` and produce the validated set.
    ///
    /// Undeclared keys are dropped. Every failing field is reported.
    pub fn validate(&self, arguments: &Map<String, Value>) -> Result<PacketArgs, ValidationErrors> {
        let mut values = Map::new();
        let mut errors = Vec::new();

        for field in &self.fields {
            match (arguments.get(&field.name), &field.default) {
                (Some(value), _) if field.kind.accepts(value) => {
                    values.insert(field.name.clone(), value.clone());
                }
                (Some(value), _) => errors.push(FieldError {
                    field: field.name.clone(),
                    reason: format!("expected {}, got {}", field.kind, json_type(value)),
                }),
                (None, Some(default)) => {
                    values.insert(field.name.clone(), default.clone());
                }
                (None, None) => errors.push(FieldError {
                    field: field.name.clone(),
                    reason: "field required".to_string(),
                }),
            }
        }

        if errors.is_empty() {
            Ok(PacketArgs(values))
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

/// All fields that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.0.len();
        write!(
            f,
            "{count} validation error{}: ",
            if count == 1 { "" } else { "s" }
        )?;
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validated packet arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PacketArgs(Map<String, Value>);

impl PacketArgs {
    /// Raw value of one argument.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Deserialize one argument.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> HandlerResult<T> {
        let value = self
            .0
            .get(name)
            .cloned()
            .ok_or_else(|| HandlerError::MissingArgument(name.to_string()))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Deserialize every argument into one struct.
    pub fn parse<T: DeserializeOwned>(&self) -> HandlerResult<T> {
        Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}
