//! Request snapshot and form decoding.
//!
//! # Responsibilities
//! - Capture the parts of a request a program may inspect
//! - Decode query strings and form bodies
//!
//! # Design Decisions
//! - The snapshot is shared (`Arc`) between arguments and instances
//! - First value wins for repeated keys

use std::collections::HashMap;

use axum::http::{request::Parts, HeaderMap, Method, Uri};

/// Read-only view of the request handed to programs.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: HashMap<String, String>,
}

impl RequestContext {
    pub(crate) fn from_parts(parts: &Parts, path_params: HashMap<String, String>) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            path_params,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Value matched by a `{name}` segment, when the route reads path values.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Decoded query string.
    pub fn query(&self) -> HashMap<String, String> {
        decode_form(self.uri.query().unwrap_or_default().as_bytes())
    }

    #[cfg(test)]
    pub(crate) fn for_tests(uri: &str) -> Self {
        Self {
            method: Method::GET,
            uri: uri.parse().unwrap_or_default(),
            headers: HeaderMap::new(),
            path_params: HashMap::new(),
        }
    }
}

/// Decode `key=value&...` pairs, keeping the first value of each key.
pub fn decode_form(input: &[u8]) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        values
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    values
}
