//! Handler parameter classification.
//!
//! # Responsibilities
//! - Assign each declared parameter the source its value comes from
//! - Record which sources a route needs at all
//!
//! # Design Decisions
//! - Roles are resolved once when a route is built and never change
//! - Declaration order is preserved for logging and listing
//! - `self` without an instance type is a configuration error

use std::fmt;

use crate::routing::{Method, RouteError};

/// Parameter name bound to the per-request program instance.
pub const SELF_TOKEN: &str = "self";

/// Parameter name bound to the request snapshot.
pub const REQUEST_TOKEN: &str = "request";

/// Where a handler parameter takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamRole {
    /// The per-request program instance.
    Instance,
    /// The request snapshot itself.
    Request,
    /// A `{name}` segment of the route's URI template.
    DynamicPath,
    /// The URL query string.
    Query,
    /// The query string, falling back to the form body.
    QueryOrPost,
}

impl ParamRole {
    fn bit(self) -> u8 {
        match self {
            ParamRole::Instance => 1,
            ParamRole::Request => 1 << 1,
            ParamRole::DynamicPath => 1 << 2,
            ParamRole::Query => 1 << 3,
            ParamRole::QueryOrPost => 1 << 4,
        }
    }
}

impl fmt::Display for ParamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamRole::Instance => "instance",
            ParamRole::Request => "request",
            ParamRole::DynamicPath => "path",
            ParamRole::Query => "query",
            ParamRole::QueryOrPost => "query-or-post",
        })
    }
}

/// Distinct set of roles present on a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleSet(u8);

impl RoleSet {
    pub fn insert(&mut self, role: ParamRole) {
        self.0 |= role.bit();
    }

    pub fn contains(self, role: ParamRole) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the query string has to be decoded.
    pub fn needs_query(self) -> bool {
        self.contains(ParamRole::Query) || self.contains(ParamRole::QueryOrPost)
    }
}

/// Per-parameter roles of one route, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterBindings {
    roles: Vec<(String, ParamRole)>,
    present: RoleSet,
}

impl ParameterBindings {
    /// Iterate `(parameter, role)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamRole)> {
        self.roles.iter().map(|(name, role)| (name.as_str(), *role))
    }

    /// Role of a single parameter.
    pub fn role(&self, name: &str) -> Option<ParamRole> {
        self.roles
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, role)| *role)
    }

    /// Distinct roles used by this route.
    pub fn roles(&self) -> RoleSet {
        self.present
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Classify a handler's declared parameters against its route.
pub fn classify_parameters<S: AsRef<str>>(
    params: &[S],
    captures: &[String],
    method: Method,
    path: &str,
    has_instance: bool,
) -> Result<ParameterBindings, RouteError> {
    let mut bindings = ParameterBindings::default();

    for param in params {
        let name = param.as_ref();
        let role = if name == SELF_TOKEN {
            if !has_instance {
                return Err(RouteError::MissingInstance {
                    method,
                    path: path.to_string(),
                });
            }
            ParamRole::Instance
        } else if name == REQUEST_TOKEN {
            ParamRole::Request
        } else if captures.iter().any(|capture| capture == name) {
            ParamRole::DynamicPath
        } else if method.is_mutating() {
            ParamRole::QueryOrPost
        } else {
            ParamRole::Query
        };

        bindings.present.insert(role);
        bindings.roles.push((name.to_string(), role));
    }

    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captures(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_reserved_tokens_and_captures() {
        let bindings = classify_parameters(
            &["self", "request", "id", "page"],
            &captures(&["id"]),
            Method::Get,
            "/{id}",
            true,
        )
        .unwrap();

        assert_eq!(bindings.role("self"), Some(ParamRole::Instance));
        assert_eq!(bindings.role("request"), Some(ParamRole::Request));
        assert_eq!(bindings.role("id"), Some(ParamRole::DynamicPath));
        assert_eq!(bindings.role("page"), Some(ParamRole::Query));

        let order: Vec<_> = bindings.iter().map(|(name, _)| name).collect();
        assert_eq!(order, ["self", "request", "id", "page"]);
    }

    #[test]
    fn test_mutating_methods_fall_back_to_post() {
        for method in [Method::Post, Method::Put] {
            let bindings = classify_parameters(&["name"], &[], method, "/", false).unwrap();
            assert_eq!(bindings.role("name"), Some(ParamRole::QueryOrPost));
        }
        for method in [Method::Get, Method::Head, Method::Delete, Method::Options, Method::Patch] {
            let bindings = classify_parameters(&["name"], &[], method, "/", false).unwrap();
            assert_eq!(bindings.role("name"), Some(ParamRole::Query));
        }
    }

    #[test]
    fn test_self_without_instance_fails() {
        let err = classify_parameters(&["self"], &[], Method::Get, "/about", false).unwrap_err();
        assert!(matches!(err, RouteError::MissingInstance { method: Method::Get, .. }));
    }

    #[test]
    fn test_role_set_tracks_needed_sources() {
        let bindings =
            classify_parameters(&["id"], &captures(&["id"]), Method::Post, "/{id}", false).unwrap();
        let roles = bindings.roles();
        assert!(roles.contains(ParamRole::DynamicPath));
        assert!(!roles.needs_query());
        assert!(!roles.contains(ParamRole::QueryOrPost));

        let empty = classify_parameters::<&str>(&[], &[], Method::Get, "/", false).unwrap();
        assert!(empty.roles().is_empty());
    }
}
