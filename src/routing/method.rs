//! HTTP methods a route can be bound to.

use std::fmt;
use std::str::FromStr;

use axum::routing::MethodFilter;

/// Closed set of methods recognised by the route compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
}

impl Method {
    /// Every method, in table order.
    pub const ALL: [Method; 7] = [
        Method::Delete,
        Method::Get,
        Method::Head,
        Method::Options,
        Method::Patch,
        Method::Post,
        Method::Put,
    ];

    /// Methods targeted by a page whose stem is not a method name.
    pub const PAGE_DEFAULTS: [Method; 2] = [Method::Get, Method::Post];

    /// Uppercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Delete => "DELETE",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }

    /// Whether unmatched parameters may fall back to the POST body.
    ///
    /// Only POST and PUT carry form bodies; PATCH is deliberately treated
    /// like the read-only methods.
    pub fn is_mutating(self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }

    /// Filter used when mounting the route on an axum router.
    pub fn filter(self) -> MethodFilter {
        match self {
            Method::Delete => MethodFilter::DELETE,
            Method::Get => MethodFilter::GET,
            Method::Head => MethodFilter::HEAD,
            Method::Options => MethodFilter::OPTIONS,
            Method::Patch => MethodFilter::PATCH,
            Method::Post => MethodFilter::POST,
            Method::Put => MethodFilter::PUT,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name is not one of the seven route methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown HTTP method: {}", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

impl FromStr for Method {
    type Err = UnknownMethod;

    /// Case-insensitive lookup.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("get".parse::<Method>(), Ok(Method::Get));
        assert_eq!("Post".parse::<Method>(), Ok(Method::Post));
        assert_eq!("OPTIONS".parse::<Method>(), Ok(Method::Options));
        assert!("connect".parse::<Method>().is_err());
    }

    #[test]
    fn test_only_post_and_put_are_mutating() {
        let mutating: Vec<_> = Method::ALL.into_iter().filter(|m| m.is_mutating()).collect();
        assert_eq!(mutating, vec![Method::Post, Method::Put]);
    }
}
