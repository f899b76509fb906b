//! Router error types.

use http::Method;
use thiserror::Error;

/// A path pattern could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// Patterns are absolute.
    #[error("path pattern {pattern:?} must start with '/'")]
    MissingLeadingSlash {
        /// The offending pattern.
        pattern: String,
    },

    /// A `:` segment without a name.
    #[error("path pattern {pattern:?} contains a named segment without a name")]
    EmptyName {
        /// The offending pattern.
        pattern: String,
    },
}

/// A route could not be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The verb is not one of the supported HTTP methods.
    #[error("unsupported HTTP method {0:?}")]
    UnsupportedMethod(String),

    /// The pattern is malformed.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// Another route already owns this method and pattern shape.
    #[error("{method} {pattern} conflicts with existing route {existing}")]
    Conflict {
        /// Method being registered.
        method: Method,
        /// Pattern being registered.
        pattern: String,
        /// Pattern of the route already registered.
        existing: String,
    },
}

/// A request path did not resolve to a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No pattern matches the path.
    #[error("no route matches the request path")]
    NotFound,

    /// A pattern matches but not for this method.
    #[error("method not allowed")]
    MethodNotAllowed {
        /// Methods registered for the matched pattern.
        allowed: Vec<Method>,
    },
}
