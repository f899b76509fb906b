//! High-level router API.

use std::sync::Arc;

use http::Method;

use crate::error::{MatchError, RouteError};
use crate::method_router::Route;
use crate::node::Node;
use crate::params::Params;
use crate::pattern::PathPattern;
use crate::RouteMatch;

/// A radix tree router mapping `(method, path pattern)` to values.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use restbind_router::{PathPattern, Router};
///
/// let mut router = Router::new();
/// let pattern = PathPattern::parse("/users/:id").unwrap();
/// router.insert(&Method::GET, &pattern, "getUser").unwrap();
///
/// let found = router.match_route(&Method::GET, "/users/123").unwrap();
/// assert_eq!(*found.value, "getUser");
/// assert_eq!(found.params.get("id"), Some("123"));
/// ```
///
/// # Route Priority
///
/// Static segments win over named segments at the same position, so
/// `/users/me` matches before `/users/:id` for the path `/users/me`.
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts a route.
    ///
    /// Two patterns with the same shape (same literals, captures in the same
    /// positions) conflict for the same method, whatever the capture names.
    pub fn insert(
        &mut self,
        method: &Method,
        pattern: &PathPattern,
        value: T,
    ) -> Result<(), RouteError> {
        let route = Route {
            pattern: pattern.as_str().to_string(),
            names: pattern.names().map(str::to_string).collect(),
            value,
        };
        self.root.insert(pattern.segments(), method, route)?;
        self.route_count += 1;
        Ok(())
    }

    /// Resolves a request.
    ///
    /// Captured values are percent-decoded; a capture that does not decode
    /// to UTF-8 is kept verbatim.
    pub fn match_route(&self, method: &Method, path: &str) -> Result<RouteMatch<'_, T>, MatchError> {
        let (methods, captures) = self.root.match_path(path).ok_or(MatchError::NotFound)?;
        let route = methods
            .get(method)
            .ok_or_else(|| MatchError::MethodNotAllowed {
                allowed: methods.allowed_methods(),
            })?;

        let params = Params::from_captures(
            Arc::clone(&route.names),
            captures.into_iter().map(decode_segment),
        );

        Ok(RouteMatch::new(&route.value, &route.pattern, params))
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), std::borrow::Cow::into_owned)
}
