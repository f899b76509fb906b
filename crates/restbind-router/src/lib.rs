//! Radix tree URL router for restbind.
//!
//! Maps `(method, path pattern)` pairs to arbitrary values and resolves
//! incoming request paths back to them. Patterns mark captures with a `:`
//! prefix (`/users/:id`); captures are reported in pattern order so callers
//! can consume them positionally.
//!
//! # Example
//!
//! ```rust
//! use http::Method;
//! use restbind_router::{parse_method, MatchError, PathPattern, Router};
//!
//! let mut router = Router::new();
//! let users = PathPattern::parse("/users/:id").unwrap();
//! router.insert(&Method::GET, &users, "getUser").unwrap();
//! router.insert(&parse_method("DEL").unwrap(), &users, "deleteUser").unwrap();
//!
//! let found = router.match_route(&Method::DELETE, "/users/7").unwrap();
//! assert_eq!(*found.value, "deleteUser");
//! assert_eq!(found.params.get_index(0), Some("7"));
//!
//! assert!(matches!(
//!     router.match_route(&Method::POST, "/users/7"),
//!     Err(MatchError::MethodNotAllowed { .. })
//! ));
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"         ":"
//!              │               │
//!        ┌─────┴─────┐      "posts"
//!        │           │         │
//!      (leaf)       ":"      (leaf)
//!   [GET,POST]       │      [GET]
//!                  (leaf)
//!              [GET,DELETE]
//! ```

mod error;
mod method_router;
mod node;
mod params;
mod pattern;
mod router;

pub use error::{MatchError, PatternError, RouteError};
pub use method_router::{parse_method, MethodRouter, Route, SUPPORTED_METHODS};
pub use node::Node;
pub use params::Params;
pub use pattern::{PathPattern, Segment, NAMED_PREFIX};
pub use router::Router;

/// A resolved route with its value and captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The routed value.
    pub value: &'a T,
    /// The pattern the route was registered under.
    pub pattern: &'a str,
    /// Captured path parameters, in pattern order.
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(value: &'a T, pattern: &'a str, params: Params) -> Self {
        Self {
            value,
            pattern,
            params,
        }
    }
}
