//! HTTP method-based routing.
//!
//! This module provides [`MethodRouter`] which maps HTTP methods to the
//! routes registered for a single path shape.

use std::sync::Arc;

use http::Method;

use crate::error::RouteError;

/// Methods accepted at registration, in `Allow` header order.
pub const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
];

/// Parses a registration verb.
///
/// Verbs are case-insensitive and `DEL` is accepted as an alias for
/// `DELETE`.
///
/// ```rust
/// use http::Method;
/// use restbind_router::parse_method;
///
/// assert_eq!(parse_method("del").unwrap(), Method::DELETE);
/// assert!(parse_method("TRACE").is_err());
/// ```
pub fn parse_method(verb: &str) -> Result<Method, RouteError> {
    let upper = verb.to_ascii_uppercase();
    let method = match upper.as_str() {
        "DEL" | "DELETE" => Method::DELETE,
        "GET" => Method::GET,
        "POST" => Method::POST,
        "PUT" => Method::PUT,
        "PATCH" => Method::PATCH,
        "HEAD" => Method::HEAD,
        "OPTIONS" => Method::OPTIONS,
        _ => return Err(RouteError::UnsupportedMethod(verb.to_string())),
    };
    Ok(method)
}

/// A registered route: the stored value plus the capture names of the
/// pattern it was registered under.
#[derive(Debug, Clone)]
pub struct Route<T> {
    /// Pattern as written at registration.
    pub pattern: String,
    /// Capture names in pattern order, shared with every match.
    pub names: Arc<[String]>,
    /// The routed value.
    pub value: T,
}

/// Maps HTTP methods to routes for a single path shape.
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    get: Option<Route<T>>,
    post: Option<Route<T>>,
    put: Option<Route<T>>,
    delete: Option<Route<T>>,
    patch: Option<Route<T>>,
    head: Option<Route<T>>,
    options: Option<Route<T>>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            get: None,
            post: None,
            put: None,
            delete: None,
            patch: None,
            head: None,
            options: None,
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, method: &Method) -> Option<&mut Option<Route<T>>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::POST => Some(&mut self.post),
            Method::PUT => Some(&mut self.put),
            Method::DELETE => Some(&mut self.delete),
            Method::PATCH => Some(&mut self.patch),
            Method::HEAD => Some(&mut self.head),
            Method::OPTIONS => Some(&mut self.options),
            _ => None,
        }
    }

    /// Registers a route for a method.
    ///
    /// Fails if the method is unsupported or already taken.
    pub fn insert(&mut self, method: &Method, route: Route<T>) -> Result<(), RouteError> {
        let slot = self
            .slot_mut(method)
            .ok_or_else(|| RouteError::UnsupportedMethod(method.to_string()))?;
        if let Some(existing) = slot {
            return Err(RouteError::Conflict {
                method: method.clone(),
                pattern: route.pattern,
                existing: existing.pattern.clone(),
            });
        }
        *slot = Some(route);
        Ok(())
    }

    /// Returns the route for a given HTTP method.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&Route<T>> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            Method::HEAD => self.head.as_ref(),
            Method::OPTIONS => self.options.as_ref(),
            _ => None,
        }
    }

    /// Returns true if any methods are registered.
    #[must_use]
    pub fn has_any_method(&self) -> bool {
        !self.allowed_methods().is_empty()
    }

    /// Returns a list of allowed methods for this route.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        SUPPORTED_METHODS
            .iter()
            .filter(|m| self.get(m).is_some())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(pattern: &str, value: &'static str) -> Route<&'static str> {
        Route {
            pattern: pattern.to_string(),
            names: Vec::new().into(),
            value,
        }
    }

    #[test]
    fn test_parse_method_verbs() {
        assert_eq!(parse_method("GET").unwrap(), Method::GET);
        assert_eq!(parse_method("post").unwrap(), Method::POST);
        assert_eq!(parse_method("Put").unwrap(), Method::PUT);
        assert_eq!(parse_method("PATCH").unwrap(), Method::PATCH);
        assert_eq!(parse_method("DEL").unwrap(), Method::DELETE);
        assert_eq!(parse_method("DELETE").unwrap(), Method::DELETE);
        assert_eq!(parse_method("HEAD").unwrap(), Method::HEAD);
        assert_eq!(parse_method("OPTIONS").unwrap(), Method::OPTIONS);
        assert_eq!(
            parse_method("CONNECT"),
            Err(RouteError::UnsupportedMethod("CONNECT".to_string()))
        );
    }

    #[test]
    fn test_insert_and_get() {
        let mut router = MethodRouter::new();
        router.insert(&Method::GET, route("/users", "list")).unwrap();
        router.insert(&Method::POST, route("/users", "create")).unwrap();

        assert_eq!(router.get(&Method::GET).map(|r| r.value), Some("list"));
        assert_eq!(router.get(&Method::POST).map(|r| r.value), Some("create"));
        assert!(router.get(&Method::DELETE).is_none());
    }

    #[test]
    fn test_conflict() {
        let mut router = MethodRouter::new();
        router.insert(&Method::GET, route("/users/:id", "a")).unwrap();
        let err = router
            .insert(&Method::GET, route("/users/:name", "b"))
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::Conflict {
                method: Method::GET,
                pattern: "/users/:name".to_string(),
                existing: "/users/:id".to_string(),
            }
        );
        assert_eq!(router.get(&Method::GET).map(|r| r.value), Some("a"));
    }

    #[test]
    fn test_unsupported_method_insert() {
        let mut router = MethodRouter::new();
        assert!(router.insert(&Method::TRACE, route("/", "x")).is_err());
        assert!(!router.has_any_method());
    }

    #[test]
    fn test_allowed_methods_order() {
        let mut router = MethodRouter::new();
        router.insert(&Method::DELETE, route("/x", "d")).unwrap();
        router.insert(&Method::GET, route("/x", "g")).unwrap();
        assert_eq!(router.allowed_methods(), vec![Method::GET, Method::DELETE]);
        assert!(router.has_any_method());
    }
}
