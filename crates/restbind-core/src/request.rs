//! Incoming request representation.
//!
//! [`Request`] is what binders read from: method, URI, headers, the fully
//! collected body, the positional path parameters captured by the router
//! and the per-request [`Context`]. Handlers that declare a `Request`
//! parameter receive a clone of it.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use restbind_router::Params;

use crate::context::Context;

/// An incoming HTTP request with its body already collected.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use restbind_core::Request;
///
/// let req = Request::builder()
///     .method(Method::POST)
///     .uri("/users/123".parse().unwrap())
///     .param("id", "123")
///     .body(r#"{"name":"alice"}"#)
///     .build();
///
/// assert_eq!(req.method(), &Method::POST);
/// assert_eq!(req.path_param("id"), Some("123"));
/// assert_eq!(req.path(), "/users/123");
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: Params,
    context: Context,
}

impl Request {
    /// Creates a request without path parameters and with a fresh context.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            params: Params::new(),
            context: Context::new(),
        }
    }

    /// Starts building a request.
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Converts an `http::Request` whose body has been collected.
    #[must_use]
    pub fn from_http(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts.method, parts.uri, parts.headers, body)
    }

    /// Replaces the path parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Replaces the context.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consumes the request and returns the body.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Returns the captured path parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns the per-request context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }
}

/// Builder for [`Request`], mostly used by tests and in-memory clients.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    params: Params,
    context: Option<Context>,
}

impl RequestBuilder {
    /// Sets the HTTP method (default `GET`).
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI (default `/`).
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Adds a header; invalid values are ignored.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Appends a captured path parameter.
    #[must_use]
    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params.push(name, value);
        self
    }

    /// Replaces the captured path parameters.
    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Sets the context.
    #[must_use]
    pub fn context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method.unwrap_or(Method::GET),
            uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
            headers: self.headers,
            body: self.body,
            params: self.params,
            context: self.context.unwrap_or_default(),
        }
    }
}
