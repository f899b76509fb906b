//! Test client for in-memory dispatch.

use std::sync::Arc;

use http::{HeaderName, HeaderValue, Method};
use restbind_core::{JsonProtocol, ServerProtocol};
use restbind_server::Router;

use crate::request::TestRequest;

/// Sends requests straight into a [`Router`] without binding a port.
///
/// ```
/// use restbind_core::prelude::*;
/// use restbind_server::Router;
/// use restbind_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let router = Router::new().get("/integer/:id", |id: i64| async move { HandlerResult::Ok(id + 33) });
/// let client = TestClient::new(router);
///
/// let response = client.get("/integer/10").send().await;
/// response.assert_status(StatusCode::OK);
/// assert_eq!(response.json::<i64>().unwrap(), 43);
/// # });
/// ```
#[must_use]
pub struct TestClient<P = JsonProtocol> {
    router: Arc<Router<P>>,
    default_headers: Vec<(HeaderName, HeaderValue)>,
}

impl<P: ServerProtocol> TestClient<P> {
    /// Creates a client dispatching into `router`.
    pub fn new(router: Router<P>) -> Self {
        Self {
            router: Arc::new(router),
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    ///
    /// # Panics
    ///
    /// Panics if the name or value is not a valid header.
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::from_bytes(name.as_bytes())
            .unwrap_or_else(|e| panic!("invalid default header name '{name}': {e}"));
        let value = HeaderValue::from_str(value)
            .unwrap_or_else(|e| panic!("invalid default header value '{value}': {e}"));
        self.default_headers.push((name, value));
        self
    }

    /// The router requests are dispatched into.
    #[must_use]
    pub fn router(&self) -> &Router<P> {
        &self.router
    }

    /// Creates a GET request.
    pub fn get(&self, uri: &str) -> TestRequest<'_, P> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request.
    pub fn post(&self, uri: &str) -> TestRequest<'_, P> {
        self.request(Method::POST, uri)
    }

    /// Creates a PUT request.
    pub fn put(&self, uri: &str) -> TestRequest<'_, P> {
        self.request(Method::PUT, uri)
    }

    /// Creates a PATCH request.
    pub fn patch(&self, uri: &str) -> TestRequest<'_, P> {
        self.request(Method::PATCH, uri)
    }

    /// Creates a DELETE request.
    pub fn delete(&self, uri: &str) -> TestRequest<'_, P> {
        self.request(Method::DELETE, uri)
    }

    /// Creates a HEAD request.
    pub fn head(&self, uri: &str) -> TestRequest<'_, P> {
        self.request(Method::HEAD, uri)
    }

    /// Creates an OPTIONS request.
    pub fn options(&self, uri: &str) -> TestRequest<'_, P> {
        self.request(Method::OPTIONS, uri)
    }

    /// Creates a request with any method.
    pub fn request(&self, method: Method, uri: &str) -> TestRequest<'_, P> {
        let mut request = TestRequest::new(&self.router, method, uri);
        for (name, value) in &self.default_headers {
            request = request.typed_header(name.clone(), value.clone());
        }
        request
    }
}

impl<P> std::fmt::Debug for TestClient<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("router", &self.router)
            .field("default_headers", &self.default_headers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use restbind_core::prelude::*;

    fn router() -> Router {
        Router::new()
            .get("/method", |req: Request| async move {
                HandlerResult::Ok(req.method().to_string())
            })
            .post("/method", |req: Request| async move {
                HandlerResult::Ok(req.method().to_string())
            })
            .get("/header", |req: Request| async move {
                HandlerResult::Ok(req.header("x-custom").unwrap_or("none").to_string())
            })
    }

    #[tokio::test]
    async fn test_dispatches_by_method() {
        let client = TestClient::new(router());

        let response = client.get("/method").send().await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<String>().unwrap(), "GET");

        let response = client.post("/method").send().await;
        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<String>().unwrap(), "POST");
    }

    #[tokio::test]
    async fn test_default_headers() {
        let client = TestClient::new(router()).with_default_header("X-Custom", "default-value");
        let response = client.get("/header").send().await;
        assert_eq!(response.json::<String>().unwrap(), "default-value");

        let response = client.get("/header").header("x-custom", "override").send().await;
        assert_eq!(response.json::<String>().unwrap(), "override");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let client = TestClient::new(router());
        client
            .get("/nowhere")
            .send()
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[test]
    #[should_panic(expected = "invalid default header name")]
    fn test_invalid_default_header() {
        let _ = TestClient::new(router()).with_default_header("bad header", "x");
    }
}
