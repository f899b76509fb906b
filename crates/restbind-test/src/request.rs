//! Test request builder.

use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use restbind_core::{Context, Request, RequestId, ServerProtocol, APPLICATION_JSON};
use restbind_server::Router;
use serde::Serialize;

use crate::error::TestError;
use crate::response::TestResponse;

/// A request under construction, bound to the router it will be sent to.
///
/// Builder errors are held until [`send`](Self::send) or
/// [`try_send`](Self::try_send) so calls can be chained.
#[must_use]
pub struct TestRequest<'a, P> {
    router: &'a Router<P>,
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    context: Context,
    error: Option<TestError>,
}

impl<'a, P: ServerProtocol> TestRequest<'a, P> {
    pub(crate) fn new(router: &'a Router<P>, method: Method, uri: &str) -> Self {
        Self {
            router,
            method,
            uri: uri.to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            context: Context::new(),
            error: None,
        }
    }

    /// Sets a header, replacing any earlier value.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(name) => name,
            Err(e) => return self.fail(name, e.to_string()),
        };
        match HeaderValue::from_str(value) {
            Ok(value) => self.typed_header(name, value),
            Err(e) => self.fail(name.as_str(), e.to_string()),
        }
    }

    pub(crate) fn typed_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the JSON body and sets the content type.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Bytes::from(bytes);
                self.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
            }
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(TestError::Json(e));
                }
            }
        }
        self
    }

    /// Uses `request_id` for the request context.
    pub fn request_id(mut self, request_id: RequestId) -> Self {
        let deadline = self.context.deadline();
        self.context = Context::with_request_id(request_id);
        if let Some(deadline) = deadline {
            self.context = self.context.with_deadline(deadline);
        }
        self
    }

    /// Gives the handler a deadline `timeout` from now.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.context = self.context.with_timeout(timeout);
        self
    }

    /// Dispatches the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("failed to build test request: {e}"),
        }
    }

    /// Dispatches the request, returning builder errors instead of
    /// panicking.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let uri: Uri = self.uri.parse().map_err(|e: http::uri::InvalidUri| TestError::InvalidUri {
            uri: self.uri.clone(),
            reason: e.to_string(),
        })?;

        let request =
            Request::new(self.method, uri, self.headers, self.body).with_context(self.context);
        let response = self.router.dispatch(request).await;
        Ok(TestResponse::from_http(response))
    }

    fn fail(mut self, name: &str, reason: String) -> Self {
        if self.error.is_none() {
            self.error = Some(TestError::InvalidHeader {
                name: name.to_string(),
                reason,
            });
        }
        self
    }
}

impl<P> std::fmt::Debug for TestRequest<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestRequest")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use restbind_core::prelude::*;
    use restbind_server::Router;
    use serde_json::json;

    use crate::TestClient;

    #[derive(Debug, serde::Deserialize, serde::Serialize)]
    struct Echo {
        text: String,
    }

    fn client() -> TestClient {
        TestClient::new(
            Router::new()
                .put("/echo", |Json(echo): Json<Echo>| async move { HandlerResult::Ok(Json(echo)) })
                .get("/id", |ctx: Context| async move {
                    HandlerResult::Ok(ctx.request_id().to_string())
                })
                .get("/deadline", |ctx: Context| async move {
                    HandlerResult::Ok(ctx.remaining().is_some())
                }),
        )
    }

    #[tokio::test]
    async fn test_json_body() {
        let response = client().put("/echo").json(&json!({"text": "hi"})).send().await;
        response.assert_status(StatusCode::OK);
        response.assert_json_eq(&json!({"text": "hi"}));
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_422() {
        client()
            .put("/echo")
            .body("{not json")
            .send()
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_request_id_reaches_context() {
        let id = restbind_core::RequestId::new();
        let response = client().get("/id").request_id(id).send().await;
        assert_eq!(response.json::<String>().unwrap(), id.to_string());
    }

    #[tokio::test]
    async fn test_timeout_sets_deadline() {
        let client = client();
        let response = client.get("/deadline").send().await;
        assert!(!response.json::<bool>().unwrap());

        let response = client
            .get("/deadline")
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await;
        assert!(response.json::<bool>().unwrap());
    }

    #[tokio::test]
    async fn test_builder_errors() {
        let client = client();

        let err = client.get("/id").header("bad header", "x").try_send().await.unwrap_err();
        assert!(matches!(err, crate::TestError::InvalidHeader { .. }));

        let err = client.get("not a uri").try_send().await.unwrap_err();
        assert!(matches!(err, crate::TestError::InvalidUri { .. }));
    }
}
