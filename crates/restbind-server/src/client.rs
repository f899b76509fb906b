//! Typed HTTP client.
//!
//! The client half of a protocol on top of `reqwest`: payloads go through
//! [`ClientEncoder::encode_request`] and responses come back through
//! [`ClientDecoder::decode_response`], so an error status surfaces as
//! [`ClientError::Status`] carrying the server's [`ErrorResponse`].
//!
//! [`ErrorResponse`]: restbind_core::ErrorResponse
//!
//! ```rust,no_run
//! use restbind_server::Client;
//!
//! # async fn run() -> Result<(), restbind_core::ClientError> {
//! let client = Client::new("http://127.0.0.1:8080");
//! let answer: i64 = client.get("/integer/10").await?;
//! assert_eq!(answer, 43);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use http::Method;
use restbind_core::{ClientError, ClientProtocol, JsonProtocol};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A client for a restbind server speaking protocol `P`.
#[derive(Debug, Clone)]
pub struct Client<P = JsonProtocol> {
    http: reqwest::Client,
    base_url: String,
    protocol: Arc<P>,
}

impl Client<JsonProtocol> {
    /// A JSON client for `base_url`, e.g. `http://127.0.0.1:8080`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_protocol(base_url, JsonProtocol)
    }
}

impl<P: ClientProtocol> Client<P> {
    /// A client using a custom protocol.
    #[must_use]
    pub fn with_protocol(base_url: impl Into<String>, protocol: P) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            protocol: Arc::new(protocol),
        }
    }

    /// Replaces the underlying `reqwest` client (timeouts, proxies, TLS).
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// The base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends `body` (if any) with `method` to `path` and decodes the reply.
    pub async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let builder = http::Request::builder().method(method).uri(url.as_str());
        let (parts, payload) = self.protocol.encode_request(builder, body)?.into_parts();

        let response = self
            .http
            .request(parts.method.clone(), url.as_str())
            .headers(parts.headers)
            .body(payload)
            .send()
            .await
            .map_err(|e| ClientError::Transport(Box::new(e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(Box::new(e)))?;

        tracing::debug!(method = %parts.method, url = %url, status = status.as_u16(), "client call");

        let mut decoded = http::Response::new(bytes);
        *decoded.status_mut() = status;
        *decoded.headers_mut() = headers;
        self.protocol.decode_response(&decoded)
    }

    /// `GET path`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.call::<(), T>(Method::GET, path, None).await
    }

    /// `DELETE path`.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.call::<(), T>(Method::DELETE, path, None).await
    }

    /// `POST path` with `body`.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::POST, path, Some(body)).await
    }

    /// `PUT path` with `body`.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::PUT, path, Some(body)).await
    }

    /// `PATCH path` with `body`.
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::PATCH, path, Some(body)).await
    }
}
