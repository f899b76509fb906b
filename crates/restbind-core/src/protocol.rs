//! The wire-format boundary.
//!
//! Binding and dispatch never touch raw bytes: request bodies are decoded
//! through a [`ServerDecoder`] and every response, successful or not, is
//! produced by a [`ServerEncoder`]. The client half ([`ClientEncoder`],
//! [`ClientDecoder`]) mirrors it so a typed client can speak to a server
//! using the same protocol.
//!
//! [`JsonProtocol`](crate::JsonProtocol) is the default implementation.

use bytes::Bytes;
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{BoxError, ClientError, ProtocolError};
use crate::request::Request;

/// A fully encoded server response.
pub type HttpResponse = http::Response<Bytes>;

/// Decodes request bodies on the server.
pub trait ServerDecoder: Send + Sync + 'static {
    /// Decodes the request payload into a fresh `T`.
    fn decode_request<T: DeserializeOwned>(&self, request: &Request) -> Result<T, ProtocolError>;
}

/// Encodes responses on the server.
pub trait ServerEncoder: Send + Sync + 'static {
    /// Builds the response for a request.
    ///
    /// * `status`: `None` lets the encoder pick a default.
    /// * `error`: when present it wins over `body` and is turned into an
    ///   [`ErrorResponse`](crate::ErrorResponse). A structured error keeps its
    ///   own status; anything else uses `status`, or 500 when unset.
    /// * `body`: the value to serialize, if any.
    ///
    /// The returned response is the only one produced for the request.
    fn encode_response<T: Serialize + ?Sized>(
        &self,
        request: &Request,
        status: Option<StatusCode>,
        error: Option<BoxError>,
        body: Option<&T>,
    ) -> Result<HttpResponse, ProtocolError>;
}

/// Server half of a protocol.
pub trait ServerProtocol: ServerDecoder + ServerEncoder {}

impl<P: ServerDecoder + ServerEncoder> ServerProtocol for P {}

/// Encodes outgoing requests on the client.
pub trait ClientEncoder: Send + Sync + 'static {
    /// Finishes `request`, attaching `value` as the payload. `None` attaches
    /// no body at all.
    fn encode_request<T: Serialize + ?Sized>(
        &self,
        request: http::request::Builder,
        value: Option<&T>,
    ) -> Result<http::Request<Bytes>, ProtocolError>;
}

/// Decodes server responses on the client.
pub trait ClientDecoder: Send + Sync + 'static {
    /// Decodes a success response into `T`, or surfaces an error status as
    /// [`ClientError::Status`].
    fn decode_response<T: DeserializeOwned>(
        &self,
        response: &http::Response<Bytes>,
    ) -> Result<T, ClientError>;
}

/// Client half of a protocol.
pub trait ClientProtocol: ClientEncoder + ClientDecoder {}

impl<P: ClientEncoder + ClientDecoder> ClientProtocol for P {}

/// Both halves.
pub trait Protocol: ServerProtocol + ClientProtocol {}

impl<P: ServerProtocol + ClientProtocol> Protocol for P {}

/// The status used when a handler leaves it unset.
///
/// `POST` with a body is `201 Created`; no body is `204 No Content`;
/// everything else is `200 OK`.
#[must_use]
pub fn default_status(method: &Method, has_body: bool) -> StatusCode {
    match (has_body, *method == Method::POST) {
        (false, _) => StatusCode::NO_CONTENT,
        (true, true) => StatusCode::CREATED,
        (true, false) => StatusCode::OK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status() {
        assert_eq!(default_status(&Method::POST, true), StatusCode::CREATED);
        assert_eq!(default_status(&Method::POST, false), StatusCode::NO_CONTENT);
        assert_eq!(default_status(&Method::GET, true), StatusCode::OK);
        assert_eq!(default_status(&Method::PUT, true), StatusCode::OK);
        assert_eq!(default_status(&Method::DELETE, false), StatusCode::NO_CONTENT);
    }
}
