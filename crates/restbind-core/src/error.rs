//! Error types.
//!
//! Two classes of failure exist. Registration failures
//! ([`RegistrationError`]) mean a handler was declared in a way that cannot
//! be bound and are fatal. Request-time failures are either binder failures
//! ([`BindError`], always answered with 422) or errors returned by the
//! handler, which become an [`ErrorResponse`] on the wire.

use http::StatusCode;
use restbind_router::RouteError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type-erased error returned by handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias for handler functions.
pub type HandlerResult<T> = Result<T, BoxError>;

/// The wire body of every error response, and an error value carrying the
/// HTTP status it should be answered with.
///
/// ```
/// use http::StatusCode;
/// use restbind_core::ErrorResponse;
///
/// let err = ErrorResponse::new(StatusCode::BAD_REQUEST, "invalid");
/// assert_eq!(err.to_string(), "400: invalid");
/// assert_eq!(
///     serde_json::to_string(&err).unwrap(),
///     r#"{"status":400,"message":"invalid"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{status}: {message}")]
pub struct ErrorResponse {
    /// HTTP status code.
    pub status: u16,
    /// Human readable description.
    pub message: String,
}

impl ErrorResponse {
    /// Creates an error response.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
        }
    }

    /// The status as a [`StatusCode`]; out-of-range values map to 500.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Turns any error into an `ErrorResponse`.
    ///
    /// An error that already is an `ErrorResponse` keeps its own status;
    /// anything else gets `status` and its `Display` text as the message.
    #[must_use]
    pub fn from_error(error: BoxError, status: StatusCode) -> Self {
        match error.downcast::<Self>() {
            Ok(response) => *response,
            Err(other) => Self::new(status, other.to_string()),
        }
    }
}

/// Creates a handler error that carries its HTTP status.
///
/// ```
/// use http::StatusCode;
/// use restbind_core::{error, ErrorResponse};
///
/// let err = error(StatusCode::NOT_FOUND, "no such user");
/// let response = ErrorResponse::from_error(err, StatusCode::INTERNAL_SERVER_ERROR);
/// assert_eq!(response.status, 404);
/// ```
pub fn error(status: StatusCode, message: impl Into<String>) -> BoxError {
    Box::new(ErrorResponse::new(status, message))
}

/// Formatting form of [`error()`].
///
/// ```
/// use http::StatusCode;
/// use restbind_core::errorf;
///
/// let err = errorf!(StatusCode::CONFLICT, "user {} already exists", "alice");
/// assert_eq!(err.to_string(), "409: user alice already exists");
/// ```
#[macro_export]
macro_rules! errorf {
    ($status:expr, $($arg:tt)+) => {
        $crate::error($status, ::std::format!($($arg)+))
    };
}

/// A request-time binding failure. Answered with 422.
#[derive(Debug, Error)]
pub enum BindError {
    /// The router did not capture the segment this parameter is bound to.
    #[error("path parameter {name:?} is missing")]
    MissingSegment {
        /// Capture name.
        name: String,
    },

    /// The captured segment does not parse as the parameter's type.
    #[error("invalid value {value:?} for path parameter {name:?}: {reason}")]
    InvalidSegment {
        /// Capture name.
        name: String,
        /// Raw captured value.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// The request body could not be decoded.
    #[error("failed to decode request body: {0}")]
    Body(#[source] ProtocolError),
}

/// A handler cannot be registered. Fatal.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The method or pattern was rejected by the router.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// A parameter reached a named segment but its type has no path
    /// conversion.
    #[error(
        "unsupported path parameter type {type_name} for parameter {name:?} \
         (argument {position} of handler for {pattern})"
    )]
    UnsupportedPathType {
        /// Route pattern.
        pattern: String,
        /// Capture name the parameter would have bound to.
        name: String,
        /// Parameter type.
        type_name: &'static str,
        /// 1-based argument position.
        position: usize,
    },

    /// Every named segment and the body are already mapped.
    #[error(
        "cannot determine a binding source for argument {position} ({type_name}) \
         of handler for {pattern}: all path parameters and the request body are already mapped"
    )]
    NoBindingSource {
        /// Route pattern.
        pattern: String,
        /// Parameter type.
        type_name: &'static str,
        /// 1-based argument position.
        position: usize,
    },
}

/// Encoding or decoding failed inside a protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON (de)serialization failed.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// The HTTP message could not be assembled.
    #[error("invalid HTTP message: {0}")]
    Http(#[from] http::Error),
}

/// Failure of a client call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error status; this is its body.
    #[error(transparent)]
    Status(ErrorResponse),

    /// The request could not be encoded or the response decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
}

impl ClientError {
    /// The HTTP status of a [`ClientError::Status`].
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(response) => Some(response.status_code()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_display() {
        let err = ErrorResponse::new(StatusCode::IM_A_TEAPOT, "short and stout");
        assert_eq!(err.to_string(), "418: short and stout");
    }

    #[test]
    fn test_error_response_roundtrips_json() {
        let parsed: ErrorResponse =
            serde_json::from_str(r#"{"status":400,"message":"invalid"}"#).unwrap();
        assert_eq!(parsed, ErrorResponse::new(StatusCode::BAD_REQUEST, "invalid"));
    }

    #[test]
    fn test_from_error_keeps_structured_status() {
        let err = error(StatusCode::BAD_REQUEST, "invalid");
        let response = ErrorResponse::from_error(err, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.status, 400);
        assert_eq!(response.message, "invalid");
    }

    #[test]
    fn test_from_error_wraps_plain_errors() {
        let err: BoxError = "error".into();
        let response = ErrorResponse::from_error(err, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response, ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "error"));
    }

    #[test]
    fn test_status_code_out_of_range() {
        let response = ErrorResponse {
            status: 42,
            message: String::new(),
        };
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_errorf_formats() {
        let err = errorf!(StatusCode::BAD_REQUEST, "bad {} {}", 1, "two");
        assert_eq!(err.to_string(), "400: bad 1 two");
    }

    #[test]
    fn test_client_error_status() {
        let err = ClientError::Status(ErrorResponse::new(StatusCode::NOT_FOUND, "gone"));
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.to_string(), "404: gone");
    }
}
