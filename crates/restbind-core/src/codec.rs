//! The default JSON protocol.

use bytes::Bytes;
use http::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use http::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{BoxError, ClientError, ErrorResponse, ProtocolError};
use crate::protocol::{
    default_status, ClientDecoder, ClientEncoder, HttpResponse, ServerDecoder, ServerEncoder,
};
use crate::request::Request;

/// Media type used for every JSON body.
pub const APPLICATION_JSON: &str = "application/json";

/// JSON bodies with `{"status": .., "message": ..}` error objects.
///
/// # Example
///
/// ```rust
/// use http::{Method, StatusCode};
/// use restbind_core::{JsonProtocol, Request, ServerEncoder};
///
/// let req = Request::builder().method(Method::POST).build();
/// let response = JsonProtocol
///     .encode_response(&req, None, None, Some(&vec![1, 2, 3]))
///     .unwrap();
///
/// assert_eq!(response.status(), StatusCode::CREATED);
/// assert_eq!(response.body().as_ref(), b"[1,2,3]");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonProtocol;

impl ServerDecoder for JsonProtocol {
    fn decode_request<T: DeserializeOwned>(&self, request: &Request) -> Result<T, ProtocolError> {
        Ok(serde_json::from_slice(request.body())?)
    }
}

impl ServerEncoder for JsonProtocol {
    fn encode_response<T: Serialize + ?Sized>(
        &self,
        request: &Request,
        status: Option<StatusCode>,
        error: Option<BoxError>,
        body: Option<&T>,
    ) -> Result<HttpResponse, ProtocolError> {
        if let Some(error) = error {
            let mut response =
                ErrorResponse::from_error(error, status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR));
            // The body reports the status actually sent.
            let status = response.status_code();
            response.status = status.as_u16();
            return self.encode_response(request, Some(status), None, Some(&response));
        }

        let status = status.unwrap_or_else(|| default_status(request.method(), body.is_some()));
        let mut response = Response::new(Bytes::new());
        *response.status_mut() = status;

        if let Some(body) = body {
            *response.body_mut() = Bytes::from(serde_json::to_vec(body)?);
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }

        Ok(response)
    }
}

impl ClientEncoder for JsonProtocol {
    fn encode_request<T: Serialize + ?Sized>(
        &self,
        request: http::request::Builder,
        value: Option<&T>,
    ) -> Result<http::Request<Bytes>, ProtocolError> {
        let Some(value) = value else {
            return Ok(request.body(Bytes::new())?);
        };

        let body = serde_json::to_vec(value)?;
        Ok(request
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header(ACCEPT, APPLICATION_JSON)
            .body(Bytes::from(body))?)
    }
}

impl ClientDecoder for JsonProtocol {
    fn decode_response<T: DeserializeOwned>(
        &self,
        response: &http::Response<Bytes>,
    ) -> Result<T, ClientError> {
        let body = response.body();

        if response.status().as_u16() < 400 {
            // 204 and friends carry nothing; decode them as JSON null.
            let payload: &[u8] = if body.is_empty() { b"null" } else { body };
            return serde_json::from_slice(payload)
                .map_err(|e| ClientError::Protocol(ProtocolError::Json(e)));
        }

        let error = serde_json::from_slice::<ErrorResponse>(body).unwrap_or_else(|_| {
            ErrorResponse::new(response.status(), String::from_utf8_lossy(body).into_owned())
        });
        Err(ClientError::Status(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error;
    use http::Method;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Message {
        #[serde(rename = "Message")]
        message: String,
    }

    fn request(method: Method) -> Request {
        Request::builder().method(method).build()
    }

    #[test]
    fn test_decode_request() {
        let req = Request::builder().body(r#"{"Message":"hello"}"#).build();
        let decoded: Message = JsonProtocol.decode_request(&req).unwrap();
        assert_eq!(decoded.message, "hello");
    }

    #[test]
    fn test_decode_empty_body_fails() {
        let req = Request::builder().build();
        assert!(JsonProtocol.decode_request::<Message>(&req).is_err());
    }

    #[test]
    fn test_encode_body_defaults() {
        let get = JsonProtocol
            .encode_response(&request(Method::GET), None, None, Some(&43))
            .unwrap();
        assert_eq!(get.status(), StatusCode::OK);
        assert_eq!(get.headers()[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(get.body().as_ref(), b"43");

        let post = JsonProtocol
            .encode_response(&request(Method::POST), None, None, Some(&43))
            .unwrap();
        assert_eq!(post.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_encode_no_body() {
        let response = JsonProtocol
            .encode_response::<()>(&request(Method::POST), None, None, None)
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_encode_explicit_status_wins() {
        let response = JsonProtocol
            .encode_response::<()>(&request(Method::GET), Some(StatusCode::IM_A_TEAPOT), None, None)
            .unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn test_encode_structured_error_keeps_status() {
        let response = JsonProtocol
            .encode_response::<()>(
                &request(Method::GET),
                Some(StatusCode::UNPROCESSABLE_ENTITY),
                Some(error(StatusCode::BAD_REQUEST, "invalid")),
                None,
            )
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body().as_ref(),
            br#"{"status":400,"message":"invalid"}"#
        );
    }

    #[test]
    fn test_encode_invalid_error_status() {
        let odd = ErrorResponse {
            status: 42,
            message: "odd".to_string(),
        };
        let response = JsonProtocol
            .encode_response::<()>(&request(Method::GET), None, Some(Box::new(odd)), None)
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body().as_ref(),
            br#"{"status":500,"message":"odd"}"#
        );
    }

    #[test]
    fn test_encode_plain_error() {
        let response = JsonProtocol
            .encode_response(&request(Method::POST), None, Some("error".into()), Some(&1))
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body().as_ref(),
            br#"{"status":500,"message":"error"}"#
        );

        let response = JsonProtocol
            .encode_response::<()>(
                &request(Method::GET),
                Some(StatusCode::UNPROCESSABLE_ENTITY),
                Some("bad segment".into()),
                None,
            )
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_encode_request_without_value() {
        let req = JsonProtocol
            .encode_request::<()>(http::Request::post("http://localhost/x"), None)
            .unwrap();
        assert!(req.body().is_empty());
        assert!(req.headers().get(CONTENT_TYPE).is_none());
        assert!(req.headers().get(ACCEPT).is_none());
    }

    #[test]
    fn test_encode_request_with_value() {
        let message = Message {
            message: "hello".to_string(),
        };
        let req = JsonProtocol
            .encode_request(http::Request::post("http://localhost/x"), Some(&message))
            .unwrap();
        assert_eq!(req.headers()[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(req.headers()[ACCEPT], APPLICATION_JSON);
        assert_eq!(req.body().as_ref(), br#"{"Message":"hello"}"#);
    }

    fn response(status: StatusCode, body: &'static str) -> http::Response<Bytes> {
        let mut response = http::Response::new(Bytes::from_static(body.as_bytes()));
        *response.status_mut() = status;
        response
    }

    #[test]
    fn test_decode_response_success() {
        let decoded: Message = JsonProtocol
            .decode_response(&response(StatusCode::CREATED, r#"{"Message":"hi"}"#))
            .unwrap();
        assert_eq!(decoded.message, "hi");

        JsonProtocol
            .decode_response::<()>(&response(StatusCode::NO_CONTENT, ""))
            .unwrap();
        let nothing: Option<Message> = JsonProtocol
            .decode_response(&response(StatusCode::NO_CONTENT, ""))
            .unwrap();
        assert!(nothing.is_none());
    }

    #[test]
    fn test_decode_response_error() {
        let err = JsonProtocol
            .decode_response::<Message>(&response(
                StatusCode::BAD_REQUEST,
                r#"{"status":400,"message":"invalid"}"#,
            ))
            .unwrap_err();
        match err {
            ClientError::Status(response) => {
                assert_eq!(response, ErrorResponse::new(StatusCode::BAD_REQUEST, "invalid"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_response_unstructured_error() {
        let err = JsonProtocol
            .decode_response::<Message>(&response(StatusCode::BAD_GATEWAY, "upstream down"))
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(err.to_string(), "502: upstream down");
    }
}
