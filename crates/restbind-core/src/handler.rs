//! Handler adaptation and dispatch.
//!
//! Any async function or closure whose parameters implement [`Bind`] and
//! which returns `Result<O, E>` with `O: IntoReply` and `E: Into<BoxError>`
//! is a [`Handler`]. Turning it into a [`Dispatcher`] classifies its
//! parameters once; the dispatcher then runs for every request:
//!
//! 1. binders run in declared order; the first failure is answered with
//!    `422 Unprocessable Entity` and the handler is not called;
//! 2. the handler is awaited;
//! 3. an error result is encoded with no status, so the protocol picks one;
//! 4. a success result is split into status and body by its [`Reply`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use http::StatusCode;
//! use restbind_core::{Handler, HandlerResult, JsonProtocol, Request, Signature};
//! use restbind_router::PathPattern;
//!
//! async fn add(id: i64) -> HandlerResult<i64> {
//!     Ok(id + 33)
//! }
//!
//! # tokio_test::block_on(async {
//! let pattern = PathPattern::parse("/integer/:id").unwrap();
//! let mut signature = Signature::new(&pattern);
//! let dispatcher = add.into_dispatcher(&mut signature, Arc::new(JsonProtocol)).unwrap();
//!
//! let req = Request::builder().param("id", "10").build();
//! let response = dispatcher(req).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.body().as_ref(), b"43");
//! # });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::Serialize;

use crate::bind::{Bind, Signature};
use crate::codec::APPLICATION_JSON;
use crate::error::{BindError, BoxError, RegistrationError};
use crate::protocol::{HttpResponse, ServerEncoder, ServerProtocol};
use crate::reply::IntoReply;
use crate::request::Request;

/// A boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// The per-route request handler produced at registration.
pub type Dispatcher = Arc<dyn Fn(Request) -> BoxFuture<HttpResponse> + Send + Sync>;

/// Body used when the protocol itself fails to encode a response.
const ENCODE_FAILURE_BODY: &str = r#"{"status":500,"message":"failed to encode response"}"#;

/// An async function usable as a route handler.
///
/// `Args` is the tuple of parameter types; it only exists to keep the
/// implementations for different arities apart.
pub trait Handler<Args>: Clone + Send + Sync + Sized + 'static {
    /// Classifies the parameters against `signature` and builds the
    /// dispatcher.
    fn into_dispatcher<P: ServerProtocol>(
        self,
        signature: &mut Signature,
        protocol: Arc<P>,
    ) -> Result<Dispatcher, RegistrationError>;
}

/// Answers a binder failure with 422.
pub fn reject<P: ServerEncoder>(protocol: &P, request: &Request, error: BindError) -> HttpResponse {
    tracing::debug!(
        request_id = %request.context().request_id(),
        error = %error,
        "rejecting request: parameter binding failed"
    );
    encode(
        protocol,
        request,
        Some(StatusCode::UNPROCESSABLE_ENTITY),
        Some(error.into()),
        None::<&()>,
    )
}

/// Interprets a handler's result and encodes it.
pub fn respond<P, O, E>(protocol: &P, request: &Request, outcome: Result<O, E>) -> HttpResponse
where
    P: ServerEncoder,
    O: IntoReply,
    E: Into<BoxError>,
{
    match outcome {
        Err(error) => {
            let error = error.into();
            tracing::debug!(
                request_id = %request.context().request_id(),
                error = %error,
                "handler returned an error"
            );
            encode(protocol, request, None, Some(error), None::<&()>)
        }
        Ok(output) => {
            let (status, body) = output.into_reply().into_parts();
            encode(protocol, request, status, None, body.as_ref())
        }
    }
}

/// Runs the protocol encoder, falling back to a fixed 500 if it fails.
pub fn encode<P, T>(
    protocol: &P,
    request: &Request,
    status: Option<StatusCode>,
    error: Option<BoxError>,
    body: Option<&T>,
) -> HttpResponse
where
    P: ServerEncoder,
    T: Serialize + ?Sized,
{
    match protocol.encode_response(request, status, error, body) {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(
                request_id = %request.context().request_id(),
                error = %err,
                "failed to encode response"
            );
            encode_failure()
        }
    }
}

fn encode_failure() -> HttpResponse {
    let mut response = http::Response::new(Bytes::from_static(ENCODE_FAILURE_BODY.as_bytes()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    response
}

macro_rules! impl_handler {
    ($($ty:ident => $var:ident),*) => {
        impl<F, Fut, O, E, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Result<O, E>> + Send + 'static,
            O: IntoReply,
            E: Into<BoxError> + 'static,
            $($ty: Bind,)*
        {
            #[allow(unused_variables)]
            fn into_dispatcher<P: ServerProtocol>(
                self,
                signature: &mut Signature,
                protocol: Arc<P>,
            ) -> Result<Dispatcher, RegistrationError> {
                $(let $var = <$ty as Bind>::binder(signature, &protocol)?;)*
                let binders = Arc::new(($($var,)*));

                Ok(Arc::new(move |request: Request| -> BoxFuture<HttpResponse> {
                    let handler = self.clone();
                    let protocol = Arc::clone(&protocol);
                    let binders = Arc::clone(&binders);
                    Box::pin(async move {
                        let ($($var,)*) = &*binders;
                        $(
                            let $var = match $var(&request) {
                                Ok(value) => value,
                                Err(error) => return reject(&*protocol, &request, error),
                            };
                        )*
                        let outcome = handler($($var),*).await;
                        respond(&*protocol, &request, outcome)
                    })
                }))
            }
        }
    };
}

impl_handler!();
impl_handler!(T1 => a1);
impl_handler!(T1 => a1, T2 => a2);
impl_handler!(T1 => a1, T2 => a2, T3 => a3);
impl_handler!(T1 => a1, T2 => a2, T3 => a3, T4 => a4);
impl_handler!(T1 => a1, T2 => a2, T3 => a3, T4 => a4, T5 => a5);
impl_handler!(T1 => a1, T2 => a2, T3 => a3, T4 => a4, T5 => a5, T6 => a6);
impl_handler!(T1 => a1, T2 => a2, T3 => a3, T4 => a4, T5 => a5, T6 => a6, T7 => a7);
impl_handler!(T1 => a1, T2 => a2, T3 => a3, T4 => a4, T5 => a5, T6 => a6, T7 => a7, T8 => a8);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonProtocol;
    use crate::context::Context;
    use crate::error::{error, ErrorResponse, HandlerResult};
    use crate::json::Json;
    use crate::reply::Reply;
    use http::Method;
    use restbind_router::PathPattern;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Message {
        #[serde(rename = "Message")]
        message: String,
    }

    fn dispatcher<H, A>(pattern: &str, handler: H) -> Dispatcher
    where
        H: Handler<A>,
    {
        let pattern = PathPattern::parse(pattern).unwrap();
        handler
            .into_dispatcher(&mut Signature::new(&pattern), Arc::new(JsonProtocol))
            .unwrap()
    }

    fn registration_error<H, A>(pattern: &str, handler: H) -> RegistrationError
    where
        H: Handler<A>,
    {
        let pattern = PathPattern::parse(pattern).unwrap();
        match handler.into_dispatcher(&mut Signature::new(&pattern), Arc::new(JsonProtocol)) {
            Ok(_) => panic!("registration unexpectedly succeeded"),
            Err(err) => err,
        }
    }

    fn body_json(response: &HttpResponse) -> serde_json::Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn test_error_only_handler() {
        let d = dispatcher("/ok", || async { HandlerResult::Ok(()) });
        let response = d(Request::builder().build()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn test_structured_error() {
        let d = dispatcher("/custom_error", || async {
            Err::<(), _>(error(StatusCode::BAD_REQUEST, "invalid"))
        });
        let response = d(Request::builder().build()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(&response),
            serde_json::json!({"status": 400, "message": "invalid"})
        );
    }

    #[tokio::test]
    async fn test_plain_error() {
        let d = dispatcher("/normal_error", || async { Err::<(), _>("error") });
        let response = d(Request::builder().build()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(&response),
            serde_json::json!({"status": 500, "message": "error"})
        );
    }

    #[tokio::test]
    async fn test_error_wins_over_body_and_status() {
        let d = dispatcher("/x", || async {
            Err::<(Json<u8>, StatusCode), _>(ErrorResponse::new(StatusCode::CONFLICT, "taken"))
        });
        let response = d(Request::builder().build()).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_integer_path_param() {
        let d = dispatcher("/integer/:id", |id: i64| async move { HandlerResult::Ok(id + 33) });
        let response = d(Request::builder().param("id", "10").build()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"43");
    }

    #[tokio::test]
    async fn test_binder_failure_is_422_and_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let d = dispatcher("/integer/:id", move |id: i64| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                HandlerResult::Ok(id)
            }
        });

        let response = d(Request::builder().param("id", "ten").build()).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(&response);
        assert_eq!(body["status"], 422);
        assert!(body["message"].as_str().unwrap().contains("\"ten\""));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_status_only() {
        let d = dispatcher("/override_status_code", || async {
            HandlerResult::Ok(StatusCode::IM_A_TEAPOT)
        });
        let response = d(Request::builder().build()).await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn test_body_and_status() {
        let d = dispatcher("/override_status_code_with_body", || async {
            HandlerResult::Ok((
                Json(Message {
                    message: "teapot".into(),
                }),
                StatusCode::IM_A_TEAPOT,
            ))
        });
        let response = d(Request::builder().build()).await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(body_json(&response), serde_json::json!({"Message": "teapot"}));
    }

    #[tokio::test]
    async fn test_post_body_roundtrip() {
        let d = dispatcher("/request_body", |Json(req): Json<Message>| async move {
            HandlerResult::Ok(Json(Message {
                message: format!("{} teapot", req.message),
            }))
        });
        let request = Request::builder()
            .method(Method::POST)
            .body(r#"{"Message":"hello"}"#)
            .build();
        let response = d(request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(&response),
            serde_json::json!({"Message": "hello teapot"})
        );
    }

    #[tokio::test]
    async fn test_undecodable_body_is_422() {
        let d = dispatcher("/request_body", |Json(req): Json<Message>| async move {
            HandlerResult::Ok(Json(req))
        });
        let request = Request::builder().method(Method::POST).body("nope").build();
        assert_eq!(d(request).await.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_none_body_is_no_content() {
        let d = dispatcher("/maybe", || async { HandlerResult::Ok(None::<Json<u8>>) });
        let request = Request::builder().method(Method::POST).build();
        assert_eq!(d(request).await.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_reply_variants() {
        let d = dispatcher("/reply/:kind", |kind: String| async move {
            let reply = match kind.as_str() {
                "none" => Reply::NoBody,
                "body" => Reply::Body(1),
                "status" => Reply::Status(StatusCode::ACCEPTED),
                _ => Reply::BodyAndStatus(2, StatusCode::PARTIAL_CONTENT),
            };
            HandlerResult::Ok(reply)
        });
        let call = |kind: &str| d(Request::builder().param("kind", kind).build());

        assert_eq!(call("none").await.status(), StatusCode::NO_CONTENT);
        assert_eq!(call("body").await.status(), StatusCode::OK);
        assert_eq!(call("status").await.status(), StatusCode::ACCEPTED);
        let both = call("both").await;
        assert_eq!(both.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(both.body().as_ref(), b"2");
    }

    #[tokio::test]
    async fn test_passthroughs() {
        let d = dispatcher(
            "/users/:id",
            |ctx: Context, req: Request, id: u32| async move {
                HandlerResult::Ok(Json(serde_json::json!({
                    "id": id,
                    "path": req.path(),
                    "request_id": ctx.request_id().to_string(),
                })))
            },
        );
        let ctx = Context::new();
        let request_id = ctx.request_id().to_string();
        let request = Request::builder()
            .uri("/users/5".parse().unwrap())
            .param("id", "5")
            .context(ctx)
            .build();

        let body = body_json(&d(request).await);
        assert_eq!(body["id"], 5);
        assert_eq!(body["path"], "/users/5");
        assert_eq!(body["request_id"], request_id);
    }

    #[test]
    fn test_two_bodies_fail_registration() {
        let err = registration_error("/two", |a: Json<Message>, b: Json<Message>| async move {
            HandlerResult::Ok(Json(vec![a.0, b.0]))
        });
        assert!(matches!(err, RegistrationError::NoBindingSource { position: 2, .. }));
    }

    #[test]
    fn test_body_type_on_segment_fails_registration() {
        let err = registration_error("/flags/:flag", |flag: bool| async move {
            HandlerResult::Ok(flag)
        });
        assert!(matches!(err, RegistrationError::UnsupportedPathType { .. }));
    }

    #[test]
    fn test_signature_descriptor() {
        let pattern = PathPattern::parse("/orgs/:org/items/:id").unwrap();
        let mut signature = Signature::new(&pattern);
        (|_ctx: Context, _org: String, _id: u64, _body: Json<Message>| async {
            HandlerResult::Ok(())
        })
        .into_dispatcher(&mut signature, Arc::new(JsonProtocol))
        .unwrap();

        assert_eq!(signature.roles().len(), 4);
        assert!(signature.has_body());
        assert!(signature.unused_segments().is_empty());
    }

    #[test]
    fn test_encode_failure_fallback() {
        let response = encode_failure();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body().as_ref(), ENCODE_FAILURE_BODY.as_bytes());
    }
}
