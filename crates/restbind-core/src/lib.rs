//! # Restbind Core
//!
//! Handler signature binding, dispatch and the protocol boundary.
//!
//! This crate turns ordinary async functions into HTTP handlers:
//!
//! - [`Bind`] - how a parameter type gets its value (path segment, body,
//!   or passthrough)
//! - [`Signature`] - registration-time classification of a handler's
//!   parameters
//! - [`Handler`] - implemented for async functions of up to eight
//!   parameters; produces a [`Dispatcher`]
//! - [`IntoReply`] / [`Reply`] - how a success value maps to status and body
//! - [`ServerEncoder`] / [`ServerDecoder`] and the client halves - the
//!   pluggable wire format, with [`JsonProtocol`] as the default
//! - [`Context`] and [`Request`] - what handlers may ask for directly
//! - [`ErrorResponse`], [`error()`] and [`errorf!`] - errors carrying an
//!   HTTP status
//!
//! Routing lives in `restbind-router`; the HTTP server and registration
//! surface live in `restbind-server`.

#![doc(html_root_url = "https://docs.rs/restbind-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bind;
mod codec;
mod context;
mod error;
mod handler;
mod json;
mod protocol;
mod reply;
mod request;

pub use bind::{Bind, Binder, ParamRole, Signature};
pub use codec::{JsonProtocol, APPLICATION_JSON};
pub use context::{Cancellation, Context, RequestId};
pub use error::{
    error, BindError, BoxError, ClientError, ErrorResponse, HandlerResult, ProtocolError,
    RegistrationError,
};
pub use handler::{encode, reject, respond, BoxFuture, Dispatcher, Handler};
pub use json::Json;
pub use protocol::{
    default_status, ClientDecoder, ClientEncoder, ClientProtocol, HttpResponse, Protocol,
    ServerDecoder, ServerEncoder, ServerProtocol,
};
pub use reply::{IntoReply, Reply};
pub use request::{Request, RequestBuilder};

pub use restbind_router::{Params, PathPattern};

/// Common imports for writing handlers.
pub mod prelude {
    pub use crate::{errorf, Context, ErrorResponse, HandlerResult, Json, Reply, Request};
    pub use http::StatusCode;
}
