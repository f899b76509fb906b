//! # Restbind Test
//!
//! In-memory testing for restbind routers. Requests go through the same
//! routing, binding and encoding as on a live server, without a socket.
//!
//! ```
//! use restbind_core::prelude::*;
//! use restbind_server::Router;
//! use restbind_test::TestClient;
//! use serde_json::json;
//!
//! #[derive(serde::Serialize, serde::Deserialize)]
//! struct Message {
//!     #[serde(rename = "Message")]
//!     message: String,
//! }
//!
//! async fn teapot(Json(mut m): Json<Message>) -> HandlerResult<Json<Message>> {
//!     m.message.push_str(" teapot");
//!     Ok(Json(m))
//! }
//!
//! # tokio_test::block_on(async {
//! let client = TestClient::new(Router::new().post("/request_body", teapot));
//!
//! client
//!     .post("/request_body")
//!     .json(&json!({"Message": "hello"}))
//!     .send()
//!     .await
//!     .assert_status(StatusCode::CREATED)
//!     .assert_json_eq(&json!({"Message": "hello teapot"}));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/restbind-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::TestClient;
pub use error::TestError;
pub use request::TestRequest;
pub use response::TestResponse;
