//! # Restbind Server
//!
//! Route registration, HTTP serving and a typed client.
//!
//! - [`Router`] - registers handlers by method and path pattern and
//!   dispatches requests to them
//! - [`Server`] - hyper-based HTTP/1.1 server with graceful shutdown
//! - [`ServerConfig`] - file and environment driven settings
//! - [`Client`] - `reqwest` client speaking the same protocol
//! - [`logging`] - `tracing-subscriber` setup
//!
//! # Example
//!
//! ```rust,no_run
//! use restbind_core::prelude::*;
//! use restbind_server::{Router, Server, ServerConfig};
//!
//! async fn get_integer(id: i64) -> HandlerResult<i64> {
//!     Ok(id + 33)
//! }
//!
//! async fn teapot() -> HandlerResult<StatusCode> {
//!     Ok(StatusCode::IM_A_TEAPOT)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::new()
//!         .get("/integer/:id", get_integer)
//!         .get("/teapot", teapot);
//!
//!     let config = ServerConfig::default().with_env_overrides()?;
//!     Server::new(config).serve(router).await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/restbind-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
pub mod logging;
mod router;
mod server;
pub mod shutdown;

pub use client::Client;
pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_KEEP_ALIVE_SECS,
    DEFAULT_MAX_BODY_BYTES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
    ENV_HTTP_ADDR, ENV_MAX_BODY_BYTES, ENV_MAX_CONNECTIONS, ENV_REQUEST_TIMEOUT_SECS,
    ENV_SHUTDOWN_TIMEOUT_SECS,
};
pub use error::{ConfigError, ServerError};
pub use router::{RouteInfo, Router};
pub use server::{Server, X_REQUEST_ID};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
