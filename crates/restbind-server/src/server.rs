//! HTTP serving.
//!
//! One tokio task per connection, HTTP/1.1 through hyper. Each request:
//!
//! 1. gets a [`Context`] carrying its request id (taken from an incoming
//!    `x-request-id` header when it is a UUID), the configured deadline and
//!    the server's shutdown signal as cancellation;
//! 2. has its body collected up to `max_body_bytes` (413 beyond it);
//! 3. is dispatched on its own task so a panicking handler only fails
//!    that request (500);
//! 4. is answered 504 if the deadline passes first.
//!
//! # Example
//!
//! ```rust,no_run
//! use restbind_core::HandlerResult;
//! use restbind_server::{Router, Server, ServerConfig};
//!
//! # async fn run() -> Result<(), restbind_server::ServerError> {
//! let router = Router::new().get("/ping", || async { HandlerResult::Ok("pong") });
//! let config = ServerConfig::builder().http_addr("127.0.0.1:8080").build();
//! Server::new(config).serve(router).await
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::HeaderValue;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use restbind_core::{encode, error, Context, HttpResponse, Request, RequestId, ServerProtocol};
use tokio::net::{TcpListener, TcpStream};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::router::Router;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Header carrying the request id on requests and responses.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Serves a [`Router`] over HTTP.
#[derive(Debug, Clone, Default)]
pub struct Server {
    config: ServerConfig,
}

struct Shared<P> {
    router: Router<P>,
    config: ServerConfig,
    shutdown: ShutdownSignal,
}

impl Server {
    /// Creates a server with `config`.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// The server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address and serves until SIGTERM or SIGINT.
    pub async fn serve<P: ServerProtocol>(self, router: Router<P>) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.serve_with_shutdown(router, shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn serve_with_shutdown<P: ServerProtocol>(
        self,
        router: Router<P>,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        self.config.validate()?;
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        self.serve_listener(listener, router, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` fires, then
    /// waits up to the shutdown timeout for open connections to finish.
    pub async fn serve_listener<P: ServerProtocol>(
        self,
        listener: TcpListener,
        router: Router<P>,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, routes = router.routes().len(), "server listening");

        let shared = Arc::new(Shared {
            router,
            config: self.config,
            shutdown: shutdown.clone(),
        });
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, remote_addr) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::error!(error = %e, "failed to accept connection");
                            continue;
                        }
                    };

                    if let Some(max) = shared.config.max_connections() {
                        if tracker.active_connections() >= max {
                            tracing::warn!(remote = %remote_addr, max, "connection limit reached, dropping connection");
                            continue;
                        }
                    }

                    let token = tracker.acquire();
                    let shared = Arc::clone(&shared);
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(shared, stream, remote_addr).await {
                            tracing::warn!(remote = %remote_addr, error = %e, "connection error");
                        }
                        drop(token);
                    });
                }
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        drop(listener);
        let timeout = shared.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_connections(),
            timeout_secs = timeout.as_secs(),
            "draining connections"
        );

        tokio::select! {
            () = tracker.wait_idle() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(timeout) => tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            ),
        }

        tracing::info!("server stopped");
        Ok(())
    }
}

async fn serve_connection<P: ServerProtocol>(
    shared: Arc<Shared<P>>,
    stream: TcpStream,
    remote_addr: SocketAddr,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let shutdown = shared.shutdown.clone();
    let keep_alive = shared.config.keep_alive_timeout().is_some();

    let service = service_fn(move |req: http::Request<Incoming>| {
        let shared = Arc::clone(&shared);
        async move { Ok::<_, Infallible>(handle_request(shared, req).await) }
    });

    let conn = http1::Builder::new()
        .keep_alive(keep_alive)
        .serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => return result,
        () = shutdown.recv() => {
            tracing::debug!(remote = %remote_addr, "closing connection for shutdown");
            conn.as_mut().graceful_shutdown();
        }
    }
    conn.await
}

async fn handle_request<P: ServerProtocol>(
    shared: Arc<Shared<P>>,
    req: http::Request<Incoming>,
) -> http::Response<Full<Bytes>> {
    let started = Instant::now();
    let request_id = incoming_request_id(&req).unwrap_or_default();

    let mut context =
        Context::with_request_id(request_id).with_cancellation(shared.shutdown.cancellation());
    if let Some(timeout) = shared.config.request_timeout() {
        context = context.with_timeout(timeout);
    }

    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let response = match Limited::new(body, shared.config.max_body_bytes()).collect().await {
        Ok(collected) => {
            let request = Request::new(parts.method, parts.uri, parts.headers, collected.to_bytes())
                .with_context(context);
            run(&shared, request).await
        }
        Err(err) => {
            let (status, message) = if err.downcast_ref::<LengthLimitError>().is_some() {
                (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("request body exceeds {} bytes", shared.config.max_body_bytes()),
                )
            } else {
                (StatusCode::BAD_REQUEST, format!("failed to read request body: {err}"))
            };
            tracing::warn!(request_id = %request_id, error = %err, "rejecting request body");
            let request = Request::new(parts.method, parts.uri, parts.headers, Bytes::new())
                .with_context(context);
            fail(&shared, &request, status, message)
        }
    };

    tracing::debug!(
        request_id = %request_id,
        http.method = %method,
        http.path = %path,
        http.status_code = response.status().as_u16(),
        duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "request completed"
    );

    finish(response, request_id)
}

async fn run<P: ServerProtocol>(shared: &Arc<Shared<P>>, request: Request) -> HttpResponse {
    let deadline = request.context().remaining();
    // Only the method and context are needed to encode a failure later.
    let fallback = Request::builder()
        .method(request.method().clone())
        .context(request.context().clone())
        .build();

    let mut task = {
        let shared = Arc::clone(shared);
        tokio::spawn(async move { shared.router.dispatch(request).await })
    };

    let joined = match deadline {
        Some(remaining) => match tokio::time::timeout(remaining, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                task.abort();
                tracing::warn!(request_id = %fallback.context().request_id(), "request deadline exceeded");
                return fail(
                    shared,
                    &fallback,
                    StatusCode::GATEWAY_TIMEOUT,
                    "request deadline exceeded".to_string(),
                );
            }
        },
        None => task.await,
    };

    match joined {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %fallback.context().request_id(), error = %e, "handler task failed");
            fail(
                shared,
                &fallback,
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

fn fail<P: ServerProtocol>(
    shared: &Shared<P>,
    request: &Request,
    status: StatusCode,
    message: String,
) -> HttpResponse {
    encode(
        &**shared.router.protocol(),
        request,
        Some(status),
        Some(error(status, message)),
        None::<&()>,
    )
}

fn incoming_request_id<B>(req: &http::Request<B>) -> Option<RequestId> {
    let value = req.headers().get(X_REQUEST_ID)?.to_str().ok()?;
    Uuid::parse_str(value.trim()).ok().map(RequestId::from_uuid)
}

fn finish(response: HttpResponse, request_id: RequestId) -> http::Response<Full<Bytes>> {
    let mut response = response.map(Full::new);
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
