//! The registration surface.
//!
//! [`Router`] pairs the radix-tree matcher with one [`Dispatcher`] per
//! route. Handlers are classified when they are added, so a handler that
//! cannot be bound fails at startup rather than on its first request.
//!
//! # Example
//!
//! ```rust
//! use http::{Method, StatusCode};
//! use restbind_core::{HandlerResult, Json, Request};
//! use restbind_server::Router;
//!
//! async fn add(id: i64) -> HandlerResult<Json<i64>> {
//!     Ok(Json(id + 33))
//! }
//!
//! # tokio_test::block_on(async {
//! let router = Router::new().get("/integer/:id", add);
//!
//! let req = Request::builder().uri("/integer/10".parse().unwrap()).build();
//! let response = router.dispatch(req).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.body().as_ref(), b"43");
//! # });
//! ```

use std::fmt;
use std::sync::Arc;

use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};
use restbind_core::{
    encode, error, Dispatcher, Handler, HttpResponse, JsonProtocol, ParamRole,
    RegistrationError, Request, ServerProtocol, Signature,
};
use restbind_router::{parse_method, MatchError, PathPattern};

/// A registered route as reported by [`Router::routes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// HTTP method.
    pub method: Method,
    /// Path pattern as registered.
    pub pattern: String,
    /// Where each handler parameter is bound from.
    pub roles: Vec<ParamRole>,
}

/// Routes requests to handlers through a protocol `P`.
pub struct Router<P = JsonProtocol> {
    tree: restbind_router::Router<Dispatcher>,
    routes: Vec<RouteInfo>,
    protocol: Arc<P>,
}

impl Router<JsonProtocol> {
    /// A router speaking JSON.
    #[must_use]
    pub fn new() -> Self {
        Self::with_protocol(JsonProtocol)
    }
}

impl Default for Router<JsonProtocol> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for Router<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl<P: ServerProtocol> Router<P> {
    /// A router using a custom protocol for every route.
    #[must_use]
    pub fn with_protocol(protocol: P) -> Self {
        Self {
            tree: restbind_router::Router::new(),
            routes: Vec::new(),
            protocol: Arc::new(protocol),
        }
    }

    /// The protocol shared by every route.
    #[must_use]
    pub fn protocol(&self) -> &Arc<P> {
        &self.protocol
    }

    /// Registered routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    /// Registers `handler` for `method` and `path`.
    ///
    /// `method` is case-insensitive; `DEL` is accepted for `DELETE`.
    ///
    /// # Panics
    ///
    /// Panics if the route cannot be registered; see [`Router::try_add`].
    #[must_use]
    pub fn add<H, A>(mut self, method: &str, path: &str, handler: H) -> Self
    where
        H: Handler<A>,
    {
        if let Err(err) = self.try_add(method, path, handler) {
            panic!("cannot register {method} {path}: {err}");
        }
        self
    }

    /// Registers `handler`, reporting failures instead of panicking.
    ///
    /// Fails when the method is unsupported, the pattern is malformed, a
    /// parameter cannot be bound, or the route conflicts with an existing
    /// one. A failed registration leaves the router unchanged.
    pub fn try_add<H, A>(
        &mut self,
        method: &str,
        path: &str,
        handler: H,
    ) -> Result<&mut Self, RegistrationError>
    where
        H: Handler<A>,
    {
        let method = parse_method(method)?;
        let pattern = PathPattern::parse(path).map_err(restbind_router::RouteError::from)?;

        let mut signature = Signature::new(&pattern);
        let dispatcher = handler.into_dispatcher(&mut signature, Arc::clone(&self.protocol))?;

        let unused = signature.unused_segments();
        if !unused.is_empty() {
            tracing::debug!(
                method = %method,
                pattern = %pattern,
                unused = ?unused,
                "named segments not bound to any parameter"
            );
        }

        self.tree.insert(&method, &pattern, dispatcher)?;
        tracing::debug!(
            method = %method,
            pattern = %pattern,
            params = signature.roles().len(),
            body = signature.has_body(),
            "registered route"
        );

        self.routes.push(RouteInfo {
            method,
            pattern: pattern.as_str().to_string(),
            roles: signature.roles().to_vec(),
        });
        Ok(self)
    }

    /// Registers a `GET` route.
    #[must_use]
    pub fn get<H: Handler<A>, A>(self, path: &str, handler: H) -> Self {
        self.add("GET", path, handler)
    }

    /// Registers a `POST` route.
    #[must_use]
    pub fn post<H: Handler<A>, A>(self, path: &str, handler: H) -> Self {
        self.add("POST", path, handler)
    }

    /// Registers a `PUT` route.
    #[must_use]
    pub fn put<H: Handler<A>, A>(self, path: &str, handler: H) -> Self {
        self.add("PUT", path, handler)
    }

    /// Registers a `PATCH` route.
    #[must_use]
    pub fn patch<H: Handler<A>, A>(self, path: &str, handler: H) -> Self {
        self.add("PATCH", path, handler)
    }

    /// Registers a `DELETE` route.
    #[must_use]
    pub fn delete<H: Handler<A>, A>(self, path: &str, handler: H) -> Self {
        self.add("DELETE", path, handler)
    }

    /// Short form of [`Router::delete`].
    #[must_use]
    pub fn del<H: Handler<A>, A>(self, path: &str, handler: H) -> Self {
        self.add("DEL", path, handler)
    }

    /// Registers a `HEAD` route.
    #[must_use]
    pub fn head<H: Handler<A>, A>(self, path: &str, handler: H) -> Self {
        self.add("HEAD", path, handler)
    }

    /// Registers an `OPTIONS` route.
    #[must_use]
    pub fn options<H: Handler<A>, A>(self, path: &str, handler: H) -> Self {
        self.add("OPTIONS", path, handler)
    }

    /// Routes a request and runs its dispatcher.
    ///
    /// Unknown paths get 404 and known paths with an unregistered method get
    /// 405 with an `Allow` header; both are encoded through the protocol.
    pub async fn dispatch(&self, request: Request) -> HttpResponse {
        let found = self
            .tree
            .match_route(request.method(), request.path())
            .map(|found| (Arc::clone(found.value), found.params));

        match found {
            Ok((dispatcher, params)) => dispatcher(request.with_params(params)).await,
            Err(MatchError::NotFound) => {
                tracing::debug!(method = %request.method(), path = request.path(), "no route");
                let message = format!("no route for {}", request.path());
                self.reject(&request, StatusCode::NOT_FOUND, message)
            }
            Err(MatchError::MethodNotAllowed { allowed }) => {
                tracing::debug!(method = %request.method(), path = request.path(), "method not allowed");
                let message = format!("method {} not allowed for {}", request.method(), request.path());
                let mut response = self.reject(&request, StatusCode::METHOD_NOT_ALLOWED, message);

                let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(ALLOW, value);
                }
                response
            }
        }
    }

    fn reject(&self, request: &Request, status: StatusCode, message: String) -> HttpResponse {
        encode(
            &*self.protocol,
            request,
            Some(status),
            Some(error(status, message)),
            None::<&()>,
        )
    }
}
