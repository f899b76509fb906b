//! Per-request context.
//!
//! [`Context`] is the value a handler receives when it declares a context
//! parameter. It identifies the request and exposes whatever deadline and
//! cancellation signal the surrounding server attached. Nothing in this
//! crate creates a deadline or acts on cancellation.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps request ids sortable in logs.
///
/// ```
/// use restbind_core::RequestId;
///
/// let a = RequestId::new();
/// let b = RequestId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Read side of a cancellation signal.
///
/// Cloning is cheap; all clones observe the same signal. A handle created
/// with [`Cancellation::never`] is never cancelled.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    rx: Option<watch::Receiver<bool>>,
}

impl Cancellation {
    /// A handle that never fires.
    #[must_use]
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Wraps a watch receiver; the signal fires once the value is `true`.
    #[must_use]
    pub fn from_receiver(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }

    /// Creates a connected sender/handle pair.
    #[must_use]
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self::from_receiver(rx))
    }

    /// Returns true once the signal has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Waits until the signal fires.
    ///
    /// Pends forever if the sender is dropped without firing.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Per-request context handed to handlers.
///
/// ```
/// use std::time::Duration;
/// use restbind_core::Context;
///
/// let ctx = Context::new().with_timeout(Duration::from_secs(5));
/// assert!(ctx.remaining().unwrap() <= Duration::from_secs(5));
/// assert!(!ctx.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    request_id: RequestId,
    started_at: Instant,
    deadline: Option<Instant>,
    cancellation: Cancellation,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a context with a fresh request id, no deadline and no
    /// cancellation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context for an existing request id.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
            deadline: None,
            cancellation: Cancellation::never(),
        }
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline relative to when the request started.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = self.started_at + timeout;
        self.with_deadline(deadline)
    }

    /// Attaches a cancellation signal.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// When the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// The deadline, if the server set one.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline; zero once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns true if a deadline is set and has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// The cancellation handle.
    #[must_use]
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Returns true once the server has cancelled the request.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Waits for cancellation.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }
}
