//! Graceful shutdown.
//!
//! [`ShutdownSignal`] is a one-way latch shared by the accept loop, every
//! connection task and, through [`Cancellation`], every request context.
//! [`ConnectionTracker`] counts open connections so shutdown can drain them.
//!
//! # Example
//!
//! ```rust
//! use restbind_server::ShutdownSignal;
//!
//! let shutdown = ShutdownSignal::new();
//! let cancellation = shutdown.cancellation();
//! assert!(!cancellation.is_cancelled());
//!
//! shutdown.trigger();
//! assert!(shutdown.is_shutdown());
//! assert!(cancellation.is_cancelled());
//! ```

use std::sync::Arc;

use restbind_core::Cancellation;
use tokio::sync::watch;

/// A latch that fires once and stays fired.
///
/// Clones share the same latch.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Creates a signal triggered by SIGTERM or SIGINT (Ctrl+C elsewhere).
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });

        signal
    }

    /// Fires the signal. Idempotent.
    pub fn trigger(&self) {
        let fired = self.tx.send_if_modified(|triggered| {
            if *triggered {
                return false;
            }
            *triggered = true;
            true
        });
        if fired {
            tracing::info!("shutdown triggered");
        }
    }

    /// Returns true once the signal has fired.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }

    /// Completes when the signal fires, immediately if it already has.
    pub async fn recv(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }

    /// A cancellation handle tied to this signal, for request contexts.
    #[must_use]
    pub fn cancellation(&self) -> Cancellation {
        Cancellation::from_receiver(self.tx.subscribe())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "failed to install signal handlers");
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        _ = sigint.recv() => tracing::info!("received SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C"),
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Counts open connections.
///
/// ```rust
/// use restbind_server::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let token = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
/// drop(token);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    active: Arc<watch::Sender<usize>>,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        let (active, _) = watch::channel(0);
        Self {
            active: Arc::new(active),
        }
    }

    /// Registers a connection; it stays counted until the token drops.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.send_modify(|n| *n += 1);
        ConnectionToken {
            active: Arc::clone(&self.active),
        }
    }

    /// Number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        *self.active.borrow()
    }

    /// Completes once no connection is open.
    pub async fn wait_idle(&self) {
        let mut rx = self.active.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Held by a connection task; releases its slot on drop.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<watch::Sender<usize>>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        self.active.send_modify(|n| *n = n.saturating_sub(1));
    }
}
