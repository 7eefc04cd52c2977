//! HTTP server handle.
//!
//! # Responsibilities
//! - Bind the finalized router to the configured address
//! - Run the accept loop until a stop is requested
//! - Drain connections on stop, abort them when forced
//! - Back off and retry when accept fails for lack of resources
//!
//! # Design Decisions
//! - The accept loop is biased towards the stop token: once a stop is
//!   requested no new connection is accepted
//! - The handle is built once and never restructured; only the bound socket
//!   address is recorded when the listener comes up

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::WorkerError;
use crate::lifecycle::shutdown::Shutdown;
use crate::net::listener::{self, Listener, ListenerError};
use crate::net::ConnectionTracker;
use crate::routing::Router;

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(5);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// A router bound to an address, ready to serve.
#[derive(Debug)]
pub struct Server {
    address: String,
    service: axum::Router,
    local_addr: OnceLock<SocketAddr>,
    force_closed: AtomicUsize,
}

impl Server {
    /// Finalize `router` and bind it to `address`. Nothing touches the
    /// network until [`serve`](Self::serve).
    pub fn new(address: impl Into<String>, router: Router) -> Self {
        Self {
            address: address.into(),
            service: router.into_service(),
            local_addr: OnceLock::new(),
            force_closed: AtomicUsize::new(0),
        }
    }

    /// Configured address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The finalized service, for dispatching requests without a socket.
    pub fn service(&self) -> axum::Router {
        self.service.clone()
    }

    /// Socket address the listener bound, once serving started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// `host:port` a local client dials to reach this server.
    pub fn probe_authority(&self) -> String {
        match self.local_addr() {
            Some(addr) => listener::probe_authority_for(addr),
            None => listener::probe_authority(&self.address),
        }
    }

    /// Connections aborted because the shutdown deadline elapsed.
    pub fn force_closed(&self) -> usize {
        self.force_closed.load(Ordering::SeqCst)
    }

    /// Serve until a stop is requested, then drain. If a forced close is
    /// requested while draining, remaining connections are aborted.
    pub async fn serve(&self, shutdown: &Shutdown) -> Result<(), WorkerError> {
        let listener = Listener::bind(&self.address).await.map_err(|e| match e {
            ListenerError::Bind { address, source } => WorkerError::Listen { address, source },
            ListenerError::Accept(source) => WorkerError::Accept(source),
        })?;

        let local_addr = listener.local_addr();
        let _ = self.local_addr.set(local_addr);
        tracing::info!(address = %local_addr, "HTTP server listening");

        let mut connections = ConnectionTracker::new(shutdown.stop_token().child_token());
        let mut backoff: Option<Duration> = None;
        let mut failure = None;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.stop_requested() => break,

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        backoff = None;
                        connections.serve(stream, peer, self.service.clone());
                    }
                    Err(e) if e.is_transient() => {
                        tracing::debug!(error = %e, "Dropped connection during accept");
                    }
                    Err(e) if e.is_fatal() => {
                        tracing::error!(error = %e, "Listener failed, no longer accepting");
                        failure = Some(e);
                        break;
                    }
                    Err(e) => {
                        let delay = next_backoff(backoff);
                        backoff = Some(delay);
                        tracing::warn!(error = %e, retry_in = ?delay, "Accept failed, retrying");
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = shutdown.stop_requested() => {}
                        }
                    }
                },

                Some(()) = connections.reap(), if !connections.is_empty() => {}
            }
        }

        drop(listener);
        tracing::info!(
            in_flight = connections.active_count(),
            "Listener closed, draining connections"
        );
        connections.drain();

        tokio::select! {
            biased;

            _ = connections.wait_idle() => {}

            _ = shutdown.forced() => {
                let closed = connections.force_close().await;
                self.force_closed.store(closed, Ordering::SeqCst);
                tracing::warn!(closed, "Forcibly closed connections");
            }
        }

        tracing::info!("HTTP server stopped");

        match failure {
            Some(ListenerError::Accept(source)) => Err(WorkerError::Accept(source)),
            Some(ListenerError::Bind { address, source }) => {
                Err(WorkerError::Listen { address, source })
            }
            None => Ok(()),
        }
    }
}

/// Pause after a retryable accept failure: 5ms, doubling up to one second.
fn next_backoff(previous: Option<Duration>) -> Duration {
    match previous {
        None => ACCEPT_BACKOFF_MIN,
        Some(delay) => (delay * 2).min(ACCEPT_BACKOFF_MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_backoff_doubles_up_to_a_second() {
        assert_eq!(next_backoff(None), Duration::from_millis(5));
        assert_eq!(next_backoff(Some(Duration::from_millis(5))), Duration::from_millis(10));
        assert_eq!(next_backoff(Some(Duration::from_millis(640))), Duration::from_secs(1));
        assert_eq!(next_backoff(Some(Duration::from_secs(1))), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn stop_before_any_connection_returns_ok() {
        let server = Server::new("127.0.0.1:0", crate::routing::Router::bare());
        let shutdown = Shutdown::new();
        shutdown.request_stop();

        server.serve(&shutdown).await.unwrap();
        assert!(server.local_addr().is_some());
        assert_eq!(server.force_closed(), 0);
    }
}
