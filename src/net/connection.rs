//! Per-connection serving and lifecycle tracking.
//!
//! # Responsibilities
//! - Serve each accepted connection on its own task (HTTP/1.1 and HTTP/2)
//! - Generate unique connection IDs for tracing
//! - Drain: switch every connection to graceful shutdown
//! - Force close: abort whatever is still running
//!
//! # Connection States
//! ```text
//! Active → Draining → Closed
//!            └─ deadline elapsed → aborted
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use hyper::{body::Incoming, Request};
use hyper_util::{
    rt::TokioIo,
    server::conn::auto,
};
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tower::Service;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Executor for the tasks hyper spawns per HTTP/2 stream.
///
/// Stream tasks live outside the connection task, so aborting the
/// connection alone would leave their handlers running. They are tied to
/// the tracker's abort token instead.
#[derive(Debug, Clone)]
struct StreamExecutor {
    aborted: CancellationToken,
}

impl<F> hyper::rt::Executor<F> for StreamExecutor
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    fn execute(&self, fut: F) {
        let aborted = self.aborted.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = fut => {}
                _ = aborted.cancelled() => {}
            }
        });
    }
}

/// Owns the tasks serving accepted connections.
#[derive(Debug)]
pub struct ConnectionTracker {
    tasks: JoinSet<()>,
    draining: CancellationToken,
    aborted: CancellationToken,
}

impl ConnectionTracker {
    /// Tracker whose connections drain when `draining` is cancelled.
    pub fn new(draining: CancellationToken) -> Self {
        Self {
            tasks: JoinSet::new(),
            draining,
            aborted: CancellationToken::new(),
        }
    }

    /// Serve `stream` with `service` on a new task.
    pub fn serve(&mut self, stream: TcpStream, peer: SocketAddr, service: axum::Router) {
        let id = ConnectionId::new();
        let draining = self.draining.clone();
        let executor = StreamExecutor {
            aborted: self.aborted.clone(),
        };

        self.tasks.spawn(async move {
            tracing::trace!(connection_id = %id, peer_addr = %peer, "Connection opened");

            let hyper_service = hyper::service::service_fn(move |request: Request<Incoming>| {
                service.clone().call(request)
            });

            let builder = auto::Builder::new(executor);
            let connection = builder.serve_connection(TokioIo::new(stream), hyper_service);
            tokio::pin!(connection);

            let result = tokio::select! {
                result = connection.as_mut() => result,
                _ = draining.cancelled() => {
                    connection.as_mut().graceful_shutdown();
                    connection.await
                }
            };

            if let Err(e) = result {
                tracing::debug!(connection_id = %id, error = %e, "Connection error");
            }
            tracing::trace!(connection_id = %id, "Connection closed");
        });
    }

    /// Number of connections still being served.
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for one connection task to finish. `None` when there are none.
    pub async fn reap(&mut self) -> Option<()> {
        let joined = self.tasks.join_next().await?;
        if let Err(e) = joined {
            if e.is_panic() {
                tracing::error!(error = %e, "Connection task panicked");
            }
        }
        Some(())
    }

    /// Stop taking new requests on every connection; in-flight requests
    /// complete.
    pub fn drain(&self) {
        self.draining.cancel();
    }

    /// Wait until every connection has closed.
    pub async fn wait_idle(&mut self) {
        while self.reap().await.is_some() {}
    }

    /// Abort every remaining connection. Returns how many were closed.
    pub async fn force_close(&mut self) -> usize {
        let remaining = self.tasks.len();
        self.aborted.cancel();
        self.tasks.shutdown().await;
        remaining
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert_eq!(format!("{}", id1), format!("conn-{}", id1.as_u64()));
    }

    async fn connected_pair() -> (TcpStream, TcpStream, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, peer) = listener.accept().await.unwrap();
        (client, server, peer)
    }

    fn slow_router() -> axum::Router {
        axum::Router::new().route(
            "/",
            axum::routing::get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "late"
            }),
        )
    }

    #[tokio::test]
    async fn idle_connection_closes_on_drain() {
        let (mut client, server, peer) = connected_pair().await;
        let mut tracker = ConnectionTracker::default();
        tracker.serve(server, peer, slow_router());
        assert_eq!(tracker.active_count(), 1);

        tracker.drain();
        tokio::time::timeout(Duration::from_secs(2), tracker.wait_idle())
            .await
            .expect("idle connection should close on drain");

        let mut buf = [0u8; 16];
        let n = client.read(&mut buf).await.unwrap_or(0);
        assert_eq!(n, 0, "server side should have closed");
    }

    #[tokio::test]
    async fn force_close_aborts_in_flight_requests() {
        let (mut client, server, peer) = connected_pair().await;
        let mut tracker = ConnectionTracker::default();
        tracker.serve(server, peer, slow_router());

        client
            .write_all(b"GET / HTTP/1.1\r\nHost: test\r\n\r\n")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        tracker.drain();
        assert_eq!(tracker.force_close().await, 1);
        assert!(tracker.is_empty());

        let mut buf = Vec::new();
        let read = tokio::time::timeout(Duration::from_secs(2), client.read_to_end(&mut buf))
            .await
            .expect("client should observe the close");
        assert!(read.is_err() || buf.is_empty(), "no response must be delivered");
    }

    #[tokio::test]
    async fn force_close_stops_http2_stream_handlers() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;

        let finished = Arc::new(AtomicBool::new(false));
        let router = axum::Router::new().route(
            "/",
            axum::routing::get({
                let finished = finished.clone();
                move || async move {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    finished.store(true, Ordering::SeqCst);
                    "late"
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let request = tokio::spawn(async move {
            reqwest::Client::builder()
                .http2_prior_knowledge()
                .no_proxy()
                .build()
                .unwrap()
                .get(format!("http://{addr}/"))
                .send()
                .await
        });

        let (server, peer) = listener.accept().await.unwrap();
        let mut tracker = ConnectionTracker::default();
        tracker.serve(server, peer, router);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(tracker.force_close().await, 1);
        assert!(request.await.unwrap().is_err());

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert!(
            !finished.load(Ordering::SeqCst),
            "stream handler kept running after the connection was aborted"
        );
    }
}
