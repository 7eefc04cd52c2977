//! TCP listener binding and address handling.
//!
//! # Responsibilities
//! - Accept addresses in `host:port` and `:port` form
//! - Bind and accept, classifying accept errors
//! - Derive the loopback authority a local probe should dial
//!
//! # Design Decisions
//! - `":8080"` means every interface, as in most server configs
//! - Per-connection accept errors are skipped, resource exhaustion is
//!   retried with backoff, and only a broken listener is fatal

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    /// Failed to accept connection.
    #[error("failed to accept: {0}")]
    Accept(#[source] io::Error),
}

impl ListenerError {
    /// True for errors that only concern the connection being accepted.
    pub fn is_transient(&self) -> bool {
        match self {
            ListenerError::Accept(e) => is_connection_error(e),
            ListenerError::Bind { .. } => false,
        }
    }

    /// True when the listener itself is unusable. Anything else, such as
    /// running out of file descriptors, is worth retrying after a pause.
    pub fn is_fatal(&self) -> bool {
        match self {
            ListenerError::Accept(e) => matches!(
                e.kind(),
                io::ErrorKind::InvalidInput | io::ErrorKind::Unsupported
            ),
            ListenerError::Bind { .. } => true,
        }
    }
}

fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

/// A bound TCP listener.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to `address` (`host:port` or `:port`).
    pub async fn bind(address: &str) -> Result<Self, ListenerError> {
        let bind_err = |source| ListenerError::Bind {
            address: address.to_string(),
            source,
        };

        let inner = TcpListener::bind(listen_address(address))
            .await
            .map_err(bind_err)?;
        let local_addr = inner.local_addr().map_err(bind_err)?;

        tracing::debug!(address = %local_addr, "Listener bound");

        Ok(Self { inner, local_addr })
    }

    /// Accept the next connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let (stream, peer) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        tracing::trace!(peer_addr = %peer, "Connection accepted");
        Ok((stream, peer))
    }

    /// Address actually bound (resolves `:0` to the chosen port).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Address handed to the OS: an empty host binds every interface.
pub fn listen_address(address: &str) -> String {
    if address.is_empty() {
        "0.0.0.0:80".to_string()
    } else if address.starts_with(':') {
        format!("0.0.0.0{address}")
    } else {
        address.to_string()
    }
}

/// `host:port` a local client should dial to reach a server configured
/// with `address`. Unspecified hosts become loopback.
pub fn probe_authority(address: &str) -> String {
    let address = listen_address(address);
    match address.rsplit_once(':') {
        Some(("0.0.0.0", port)) => format!("127.0.0.1:{port}"),
        Some(("[::]", port)) => format!("[::1]:{port}"),
        _ => address,
    }
}

/// Same as [`probe_authority`] for an already bound socket.
pub fn probe_authority_for(addr: SocketAddr) -> String {
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, addr.port()).to_string()
}
