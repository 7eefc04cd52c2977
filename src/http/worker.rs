//! HTTP worker: an HTTP server behind the supervisor lifecycle contract.
//!
//! # Lifecycle
//! ```text
//! new(logger, options)  Created      router + address + deadline → Server
//! init(logger)          Initialized  logger renamed to "http_worker"
//! run()                 Serving      blocks until terminated
//! terminate()           Terminating  stop accepting, drain within deadline
//!                       Terminated   (forced close if the deadline elapses)
//! alive()               Serving      GET /livez on the worker's bound socket
//! ```
//!
//! `run` and `terminate` must be called from different tasks; calling
//! `terminate` from the task blocked in `run` never completes.

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::Instrument;

use crate::error::{BoxError, ProbeError, WorkerError};
use crate::health::{self, liveness};
use crate::http::options::{Settings, WorkerOption};
use crate::http::server::Server;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::state::StateCell;
use crate::lifecycle::{Aliver, ShutdownDeadline, Worker, WorkerState};
use crate::net::listener::probe_authority_for;
use crate::observability::Logger;
use crate::routing::Router;

/// Name of the logging scope the worker switches to on `init`.
pub const LOGGER_NAME: &str = "http_worker";

/// HTTP server worker.
#[derive(Debug)]
pub struct HttpWorker {
    logger: Logger,
    router: Router,
    address: String,
    shutdown_deadline: ShutdownDeadline,
    server: Server,
    state: StateCell,
    shutdown: Shutdown,
}

impl HttpWorker {
    /// Build a worker from `options`, applied in order over the defaults.
    ///
    /// The liveness route is always present on the final router: it is
    /// added after the options unless the router already serves `/livez`.
    pub fn new<I>(logger: Logger, options: I) -> Self
    where
        I: IntoIterator<Item = WorkerOption>,
    {
        let Settings {
            mut router,
            address,
            shutdown_deadline,
        } = Settings::default().apply(options);

        if liveness::ensure(&mut router) {
            tracing::debug!("Liveness route added to the configured router");
        }

        let server = Server::new(address.clone(), router.clone());

        Self {
            logger,
            router,
            address,
            shutdown_deadline,
            server,
            state: StateCell::new(),
            shutdown: Shutdown::new(),
        }
    }

    /// Bind the worker to `logger`, scoped as `http_worker`.
    pub fn init(&mut self, logger: Logger) {
        self.logger = logger.named(LOGGER_NAME);
        let _ = self.state.advance(|state| {
            (state == WorkerState::Created).then_some(WorkerState::Initialized)
        });
    }

    /// Serve until terminated.
    ///
    /// Returns `Ok` after a requested stop (or straight away if the worker
    /// was already terminated), and an error if the listener cannot bind or
    /// fails while accepting.
    pub async fn run(&self) -> Result<(), WorkerError> {
        let began = self.state.advance(|state| match state {
            WorkerState::Created | WorkerState::Initialized => Some(WorkerState::Serving),
            _ => None,
        });

        match began {
            Ok(_) => {}
            Err(state) if state.is_stopping() => {
                self.logger
                    .in_scope(|| tracing::info!("Worker terminated before serving"));
                return Ok(());
            }
            Err(_) => return Err(WorkerError::AlreadyRunning),
        }

        let _serving = self.shutdown.serving_guard();

        self.logger.in_scope(|| {
            tracing::info!(address = %self.server.address(), "Starting http server");
        });

        let result = self
            .server
            .serve(&self.shutdown)
            .instrument(self.logger.span().clone())
            .await;

        if let Err(e) = &result {
            self.logger
                .in_scope(|| tracing::error!(error = %e, "Failed to serve http server"));
            self.state.set(WorkerState::Terminated);
        }

        result
    }

    /// Stop serving: no new connections, in-flight requests get until the
    /// shutdown deadline, then remaining connections are closed.
    ///
    /// Only the first call does anything; later calls return `Ok`.
    pub async fn terminate(&self) -> Result<(), WorkerError> {
        let started = Instant::now();

        let previous = self.state.advance(|state| match state {
            WorkerState::Created | WorkerState::Initialized => Some(WorkerState::Terminated),
            WorkerState::Serving => Some(WorkerState::Terminating),
            _ => None,
        });

        match previous {
            Ok(WorkerState::Serving) => {}
            Ok(_) => {
                self.shutdown.request_stop();
                self.logger
                    .in_scope(|| tracing::info!("Terminated http worker that never served"));
                return Ok(());
            }
            Err(_) => return Ok(()),
        }

        self.logger.in_scope(|| tracing::info!("Terminating http server"));
        self.shutdown.request_stop();

        let result = tokio::select! {
            biased;

            _ = self.shutdown.stopped() => Ok(()),

            _ = self.shutdown_deadline.expired(started) => {
                self.shutdown.force();
                self.shutdown.stopped().await;
                Err(WorkerError::ShutdownDeadlineExceeded {
                    closed: self.server.force_closed(),
                })
            }
        };

        self.state.set(WorkerState::Terminated);

        match &result {
            Ok(()) => self.logger.in_scope(|| {
                tracing::info!(elapsed = ?started.elapsed(), "Http server terminated");
            }),
            Err(e) => self
                .logger
                .in_scope(|| tracing::error!(error = %e, "Failed to shutdown http server")),
        }

        result
    }

    /// Probe `GET /livez` on the socket this worker bound.
    ///
    /// A worker that is not serving is never alive, whatever else answers
    /// on its configured address.
    pub async fn alive(&self) -> Result<(), WorkerError> {
        let result = match (self.state(), self.server.local_addr()) {
            (WorkerState::Serving, Some(addr)) => health::probe(&probe_authority_for(addr)).await,
            (state, _) => Err(WorkerError::HealthCheck {
                url: health::probe::liveness_url(&self.server.probe_authority()),
                source: ProbeError::NotServing(state),
            }),
        };
        if let Err(e) = &result {
            self.logger
                .in_scope(|| tracing::warn!(error = %e, "Liveness check failed"));
        }
        result
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The router requests are dispatched to.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Configured bind address.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn shutdown_deadline(&self) -> &ShutdownDeadline {
        &self.shutdown_deadline
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn state(&self) -> WorkerState {
        self.state.get()
    }
}

#[async_trait]
impl Worker for HttpWorker {
    fn init(&mut self, logger: Logger) -> Result<(), BoxError> {
        HttpWorker::init(self, logger);
        Ok(())
    }

    async fn run(&self) -> Result<(), BoxError> {
        HttpWorker::run(self).await.map_err(Into::into)
    }

    async fn terminate(&self) -> Result<(), BoxError> {
        HttpWorker::terminate(self).await.map_err(Into::into)
    }
}

#[async_trait]
impl Aliver for HttpWorker {
    async fn alive(&self) -> Result<(), BoxError> {
        HttpWorker::alive(self).await.map_err(Into::into)
    }
}
