//! Cross-cutting request middleware.
//!
//! # Design Decisions
//! - A middleware is recorded on the router and applied when the router is
//!   finalized, so it also wraps routes registered after it was attached
//! - Any tower layer accepted by `axum::Router::layer` can be wrapped

use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::Route,
};
use tower::{Layer, Service};
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

type Apply = dyn Fn(axum::Router) -> axum::Router + Send + Sync;

/// A named step in the router's processing chain.
#[derive(Clone)]
pub struct Middleware {
    name: &'static str,
    apply: Arc<Apply>,
}

impl Middleware {
    /// Middleware from a function that wraps the finalized router.
    pub fn new<F>(name: &'static str, apply: F) -> Self
    where
        F: Fn(axum::Router) -> axum::Router + Send + Sync + 'static,
    {
        Self {
            name,
            apply: Arc::new(apply),
        }
    }

    /// Middleware from a tower layer.
    pub fn layer<L>(name: &'static str, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        Self::new(name, move |router| router.layer(layer.clone()))
    }

    /// Request logging: one INFO span and one INFO event per request.
    pub fn logger() -> Self {
        Self::layer(
            "logger",
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
    }

    /// Panic recovery: a panicking handler yields `500` instead of tearing
    /// down the connection.
    pub fn recoverer() -> Self {
        Self::layer("recoverer", CatchPanicLayer::custom(recover_panic))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn apply(&self, router: axum::Router) -> axum::Router {
        (self.apply)(router)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Middleware").field(&self.name).finish()
    }
}

fn recover_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    tracing::error!(panic = %detail, "Handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
