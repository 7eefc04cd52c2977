//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber for binaries
//! - Provide the injectable, namespaced [`Logger`] handed to workers
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - A logger is a span scope; naming a logger nests a child span
//! - Log level configurable via config and `RUST_LOG`

use std::fmt;

use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Safe to call more than
/// once; later calls are ignored.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("http_worker={default_level},tower_http={default_level}").into()
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Namespaced logging scope.
///
/// Names compose with `.` the way nested loggers usually do:
/// `Logger::new("svc").named("http_worker")` is `svc.http_worker`. Events
/// emitted inside [`Logger::in_scope`] or instrumented with [`Logger::span`]
/// carry the `logger` field.
#[derive(Clone)]
pub struct Logger {
    name: String,
    span: Span,
}

impl Logger {
    /// Root logger with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let span = tracing::info_span!("logger", logger = %name);
        Self { name, span }
    }

    /// Child logger scoped under `segment`.
    pub fn named(&self, segment: &str) -> Self {
        let name = match (self.name.is_empty(), segment.is_empty()) {
            (_, true) => self.name.clone(),
            (true, false) => segment.to_string(),
            (false, false) => format!("{}.{}", self.name, segment),
        };
        let span = tracing::info_span!(parent: &self.span, "logger", logger = %name);
        Self { name, span }
    }

    /// Full dotted name of this logger.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Span carrying this logger's scope, for instrumenting futures.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Run `f` with this logger's span entered.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.span.in_scope(f)
    }
}

impl Default for Logger {
    /// Unnamed root logger.
    fn default() -> Self {
        Self {
            name: String::new(),
            span: Span::none(),
        }
    }
}

impl PartialEq for Logger {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Logger {}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_joins_with_dot() {
        let logger = Logger::new("svc").named("http_worker");
        assert_eq!(logger.name(), "svc.http_worker");
    }

    #[test]
    fn named_on_root_has_no_leading_dot() {
        let logger = Logger::default().named("http_worker");
        assert_eq!(logger.name(), "http_worker");
    }

    #[test]
    fn empty_segment_keeps_name() {
        let logger = Logger::new("svc").named("");
        assert_eq!(logger, Logger::new("svc"));
    }
}
