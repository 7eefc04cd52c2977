//! Worker configuration options.
//!
//! Options are pure transforms over [`Settings`], applied in order before
//! the server handle is built. For each field the last option wins.

use std::fmt;
use std::time::Duration;

use crate::health::liveness;
use crate::lifecycle::ShutdownDeadline;
use crate::routing::Router;

/// Address used when no address option is supplied.
pub const DEFAULT_ADDRESS: &str = ":8080";

/// Everything an option can change.
#[derive(Debug)]
pub struct Settings {
    pub router: Router,
    pub address: String,
    pub shutdown_deadline: ShutdownDeadline,
}

impl Settings {
    /// Apply `options` in order.
    pub fn apply<I>(self, options: I) -> Self
    where
        I: IntoIterator<Item = WorkerOption>,
    {
        options.into_iter().fold(self, |settings, option| option.apply(settings))
    }
}

impl Default for Settings {
    /// Default router with the liveness route, [`DEFAULT_ADDRESS`], and a
    /// fresh default shutdown deadline.
    fn default() -> Self {
        let mut router = Router::new();
        liveness::register(&mut router);

        Self {
            router,
            address: DEFAULT_ADDRESS.to_string(),
            shutdown_deadline: ShutdownDeadline::default(),
        }
    }
}

/// A single configuration step.
pub struct WorkerOption(Box<dyn FnOnce(Settings) -> Settings + Send>);

impl WorkerOption {
    /// Option from an arbitrary transform.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Settings) -> Settings + Send + 'static,
    {
        Self(Box::new(f))
    }

    fn apply(self, settings: Settings) -> Settings {
        (self.0)(settings)
    }
}

impl fmt::Debug for WorkerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WorkerOption")
    }
}

/// Replace the router.
///
/// The worker adds the liveness route to `router` unless it already serves
/// `/livez`, in which case the caller's handler answers liveness probes.
pub fn with_router(router: Router) -> WorkerOption {
    WorkerOption::new(move |settings| Settings { router, ..settings })
}

/// Override the bind address (`host:port` or `:port`). Default `":8080"`.
pub fn with_address(address: impl Into<String>) -> WorkerOption {
    let address = address.into();
    WorkerOption::new(move |settings| Settings { address, ..settings })
}

/// Override the shutdown deadline.
pub fn with_shutdown_deadline(deadline: ShutdownDeadline) -> WorkerOption {
    WorkerOption::new(move |settings| Settings {
        shutdown_deadline: deadline,
        ..settings
    })
}

/// Shorthand for a relative shutdown deadline.
pub fn with_shutdown_timeout(timeout: Duration) -> WorkerOption {
    with_shutdown_deadline(ShutdownDeadline::within(timeout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::DEFAULT_SHUTDOWN_TIMEOUT;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.address, DEFAULT_ADDRESS);
        assert_eq!(settings.shutdown_deadline.timeout(), Some(DEFAULT_SHUTDOWN_TIMEOUT));
        assert!(settings.router.has_route(liveness::LIVENESS_PATH));
    }

    #[test]
    fn last_write_wins() {
        let settings = Settings::default().apply([
            with_address(":0"),
            with_shutdown_timeout(Duration::from_secs(9)),
            with_address("127.0.0.1:4242"),
            with_shutdown_timeout(Duration::from_secs(1)),
        ]);

        assert_eq!(settings.address, "127.0.0.1:4242");
        assert_eq!(settings.shutdown_deadline.timeout(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn address_option_leaves_router_alone() {
        let settings = Settings::default().apply([with_address(":4242")]);
        assert!(settings.router.has_route(liveness::LIVENESS_PATH));
        assert_eq!(settings.router.middlewares(), vec!["logger", "recoverer"]);
    }

    #[test]
    fn router_option_replaces_router() {
        let mut custom = Router::bare();
        custom.route("/test", axum::routing::get(|| async { "test" }));

        let settings = Settings::default().apply([with_router(custom)]);
        assert!(settings.router.has_route("/test"));
        assert!(!settings.router.has_route(liveness::LIVENESS_PATH));
        assert!(settings.router.middlewares().is_empty());
    }

    #[test]
    fn unbounded_deadline_option() {
        let settings = Settings::default().apply([with_shutdown_deadline(ShutdownDeadline::unbounded())]);
        assert_eq!(settings.shutdown_deadline.timeout(), None);
    }
}
