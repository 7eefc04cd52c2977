//! Dispatch engine adapter.
//!
//! # Responsibilities
//! - Build the default engine (request logging, then panic recovery)
//! - Register routes, mount services, group routes under a prefix
//! - Attach middleware in call order
//! - Finalize into the `axum::Router` handed to the server
//!
//! # Design Decisions
//! - Middleware is kept aside and layered at finalization: the first
//!   attached runs outermost and it wraps every route, including routes
//!   registered after it was attached
//! - Registered paths are remembered so callers can ask whether a route
//!   already exists instead of tripping axum's overlap panic

use std::collections::BTreeSet;
use std::convert::Infallible;

use axum::{extract::Request, response::IntoResponse, routing::MethodRouter};
use tower::Service;

use crate::routing::middleware::Middleware;

/// Request router with an ordered middleware chain.
#[derive(Debug, Clone, Default)]
pub struct Router {
    inner: axum::Router,
    middleware: Vec<Middleware>,
    paths: BTreeSet<String>,
}

impl Router {
    /// Default engine: logging and panic recovery attached, no routes.
    pub fn new() -> Self {
        let mut router = Self::bare();
        router.use_middleware([Middleware::logger(), Middleware::recoverer()]);
        router
    }

    /// Engine with no middleware and no routes.
    pub fn bare() -> Self {
        Self::default()
    }

    /// Register `method_router` at `path`.
    pub fn route(&mut self, path: &str, method_router: MethodRouter) -> &mut Self {
        self.inner = std::mem::take(&mut self.inner).route(path, method_router);
        self.paths.insert(path.to_string());
        self
    }

    /// Create a sub-scope rooted at `prefix`, hand it to `configure`, then
    /// mount it. Routes and middleware added to the scope stay in it.
    pub fn group<F>(&mut self, prefix: &str, configure: F) -> &mut Self
    where
        F: FnOnce(&mut Router),
    {
        let mut scope = Router::bare();
        configure(&mut scope);
        self.mount_router(prefix, scope)
    }

    /// Append middleware to the processing chain, in order.
    ///
    /// Must happen before the router is finalized for serving.
    pub fn use_middleware<I>(&mut self, middleware: I) -> &mut Self
    where
        I: IntoIterator<Item = Middleware>,
    {
        self.middleware.extend(middleware);
        self
    }

    /// Send every request under `prefix` to `handler`. `"/"` mounts the
    /// handler as the catch-all.
    pub fn mount<S>(&mut self, prefix: &str, handler: S) -> &mut Self
    where
        S: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Response: IntoResponse,
        S::Future: Send + 'static,
    {
        let inner = std::mem::take(&mut self.inner);
        self.inner = match normalize_prefix(prefix) {
            Some(prefix) => {
                self.paths.insert(prefix.clone());
                inner.nest_service(&prefix, handler)
            }
            None => {
                self.paths.insert("/".to_string());
                inner.fallback_service(handler)
            }
        };
        self
    }

    /// Mount another router under `prefix`, with its own middleware applied.
    pub fn mount_router(&mut self, prefix: &str, router: Router) -> &mut Self {
        let inner = std::mem::take(&mut self.inner);
        let nested_paths = router.paths.clone();
        let service = router.into_service();

        self.inner = match normalize_prefix(prefix) {
            Some(prefix) => {
                self.paths
                    .extend(nested_paths.iter().map(|p| join_path(&prefix, p)));
                self.paths.insert(prefix.clone());
                inner.nest(&prefix, service)
            }
            None => {
                self.paths.extend(nested_paths);
                inner.merge(service)
            }
        };
        self
    }

    /// True if `path` was registered as a route or mount point.
    pub fn has_route(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Names of the attached middleware, outermost first.
    pub fn middlewares(&self) -> Vec<&'static str> {
        self.middleware.iter().map(Middleware::name).collect()
    }

    /// Finalize into the service served over the network.
    pub fn into_service(self) -> axum::Router {
        self.middleware
            .iter()
            .rev()
            .fold(self.inner, |router, middleware| middleware.apply(router))
    }
}

/// `None` for the root, otherwise the prefix without a trailing slash.
fn normalize_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{trimmed}"))
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    if path == "/" {
        prefix.to_string()
    } else {
        format!("{prefix}{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware::{from_fn, Next},
        routing::get,
    };
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    async fn send(router: &Router, path: &str) -> (StatusCode, String) {
        let response = router
            .clone()
            .into_service()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn explode() -> &'static str {
        panic!("boom")
    }

    #[test]
    fn new_router_has_logger_and_recoverer() {
        let router = Router::new();
        assert_eq!(router.middlewares(), vec!["logger", "recoverer"]);
    }

    #[test]
    fn bare_router_has_no_middleware() {
        assert!(Router::bare().middlewares().is_empty());
    }

    #[tokio::test]
    async fn routes_added_after_middleware_are_served() {
        let mut router = Router::new();
        router.route("/hello", get(|| async { "hi" }));

        assert_eq!(send(&router, "/hello").await, (StatusCode::OK, "hi".into()));
        assert_eq!(send(&router, "/missing").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn recoverer_turns_panic_into_500() {
        let mut router = Router::new();
        router.route("/explode", get(explode));

        let (status, _) = send(&router, "/explode").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn group_scopes_do_not_leak_into_siblings() {
        let mut router = Router::new();
        router.group("/v1", |r| {
            r.route("/users", get(|| async { "v1 users" }));
        });
        router.group("/v2", |r| {
            r.route("/orders", get(|| async { "v2 orders" }));
        });

        assert_eq!(send(&router, "/v1/users").await.1, "v1 users");
        assert_eq!(send(&router, "/v2/orders").await.1, "v2 orders");
        assert_eq!(send(&router, "/v1/orders").await.0, StatusCode::NOT_FOUND);
        assert_eq!(send(&router, "/v2/users").await.0, StatusCode::NOT_FOUND);
        assert!(router.has_route("/v1/users"));
        assert!(!router.has_route("/v2/users"));
    }

    #[tokio::test]
    async fn group_middleware_only_wraps_its_scope() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let seen = hits.clone();

        let mut router = Router::bare();
        router.route("/open", get(|| async { "open" }));
        router.group("/admin", move |r| {
            r.use_middleware([Middleware::layer(
                "audit",
                from_fn(move |req: Request<Body>, next: Next| {
                    let seen = seen.clone();
                    async move {
                        seen.lock().unwrap().push(req.uri().path().to_string());
                        next.run(req).await
                    }
                }),
            )]);
            r.route("/panel", get(|| async { "panel" }));
        });

        send(&router, "/open").await;
        send(&router, "/admin/panel").await;

        assert_eq!(hits.lock().unwrap().len(), 1, "only the admin scope is audited");
    }

    #[tokio::test]
    async fn middleware_runs_in_attach_order() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let tag = |label: &'static str, order: Arc<Mutex<Vec<&'static str>>>| {
            Middleware::layer(
                label,
                from_fn(move |req: Request<Body>, next: Next| {
                    let order = order.clone();
                    async move {
                        order.lock().unwrap().push(label);
                        next.run(req).await
                    }
                }),
            )
        };

        let mut router = Router::bare();
        router.use_middleware([tag("first", order.clone())]);
        router.use_middleware([tag("second", order.clone())]);
        router.route("/", get(|| async { "ok" }));

        assert_eq!(send(&router, "/").await.0, StatusCode::OK);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(router.middlewares(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn mount_handles_everything_under_prefix() {
        let handler = axum::Router::new()
            .route("/", get(|| async { "root" }))
            .route("/deep", get(|| async { "deep" }));

        let mut router = Router::new();
        router.mount("/api", handler);

        assert_eq!(send(&router, "/api/deep").await.1, "deep");
        assert!(router.has_route("/api"));
    }

    #[tokio::test]
    async fn mount_at_root_is_catch_all() {
        let mut router = Router::new();
        router.route("/livez", get(|| async { "OK" }));
        router.mount("/", get(|| async { "Hello" }));

        assert_eq!(send(&router, "/anything/else").await.1, "Hello");
        assert_eq!(send(&router, "/livez").await.1, "OK");
    }

    #[test]
    fn prefixes_are_normalized() {
        assert_eq!(normalize_prefix("/"), None);
        assert_eq!(normalize_prefix(""), None);
        assert_eq!(normalize_prefix("/api/"), Some("/api".to_string()));
        assert_eq!(normalize_prefix("api"), Some("/api".to_string()));
    }
}
