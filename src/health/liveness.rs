//! Liveness endpoint.
//!
//! `GET /livez` answers `200` with body `OK`. The response declares
//! `application/json` although the body is plain text; existing monitors
//! match on that exact response, so it is kept as is.

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
};

use crate::routing::Router;

/// Fixed path of the liveness route.
pub const LIVENESS_PATH: &str = "/livez";

/// Handler for [`LIVENESS_PATH`].
pub async fn liveness() -> impl IntoResponse {
    // Content type kept for compatibility, see module docs.
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        "OK",
    )
}

/// Register the liveness route on `router`.
pub fn register(router: &mut Router) {
    router.route(LIVENESS_PATH, get(liveness));
}

/// Register the liveness route unless `router` already serves the path.
///
/// Returns `true` if the route was added.
pub fn ensure(router: &mut Router) -> bool {
    if router.has_route(LIVENESS_PATH) {
        return false;
    }
    register(router);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn responds_ok_with_json_content_type() {
        let mut router = Router::new();
        register(&mut router);

        let response = router
            .into_service()
            .oneshot(Request::get(LIVENESS_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[test]
    fn ensure_is_a_no_op_when_present() {
        let mut router = Router::new();
        assert!(ensure(&mut router));
        assert!(!ensure(&mut router));
        assert!(router.has_route(LIVENESS_PATH));
    }

    #[test]
    fn ensure_respects_custom_liveness_route() {
        let mut router = Router::new();
        router.route(LIVENESS_PATH, get(|| async { "custom" }));
        assert!(!ensure(&mut router));
    }
}
