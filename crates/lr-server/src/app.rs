//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, header};
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::client_script;
use crate::live_reload;
use crate::state::AppState;

/// Create the application router.
///
/// The browser script has a fixed path; every other path is the live reload
/// WebSocket, so clients may connect to `/` or anything else.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            client_script::SCRIPT_PATH,
            get(client_script::serve_client_script),
        )
        .fallback(live_reload::ws_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                )),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn router() -> Router {
        let (hub, _rx) = mpsc::channel(1);
        create_router(Arc::new(AppState { hub }))
    }

    #[tokio::test]
    async fn test_script_route_is_not_cached() {
        let response = router()
            .oneshot(
                Request::get(client_script::SCRIPT_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn test_plain_request_to_socket_path_is_rejected() {
        let response = router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
