use axum::{
    Router,
    extract::{MatchedPath, Request},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::core::state::AppState;
use crate::routes::{api, pages};

pub(crate) fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/auth/start", get(pages::auth_start))
        .route("/auth/callback", get(pages::auth_callback))
        .route("/api/status", get(api::status))
        .route("/api/refresh", post(api::refresh))
        .route("/api/clear", post(api::clear))
        .route("/api/diagnostics", get(api::diagnostics))
        .route("/api/test-request", post(api::test_request))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str);

                info_span!(
                    "request",
                    method = ?request.method(),
                    matched_path,
                )
            }),
        )
}
