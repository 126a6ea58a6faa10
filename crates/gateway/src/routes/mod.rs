//! HTTP surface of the gateway.
//!
//! Three endpoints: the authenticated notification API (send + recipient
//! probe) and an unauthenticated health check. The admission filter wraps
//! everything; the fixed-window API limiter and bearer auth wrap only the
//! `/api` routes.

pub mod health;
pub mod notifications;

use axum::{
    Router,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    admission_middleware, api_rate_limit, request_id_middleware, require_bearer,
};
use crate::state::AppState;

/// Build the full gateway router over the given state.
#[must_use]
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/discord/send-notification",
            post(notifications::send_notification),
        )
        .route("/api/discord/test", post(notifications::test_recipient))
        .layer(from_fn_with_state(state.clone(), require_bearer))
        .layer(from_fn_with_state(state.clone(), api_rate_limit));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        // Explicit fallback so the admission layers below cover unmatched
        // paths (the hotlink guard mostly sees asset paths we never route).
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), admission_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
