//! Health check endpoint.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// Health check response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub upstreams: Upstreams,
}

/// Per-upstream delivery status.
#[derive(Debug, Serialize)]
pub struct Upstreams {
    pub discord: &'static str,
    pub email: &'static str,
}

/// Liveness + upstream configuration status. No auth.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let configured = |present: bool| if present { "configured" } else { "disabled" };
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        upstreams: Upstreams {
            discord: configured(state.discord().is_some()),
            email: configured(state.email().is_some()),
        },
    })
}
