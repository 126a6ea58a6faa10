//! Bearer-secret authentication for the notification API.
//!
//! The gateway has exactly one caller class (the storefront) and a single
//! shared secret; anything more elaborate would be ceremony. Mismatch or
//! absence rejects immediately, before validation or dispatch.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;

use crate::error::AppError;
use crate::state::AppState;

/// Middleware requiring `Authorization: Bearer <shared secret>`.
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] when the header is missing, malformed,
/// or carries the wrong secret.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("missing bearer credential".to_string()))?;

    if !secrets_match(presented, state.config().shared_secret.expose_secret()) {
        return Err(AppError::Unauthorized("invalid credential".to_string()));
    }

    Ok(next.run(request).await)
}

/// Compare without short-circuiting on the first differing byte.
fn secrets_match(presented: &str, expected: &str) -> bool {
    let presented = presented.as_bytes();
    let expected = expected.as_bytes();
    if presented.len() != expected.len() {
        return false;
    }
    presented
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
