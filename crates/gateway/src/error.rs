//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding. All route handlers return `Result<T, AppError>`.

use axum::{
    Json,
    http::{StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use mythic_market_core::{FieldError, ValidationErrors};
use serde::Serialize;
use thiserror::Error;

/// Application-level error type for the gateway.
#[derive(Debug, Error)]
pub enum AppError {
    /// The submission violates order invariants; terminal.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Missing or wrong bearer credential; terminal.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller exceeded the request budget; retry after the hint.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Every delivery channel is down or unconfigured.
    #[error("Upstream delivery unavailable: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body returned to clients.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Internal(_) | Self::Upstream(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Validation(errs) => ErrorBody {
                error: "validation failed".to_string(),
                details: Some(errs.fields().to_vec()),
            },
            Self::Unauthorized(_) => ErrorBody {
                error: "unauthorized".to_string(),
                details: None,
            },
            Self::RateLimited(secs) => ErrorBody {
                error: format!("rate limited, retry after {secs}s"),
                details: None,
            },
            Self::Upstream(_) => ErrorBody {
                error: "delivery temporarily unavailable".to_string(),
                details: None,
            },
            Self::Internal(_) => ErrorBody {
                error: "internal server error".to_string(),
                details: None,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Self::RateLimited(secs) = &self
            && let Ok(value) = secs.to_string().parse()
        {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            status_of(AppError::Unauthorized("bad token".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::RateLimited(30)),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(AppError::Upstream("discord down".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited(42).into_response();
        assert_eq!(
            response.headers().get(RETRY_AFTER).map(|v| v.to_str().ok()),
            Some(Some("42"))
        );
    }

    #[test]
    fn test_internal_detail_not_leaked() {
        let response = AppError::Internal("secret sauce exploded".to_string()).into_response();
        // Body is generic; the detailed message only goes to logs/Sentry.
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
