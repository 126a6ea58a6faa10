//! HTTP middleware stack for the gateway.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, trace transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Admission filter (rate limit, method allow-list, hotlink guard)
//! 5. API fixed-window rate limit (`/api` routes only)
//! 6. Bearer auth (`/api` routes only)

pub mod admission;
pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use admission::{AdmissionFilter, admission_middleware};
pub use auth::require_bearer;
pub use rate_limit::{FixedWindowLimiter, api_rate_limit};
pub use request_id::request_id_middleware;
