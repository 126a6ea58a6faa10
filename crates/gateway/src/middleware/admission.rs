//! Edge admission filter: coarse abuse protection ahead of all routing.
//!
//! Evaluated before any business logic. Three cheap checks plus a keyed
//! token bucket:
//!
//! - Method allow-list: safe methods pass everywhere, POST only under `/api`
//! - Query-string budget: oversized query strings are rejected outright
//! - Hotlink guard: image assets require a same-origin (or absent) referer
//! - Rate limit: 60 requests/minute per (client address, user agent, path)
//!
//! The limiter state is per-instance memory, intentionally approximate: a
//! multi-instance deployment multiplies the budget by the instance count.
//! This filter is best-effort abuse damping, not a correctness-critical
//! component.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, Method, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::clock::{Clock, QuantaClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tracing::warn;
use url::Url;

use crate::state::AppState;

/// Requests per minute allowed per (address, user agent, path) tuple.
const REQUESTS_PER_MINUTE: u32 = 60;

/// Maximum accepted query-string length, in characters.
const MAX_QUERY_LEN: usize = 512;

/// Path suffixes treated as image assets for the hotlink guard.
const IMAGE_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".ico", ".avif",
];

type AdmissionLimiter =
    RateLimiter<AdmissionKey, DefaultKeyedStateStore<AdmissionKey>, QuantaClock>;

/// Limiter key: one bucket per caller per path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AdmissionKey {
    addr: IpAddr,
    user_agent: String,
    path: String,
}

/// The request facts the filter looks at.
#[derive(Debug)]
pub struct RequestMeta<'a> {
    pub addr: IpAddr,
    pub method: &'a Method,
    pub path: &'a str,
    pub query_len: usize,
    pub user_agent: &'a str,
    pub referer: Option<&'a str>,
}

/// Why a request was turned away at the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionRejection {
    /// Over the per-caller request budget.
    RateLimited {
        /// Seconds until the bucket admits another request.
        retry_after_secs: u64,
    },
    /// Method is not on the allow-list for this path.
    MethodNotAllowed,
    /// Image asset requested from a foreign origin.
    HotlinkBlocked,
    /// Query string exceeds the size budget.
    QueryTooLong,
}

impl IntoResponse for AdmissionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RateLimited { retry_after_secs } => {
                let mut response =
                    (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response();
                if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                    response.headers_mut().insert(RETRY_AFTER, value);
                }
                response
            }
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED.into_response(),
            Self::HotlinkBlocked => (StatusCode::FORBIDDEN, "hotlinking not allowed").into_response(),
            Self::QueryTooLong => StatusCode::URI_TOO_LONG.into_response(),
        }
    }
}

/// Per-instance admission filter. Construct once, inject via `AppState`.
pub struct AdmissionFilter {
    limiter: AdmissionLimiter,
    clock: QuantaClock,
    /// ASCII origin of the site (e.g. `https://mythicmarket.shop`), when known.
    site_origin: Option<String>,
}

impl std::fmt::Debug for AdmissionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionFilter")
            .field("site_origin", &self.site_origin)
            .finish_non_exhaustive()
    }
}

impl AdmissionFilter {
    /// Create a filter. `base_url`, when given, anchors the hotlink guard;
    /// without it the guard only accepts referer-less image requests.
    #[must_use]
    pub fn new(base_url: Option<String>) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(REQUESTS_PER_MINUTE)
                .expect("REQUESTS_PER_MINUTE is a positive constant"),
        );
        let clock = QuantaClock::default();
        let limiter = RateLimiter::new(quota, DefaultKeyedStateStore::default(), clock.clone());

        let site_origin = base_url.as_deref().and_then(|raw| match Url::parse(raw) {
            Ok(url) => Some(url.origin().ascii_serialization()),
            Err(e) => {
                warn!(base_url = raw, error = %e, "unparseable base URL, hotlink guard degraded");
                None
            }
        });

        Self {
            limiter,
            clock,
            site_origin,
        }
    }

    /// Evaluate a request against all admission rules.
    ///
    /// # Errors
    ///
    /// Returns the first applicable [`AdmissionRejection`].
    pub fn check(&self, meta: &RequestMeta<'_>) -> Result<(), AdmissionRejection> {
        if !method_allowed(meta.method, meta.path) {
            return Err(AdmissionRejection::MethodNotAllowed);
        }
        if meta.query_len > MAX_QUERY_LEN {
            return Err(AdmissionRejection::QueryTooLong);
        }
        if is_image_path(meta.path) && !self.referer_allowed(meta.referer) {
            return Err(AdmissionRejection::HotlinkBlocked);
        }

        let key = AdmissionKey {
            addr: meta.addr,
            user_agent: meta.user_agent.to_owned(),
            path: meta.path.to_owned(),
        };
        self.limiter.check_key(&key).map_err(|not_until| {
            let wait = not_until.wait_time_from(self.clock.now());
            AdmissionRejection::RateLimited {
                retry_after_secs: wait.as_secs().max(1),
            }
        })
    }

    /// An absent referer is allowed (direct navigation, privacy proxies);
    /// a present one must match the site origin.
    fn referer_allowed(&self, referer: Option<&str>) -> bool {
        let Some(referer) = referer else {
            return true;
        };
        let Ok(url) = Url::parse(referer) else {
            return false;
        };
        self.site_origin
            .as_deref()
            .is_some_and(|origin| url.origin().ascii_serialization() == origin)
    }
}

/// Safe methods pass everywhere; POST only for the API surface.
fn method_allowed(method: &Method, path: &str) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
        || (*method == Method::POST && path.starts_with("/api/"))
}

fn is_image_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Extract the client address: proxy headers first, then the socket peer.
fn client_ip(request: &Request) -> IpAddr {
    let headers = request.headers();

    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return ip;
    }

    if let Some(ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return ip;
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |info| info.0.ip())
}

/// Axum middleware applying the filter from `AppState`.
pub async fn admission_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let decision = {
        let meta = RequestMeta {
            addr: client_ip(&request),
            method: request.method(),
            path: request.uri().path(),
            query_len: request.uri().query().map_or(0, str::len),
            user_agent: request
                .headers()
                .get(axum::http::header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(""),
            referer: request
                .headers()
                .get(axum::http::header::REFERER)
                .and_then(|v| v.to_str().ok()),
        };
        state.admission().check(&meta)
    };

    match decision {
        Ok(()) => next.run(request).await,
        Err(rejection) => rejection.into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn meta<'a>(method: &'a Method, path: &'a str) -> RequestMeta<'a> {
        RequestMeta {
            addr: "203.0.113.9".parse().unwrap(),
            method,
            path,
            query_len: 0,
            user_agent: "test-agent",
            referer: None,
        }
    }

    #[test]
    fn test_safe_methods_pass() {
        let filter = AdmissionFilter::new(None);
        assert!(filter.check(&meta(&Method::GET, "/health")).is_ok());
        assert!(filter.check(&meta(&Method::HEAD, "/")).is_ok());
        assert!(filter.check(&meta(&Method::OPTIONS, "/anything")).is_ok());
    }

    #[test]
    fn test_post_only_allowed_under_api() {
        let filter = AdmissionFilter::new(None);
        assert!(
            filter
                .check(&meta(&Method::POST, "/api/discord/send-notification"))
                .is_ok()
        );
        assert_eq!(
            filter.check(&meta(&Method::POST, "/health")),
            Err(AdmissionRejection::MethodNotAllowed)
        );
        assert_eq!(
            filter.check(&meta(&Method::DELETE, "/api/discord/test")),
            Err(AdmissionRejection::MethodNotAllowed)
        );
    }

    #[test]
    fn test_query_budget_enforced() {
        let filter = AdmissionFilter::new(None);
        let mut m = meta(&Method::GET, "/products");
        m.query_len = MAX_QUERY_LEN + 1;
        assert_eq!(filter.check(&m), Err(AdmissionRejection::QueryTooLong));
        m.query_len = MAX_QUERY_LEN;
        assert!(filter.check(&m).is_ok());
    }

    #[test]
    fn test_hotlink_guard() {
        let filter = AdmissionFilter::new(Some("https://mythicmarket.shop".to_string()));

        // No referer: direct navigation, allowed.
        assert!(filter.check(&meta(&Method::GET, "/img/amulet.png")).is_ok());

        // Same origin: allowed.
        let mut own = meta(&Method::GET, "/img/amulet.png");
        own.referer = Some("https://mythicmarket.shop/products/amulet");
        assert!(filter.check(&own).is_ok());

        // Foreign origin: blocked.
        let mut foreign = meta(&Method::GET, "/img/amulet.png");
        foreign.referer = Some("https://scraper.example/embed");
        assert_eq!(
            filter.check(&foreign),
            Err(AdmissionRejection::HotlinkBlocked)
        );

        // Non-image paths ignore the referer entirely.
        let mut page = meta(&Method::GET, "/products/amulet");
        page.referer = Some("https://scraper.example/embed");
        assert!(filter.check(&page).is_ok());
    }

    #[test]
    fn test_sixty_first_request_rejected() {
        let filter = AdmissionFilter::new(None);
        let m = meta(&Method::GET, "/products");

        for i in 1..=REQUESTS_PER_MINUTE {
            assert!(filter.check(&m).is_ok(), "request {i} should be admitted");
        }
        match filter.check(&m) {
            Err(AdmissionRejection::RateLimited { retry_after_secs }) => {
                assert!(retry_after_secs >= 1);
            }
            other => panic!("expected rate limit rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_rate_limit_keyed_per_path() {
        let filter = AdmissionFilter::new(None);
        let products = meta(&Method::GET, "/products");
        for _ in 0..REQUESTS_PER_MINUTE {
            filter.check(&products).unwrap();
        }
        assert!(filter.check(&products).is_err());

        // A different path from the same caller has its own bucket.
        assert!(filter.check(&meta(&Method::GET, "/health")).is_ok());
    }
}
