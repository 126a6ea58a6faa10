//! Fixed-window rate limit for the notification API.
//!
//! The admission filter's token bucket already dampens bursts; this limiter
//! enforces the coarser per-caller budget on the API itself: 100 requests
//! per 15-minute window per client address, rejected uniformly regardless of
//! payload. State is per-instance memory, intentionally approximate.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Requests allowed per window per caller.
const WINDOW_CAP: u32 = 100;

/// Window length.
const WINDOW: Duration = Duration::from_secs(15 * 60);

/// A fixed-window request counter keyed by client address.
///
/// Windows do not slide: the count resets when the window that saw the first
/// request expires. Stale entries are dropped opportunistically on access.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    cap: u32,
    window: Duration,
    slots: Mutex<HashMap<IpAddr, WindowSlot>>,
}

#[derive(Debug, Clone, Copy)]
struct WindowSlot {
    started: Instant,
    count: u32,
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new(WINDOW_CAP, WINDOW)
    }
}

impl FixedWindowLimiter {
    /// Create a limiter with an explicit cap and window (tests use small ones).
    #[must_use]
    pub fn new(cap: u32, window: Duration) -> Self {
        Self {
            cap,
            window,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Count a request from `key`.
    ///
    /// # Errors
    ///
    /// Returns the seconds until the current window expires when the caller
    /// is over budget.
    pub fn check(&self, key: IpAddr) -> Result<(), u64> {
        let now = Instant::now();
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        // Opportunistic cleanup keeps the map bounded by active callers.
        slots.retain(|_, slot| now.duration_since(slot.started) < self.window);

        let slot = slots.entry(key).or_insert(WindowSlot {
            started: now,
            count: 0,
        });
        if slot.count >= self.cap {
            let remaining = self.window.saturating_sub(now.duration_since(slot.started));
            return Err(remaining.as_secs().max(1));
        }
        slot.count += 1;
        Ok(())
    }
}

/// Axum middleware applying the API limiter from `AppState`.
///
/// # Errors
///
/// Returns [`AppError::RateLimited`] with a retry hint when over budget.
pub async fn api_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let addr = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    state
        .api_limiter()
        .check(addr)
        .map_err(AppError::RateLimited)?;

    Ok(next.run(request).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn addr(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(203, 0, 113, last))
    }

    #[test]
    fn test_cap_enforced() {
        let limiter = FixedWindowLimiter::new(3, Duration::from_secs(600));
        for _ in 0..3 {
            limiter.check(addr(1)).unwrap();
        }
        let retry = limiter.check(addr(1)).unwrap_err();
        assert!(retry >= 1);
    }

    #[test]
    fn test_callers_counted_separately() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(600));
        limiter.check(addr(1)).unwrap();
        limiter.check(addr(2)).unwrap();
        assert!(limiter.check(addr(1)).is_err());
    }

    #[test]
    fn test_window_reset() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_millis(40));
        limiter.check(addr(1)).unwrap();
        assert!(limiter.check(addr(1)).is_err());

        std::thread::sleep(Duration::from_millis(60));
        assert!(limiter.check(addr(1)).is_ok());
    }
}
