//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Instant;

use crate::config::GatewayConfig;
use crate::middleware::admission::AdmissionFilter;
use crate::middleware::rate_limit::FixedWindowLimiter;
use crate::services::discord::DiscordClient;
use crate::services::email::EmailService;

/// Error constructing application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("discord client error: {0}")]
    Discord(#[from] crate::services::discord::DiscordError),
    #[error("email transport error: {0}")]
    Email(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Every dependency with cross-request state
/// (delivery clients, rate limiters) is constructed here and injected, so
/// tests can build a state with exactly the pieces they want and separate
/// instances never share counters by accident.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GatewayConfig,
    discord: Option<DiscordClient>,
    email: Option<EmailService>,
    admission: AdmissionFilter,
    api_limiter: FixedWindowLimiter,
    started_at: Instant,
}

impl AppState {
    /// Create application state from configuration, building the delivery
    /// clients for whichever channels are configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured delivery client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, StateError> {
        let discord = config
            .discord
            .as_ref()
            .map(DiscordClient::new)
            .transpose()?;
        let email = config.email.as_ref().map(EmailService::new).transpose()?;
        let admission = AdmissionFilter::new(config.base_url.clone());
        let api_limiter = FixedWindowLimiter::default();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                discord,
                email,
                admission,
                api_limiter,
                started_at: Instant::now(),
            }),
        })
    }

    /// Get a reference to the gateway configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Discord delivery client, when configured.
    #[must_use]
    pub fn discord(&self) -> Option<&DiscordClient> {
        self.inner.discord.as_ref()
    }

    /// Email delivery service, when configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// The edge admission filter instance.
    #[must_use]
    pub fn admission(&self) -> &AdmissionFilter {
        &self.inner.admission
    }

    /// The fixed-window limiter guarding the notification API.
    #[must_use]
    pub fn api_limiter(&self) -> &FixedWindowLimiter {
        &self.inner.api_limiter
    }

    /// Seconds since this instance started serving.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}
