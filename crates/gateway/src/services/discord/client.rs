//! Discord REST API client.
//!
//! Wraps the three calls the gateway needs: guild member search (handle
//! resolution), direct-channel creation, and message posting. Each call is
//! bounded by its own timeout and classified success/failure independently;
//! nothing here retries.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::DiscordConfig;

use super::error::DiscordError;
use super::types::MessagePayload;

/// Discord REST API base URL.
const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Per-call timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// How long a resolved DM channel id stays cached per user.
const DM_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Discord API client for handle resolution and message delivery.
#[derive(Clone)]
pub struct DiscordClient {
    client: reqwest::Client,
    guild_id: String,
    order_channel_id: String,
    /// user id -> DM channel id. Channel creation is idempotent upstream,
    /// the cache just saves a round trip per repeat customer.
    dm_channels: moka::future::Cache<String, String>,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("guild_id", &self.guild_id)
            .field("order_channel_id", &self.order_channel_id)
            .finish_non_exhaustive()
    }
}

/// A guild member from the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildMember {
    pub user: DiscordUser,
}

/// The user behind a guild member.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    pub global_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelResponse {
    id: String,
}

impl DiscordClient {
    /// Create a new Discord client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the bot token cannot form a valid header or the
    /// HTTP client fails to build.
    pub fn new(config: &DiscordConfig) -> Result<Self, DiscordError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bot {}", config.bot_token.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| DiscordError::Config(format!("invalid bot token: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DiscordError::Config(e.to_string()))?;

        Ok(Self {
            client,
            guild_id: config.guild_id.clone(),
            order_channel_id: config.order_channel_id.clone(),
            dm_channels: moka::future::Cache::builder()
                .max_capacity(10_000)
                .time_to_live(DM_CACHE_TTL)
                .build(),
        })
    }

    /// The configured order broadcast channel.
    #[must_use]
    pub fn order_channel_id(&self) -> &str {
        &self.order_channel_id
    }

    /// Resolve a customer handle to a guild member.
    ///
    /// Uses the member search endpoint and requires an exact (case
    /// insensitive) match on the username or display name; a prefix hit
    /// alone is not enough to DM someone about an order.
    ///
    /// # Errors
    ///
    /// Returns [`DiscordError::MemberNotFound`] when no member matches, or a
    /// transport/API error.
    #[instrument(skip(self))]
    pub async fn resolve_member(&self, handle: &str) -> Result<GuildMember, DiscordError> {
        let url = format!(
            "{DISCORD_API_BASE}/guilds/{}/members/search?query={}&limit=10",
            self.guild_id,
            urlencoding::encode(handle)
        );

        let members: Vec<GuildMember> = self.get_json(&url).await?;
        members
            .into_iter()
            .find(|m| {
                m.user.username.eq_ignore_ascii_case(handle)
                    || m.user
                        .global_name
                        .as_deref()
                        .is_some_and(|n| n.eq_ignore_ascii_case(handle))
            })
            .ok_or_else(|| DiscordError::MemberNotFound(handle.to_string()))
    }

    /// Open (or reuse) a direct-message channel with a user.
    ///
    /// # Errors
    ///
    /// Returns a transport/API error if the channel cannot be created.
    #[instrument(skip(self))]
    pub async fn open_dm(&self, user_id: &str) -> Result<String, DiscordError> {
        self.dm_channels
            .try_get_with(user_id.to_owned(), async {
                let url = format!("{DISCORD_API_BASE}/users/@me/channels");
                let body = serde_json::json!({ "recipient_id": user_id });
                let channel: ChannelResponse = self.post_json(&url, &body).await?;
                debug!(user_id, channel_id = %channel.id, "opened DM channel");
                Ok(channel.id)
            })
            .await
            .map_err(|e: std::sync::Arc<DiscordError>| (*e).clone())
    }

    /// Post a message to a channel (DM channel or broadcast channel alike).
    ///
    /// # Errors
    ///
    /// Returns a transport/API error if the message is not accepted.
    #[instrument(skip(self, payload), fields(channel = %channel_id))]
    pub async fn post_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), DiscordError> {
        let url = format!("{DISCORD_API_BASE}/channels/{channel_id}/messages");
        let _: serde_json::Value = self.post_json(&url, payload).await?;
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, DiscordError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DiscordError::Request(e.to_string()))?;
        Self::read_json(response).await
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, DiscordError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| DiscordError::Request(e.to_string()))?;
        Self::read_json(response).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DiscordError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(DiscordError::RateLimited(retry_after));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DiscordError::Response(e.to_string()))?;

        if !status.is_success() {
            return Err(DiscordError::Api {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| DiscordError::Response(e.to_string()))
    }
}
