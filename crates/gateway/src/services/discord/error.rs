//! Discord-related errors.

use thiserror::Error;

/// Errors that can occur when interacting with the Discord REST API.
#[derive(Debug, Clone, Error)]
pub enum DiscordError {
    /// HTTP request failed before a response arrived.
    #[error("Discord request failed: {0}")]
    Request(String),

    /// Failed to parse the response body.
    #[error("Discord response error: {0}")]
    Response(String),

    /// Discord returned an error status.
    #[error("Discord API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by Discord.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// No guild member matched the handle.
    #[error("No member found for handle: {0}")]
    MemberNotFound(String),

    /// Configuration error.
    #[error("Discord configuration error: {0}")]
    Config(String),
}
