//! Discord message payload types.
//!
//! A subset of the Discord REST message schema: content, embeds, and the
//! `allowed_mentions` object used to keep customer-supplied text from
//! pinging anyone.
//!
//! See: <https://discord.com/developers/docs/resources/channel#create-message>

use serde::{Deserialize, Serialize};

/// A message body POSTed to a channel.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePayload {
    /// Plain text above the embeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Rich embeds (at most 10 per message; we send one).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    /// Mention gating; always present so nothing ever pings.
    pub allowed_mentions: AllowedMentions,
}

impl MessagePayload {
    /// A message carrying a single embed and no mentions.
    #[must_use]
    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
            allowed_mentions: AllowedMentions::none(),
        }
    }

    /// A plain text message with no mentions.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
            allowed_mentions: AllowedMentions::none(),
        }
    }

    /// Add text above the embeds.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// The `allowed_mentions` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowedMentions {
    /// Mention types Discord may act on; an empty list suppresses all.
    pub parse: Vec<String>,
}

impl AllowedMentions {
    /// Suppress every mention type.
    #[must_use]
    pub const fn none() -> Self {
        Self { parse: Vec::new() }
    }
}

/// A rich embed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Accent color as `0xRRGGBB`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    /// ISO8601 timestamp rendered in the embed footer area.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Embed {
    /// Start an embed with a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Append a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

/// A name/value pair inside an embed.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Small footer text.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}
