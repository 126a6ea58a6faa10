//! Discord delivery via the REST API.
//!
//! One stateless HTTP client; no gateway/bot runtime. The two delivery
//! paths (direct message, channel broadcast) are independent remote calls:
//! each has its own timeout and is classified success/failure on its own.

mod client;
mod error;
mod messages;
mod types;

pub use client::{DiscordClient, DiscordUser, GuildMember};
pub use error::DiscordError;
pub use messages::{build_order_embed, build_test_message, dm_greeting, sanitize};
pub use types::{AllowedMentions, Embed, EmbedField, EmbedFooter, MessagePayload};
