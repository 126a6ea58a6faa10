//! Delivery channels and per-channel notification results.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A delivery channel for order notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Direct message to the customer's Discord handle.
    Dm,
    /// Broadcast to the shop's order channel.
    #[serde(rename = "channel")]
    Broadcast,
    /// Order confirmation email to the customer.
    Email,
}

impl Channel {
    /// All channels, in dispatch order.
    pub const ALL: [Self; 3] = [Self::Dm, Self::Broadcast, Self::Email];

    /// Wire name of this channel (`dm`, `channel`, `email`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dm => "dm",
            Self::Broadcast => "channel",
            Self::Email => "email",
        }
    }

    /// Parse a wire name; unknown names yield `None`.
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "dm" => Some(Self::Dm),
            "channel" => Some(Self::Broadcast),
            "email" => Some(Self::Email),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one delivery attempt on one channel.
///
/// Ephemeral: produced per attempt, aggregated into a [`DispatchOutcome`],
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResult {
    pub channel: Channel,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotificationResult {
    /// A successful delivery on `channel`.
    #[must_use]
    pub const fn ok(channel: Channel) -> Self {
        Self {
            channel,
            success: true,
            error: None,
        }
    }

    /// A failed delivery on `channel`, with the reason.
    #[must_use]
    pub fn failed(channel: Channel, error: impl Into<String>) -> Self {
        Self {
            channel,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Aggregate result of fanning one order out to its channels.
///
/// `success` is true only when every attempted channel succeeded. Individual
/// failures are always carried in `results`, never dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub success: bool,
    pub results: Vec<NotificationResult>,
}

impl DispatchOutcome {
    /// Aggregate per-channel results. Full success requires at least one
    /// attempted channel and no failures.
    #[must_use]
    pub fn from_results(results: Vec<NotificationResult>) -> Self {
        let success = !results.is_empty() && results.iter().all(|r| r.success);
        Self { success, results }
    }

    /// Whether at least one channel succeeded.
    #[must_use]
    pub fn any_success(&self) -> bool {
        self.results.iter().any(|r| r.success)
    }

    /// Whether at least one but not all attempted channels succeeded.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.any_success() && !self.success
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_wire_names() {
        assert_eq!(Channel::Dm.as_str(), "dm");
        assert_eq!(Channel::Broadcast.as_str(), "channel");
        assert_eq!(Channel::Email.as_str(), "email");
        assert_eq!(Channel::from_wire("channel"), Some(Channel::Broadcast));
        assert_eq!(Channel::from_wire("sms"), None);
    }

    #[test]
    fn test_channel_serde_uses_wire_names() {
        let json = serde_json::to_string(&Channel::Broadcast).unwrap();
        assert_eq!(json, "\"channel\"");
        let parsed: Channel = serde_json::from_str("\"dm\"").unwrap();
        assert_eq!(parsed, Channel::Dm);
    }

    #[test]
    fn test_full_success() {
        let outcome = DispatchOutcome::from_results(vec![
            NotificationResult::ok(Channel::Dm),
            NotificationResult::ok(Channel::Email),
        ]);
        assert!(outcome.success);
        assert!(!outcome.is_partial());
    }

    #[test]
    fn test_partial_failure_isolated() {
        let outcome = DispatchOutcome::from_results(vec![
            NotificationResult::failed(Channel::Dm, "recipient not found"),
            NotificationResult::ok(Channel::Broadcast),
        ]);
        assert!(!outcome.success);
        assert!(outcome.is_partial());
        assert_eq!(outcome.results.len(), 2);
        let failure = outcome.results.iter().find(|r| !r.success).unwrap();
        assert_eq!(failure.error.as_deref(), Some("recipient not found"));
    }

    #[test]
    fn test_empty_results_not_success() {
        let outcome = DispatchOutcome::from_results(Vec::new());
        assert!(!outcome.success);
        assert!(!outcome.any_success());
    }

    #[test]
    fn test_error_omitted_from_success_json() {
        let json = serde_json::to_string(&NotificationResult::ok(Channel::Email)).unwrap();
        assert!(!json.contains("error"));
    }
}
