//! Order fan-out across delivery channels.
//!
//! Channels are independent: each attempt produces its own
//! [`NotificationResult`], one channel's failure never blocks another, and
//! the attempts for one order run concurrently. Failures are carried in the
//! aggregate outcome, never swallowed.

use futures::future::join_all;
use mythic_market_core::{Channel, DispatchOutcome, NotificationResult, Order};
use tracing::{info, instrument};

use crate::state::AppState;

use super::best_effort;
use super::discord::{MessagePayload, build_order_embed, dm_greeting};

/// Run a set of per-channel attempt futures and aggregate their results.
///
/// Split out from [`dispatch_order`] so tests can drive the aggregation with
/// scripted attempts instead of live clients.
pub async fn run_attempts<F>(attempts: Vec<F>) -> DispatchOutcome
where
    F: Future<Output = NotificationResult>,
{
    DispatchOutcome::from_results(join_all(attempts).await)
}

/// Fan an order out to the requested channels.
///
/// A requested channel whose client is not configured fails with an explicit
/// "not configured" result rather than being skipped silently.
#[instrument(skip(state, order), fields(order = %order.order_number))]
pub async fn dispatch_order(
    state: &AppState,
    order: &Order,
    channels: &[Channel],
) -> DispatchOutcome {
    let attempts: Vec<_> = channels
        .iter()
        .map(|&channel| attempt_channel(state, order, channel))
        .collect();

    let outcome = run_attempts(attempts).await;
    info!(
        order = %order.order_number,
        success = outcome.success,
        attempted = outcome.results.len(),
        "order dispatch finished"
    );
    outcome
}

async fn attempt_channel(state: &AppState, order: &Order, channel: Channel) -> NotificationResult {
    let result = match channel {
        Channel::Dm => attempt_dm(state, order).await,
        Channel::Broadcast => attempt_broadcast(state, order).await,
        Channel::Email => attempt_email(state, order).await,
    };
    match result {
        Ok(()) => NotificationResult::ok(channel),
        Err(message) => {
            tracing::warn!(channel = %channel, error = %message, "channel delivery failed");
            NotificationResult::failed(channel, message)
        }
    }
}

async fn attempt_dm(state: &AppState, order: &Order) -> Result<(), String> {
    let discord = state
        .discord()
        .ok_or_else(|| "discord delivery not configured".to_string())?;
    let handle = order
        .customer
        .handle
        .as_deref()
        .ok_or_else(|| "order has no customer handle".to_string())?;

    let member = discord
        .resolve_member(handle)
        .await
        .map_err(|e| e.to_string())?;
    let channel_id = discord
        .open_dm(&member.user.id)
        .await
        .map_err(|e| e.to_string())?;

    let payload = MessagePayload::embed(build_order_embed(order)).with_content(dm_greeting(order));
    discord
        .post_message(&channel_id, &payload)
        .await
        .map_err(|e| e.to_string())
}

async fn attempt_broadcast(state: &AppState, order: &Order) -> Result<(), String> {
    let discord = state
        .discord()
        .ok_or_else(|| "discord delivery not configured".to_string())?;

    let payload = MessagePayload::embed(build_order_embed(order));
    discord
        .post_message(discord.order_channel_id(), &payload)
        .await
        .map_err(|e| e.to_string())
}

async fn attempt_email(state: &AppState, order: &Order) -> Result<(), String> {
    let email = state
        .email()
        .ok_or_else(|| "email delivery not configured".to_string())?;

    email
        .send_order_confirmation(order)
        .await
        .map_err(|e| e.to_string())?;

    // The owner's copy must never fail the customer's order.
    if email.owner_copy().is_some() {
        let email = email.clone();
        let order = order.clone();
        best_effort("owner-copy-email", async move {
            email.send_owner_copy(&order).await
        });
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mythic_market_core::Channel;

    use super::*;

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let outcome = run_attempts(vec![
            Box::pin(async { NotificationResult::failed(Channel::Dm, "recipient not found") })
                as std::pin::Pin<Box<dyn Future<Output = NotificationResult>>>,
            Box::pin(async { NotificationResult::ok(Channel::Broadcast) }),
        ])
        .await;

        assert!(!outcome.success);
        assert!(outcome.is_partial());
        assert_eq!(outcome.results.len(), 2);
    }

    #[tokio::test]
    async fn test_all_success() {
        let outcome = run_attempts(vec![
            Box::pin(async { NotificationResult::ok(Channel::Dm) })
                as std::pin::Pin<Box<dyn Future<Output = NotificationResult>>>,
            Box::pin(async { NotificationResult::ok(Channel::Email) }),
        ])
        .await;

        assert!(outcome.success);
        assert!(!outcome.is_partial());
    }

    #[tokio::test]
    async fn test_no_attempts_is_failure() {
        let outcome = run_attempts(Vec::<std::pin::Pin<
            Box<dyn Future<Output = NotificationResult>>,
        >>::new())
        .await;
        assert!(!outcome.success);
        assert!(outcome.results.is_empty());
    }
}
