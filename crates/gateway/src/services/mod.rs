//! Delivery services: Discord, email, and the fan-out that drives them.

pub mod discord;
pub mod dispatch;
pub mod email;

use std::fmt::Display;

/// Run a side task whose outcome must never affect the primary request.
///
/// The task is spawned, its failure is logged at warn level, and nothing is
/// returned: there is deliberately no handle to await. Use this for calls
/// that are nice-to-have (the owner's copy of a confirmation email), never
/// for anything a caller could need to observe.
pub fn best_effort<F, E>(task: &'static str, fut: F)
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display,
{
    tokio::spawn(async move {
        if let Err(e) = fut.await {
            tracing::warn!(task, error = %e, "best-effort task failed");
        }
    });
}
