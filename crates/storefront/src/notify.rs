//! Order submission client with bounded retry.
//!
//! Delivers a completed [`Order`] to the notification gateway despite
//! transient failures. The transport is a trait so tests can script
//! responses without a network.
//!
//! Retry policy: validation failures never reach the wire; 4xx responses are
//! terminal (the payload will not get better by resending it); 5xx responses
//! and network-level failures are retried with a linearly increasing delay
//! until the attempt budget runs out.

use std::time::Duration;

use mythic_market_core::{DispatchOutcome, Order, ValidationErrors};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

/// Default request timeout for the order POST.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// How many times to try, and how long to wait between tries.
///
/// The delay before attempt `n + 1` is `base_delay * n`, so a policy of
/// 3 attempts with a 500ms base sleeps 500ms then 1s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first try.
    pub attempts: u32,
    /// Base delay; multiplied by the number of failures so far.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// A raw reply from the gateway: status code plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    pub status: u16,
    pub body: String,
}

/// Network-level failure before any HTTP status was produced.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request timed out.
    #[error("request timed out")]
    Timeout,
    /// Connection-level failure (reset, refused, DNS).
    #[error("connection failed: {0}")]
    Connection(String),
}

/// One way of getting an order to the gateway.
///
/// Implemented by [`HttpTransport`] for production and by scripted fakes in
/// tests (the retry policy is exercised without a network).
pub trait OrderTransport {
    /// Submit the order once; no retry at this layer.
    fn submit(
        &self,
        order: &Order,
    ) -> impl Future<Output = Result<TransportReply, TransportError>> + Send;
}

/// Terminal submission failures.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The order violates its invariants; nothing was sent.
    #[error("order failed validation: {0}")]
    Invalid(#[from] ValidationErrors),
    /// The gateway rejected the submission; resending the same payload
    /// cannot succeed, so no retry happens.
    #[error("gateway rejected the order (status {status})")]
    Rejected { status: u16, body: String },
    /// Every attempt failed with a retryable error.
    #[error("delivery failed after {attempts} attempt(s): {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

/// A successful submission, tagged with the attempt that landed it.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    /// 1-based attempt number that succeeded.
    pub attempt: u32,
    /// HTTP status from the gateway (200 full success, 207 partial).
    pub status: u16,
    /// Per-channel delivery results, when the gateway returned them.
    pub outcome: Option<DispatchOutcome>,
}

impl SubmitReceipt {
    /// Whether every delivery channel succeeded (partial success is still a
    /// placed order; the storefront proceeds optimistically).
    #[must_use]
    pub fn fully_delivered(&self) -> bool {
        self.outcome.as_ref().is_some_and(|o| o.success)
    }
}

/// Order submission client: validation, then bounded retry over a transport.
///
/// Does not touch cart state; clearing the cart after a successful
/// submission is the caller's decision.
#[derive(Debug)]
pub struct NotificationClient<T: OrderTransport> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: OrderTransport> NotificationClient<T> {
    /// Create a client over `transport` with the given retry policy.
    pub const fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Validate and submit an order.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::Invalid`] before any network call when the order
    ///   violates its invariants (every violated field listed).
    /// - [`SubmitError::Rejected`] on a 4xx reply (exactly one call made).
    /// - [`SubmitError::Exhausted`] once the attempt budget is spent.
    pub async fn submit(&self, order: &Order) -> Result<SubmitReceipt, SubmitError> {
        order.validate()?;

        let attempts = self.policy.attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.policy.base_delay * (attempt - 1);
                debug!(attempt, ?delay, "retrying order submission");
                tokio::time::sleep(delay).await;
            }

            match self.transport.submit(order).await {
                Ok(reply) if (200..300).contains(&reply.status) => {
                    let outcome = serde_json::from_str(&reply.body).ok();
                    return Ok(SubmitReceipt {
                        attempt,
                        status: reply.status,
                        outcome,
                    });
                }
                Ok(reply) if (400..500).contains(&reply.status) => {
                    return Err(SubmitError::Rejected {
                        status: reply.status,
                        body: reply.body,
                    });
                }
                Ok(reply) => {
                    warn!(attempt, status = reply.status, "gateway returned a retryable error");
                    last_error = format!("gateway returned status {}", reply.status);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "order submission attempt failed");
                    last_error = e.to_string();
                }
            }
        }

        Err(SubmitError::Exhausted {
            attempts,
            last_error,
        })
    }
}

/// Production transport: POSTs the order to the gateway endpoint with the
/// shared bearer secret.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    secret: SecretString,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .field("secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport for a gateway base URL, e.g. `https://mythicmarket.shop`.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the HTTP client cannot be built.
    pub fn new(base_url: &str, secret: SecretString) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/api/discord/send-notification",
                base_url.trim_end_matches('/')
            ),
            secret,
        })
    }
}

impl OrderTransport for HttpTransport {
    async fn submit(&self, order: &Order) -> Result<TransportReply, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.secret.expose_secret())
            .json(order)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Connection(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(TransportReply { status, body })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::TimeZone as _;
    use chrono::Utc;
    use mythic_market_core::{
        Customer, Email, LineItem, Order, OrderNumber, Payment, Shipping,
    };
    use rust_decimal::Decimal;

    use super::*;

    fn sample_order() -> Order {
        Order {
            order_number: OrderNumber::new("MM-20260801-0001").unwrap(),
            customer: Customer {
                name: "Morgan Vale".to_string(),
                email: Email::parse("morgan@example.com").unwrap(),
                phone: None,
                handle: Some("morganvale".to_string()),
            },
            shipping: Shipping {
                address: "1 Relic Row".to_string(),
                city: "Duskport".to_string(),
                postal_code: "00413".to_string(),
                country: "US".to_string(),
                method: None,
                cost: Decimal::from(5),
            },
            payment: Payment {
                method: "crypto".to_string(),
            },
            items: vec![LineItem {
                name: "Cursed Amulet".to_string(),
                unit_price: Decimal::from(20),
                quantity: 2,
            }],
            discount: Decimal::ZERO,
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
        }
    }

    /// Transport that replays a fixed script of replies and counts calls.
    struct ScriptedTransport {
        calls: AtomicU32,
        script: Mutex<Vec<Result<TransportReply, TransportError>>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<TransportReply, TransportError>>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                script: Mutex::new(script),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl OrderTransport for &ScriptedTransport {
        async fn submit(&self, _order: &Order) -> Result<TransportReply, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .remove(0)
        }
    }

    fn ok_reply() -> Result<TransportReply, TransportError> {
        Ok(TransportReply {
            status: 200,
            body: r#"{"success":true,"results":[{"channel":"email","success":true}]}"#.to_string(),
        })
    }

    fn unavailable_reply() -> Result<TransportReply, TransportError> {
        Ok(TransportReply {
            status: 503,
            body: "{}".to_string(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Timeout),
            unavailable_reply(),
            ok_reply(),
        ]);
        let client = NotificationClient::new(&transport, RetryPolicy::default());

        let receipt = client.submit(&sample_order()).await.unwrap();
        assert_eq!(receipt.attempt, 3);
        assert_eq!(transport.calls(), 3);
        assert!(receipt.fully_delivered());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_request_is_never_retried() {
        let transport = ScriptedTransport::new(vec![Ok(TransportReply {
            status: 400,
            body: r#"{"error":"validation failed"}"#.to_string(),
        })]);
        let client = NotificationClient::new(&transport, RetryPolicy::default());

        let err = client.submit(&sample_order()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Rejected { status: 400, .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_carries_last_error() {
        let transport = ScriptedTransport::new(vec![
            unavailable_reply(),
            unavailable_reply(),
            Err(TransportError::Connection("connection reset".to_string())),
        ]);
        let client = NotificationClient::new(&transport, RetryPolicy::default());

        let err = client.submit(&sample_order()).await.unwrap_err();
        let SubmitError::Exhausted {
            attempts,
            last_error,
        } = err
        else {
            panic!("expected exhaustion, got {err:?}");
        };
        assert_eq!(attempts, 3);
        assert!(last_error.contains("connection reset"));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_order_makes_no_network_call() {
        let transport = ScriptedTransport::new(vec![ok_reply()]);
        let client = NotificationClient::new(&transport, RetryPolicy::default());

        let mut order = sample_order();
        order.items.clear();
        order.customer.name = String::new();

        let err = client.submit(&order).await.unwrap_err();
        let SubmitError::Invalid(errs) = err else {
            panic!("expected validation failure, got {err:?}");
        };
        assert!(errs.contains("items"));
        assert!(errs.contains("customer.name"));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_success_reply_is_a_placed_order() {
        let transport = ScriptedTransport::new(vec![Ok(TransportReply {
            status: 207,
            body: r#"{"success":false,"results":[{"channel":"dm","success":false,"error":"recipient not found"},{"channel":"channel","success":true}]}"#.to_string(),
        })]);
        let client = NotificationClient::new(&transport, RetryPolicy::default());

        let receipt = client.submit(&sample_order()).await.unwrap();
        assert_eq!(receipt.status, 207);
        assert!(!receipt.fully_delivered());
        assert!(receipt.outcome.unwrap().is_partial());
    }
}
