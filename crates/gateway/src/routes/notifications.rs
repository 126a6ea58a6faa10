//! Order notification route handlers.
//!
//! The wire format is deliberately loose: the storefront's checkout script
//! has shipped several shapes over time, so the submission type tolerates
//! missing and oddly-typed fields and everything is normalized into a
//! strongly-typed [`Order`] exactly once, here at the boundary. Required
//! fields are enforced strictly; numeric item fields are coerced leniently
//! (bad price becomes 0, bad quantity becomes 1).

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use mythic_market_core::{
    Channel, Customer, DispatchOutcome, Email, FieldError, LineItem, Order, OrderNumber, Payment,
    Shipping, ValidationErrors,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::error::AppError;
use crate::services::discord::DiscordError;
use crate::services::dispatch::dispatch_order;
use crate::state::AppState;

// =============================================================================
// Wire types
// =============================================================================

/// Raw order submission as POSTed by the storefront.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub customer: CustomerSubmission,
    #[serde(default)]
    pub shipping: ShippingSubmission,
    #[serde(default)]
    pub payment: PaymentSubmission,
    #[serde(default)]
    pub items: Vec<ItemSubmission>,
    #[serde(default)]
    pub discount: Value,
    /// Channels to attempt; omitted means "all configured".
    #[serde(default)]
    pub channels: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSubmission {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub cost: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentSubmission {
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit_price: Value,
    #[serde(default)]
    pub quantity: Value,
}

// =============================================================================
// Normalization
// =============================================================================

/// Parse a decimal out of whatever the client sent. Negative or
/// unparseable values count as invalid.
fn lenient_decimal(value: &Value) -> Option<Decimal> {
    let parsed = match value {
        // Going through the exact string form avoids float rounding.
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        Value::String(s) => s.trim().trim_start_matches('$').parse::<Decimal>().ok(),
        _ => None,
    };
    parsed.filter(|d| *d >= Decimal::ZERO)
}

/// A required string field: present and non-blank, or a recorded violation.
fn require(
    fields: &mut Vec<FieldError>,
    value: Option<String>,
    field: &str,
    message: &str,
) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            fields.push(FieldError {
                field: field.to_string(),
                message: message.to_string(),
            });
            None
        }
    }
}

/// Parse a quantity; zero or unparseable values count as invalid.
fn lenient_quantity(value: &Value) -> Option<u32> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.filter(|&q| q >= 1)
}

/// Normalize a raw submission into a typed order plus the channel list.
///
/// Required fields (order number, name, email, handle, items, payment
/// method) are checked strictly, every violation listed. Item numerics are
/// coerced: a missing/invalid unit price becomes 0, a missing/invalid
/// quantity becomes 1.
///
/// # Errors
///
/// Returns [`ValidationErrors`] naming every violated field.
pub fn normalize(
    submission: OrderSubmission,
    default_channels: &[Channel],
) -> Result<(Order, Vec<Channel>), ValidationErrors> {
    let mut fields = Vec::new();

    let order_number = require(
        &mut fields,
        submission.order_number,
        "orderNumber",
        "order number is required",
    )
    .and_then(|raw| match OrderNumber::new(raw) {
        Ok(n) => Some(n),
        Err(e) => {
            fields.push(FieldError {
                field: "orderNumber".to_string(),
                message: e.to_string(),
            });
            None
        }
    });

    let name = require(
        &mut fields,
        submission.customer.name,
        "customer.name",
        "name is required",
    );
    let handle = require(
        &mut fields,
        submission.customer.handle,
        "customer.handle",
        "handle is required",
    );
    let email = require(
        &mut fields,
        submission.customer.email,
        "customer.email",
        "email is required",
    )
    .and_then(|raw| match Email::parse(raw.trim()) {
        Ok(email) => Some(email),
        Err(e) => {
            fields.push(FieldError {
                field: "customer.email".to_string(),
                message: e.to_string(),
            });
            None
        }
    });
    let payment_method = require(
        &mut fields,
        submission.payment.method,
        "payment.method",
        "payment method is required",
    );

    if submission.items.is_empty() {
        fields.push(FieldError {
            field: "items".to_string(),
            message: "order must contain at least one item".to_string(),
        });
    }

    let items: Vec<LineItem> = submission
        .items
        .into_iter()
        .map(|item| LineItem {
            name: item
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Unknown item".to_string()),
            unit_price: lenient_decimal(&item.unit_price).unwrap_or(Decimal::ZERO),
            quantity: lenient_quantity(&item.quantity).unwrap_or(1),
        })
        .collect();

    let channels = match submission.channels {
        None => default_channels.to_vec(),
        Some(names) => names
            .iter()
            .filter_map(|name| Channel::from_wire(name))
            .collect(),
    };

    if let Some(errs) = ValidationErrors::from_fields(fields) {
        return Err(errs);
    }

    // All required pieces are present past this point.
    let (Some(order_number), Some(name), Some(email), Some(payment_method)) =
        (order_number, name, email, payment_method)
    else {
        unreachable!("required fields verified above");
    };

    let order = Order {
        order_number,
        customer: Customer {
            name,
            email,
            phone: submission.customer.phone,
            handle,
        },
        shipping: Shipping {
            address: submission.shipping.address.unwrap_or_default(),
            city: submission.shipping.city.unwrap_or_default(),
            postal_code: submission.shipping.postal_code.unwrap_or_default(),
            country: submission.shipping.country.unwrap_or_default(),
            method: submission.shipping.method,
            cost: lenient_decimal(&submission.shipping.cost).unwrap_or(Decimal::ZERO),
        },
        payment: Payment {
            method: payment_method,
        },
        items,
        discount: lenient_decimal(&submission.discount).unwrap_or(Decimal::ZERO),
        created_at: submission.created_at.unwrap_or_else(Utc::now),
    };

    Ok((order, channels))
}

/// Channels to attempt when the submission does not name any: everything
/// with a configured client.
fn configured_channels(state: &AppState) -> Vec<Channel> {
    let mut channels = Vec::new();
    if state.discord().is_some() {
        channels.push(Channel::Dm);
        channels.push(Channel::Broadcast);
    }
    if state.email().is_some() {
        channels.push(Channel::Email);
    }
    channels
}

/// Map a dispatch outcome to its HTTP status: 200 full success, 207 partial,
/// 503 when nothing was delivered.
#[must_use]
pub fn status_for(outcome: &DispatchOutcome) -> StatusCode {
    if outcome.success {
        StatusCode::OK
    } else if outcome.is_partial() {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Submit an order for notification fan-out.
///
/// POST /api/discord/send-notification
#[instrument(skip(state, submission))]
pub async fn send_notification(
    State(state): State<AppState>,
    Json(submission): Json<OrderSubmission>,
) -> Result<Response, AppError> {
    let (order, channels) = normalize(submission, &configured_channels(&state))?;

    let outcome = dispatch_order(&state, &order, &channels).await;
    Ok((status_for(&outcome), Json(outcome)).into_response())
}

/// Recipient probe request body.
#[derive(Debug, Deserialize)]
pub struct TestRequest {
    pub handle: String,
}

/// Recipient probe response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
    /// Whether the handle resolved to a guild member.
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Whether the test DM was delivered to the resolved member.
    pub delivered: bool,
}

/// Probe whether a handle is resolvable (and DM-able).
///
/// POST /api/discord/test
#[instrument(skip(state), fields(handle = %request.handle))]
pub async fn test_recipient(
    State(state): State<AppState>,
    Json(request): Json<TestRequest>,
) -> Result<Json<TestResponse>, AppError> {
    let discord = state
        .discord()
        .ok_or_else(|| AppError::Upstream("discord delivery not configured".to_string()))?;

    let member = match discord.resolve_member(&request.handle).await {
        Ok(member) => member,
        Err(DiscordError::MemberNotFound(_)) => {
            return Ok(Json(TestResponse {
                found: false,
                user_id: None,
                delivered: false,
            }));
        }
        Err(e) => return Err(AppError::Upstream(e.to_string())),
    };

    let delivered = match discord.open_dm(&member.user.id).await {
        Ok(channel_id) => {
            let payload = crate::services::discord::build_test_message(&request.handle);
            discord.post_message(&channel_id, &payload).await.is_ok()
        }
        Err(_) => false,
    };

    Ok(Json(TestResponse {
        found: true,
        user_id: Some(member.user.id),
        delivered,
    }))
}
