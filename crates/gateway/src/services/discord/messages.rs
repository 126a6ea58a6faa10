//! Order message builders for Discord delivery.
//!
//! All customer-supplied text passes through [`sanitize`] before it is
//! formatted: markdown metacharacters are escaped, mention triggers are
//! neutralized, and fields are clamped to respect Discord's message-size
//! limits. Mention suppression is belt-and-braces: payloads also carry an
//! empty `allowed_mentions` list.

use mythic_market_core::{Order, OrderTotals, format_amount};

use super::types::{Embed, EmbedFooter, MessagePayload};

/// Maximum length of any single formatted field, in characters.
const MAX_FIELD_LEN: usize = 1000;

/// Markdown / formatting metacharacters escaped with a backslash.
const ESCAPED_CHARS: &[char] = &['\\', '`', '*', '_', '~', '|', '>', '#', '['];

/// Embed accent color (violet, the shop's brand color).
const ORDER_COLOR: u32 = 0x8B5C_F6;

/// Escape and clamp one customer-supplied text field.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if ESCAPED_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }

    // Break up mass-mention triggers with a zero-width space.
    let out = out
        .replace("@everyone", "@\u{200B}everyone")
        .replace("@here", "@\u{200B}here");

    clamp(&out, MAX_FIELD_LEN)
}

fn clamp(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Build the order summary embed shared by the DM and broadcast paths.
#[must_use]
pub fn build_order_embed(order: &Order) -> Embed {
    let totals = OrderTotals::compute(&order.items, order.discount, order.shipping.cost);

    let items = order
        .items
        .iter()
        .map(|item| {
            format!(
                "{} x{} - {}",
                sanitize(&item.name),
                item.quantity,
                format_amount(item.line_total())
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let customer = match &order.customer.handle {
        Some(handle) => format!(
            "{} ({})",
            sanitize(&order.customer.name),
            sanitize(handle)
        ),
        None => sanitize(&order.customer.name),
    };

    let shipping = format!(
        "{} - {}, {} {}",
        order
            .shipping
            .method
            .as_deref()
            .map_or_else(|| "Standard".to_string(), sanitize),
        sanitize(&order.shipping.city),
        sanitize(&order.shipping.country),
        format_amount(order.shipping.cost),
    );

    let mut embed = Embed::titled(format!("New order {}", sanitize(order.order_number.as_str())))
        .field("Customer", customer, true)
        .field("Payment", sanitize(&order.payment.method), true)
        .field("Items", clamp(&items, MAX_FIELD_LEN), false)
        .field("Shipping", shipping, false)
        .field("Total", format_amount(totals.total), true);
    embed.color = Some(ORDER_COLOR);
    embed.footer = Some(EmbedFooter {
        text: "MythicMarket orders".to_string(),
    });
    embed.timestamp = Some(order.created_at.to_rfc3339());
    embed
}

/// Short text shown above the embed in the customer's DM.
#[must_use]
pub fn dm_greeting(order: &Order) -> String {
    format!(
        "Thanks for your order, {}! Here's your confirmation for {}.",
        sanitize(&order.customer.name),
        sanitize(order.order_number.as_str())
    )
}

/// Probe message used by the recipient test endpoint.
#[must_use]
pub fn build_test_message(handle: &str) -> MessagePayload {
    MessagePayload::text(format!(
        "Delivery test for {} - if you can read this, order notifications will reach you.",
        sanitize(handle)
    ))
}
