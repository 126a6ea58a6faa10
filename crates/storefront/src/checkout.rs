//! Checkout draft state and its local encoding.
//!
//! The checkout form spans several pages; the in-progress selections are
//! kept as an encoded blob under a fixed key so they survive navigation
//! without a server session.
//!
//! The encoding is a shared prefix plus base64 of the JSON draft. It is
//! reversible obfuscation, NOT encryption and NOT a security boundary: it
//! only keeps casual eyes off the payload in a storage inspector. Anything
//! that actually needs confidentiality must not be stored this way.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use mythic_market_core::{
    CartItem, Customer, Email, FieldError, Order, OrderNumber, Payment, Shipping, ValidationErrors,
};
use rand::Rng as _;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::StateStore;

/// Storage key the encoded draft lives under.
pub const CHECKOUT_KEY: &str = "mythic.checkout";

/// Shared constant prefixed to every encoded draft. Version-bumped if the
/// draft shape ever changes incompatibly.
const ENCODING_PREFIX: &str = "mm1:";

/// Errors from decoding a checkout blob or finalizing a draft.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// The blob does not start with the shared prefix.
    #[error("checkout blob is missing the encoding prefix")]
    MissingPrefix,
    /// The blob body is not valid base64.
    #[error("checkout blob is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded payload is not a draft.
    #[error("checkout blob payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),
    /// The draft is incomplete or violates order invariants.
    #[error(transparent)]
    Incomplete(#[from] ValidationErrors),
}

/// In-progress checkout selections plus a cart snapshot.
///
/// Everything is optional until the shopper finishes the form;
/// [`CheckoutDraft::try_into_order`] is where completeness is enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub handle: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub shipping_method: Option<String>,
    pub shipping_cost: Option<Decimal>,
    pub payment_method: Option<String>,
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl CheckoutDraft {
    /// Finalize the draft into an [`Order`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing every missing or invalid field,
    /// including the order-level invariants checked by [`Order::validate`].
    pub fn try_into_order(self, order_number: OrderNumber) -> Result<Order, CheckoutError> {
        let mut fields = Vec::new();

        // Email parse failures join the same field-listing shape the rest of
        // validation uses; a placeholder keeps the order constructible so the
        // remaining violations are still collected.
        let email = match self.email.as_deref().unwrap_or_default().parse::<Email>() {
            Ok(email) => email,
            Err(e) => {
                fields.push(FieldError {
                    field: "customer.email".to_string(),
                    message: e.to_string(),
                });
                placeholder_email()
            }
        };

        let order = Order {
            order_number,
            customer: Customer {
                name: self.name.unwrap_or_default(),
                email,
                phone: self.phone,
                handle: self.handle,
            },
            shipping: Shipping {
                address: self.address.unwrap_or_default(),
                city: self.city.unwrap_or_default(),
                postal_code: self.postal_code.unwrap_or_default(),
                country: self.country.unwrap_or_default(),
                method: self.shipping_method,
                cost: self.shipping_cost.unwrap_or_default(),
            },
            payment: Payment {
                method: self.payment_method.unwrap_or_default(),
            },
            items: self.items.into_iter().map(Into::into).collect(),
            discount: self.discount.unwrap_or_default(),
            created_at: Utc::now(),
        };

        if let Err(errs) = order.validate() {
            fields.extend(errs.into_fields());
        }
        match ValidationErrors::from_fields(fields) {
            None => Ok(order),
            Some(errs) => Err(errs.into()),
        }
    }
}

fn placeholder_email() -> Email {
    Email::parse("invalid@placeholder.invalid").expect("placeholder literal is a valid email")
}

/// Encode a draft into its storable blob form.
#[must_use]
pub fn encode_draft(draft: &CheckoutDraft) -> String {
    // Serializing a plain struct of strings/decimals cannot fail.
    let json = serde_json::to_string(draft).unwrap_or_default();
    format!("{ENCODING_PREFIX}{}", BASE64.encode(json))
}

/// Decode a blob produced by [`encode_draft`].
///
/// # Errors
///
/// Returns a [`CheckoutError`] if the prefix, base64 body, or JSON payload
/// is malformed.
pub fn decode_draft(blob: &str) -> Result<CheckoutDraft, CheckoutError> {
    let body = blob
        .strip_prefix(ENCODING_PREFIX)
        .ok_or(CheckoutError::MissingPrefix)?;
    let bytes = BASE64.decode(body)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Persist a draft under [`CHECKOUT_KEY`].
pub fn save_draft<S: StateStore>(store: &mut S, draft: &CheckoutDraft) {
    store.set(CHECKOUT_KEY, encode_draft(draft));
}

/// Load the persisted draft, if a readable one exists.
pub fn load_draft<S: StateStore>(store: &S) -> Option<CheckoutDraft> {
    let blob = store.get(CHECKOUT_KEY)?;
    match decode_draft(&blob) {
        Ok(draft) => Some(draft),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable checkout draft");
            None
        }
    }
}

/// Generate a fresh order number: `MM-<date>-<random suffix>`.
#[must_use]
pub fn generate_order_number() -> OrderNumber {
    let date = Utc::now().format("%Y%m%d");
    let suffix: u32 = rand::rng().random_range(0..10_000);
    // Well-formed by construction: bounded length, never empty.
    OrderNumber::new(format!("MM-{date}-{suffix:04}"))
        .unwrap_or_else(|_| unreachable!("generated order numbers are always valid"))
}
