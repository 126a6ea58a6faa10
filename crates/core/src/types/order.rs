//! Order domain types and validation.
//!
//! An [`Order`] is a customer's finalized cart plus shipping and payment
//! selections. Orders are constructed once at checkout and handed by value
//! to the gateway; no component holds a mutable reference to another's copy.

use core::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::email::Email;

/// Errors that can occur when constructing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    /// The input string is empty.
    #[error("order number cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("order number must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A unique order identifier, e.g. `MM-20260806-4821`.
///
/// Order numbers may be generated client-side at checkout or accepted
/// verbatim from a submission; uniqueness is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Maximum length of an order number.
    pub const MAX_LENGTH: usize = 64;

    /// Create an `OrderNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or too long.
    pub fn new(s: impl Into<String>) -> Result<Self, OrderNumberError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(OrderNumberError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(OrderNumberError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s))
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The customer placing an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    /// Full name.
    pub name: String,
    /// Contact email (validated at parse time).
    pub email: Email,
    /// Optional phone number, stored as entered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Discord handle for direct-message delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

/// Shipping selections for an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Shipping {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    /// Shipping method name; display code substitutes "Standard" when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Shipping cost in the store currency.
    pub cost: Decimal,
}

/// Payment selection for an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payment {
    /// Payment method name (e.g. "crypto", "card").
    pub method: String,
}

/// A single purchased line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    /// Price per unit; must be non-negative.
    pub unit_price: Decimal,
    /// Number of units; must be at least 1.
    pub quantity: u32,
}

impl LineItem {
    /// Total for this line (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A finalized order, ready for delivery notification.
///
/// Serializes in the storefront's camelCase wire format; the gateway's
/// submission endpoint accepts exactly this shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_number: OrderNumber,
    pub customer: Customer,
    pub shipping: Shipping,
    pub payment: Payment,
    pub items: Vec<LineItem>,
    /// Discount amount already resolved by the caller; never recomputed here.
    #[serde(default)]
    pub discount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A single violated field, with a human-readable reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted field path, e.g. `customer.email` or `items[2].quantity`.
    pub field: String,
    pub message: String,
}

/// All validation violations found in one pass.
///
/// Validation never stops at the first problem: every violated field is
/// listed so a caller can fix the whole submission at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Wrap a list of violations; `None` when the list is empty.
    #[must_use]
    pub fn from_fields(fields: Vec<FieldError>) -> Option<Self> {
        if fields.is_empty() {
            None
        } else {
            Some(Self(fields))
        }
    }

    /// The individual field violations.
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Consumes the errors and returns the violation list.
    #[must_use]
    pub fn into_fields(self) -> Vec<FieldError> {
        self.0
    }

    /// Whether a given field path is among the violations.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.iter().map(|e| e.field.as_str()).collect();
        write!(f, "{} invalid field(s): {}", self.0.len(), fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Accumulates field violations during a validation pass.
#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<FieldError>);

impl Violations {
    pub(crate) fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub(crate) fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.0))
        }
    }
}

impl Order {
    /// Check the order invariants, listing every violated field.
    ///
    /// Invariants: items non-empty, quantities at least 1, all monetary
    /// values non-negative, customer name and payment method present.
    /// Email syntax is enforced by the [`Email`] type at parse time.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] naming each violated field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut violations = Violations::default();

        if self.customer.name.trim().is_empty() {
            violations.push("customer.name", "name is required");
        }
        if self.payment.method.trim().is_empty() {
            violations.push("payment.method", "payment method is required");
        }
        if self.items.is_empty() {
            violations.push("items", "order must contain at least one item");
        }
        for (i, item) in self.items.iter().enumerate() {
            if item.unit_price < Decimal::ZERO {
                violations.push(
                    format!("items[{i}].unit_price"),
                    "unit price must be non-negative",
                );
            }
            if item.quantity == 0 {
                violations.push(format!("items[{i}].quantity"), "quantity must be at least 1");
            }
        }
        if self.shipping.cost < Decimal::ZERO {
            violations.push("shipping.cost", "shipping cost must be non-negative");
        }
        if self.discount < Decimal::ZERO {
            violations.push("discount", "discount must be non-negative");
        }

        violations.into_result()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

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
                method: Some("Express".to_string()),
                cost: Decimal::from(5),
            },
            payment: Payment {
                method: "crypto".to_string(),
            },
            items: vec![
                LineItem {
                    name: "Cursed Amulet".to_string(),
                    unit_price: Decimal::from(20),
                    quantity: 2,
                },
                LineItem {
                    name: "Mystery Sticker".to_string(),
                    unit_price: Decimal::from(10),
                    quantity: 1,
                },
            ],
            discount: Decimal::ZERO,
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_valid_order_passes() {
        assert!(sample_order().validate().is_ok());
    }

    #[test]
    fn test_empty_items_rejected() {
        let mut order = sample_order();
        order.items.clear();
        let errs = order.validate().unwrap_err();
        assert!(errs.contains("items"));
    }

    #[test]
    fn test_every_violation_listed() {
        let mut order = sample_order();
        order.customer.name = "  ".to_string();
        order.payment.method = String::new();
        order.items[0].quantity = 0;
        order.items[1].unit_price = Decimal::from(-1);

        let errs = order.validate().unwrap_err();
        assert_eq!(errs.fields().len(), 4);
        assert!(errs.contains("customer.name"));
        assert!(errs.contains("payment.method"));
        assert!(errs.contains("items[0].quantity"));
        assert!(errs.contains("items[1].unit_price"));
    }

    #[test]
    fn test_negative_shipping_and_discount_rejected() {
        let mut order = sample_order();
        order.shipping.cost = Decimal::from(-5);
        order.discount = Decimal::from(-2);
        let errs = order.validate().unwrap_err();
        assert!(errs.contains("shipping.cost"));
        assert!(errs.contains("discount"));
    }

    #[test]
    fn test_order_number_limits() {
        assert_eq!(OrderNumber::new(""), Err(OrderNumberError::Empty));
        assert!(matches!(
            OrderNumber::new("x".repeat(100)),
            Err(OrderNumberError::TooLong { .. })
        ));
        assert_eq!(OrderNumber::new("MM-1").unwrap().as_str(), "MM-1");
    }

    #[test]
    fn test_line_total() {
        let item = LineItem {
            name: "Gilded Die".to_string(),
            unit_price: "2.50".parse().unwrap(),
            quantity: 4,
        };
        assert_eq!(item.line_total(), Decimal::from(10));
    }

    #[test]
    fn test_validation_errors_display() {
        let mut order = sample_order();
        order.items.clear();
        order.payment.method = String::new();
        let errs = order.validate().unwrap_err();
        let text = errs.to_string();
        assert!(text.contains("2 invalid field(s)"));
        assert!(text.contains("items"));
    }
}
