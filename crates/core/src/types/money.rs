//! Money math for order totals.
//!
//! All monetary values are `rust_decimal::Decimal` in the store currency
//! (USD). Floating point never touches a price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::order::LineItem;

/// Totals for an order, computed in one place.
///
/// `total = subtotal - discount + shipping`. The discount is taken as
/// already resolved by the caller and is never recomputed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of `unit_price * quantity` over all items.
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute totals from line items, a resolved discount, and shipping cost.
    #[must_use]
    pub fn compute(items: &[LineItem], discount: Decimal, shipping: Decimal) -> Self {
        let subtotal: Decimal = items.iter().map(LineItem::line_total).sum();
        Self {
            subtotal,
            discount,
            shipping,
            total: subtotal - discount + shipping,
        }
    }
}

/// Format a decimal amount as a display price, e.g. `$55.00`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}
