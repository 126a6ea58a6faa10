//! Cart line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::order::LineItem;

/// One line in a customer's cart.
///
/// Created when a product is selected, mutated by quantity controls, and
/// destroyed on removal or successful order submission. The cart is owned by
/// the browser session; the server never sees it except as part of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product identifier (variant handle or SKU).
    pub id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartItem {
    /// Total for this cart line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

impl From<CartItem> for LineItem {
    fn from(item: CartItem) -> Self {
        Self {
            name: item.name,
            unit_price: item.unit_price,
            quantity: item.quantity,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = CartItem {
            id: "amulet-1".to_string(),
            name: "Cursed Amulet".to_string(),
            unit_price: "19.99".parse().unwrap(),
            quantity: 3,
        };
        assert_eq!(item.line_total(), "59.97".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_into_line_item() {
        let item = CartItem {
            id: "sticker".to_string(),
            name: "Mystery Sticker".to_string(),
            unit_price: Decimal::from(10),
            quantity: 1,
        };
        let line: LineItem = item.into();
        assert_eq!(line.name, "Mystery Sticker");
        assert_eq!(line.quantity, 1);
    }
}
