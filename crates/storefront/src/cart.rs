//! Locally persisted shopping cart.
//!
//! The cart is a list of line items serialized as JSON under a fixed key in
//! a [`StateStore`]. Every mutation rewrites the whole snapshot; hand-offs
//! to other components are always by value.

use mythic_market_core::CartItem;
use rust_decimal::Decimal;

use crate::store::StateStore;

/// Storage key the cart snapshot lives under.
pub const CART_KEY: &str = "mythic.cart";

/// A cart bound to a state store.
///
/// Successful order submission does NOT clear the cart; that is the caller's
/// decision once it has seen the submission result.
#[derive(Debug)]
pub struct CartStore<S: StateStore> {
    store: S,
}

impl<S: StateStore> CartStore<S> {
    /// Wrap a state store as a cart.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Current cart lines. An absent or unreadable snapshot is an empty cart.
    pub fn items(&self) -> Vec<CartItem> {
        self.store
            .get(CART_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Add an item. If a line with the same id exists, quantities merge.
    /// A zero quantity is bumped to 1.
    pub fn add(&mut self, item: CartItem) {
        let mut items = self.items();
        let quantity = item.quantity.max(1);
        if let Some(existing) = items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            items.push(CartItem { quantity, ..item });
        }
        self.save(&items);
    }

    /// Set the quantity of an existing line. Zero removes the line.
    pub fn set_quantity(&mut self, id: &str, quantity: u32) {
        let mut items = self.items();
        if quantity == 0 {
            items.retain(|i| i.id != id);
        } else if let Some(existing) = items.iter_mut().find(|i| i.id == id) {
            existing.quantity = quantity;
        }
        self.save(&items);
    }

    /// Remove a line entirely.
    pub fn remove(&mut self, id: &str) {
        let mut items = self.items();
        items.retain(|i| i.id != id);
        self.save(&items);
    }

    /// Drop the whole cart.
    pub fn clear(&mut self) {
        self.store.remove(CART_KEY);
    }

    /// Sum of line totals.
    pub fn subtotal(&self) -> Decimal {
        self.items().iter().map(CartItem::line_total).sum()
    }

    /// Total unit count across all lines.
    pub fn item_count(&self) -> u32 {
        self.items().iter().map(|i| i.quantity).sum()
    }

    fn save(&mut self, items: &[CartItem]) {
        match serde_json::to_string(items) {
            Ok(raw) => self.store.set(CART_KEY, raw),
            Err(e) => tracing::warn!(error = %e, "failed to serialize cart snapshot"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::store::InMemoryStore;

    use super::*;

    fn item(id: &str, price: &str, quantity: u32) -> CartItem {
        CartItem {
            id: id.to_string(),
            name: format!("item {id}"),
            unit_price: price.parse().unwrap(),
            quantity,
        }
    }

    fn cart() -> CartStore<InMemoryStore> {
        CartStore::new(InMemoryStore::new())
    }

    #[test]
    fn test_empty_cart() {
        let cart = cart();
        assert!(cart.items().is_empty());
        assert_eq!(cart.subtotal(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_add_merges_same_id() {
        let mut cart = cart();
        cart.add(item("amulet", "20", 1));
        cart.add(item("amulet", "20", 2));
        let items = cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
    }

    #[test]
    fn test_zero_quantity_add_floors_to_one() {
        let mut cart = cart();
        cart.add(item("sticker", "10", 0));
        assert_eq!(cart.items()[0].quantity, 1);
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut cart = cart();
        cart.add(item("amulet", "20", 2));
        cart.add(item("sticker", "10", 1));

        cart.set_quantity("amulet", 5);
        assert_eq!(cart.items()[0].quantity, 5);

        cart.set_quantity("sticker", 0);
        assert_eq!(cart.items().len(), 1);

        cart.remove("amulet");
        assert!(cart.items().is_empty());
    }

    #[test]
    fn test_subtotal_and_count() {
        let mut cart = cart();
        cart.add(item("amulet", "20", 2));
        cart.add(item("sticker", "10", 1));
        assert_eq!(cart.subtotal(), Decimal::from(50));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_clear() {
        let mut cart = cart();
        cart.add(item("amulet", "20", 2));
        cart.clear();
        assert!(cart.items().is_empty());
    }
}
