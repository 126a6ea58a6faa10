//! Cart management against the local state file.

use clap::Subcommand;
use mythic_market_core::{CartItem, format_amount};
use mythic_market_storefront::{CartStore, FileStore};
use rust_decimal::Decimal;

#[derive(Subcommand)]
pub enum CartAction {
    /// Add an item (quantities merge for an existing id)
    Add {
        /// Product id (variant handle or SKU)
        #[arg(long)]
        id: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Unit price, e.g. 19.99
        #[arg(long)]
        price: Decimal,

        /// Number of units
        #[arg(long, default_value = "1")]
        quantity: u32,
    },
    /// Print the cart contents and subtotal
    Show,
    /// Remove a single line
    Remove {
        #[arg(long)]
        id: String,
    },
    /// Drop the whole cart
    Clear,
}

pub fn run(state_path: &str, action: CartAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut cart = CartStore::new(FileStore::open(state_path));

    match action {
        CartAction::Add {
            id,
            name,
            price,
            quantity,
        } => {
            cart.add(CartItem {
                id: id.clone(),
                name,
                unit_price: price,
                quantity,
            });
            println!("Added {id}; cart now has {} unit(s)", cart.item_count());
        }
        CartAction::Show => {
            let items = cart.items();
            if items.is_empty() {
                println!("Cart is empty");
            } else {
                for item in &items {
                    println!(
                        "{} x{} @ {} = {}",
                        item.name,
                        item.quantity,
                        format_amount(item.unit_price),
                        format_amount(item.line_total())
                    );
                }
                println!("Subtotal: {}", format_amount(cart.subtotal()));
            }
        }
        CartAction::Remove { id } => {
            cart.remove(&id);
            println!("Removed {id}");
        }
        CartAction::Clear => {
            cart.clear();
            println!("Cart cleared");
        }
    }

    Ok(())
}
