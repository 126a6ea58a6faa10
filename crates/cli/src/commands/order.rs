//! Order building and submission through the real client pipeline.
//!
//! `order send` walks the same path the storefront does: cart snapshot ->
//! checkout draft -> typed order -> notification client with bounded retry.

use clap::{Args, Subcommand};
use mythic_market_core::Order;
use mythic_market_gateway::services::email::render_order_email;
use mythic_market_storefront::{
    CartStore, CheckoutDraft, FileStore, HttpTransport, NotificationClient, RetryPolicy,
    generate_order_number,
};
use rust_decimal::Decimal;
use secrecy::SecretString;

#[derive(Args)]
pub struct CheckoutArgs {
    /// Customer name
    #[arg(long)]
    pub name: String,

    /// Customer email
    #[arg(long)]
    pub email: String,

    /// Discord handle for the order DM
    #[arg(long)]
    pub handle: String,

    /// Payment method label
    #[arg(long, default_value = "crypto")]
    pub payment: String,

    /// Shipping method label
    #[arg(long)]
    pub shipping_method: Option<String>,

    /// Shipping cost
    #[arg(long, default_value = "5.00")]
    pub shipping_cost: Decimal,

    /// Resolved discount amount
    #[arg(long)]
    pub discount: Option<Decimal>,
}

#[derive(Subcommand)]
pub enum OrderAction {
    /// Submit the current cart as an order via the gateway
    Send {
        /// Gateway base URL, e.g. http://localhost:8787
        #[arg(long)]
        gateway: String,

        /// Shared bearer secret
        #[arg(long, env = "GATEWAY_SHARED_SECRET")]
        secret: String,

        #[command(flatten)]
        checkout: CheckoutArgs,
    },
    /// Render the confirmation email for the current cart to stdout
    RenderEmail {
        #[command(flatten)]
        checkout: CheckoutArgs,
    },
}

fn build_order(
    state_path: &str,
    checkout: CheckoutArgs,
) -> Result<Order, Box<dyn std::error::Error>> {
    let cart = CartStore::new(FileStore::open(state_path));
    let draft = CheckoutDraft {
        name: Some(checkout.name),
        email: Some(checkout.email),
        phone: None,
        handle: Some(checkout.handle),
        address: Some("1 Demo Street".to_string()),
        city: Some("Testville".to_string()),
        postal_code: Some("00000".to_string()),
        country: Some("US".to_string()),
        shipping_method: checkout.shipping_method,
        shipping_cost: Some(checkout.shipping_cost),
        payment_method: Some(checkout.payment),
        discount: checkout.discount,
        items: cart.items(),
    };
    Ok(draft.try_into_order(generate_order_number())?)
}

pub async fn run(state_path: &str, action: OrderAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        OrderAction::Send {
            gateway,
            secret,
            checkout,
        } => {
            let order = build_order(state_path, checkout)?;
            println!("Submitting order {}", order.order_number);

            let transport = HttpTransport::new(&gateway, SecretString::from(secret))?;
            let client = NotificationClient::new(transport, RetryPolicy::default());
            let receipt = client.submit(&order).await?;

            println!(
                "Accepted on attempt {} (HTTP {})",
                receipt.attempt, receipt.status
            );
            if let Some(outcome) = receipt.outcome {
                for result in outcome.results {
                    match result.error {
                        None => println!("  {}: delivered", result.channel),
                        Some(error) => println!("  {}: FAILED ({error})", result.channel),
                    }
                }
            }

            // The order went through; the cart's job is done.
            CartStore::new(FileStore::open(state_path)).clear();
            Ok(())
        }
        OrderAction::RenderEmail { checkout } => {
            let order = build_order(state_path, checkout)?;
            let rendered = render_order_email(&order)?;
            println!("Subject: {}\n", rendered.subject);
            println!("{}", rendered.text);
            Ok(())
        }
    }
}
