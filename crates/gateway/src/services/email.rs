//! Order confirmation email: pure rendering plus SMTP delivery.
//!
//! Rendering is a side-effect-free function from an order to a subject and
//! an HTML/plain-text body pair. It is deterministic for identical input
//! (golden-output tests rely on this) and never fails on missing optional
//! fields: an absent shipping method renders as "Standard", an absent
//! discount as nothing at all.
//!
//! Delivery uses SMTP via lettre with a multipart alternative message.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use mythic_market_core::{Order, OrderTotals, format_amount};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// One rendered item row, money preformatted.
#[derive(Clone)]
struct ItemRow {
    name: String,
    quantity: u32,
    line_total: String,
}

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order_number: &'a str,
    customer_name: &'a str,
    items: Vec<ItemRow>,
    subtotal: String,
    discount: Option<String>,
    shipping_method: &'a str,
    shipping_cost: String,
    total: String,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order_number: &'a str,
    customer_name: &'a str,
    items: Vec<ItemRow>,
    subtotal: String,
    discount: Option<String>,
    shipping_method: &'a str,
    shipping_cost: String,
    total: String,
}

/// A fully rendered email, ready for any transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Render an order into its confirmation email.
///
/// Pure: equal orders produce byte-identical output.
///
/// # Errors
///
/// Returns a template error only if askama rendering itself fails.
pub fn render_order_email(order: &Order) -> Result<RenderedEmail, askama::Error> {
    let totals = OrderTotals::compute(&order.items, order.discount, order.shipping.cost);

    let items: Vec<ItemRow> = order
        .items
        .iter()
        .map(|item| ItemRow {
            name: item.name.clone(),
            quantity: item.quantity,
            line_total: format_amount(item.line_total()),
        })
        .collect();

    let discount = (order.discount > rust_decimal::Decimal::ZERO)
        .then(|| format_amount(order.discount));
    let shipping_method = order.shipping.method.as_deref().unwrap_or("Standard");

    let subject = format!("Your MythicMarket order {}", order.order_number);

    let html = OrderConfirmationHtml {
        order_number: order.order_number.as_str(),
        customer_name: &order.customer.name,
        items: items.clone(),
        subtotal: format_amount(totals.subtotal),
        discount: discount.clone(),
        shipping_method,
        shipping_cost: format_amount(order.shipping.cost),
        total: format_amount(totals.total),
    }
    .render()?;

    let text = OrderConfirmationText {
        order_number: order.order_number.as_str(),
        customer_name: &order.customer.name,
        items,
        subtotal: format_amount(totals.subtotal),
        discount,
        shipping_method,
        shipping_cost: format_amount(order.shipping.cost),
        total: format_amount(totals.total),
    }
    .render()?;

    Ok(RenderedEmail {
        subject,
        text,
        html,
    })
}

/// Email service for sending order confirmations over SMTP.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    owner_copy: Option<String>,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            owner_copy: config.owner_copy.clone(),
        })
    }

    /// Optional address receiving a best-effort copy of each confirmation.
    #[must_use]
    pub fn owner_copy(&self) -> Option<&str> {
        self.owner_copy.as_deref()
    }

    /// Render and send the confirmation for an order to the customer.
    ///
    /// # Errors
    ///
    /// Returns error if rendering, message building, or SMTP delivery fails.
    pub async fn send_order_confirmation(&self, order: &Order) -> Result<(), EmailError> {
        let rendered = render_order_email(order)?;
        self.send_multipart_email(
            order.customer.email.as_str(),
            &rendered.subject,
            &rendered.text,
            &rendered.html,
        )
        .await
    }

    /// Send the shop owner's copy of a confirmation. Callers treat this as
    /// best-effort; a failure here never fails the order.
    ///
    /// # Errors
    ///
    /// Returns error if rendering, message building, or SMTP delivery fails.
    pub async fn send_owner_copy(&self, order: &Order) -> Result<(), EmailError> {
        let Some(owner) = self.owner_copy.as_deref() else {
            return Ok(());
        };
        let rendered = render_order_email(order)?;
        let subject = format!("[copy] {}", rendered.subject);
        self.send_multipart_email(owner, &subject, &rendered.text, &rendered.html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use mythic_market_core::{
        Customer, Email, LineItem, OrderNumber, Payment, Shipping,
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
    fn test_reference_total_in_both_bodies() {
        let rendered = render_order_email(&sample_order()).unwrap();
        assert!(rendered.text.contains("$55.00"));
        assert!(rendered.html.contains("$55.00"));
        assert!(rendered.text.contains("MM-20260801-0001"));
    }

    #[test]
    fn test_missing_shipping_method_defaults_to_standard() {
        let rendered = render_order_email(&sample_order()).unwrap();
        assert!(rendered.text.contains("Standard"));
    }

    #[test]
    fn test_zero_discount_not_shown() {
        let rendered = render_order_email(&sample_order()).unwrap();
        assert!(!rendered.text.to_lowercase().contains("discount"));
    }

    #[test]
    fn test_discount_changes_total() {
        let mut order = sample_order();
        order.discount = Decimal::from(10);
        let rendered = render_order_email(&order).unwrap();
        assert!(rendered.text.contains("$45.00"));
        assert!(rendered.text.to_lowercase().contains("discount"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let order = sample_order();
        let first = render_order_email(&order).unwrap();
        let second = render_order_email(&order).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_html_escapes_item_names() {
        let mut order = sample_order();
        order.items[0].name = "<script>alert('x')</script>".to_string();
        let rendered = render_order_email(&order).unwrap();
        assert!(!rendered.html.contains("<script>"));
    }
}
