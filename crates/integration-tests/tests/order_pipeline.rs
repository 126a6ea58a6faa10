//! Integration tests for the storefront submission pipeline.
//!
//! Walks the whole client-side path: cart mutations, checkout draft
//! persistence (including the encoded blob surviving a "navigation"), order
//! finalization, and submission through the retry client against scripted
//! transports.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use mythic_market_core::CartItem;
use mythic_market_storefront::checkout::{load_draft, save_draft};
use mythic_market_storefront::{
    CartStore, CheckoutDraft, InMemoryStore, NotificationClient, OrderTransport, RetryPolicy,
    SubmitError, TransportError, TransportReply, generate_order_number,
};
use rust_decimal::Decimal;

/// Transport replaying a fixed script of replies.
struct ScriptedTransport {
    calls: AtomicU32,
    script: Mutex<Vec<Result<TransportReply, TransportError>>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<TransportReply, TransportError>>) -> Self {
        Self {
            calls: AtomicU32::new(0),
            script: Mutex::new(script),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OrderTransport for &ScriptedTransport {
    async fn submit(
        &self,
        _order: &mythic_market_core::Order,
    ) -> Result<TransportReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(0)
    }
}

fn filled_cart() -> CartStore<InMemoryStore> {
    let mut cart = CartStore::new(InMemoryStore::new());
    cart.add(CartItem {
        id: "amulet-1".to_string(),
        name: "Cursed Amulet".to_string(),
        unit_price: Decimal::from(20),
        quantity: 2,
    });
    cart.add(CartItem {
        id: "sticker-7".to_string(),
        name: "Mystery Sticker".to_string(),
        unit_price: Decimal::from(10),
        quantity: 1,
    });
    cart
}

fn draft_from(cart: &CartStore<InMemoryStore>) -> CheckoutDraft {
    CheckoutDraft {
        name: Some("Morgan Vale".to_string()),
        email: Some("morgan@example.com".to_string()),
        phone: None,
        handle: Some("morganvale".to_string()),
        address: Some("1 Relic Row".to_string()),
        city: Some("Duskport".to_string()),
        postal_code: Some("00413".to_string()),
        country: Some("US".to_string()),
        shipping_method: Some("Express".to_string()),
        shipping_cost: Some(Decimal::from(5)),
        payment_method: Some("crypto".to_string()),
        discount: None,
        items: cart.items(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_cart_to_submitted_order() {
    let mut cart = filled_cart();

    // Draft survives "page navigation" through the encoded blob.
    let mut store = InMemoryStore::new();
    save_draft(&mut store, &draft_from(&cart));
    let draft = load_draft(&store).expect("draft decodes");

    let order = draft
        .try_into_order(generate_order_number())
        .expect("complete draft finalizes");
    assert_eq!(order.items.len(), 2);

    let transport = ScriptedTransport::new(vec![Ok(TransportReply {
        status: 200,
        body: serde_json::json!({
            "success": true,
            "results": [
                { "channel": "dm", "success": true },
                { "channel": "channel", "success": true },
                { "channel": "email", "success": true }
            ]
        })
        .to_string(),
    })]);
    let client = NotificationClient::new(&transport, RetryPolicy::default());

    let receipt = client.submit(&order).await.expect("submission succeeds");
    assert_eq!(receipt.attempt, 1);
    assert!(receipt.fully_delivered());
    assert_eq!(transport.calls(), 1);

    // Cart clearing is the caller's decision, made after a good receipt.
    cart.clear();
    assert!(cart.items().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_flaky_gateway_eventually_accepts() {
    let cart = filled_cart();
    let order = draft_from(&cart)
        .try_into_order(generate_order_number())
        .expect("complete draft finalizes");

    let transport = ScriptedTransport::new(vec![
        Ok(TransportReply {
            status: 503,
            body: String::new(),
        }),
        Err(TransportError::Timeout),
        Ok(TransportReply {
            status: 207,
            body: serde_json::json!({
                "success": false,
                "results": [
                    { "channel": "dm", "success": false, "error": "recipient not found" },
                    { "channel": "channel", "success": true }
                ]
            })
            .to_string(),
        }),
    ]);
    let client = NotificationClient::new(&transport, RetryPolicy::default());

    let receipt = client.submit(&order).await.expect("third attempt lands");
    assert_eq!(receipt.attempt, 3);
    assert_eq!(receipt.status, 207);

    // Partial success is still a placed order; the failure stays visible.
    let outcome = receipt.outcome.expect("gateway reported results");
    assert!(outcome.is_partial());
    assert_eq!(outcome.results.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_incomplete_draft_never_reaches_the_wire() {
    let cart = CartStore::new(InMemoryStore::new());
    let mut draft = draft_from(&filled_cart());
    draft.items = cart.items(); // empty cart
    draft.payment_method = None;

    let err = draft
        .try_into_order(generate_order_number())
        .expect_err("incomplete draft rejected");
    let message = err.to_string();
    assert!(message.contains("items"));
    assert!(message.contains("payment.method"));
}

#[tokio::test(start_paused = true)]
async fn test_rejected_submission_stops_after_one_call() {
    let cart = filled_cart();
    let order = draft_from(&cart)
        .try_into_order(generate_order_number())
        .expect("complete draft finalizes");

    let transport = ScriptedTransport::new(vec![Ok(TransportReply {
        status: 400,
        body: serde_json::json!({ "error": "validation failed" }).to_string(),
    })]);
    let client = NotificationClient::new(&transport, RetryPolicy::default());

    let err = client.submit(&order).await.expect_err("rejection is terminal");
    assert!(matches!(err, SubmitError::Rejected { status: 400, .. }));
    assert_eq!(transport.calls(), 1);
}
