//! MythicMarket storefront client library.
//!
//! Everything the browser-side storefront does with order state, as a
//! library: the locally persisted cart, the encoded checkout draft that
//! survives page navigation, and the order submission client that delivers
//! a finished order to the notification gateway with bounded retry.
//!
//! Nothing in this crate talks to Discord or SMTP directly; the gateway owns
//! all delivery. The only network call here is the order POST itself.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod notify;
pub mod store;

pub use cart::CartStore;
pub use checkout::{CheckoutDraft, CheckoutError, decode_draft, encode_draft, generate_order_number};
pub use notify::{
    HttpTransport, NotificationClient, OrderTransport, RetryPolicy, SubmitError, SubmitReceipt,
    TransportError, TransportReply,
};
pub use store::{FileStore, InMemoryStore, StateStore};
