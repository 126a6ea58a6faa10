//! MythicMarket Core - Shared types library.
//!
//! This crate provides common types used across all MythicMarket components:
//! - `storefront` - Client-side cart, checkout, and order submission library
//! - `gateway` - Notification gateway server (Discord + email fan-out)
//! - `cli` - Command-line tools for sending test orders and probing recipients
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. This keeps it lightweight and allows it to be used
//! anywhere, including in tests that never touch the network.
//!
//! # Modules
//!
//! - [`types`] - Orders, cart items, emails, money totals, and delivery results

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
