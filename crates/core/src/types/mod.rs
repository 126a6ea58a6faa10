//! Core types for MythicMarket.
//!
//! This module provides type-safe wrappers for the order domain.

pub mod cart;
pub mod email;
pub mod money;
pub mod notification;
pub mod order;

pub use cart::CartItem;
pub use email::{Email, EmailError};
pub use money::{OrderTotals, format_amount};
pub use notification::{Channel, DispatchOutcome, NotificationResult};
pub use order::{
    Customer, FieldError, LineItem, Order, OrderNumber, OrderNumberError, Payment, Shipping,
    ValidationErrors,
};
