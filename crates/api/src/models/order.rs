//! Order domain types.
//!
//! An order and its items are created atomically at checkout and are
//! immutable afterwards except for the status label. Money fields are
//! the amounts computed at creation time and serialize as strings
//! (e.g. `"24.60"`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use forno_core::{DeliveryMethod, OrderId, OrderItemId, OrderStatus, PaymentMethod, PizzaSize};

use super::pizza::Pizza;
use super::user::UserSummary;

/// An order header with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user: UserSummary,
    pub status: OrderStatus,
    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_address: String,
    pub delivery_instructions: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub delivery_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single line of an order, snapshotting the pizza, size, unit
/// price, and quantity at order time.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub pizza: Pizza,
    pub size: PizzaSize,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

/// Line total for an item: unit price times quantity.
///
/// This is enforced on every write; the stored `total` column never
/// comes from the client.
#[must_use]
pub fn line_total(price: Decimal, quantity: i32) -> Decimal {
    price * Decimal::from(quantity)
}
