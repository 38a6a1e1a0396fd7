//! Pizza catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use forno_core::{PizzaCategory, PizzaId, PizzaSize};

/// A catalog pizza with its nested per-size price list.
#[derive(Debug, Clone, Serialize)]
pub struct Pizza {
    pub id: PizzaId,
    pub name: String,
    pub description: String,
    pub category: PizzaCategory,
    pub image_url: String,
    pub is_popular: bool,
    /// Topping names, stored as a text array.
    pub toppings: Vec<String>,
    /// One entry per size; (pizza, size) is unique at the store level.
    pub prices: Vec<PizzaPrice>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single (size, amount) price entry of a pizza.
#[derive(Debug, Clone, Serialize)]
pub struct PizzaPrice {
    pub size: PizzaSize,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}
