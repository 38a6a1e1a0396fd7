//! Core types for Forno.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod enums;
pub mod id;

pub use email::{Email, EmailError};
pub use enums::{DeliveryMethod, OrderStatus, PaymentMethod, PizzaCategory, PizzaSize};
pub use id::*;
