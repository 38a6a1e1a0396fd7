//! Domain models for the API.
//!
//! These types represent validated domain objects separate from
//! database row types, and double as the JSON wire representation.

pub mod order;
pub mod pizza;
pub mod user;

pub use order::Order;
pub use pizza::Pizza;
pub use user::{CurrentUser, UserSummary, session_keys};
