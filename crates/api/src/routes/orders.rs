//! Order route handlers.
//!
//! All order endpoints require authentication. Listing is scoped to
//! the caller unless their profile carries the admin flag; status
//! updates are admin-only regardless of ownership.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use forno_core::{DeliveryMethod, OrderId, OrderStatus, PaymentMethod, PizzaSize};

use crate::db::orders::{OrderItemParams, OrderParams, OrderRepository};
use crate::db::profiles::ProfileRepository;
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::routes::{MoneyField, parse_money};
use crate::state::AppState;

/// Order creation request body.
///
/// The money fields are caller-supplied and stored as-is; per-item
/// totals are recomputed server-side from price and quantity. Every
/// field deserializes leniently so that a missing or malformed value
/// surfaces as a field error rather than a body rejection.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub delivery_method: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub delivery_instructions: String,
    #[serde(default)]
    pub subtotal: Option<MoneyField>,
    #[serde(default)]
    pub tax: Option<MoneyField>,
    #[serde(default)]
    pub delivery_fee: Option<MoneyField>,
    #[serde(default)]
    pub total: Option<MoneyField>,
    #[serde(default)]
    pub items: Vec<ItemEntry>,
}

/// A line of [`CreateOrderRequest`].
#[derive(Debug, Deserialize)]
pub struct ItemEntry {
    pub pizza_id: i32,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub price: Option<MoneyField>,
}

/// Status update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

impl CreateOrderRequest {
    /// Validate the body and convert it into repository parameters.
    fn into_params(self) -> Result<OrderParams> {
        let mut errors = FieldErrors::new();

        let delivery_method = parse_choice::<DeliveryMethod>(
            &self.delivery_method,
            "delivery_method",
            &mut errors,
        );
        let payment_method =
            parse_choice::<PaymentMethod>(&self.payment_method, "payment_method", &mut errors);

        if self.customer_name.trim().is_empty() {
            errors.add("customer_name", "This field may not be blank.");
        }
        if self.customer_phone.trim().is_empty() {
            errors.add("customer_phone", "This field may not be blank.");
        }

        if self.items.is_empty() {
            errors.add("items", "This list may not be empty.");
        }

        let subtotal = parse_money(self.subtotal.as_ref(), "subtotal", &mut errors);
        let tax = parse_money(self.tax.as_ref(), "tax", &mut errors);
        let delivery_fee = parse_money(self.delivery_fee.as_ref(), "delivery_fee", &mut errors);
        let total = parse_money(self.total.as_ref(), "total", &mut errors);

        let mut items = Vec::with_capacity(self.items.len());
        for entry in &self.items {
            let price = parse_money(entry.price.as_ref(), "items", &mut errors);

            if entry.quantity < 1 {
                errors.add("items", "Ensure quantity is greater than or equal to 1.");
                continue;
            }
            match entry.size.parse::<PizzaSize>() {
                Ok(size) => {
                    if let Some(price) = price {
                        items.push(OrderItemParams {
                            pizza_id: entry.pizza_id,
                            size,
                            quantity: entry.quantity,
                            price,
                        });
                    }
                }
                Err(_) => {
                    errors.add("items", format!("\"{}\" is not a valid size.", entry.size));
                }
            }
        }

        errors.into_result()?;

        // All parse when the error set is clean.
        let (
            Some(delivery_method),
            Some(payment_method),
            Some(subtotal),
            Some(tax),
            Some(delivery_fee),
            Some(total),
        ) = (
            delivery_method,
            payment_method,
            subtotal,
            tax,
            delivery_fee,
            total,
        )
        else {
            return Err(AppError::Internal("field parsing desync".to_owned()));
        };

        Ok(OrderParams {
            delivery_method,
            payment_method,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            delivery_address: self.delivery_address,
            delivery_instructions: self.delivery_instructions,
            subtotal,
            tax,
            delivery_fee,
            total,
            items,
        })
    }
}

/// Parse an enum-valued request field, recording a field error on
/// failure.
fn parse_choice<T: std::str::FromStr>(
    value: &str,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<T> {
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.add(field, format!("\"{value}\" is not a valid choice."));
            None
        }
    }
}

/// List orders: the caller's own, newest first; all orders for admins.
///
/// # Errors
///
/// Returns 401 for anonymous callers.
#[instrument(skip(state), fields(user = %user.username))]
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.pool());

    let is_admin = ProfileRepository::new(state.pool())
        .is_admin(user.id)
        .await?;

    let orders = if is_admin {
        repo.list_all().await?
    } else {
        repo.list_for_user(user.id).await?
    };

    Ok(Json(orders))
}

/// Create an order owned by the caller.
///
/// # Errors
///
/// Returns 401 for anonymous callers and 400 with field errors on
/// invalid input.
#[instrument(skip(state, body), fields(user = %user.username))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let params = body.into_params()?;

    let order = OrderRepository::new(state.pool())
        .create(user.id, params)
        .await?;

    tracing::info!(order_id = %order.id, total = %order.total, "Order created");

    Ok((StatusCode::CREATED, Json(order)))
}

/// Get a single order. Owners see their own; admins see any.
///
/// # Errors
///
/// Returns 404 when the order is absent or not visible to the caller.
#[instrument(skip(state), fields(user = %user.username, id = id))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get(OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    if order.user.id != user.id {
        let is_admin = ProfileRepository::new(state.pool())
            .is_admin(user.id)
            .await?;
        if !is_admin {
            // Hide other users' orders entirely rather than reveal
            // their existence.
            return Err(AppError::NotFound(format!("order {id}")));
        }
    }

    Ok(Json(order))
}

/// Set the status label on an order. Admin only.
///
/// Any of the five status values is accepted; there is no transition
/// table.
///
/// # Errors
///
/// Returns 403 for non-admins (ownership does not matter), 404 for an
/// unknown order, and 400 for an unknown status value.
#[instrument(skip(state, body), fields(user = %user.username, id = id))]
pub async fn update_status(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let is_admin = ProfileRepository::new(state.pool())
        .is_admin(user.id)
        .await?;
    if !is_admin {
        return Err(AppError::Forbidden(
            "Only admins can update order status.".to_owned(),
        ));
    }

    let status = body.status.parse::<OrderStatus>().map_err(|_| {
        AppError::Validation(FieldErrors::single(
            "status",
            format!("\"{}\" is not a valid choice.", body.status),
        ))
    })?;

    let order = OrderRepository::new(state.pool())
        .update_status(OrderId::new(id), status)
        .await?;

    tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");

    Ok(Json(order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn valid_body() -> Value {
        json!({
            "delivery_method": "delivery",
            "payment_method": "card",
            "customer_name": "Test Customer",
            "customer_phone": "555-0100",
            "delivery_address": "1 Test Street",
            "delivery_instructions": "",
            "subtotal": "20.00",
            "tax": "1.60",
            "delivery_fee": "3.00",
            "total": "24.60",
            "items": [
                { "pizza_id": 1, "size": "medium", "quantity": 2, "price": "10.00" }
            ]
        })
    }

    fn field_errors(err: AppError) -> Value {
        match err {
            AppError::Validation(errors) => serde_json::to_value(&errors).unwrap(),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_valid_body_parses() {
        let body: CreateOrderRequest = serde_json::from_value(valid_body()).unwrap();
        let params = body.into_params().unwrap();
        assert_eq!(params.subtotal.to_string(), "20.00");
        assert_eq!(params.items.len(), 1);
        assert_eq!(params.items[0].price.to_string(), "10.00");
    }

    #[test]
    fn test_missing_money_field_is_a_field_error() {
        let mut raw = valid_body();
        raw.as_object_mut().unwrap().remove("subtotal");

        // Deserialization must succeed so validation can name the field
        let body: CreateOrderRequest = serde_json::from_value(raw).unwrap();
        let errors = field_errors(body.into_params().unwrap_err());
        assert_eq!(errors["subtotal"], json!(["This field is required."]));
    }

    #[test]
    fn test_numeric_money_values_are_accepted() {
        let mut raw = valid_body();
        raw["subtotal"] = json!(20.00);
        raw["tax"] = json!(1.60);
        raw["items"][0]["price"] = json!(10.00);

        let body: CreateOrderRequest = serde_json::from_value(raw).unwrap();
        let params = body.into_params().unwrap();
        assert_eq!(params.subtotal, "20.00".parse().unwrap());
        assert_eq!(params.items[0].price, "10.00".parse().unwrap());
    }

    #[test]
    fn test_malformed_money_value_is_a_field_error() {
        let mut raw = valid_body();
        raw["total"] = json!("lots");

        let body: CreateOrderRequest = serde_json::from_value(raw).unwrap();
        let errors = field_errors(body.into_params().unwrap_err());
        assert_eq!(errors["total"], json!(["A valid number is required."]));
    }

    #[test]
    fn test_empty_items_and_bad_choice_collect_errors() {
        let mut raw = valid_body();
        raw["items"] = json!([]);
        raw["delivery_method"] = json!("drone");

        let body: CreateOrderRequest = serde_json::from_value(raw).unwrap();
        let errors = field_errors(body.into_params().unwrap_err());
        assert_eq!(errors["items"], json!(["This list may not be empty."]));
        assert_eq!(
            errors["delivery_method"],
            json!(["\"drone\" is not a valid choice."])
        );
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let mut raw = valid_body();
        raw["items"][0]["quantity"] = json!(0);

        let body: CreateOrderRequest = serde_json::from_value(raw).unwrap();
        let errors = field_errors(body.into_params().unwrap_err());
        assert_eq!(
            errors["items"],
            json!(["Ensure quantity is greater than or equal to 1."])
        );
    }
}
