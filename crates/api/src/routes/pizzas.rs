//! Catalog route handlers.
//!
//! Reads are public; mutations require an admin profile. Enum-valued
//! fields arrive as strings and are parsed here so that bad values
//! come back as 400 field errors naming the offending field.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use forno_core::{PizzaCategory, PizzaId, PizzaSize};

use crate::db::pizzas::{PizzaParams, PizzaRepository, PriceParams};
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::RequireAuth;
use crate::models::Pizza;
use crate::routes::{MoneyField, parse_money, require_admin};
use crate::state::AppState;

/// Pizza create/replace request body.
#[derive(Debug, Deserialize)]
pub struct PizzaRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub toppings: Vec<String>,
    #[serde(default)]
    pub prices: Vec<PriceEntry>,
}

/// A (size, price) entry of [`PizzaRequest`].
#[derive(Debug, Deserialize)]
pub struct PriceEntry {
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub price: Option<MoneyField>,
}

/// Pizza partial-update request body. Absent fields keep their
/// current values; an absent price list keeps the existing entries.
#[derive(Debug, Deserialize)]
pub struct PizzaPatchRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_popular: Option<bool>,
    pub toppings: Option<Vec<String>>,
    pub prices: Option<Vec<PriceEntry>>,
}

/// Validate a price list, recording errors against the `prices` field.
fn validate_prices(entries: &[PriceEntry], errors: &mut FieldErrors) -> Vec<PriceParams> {
    let mut prices = Vec::with_capacity(entries.len());
    for entry in entries {
        let price = parse_money(entry.price.as_ref(), "prices", errors);
        match entry.size.parse::<PizzaSize>() {
            Ok(size) => {
                if let Some(price) = price {
                    if price < Decimal::ZERO {
                        errors.add("prices", "Ensure prices are greater than or equal to 0.");
                    }
                    prices.push(PriceParams { size, price });
                }
            }
            Err(_) => {
                errors.add("prices", format!("\"{}\" is not a valid size.", entry.size));
            }
        }
    }
    prices
}

impl PizzaRequest {
    /// Validate the body and convert it into repository parameters.
    fn into_params(self) -> Result<PizzaParams> {
        let mut errors = FieldErrors::new();

        if self.name.trim().is_empty() {
            errors.add("name", "This field may not be blank.");
        }
        if self.description.trim().is_empty() {
            errors.add("description", "This field may not be blank.");
        }

        let category = match self.category.parse::<PizzaCategory>() {
            Ok(category) => Some(category),
            Err(_) => {
                errors.add(
                    "category",
                    format!("\"{}\" is not a valid choice.", self.category),
                );
                None
            }
        };

        let prices = validate_prices(&self.prices, &mut errors);

        errors.into_result()?;

        // category is Some whenever the error set is clean
        let category = category.unwrap_or(PizzaCategory::Classic);

        Ok(PizzaParams {
            name: self.name,
            description: self.description,
            category,
            image_url: self.image_url,
            is_popular: self.is_popular,
            toppings: self.toppings,
            prices,
        })
    }
}

impl PizzaPatchRequest {
    /// Merge the patch over an existing pizza, validating only the
    /// fields that were supplied.
    fn into_params(self, existing: &Pizza) -> Result<PizzaParams> {
        let mut errors = FieldErrors::new();

        let name = self.name.unwrap_or_else(|| existing.name.clone());
        if name.trim().is_empty() {
            errors.add("name", "This field may not be blank.");
        }

        let description = self
            .description
            .unwrap_or_else(|| existing.description.clone());
        if description.trim().is_empty() {
            errors.add("description", "This field may not be blank.");
        }

        let category = match self.category {
            None => Some(existing.category),
            Some(raw) => match raw.parse::<PizzaCategory>() {
                Ok(category) => Some(category),
                Err(_) => {
                    errors.add("category", format!("\"{raw}\" is not a valid choice."));
                    None
                }
            },
        };

        let prices = match &self.prices {
            None => existing
                .prices
                .iter()
                .map(|p| PriceParams {
                    size: p.size,
                    price: p.price,
                })
                .collect(),
            Some(entries) => validate_prices(entries, &mut errors),
        };

        errors.into_result()?;

        Ok(PizzaParams {
            name,
            description,
            category: category.unwrap_or(existing.category),
            image_url: self.image_url.unwrap_or_else(|| existing.image_url.clone()),
            is_popular: self.is_popular.unwrap_or(existing.is_popular),
            toppings: self.toppings.unwrap_or_else(|| existing.toppings.clone()),
            prices,
        })
    }
}

/// List the whole catalog. Public.
///
/// # Errors
///
/// Returns 500 if the database query fails.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Pizza>>> {
    let pizzas = PizzaRepository::new(state.pool()).list_all().await?;
    Ok(Json(pizzas))
}

/// List pizzas flagged popular. Public.
///
/// # Errors
///
/// Returns 500 if the database query fails.
pub async fn popular(State(state): State<AppState>) -> Result<Json<Vec<Pizza>>> {
    let pizzas = PizzaRepository::new(state.pool()).list_popular().await?;
    Ok(Json(pizzas))
}

/// Create a pizza with its price list. Admin only.
///
/// # Errors
///
/// Returns 401/403 for non-admin callers and 400 with field errors on
/// invalid input.
#[instrument(skip(state, body), fields(user = %user.username))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<PizzaRequest>,
) -> Result<(StatusCode, Json<Pizza>)> {
    require_admin(&state, &user).await?;

    let params = body.into_params()?;
    let pizza = PizzaRepository::new(state.pool()).create(params).await?;

    tracing::info!(pizza_id = %pizza.id, "Pizza created");

    Ok((StatusCode::CREATED, Json(pizza)))
}

/// Replace a pizza's fields and price list. Admin only.
///
/// # Errors
///
/// Returns 401/403 for non-admin callers, 404 for an unknown id, and
/// 400 with field errors on invalid input.
#[instrument(skip(state, body), fields(user = %user.username, id = id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<PizzaRequest>,
) -> Result<Json<Pizza>> {
    require_admin(&state, &user).await?;

    let params = body.into_params()?;
    let pizza = PizzaRepository::new(state.pool())
        .update(PizzaId::new(id), params)
        .await?;

    Ok(Json(pizza))
}

/// Partially update a pizza. Admin only. Fields left out of the body
/// keep their current values, including the price list.
///
/// # Errors
///
/// Returns 401/403 for non-admin callers, 404 for an unknown id, and
/// 400 with field errors on invalid input.
#[instrument(skip(state, body), fields(user = %user.username, id = id))]
pub async fn partial_update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<PizzaPatchRequest>,
) -> Result<Json<Pizza>> {
    require_admin(&state, &user).await?;

    let repo = PizzaRepository::new(state.pool());
    let existing = repo
        .get(PizzaId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pizza {id}")))?;

    let params = body.into_params(&existing)?;
    let pizza = repo.update(PizzaId::new(id), params).await?;

    Ok(Json(pizza))
}

/// Delete a pizza. Admin only. Prices cascade at the store level.
///
/// # Errors
///
/// Returns 401/403 for non-admin callers and 404 for an unknown id.
#[instrument(skip(state), fields(user = %user.username, id = id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    require_admin(&state, &user).await?;

    PizzaRepository::new(state.pool())
        .delete(PizzaId::new(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use serde_json::{Value, json};

    use crate::models::pizza::PizzaPrice;

    use super::*;

    fn existing_pizza() -> Pizza {
        Pizza {
            id: PizzaId::new(1),
            name: "Margherita".to_owned(),
            description: "Tomato, mozzarella, basil".to_owned(),
            category: PizzaCategory::Classic,
            image_url: "/images/margherita.png".to_owned(),
            is_popular: false,
            toppings: vec!["tomato".to_owned(), "mozzarella".to_owned()],
            prices: vec![PizzaPrice {
                size: PizzaSize::Medium,
                price: "10.00".parse().unwrap(),
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn field_errors(err: AppError) -> Value {
        match err {
            AppError::Validation(errors) => serde_json::to_value(&errors).unwrap(),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_missing_price_is_a_field_error() {
        let body: PizzaRequest = serde_json::from_value(json!({
            "name": "Diavola",
            "description": "Spicy salami",
            "category": "specialty",
            "prices": [{ "size": "medium" }]
        }))
        .unwrap();

        let errors = field_errors(body.into_params().unwrap_err());
        assert_eq!(errors["prices"], json!(["This field is required."]));
    }

    #[test]
    fn test_numeric_price_is_accepted() {
        let body: PizzaRequest = serde_json::from_value(json!({
            "name": "Diavola",
            "description": "Spicy salami",
            "category": "specialty",
            "prices": [{ "size": "medium", "price": 12.50 }]
        }))
        .unwrap();

        let params = body.into_params().unwrap();
        assert_eq!(params.prices[0].price, "12.50".parse().unwrap());
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let body: PizzaRequest = serde_json::from_value(json!({
            "name": "Diavola",
            "description": "Spicy salami",
            "category": "specialty",
            "prices": [{ "size": "medium", "price": "-1.00" }]
        }))
        .unwrap();

        let errors = field_errors(body.into_params().unwrap_err());
        assert_eq!(
            errors["prices"],
            json!(["Ensure prices are greater than or equal to 0."])
        );
    }

    #[test]
    fn test_patch_keeps_absent_fields() {
        let body: PizzaPatchRequest =
            serde_json::from_value(json!({ "name": "Margherita DOP" })).unwrap();

        let params = body.into_params(&existing_pizza()).unwrap();
        assert_eq!(params.name, "Margherita DOP");
        assert_eq!(params.description, "Tomato, mozzarella, basil");
        assert_eq!(params.category, PizzaCategory::Classic);
        assert_eq!(params.prices.len(), 1);
        assert_eq!(params.prices[0].price, "10.00".parse().unwrap());
    }

    #[test]
    fn test_patch_replaces_supplied_prices() {
        let body: PizzaPatchRequest = serde_json::from_value(json!({
            "prices": [
                { "size": "small", "price": "8.00" },
                { "size": "large", "price": "14.00" }
            ]
        }))
        .unwrap();

        let params = body.into_params(&existing_pizza()).unwrap();
        assert_eq!(params.prices.len(), 2);
        assert_eq!(params.name, "Margherita");
    }

    #[test]
    fn test_patch_validates_supplied_fields() {
        let body: PizzaPatchRequest = serde_json::from_value(json!({
            "name": "",
            "category": "dessert"
        }))
        .unwrap();

        let errors = field_errors(body.into_params(&existing_pizza()).unwrap_err());
        assert_eq!(errors["name"], json!(["This field may not be blank."]));
        assert_eq!(errors["category"], json!(["\"dessert\" is not a valid choice."]));
    }
}
