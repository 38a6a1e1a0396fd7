//! Pizza catalog repository.
//!
//! A pizza and its per-size prices are written together in one
//! transaction; updates replace the price list atomically.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use forno_core::{PizzaCategory, PizzaId, PizzaSize};

use super::RepositoryError;
use crate::models::pizza::{Pizza, PizzaPrice};

/// Internal row type for `PostgreSQL` pizza queries.
#[derive(Debug, sqlx::FromRow)]
struct PizzaRow {
    id: i32,
    name: String,
    description: String,
    category: PizzaCategory,
    image_url: String,
    is_popular: bool,
    toppings: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PizzaRow {
    fn into_pizza(self, prices: Vec<PizzaPrice>) -> Pizza {
        Pizza {
            id: PizzaId::new(self.id),
            name: self.name,
            description: self.description,
            category: self.category,
            image_url: self.image_url,
            is_popular: self.is_popular,
            toppings: self.toppings,
            prices,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Internal row type for price entries.
#[derive(Debug, sqlx::FromRow)]
struct PriceRow {
    pizza_id: i32,
    size: PizzaSize,
    price: Decimal,
}

/// Parameters for creating or replacing a pizza.
#[derive(Debug)]
pub struct PizzaParams {
    pub name: String,
    pub description: String,
    pub category: PizzaCategory,
    pub image_url: String,
    pub is_popular: bool,
    pub toppings: Vec<String>,
    pub prices: Vec<PriceParams>,
}

/// A single (size, price) entry of [`PizzaParams`].
#[derive(Debug)]
pub struct PriceParams {
    pub size: PizzaSize,
    pub price: Decimal,
}

/// Repository for pizza catalog operations.
pub struct PizzaRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PizzaRepository<'a> {
    /// Create a new pizza repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the whole catalog with nested prices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<Pizza>, RepositoryError> {
        let rows = sqlx::query_as::<_, PizzaRow>(
            r"
            SELECT id, name, description, category, image_url, is_popular,
                   toppings, created_at, updated_at
            FROM pizza
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        self.attach_prices(rows).await
    }

    /// List pizzas with the popularity flag set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_popular(&self) -> Result<Vec<Pizza>, RepositoryError> {
        let rows = sqlx::query_as::<_, PizzaRow>(
            r"
            SELECT id, name, description, category, image_url, is_popular,
                   toppings, created_at, updated_at
            FROM pizza
            WHERE is_popular
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        self.attach_prices(rows).await
    }

    /// Get a pizza by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: PizzaId) -> Result<Option<Pizza>, RepositoryError> {
        let pizzas = self.get_many(&[id.as_i32()]).await?;
        Ok(pizzas.into_iter().next())
    }

    /// Get all pizzas in a set of IDs, with nested prices.
    ///
    /// Used to embed full pizzas into order items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_many(&self, ids: &[i32]) -> Result<Vec<Pizza>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PizzaRow>(
            r"
            SELECT id, name, description, category, image_url, is_popular,
                   toppings, created_at, updated_at
            FROM pizza
            WHERE id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        self.attach_prices(rows).await
    }

    /// Create a pizza together with its price entries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the price list repeats a size.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, params), fields(name = %params.name))]
    pub async fn create(&self, params: PizzaParams) -> Result<Pizza, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO pizza (name, description, category, image_url, is_popular, toppings)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(&params.name)
        .bind(&params.description)
        .bind(params.category)
        .bind(&params.image_url)
        .bind(params.is_popular)
        .bind(&params.toppings)
        .fetch_one(&mut *tx)
        .await?;

        insert_prices(&mut tx, id, &params.prices).await?;

        tx.commit().await?;

        self.get(PizzaId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace a pizza's fields and price list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the pizza does not exist.
    /// Returns `RepositoryError::Conflict` if the price list repeats a size.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, params), fields(id = %id))]
    pub async fn update(&self, id: PizzaId, params: PizzaParams) -> Result<Pizza, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE pizza
            SET name = $2, description = $3, category = $4, image_url = $5,
                is_popular = $6, toppings = $7, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(&params.name)
        .bind(&params.description)
        .bind(params.category)
        .bind(&params.image_url)
        .bind(params.is_popular)
        .bind(&params.toppings)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM pizza_price WHERE pizza_id = $1")
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?;

        insert_prices(&mut tx, id.as_i32(), &params.prices).await?;

        tx.commit().await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a pizza. Prices cascade at the store level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the pizza does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: PizzaId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM pizza WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Fetch the price entries for a batch of pizza rows and assemble
    /// the domain types.
    async fn attach_prices(&self, rows: Vec<PizzaRow>) -> Result<Vec<Pizza>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let price_rows = sqlx::query_as::<_, PriceRow>(
            r"
            SELECT pizza_id, size, price
            FROM pizza_price
            WHERE pizza_id = ANY($1)
            ORDER BY pizza_id, size
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_pizza: HashMap<i32, Vec<PizzaPrice>> = HashMap::new();
        for row in price_rows {
            by_pizza.entry(row.pizza_id).or_default().push(PizzaPrice {
                size: row.size,
                price: row.price,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let prices = by_pizza.remove(&row.id).unwrap_or_default();
                row.into_pizza(prices)
            })
            .collect())
    }
}

/// Insert price entries for a pizza inside an open transaction.
async fn insert_prices(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    pizza_id: i32,
    prices: &[PriceParams],
) -> Result<(), RepositoryError> {
    for entry in prices {
        sqlx::query(
            r"
            INSERT INTO pizza_price (pizza_id, size, price)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(pizza_id)
        .bind(entry.size)
        .bind(entry.price)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!(
                    "duplicate price entry for size {}",
                    entry.size
                ));
            }
            RepositoryError::Database(e)
        })?;
    }

    Ok(())
}
