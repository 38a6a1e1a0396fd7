//! Order repository.
//!
//! Orders and their items are inserted as a unit in one transaction;
//! afterwards only the status column is ever written. Item totals are
//! computed here from unit price and quantity, never taken from the
//! caller.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use forno_core::{
    DeliveryMethod, OrderId, OrderItemId, OrderStatus, PaymentMethod, PizzaSize, UserId,
};

use super::RepositoryError;
use super::pizzas::PizzaRepository;
use super::users::UserRepository;
use crate::models::order::{Order, OrderItem, line_total};
use crate::models::pizza::Pizza;

/// Internal row type for `PostgreSQL` order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    status: OrderStatus,
    delivery_method: DeliveryMethod,
    payment_method: PaymentMethod,
    customer_name: String,
    customer_phone: String,
    delivery_address: String,
    delivery_instructions: String,
    subtotal: Decimal,
    tax: Decimal,
    delivery_fee: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Internal row type for order item queries.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i32,
    order_id: i32,
    pizza_id: i32,
    size: PizzaSize,
    quantity: i32,
    price: Decimal,
    total: Decimal,
}

const ORDER_COLUMNS: &str = r#"id, user_id, status, delivery_method, payment_method,
       customer_name, customer_phone, delivery_address, delivery_instructions,
       subtotal, tax, delivery_fee, total, created_at, updated_at"#;

/// Parameters for creating an order.
///
/// Per the API contract, the money fields are caller-supplied and
/// stored as-is; only per-item totals are recomputed server-side.
#[derive(Debug)]
pub struct OrderParams {
    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_address: String,
    pub delivery_instructions: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub items: Vec<OrderItemParams>,
}

/// A single line of [`OrderParams`].
#[derive(Debug)]
pub struct OrderItemParams {
    pub pizza_id: i32,
    pub size: PizzaSize,
    pub quantity: i32,
    pub price: Decimal,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's own orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM "order"
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// List every order in the store, newest first (admin view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM "order"
            ORDER BY created_at DESC
            "#
        ))
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Get an order by ID with items and owner attached.
    ///
    /// Visibility (owner vs. admin) is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM "order"
            WHERE id = $1
            "#
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => {
                let orders = self.assemble(vec![row]).await?;
                Ok(orders.into_iter().next())
            }
            None => Ok(None),
        }
    }

    /// Create an order with its items in one transaction.
    ///
    /// The order is owned by `user_id` and starts at
    /// `OrderStatus::Processing`. Each item's total is computed as
    /// `price * quantity`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an item references an
    /// unknown pizza (foreign key violation).
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, params), fields(user_id = %user_id, items = params.items.len()))]
    pub async fn create(
        &self,
        user_id: UserId,
        params: OrderParams,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (order_id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO "order"
                (user_id, delivery_method, payment_method, customer_name, customer_phone,
                 delivery_address, delivery_instructions, subtotal, tax, delivery_fee, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(user_id.as_i32())
        .bind(params.delivery_method)
        .bind(params.payment_method)
        .bind(&params.customer_name)
        .bind(&params.customer_phone)
        .bind(&params.delivery_address)
        .bind(&params.delivery_instructions)
        .bind(params.subtotal)
        .bind(params.tax)
        .bind(params.delivery_fee)
        .bind(params.total)
        .fetch_one(&mut *tx)
        .await?;

        for item in &params.items {
            let total = line_total(item.price, item.quantity);

            sqlx::query(
                r"
                INSERT INTO order_item (order_id, pizza_id, size, quantity, price, total)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(order_id)
            .bind(item.pizza_id)
            .bind(item.size)
            .bind(item.quantity)
            .bind(item.price)
            .bind(total)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(format!(
                        "unknown pizza id {}",
                        item.pizza_id
                    ));
                }
                RepositoryError::Database(e)
            })?;
        }

        tx.commit().await?;

        self.get(OrderId::new(order_id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Set the status label on an order.
    ///
    /// Any of the five values is accepted; there is no transition
    /// table. Admin gating happens at the route layer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self), fields(id = %id, status = %status))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE "order"
            SET status = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_i32())
        .bind(status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Attach items, pizzas, and owner summaries to a batch of order
    /// rows, preserving row order.
    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let item_rows = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT id, order_id, pizza_id, size, quantity, price, total
            FROM order_item
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut pizza_ids: Vec<i32> = item_rows.iter().map(|r| r.pizza_id).collect();
        pizza_ids.sort_unstable();
        pizza_ids.dedup();

        let pizzas: HashMap<i32, Pizza> = PizzaRepository::new(self.pool)
            .get_many(&pizza_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.as_i32(), p))
            .collect();

        let mut user_ids: Vec<i32> = rows.iter().map(|r| r.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let users = UserRepository::new(self.pool).get_summaries(&user_ids).await?;

        let mut items_by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            let pizza = pizzas.get(&row.pizza_id).cloned().ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "order item {} references missing pizza {}",
                    row.id, row.pizza_id
                ))
            })?;

            items_by_order
                .entry(row.order_id)
                .or_default()
                .push(OrderItem {
                    id: OrderItemId::new(row.id),
                    pizza,
                    size: row.size,
                    quantity: row.quantity,
                    price: row.price,
                    total: row.total,
                });
        }

        rows.into_iter()
            .map(|row| {
                let user = users.get(&row.user_id).cloned().ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "order {} references missing user {}",
                        row.id, row.user_id
                    ))
                })?;

                Ok(Order {
                    id: OrderId::new(row.id),
                    user,
                    status: row.status,
                    delivery_method: row.delivery_method,
                    payment_method: row.payment_method,
                    customer_name: row.customer_name,
                    customer_phone: row.customer_phone,
                    delivery_address: row.delivery_address,
                    delivery_instructions: row.delivery_instructions,
                    subtotal: row.subtotal,
                    tax: row.tax,
                    delivery_fee: row.delivery_fee,
                    total: row.total,
                    items: items_by_order.remove(&row.id).unwrap_or_default(),
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                })
            })
            .collect()
    }
}
