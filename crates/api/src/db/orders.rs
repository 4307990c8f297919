//! Order repository.
//!
//! Placing an order snapshots each product's unit price into the order item
//! inside the same transaction, so later catalog price changes never rewrite
//! order history.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use clove_core::{CustomerId, Money, OrderId, OrderItemId, PaymentStatus, ProductId};

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderItem};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    customer_id: CustomerId,
    placed_at: DateTime<Utc>,
    payment_status: String,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let payment_status: PaymentStatus = self.payment_status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;

        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            placed_at: self.placed_at,
            payment_status,
            items,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i64,
    unit_price_cents: i64,
}

impl OrderItemRow {
    fn into_item(self) -> Result<(OrderId, OrderItem), RepositoryError> {
        let unit_price = Money::from_cents(self.unit_price_cents).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid unit price in database: {e}"))
        })?;

        Ok((
            self.order_id,
            OrderItem {
                id: self.id,
                product_id: self.product_id,
                quantity: self.quantity,
                unit_price,
            },
        ))
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all orders with their items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, customer_id, placed_at, payment_status FROM orders ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut items_query = QueryBuilder::<Sqlite>::new(
            "SELECT id, order_id, product_id, quantity, unit_price_cents
             FROM order_items WHERE order_id IN (",
        );
        let mut separated = items_query.separated(", ");
        for row in &rows {
            separated.push_bind(row.id);
        }
        items_query.push(") ORDER BY id");

        let item_rows: Vec<OrderItemRow> =
            items_query.build_query_as().fetch_all(self.pool).await?;

        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item_row in item_rows {
            let (order_id, item) = item_row.into_item()?;
            items_by_order.entry(order_id).or_default().push(item);
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }

    /// Get an order by id, with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(
            "SELECT id, customer_id, placed_at, payment_status FROM orders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.items_of(id).await?;
        Ok(Some(row.into_order(items)?))
    }

    /// Place an order: insert the order row and snapshot each product's unit
    /// price into its item, all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the customer or a product
    /// vanished between validation and the write. Returns
    /// `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let placed_at = Utc::now();
        let payment_status = PaymentStatus::default();

        let order_id: OrderId = sqlx::query_scalar(
            "INSERT INTO orders (customer_id, placed_at, payment_status) VALUES (?, ?, ?)
             RETURNING id",
        )
        .bind(new.customer_id)
        .bind(placed_at)
        .bind(payment_status.to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict("customer does not exist".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        let mut items = Vec::with_capacity(new.items.len());
        for line in &new.items {
            let cents: Option<i64> =
                sqlx::query_scalar("SELECT unit_price_cents FROM products WHERE id = ?")
                    .bind(line.product_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            let Some(cents) = cents else {
                return Err(RepositoryError::Conflict(format!(
                    "product {} does not exist",
                    line.product_id
                )));
            };

            let unit_price = Money::from_cents(cents).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid unit price in database: {e}"))
            })?;

            let item_id: OrderItemId = sqlx::query_scalar(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents)
                 VALUES (?, ?, ?, ?)
                 RETURNING id",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(cents)
            .fetch_one(&mut *tx)
            .await?;

            items.push(OrderItem {
                id: item_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price,
            });
        }

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            customer_id: new.customer_id,
            placed_at,
            payment_status,
            items,
        })
    }

    /// Update the payment status of an order. Everything else about a placed
    /// order is immutable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(
            "UPDATE orders SET payment_status = ? WHERE id = ?
             RETURNING id, customer_id, placed_at, payment_status",
        )
        .bind(status.to_string())
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };

        let items = self.items_of(id).await?;
        row.into_order(items)
    }

    /// Delete an order. Items cascade away.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn items_of(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT id, order_id, product_id, quantity, unit_price_cents
             FROM order_items WHERE order_id = ? ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.into_item().map(|(_, item)| item))
            .collect()
    }
}
