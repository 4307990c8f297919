//! Cart repository.
//!
//! The add-item path is an atomic increment-or-insert: `cart_items` has a
//! UNIQUE(cart_id, product_id) constraint and the insert upserts into the
//! existing row, so concurrent adds for the same pair can neither duplicate
//! the row nor lose an increment.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use clove_core::{CartId, CartItemId, Money, ProductId};

use super::RepositoryError;
use crate::models::{Cart, CartItem, CartLine, ProductSummary};

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    cart_id: String,
    product_id: ProductId,
    quantity: i64,
}

impl CartItemRow {
    fn into_item(self) -> Result<CartItem, RepositoryError> {
        Ok(CartItem {
            id: self.id,
            cart_id: parse_cart_id(&self.cart_id)?,
            product_id: self.product_id,
            quantity: self.quantity,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: CartItemId,
    cart_id: String,
    product_id: ProductId,
    quantity: i64,
    title: String,
    unit_price_cents: i64,
}

impl CartLineRow {
    fn into_line(self) -> Result<CartLine, RepositoryError> {
        let unit_price = Money::from_cents(self.unit_price_cents).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid unit price in database: {e}"))
        })?;

        Ok(CartLine {
            item: CartItem {
                id: self.id,
                cart_id: parse_cart_id(&self.cart_id)?,
                product_id: self.product_id,
                quantity: self.quantity,
            },
            product: ProductSummary {
                id: self.product_id,
                title: self.title,
                unit_price,
            },
        })
    }
}

fn parse_cart_id(raw: &str) -> Result<CartId, RepositoryError> {
    raw.parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid cart id in database: {e}")))
}

const LINE_QUERY: &str = "
    SELECT i.id, i.cart_id, i.product_id, i.quantity, p.title, p.unit_price_cents
    FROM cart_items i
    JOIN products p ON p.id = i.product_id";

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Allocate a new empty cart with a fresh opaque id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self) -> Result<Cart, RepositoryError> {
        let cart = Cart {
            id: CartId::random(),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO carts (id, created_at) VALUES (?, ?)")
            .bind(cart.id.to_string())
            .bind(cart.created_at)
            .execute(self.pool)
            .await?;

        Ok(cart)
    }

    /// Get a cart by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let row: Option<(String, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, created_at FROM carts WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(self.pool)
                .await?;

        row.map(|(raw_id, created_at)| {
            Ok(Cart {
                id: parse_cart_id(&raw_id)?,
                created_at,
            })
        })
        .transpose()
    }

    /// Delete a cart. Items cascade away.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't exist.
    pub async fn delete(&self, id: CartId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM carts WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// All lines of a cart, each joined with its product summary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows: Vec<CartLineRow> =
            sqlx::query_as(&format!("{LINE_QUERY} WHERE i.cart_id = ? ORDER BY i.id"))
                .bind(cart_id.to_string())
                .fetch_all(self.pool)
                .await?;

        rows.into_iter().map(CartLineRow::into_line).collect()
    }

    /// Get one line of a cart.
    ///
    /// An item id that exists under a different cart is treated as absent;
    /// items are only addressable through their own cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn line(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row: Option<CartLineRow> =
            sqlx::query_as(&format!("{LINE_QUERY} WHERE i.cart_id = ? AND i.id = ?"))
                .bind(cart_id.to_string())
                .bind(item_id)
                .fetch_optional(self.pool)
                .await?;

        row.map(CartLineRow::into_line).transpose()
    }

    /// Add a product to a cart, merging with an existing line.
    ///
    /// If the cart already holds the product, the quantity is incremented in
    /// place; otherwise a new line is inserted. Atomic per (cart, product).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the cart or product vanished
    /// between validation and the write. Returns `RepositoryError::Database`
    /// for other database errors.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartItem, RepositoryError> {
        let row: CartItemRow = sqlx::query_as(
            "INSERT INTO cart_items (cart_id, product_id, quantity)
             VALUES (?, ?, ?)
             ON CONFLICT (cart_id, product_id)
             DO UPDATE SET quantity = quantity + excluded.quantity
             RETURNING id, cart_id, product_id, quantity",
        )
        .bind(cart_id.to_string())
        .bind(product_id)
        .bind(quantity)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict(
                    "cart or product no longer exists".to_owned(),
                );
            }
            RepositoryError::Database(e)
        })?;

        row.into_item()
    }

    /// Replace the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist in this
    /// cart.
    pub async fn update_item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        quantity: i64,
    ) -> Result<CartItem, RepositoryError> {
        let row: Option<CartItemRow> = sqlx::query_as(
            "UPDATE cart_items SET quantity = ? WHERE cart_id = ? AND id = ?
             RETURNING id, cart_id, product_id, quantity",
        )
        .bind(quantity)
        .bind(cart_id.to_string())
        .bind(item_id)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.into_item()
    }

    /// Remove one line from a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist in this
    /// cart.
    pub async fn delete_item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ? AND id = ?")
            .bind(cart_id.to_string())
            .bind(item_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
