//! Review repository.
//!
//! Reviews are only addressable through the product they belong to; every
//! query is scoped by the product id from the URL path.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use clove_core::{ProductId, ReviewId};

use super::RepositoryError;
use crate::models::{NewReview, Review};

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_id: ProductId,
    name: String,
    description: String,
    date: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            description: row.description,
            date: row.date,
        }
    }
}

const REVIEW_COLUMNS: &str = "id, product_id, name, description, date";

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all reviews of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = ? ORDER BY id"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Get one review of a product. A review id under a different product is
    /// treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        product_id: ProductId,
        id: ReviewId,
    ) -> Result<Option<Review>, RepositoryError> {
        let row: Option<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = ? AND id = ?"
        ))
        .bind(product_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Review::from))
    }

    /// Create a review under a product. The product id comes from the URL
    /// path, never from the request body.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product vanished between
    /// validation and the write.
    pub async fn create(
        &self,
        product_id: ProductId,
        new: &NewReview,
    ) -> Result<Review, RepositoryError> {
        let row: ReviewRow = sqlx::query_as(&format!(
            "INSERT INTO reviews (product_id, name, description, date) VALUES (?, ?, ?, ?)
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(product_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict("product no longer exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Replace a review's name and description. The date is refreshed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist under
    /// this product.
    pub async fn update(
        &self,
        product_id: ProductId,
        id: ReviewId,
        new: &NewReview,
    ) -> Result<Review, RepositoryError> {
        let row: Option<ReviewRow> = sqlx::query_as(&format!(
            "UPDATE reviews SET name = ?, description = ?, date = ?
             WHERE product_id = ? AND id = ?
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(Utc::now())
        .bind(product_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Review::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete one review of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist under
    /// this product.
    pub async fn delete(&self, product_id: ProductId, id: ReviewId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE product_id = ? AND id = ?")
            .bind(product_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
