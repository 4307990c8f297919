//! Promotion repository.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use clove_core::PromotionId;

use super::RepositoryError;
use crate::models::{NewPromotion, Promotion};

#[derive(sqlx::FromRow)]
struct PromotionRow {
    id: PromotionId,
    description: String,
    discount: f64,
}

impl From<PromotionRow> for Promotion {
    fn from(row: PromotionRow) -> Self {
        Self {
            id: row.id,
            description: row.description,
            discount: row.discount,
        }
    }
}

/// Repository for promotion database operations.
pub struct PromotionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PromotionRepository<'a> {
    /// Create a new promotion repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all promotions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Promotion>, RepositoryError> {
        let rows: Vec<PromotionRow> =
            sqlx::query_as("SELECT id, description, discount FROM promotions ORDER BY id")
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Promotion::from).collect())
    }

    /// Get a promotion by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PromotionId) -> Result<Option<Promotion>, RepositoryError> {
        let row: Option<PromotionRow> =
            sqlx::query_as("SELECT id, description, discount FROM promotions WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Promotion::from))
    }

    /// Create a promotion.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewPromotion) -> Result<Promotion, RepositoryError> {
        let row: PromotionRow = sqlx::query_as(
            "INSERT INTO promotions (description, discount) VALUES (?, ?)
             RETURNING id, description, discount",
        )
        .bind(&new.description)
        .bind(new.discount)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace a promotion (full update).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the promotion doesn't exist.
    pub async fn update(
        &self,
        id: PromotionId,
        new: &NewPromotion,
    ) -> Result<Promotion, RepositoryError> {
        let row: Option<PromotionRow> = sqlx::query_as(
            "UPDATE promotions SET description = ?, discount = ? WHERE id = ?
             RETURNING id, description, discount",
        )
        .bind(&new.description)
        .bind(new.discount)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Promotion::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a promotion. Product associations cascade away.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the promotion doesn't exist.
    pub async fn delete(&self, id: PromotionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM promotions WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Check that every id in `ids` names an existing promotion.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all_exist(&self, ids: &[PromotionId]) -> Result<bool, RepositoryError> {
        if ids.is_empty() {
            return Ok(true);
        }

        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(DISTINCT id) FROM promotions WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        query.push(")");

        let found: i64 = query.build_query_scalar().fetch_one(self.pool).await?;

        let mut distinct = ids.to_vec();
        distinct.sort_unstable();
        distinct.dedup();

        Ok(found == i64::try_from(distinct.len()).unwrap_or(i64::MAX))
    }
}
