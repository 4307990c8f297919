//! Collection repository.
//!
//! Every read annotates the collection with its product count, and deletion
//! is guarded while the collection still owns products.

use sqlx::SqlitePool;

use clove_core::{CollectionId, ProductId};

use super::RepositoryError;
use crate::models::{Collection, NewCollection};

#[derive(sqlx::FromRow)]
struct CollectionRow {
    id: CollectionId,
    title: String,
    featured_product_id: Option<ProductId>,
    products_count: i64,
}

impl From<CollectionRow> for Collection {
    fn from(row: CollectionRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            featured_product_id: row.featured_product_id,
            products_count: row.products_count,
        }
    }
}

const COLLECTION_QUERY: &str = "
    SELECT c.id, c.title, c.featured_product_id, COUNT(p.id) AS products_count
    FROM collections c
    LEFT JOIN products p ON p.collection_id = c.id";

/// Repository for collection database operations.
pub struct CollectionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CollectionRepository<'a> {
    /// Create a new collection repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all collections with their product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Collection>, RepositoryError> {
        let rows: Vec<CollectionRow> =
            sqlx::query_as(&format!("{COLLECTION_QUERY} GROUP BY c.id ORDER BY c.id"))
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Collection::from).collect())
    }

    /// Get a collection by id, with its product count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CollectionId) -> Result<Option<Collection>, RepositoryError> {
        let row: Option<CollectionRow> =
            sqlx::query_as(&format!("{COLLECTION_QUERY} WHERE c.id = ? GROUP BY c.id"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Collection::from))
    }

    /// Create a collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the featured product does not
    /// exist. Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewCollection) -> Result<Collection, RepositoryError> {
        let id: CollectionId = sqlx::query_scalar(
            "INSERT INTO collections (title, featured_product_id) VALUES (?, ?) RETURNING id",
        )
        .bind(&new.title)
        .bind(new.featured_product_id)
        .fetch_one(self.pool)
        .await
        .map_err(fk_to_conflict)?;

        // A freshly created collection owns no products yet.
        Ok(Collection {
            id,
            title: new.title.clone(),
            featured_product_id: new.featured_product_id,
            products_count: 0,
        })
    }

    /// Replace a collection (full update).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the collection doesn't exist.
    pub async fn update(
        &self,
        id: CollectionId,
        new: &NewCollection,
    ) -> Result<Collection, RepositoryError> {
        let result = sqlx::query("UPDATE collections SET title = ?, featured_product_id = ? WHERE id = ?")
            .bind(&new.title)
            .bind(new.featured_product_id)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(fk_to_conflict)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a collection.
    ///
    /// The check and the delete run in one transaction; the RESTRICT foreign
    /// key on `products.collection_id` closes the remaining race with a
    /// concurrent product creation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the collection still owns
    /// products. Returns `RepositoryError::NotFound` if it doesn't exist.
    pub async fn delete(&self, id: CollectionId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE collection_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if owned > 0 {
            return Err(RepositoryError::Conflict(
                "collection contains one or more products".to_owned(),
            ));
        }

        let result = sqlx::query("DELETE FROM collections WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "collection contains one or more products".to_owned(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

fn fk_to_conflict(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict("featured product does not exist".to_owned());
    }
    RepositoryError::Database(e)
}
