//! Product repository.
//!
//! Product deletion is guarded: a product referenced by any order item must
//! not be deleted, so order history never points at a missing product. The
//! guard is a pre-flight count inside a transaction, backed by the ON DELETE
//! RESTRICT foreign key on `order_items.product_id` for the case where a
//! referencing row lands between the check and the delete.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use clove_core::{CollectionId, Money, ProductId, PromotionId};

use super::RepositoryError;
use crate::models::{NewProduct, Page, Product, ProductFilter, ProductOrdering, ProductSummary};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    slug: String,
    description: Option<String>,
    unit_price_cents: i64,
    inventory: i64,
    collection_id: CollectionId,
    last_update: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> Result<Product, RepositoryError> {
        let unit_price = Money::from_cents(self.unit_price_cents).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid unit price in database: {e}"))
        })?;

        Ok(Product {
            id: self.id,
            title: self.title,
            slug: self.slug,
            description: self.description,
            unit_price,
            inventory: self.inventory,
            collection_id: self.collection_id,
            last_update: self.last_update,
        })
    }
}

const PRODUCT_COLUMNS: &str =
    "id, title, slug, description, unit_price_cents, inventory, collection_id, last_update";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List products matching `filter`, one page at a time.
    ///
    /// Returns the page of products plus the total match count across all
    /// pages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut count_query =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products WHERE 1 = 1");
        push_filters(&mut count_query, filter);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut list_query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE 1 = 1"
        ));
        push_filters(&mut list_query, filter);
        list_query.push(match filter.ordering {
            ProductOrdering::Id => " ORDER BY id ASC",
            ProductOrdering::UnitPriceAsc => " ORDER BY unit_price_cents ASC, id ASC",
            ProductOrdering::UnitPriceDesc => " ORDER BY unit_price_cents DESC, id ASC",
            ProductOrdering::LastUpdateAsc => " ORDER BY last_update ASC, id ASC",
            ProductOrdering::LastUpdateDesc => " ORDER BY last_update DESC, id ASC",
        });
        list_query.push(" LIMIT ");
        list_query.push_bind(page.limit());
        list_query.push(" OFFSET ");
        list_query.push_bind(page.offset());

        let rows: Vec<ProductRow> = list_query
            .build_query_as()
            .fetch_all(self.pool)
            .await?;

        let products = rows
            .into_iter()
            .map(ProductRow::into_product)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((products, count))
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ProductRow::into_product).transpose()
    }

    /// Get the cart-facing summary of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary(&self, id: ProductId) -> Result<Option<ProductSummary>, RepositoryError> {
        let row: Option<(ProductId, String, i64)> =
            sqlx::query_as("SELECT id, title, unit_price_cents FROM products WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(|(id, title, cents)| {
            let unit_price = Money::from_cents(cents).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid unit price in database: {e}"))
            })?;
            Ok(ProductSummary {
                id,
                title,
                unit_price,
            })
        })
        .transpose()
    }

    /// Create a product and its promotion associations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is already taken or a
    /// referenced collection/promotion does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products (title, slug, description, unit_price_cents, inventory, collection_id, last_update)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&new.title)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(new.unit_price.cents())
        .bind(new.inventory)
        .bind(new.collection_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(constraint_to_conflict)?;

        replace_promotions(&mut tx, row.id, &new.promotion_ids).await?;

        tx.commit().await?;

        row.into_product()
    }

    /// Replace a product (full update) and its promotion associations.
    ///
    /// `last_update` is refreshed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` on slug or reference violations.
    pub async fn update(&self, id: ProductId, new: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products
             SET title = ?, slug = ?, description = ?, unit_price_cents = ?,
                 inventory = ?, collection_id = ?, last_update = ?
             WHERE id = ?
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&new.title)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(new.unit_price.cents())
        .bind(new.inventory)
        .bind(new.collection_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(constraint_to_conflict)?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };

        replace_promotions(&mut tx, id, &new.promotion_ids).await?;

        tx.commit().await?;

        row.into_product()
    }

    /// Delete a product.
    ///
    /// The check and the delete run in one transaction; the RESTRICT foreign
    /// key closes the remaining race with a concurrent order placement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if any order item references the
    /// product. Returns `RepositoryError::NotFound` if it doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE product_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if references > 0 {
            return Err(RepositoryError::Conflict(
                "product is referenced by one or more order items".to_owned(),
            ));
        }

        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "product is referenced by one or more order items".to_owned(),
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

    /// Promotion ids attached to each of the given products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn promotions_for(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<(ProductId, PromotionId)>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT product_id, promotion_id FROM product_promotions WHERE product_id IN (",
        );
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        query.push(") ORDER BY product_id, promotion_id");

        Ok(query.build_query_as().fetch_all(self.pool).await?)
    }
}

/// Append WHERE clauses for `filter` to a products query.
fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    if let Some(collection_id) = filter.collection_id {
        query.push(" AND collection_id = ");
        query.push_bind(collection_id);
    }
    if let Some(min_price) = filter.min_price {
        query.push(" AND unit_price_cents >= ");
        query.push_bind(min_price.cents());
    }
    if let Some(max_price) = filter.max_price {
        query.push(" AND unit_price_cents <= ");
        query.push_bind(max_price.cents());
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        query.push(" AND (lower(title) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR lower(coalesce(description, '')) LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

/// Replace the promotion association set of a product.
async fn replace_promotions(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    product_id: ProductId,
    promotion_ids: &[PromotionId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM product_promotions WHERE product_id = ?")
        .bind(product_id)
        .execute(&mut **tx)
        .await?;

    for promotion_id in promotion_ids {
        sqlx::query("INSERT INTO product_promotions (product_id, promotion_id) VALUES (?, ?)")
            .bind(product_id)
            .bind(*promotion_id)
            .execute(&mut **tx)
            .await
            .map_err(constraint_to_conflict)?;
    }

    Ok(())
}

/// Map constraint violations on catalog writes to `Conflict`.
fn constraint_to_conflict(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict("a product with this slug already exists".to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::Conflict(
                "referenced collection or promotion does not exist".to_owned(),
            );
        }
    }
    RepositoryError::Database(e)
}
