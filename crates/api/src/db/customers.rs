//! Customer repository.
//!
//! A customer owns at most one address row, written together with the
//! customer in a transaction. Deletion is guarded while orders reference the
//! customer.

use sqlx::SqlitePool;

use clove_core::{CustomerId, Membership};

use super::RepositoryError;
use crate::models::{Address, Customer, NewCustomer};

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    first_name: String,
    last_name: String,
    membership: String,
    street: Option<String>,
    city: Option<String>,
}

impl CustomerRow {
    fn into_customer(self) -> Result<Customer, RepositoryError> {
        let membership: Membership = self.membership.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid membership in database: {e}"))
        })?;

        let address = match (self.street, self.city) {
            (Some(street), Some(city)) => Some(Address { street, city }),
            _ => None,
        };

        Ok(Customer {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            membership,
            address,
        })
    }
}

const CUSTOMER_QUERY: &str = "
    SELECT c.id, c.first_name, c.last_name, c.membership, a.street, a.city
    FROM customers c
    LEFT JOIN addresses a ON a.customer_id = c.id";

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all customers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows: Vec<CustomerRow> = sqlx::query_as(&format!("{CUSTOMER_QUERY} ORDER BY c.id"))
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(CustomerRow::into_customer).collect()
    }

    /// Get a customer by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!("{CUSTOMER_QUERY} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(CustomerRow::into_customer).transpose()
    }

    /// Create a customer and, when given, their address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(&self, new: &NewCustomer) -> Result<Customer, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: CustomerId = sqlx::query_scalar(
            "INSERT INTO customers (first_name, last_name, membership) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(new.membership.to_string())
        .fetch_one(&mut *tx)
        .await?;

        if let Some(address) = &new.address {
            sqlx::query("INSERT INTO addresses (customer_id, street, city) VALUES (?, ?, ?)")
                .bind(id)
                .bind(&address.street)
                .bind(&address.city)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Customer {
            id,
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            membership: new.membership,
            address: new.address.clone(),
        })
    }

    /// Replace a customer (full update), including the address.
    ///
    /// Passing no address removes a stored one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer doesn't exist.
    pub async fn update(
        &self,
        id: CustomerId,
        new: &NewCustomer,
    ) -> Result<Customer, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE customers SET first_name = ?, last_name = ?, membership = ? WHERE id = ?",
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(new.membership.to_string())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM addresses WHERE customer_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if let Some(address) = &new.address {
            sqlx::query("INSERT INTO addresses (customer_id, street, city) VALUES (?, ?, ?)")
                .bind(id)
                .bind(&address.street)
                .bind(&address.city)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Customer {
            id,
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            membership: new.membership,
            address: new.address.clone(),
        })
    }

    /// Delete a customer.
    ///
    /// The check and the delete run in one transaction; the RESTRICT foreign
    /// key on `orders.customer_id` closes the remaining race with a
    /// concurrent order placement. The address cascades away.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if orders reference the customer.
    /// Returns `RepositoryError::NotFound` if the customer doesn't exist.
    pub async fn delete(&self, id: CustomerId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if orders > 0 {
            return Err(RepositoryError::Conflict(
                "customer has one or more orders".to_owned(),
            ));
        }

        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "customer has one or more orders".to_owned(),
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
