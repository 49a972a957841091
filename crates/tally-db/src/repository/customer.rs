//! # Customer Repository
//!
//! Customers and suppliers share one table; `party_type` tells them apart.
//! `current_balance` is only moved by deltas from the write paths (checkout,
//! payments), never recomputed here.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Customer, Money};

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT
                id, name, phone, email, address, party_type,
                opening_balance, current_balance, credit_days,
                is_active, created_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer or fails with `NotFound`.
    pub async fn require(&self, id: &str) -> DbResult<Customer> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Lists every customer and supplier, active or not, by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT
                id, name, phone, email, address, party_type,
                opening_balance, current_balance, credit_days,
                is_active, created_at
            FROM customers
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, phone, email, address, party_type,
                opening_balance, current_balance, credit_days,
                is_active, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11
            )
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.party_type)
        .bind(customer.opening_balance)
        .bind(customer.current_balance)
        .bind(customer.credit_days)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Moves `current_balance` by `delta` (positive: they owe us more).
    pub async fn adjust_balance(&self, id: &str, delta: Money) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        write_balance_delta(&mut conn, id, delta).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn write_balance_delta(
    conn: &mut SqliteConnection,
    id: &str,
    delta: Money,
) -> DbResult<()> {
    debug!(id = %id, delta = %delta, "Adjusting customer balance");

    let result =
        sqlx::query("UPDATE customers SET current_balance = current_balance + ?2 WHERE id = ?1")
            .bind(id)
            .bind(delta)
            .execute(conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", id));
    }

    Ok(())
}
