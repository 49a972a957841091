//! # Item Repository
//!
//! Products and services, and their stock levels.
//!
//! ## Stock Changes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Stock is only ever moved by a delta, never overwritten:            │
//! │                                                                     │
//! │  checkout (sale of 3)      stock_quantity = stock_quantity - 3      │
//! │  purchase received (12)    stock_quantity = stock_quantity + 12     │
//! │                                                                     │
//! │  Services carry a stock column too; nothing reads it.              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::Item;

#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by id, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT
                id, name, sku, item_type, unit,
                stock_quantity, purchase_price, sale_price,
                tax_rate_bps, low_stock_alert, is_active,
                created_at, updated_at
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists active items by name.
    pub async fn list_active(&self) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT
                id, name, sku, item_type, unit,
                stock_quantity, purchase_price, sale_price,
                tax_rate_bps, low_stock_alert, is_active,
                created_at, updated_at
            FROM items
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = items.len(), "Listed active items");
        Ok(items)
    }

    /// Inserts an item.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (
                id, name, sku, item_type, unit,
                stock_quantity, purchase_price, sale_price,
                tax_rate_bps, low_stock_alert, is_active,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13
            )
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(item.item_type)
        .bind(&item.unit)
        .bind(item.stock_quantity)
        .bind(item.purchase_price)
        .bind(item.sale_price)
        .bind(item.tax_rate_bps)
        .bind(item.low_stock_alert)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, item.sku.clone().unwrap_or_default())
            }
            other => other,
        })?;

        Ok(())
    }

    /// Moves stock by `delta` (negative for sales, positive for purchases).
    pub async fn update_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        write_stock_delta(&mut conn, id, delta).await
    }

    /// Counts active items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn write_stock_delta(
    conn: &mut SqliteConnection,
    id: &str,
    delta: i64,
) -> DbResult<()> {
    debug!(id = %id, delta = %delta, "Updating stock");

    let result = sqlx::query(
        r#"
        UPDATE items
        SET stock_quantity = stock_quantity + ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(delta)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Item", id));
    }

    Ok(())
}
