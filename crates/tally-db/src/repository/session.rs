//! # Session Repository
//!
//! Keeps the POS cart across restarts.
//!
//! ```text
//!   PosCart ──snapshot()──► CartSnapshot ──JSON──► app_state["pos.cart"]
//!   PosCart ◄──restore()─── CartSnapshot ◄──JSON── app_state["pos.cart"]
//! ```
//!
//! Only the lines, the customer and the bill discount are stored; the
//! selected line is screen state and starts empty after a restore.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbResult;
use tally_core::cart::{CartSnapshot, PosCart};

/// `app_state` key holding the saved cart.
pub const CART_KEY: &str = "pos.cart";

#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Saves the cart, replacing any earlier save.
    pub async fn save_cart(&self, cart: &PosCart) -> DbResult<()> {
        let json = cart.snapshot().to_json()?;
        debug!(lines = cart.item_count(), "Saving cart session");

        sqlx::query(
            r#"
            INSERT INTO app_state (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(CART_KEY)
        .bind(json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Restores the saved cart, or an empty one when nothing was saved.
    ///
    /// A saved value that no longer parses is dropped with a warning rather
    /// than blocking the till.
    pub async fn load_cart(&self) -> DbResult<PosCart> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM app_state WHERE key = ?1")
                .bind(CART_KEY)
                .fetch_optional(&self.pool)
                .await?;

        let Some(json) = value else {
            return Ok(PosCart::new());
        };

        match CartSnapshot::from_json(&json) {
            Ok(snapshot) => {
                debug!(lines = snapshot.items.len(), "Restored cart session");
                Ok(PosCart::restore(snapshot))
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable cart session");
                self.clear_cart().await?;
                Ok(PosCart::new())
            }
        }
    }

    pub async fn clear_cart(&self) -> DbResult<()> {
        sqlx::query("DELETE FROM app_state WHERE key = ?1")
            .bind(CART_KEY)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::fixtures;
    use tally_core::{Discount, Money, PartyType};

    #[tokio::test]
    async fn test_cart_survives_restart() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let rice = fixtures::item("Rice", 10, 400, 500);
        let tea = fixtures::item("Tea", 10, 100, 150);

        let mut cart = PosCart::new();
        cart.add_item(&rice);
        cart.add_item(&rice);
        cart.add_item(&tea);
        cart.update_item_discount(&tea.id, Discount::Fixed(Money::from_cents(20)))
            .unwrap();
        cart.set_bill_discount(Discount::Percentage(1_000));
        cart.set_customer(Some(fixtures::customer("Hina", PartyType::Customer)));

        db.sessions().save_cart(&cart).await.unwrap();
        // Saving twice keeps a single row
        db.sessions().save_cart(&cart).await.unwrap();

        let restored = db.sessions().load_cart().await.unwrap();
        assert_eq!(restored.items(), cart.items());
        assert_eq!(restored.customer(), cart.customer());
        assert_eq!(restored.bill_discount(), cart.bill_discount());
        assert_eq!(restored.selected_item_id(), None);
        assert_eq!(restored.grand_total(), cart.grand_total());
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_sessions() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.sessions().load_cart().await.unwrap().is_empty());

        sqlx::query("INSERT INTO app_state (key, value, updated_at) VALUES (?1, '{oops', ?2)")
            .bind(CART_KEY)
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();

        assert!(db.sessions().load_cart().await.unwrap().is_empty());
        let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_state")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(left, 0);
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut cart = PosCart::new();
        cart.add_item(&fixtures::item("Salt", 3, 20, 30));
        db.sessions().save_cart(&cart).await.unwrap();

        db.sessions().clear_cart().await.unwrap();

        assert!(db.sessions().load_cart().await.unwrap().is_empty());
    }
}
