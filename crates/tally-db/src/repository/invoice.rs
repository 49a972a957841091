//! # Invoice Repository
//!
//! Sale and purchase invoices with their line items.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  invoices ──1:N──► invoice_items (ON DELETE CASCADE)                │
//! │                                                                     │
//! │  An invoice and its lines are always written together, inside one  │
//! │  transaction. Lines are never edited afterwards.                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The row writers take a bare `SqliteConnection` so the checkout transaction
//! can reuse them.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Invoice, InvoiceLineItem, InvoiceStatus};

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Inserts an invoice and its lines atomically.
    pub async fn insert(&self, invoice: &Invoice, lines: &[InvoiceLineItem]) -> DbResult<()> {
        debug!(
            id = %invoice.id,
            number = %invoice.invoice_number,
            lines = lines.len(),
            "Inserting invoice"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        write_invoice(&mut tx, invoice).await?;
        for line in lines {
            write_line(&mut tx, line).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT
                id, invoice_number, invoice_type, customer_id, customer_name,
                date, due_date, status,
                subtotal, tax_amount, discount_amount, total,
                amount_paid, amount_due, notes, created_at
            FROM invoices
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Lines of an invoice, in insertion order.
    pub async fn get_lines(&self, invoice_id: &str) -> DbResult<Vec<InvoiceLineItem>> {
        let lines = sqlx::query_as::<_, InvoiceLineItem>(
            r#"
            SELECT
                id, invoice_id, item_id, item_name, quantity, unit,
                unit_price, tax_rate_bps, discount_bps, discount_amount, amount
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Marks an invoice cancelled. Reports skip cancelled invoices; stock
    /// and balances are left as they are.
    pub async fn cancel(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Cancelling invoice");

        let result = sqlx::query("UPDATE invoices SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(InvoiceStatus::Cancelled)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Row Writers
// =============================================================================

pub(crate) async fn write_invoice(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, invoice_number, invoice_type, customer_id, customer_name,
            date, due_date, status,
            subtotal, tax_amount, discount_amount, total,
            amount_paid, amount_due, notes, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8,
            ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16
        )
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.invoice_number)
    .bind(invoice.invoice_type)
    .bind(&invoice.customer_id)
    .bind(&invoice.customer_name)
    .bind(invoice.date)
    .bind(invoice.due_date)
    .bind(invoice.status)
    .bind(invoice.subtotal)
    .bind(invoice.tax_amount)
    .bind(invoice.discount_amount)
    .bind(invoice.total)
    .bind(invoice.amount_paid)
    .bind(invoice.amount_due)
    .bind(&invoice.notes)
    .bind(invoice.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) async fn write_line(conn: &mut SqliteConnection, line: &InvoiceLineItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_items (
            id, invoice_id, item_id, item_name, quantity, unit,
            unit_price, tax_rate_bps, discount_bps, discount_amount, amount
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11
        )
        "#,
    )
    .bind(&line.id)
    .bind(&line.invoice_id)
    .bind(&line.item_id)
    .bind(&line.item_name)
    .bind(line.quantity)
    .bind(&line.unit)
    .bind(line.unit_price)
    .bind(line.tax_rate_bps)
    .bind(line.discount_bps)
    .bind(line.discount_amount)
    .bind(line.amount)
    .execute(conn)
    .await?;

    Ok(())
}
