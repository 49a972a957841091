//! # Money Movements
//!
//! Payments, expenses, cash drawer and bank movements, and credit notes.
//! Reports read these tables; apart from the payment written by checkout
//! they are only inserted here (seeding, imports, tests).
//!
//! Inserting a payment or credit note does not touch the counterparty's
//! `current_balance`; callers that need that adjust it themselves.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{BankTransaction, CashTransaction, CreditNote, Expense, Payment};

// =============================================================================
// Payments
// =============================================================================

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    pub async fn insert(&self, payment: &Payment) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        write_payment(&mut conn, payment).await
    }

    /// Payments recorded against an invoice, oldest first.
    pub async fn for_invoice(&self, invoice_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT
                id, payment_number, direction, customer_id, customer_name,
                invoice_id, date, amount, payment_mode, notes, created_at
            FROM payments
            WHERE invoice_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn write_payment(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    debug!(
        number = %payment.payment_number,
        direction = payment.direction.as_str(),
        amount = %payment.amount,
        "Recording payment"
    );

    sqlx::query(
        r#"
        INSERT INTO payments (
            id, payment_number, direction, customer_id, customer_name,
            invoice_id, date, amount, payment_mode, notes, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10, ?11
        )
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.payment_number)
    .bind(payment.direction)
    .bind(&payment.customer_id)
    .bind(&payment.customer_name)
    .bind(&payment.invoice_id)
    .bind(payment.date)
    .bind(payment.amount)
    .bind(&payment.payment_mode)
    .bind(&payment.notes)
    .bind(payment.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Expenses
// =============================================================================

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    pub async fn insert(&self, expense: &Expense) -> DbResult<()> {
        debug!(id = %expense.id, amount = %expense.amount, "Recording expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, date, category, amount, payment_mode, description, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&expense.id)
        .bind(expense.date)
        .bind(&expense.category)
        .bind(expense.amount)
        .bind(&expense.payment_mode)
        .bind(&expense.description)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Cash Drawer and Bank
// =============================================================================

#[derive(Debug, Clone)]
pub struct CashRepository {
    pool: SqlitePool,
}

impl CashRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashRepository { pool }
    }

    pub async fn insert_cash(&self, txn: &CashTransaction) -> DbResult<()> {
        debug!(id = %txn.id, direction = txn.direction.as_str(), "Recording cash movement");

        sqlx::query(
            r#"
            INSERT INTO cash_transactions (
                id, date, direction, amount, description, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&txn.id)
        .bind(txn.date)
        .bind(txn.direction)
        .bind(txn.amount)
        .bind(&txn.description)
        .bind(txn.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_bank(&self, txn: &BankTransaction) -> DbResult<()> {
        debug!(id = %txn.id, account = %txn.account_name, "Recording bank movement");

        sqlx::query(
            r#"
            INSERT INTO bank_transactions (
                id, account_name, date, txn_type, amount, description, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&txn.id)
        .bind(&txn.account_name)
        .bind(txn.date)
        .bind(txn.txn_type)
        .bind(txn.amount)
        .bind(&txn.description)
        .bind(txn.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Credit Notes
// =============================================================================

#[derive(Debug, Clone)]
pub struct CreditNoteRepository {
    pool: SqlitePool,
}

impl CreditNoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CreditNoteRepository { pool }
    }

    pub async fn insert(&self, note: &CreditNote) -> DbResult<()> {
        debug!(
            number = %note.credit_note_number,
            customer_id = %note.customer_id,
            "Recording credit note"
        );

        sqlx::query(
            r#"
            INSERT INTO credit_notes (
                id, credit_note_number, customer_id, invoice_id,
                date, amount, reason, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&note.id)
        .bind(&note.credit_note_number)
        .bind(&note.customer_id)
        .bind(&note.invoice_id)
        .bind(note.date)
        .bind(note.amount)
        .bind(&note.reason)
        .bind(note.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn for_customer(&self, customer_id: &str) -> DbResult<Vec<CreditNote>> {
        let notes = sqlx::query_as::<_, CreditNote>(
            r#"
            SELECT
                id, credit_note_number, customer_id, invoice_id,
                date, amount, reason, created_at
            FROM credit_notes
            WHERE customer_id = ?1
            ORDER BY date, created_at
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }
}
