//! # Checkout
//!
//! Turns a priced cart into a persisted sale.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  process_transaction(cart, payment_mode, amount_paid)                  │
//! │                                                                         │
//! │  1. validate mode / amount        ── Rejected(Validation), no I/O      │
//! │  2. cart non-empty                ── Rejected(EmptyCart), no I/O       │
//! │  3. BEGIN                                                               │
//! │  4. stock check (products only)   ── Rejected(InsufficientStock)       │
//! │  5. INSERT invoice (status paid)                                        │
//! │  6. per line: INSERT invoice_item, stock -= quantity                   │
//! │  7. INSERT payment (in, linked to invoice)                              │
//! │  8. customer balance += amount_due                                      │
//! │  9. COMMIT ──► cart cleared, receipt returned                           │
//! │                                                                         │
//! │  Any failure in 3..9 rolls everything back; the cart is left as it     │
//! │  was so the operator can retry.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is read inside the transaction, so the check sees the stock stored
//! at commit time rather than the copy taken when the item was scanned.

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::StoreSettings;
use crate::error::DbError;
use crate::repository::customer::write_balance_delta;
use crate::repository::generate_id;
use crate::repository::invoice::{write_invoice, write_line};
use crate::repository::item::write_stock_delta;
use crate::repository::movement::write_payment;
use tally_core::cart::{CartTotals, PosCart};
use tally_core::types::generate_document_number;
use tally_core::validation::{validate_amount_paid, validate_payment_mode};
use tally_core::{
    CoreError, Direction, Invoice, InvoiceKind, InvoiceLineItem, InvoiceStatus, ItemKind, Money,
    Payment,
};

// =============================================================================
// Errors and Receipt
// =============================================================================

/// Why a checkout did not go through.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A precondition failed; nothing was written.
    #[error("Checkout rejected: {0}")]
    Rejected(#[from] CoreError),

    /// Storage failed during the commit; everything was rolled back.
    #[error("Checkout failed, nothing was saved: {0}")]
    TransactionFailed(#[from] DbError),
}

impl CheckoutError {
    /// True when retrying with the same cart might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::TransactionFailed(_))
    }
}

/// What the till prints after a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    pub invoice_id: String,
    pub invoice_number: String,
    pub payment_number: String,
    pub total: Money,
    pub amount_paid: Money,
    /// Left on the customer's account.
    pub amount_due: Money,
    /// Handed back to the customer.
    pub change_due: Money,
}

// =============================================================================
// Processor
// =============================================================================

#[derive(Debug, Clone)]
pub struct CheckoutProcessor {
    pool: SqlitePool,
    invoice_prefix: String,
    payment_prefix: String,
    walk_in_name: String,
}

impl CheckoutProcessor {
    pub fn new(pool: SqlitePool, store: &StoreSettings) -> Self {
        CheckoutProcessor {
            pool,
            invoice_prefix: store.invoice_prefix.clone(),
            payment_prefix: store.payment_prefix.clone(),
            walk_in_name: store.walk_in_customer_name.clone(),
        }
    }

    /// Commits the cart as a paid sale invoice and clears it.
    ///
    /// ## Errors
    /// * `Rejected(Validation)` - blank payment mode or negative amount
    /// * `Rejected(EmptyCart)` - nothing to sell
    /// * `Rejected(InsufficientStock)` - a product line asks for more than is stored
    /// * `TransactionFailed` - storage error, nothing persisted
    ///
    /// The cart is cleared only when `Ok` is returned.
    pub async fn process_transaction(
        &self,
        cart: &mut PosCart,
        payment_mode: &str,
        amount_paid: Money,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let mode = validate_payment_mode(payment_mode).map_err(CoreError::from)?;
        validate_amount_paid(amount_paid).map_err(CoreError::from)?;

        if cart.is_empty() {
            warn!("Checkout rejected: cart is empty");
            return Err(CoreError::EmptyCart.into());
        }

        let totals = cart.totals();
        debug!(
            lines = totals.item_count,
            total = %totals.grand_total,
            paid = %amount_paid,
            mode = %mode,
            "Starting checkout"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        match self.write_sale(&mut tx, cart, &totals, &mode, amount_paid).await {
            Ok(receipt) => {
                if let Err(e) = tx.commit().await {
                    error!(error = %e, "Checkout commit failed");
                    return Err(DbError::TransactionFailed(e.to_string()).into());
                }

                cart.clear();
                info!(
                    invoice = %receipt.invoice_number,
                    total = %receipt.total,
                    due = %receipt.amount_due,
                    "Checkout committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    error!(error = %rollback, "Checkout rollback failed");
                }

                match &e {
                    CheckoutError::Rejected(reason) => {
                        warn!(reason = %reason, "Checkout rejected")
                    }
                    CheckoutError::TransactionFailed(cause) => {
                        error!(error = %cause, "Checkout rolled back")
                    }
                }
                Err(e)
            }
        }
    }

    /// Steps 4 to 8, all on the open transaction.
    async fn write_sale(
        &self,
        tx: &mut SqliteConnection,
        cart: &PosCart,
        totals: &CartTotals,
        mode: &str,
        amount_paid: Money,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        check_stock(tx, cart).await?;

        let now = Utc::now();
        let today = now.date_naive();
        let total = totals.grand_total;
        let amount_due = (total - amount_paid).non_negative();
        let change_due = (amount_paid - total).non_negative();

        let customer = cart.customer();
        let customer_id = customer.map(|c| c.id.clone());
        let customer_name = customer
            .map(|c| c.name.clone())
            .unwrap_or_else(|| self.walk_in_name.clone());

        let invoice = Invoice {
            id: generate_id(),
            invoice_number: generate_document_number(&self.invoice_prefix, now),
            invoice_type: InvoiceKind::Sale,
            customer_id: customer_id.clone(),
            customer_name: customer_name.clone(),
            date: today,
            due_date: None,
            status: InvoiceStatus::Paid,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_total,
            discount_amount: totals.discount_total,
            total,
            amount_paid,
            amount_due,
            notes: None,
            created_at: now,
        };
        write_invoice(tx, &invoice).await?;

        for line in cart.items() {
            let row = InvoiceLineItem {
                id: generate_id(),
                invoice_id: invoice.id.clone(),
                item_id: Some(line.item_id().to_string()),
                item_name: line.item.name.clone(),
                quantity: line.quantity,
                unit: line.item.unit.clone(),
                unit_price: line.price,
                tax_rate_bps: line.item.tax_rate_bps,
                discount_bps: line.discount.bps(),
                discount_amount: line.line_discount(),
                amount: line.line_net(),
            };
            write_line(tx, &row).await?;
            write_stock_delta(tx, line.item_id(), -line.quantity).await?;
        }

        let payment = Payment {
            id: generate_id(),
            payment_number: generate_document_number(&self.payment_prefix, now),
            direction: Direction::In,
            customer_id: customer_id.clone(),
            customer_name: Some(customer_name),
            invoice_id: Some(invoice.id.clone()),
            date: today,
            amount: amount_paid,
            payment_mode: mode.to_string(),
            notes: None,
            created_at: now,
        };
        write_payment(tx, &payment).await?;

        if let Some(id) = &customer_id {
            if amount_due.is_positive() {
                write_balance_delta(tx, id, amount_due).await?;
            }
        }

        Ok(CheckoutReceipt {
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number,
            payment_number: payment.payment_number,
            total,
            amount_paid,
            amount_due,
            change_due,
        })
    }
}

/// Fails on the first product line asking for more than is stored.
///
/// An item row that has disappeared counts as zero stock.
async fn check_stock(tx: &mut SqliteConnection, cart: &PosCart) -> Result<(), CheckoutError> {
    for line in cart.items() {
        let stored: Option<(i64, ItemKind)> =
            sqlx::query_as("SELECT stock_quantity, item_type FROM items WHERE id = ?1")
                .bind(line.item_id())
                .fetch_optional(&mut *tx)
                .await
                .map_err(DbError::from)?;

        let (available, kind) = stored.unwrap_or((0, line.item.item_type));
        if kind.is_stocked() && available - line.quantity < 0 {
            return Err(CoreError::InsufficientStock {
                item_name: line.item.name.clone(),
                available,
                requested: line.quantity,
            }
            .into());
        }
    }

    Ok(())
}
