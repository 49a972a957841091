//! # Domain Types
//!
//! Rows read from (or written to) the local store. The core treats them as
//! plain records; only the checkout path in tally-db writes them.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │     Invoice     │   │      Item       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  party_type     │◄──│  customer_id    │   │  stock_quantity │       │
//! │  │  opening_bal.   │   │  invoice_type   │   │  purchase_price │       │
//! │  │  current_bal.   │   │  status         │   │  sale_price     │       │
//! │  └─────────────────┘   │  total, due     │   │  low_stock_alert│       │
//! │           ▲            └────────┬────────┘   └─────────────────┘       │
//! │           │                     │ owns                ▲                 │
//! │  ┌────────┴────────┐   ┌────────▼────────┐            │                 │
//! │  │ Payment (in/out)│   │ InvoiceLineItem │────────────┘                 │
//! │  │ CreditNote      │   │  quantity,amount│                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  Expense, CashTransaction, BankTransaction: read-only report inputs     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dates are calendar dates (`YYYY-MM-DD` in storage); timestamps are UTC.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (825 = 8.25%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// Whether an invoice records a sale or a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    Sale,
    Purchase,
}

impl InvoiceKind {
    /// Storage representation, used as a bind parameter.
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceKind::Sale => "sale",
            InvoiceKind::Purchase => "purchase",
        }
    }
}

/// Lifecycle status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Partial,
    Unpaid,
    Cancelled,
}

impl InvoiceStatus {
    #[inline]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, InvoiceStatus::Cancelled)
    }
}

/// Whether a counterparty buys from us, sells to us, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PartyType {
    #[default]
    Customer,
    Supplier,
    Both,
}

/// Stocked products track quantity on hand; services never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    Product,
    Service,
}

impl ItemKind {
    #[inline]
    pub const fn is_stocked(&self) -> bool {
        matches!(self, ItemKind::Product)
    }
}

/// Money received (`In`) or paid out (`Out`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// Bank account movement type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BankTxnKind {
    Deposit,
    Withdrawal,
}

// =============================================================================
// Customer / Supplier
// =============================================================================

/// A counterparty. `current_balance` is maintained by the write path; the
/// report core only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub party_type: PartyType,
    /// Balance carried in when the customer was created.
    pub opening_balance: Money,
    /// Positive: they owe us. Negative: we owe them.
    pub current_balance: Money,
    /// Credit terms in days (0 = due on invoice date).
    pub credit_days: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Item
// =============================================================================

/// A product or service that can appear on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub sku: Option<String>,
    pub item_type: ItemKind,
    pub unit: Option<String>,
    pub stock_quantity: i64,
    pub purchase_price: Money,
    pub sale_price: Money,
    /// Tax rate in basis points (825 = 8.25%).
    pub tax_rate_bps: u32,
    /// At or below this quantity (and above zero) the item is low on stock.
    pub low_stock_alert: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Value of the stock on hand at purchase price.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.purchase_price * self.stock_quantity
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A sale or purchase invoice.
///
/// ## Invariants (maintained by writers)
/// - `total = subtotal - discount_amount + tax_amount`
/// - `amount_due = total - amount_paid`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub invoice_type: InvoiceKind,
    pub customer_id: Option<String>,
    pub customer_name: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub discount_amount: Money,
    pub total: Money,
    pub amount_paid: Money,
    pub amount_due: Money,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line on an invoice. Owned by its invoice; never edited after checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceLineItem {
    pub id: String,
    pub invoice_id: String,
    pub item_id: Option<String>,
    pub item_name: String,
    pub quantity: i64,
    pub unit: Option<String>,
    pub unit_price: Money,
    pub tax_rate_bps: u32,
    /// Percentage discount in basis points (0 for fixed discounts).
    pub discount_bps: i64,
    /// Discount taken off this line.
    pub discount_amount: Money,
    /// `unit_price × quantity - discount_amount`; tax stays at invoice level.
    pub amount: Money,
}

// =============================================================================
// Payments and other money movements
// =============================================================================

/// Money received from a customer (`In`) or paid to a supplier (`Out`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub payment_number: String,
    pub direction: Direction,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub invoice_id: Option<String>,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub amount: Money,
    /// cash, card, upi, bank, cheque, ...
    pub payment_mode: String,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub category: Option<String>,
    pub amount: Money,
    pub payment_mode: Option<String>,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Cash put into or taken out of the till outside of invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashTransaction {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub direction: Direction,
    pub amount: Money,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BankTransaction {
    pub id: String,
    pub account_name: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub txn_type: BankTxnKind,
    pub amount: Money,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Credit issued to a customer; reduces what they owe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CreditNote {
    pub id: String,
    pub credit_note_number: String,
    pub customer_id: String,
    pub invoice_id: Option<String>,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub amount: Money,
    pub reason: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Document Numbers
// =============================================================================

/// Builds a document number `PREFIX-<last 6 digits of epoch ms>`.
///
/// Fine for a single local writer; two documents created within the same
/// millisecond modulo 10^6 collide, so this is not a unique sequence.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use tally_core::types::generate_document_number;
///
/// let at = Utc.timestamp_millis_opt(1_700_000_012_345).unwrap();
/// assert_eq!(generate_document_number("INV", at), "INV-012345");
/// ```
pub fn generate_document_number(prefix: &str, at: DateTime<Utc>) -> String {
    let suffix = at.timestamp_millis().rem_euclid(1_000_000);
    format!("{}-{:06}", prefix, suffix)
}
