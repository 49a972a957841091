//! Sales and purchase summaries, and the grouped "by customer / by supplier /
//! by item" reports that share their folds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::reports::DateRange;
use crate::types::InvoiceKind;

// =============================================================================
// Query Rows
// =============================================================================

/// Aggregate over the invoices of one kind in a range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceTotalsRow {
    pub total_amount: Option<Money>,
    pub total_invoices: i64,
    pub total_paid: Option<Money>,
    pub total_due: Option<Money>,
}

/// Invoice totals grouped by counterparty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CounterpartyAmountRow {
    pub counterparty_id: Option<String>,
    pub counterparty_name: Option<String>,
    pub invoice_count: i64,
    pub amount: Option<Money>,
}

/// Line amounts grouped by item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ItemAmountRow {
    pub item_id: Option<String>,
    pub item_name: Option<String>,
    pub quantity: Option<i64>,
    pub amount: Option<Money>,
}

/// Invoice totals grouped by `YYYY-MM`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MonthAmountRow {
    pub month: String,
    pub invoice_count: i64,
    pub amount: Option<Money>,
}

// =============================================================================
// View-models
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CounterpartyTotal {
    pub counterparty_id: Option<String>,
    pub counterparty_name: String,
    pub invoice_count: i64,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemTotal {
    pub item_id: Option<String>,
    pub item_name: String,
    pub quantity: i64,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyAmount {
    /// `YYYY-MM`
    pub month: String,
    pub invoice_count: i64,
    pub amount: Money,
}

/// Sales summary (`kind = Sale`) or purchase summary (`kind = Purchase`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceSummary {
    pub kind: InvoiceKind,
    pub range: DateRange,
    pub total_amount: Money,
    pub total_invoices: i64,
    pub total_paid: Money,
    pub total_due: Money,
    /// `total_amount / total_invoices`, zero when there are no invoices.
    pub average_order_value: Money,
    /// Customers for sales, suppliers for purchases.
    pub top_counterparties: Vec<CounterpartyTotal>,
    pub top_items: Vec<ItemTotal>,
    /// One entry per month touched by the range, in range order.
    pub monthly: Vec<MonthlyAmount>,
}

// =============================================================================
// Folds
// =============================================================================

/// Combines the four summary queries.
///
/// ## Example
/// ```rust
/// use tally_core::reports::summary::{summarize_invoices, CounterpartyAmountRow, InvoiceTotalsRow};
/// use tally_core::{DateRange, InvoiceKind, Money};
///
/// let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
/// let totals = InvoiceTotalsRow {
///     total_amount: Some(Money::from_cents(5000)),
///     total_invoices: 5,
///     total_paid: Some(Money::from_cents(3000)),
///     total_due: Some(Money::from_cents(2000)),
/// };
/// let summary = summarize_invoices(InvoiceKind::Sale, range, Some(totals), vec![], vec![], vec![], 5);
/// assert_eq!(summary.average_order_value.cents(), 1000);
/// ```
pub fn summarize_invoices(
    kind: InvoiceKind,
    range: DateRange,
    totals: Option<InvoiceTotalsRow>,
    counterparties: Vec<CounterpartyAmountRow>,
    items: Vec<ItemAmountRow>,
    months: Vec<MonthAmountRow>,
    top_n: usize,
) -> InvoiceSummary {
    let totals = totals.unwrap_or_default();
    let total_amount = Money::from_nullable(totals.total_amount);
    let total_invoices = totals.total_invoices.max(0);

    InvoiceSummary {
        kind,
        range,
        total_amount,
        total_invoices,
        total_paid: Money::from_nullable(totals.total_paid),
        total_due: Money::from_nullable(totals.total_due),
        average_order_value: total_amount.divide_by(total_invoices),
        top_counterparties: fold_counterparties(counterparties, Some(top_n)),
        top_items: fold_items(items, Some(top_n)),
        monthly: fill_months(&range, months),
    }
}

/// Merges rows with the same counterparty, sorts descending by amount (ties
/// keep first-seen order) and keeps at most `limit` entries.
///
/// Rows without an id are keyed by name, so walk-in sales group together.
pub fn fold_counterparties(
    rows: Vec<CounterpartyAmountRow>,
    limit: Option<usize>,
) -> Vec<CounterpartyTotal> {
    let mut out: Vec<CounterpartyTotal> = Vec::with_capacity(rows.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let name = row.counterparty_name.unwrap_or_default();
        let key = match &row.counterparty_id {
            Some(id) => format!("id:{}", id),
            None => format!("name:{}", name),
        };
        let amount = Money::from_nullable(row.amount);

        match index.get(&key) {
            Some(&i) => {
                out[i].amount += amount;
                out[i].invoice_count += row.invoice_count;
            }
            None => {
                index.insert(key, out.len());
                out.push(CounterpartyTotal {
                    counterparty_id: row.counterparty_id,
                    counterparty_name: name,
                    invoice_count: row.invoice_count,
                    amount,
                });
            }
        }
    }

    out.sort_by(|a, b| b.amount.cmp(&a.amount));
    if let Some(limit) = limit {
        out.truncate(limit);
    }
    out
}

/// Same as [`fold_counterparties`] for item rows.
pub fn fold_items(rows: Vec<ItemAmountRow>, limit: Option<usize>) -> Vec<ItemTotal> {
    let mut out: Vec<ItemTotal> = Vec::with_capacity(rows.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let name = row.item_name.unwrap_or_default();
        let key = match &row.item_id {
            Some(id) => format!("id:{}", id),
            None => format!("name:{}", name),
        };
        let amount = Money::from_nullable(row.amount);
        let quantity = row.quantity.unwrap_or(0);

        match index.get(&key) {
            Some(&i) => {
                out[i].amount += amount;
                out[i].quantity += quantity;
            }
            None => {
                index.insert(key, out.len());
                out.push(ItemTotal {
                    item_id: row.item_id,
                    item_name: name,
                    quantity,
                    amount,
                });
            }
        }
    }

    out.sort_by(|a, b| b.amount.cmp(&a.amount));
    if let Some(limit) = limit {
        out.truncate(limit);
    }
    out
}

/// Lays the monthly rows over every month of the range; months without
/// invoices read as zero. Rows outside the range are dropped.
fn fill_months(range: &DateRange, rows: Vec<MonthAmountRow>) -> Vec<MonthlyAmount> {
    let mut by_month: HashMap<String, (i64, Money)> = HashMap::new();
    for row in rows {
        let slot = by_month.entry(row.month).or_insert((0, Money::zero()));
        slot.0 += row.invoice_count;
        slot.1 += Money::from_nullable(row.amount);
    }

    range
        .month_keys()
        .into_iter()
        .map(|month| {
            let (invoice_count, amount) = by_month.get(&month).copied().unwrap_or_default();
            MonthlyAmount {
                month,
                invoice_count,
                amount,
            }
        })
        .collect()
}
