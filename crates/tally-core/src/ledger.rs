//! # Ledger Math
//!
//! Running balances and aging buckets. Both are pure: the same input always
//! produces the same output, so reports can be recomputed on every pull.
//!
//! ## Running Ledger
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  opening 100                                                            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Opening Balance   debit 100  credit   0   balance 100                  │
//! │  Invoice INV-1     debit 500  credit   0   balance 600                  │
//! │  Payment PAY-1     debit   0  credit 300   balance 300  ◄── closing     │
//! │                                                                         │
//! │  balance_i = opening + Σ_{k≤i} (debit_k - credit_k)                     │
//! │  totals exclude the synthetic opening entry                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Aging Buckets
//! ```text
//!   days overdue:  ≤0 │ 1 … 30 │ 31 … 60 │ 61 … 90 │ 91 …
//!   bucket:   Current │  1-30  │  31-60  │  61-90  │  90+
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::money::Money;
use crate::types::InvoiceStatus;

// =============================================================================
// Running Ledger
// =============================================================================

/// What produced a ledger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    OpeningBalance,
    Invoice,
    Payment,
    CreditNote,
    #[default]
    Adjustment,
}

/// One input movement. Invoices are debits; payments and credit notes are
/// credits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerTransaction {
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
    pub kind: LedgerEntryKind,
    pub reference: String,
    pub description: String,
    pub debit: Money,
    pub credit: Money,
}

impl LedgerTransaction {
    pub fn debit(amount: Money) -> Self {
        LedgerTransaction {
            debit: amount,
            ..Default::default()
        }
    }

    pub fn credit(amount: Money) -> Self {
        LedgerTransaction {
            credit: amount,
            ..Default::default()
        }
    }
}

/// A transaction annotated with the balance right after it was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEntry {
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
    pub kind: LedgerEntryKind,
    pub reference: String,
    pub description: String,
    pub debit: Money,
    pub credit: Money,
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RunningLedger {
    /// Opening entry first, then one entry per transaction in input order.
    pub entries: Vec<LedgerEntry>,
    pub total_debit: Money,
    pub total_credit: Money,
    pub closing_balance: Money,
}

/// Builds a running ledger from an opening balance and transactions already
/// sorted ascending by date (ties keep input order).
///
/// The synthetic "Opening Balance" entry carries `debit = max(opening, 0)`
/// and `credit = max(-opening, 0)` and is not counted in the totals.
pub fn compute_running_ledger(
    opening_balance: Money,
    transactions: Vec<LedgerTransaction>,
) -> RunningLedger {
    let mut entries = Vec::with_capacity(transactions.len() + 1);
    entries.push(LedgerEntry {
        date: None,
        kind: LedgerEntryKind::OpeningBalance,
        reference: String::new(),
        description: "Opening Balance".to_string(),
        debit: opening_balance.non_negative(),
        credit: (-opening_balance).non_negative(),
        balance: opening_balance,
    });

    let mut balance = opening_balance;
    let mut total_debit = Money::zero();
    let mut total_credit = Money::zero();

    for txn in transactions {
        balance += txn.debit - txn.credit;
        total_debit += txn.debit;
        total_credit += txn.credit;
        entries.push(LedgerEntry {
            date: txn.date,
            kind: txn.kind,
            reference: txn.reference,
            description: txn.description,
            debit: txn.debit,
            credit: txn.credit,
            balance,
        });
    }

    RunningLedger {
        entries,
        total_debit,
        total_credit,
        closing_balance: balance,
    }
}

// =============================================================================
// Aging
// =============================================================================

/// How overdue an amount is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AgingBucket {
    Current,
    Days1To30,
    Days31To60,
    Days61To90,
    Days90Plus,
}

impl AgingBucket {
    /// All buckets in display order.
    pub const ALL: [AgingBucket; 5] = [
        AgingBucket::Current,
        AgingBucket::Days1To30,
        AgingBucket::Days31To60,
        AgingBucket::Days61To90,
        AgingBucket::Days90Plus,
    ];

    /// First matching rule wins, checked from the oldest bucket down.
    pub const fn from_days_overdue(days: i64) -> Self {
        if days > 90 {
            AgingBucket::Days90Plus
        } else if days > 60 {
            AgingBucket::Days61To90
        } else if days > 30 {
            AgingBucket::Days31To60
        } else if days > 0 {
            AgingBucket::Days1To30
        } else {
            AgingBucket::Current
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            AgingBucket::Current => "Current",
            AgingBucket::Days1To30 => "1-30 Days",
            AgingBucket::Days31To60 => "31-60 Days",
            AgingBucket::Days61To90 => "61-90 Days",
            AgingBucket::Days90Plus => "90+ Days",
        }
    }
}

/// Whole calendar days from `due` to `reference`. Both are dates, so time of
/// day cannot shift the result; callers holding timestamps pass
/// `timestamp.date_naive()`.
pub fn days_overdue(reference: NaiveDate, due: NaiveDate) -> i64 {
    (reference - due).num_days()
}

/// Classifies an amount due on `due` as seen on `reference`.
pub fn classify_aging_bucket(reference: NaiveDate, due: NaiveDate) -> AgingBucket {
    AgingBucket::from_days_overdue(days_overdue(reference, due))
}

/// An invoice with money still outstanding, as fed to [`aggregate_aging`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OutstandingInvoice {
    pub id: String,
    pub invoice_number: String,
    pub counterparty_id: Option<String>,
    pub counterparty_name: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub amount_due: Option<Money>,
}

/// Five bucket totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BucketAmounts {
    pub current: Money,
    pub days_1_30: Money,
    pub days_31_60: Money,
    pub days_61_90: Money,
    pub days_90_plus: Money,
}

impl BucketAmounts {
    pub fn get(&self, bucket: AgingBucket) -> Money {
        match bucket {
            AgingBucket::Current => self.current,
            AgingBucket::Days1To30 => self.days_1_30,
            AgingBucket::Days31To60 => self.days_31_60,
            AgingBucket::Days61To90 => self.days_61_90,
            AgingBucket::Days90Plus => self.days_90_plus,
        }
    }

    pub fn add(&mut self, bucket: AgingBucket, amount: Money) {
        let slot = match bucket {
            AgingBucket::Current => &mut self.current,
            AgingBucket::Days1To30 => &mut self.days_1_30,
            AgingBucket::Days31To60 => &mut self.days_31_60,
            AgingBucket::Days61To90 => &mut self.days_61_90,
            AgingBucket::Days90Plus => &mut self.days_90_plus,
        };
        *slot += amount;
    }

    pub fn total(&self) -> Money {
        AgingBucket::ALL.iter().map(|b| self.get(*b)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BucketTotal {
    pub bucket: AgingBucket,
    pub label: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CounterpartyAging {
    pub counterparty_id: Option<String>,
    pub counterparty_name: String,
    pub buckets: BucketAmounts,
    pub total_due: Money,
    pub invoice_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AgingReport {
    #[ts(as = "String")]
    pub as_of: NaiveDate,
    pub total_due: Money,
    /// Always five entries, Current first.
    pub buckets: Vec<BucketTotal>,
    /// Sorted descending by `total_due`; ties keep first-seen order.
    pub counterparties: Vec<CounterpartyAging>,
}

/// Buckets every open, non-cancelled invoice with `amount_due > 0` by its due
/// date (falling back to the invoice date) as of `reference`.
///
/// Counterparties are created on their first contributing invoice, keyed by
/// id (or by name for invoices without a counterparty id).
pub fn aggregate_aging(invoices: &[OutstandingInvoice], reference: NaiveDate) -> AgingReport {
    let mut totals = BucketAmounts::default();
    let mut counterparties: Vec<CounterpartyAging> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for invoice in invoices {
        let amount_due = Money::from_nullable(invoice.amount_due);
        if !amount_due.is_positive() || invoice.status.is_cancelled() {
            continue;
        }

        let due = invoice.due_date.unwrap_or(invoice.date);
        let bucket = classify_aging_bucket(reference, due);
        totals.add(bucket, amount_due);

        let key = invoice
            .counterparty_id
            .clone()
            .unwrap_or_else(|| format!("name:{}", invoice.counterparty_name));
        let idx = *index_by_key.entry(key).or_insert_with(|| {
            counterparties.push(CounterpartyAging {
                counterparty_id: invoice.counterparty_id.clone(),
                counterparty_name: invoice.counterparty_name.clone(),
                buckets: BucketAmounts::default(),
                total_due: Money::zero(),
                invoice_count: 0,
            });
            counterparties.len() - 1
        });

        let entry = &mut counterparties[idx];
        entry.buckets.add(bucket, amount_due);
        entry.total_due += amount_due;
        entry.invoice_count += 1;
    }

    // Stable: equal totals keep first-seen order
    counterparties.sort_by(|a, b| b.total_due.cmp(&a.total_due));

    let buckets = AgingBucket::ALL
        .iter()
        .map(|bucket| BucketTotal {
            bucket: *bucket,
            label: bucket.label().to_string(),
            amount: totals.get(*bucket),
        })
        .collect();

    AgingReport {
        as_of: reference,
        total_due: totals.total(),
        buckets,
        counterparties,
    }
}
