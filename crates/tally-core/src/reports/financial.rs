//! # Financial Reports
//!
//! Profit & loss, cash flow, tax summary, day book and cash movement by
//! payment mode.
//!
//! ## Profit & Loss
//! ```text
//!   revenue       Σ sale invoice totals in range
//! - cogs          Σ purchase invoice totals in range   (period purchases,
//!   ─────────────                                       not inventory cost)
//!   gross profit
//! - expenses      Σ expenses, broken down by category
//!   ─────────────
//!   net profit
//! ```
//!
//! ## Cash Flow
//! ```text
//!   IN:  customer payments │ cash-in │ bank deposits
//!   OUT: vendor payments   │ expenses │ cash-out │ bank withdrawals
//!   net = Σ IN - Σ OUT          (only rows with amount > 0 count)
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::reports::DateRange;
use crate::types::Direction;

/// Label for expenses and payments recorded without a category or mode.
pub const UNCATEGORIZED: &str = "Uncategorized";

// =============================================================================
// Profit & Loss
// =============================================================================

/// Expense amounts grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CategoryAmountRow {
    pub category: Option<String>,
    pub amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseCategory {
    pub category: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfitLossReport {
    pub range: DateRange,
    pub revenue_total: Money,
    pub cogs_total: Money,
    pub gross_profit: Money,
    /// Category breakdown in query order.
    pub expenses: Vec<ExpenseCategory>,
    pub expenses_total: Money,
    pub net_profit: Money,
}

/// Folds the three P&L queries.
///
/// Categories are kept in the order the query returned them; a category that
/// shows up twice (e.g. `NULL` and empty string both unnamed) is merged.
pub fn build_profit_loss(
    range: DateRange,
    revenue: Option<Money>,
    cogs: Option<Money>,
    expense_rows: Vec<CategoryAmountRow>,
) -> ProfitLossReport {
    let revenue_total = Money::from_nullable(revenue);
    let cogs_total = Money::from_nullable(cogs);
    let gross_profit = revenue_total - cogs_total;

    let mut expenses: Vec<ExpenseCategory> = Vec::with_capacity(expense_rows.len());
    for row in expense_rows {
        let category = row
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let amount = Money::from_nullable(row.amount);
        match expenses.iter_mut().find(|e| e.category == category) {
            Some(existing) => existing.amount += amount,
            None => expenses.push(ExpenseCategory { category, amount }),
        }
    }
    let expenses_total: Money = expenses.iter().map(|e| e.amount).sum();

    ProfitLossReport {
        range,
        revenue_total,
        cogs_total,
        gross_profit,
        expenses,
        expenses_total,
        net_profit: gross_profit - expenses_total,
    }
}

// =============================================================================
// Cash Flow
// =============================================================================

/// Where a cash flow amount came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowSource {
    CustomerPayment,
    CashIn,
    BankDeposit,
    VendorPayment,
    Expense,
    CashOut,
    BankWithdrawal,
}

impl CashFlowSource {
    pub const INFLOWS: [CashFlowSource; 3] = [
        CashFlowSource::CustomerPayment,
        CashFlowSource::CashIn,
        CashFlowSource::BankDeposit,
    ];

    pub const OUTFLOWS: [CashFlowSource; 4] = [
        CashFlowSource::VendorPayment,
        CashFlowSource::Expense,
        CashFlowSource::CashOut,
        CashFlowSource::BankWithdrawal,
    ];

    pub const fn is_inflow(&self) -> bool {
        matches!(
            self,
            CashFlowSource::CustomerPayment | CashFlowSource::CashIn | CashFlowSource::BankDeposit
        )
    }

    pub const fn label(&self) -> &'static str {
        match self {
            CashFlowSource::CustomerPayment => "Customer Payments",
            CashFlowSource::CashIn => "Cash In",
            CashFlowSource::BankDeposit => "Bank Deposits",
            CashFlowSource::VendorPayment => "Vendor Payments",
            CashFlowSource::Expense => "Expenses",
            CashFlowSource::CashOut => "Cash Out",
            CashFlowSource::BankWithdrawal => "Bank Withdrawals",
        }
    }
}

/// One row of the unioned cash flow query.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashFlowRow {
    pub source: CashFlowSource,
    pub amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashFlowLine {
    pub source: CashFlowSource,
    pub label: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashFlowReport {
    pub range: DateRange,
    /// Every inflow source, zero when nothing came in through it.
    pub inflows: Vec<CashFlowLine>,
    pub outflows: Vec<CashFlowLine>,
    pub total_inflow: Money,
    pub total_outflow: Money,
    pub net_cash_flow: Money,
}

pub fn build_cash_flow(range: DateRange, rows: Vec<CashFlowRow>) -> CashFlowReport {
    let sum_for = |source: CashFlowSource| -> Money {
        rows.iter()
            .filter(|row| row.source == source)
            .map(|row| Money::from_nullable(row.amount))
            .filter(Money::is_positive)
            .sum()
    };
    let lines = |sources: &[CashFlowSource]| -> Vec<CashFlowLine> {
        sources
            .iter()
            .map(|source| CashFlowLine {
                source: *source,
                label: source.label().to_string(),
                amount: sum_for(*source),
            })
            .collect()
    };

    let inflows = lines(&CashFlowSource::INFLOWS);
    let outflows = lines(&CashFlowSource::OUTFLOWS);
    let total_inflow: Money = inflows.iter().map(|l| l.amount).sum();
    let total_outflow: Money = outflows.iter().map(|l| l.amount).sum();

    CashFlowReport {
        range,
        inflows,
        outflows,
        total_inflow,
        total_outflow,
        net_cash_flow: total_inflow - total_outflow,
    }
}

// =============================================================================
// Tax Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxSummary {
    pub range: DateRange,
    /// Tax on sale invoices.
    pub tax_collected: Money,
    /// Tax on purchase invoices.
    pub tax_paid: Money,
    pub net_tax: Money,
}

pub fn build_tax_summary(
    range: DateRange,
    tax_collected: Option<Money>,
    tax_paid: Option<Money>,
) -> TaxSummary {
    let tax_collected = Money::from_nullable(tax_collected);
    let tax_paid = Money::from_nullable(tax_paid);
    TaxSummary {
        range,
        tax_collected,
        tax_paid,
        net_tax: tax_collected - tax_paid,
    }
}

// =============================================================================
// Day Book
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DayBookKind {
    SaleInvoice,
    PurchaseInvoice,
    PaymentIn,
    PaymentOut,
    Expense,
}

impl DayBookKind {
    pub const fn is_inflow(&self) -> bool {
        matches!(self, DayBookKind::SaleInvoice | DayBookKind::PaymentIn)
    }

    pub const fn label(&self) -> &'static str {
        match self {
            DayBookKind::SaleInvoice => "Sale",
            DayBookKind::PurchaseInvoice => "Purchase",
            DayBookKind::PaymentIn => "Payment In",
            DayBookKind::PaymentOut => "Payment Out",
            DayBookKind::Expense => "Expense",
        }
    }
}

/// One row of the unioned day book query.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DayBookRow {
    pub kind: DayBookKind,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DayBookEntry {
    pub kind: DayBookKind,
    pub reference: String,
    pub description: String,
    pub amount_in: Money,
    pub amount_out: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DayBook {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub entries: Vec<DayBookEntry>,
    pub total_in: Money,
    pub total_out: Money,
    pub net: Money,
}

/// Splits each row into its in or out column and totals both. Entry order is
/// the query order.
pub fn build_day_book(date: NaiveDate, rows: Vec<DayBookRow>) -> DayBook {
    let mut total_in = Money::zero();
    let mut total_out = Money::zero();

    let entries = rows
        .into_iter()
        .map(|row| {
            let amount = Money::from_nullable(row.amount);
            let (amount_in, amount_out) = if row.kind.is_inflow() {
                (amount, Money::zero())
            } else {
                (Money::zero(), amount)
            };
            total_in += amount_in;
            total_out += amount_out;

            DayBookEntry {
                kind: row.kind,
                reference: row.reference.unwrap_or_default(),
                description: row
                    .description
                    .unwrap_or_else(|| row.kind.label().to_string()),
                amount_in,
                amount_out,
            }
        })
        .collect();

    DayBook {
        date,
        entries,
        total_in,
        total_out,
        net: total_in - total_out,
    }
}

// =============================================================================
// Cash Movement by Payment Mode
// =============================================================================

/// Payment totals grouped by mode and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ModeAmountRow {
    pub payment_mode: Option<String>,
    pub direction: Direction,
    pub amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ModeMovement {
    pub mode: String,
    pub in_amount: Money,
    pub out_amount: Money,
    pub net: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashMovementReport {
    pub range: DateRange,
    /// Union of the modes seen in either direction, first-seen order.
    pub modes: Vec<ModeMovement>,
    pub total_in: Money,
    pub total_out: Money,
    pub net: Money,
}

pub fn build_cash_movement(range: DateRange, rows: Vec<ModeAmountRow>) -> CashMovementReport {
    let mut modes: Vec<ModeMovement> = Vec::new();

    for row in rows {
        let mode = row
            .payment_mode
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_lowercase());
        let amount = Money::from_nullable(row.amount);

        let idx = match modes.iter().position(|m| m.mode == mode) {
            Some(idx) => idx,
            None => {
                modes.push(ModeMovement {
                    mode,
                    in_amount: Money::zero(),
                    out_amount: Money::zero(),
                    net: Money::zero(),
                });
                modes.len() - 1
            }
        };

        let entry = &mut modes[idx];
        match row.direction {
            Direction::In => entry.in_amount += amount,
            Direction::Out => entry.out_amount += amount,
        }
        entry.net = entry.in_amount - entry.out_amount;
    }

    let total_in: Money = modes.iter().map(|m| m.in_amount).sum();
    let total_out: Money = modes.iter().map(|m| m.out_amount).sum();

    CashMovementReport {
        range,
        modes,
        total_in,
        total_out,
        net: total_in - total_out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> DateRange {
        DateRange::parse("2024-01-01", "2024-12-31").unwrap()
    }

    fn cents(v: i64) -> Option<Money> {
        Some(Money::from_cents(v))
    }

    #[test]
    fn test_profit_loss_example() {
        let report = build_profit_loss(
            range(),
            cents(10_000),
            cents(4_000),
            vec![
                CategoryAmountRow {
                    category: Some("Rent".into()),
                    amount: cents(1_000),
                },
                CategoryAmountRow {
                    category: Some("Utilities".into()),
                    amount: cents(500),
                },
            ],
        );

        assert_eq!(report.gross_profit.cents(), 6_000);
        assert_eq!(report.expenses_total.cents(), 1_500);
        assert_eq!(report.net_profit.cents(), 4_500);
        assert_eq!(report.expenses[0].category, "Rent");
        assert_eq!(report.expenses[1].category, "Utilities");
    }

    #[test]
    fn test_profit_loss_with_no_data() {
        let report = build_profit_loss(range(), None, None, vec![]);
        assert_eq!(report.net_profit, Money::zero());
        assert!(report.expenses.is_empty());
    }

    #[test]
    fn test_unnamed_expense_categories_merge() {
        let report = build_profit_loss(
            range(),
            None,
            None,
            vec![
                CategoryAmountRow {
                    category: None,
                    amount: cents(300),
                },
                CategoryAmountRow {
                    category: Some("  ".into()),
                    amount: cents(200),
                },
            ],
        );
        assert_eq!(report.expenses.len(), 1);
        assert_eq!(report.expenses[0].category, UNCATEGORIZED);
        assert_eq!(report.net_profit.cents(), -500);
    }

    #[test]
    fn test_cash_flow_totals() {
        let rows = vec![
            CashFlowRow {
                source: CashFlowSource::CustomerPayment,
                amount: cents(5_000),
            },
            CashFlowRow {
                source: CashFlowSource::CashIn,
                amount: cents(700),
            },
            CashFlowRow {
                source: CashFlowSource::CustomerPayment,
                amount: cents(1_000),
            },
            CashFlowRow {
                source: CashFlowSource::Expense,
                amount: cents(1_200),
            },
            CashFlowRow {
                source: CashFlowSource::BankWithdrawal,
                amount: cents(0),
            },
            CashFlowRow {
                source: CashFlowSource::VendorPayment,
                amount: None,
            },
        ];

        let report = build_cash_flow(range(), rows);

        assert_eq!(report.inflows.len(), 3);
        assert_eq!(report.outflows.len(), 4);
        assert_eq!(report.inflows[0].amount.cents(), 6_000);
        assert_eq!(report.total_inflow.cents(), 6_700);
        assert_eq!(report.total_outflow.cents(), 1_200);
        assert_eq!(report.net_cash_flow.cents(), 5_500);
    }

    #[test]
    fn test_cash_flow_ignores_non_positive_rows() {
        let report = build_cash_flow(
            range(),
            vec![CashFlowRow {
                source: CashFlowSource::CashOut,
                amount: cents(-400),
            }],
        );
        assert_eq!(report.total_outflow, Money::zero());
    }

    #[test]
    fn test_tax_summary() {
        let summary = build_tax_summary(range(), cents(825), None);
        assert_eq!(summary.tax_paid, Money::zero());
        assert_eq!(summary.net_tax.cents(), 825);
    }

    #[test]
    fn test_day_book_splits_columns() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let rows = vec![
            DayBookRow {
                kind: DayBookKind::SaleInvoice,
                reference: Some("INV-000001".into()),
                description: Some("Walk-in Customer".into()),
                amount: cents(2_000),
            },
            DayBookRow {
                kind: DayBookKind::PaymentIn,
                reference: Some("PAY-000001".into()),
                description: None,
                amount: cents(1_500),
            },
            DayBookRow {
                kind: DayBookKind::PurchaseInvoice,
                reference: None,
                description: None,
                amount: cents(900),
            },
            DayBookRow {
                kind: DayBookKind::Expense,
                reference: None,
                description: Some("Tea".into()),
                amount: cents(100),
            },
        ];

        let book = build_day_book(date, rows);

        assert_eq!(book.total_in.cents(), 3_500);
        assert_eq!(book.total_out.cents(), 1_000);
        assert_eq!(book.net.cents(), 2_500);
        assert_eq!(book.entries[1].description, "Payment In");
        assert_eq!(book.entries[2].amount_out.cents(), 900);
        assert_eq!(book.entries[2].amount_in, Money::zero());
    }

    #[test]
    fn test_cash_movement_union_of_modes() {
        let rows = vec![
            ModeAmountRow {
                payment_mode: Some("cash".into()),
                direction: Direction::In,
                amount: cents(1_000),
            },
            ModeAmountRow {
                payment_mode: Some("bank".into()),
                direction: Direction::Out,
                amount: cents(400),
            },
            ModeAmountRow {
                payment_mode: Some("Cash".into()),
                direction: Direction::Out,
                amount: cents(250),
            },
            ModeAmountRow {
                payment_mode: None,
                direction: Direction::In,
                amount: cents(50),
            },
        ];

        let report = build_cash_movement(range(), rows);

        let modes: Vec<(&str, i64, i64, i64)> = report
            .modes
            .iter()
            .map(|m| {
                (
                    m.mode.as_str(),
                    m.in_amount.cents(),
                    m.out_amount.cents(),
                    m.net.cents(),
                )
            })
            .collect();
        assert_eq!(
            modes,
            vec![
                ("cash", 1_000, 250, 750),
                ("bank", 0, 400, -400),
                ("uncategorized", 50, 0, 50),
            ]
        );
        assert_eq!(report.net.cents(), 400);
    }
}
