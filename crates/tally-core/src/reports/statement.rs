//! # Customer Statement and Balances
//!
//! A statement is the running ledger of one customer over a range: invoices
//! are debits, payments and credit notes are credits.
//!
//! ```text
//!   Opening Balance  ◄── customer.opening_balance (stored field)
//!   2024-01-03  Invoice   INV-123456   debit  500   balance  600
//!   2024-01-10  Payment   PAY-654321   credit 300   balance  300
//!   ...
//!   closing balance
//! ```
//!
//! The opening line is the customer's stored opening balance, not the balance
//! as of `range.from`; activity before the range is not carried in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ledger::{compute_running_ledger, LedgerEntry, LedgerEntryKind, LedgerTransaction};
use crate::money::Money;
use crate::reports::DateRange;
use crate::types::{Customer, PartyType};

// =============================================================================
// Customer Statement
// =============================================================================

/// One row of the unioned invoice / payment / credit note query.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StatementRow {
    pub date: NaiveDate,
    pub kind: LedgerEntryKind,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Money>,
}

impl StatementRow {
    fn into_transaction(self) -> LedgerTransaction {
        let amount = Money::from_nullable(self.amount);
        let (debit, credit) = match self.kind {
            LedgerEntryKind::Invoice => (amount, Money::zero()),
            LedgerEntryKind::Payment | LedgerEntryKind::CreditNote => (Money::zero(), amount),
            // Adjustments carry their sign
            LedgerEntryKind::OpeningBalance | LedgerEntryKind::Adjustment => {
                (amount.non_negative(), (-amount).non_negative())
            }
        };

        LedgerTransaction {
            date: Some(self.date),
            kind: self.kind,
            reference: self.reference.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            debit,
            credit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerStatement {
    pub customer_id: String,
    pub customer_name: String,
    pub range: DateRange,
    pub opening_balance: Money,
    /// Opening line first.
    pub entries: Vec<LedgerEntry>,
    pub total_debit: Money,
    pub total_credit: Money,
    pub closing_balance: Money,
}

/// Builds the statement from rows already ordered by date (ties in query
/// order).
pub fn build_customer_statement(
    customer: &Customer,
    range: DateRange,
    rows: Vec<StatementRow>,
) -> CustomerStatement {
    let transactions = rows
        .into_iter()
        .map(StatementRow::into_transaction)
        .collect();
    let ledger = compute_running_ledger(customer.opening_balance, transactions);

    CustomerStatement {
        customer_id: customer.id.clone(),
        customer_name: customer.name.clone(),
        range,
        opening_balance: customer.opening_balance,
        entries: ledger.entries,
        total_debit: ledger.total_debit,
        total_credit: ledger.total_credit,
        closing_balance: ledger.closing_balance,
    }
}

// =============================================================================
// Customer Balances
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerBalance {
    pub customer_id: String,
    pub name: String,
    pub party_type: PartyType,
    pub phone: Option<String>,
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerBalanceReport {
    /// Highest balance first; zero balances are left out.
    pub customers: Vec<CustomerBalance>,
    /// Σ positive balances (they owe us).
    pub total_receivable: Money,
    /// Σ |negative balances| (we owe them).
    pub total_payable: Money,
    pub net: Money,
}

pub fn build_customer_balances(customers: &[Customer]) -> CustomerBalanceReport {
    let mut rows: Vec<CustomerBalance> = customers
        .iter()
        .filter(|c| c.is_active && !c.current_balance.is_zero())
        .map(|c| CustomerBalance {
            customer_id: c.id.clone(),
            name: c.name.clone(),
            party_type: c.party_type,
            phone: c.phone.clone(),
            balance: c.current_balance,
        })
        .collect();
    rows.sort_by(|a, b| b.balance.cmp(&a.balance));

    let total_receivable: Money = rows
        .iter()
        .map(|c| c.balance)
        .filter(Money::is_positive)
        .sum();
    let total_payable: Money = rows
        .iter()
        .map(|c| c.balance)
        .filter(Money::is_negative)
        .map(|b| b.abs())
        .sum();

    CustomerBalanceReport {
        customers: rows,
        total_receivable,
        total_payable,
        net: total_receivable - total_payable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn customer(id: &str, opening: i64, current: i64) -> Customer {
        Customer {
            id: id.to_string(),
            name: format!("Customer {}", id),
            phone: None,
            email: None,
            address: None,
            party_type: PartyType::Customer,
            opening_balance: Money::from_cents(opening),
            current_balance: Money::from_cents(current),
            credit_days: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn row(day: u32, kind: LedgerEntryKind, amount: i64) -> StatementRow {
        StatementRow {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            kind,
            reference: Some(format!("REF-{}", day)),
            description: None,
            amount: Some(Money::from_cents(amount)),
        }
    }

    #[test]
    fn test_statement_running_balance() {
        let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
        let rows = vec![
            row(3, LedgerEntryKind::Invoice, 500),
            row(10, LedgerEntryKind::Payment, 300),
            row(12, LedgerEntryKind::CreditNote, 50),
        ];

        let statement = build_customer_statement(&customer("c1", 100, 0), range, rows);

        let balances: Vec<i64> = statement
            .entries
            .iter()
            .map(|e| e.balance.cents())
            .collect();
        assert_eq!(balances, vec![100, 600, 300, 250]);
        assert_eq!(statement.total_debit.cents(), 500);
        assert_eq!(statement.total_credit.cents(), 350);
        assert_eq!(statement.closing_balance.cents(), 250);
        assert_eq!(statement.entries[1].reference, "REF-3");
    }

    #[test]
    fn test_statement_without_activity() {
        let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
        let statement = build_customer_statement(&customer("c1", -75, 0), range, vec![]);

        assert_eq!(statement.entries.len(), 1);
        assert_eq!(statement.entries[0].credit.cents(), 75);
        assert_eq!(statement.closing_balance.cents(), -75);
    }

    #[test]
    fn test_customer_balances() {
        let mut inactive = customer("x", 0, 9_999);
        inactive.is_active = false;
        let customers = vec![
            customer("a", 0, 1_200),
            customer("b", 0, -300),
            customer("c", 0, 0),
            customer("d", 0, 4_000),
            inactive,
        ];

        let report = build_customer_balances(&customers);

        let ids: Vec<&str> = report
            .customers
            .iter()
            .map(|c| c.customer_id.as_str())
            .collect();
        assert_eq!(ids, vec!["d", "a", "b"]);
        assert_eq!(report.total_receivable.cents(), 5_200);
        assert_eq!(report.total_payable.cents(), 300);
        assert_eq!(report.net.cents(), 4_900);
    }
}
