//! # Report Repository
//!
//! Runs the queries behind every report and hands the rows to the pure folds
//! in `tally_core::reports` / `tally_core::ledger`.
//!
//! ## Query Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales_summary(range, top_n)                                           │
//! │       │                                                                 │
//! │       ├──► totals      SUM/COUNT over invoices ─┐                      │
//! │       ├──► by customer GROUP BY counterparty   ─┤  tokio::try_join!    │
//! │       ├──► by item     GROUP BY item           ─┤  (independent, no    │
//! │       └──► by month    GROUP BY substr(date,1,7)┘   shared snapshot)   │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                    summarize_invoices(...)  (tally-core)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - Ranges bind as `YYYY-MM-DD` text, both ends inclusive (`BETWEEN`)
//! - Invoices with `status = 'cancelled'` never count
//! - Sums come back as `Option<Money>`; the folds read `NULL` as zero
//! - Queries of one report are not run in a shared transaction, so a sale
//!   committed between them can show up in one part and not another

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::ledger::{aggregate_aging, AgingReport, OutstandingInvoice};
use tally_core::reports::financial::{
    build_cash_flow, build_cash_movement, build_day_book, build_profit_loss, build_tax_summary,
    CashFlowRow, CategoryAmountRow, DayBookRow, ModeAmountRow,
};
use tally_core::reports::inventory::{
    build_item_profitability, build_low_stock, build_stock_movement, build_stock_summary,
    ItemSalesRow, StockMovementRow,
};
use tally_core::reports::statement::{build_customer_balances, build_customer_statement};
use tally_core::reports::summary::{
    fold_counterparties, fold_items, summarize_invoices, CounterpartyAmountRow, InvoiceTotalsRow,
    ItemAmountRow, MonthAmountRow,
};
use tally_core::reports::{
    CashFlowReport, CashMovementReport, CounterpartyTotal, CustomerBalanceReport,
    CustomerStatement, DayBook, InvoiceSummary, ItemProfitability, ItemTotal, LowStockItem,
    ProfitLossReport, StatementRow, StockMovementReport, StockSummary, TaxSummary,
};
use tally_core::{Customer, DateRange, InvoiceKind, Item, Money};

/// `LIMIT -1` is "no limit" in SQLite.
const NO_LIMIT: i64 = -1;

/// Which invoice column a period sum adds up.
#[derive(Debug, Clone, Copy)]
enum InvoiceMeasure {
    Total,
    Tax,
}

impl InvoiceMeasure {
    const fn sql(self) -> &'static str {
        match self {
            InvoiceMeasure::Total => {
                "SELECT SUM(total) FROM invoices \
                 WHERE invoice_type = ?1 AND status != 'cancelled' AND date BETWEEN ?2 AND ?3"
            }
            InvoiceMeasure::Tax => {
                "SELECT SUM(tax_amount) FROM invoices \
                 WHERE invoice_type = ?1 AND status != 'cancelled' AND date BETWEEN ?2 AND ?3"
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    // =========================================================================
    // Sales / Purchase Summaries
    // =========================================================================

    pub async fn sales_summary(&self, range: DateRange, top_n: usize) -> DbResult<InvoiceSummary> {
        self.invoice_summary(InvoiceKind::Sale, range, top_n).await
    }

    pub async fn purchase_summary(
        &self,
        range: DateRange,
        top_n: usize,
    ) -> DbResult<InvoiceSummary> {
        self.invoice_summary(InvoiceKind::Purchase, range, top_n).await
    }

    async fn invoice_summary(
        &self,
        kind: InvoiceKind,
        range: DateRange,
        top_n: usize,
    ) -> DbResult<InvoiceSummary> {
        let (from, to) = range.bounds();
        debug!(kind = kind.as_str(), from = %from, to = %to, top_n, "Building invoice summary");

        let limit = i64::try_from(top_n).unwrap_or(NO_LIMIT);
        let (totals, counterparties, items, months) = tokio::try_join!(
            self.invoice_totals(kind, &from, &to),
            self.counterparty_amounts(kind, &from, &to, limit),
            self.item_amounts(kind, &from, &to, limit),
            self.month_amounts(kind, &from, &to),
        )?;

        Ok(summarize_invoices(
            kind,
            range,
            totals,
            counterparties,
            items,
            months,
            top_n,
        ))
    }

    /// Every customer with sales in the range, highest total first.
    pub async fn sales_by_customer(&self, range: DateRange) -> DbResult<Vec<CounterpartyTotal>> {
        let (from, to) = range.bounds();
        debug!(from = %from, to = %to, "Sales by customer");

        let rows = self
            .counterparty_amounts(InvoiceKind::Sale, &from, &to, NO_LIMIT)
            .await?;
        Ok(fold_counterparties(rows, None))
    }

    pub async fn purchases_by_supplier(
        &self,
        range: DateRange,
    ) -> DbResult<Vec<CounterpartyTotal>> {
        let (from, to) = range.bounds();
        debug!(from = %from, to = %to, "Purchases by supplier");

        let rows = self
            .counterparty_amounts(InvoiceKind::Purchase, &from, &to, NO_LIMIT)
            .await?;
        Ok(fold_counterparties(rows, None))
    }

    pub async fn sales_by_item(&self, range: DateRange) -> DbResult<Vec<ItemTotal>> {
        let (from, to) = range.bounds();
        debug!(from = %from, to = %to, "Sales by item");

        let rows = self
            .item_amounts(InvoiceKind::Sale, &from, &to, NO_LIMIT)
            .await?;
        Ok(fold_items(rows, None))
    }

    pub async fn purchases_by_item(&self, range: DateRange) -> DbResult<Vec<ItemTotal>> {
        let (from, to) = range.bounds();
        debug!(from = %from, to = %to, "Purchases by item");

        let rows = self
            .item_amounts(InvoiceKind::Purchase, &from, &to, NO_LIMIT)
            .await?;
        Ok(fold_items(rows, None))
    }

    async fn invoice_totals(
        &self,
        kind: InvoiceKind,
        from: &str,
        to: &str,
    ) -> DbResult<Option<InvoiceTotalsRow>> {
        let row = sqlx::query_as::<_, InvoiceTotalsRow>(
            r#"
            SELECT
                SUM(total)       AS total_amount,
                COUNT(*)         AS total_invoices,
                SUM(amount_paid) AS total_paid,
                SUM(amount_due)  AS total_due
            FROM invoices
            WHERE invoice_type = ?1
              AND status != 'cancelled'
              AND date BETWEEN ?2 AND ?3
            "#,
        )
        .bind(kind.as_str())
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Walk-in invoices (no customer id) group by the name on the invoice.
    async fn counterparty_amounts(
        &self,
        kind: InvoiceKind,
        from: &str,
        to: &str,
        limit: i64,
    ) -> DbResult<Vec<CounterpartyAmountRow>> {
        let rows = sqlx::query_as::<_, CounterpartyAmountRow>(
            r#"
            SELECT
                customer_id        AS counterparty_id,
                MAX(customer_name) AS counterparty_name,
                COUNT(*)           AS invoice_count,
                SUM(total)         AS amount
            FROM invoices
            WHERE invoice_type = ?1
              AND status != 'cancelled'
              AND date BETWEEN ?2 AND ?3
            GROUP BY COALESCE(customer_id, 'name:' || customer_name)
            ORDER BY amount DESC
            LIMIT ?4
            "#,
        )
        .bind(kind.as_str())
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn item_amounts(
        &self,
        kind: InvoiceKind,
        from: &str,
        to: &str,
        limit: i64,
    ) -> DbResult<Vec<ItemAmountRow>> {
        let rows = sqlx::query_as::<_, ItemAmountRow>(
            r#"
            SELECT
                ii.item_id        AS item_id,
                MAX(ii.item_name) AS item_name,
                SUM(ii.quantity)  AS quantity,
                SUM(ii.amount)    AS amount
            FROM invoice_items ii
            JOIN invoices i ON i.id = ii.invoice_id
            WHERE i.invoice_type = ?1
              AND i.status != 'cancelled'
              AND i.date BETWEEN ?2 AND ?3
            GROUP BY COALESCE(ii.item_id, 'name:' || ii.item_name)
            ORDER BY amount DESC
            LIMIT ?4
            "#,
        )
        .bind(kind.as_str())
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn month_amounts(
        &self,
        kind: InvoiceKind,
        from: &str,
        to: &str,
    ) -> DbResult<Vec<MonthAmountRow>> {
        let rows = sqlx::query_as::<_, MonthAmountRow>(
            r#"
            SELECT
                substr(date, 1, 7) AS month,
                COUNT(*)           AS invoice_count,
                SUM(total)         AS amount
            FROM invoices
            WHERE invoice_type = ?1
              AND status != 'cancelled'
              AND date BETWEEN ?2 AND ?3
            GROUP BY substr(date, 1, 7)
            ORDER BY month
            "#,
        )
        .bind(kind.as_str())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // Financial
    // =========================================================================

    pub async fn profit_loss(&self, range: DateRange) -> DbResult<ProfitLossReport> {
        let (from, to) = range.bounds();
        debug!(from = %from, to = %to, "Building profit and loss");

        let expenses = async {
            sqlx::query_as::<_, CategoryAmountRow>(
                r#"
                SELECT category, SUM(amount) AS amount
                FROM expenses
                WHERE date BETWEEN ?1 AND ?2
                GROUP BY category
                ORDER BY amount DESC
                "#,
            )
            .bind(&from)
            .bind(&to)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)
        };

        let (revenue, cogs, expense_rows) = tokio::try_join!(
            self.invoice_sum(InvoiceKind::Sale, InvoiceMeasure::Total, &from, &to),
            self.invoice_sum(InvoiceKind::Purchase, InvoiceMeasure::Total, &from, &to),
            expenses,
        )?;

        Ok(build_profit_loss(range, revenue, cogs, expense_rows))
    }

    pub async fn tax_summary(&self, range: DateRange) -> DbResult<TaxSummary> {
        let (from, to) = range.bounds();
        debug!(from = %from, to = %to, "Building tax summary");

        let (collected, paid) = tokio::try_join!(
            self.invoice_sum(InvoiceKind::Sale, InvoiceMeasure::Tax, &from, &to),
            self.invoice_sum(InvoiceKind::Purchase, InvoiceMeasure::Tax, &from, &to),
        )?;

        Ok(build_tax_summary(range, collected, paid))
    }

    async fn invoice_sum(
        &self,
        kind: InvoiceKind,
        measure: InvoiceMeasure,
        from: &str,
        to: &str,
    ) -> DbResult<Option<Money>> {
        let sum: Option<Money> = sqlx::query_scalar(measure.sql())
            .bind(kind.as_str())
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await?;

        Ok(sum)
    }

    pub async fn cash_flow(&self, range: DateRange) -> DbResult<CashFlowReport> {
        let (from, to) = range.bounds();
        debug!(from = %from, to = %to, "Building cash flow");

        let rows = sqlx::query_as::<_, CashFlowRow>(
            r#"
            SELECT 'customer_payment' AS source, SUM(amount) AS amount
              FROM payments
             WHERE direction = 'in' AND amount > 0 AND date BETWEEN ?1 AND ?2
            UNION ALL
            SELECT 'cash_in', SUM(amount)
              FROM cash_transactions
             WHERE direction = 'in' AND amount > 0 AND date BETWEEN ?1 AND ?2
            UNION ALL
            SELECT 'bank_deposit', SUM(amount)
              FROM bank_transactions
             WHERE txn_type = 'deposit' AND amount > 0 AND date BETWEEN ?1 AND ?2
            UNION ALL
            SELECT 'vendor_payment', SUM(amount)
              FROM payments
             WHERE direction = 'out' AND amount > 0 AND date BETWEEN ?1 AND ?2
            UNION ALL
            SELECT 'expense', SUM(amount)
              FROM expenses
             WHERE amount > 0 AND date BETWEEN ?1 AND ?2
            UNION ALL
            SELECT 'cash_out', SUM(amount)
              FROM cash_transactions
             WHERE direction = 'out' AND amount > 0 AND date BETWEEN ?1 AND ?2
            UNION ALL
            SELECT 'bank_withdrawal', SUM(amount)
              FROM bank_transactions
             WHERE txn_type = 'withdrawal' AND amount > 0 AND date BETWEEN ?1 AND ?2
            "#,
        )
        .bind(&from)
        .bind(&to)
        .fetch_all(&self.pool)
        .await?;

        Ok(build_cash_flow(range, rows))
    }

    /// Everything that happened on one day, in the order it was recorded.
    pub async fn day_book(&self, date: NaiveDate) -> DbResult<DayBook> {
        let day = date.to_string();
        debug!(date = %day, "Building day book");

        let rows = sqlx::query_as::<_, DayBookRow>(
            r#"
            SELECT 'sale_invoice' AS kind, invoice_number AS reference,
                   customer_name AS description, total AS amount, created_at
              FROM invoices
             WHERE invoice_type = 'sale' AND status != 'cancelled' AND date = ?1
            UNION ALL
            SELECT 'purchase_invoice', invoice_number, customer_name, total, created_at
              FROM invoices
             WHERE invoice_type = 'purchase' AND status != 'cancelled' AND date = ?1
            UNION ALL
            SELECT 'payment_in', payment_number,
                   COALESCE(customer_name, payment_mode), amount, created_at
              FROM payments
             WHERE direction = 'in' AND date = ?1
            UNION ALL
            SELECT 'payment_out', payment_number,
                   COALESCE(customer_name, payment_mode), amount, created_at
              FROM payments
             WHERE direction = 'out' AND date = ?1
            UNION ALL
            SELECT 'expense', category, description, amount, created_at
              FROM expenses
             WHERE date = ?1
            ORDER BY created_at
            "#,
        )
        .bind(&day)
        .fetch_all(&self.pool)
        .await?;

        Ok(build_day_book(date, rows))
    }

    /// Payments in and out, per payment mode.
    pub async fn cash_movement(&self, range: DateRange) -> DbResult<CashMovementReport> {
        let (from, to) = range.bounds();
        debug!(from = %from, to = %to, "Building cash movement by mode");

        let rows = sqlx::query_as::<_, ModeAmountRow>(
            r#"
            SELECT
                LOWER(payment_mode) AS payment_mode,
                direction,
                SUM(amount)         AS amount
            FROM payments
            WHERE date BETWEEN ?1 AND ?2
            GROUP BY LOWER(payment_mode), direction
            ORDER BY payment_mode, direction
            "#,
        )
        .bind(&from)
        .bind(&to)
        .fetch_all(&self.pool)
        .await?;

        Ok(build_cash_movement(range, rows))
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    /// Every active item. Services are valued at their (usually zero) stock;
    /// the low stock fold skips them.
    async fn active_items(&self) -> DbResult<Vec<Item>> {
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

        Ok(items)
    }

    pub async fn stock_summary(&self) -> DbResult<StockSummary> {
        debug!("Building stock summary");
        let items = self.active_items().await?;
        Ok(build_stock_summary(&items))
    }

    pub async fn low_stock(&self) -> DbResult<Vec<LowStockItem>> {
        debug!("Building low stock list");
        let items = self.active_items().await?;
        Ok(build_low_stock(&items))
    }

    /// Revenue against current purchase cost, per item sold in the range.
    pub async fn item_profitability(&self, range: DateRange) -> DbResult<Vec<ItemProfitability>> {
        let (from, to) = range.bounds();
        debug!(from = %from, to = %to, "Building item profitability");

        let rows = sqlx::query_as::<_, ItemSalesRow>(
            r#"
            SELECT
                ii.item_id        AS item_id,
                MAX(ii.item_name) AS item_name,
                SUM(ii.quantity)  AS quantity_sold,
                SUM(ii.amount)    AS revenue,
                MAX(it.purchase_price) AS purchase_price
            FROM invoice_items ii
            JOIN invoices i ON i.id = ii.invoice_id
            LEFT JOIN items it ON it.id = ii.item_id
            WHERE i.invoice_type = 'sale'
              AND i.status != 'cancelled'
              AND i.date BETWEEN ?1 AND ?2
              AND ii.item_id IS NOT NULL
            GROUP BY ii.item_id
            "#,
        )
        .bind(&from)
        .bind(&to)
        .fetch_all(&self.pool)
        .await?;

        Ok(build_item_profitability(rows))
    }

    /// Units purchased (in) and sold (out) per product in the range.
    pub async fn stock_movement(&self, range: DateRange) -> DbResult<StockMovementReport> {
        let (from, to) = range.bounds();
        debug!(from = %from, to = %to, "Building stock movement");

        let rows = sqlx::query_as::<_, StockMovementRow>(
            r#"
            SELECT
                it.id   AS item_id,
                it.name AS item_name,
                SUM(CASE WHEN i.invoice_type = 'purchase' THEN ii.quantity ELSE 0 END)
                        AS quantity_in,
                SUM(CASE WHEN i.invoice_type = 'sale' THEN ii.quantity ELSE 0 END)
                        AS quantity_out,
                it.stock_quantity AS current_stock
            FROM items it
            LEFT JOIN invoice_items ii ON ii.item_id = it.id
            LEFT JOIN invoices i
                   ON i.id = ii.invoice_id
                  AND i.status != 'cancelled'
                  AND i.date BETWEEN ?1 AND ?2
            WHERE it.item_type = 'product'
            GROUP BY it.id
            "#,
        )
        .bind(&from)
        .bind(&to)
        .fetch_all(&self.pool)
        .await?;

        Ok(build_stock_movement(range, rows))
    }

    // =========================================================================
    // Receivables / Payables
    // =========================================================================

    /// Open sale invoices bucketed by how overdue they are on `as_of`.
    pub async fn receivables_aging(&self, as_of: NaiveDate) -> DbResult<AgingReport> {
        self.aging(InvoiceKind::Sale, as_of).await
    }

    /// Open purchase invoices bucketed by how overdue they are on `as_of`.
    pub async fn payables_aging(&self, as_of: NaiveDate) -> DbResult<AgingReport> {
        self.aging(InvoiceKind::Purchase, as_of).await
    }

    async fn aging(&self, kind: InvoiceKind, as_of: NaiveDate) -> DbResult<AgingReport> {
        debug!(kind = kind.as_str(), as_of = %as_of, "Building aging report");

        let invoices = sqlx::query_as::<_, OutstandingInvoice>(
            r#"
            SELECT
                id, invoice_number,
                customer_id   AS counterparty_id,
                customer_name AS counterparty_name,
                date, due_date, status, amount_due
            FROM invoices
            WHERE invoice_type = ?1
              AND status != 'cancelled'
              AND amount_due > 0
            ORDER BY date, created_at
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(aggregate_aging(&invoices, as_of))
    }

    /// Running ledger of one customer's sale invoices, payments received and
    /// credit notes in the range.
    ///
    /// Opens at the customer's stored opening balance; activity before
    /// `range.from` is not carried in.
    pub async fn customer_statement(
        &self,
        customer_id: &str,
        range: DateRange,
    ) -> DbResult<CustomerStatement> {
        let (from, to) = range.bounds();
        debug!(customer_id = %customer_id, from = %from, to = %to, "Building customer statement");

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT
                id, name, phone, email, address, party_type,
                opening_balance, current_balance, credit_days,
                is_active, created_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", customer_id))?;

        let rows = sqlx::query_as::<_, StatementRow>(
            r#"
            SELECT date, 'invoice' AS kind, invoice_number AS reference,
                   'Sale invoice' AS description, total AS amount, created_at
              FROM invoices
             WHERE customer_id = ?1 AND invoice_type = 'sale'
               AND status != 'cancelled' AND date BETWEEN ?2 AND ?3
            UNION ALL
            SELECT date, 'payment', payment_number,
                   'Payment received (' || payment_mode || ')', amount, created_at
              FROM payments
             WHERE customer_id = ?1 AND direction = 'in' AND date BETWEEN ?2 AND ?3
            UNION ALL
            SELECT date, 'credit_note', credit_note_number,
                   COALESCE(reason, 'Credit note'), amount, created_at
              FROM credit_notes
             WHERE customer_id = ?1 AND date BETWEEN ?2 AND ?3
            ORDER BY date, created_at
            "#,
        )
        .bind(customer_id)
        .bind(&from)
        .bind(&to)
        .fetch_all(&self.pool)
        .await?;

        Ok(build_customer_statement(&customer, range, rows))
    }

    /// Who owes us and whom we owe, from the stored running balances.
    pub async fn customer_balances(&self) -> DbResult<CustomerBalanceReport> {
        debug!("Building customer balances");

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT
                id, name, phone, email, address, party_type,
                opening_balance, current_balance, credit_days,
                is_active, created_at
            FROM customers
            WHERE is_active = 1 AND current_balance != 0
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(build_customer_balances(&customers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::{fixtures, generate_id};
    use chrono::Utc;
    use tally_core::ledger::AgingBucket;
    use tally_core::reports::{CashFlowSource, DayBookKind};
    use tally_core::{
        BankTransaction, BankTxnKind, CashTransaction, CreditNote, Direction, Expense, PartyType,
        Payment,
    };

    fn range(from: &str, to: &str) -> DateRange {
        DateRange::parse(from, to).unwrap()
    }

    fn payment(
        direction: Direction,
        customer: Option<&Customer>,
        on: &str,
        amount: i64,
        mode: &str,
    ) -> Payment {
        Payment {
            id: generate_id(),
            payment_number: format!("PAY-{}", &generate_id()[..6]),
            direction,
            customer_id: customer.map(|c| c.id.clone()),
            customer_name: customer.map(|c| c.name.clone()),
            invoice_id: None,
            date: fixtures::date(on),
            amount: Money::from_cents(amount),
            payment_mode: mode.to_string(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn expense(on: &str, category: Option<&str>, amount: i64) -> Expense {
        Expense {
            id: generate_id(),
            date: fixtures::date(on),
            category: category.map(str::to_string),
            amount: Money::from_cents(amount),
            payment_mode: Some("cash".to_string()),
            description: Some("Monthly".to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_empty_database_gives_zeroed_reports() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let reports = db.reports();
        let march = range("2024-03-01", "2024-03-31");

        let summary = reports.sales_summary(march, 5).await.unwrap();
        assert_eq!(summary.total_amount, Money::zero());
        assert_eq!(summary.total_invoices, 0);
        assert_eq!(summary.average_order_value, Money::zero());
        assert!(summary.top_counterparties.is_empty());
        assert_eq!(summary.monthly.len(), 1);

        let pnl = reports.profit_loss(march).await.unwrap();
        assert_eq!(pnl.net_profit, Money::zero());
        assert!(pnl.expenses.is_empty());

        let flow = reports.cash_flow(march).await.unwrap();
        assert_eq!(flow.net_cash_flow, Money::zero());
        assert_eq!(flow.inflows.len(), 3);
        assert_eq!(flow.outflows.len(), 4);

        assert_eq!(reports.stock_summary().await.unwrap().item_count, 0);
        assert!(reports.low_stock().await.unwrap().is_empty());
        assert_eq!(
            reports
                .receivables_aging(fixtures::date("2024-03-31"))
                .await
                .unwrap()
                .total_due,
            Money::zero()
        );
        assert!(reports
            .day_book(fixtures::date("2024-03-05"))
            .await
            .unwrap()
            .entries
            .is_empty());
        assert!(reports.customer_balances().await.unwrap().customers.is_empty());
    }

    #[tokio::test]
    async fn test_sales_summary_skips_cancelled_and_out_of_range() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ali = fixtures::customer("Ali", PartyType::Customer);
        let zara = fixtures::customer("Zara", PartyType::Customer);
        db.customers().insert(&ali).await.unwrap();
        db.customers().insert(&zara).await.unwrap();
        let rice = fixtures::item("Rice", 50, 400, 500);
        db.items().insert(&rice).await.unwrap();

        let a1 = fixtures::invoice(InvoiceKind::Sale, Some(&ali), "2024-01-10", 1_000, 1_000);
        let a2 = fixtures::invoice(InvoiceKind::Sale, Some(&ali), "2024-02-02", 2_000, 500);
        let z1 = fixtures::invoice(InvoiceKind::Sale, Some(&zara), "2024-02-20", 1_500, 0);
        let walk_in = fixtures::invoice(InvoiceKind::Sale, None, "2024-02-21", 500, 500);
        let cancelled = fixtures::invoice(InvoiceKind::Sale, Some(&zara), "2024-02-22", 9_000, 0);
        let outside = fixtures::invoice(InvoiceKind::Sale, Some(&zara), "2024-03-01", 7_000, 0);
        for invoice in [&a1, &a2, &z1, &walk_in, &cancelled, &outside] {
            let line = fixtures::line(invoice, &rice, invoice.total.cents() / 500);
            db.invoices().insert(invoice, &[line]).await.unwrap();
        }
        db.invoices().cancel(&cancelled.id).await.unwrap();

        let summary = db
            .reports()
            .sales_summary(range("2024-01-01", "2024-02-29"), 2)
            .await
            .unwrap();

        assert_eq!(summary.total_invoices, 4);
        assert_eq!(summary.total_amount.cents(), 5_000);
        assert_eq!(summary.total_paid.cents(), 2_000);
        assert_eq!(summary.total_due.cents(), 3_000);
        assert_eq!(summary.average_order_value.cents(), 1_250);

        let top: Vec<(&str, i64)> = summary
            .top_counterparties
            .iter()
            .map(|c| (c.counterparty_name.as_str(), c.amount.cents()))
            .collect();
        assert_eq!(top, vec![("Ali", 3_000), ("Zara", 1_500)]);

        assert_eq!(summary.top_items.len(), 1);
        assert_eq!(summary.top_items[0].quantity, 10);
        assert_eq!(summary.top_items[0].amount.cents(), 5_000);

        let monthly: Vec<(&str, i64)> = summary
            .monthly
            .iter()
            .map(|m| (m.month.as_str(), m.amount.cents()))
            .collect();
        assert_eq!(monthly, vec![("2024-01", 1_000), ("2024-02", 4_000)]);

        let by_customer = db
            .reports()
            .sales_by_customer(range("2024-01-01", "2024-02-29"))
            .await
            .unwrap();
        assert_eq!(by_customer.len(), 3);
        assert_eq!(by_customer[2].counterparty_id, None);
        assert_eq!(by_customer[2].counterparty_name, tally_core::WALK_IN_CUSTOMER);
    }

    #[tokio::test]
    async fn test_profit_loss_and_tax() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut sale = fixtures::invoice(InvoiceKind::Sale, None, "2024-05-03", 10_000, 10_000);
        sale.tax_amount = Money::from_cents(800);
        let mut purchase =
            fixtures::invoice(InvoiceKind::Purchase, None, "2024-05-04", 4_000, 4_000);
        purchase.tax_amount = Money::from_cents(300);
        db.invoices().insert(&sale, &[]).await.unwrap();
        db.invoices().insert(&purchase, &[]).await.unwrap();
        db.expenses()
            .insert(&expense("2024-05-01", Some("Rent"), 1_000))
            .await
            .unwrap();
        db.expenses()
            .insert(&expense("2024-05-20", Some("Utilities"), 500))
            .await
            .unwrap();
        db.expenses()
            .insert(&expense("2024-06-01", Some("Rent"), 1_000))
            .await
            .unwrap();

        let may = range("2024-05-01", "2024-05-31");
        let pnl = db.reports().profit_loss(may).await.unwrap();
        assert_eq!(pnl.revenue_total.cents(), 10_000);
        assert_eq!(pnl.cogs_total.cents(), 4_000);
        assert_eq!(pnl.gross_profit.cents(), 6_000);
        assert_eq!(pnl.expenses_total.cents(), 1_500);
        assert_eq!(pnl.net_profit.cents(), 4_500);
        assert_eq!(pnl.expenses[0].category, "Rent");

        let tax = db.reports().tax_summary(may).await.unwrap();
        assert_eq!(tax.tax_collected.cents(), 800);
        assert_eq!(tax.tax_paid.cents(), 300);
        assert_eq!(tax.net_tax.cents(), 500);
    }

    #[tokio::test]
    async fn test_cash_flow_sources() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        db.payments()
            .insert(&payment(Direction::In, None, "2024-07-02", 2_000, "cash"))
            .await
            .unwrap();
        db.payments()
            .insert(&payment(Direction::Out, None, "2024-07-03", 700, "bank"))
            .await
            .unwrap();
        db.expenses()
            .insert(&expense("2024-07-04", None, 300))
            .await
            .unwrap();
        db.cash()
            .insert_cash(&CashTransaction {
                id: generate_id(),
                date: fixtures::date("2024-07-05"),
                direction: Direction::In,
                amount: Money::from_cents(100),
                description: None,
                created_at: now,
            })
            .await
            .unwrap();
        db.cash()
            .insert_bank(&BankTransaction {
                id: generate_id(),
                account_name: "Main".to_string(),
                date: fixtures::date("2024-07-06"),
                txn_type: BankTxnKind::Withdrawal,
                amount: Money::from_cents(250),
                description: None,
                created_at: now,
            })
            .await
            .unwrap();

        let flow = db
            .reports()
            .cash_flow(range("2024-07-01", "2024-07-31"))
            .await
            .unwrap();

        assert_eq!(flow.total_inflow.cents(), 2_100);
        assert_eq!(flow.total_outflow.cents(), 1_250);
        assert_eq!(flow.net_cash_flow.cents(), 850);
        let vendor = flow
            .outflows
            .iter()
            .find(|line| line.source == CashFlowSource::VendorPayment)
            .unwrap();
        assert_eq!(vendor.amount.cents(), 700);
    }

    #[tokio::test]
    async fn test_day_book_and_cash_movement() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sale = fixtures::invoice(InvoiceKind::Sale, None, "2024-08-09", 1_200, 1_200);
        let purchase = fixtures::invoice(InvoiceKind::Purchase, None, "2024-08-09", 800, 800);
        db.invoices().insert(&sale, &[]).await.unwrap();
        db.invoices().insert(&purchase, &[]).await.unwrap();
        db.payments()
            .insert(&payment(Direction::In, None, "2024-08-09", 1_200, "Cash"))
            .await
            .unwrap();
        db.payments()
            .insert(&payment(Direction::In, None, "2024-08-09", 300, "card"))
            .await
            .unwrap();
        db.payments()
            .insert(&payment(Direction::Out, None, "2024-08-09", 800, "cash"))
            .await
            .unwrap();
        db.expenses()
            .insert(&expense("2024-08-10", Some("Fuel"), 90))
            .await
            .unwrap();

        let book = db
            .reports()
            .day_book(fixtures::date("2024-08-09"))
            .await
            .unwrap();
        assert_eq!(book.entries.len(), 5);
        assert_eq!(book.entries[0].kind, DayBookKind::SaleInvoice);
        assert_eq!(book.total_in.cents(), 2_700);
        assert_eq!(book.total_out.cents(), 1_600);
        assert_eq!(book.net.cents(), 1_100);

        let movement = db
            .reports()
            .cash_movement(range("2024-08-01", "2024-08-31"))
            .await
            .unwrap();
        let cash = movement.modes.iter().find(|m| m.mode == "cash").unwrap();
        assert_eq!(cash.in_amount.cents(), 1_200);
        assert_eq!(cash.out_amount.cents(), 800);
        assert_eq!(cash.net.cents(), 400);
        assert_eq!(movement.modes.len(), 2);
        assert_eq!(movement.net.cents(), 700);
    }

    #[tokio::test]
    async fn test_inventory_reports() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let plenty = fixtures::item("Flour", 10, 100, 150);
        let mut low = fixtures::item("Ghee", 2, 50, 90);
        low.low_stock_alert = 5;
        let empty = fixtures::item("Honey", 0, 20, 40);
        let mut service = fixtures::item("Delivery", 0, 0, 200);
        service.item_type = tally_core::ItemKind::Service;
        for item in [&plenty, &low, &empty, &service] {
            db.items().insert(item).await.unwrap();
        }

        let stock = db.reports().stock_summary().await.unwrap();
        assert_eq!(stock.item_count, 4);
        assert_eq!(stock.total_value.cents(), 1_100);
        assert_eq!(stock.low_stock_count, 1);
        assert_eq!(stock.out_of_stock_count, 2);
        assert!(stock.items.iter().any(|line| line.name == "Delivery"));

        let low_list = db.reports().low_stock().await.unwrap();
        let names: Vec<&str> = low_list.iter().map(|l| l.name.as_str()).collect();
        assert!(names.contains(&"Ghee"));
        assert!(!names.contains(&"Delivery"));

        let bought = fixtures::invoice(InvoiceKind::Purchase, None, "2024-09-01", 1_000, 1_000);
        let sold = fixtures::invoice(InvoiceKind::Sale, None, "2024-09-02", 600, 600);
        db.invoices()
            .insert(&bought, &[fixtures::line(&bought, &plenty, 10)])
            .await
            .unwrap();
        db.invoices()
            .insert(&sold, &[fixtures::line(&sold, &plenty, 4)])
            .await
            .unwrap();
        let september = range("2024-09-01", "2024-09-30");

        let movement = db.reports().stock_movement(september).await.unwrap();
        assert_eq!(movement.items.len(), 1);
        assert_eq!(movement.items[0].quantity_in, 10);
        assert_eq!(movement.items[0].quantity_out, 4);
        assert_eq!(movement.items[0].net, 6);

        let profit = db.reports().item_profitability(september).await.unwrap();
        assert_eq!(profit.len(), 1);
        assert_eq!(profit[0].revenue.cents(), 600);
        assert_eq!(profit[0].cost.cents(), 400);
        assert_eq!(profit[0].profit.cents(), 200);
    }

    #[tokio::test]
    async fn test_aging_and_statement() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut ali = fixtures::customer("Ali", PartyType::Customer);
        ali.opening_balance = Money::from_cents(100);
        ali.current_balance = Money::from_cents(1_850);
        db.customers().insert(&ali).await.unwrap();

        let mut old = fixtures::invoice(InvoiceKind::Sale, Some(&ali), "2024-01-01", 1_000, 0);
        old.due_date = Some(fixtures::date("2024-01-15"));
        let recent = fixtures::invoice(InvoiceKind::Sale, Some(&ali), "2024-03-25", 1_200, 300);
        db.invoices().insert(&old, &[]).await.unwrap();
        db.invoices().insert(&recent, &[]).await.unwrap();
        db.payments()
            .insert(&payment(Direction::In, Some(&ali), "2024-03-25", 300, "cash"))
            .await
            .unwrap();
        db.credit_notes()
            .insert(&CreditNote {
                id: generate_id(),
                credit_note_number: "CN-000001".to_string(),
                customer_id: ali.id.clone(),
                invoice_id: Some(old.id.clone()),
                date: fixtures::date("2024-03-28"),
                amount: Money::from_cents(50),
                reason: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let aging = db
            .reports()
            .receivables_aging(fixtures::date("2024-03-31"))
            .await
            .unwrap();
        assert_eq!(aging.total_due.cents(), 1_900);
        assert_eq!(aging.counterparties.len(), 1);
        assert_eq!(aging.counterparties[0].buckets.get(AgingBucket::Days61To90).cents(), 1_000);
        assert_eq!(aging.counterparties[0].buckets.get(AgingBucket::Days1To30).cents(), 900);

        let statement = db
            .reports()
            .customer_statement(&ali.id, range("2024-01-01", "2024-03-31"))
            .await
            .unwrap();
        let balances: Vec<i64> = statement.entries.iter().map(|e| e.balance.cents()).collect();
        assert_eq!(balances, vec![100, 1_100, 2_300, 2_000, 1_950]);
        assert_eq!(statement.closing_balance.cents(), 1_950);

        let missing = db
            .reports()
            .customer_statement("nobody", range("2024-01-01", "2024-03-31"))
            .await;
        assert!(matches!(missing, Err(DbError::NotFound { .. })));

        let balances = db.reports().customer_balances().await.unwrap();
        assert_eq!(balances.total_receivable.cents(), 1_850);
    }

    #[tokio::test]
    async fn test_aging_counts_invoices_dated_after_reference_as_current() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shop = fixtures::customer("Corner Shop", PartyType::Customer);
        db.customers().insert(&shop).await.unwrap();

        let march = fixtures::invoice(InvoiceKind::Sale, Some(&shop), "2024-03-01", 1_000, 0);
        let july = fixtures::invoice(InvoiceKind::Sale, Some(&shop), "2024-07-01", 500, 0);
        db.invoices().insert(&march, &[]).await.unwrap();
        db.invoices().insert(&july, &[]).await.unwrap();

        let aging = db
            .reports()
            .receivables_aging(fixtures::date("2024-06-30"))
            .await
            .unwrap();

        assert_eq!(aging.total_due.cents(), 1_500);
        let current = aging
            .buckets
            .iter()
            .find(|b| b.bucket == AgingBucket::Current)
            .map(|b| b.amount.cents());
        assert_eq!(current, Some(500));
        assert_eq!(aging.counterparties[0].buckets.get(AgingBucket::Current).cents(), 500);
        assert_eq!(aging.counterparties[0].buckets.get(AgingBucket::Days90Plus).cents(), 1_000);
        assert_eq!(aging.counterparties[0].invoice_count, 2);
    }
}
