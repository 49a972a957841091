//! # Report Service
//!
//! What report screens call. Every method returns a [`ReportState`]: a read
//! failure becomes `state.error`, never an `Err` or a panic.
//!
//! ## Refresh Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  screen holds ReportState<T>                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ReportService::refresh(&mut state, reports.profit_loss(range))        │
//! │       │   is_loading = true, old data stays on screen                  │
//! │       ▼                                                                 │
//! │  Ok(data)  ──► data replaced, error cleared                            │
//! │  Err(e)    ──► data kept (stale), error = e.to_string(), warn! logged  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Re-running a report recomputes it from scratch; nothing is cached.

use std::future::Future;

use chrono::NaiveDate;
use tracing::warn;

use crate::error::DbResult;
use crate::repository::report::ReportRepository;
use tally_core::ledger::AgingReport;
use tally_core::reports::{
    CashFlowReport, CashMovementReport, CounterpartyTotal, CustomerBalanceReport,
    CustomerStatement, DayBook, InvoiceSummary, ItemProfitability, ItemTotal, LowStockItem,
    ProfitLossReport, StockMovementReport, StockSummary, TaxSummary,
};
use tally_core::{DateRange, ReportState};

#[derive(Debug, Clone)]
pub struct ReportService {
    reports: ReportRepository,
    top_n: usize,
}

impl ReportService {
    pub fn new(reports: ReportRepository, top_n: usize) -> Self {
        ReportService { reports, top_n }
    }

    /// The underlying queries, for use with [`ReportService::refresh`].
    pub fn repository(&self) -> &ReportRepository {
        &self.reports
    }

    /// Re-runs a report into an existing state, keeping the previous data if
    /// the run fails.
    ///
    /// ```rust,ignore
    /// let mut state = service.profit_loss(range).await;
    /// ReportService::refresh(&mut state, service.repository().profit_loss(range)).await;
    /// ```
    pub async fn refresh<T, F>(state: &mut ReportState<T>, run: F)
    where
        F: Future<Output = DbResult<T>>,
    {
        state.begin_refresh();
        let result = run.await;
        if let Err(e) = &result {
            warn!(error = %e, "Report refresh failed, keeping previous data");
        }
        state.settle(result);
    }

    fn settle<T>(report: &'static str, result: DbResult<T>) -> ReportState<T> {
        if let Err(e) = &result {
            warn!(report, error = %e, "Report query failed");
        }
        ReportState::from_result(result)
    }

    // =========================================================================
    // Reports
    // =========================================================================

    pub async fn sales_summary(&self, range: DateRange) -> ReportState<InvoiceSummary> {
        Self::settle(
            "sales_summary",
            self.reports.sales_summary(range, self.top_n).await,
        )
    }

    pub async fn purchase_summary(&self, range: DateRange) -> ReportState<InvoiceSummary> {
        Self::settle(
            "purchase_summary",
            self.reports.purchase_summary(range, self.top_n).await,
        )
    }

    pub async fn sales_by_customer(&self, range: DateRange) -> ReportState<Vec<CounterpartyTotal>> {
        Self::settle(
            "sales_by_customer",
            self.reports.sales_by_customer(range).await,
        )
    }

    pub async fn purchases_by_supplier(
        &self,
        range: DateRange,
    ) -> ReportState<Vec<CounterpartyTotal>> {
        Self::settle(
            "purchases_by_supplier",
            self.reports.purchases_by_supplier(range).await,
        )
    }

    pub async fn sales_by_item(&self, range: DateRange) -> ReportState<Vec<ItemTotal>> {
        Self::settle("sales_by_item", self.reports.sales_by_item(range).await)
    }

    pub async fn purchases_by_item(&self, range: DateRange) -> ReportState<Vec<ItemTotal>> {
        Self::settle(
            "purchases_by_item",
            self.reports.purchases_by_item(range).await,
        )
    }

    pub async fn profit_loss(&self, range: DateRange) -> ReportState<ProfitLossReport> {
        Self::settle("profit_loss", self.reports.profit_loss(range).await)
    }

    pub async fn cash_flow(&self, range: DateRange) -> ReportState<CashFlowReport> {
        Self::settle("cash_flow", self.reports.cash_flow(range).await)
    }

    pub async fn tax_summary(&self, range: DateRange) -> ReportState<TaxSummary> {
        Self::settle("tax_summary", self.reports.tax_summary(range).await)
    }

    pub async fn day_book(&self, date: NaiveDate) -> ReportState<DayBook> {
        Self::settle("day_book", self.reports.day_book(date).await)
    }

    pub async fn cash_movement(&self, range: DateRange) -> ReportState<CashMovementReport> {
        Self::settle("cash_movement", self.reports.cash_movement(range).await)
    }

    pub async fn stock_summary(&self) -> ReportState<StockSummary> {
        Self::settle("stock_summary", self.reports.stock_summary().await)
    }

    pub async fn low_stock(&self) -> ReportState<Vec<LowStockItem>> {
        Self::settle("low_stock", self.reports.low_stock().await)
    }

    pub async fn item_profitability(
        &self,
        range: DateRange,
    ) -> ReportState<Vec<ItemProfitability>> {
        Self::settle(
            "item_profitability",
            self.reports.item_profitability(range).await,
        )
    }

    pub async fn stock_movement(&self, range: DateRange) -> ReportState<StockMovementReport> {
        Self::settle("stock_movement", self.reports.stock_movement(range).await)
    }

    pub async fn receivables_aging(&self, as_of: NaiveDate) -> ReportState<AgingReport> {
        Self::settle(
            "receivables_aging",
            self.reports.receivables_aging(as_of).await,
        )
    }

    pub async fn payables_aging(&self, as_of: NaiveDate) -> ReportState<AgingReport> {
        Self::settle("payables_aging", self.reports.payables_aging(as_of).await)
    }

    pub async fn customer_statement(
        &self,
        customer_id: &str,
        range: DateRange,
    ) -> ReportState<CustomerStatement> {
        Self::settle(
            "customer_statement",
            self.reports.customer_statement(customer_id, range).await,
        )
    }

    pub async fn customer_balances(&self) -> ReportState<CustomerBalanceReport> {
        Self::settle(
            "customer_balances",
            self.reports.customer_balances().await,
        )
    }
}
