//! # Reports
//!
//! View-models for every report and the pure folds that build them from raw
//! rows. The queries live in tally-db; everything here is a function of the
//! rows it is handed, so re-running a report on the same rows gives the same
//! output.
//!
//! ## Report Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DateRange / customer id / as-of date                                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  tally-db ReportRepository ──► independent queries (no snapshot)        │
//! │        │                                                                │
//! │        ▼  rows (NULL amounts read as zero)                              │
//! │  tally-core reports::* folds  ◄── THIS MODULE                           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ReportState { data, is_loading, error } ──► screen                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod financial;
pub mod inventory;
pub mod statement;
pub mod summary;

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::{parse_iso_date, ValidationResult};

pub use financial::{
    CashFlowLine, CashFlowReport, CashFlowSource, CashMovementReport, DayBook, DayBookEntry,
    DayBookKind, ExpenseCategory, ModeMovement, ProfitLossReport, TaxSummary,
};
pub use inventory::{
    ItemProfitability, LowStockItem, StockMovementLine, StockMovementReport, StockStatus,
    StockSummary, StockSummaryLine,
};
pub use statement::{CustomerBalance, CustomerBalanceReport, CustomerStatement, StatementRow};
pub use summary::{CounterpartyTotal, InvoiceSummary, ItemTotal, MonthlyAmount};

// =============================================================================
// Date Range
// =============================================================================

/// An inclusive range of calendar days.
///
/// Bound to queries as zero-padded `YYYY-MM-DD` strings, which compare
/// correctly as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub from: NaiveDate,
    #[ts(as = "String")]
    pub to: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting one that starts after it ends.
    pub fn new(from: NaiveDate, to: NaiveDate) -> ValidationResult<Self> {
        if from > to {
            return Err(ValidationError::InvalidDateRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(DateRange { from, to })
    }

    /// Parses both bounds from `YYYY-MM-DD` strings.
    ///
    /// ```rust
    /// use tally_core::DateRange;
    ///
    /// let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
    /// assert_eq!(range.days(), 31);
    /// assert!(DateRange::parse("2024-02-01", "2024-01-31").is_err());
    /// ```
    pub fn parse(from: &str, to: &str) -> ValidationResult<Self> {
        Self::new(parse_iso_date("from", from)?, parse_iso_date("to", to)?)
    }

    pub fn single_day(day: NaiveDate) -> Self {
        DateRange { from: day, to: day }
    }

    /// The calendar month containing `day`.
    pub fn month_of(day: NaiveDate) -> Self {
        let first = day.with_day(1).unwrap_or(day);
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(day);
        DateRange {
            from: first,
            to: last,
        }
    }

    /// Query bind values.
    pub fn bounds(&self) -> (String, String) {
        (self.from.to_string(), self.to.to_string())
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    /// Number of days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// `YYYY-MM` keys of every month touched by the range, in order.
    pub fn month_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        let mut cursor = self.from.with_day(1).unwrap_or(self.from);
        while cursor <= self.to {
            keys.push(cursor.format("%Y-%m").to_string());
            match cursor.checked_add_months(Months::new(1)) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        keys
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

// =============================================================================
// Report State
// =============================================================================

/// What a report screen binds to.
///
/// Read failures never propagate: they land in `error`, and any data from the
/// previous successful run is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportState<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ReportState<T> {
    fn default() -> Self {
        ReportState {
            data: None,
            is_loading: false,
            error: None,
        }
    }
}

impl<T> ReportState<T> {
    /// State before the first run completes.
    pub fn loading() -> Self {
        ReportState {
            data: None,
            is_loading: true,
            error: None,
        }
    }

    pub fn ready(data: T) -> Self {
        ReportState {
            data: Some(data),
            is_loading: false,
            error: None,
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        ReportState {
            data: None,
            is_loading: false,
            error: Some(error.to_string()),
        }
    }

    pub fn from_result<E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ready(data),
            Err(e) => Self::failed(e),
        }
    }

    /// Marks a re-run in flight, keeping the current data on screen.
    pub fn begin_refresh(&mut self) {
        self.is_loading = true;
    }

    /// Applies the outcome of a run. A failure keeps the stale data.
    pub fn settle<E: fmt::Display>(&mut self, result: Result<T, E>) {
        self.is_loading = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}
