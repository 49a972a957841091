//! # tally-core: Pure Business Logic for Tally
//!
//! Everything in this crate is a deterministic function of its inputs: the
//! running-balance and aging math, the point-of-sale cart pricing engine, and
//! the folds that turn raw storage rows into report view-models.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Screens (out of tree)                          │   │
//! │  │   Report screens ◄── view-models     POS screen ──► cart ops   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌──────────────────┐  │   │
//! │  │   │  money  │  │ ledger  │  │  cart   │  │     reports      │  │   │
//! │  │   │  Money  │  │ running │  │ PosCart │  │ summary, P&L,    │  │   │
//! │  │   │ TaxRate │  │ aging   │  │ totals  │  │ cash flow, stock │  │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          tally-db (queries, checkout transaction)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Stored entities (Invoice, Item, Customer, Payment, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`ledger`] - Running ledger and aging buckets
//! - [`cart`] - Cart Pricing Engine
//! - [`reports`] - Report view-models and the folds that build them
//! - [`error`] - Domain error types
//! - [`validation`] - Caller-side validation helpers
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::ledger::{compute_running_ledger, LedgerTransaction};
//! use tally_core::Money;
//!
//! let ledger = compute_running_ledger(
//!     Money::from_cents(100),
//!     vec![
//!         LedgerTransaction::debit(Money::from_cents(500)),
//!         LedgerTransaction::credit(Money::from_cents(300)),
//!     ],
//! );
//! assert_eq!(ledger.closing_balance, Money::from_cents(300));
//! ```

pub mod cart;
pub mod error;
pub mod ledger;
pub mod money;
pub mod reports;
pub mod types;
pub mod validation;

pub use cart::{CartTotals, Discount, PosCart, PosCartItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use reports::{DateRange, ReportState};
pub use types::*;

/// Number of rows kept in the "top counterparties" and "top items" sections
/// of the sales and purchase summaries.
pub const DEFAULT_TOP_N: usize = 5;

/// Counterparty name recorded on sales without a selected customer.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";
