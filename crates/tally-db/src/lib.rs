//! # tally-db: Storage, Reports and Checkout
//!
//! SQLite storage for Tally, the report queries that feed the pure folds in
//! `tally-core`, and the one atomic write path: checkout.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Data Flow                                  │
//! │                                                                         │
//! │  Report screen                     POS screen                           │
//! │       │                                 │ PosCart (tally-core)          │
//! │       ▼                                 ▼                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ ReportService │    │ Checkout      │    │  Migrations  │  │   │
//! │  │   │ (service.rs)  │    │ Processor     │    │  (embedded)  │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           ▼                    │ one transaction              │   │
//! │  │   ┌───────────────┐            ▼                              │   │
//! │  │   │ Report        │    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ Repository    │    │ Database      │    │  AppConfig   │  │   │
//! │  │   │ (queries)     │───►│ (pool.rs)     │    │  (toml/env)  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (tally.db)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`config`] - `tally.toml` and environment overrides
//! - [`repository`] - Table access and report queries
//! - [`service`] - Reports wrapped for screens (`ReportState`)
//! - [`checkout`] - The checkout transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{AppConfig, Database};
//!
//! let config = AppConfig::load_or_default(None);
//! let db = Database::new(config.db_config()).await?;
//!
//! let pnl = db.reports().profit_loss(range).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutError, CheckoutProcessor, CheckoutReceipt};
pub use config::{AppConfig, ConfigError, StoreSettings};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::ReportService;

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::item::ItemRepository;
pub use repository::movement::{
    CashRepository, CreditNoteRepository, ExpenseRepository, PaymentRepository,
};
pub use repository::report::ReportRepository;
pub use repository::session::SessionRepository;

/// Default log filter for the binaries, overridden by `RUST_LOG`.
pub const DEFAULT_LOG_FILTER: &str = "info,tally=debug,sqlx=warn";

/// Installs a `tracing` subscriber writing to stderr.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
