//! # Repository Module
//!
//! Table access and report queries for the Tally store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  Database (pool.rs)                                                    │
//! │       │  db.items() / db.reports() / db.sessions() ...                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────────┐   ┌──────────────────────────────────────┐   │
//! │  │ Record repositories  │   │ ReportRepository                     │   │
//! │  │  items, customers,   │   │  runs the report's queries, then     │   │
//! │  │  invoices, payments, │   │  hands the rows to a tally-core fold │   │
//! │  │  expenses, cash,     │   └──────────────────────────────────────┘   │
//! │  │  credit notes        │   ┌──────────────────────────────────────┐   │
//! │  └──────────────────────┘   │ SessionRepository (app_state k/v)    │   │
//! │       │                     └──────────────────────────────────────┘   │
//! │       │  SQL (runtime-checked, `?N` binds)                             │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ItemRepository`](item::ItemRepository) - Items and stock levels
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers and suppliers
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Invoices and their lines
//! - [`movement`] - Payments, expenses, cash/bank movements, credit notes
//! - [`ReportRepository`](report::ReportRepository) - Every report query
//! - [`SessionRepository`](session::SessionRepository) - Saved POS cart

pub mod customer;
pub mod invoice;
pub mod item;
pub mod movement;
pub mod report;
pub mod session;

use uuid::Uuid;

/// Generates a new primary key.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Test Fixtures
// =============================================================================
