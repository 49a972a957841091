//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Cart and checkout precondition failures        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors                                                       │
//! │  ├── DbError          - Storage failures (QueryError on read paths)    │
//! │  └── CheckoutError    - Rejected(CoreError) | TransactionFailed(DbErr) │
//! │                                                                         │
//! │  Read path:  DbError ──► ReportState.error (never thrown)              │
//! │  Write path: CheckoutError ──► caller must handle                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the cart and the checkout preconditions.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout was requested with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// A stocked line asks for more units than are on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (line: Rice 5kg × 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { item_name: "Rice 5kg", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 Rice 5kg in stock"
    /// ```
    #[error("Insufficient stock for {item_name}: available {available}, requested {requested}")]
    InsufficientStock {
        item_name: String,
        available: i64,
        requested: i64,
    },

    /// A cart operation referenced an item that has no line in the cart.
    #[error("Item {0} is not in the cart")]
    ItemNotInCart(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Recovered locally by whoever can supply a corrected input; never raised
/// from a report.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. a date that is not YYYY-MM-DD).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Date range whose start is after its end.
    #[error("Date range starts after it ends: {from} > {to}")]
    InvalidDateRange { from: String, to: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
