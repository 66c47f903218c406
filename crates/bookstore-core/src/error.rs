//! # Error Types
//!
//! Domain-specific error types for bookstore-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bookstore-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bookstore-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  bookstore-api errors (app)                                            │
//! │  └── ApiError         - What the client sees (code + message)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule failures.
///
/// Every variant raised inside an order, rental, or return transaction
/// aborts that transaction.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced book does not exist.
    #[error("Book not found: {0}")]
    BookNotFound(i64),

    /// A referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    /// A referenced rental does not exist.
    #[error("Rental not found: {0}")]
    RentalNotFound(i64),

    /// No available copy left for a buy or rent line.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: [rent "Dune", rent "Dune"]   (1 copy available)
    ///      │
    ///      ▼
    /// line 1: available 1 → 0   ✓
    /// line 2: available 0       ✗ OutOfStock { "Dune" }
    ///      │
    ///      ▼
    /// Whole order rolled back, client keeps its cart
    /// ```
    #[error("'{title}' (book {book_id}) is out of stock")]
    OutOfStock { book_id: i64, title: String },

    /// The rental was already marked returned.
    #[error("Rental {rental_id} was already returned")]
    AlreadyReturned { rental_id: i64 },

    /// An inventory change would break `0 <= available <= total`.
    #[error(
        "Inventory for book {book_id} would become inconsistent: \
         {available_copies} available of {total_copies} total"
    )]
    InventoryInvariant {
        book_id: i64,
        total_copies: i64,
        available_copies: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true for the "referenced entity is absent" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::BookNotFound(_) | CoreError::OrderNotFound(_) | CoreError::RentalNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised at the boundary before any business logic or storage work runs.
#[derive(Debug, Error)]
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

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
