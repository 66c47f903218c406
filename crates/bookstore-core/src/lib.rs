//! # bookstore-core: Pure Business Logic for the Bookstore
//!
//! Domain types and business rules with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bookstore Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Desktop client (customers, managers)            │   │
//! │  │    Search ──► Cart ──► Place Order ──► Bill / History           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP + JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bookstore-api (axum)                         │   │
//! │  │    auth, typed request validation, error mapping                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bookstore-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   order   │  │ validation│  │   │
//! │  │   │   Book    │  │   Money   │  │ OrderLine │  │   rules   │  │   │
//! │  │   │  Rental   │  │           │  │  pricing  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  bookstore-db (Database Layer)                  │   │
//! │  │     Order Engine, Inventory Ledger, Rental Lifecycle, Reviews   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, InventoryRecord, Order, Rental, Review, Bill)
//! - [`money`] - Money type with integer arithmetic
//! - [`order`] - Cart lines and pricing against catalog data
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use bookstore_core::money::Money;
//!
//! let buy = Money::from_cents(1999);
//! let rent = Money::from_cents(399);
//! assert_eq!((buy + rent).to_string(), "$23.98");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod order;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{price_order, OrderLine, PricedOrder};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Length of a rental created by an order, in days.
pub const RENTAL_PERIOD_DAYS: i64 = 14;

/// Copies a newly catalogued book starts with (total and available).
pub const DEFAULT_STOCK_COPIES: i64 = 10;

/// Maximum lines allowed in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Lowest accepted review rating.
pub const MIN_RATING: i64 = 1;

/// Highest accepted review rating.
pub const MAX_RATING: i64 = 5;

/// Result cap for an unfiltered customer catalog listing.
pub const DEFAULT_LISTING_LIMIT: i64 = 100;
