//! # bookstore-db: Database Layer for the Bookstore
//!
//! Database access for the bookstore: SQLite through sqlx, with the
//! transactional parts of the business (orders, rentals, returns) living
//! here next to the SQL they depend on.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bookstore Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/orders)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   bookstore-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ BookRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo     │    │ 001_initial_ │  │   │
//! │  │   │ busy_timeout  │    │ RentalRepo    │    │   schema.sql │  │   │
//! │  │   │ WAL           │    │ Inventory...  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                       ./bookstore.db                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bookstore_db::{Database, DbConfig};
//! use bookstore_core::{AcquisitionType, OrderLine};
//!
//! let db = Database::new(DbConfig::new("./bookstore.db")).await?;
//!
//! let bill = db
//!     .orders()
//!     .place_order(user_id, &[OrderLine::new(book_id, AcquisitionType::Rent)])
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::book::{BookDetails, BookFilter, BookOverview, BookRepository, BookUpdate, NewBook};
pub use repository::inventory::InventoryRepository;
pub use repository::order::{OrderLineView, OrderRepository, OrderSummary};
pub use repository::rental::{RentalRepository, RentalView};
pub use repository::review::{BookReview, CustomerReview, ReviewRepository};
pub use repository::user::{CustomerHistory, Purchase, UserRepository};
