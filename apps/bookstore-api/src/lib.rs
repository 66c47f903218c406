//! # Bookstore API
//!
//! HTTP JSON service for the bookstore web client.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Bookstore API Routes                            │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Auth          │  │  Customer      │  │  Manager                   ││
//! │  │                │  │                │  │                            ││
//! │  │ • register     │  │ • search books │  │ • orders + payment status  ││
//! │  │ • login        │  │ • book details │  │ • books + inventory        ││
//! │  │ • logout       │  │ • place order  │  │ • customers + history      ││
//! │  │                │  │ • review       │  │ • manual rental / return   ││
//! │  │                │  │ • history      │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Shared State                                 │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────────────────┐  ┌──────────────────────────────┐  │  │
//! │  │  │  Database (bookstore-db) │  │  SessionStore (bearer tokens)│  │  │
//! │  │  └──────────────────────────┘  └──────────────────────────────┘  │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `BOOKSTORE_BIND_ADDR` - Listen address (default: 127.0.0.1:5001)
//! - `BOOKSTORE_DB_PATH` - SQLite file (default: ./bookstore.db)
//! - `BOOKSTORE_SESSION_TTL_SECS` - Token lifetime (default: 86400)
//! - `BOOKSTORE_DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `RUST_LOG` - Log filter (default: info)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use bookstore_db::Database;

// Re-exports
pub use auth::{AuthorizedUser, InMemorySessionStore, ManagerUser, Session, SessionStore};
pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::router;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(db: Database, sessions: Arc<dyn SessionStore>) -> Self {
        AppState { db, sessions }
    }
}
