//! # Repository Module
//!
//! Database repository implementations for the bookstore.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.orders().place_order(user_id, &lines)                      │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── place_order(&self, user, lines)    ← one transaction              │
//! │  │       │                                                              │
//! │  │       ├── inventory::take_copy(&mut tx, ...)                        │
//! │  │       └── INSERT orders / order_items / rentals                     │
//! │  ├── list_all(&self)                                                   │
//! │  └── update_payment_status(&self, id, status)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BookRepository`](book::BookRepository) - Catalog search and maintenance
//! - [`InventoryRepository`](inventory::InventoryRepository) - Restock and counts
//! - [`OrderRepository`](order::OrderRepository) - Order Engine and order views
//! - [`RentalRepository`](rental::RentalRepository) - Rental Lifecycle
//! - [`ReviewRepository`](review::ReviewRepository) - Review upsert and listing
//! - [`UserRepository`](user::UserRepository) - Accounts and customer history

pub mod book;
pub mod inventory;
pub mod order;
pub mod rental;
pub mod review;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::repository::book::NewBook;
    use crate::{Database, DbConfig};
    use bookstore_core::{Account, Book};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Inserts a book priced 19.99 / 3.99 with `copies` total and available.
    pub async fn seed_book(db: &Database, title: &str, copies: i64) -> Book {
        let book = db
            .books()
            .insert(&NewBook {
                title: title.to_string(),
                author: "Test Author".to_string(),
                genre: Some("Fiction".to_string()),
                publication_year: Some(2001),
                price_buy_cents: 1999,
                price_rent_cents: 399,
            })
            .await
            .unwrap();
        db.inventory()
            .set_counts(book.id, copies, copies)
            .await
            .unwrap();
        book
    }

    pub async fn seed_customer(db: &Database, username: &str) -> Account {
        db.users()
            .register(username, &format!("{username}@example.com"), "password")
            .await
            .unwrap()
    }
}
