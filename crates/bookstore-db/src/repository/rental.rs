//! # Rental Repository
//!
//! The Rental Lifecycle: manual rentals, returns, and listings.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  place_order (rent line)  ─┐                                           │
//! │                            ├──► Rental { returned_at: None }           │
//! │  create_manual (manager)  ─┘          │                                 │
//! │     available -1                      │ mark_returned                   │
//! │                                       ▼                                 │
//! │                            Rental { returned_at: Some(now) }           │
//! │                               available +1 (never above total)         │
//! │                                       │                                 │
//! │                                       │ mark_returned again             │
//! │                                       ▼                                 │
//! │                               AlreadyReturned, nothing changes          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::inventory::{release_copy, take_copy};
use bookstore_core::{AcquisitionType, CoreError, Rental};

/// A rental joined with its book title.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RentalView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub rental: Rental,
    pub title: String,
}

/// Repository for rental database operations.
#[derive(Debug, Clone)]
pub struct RentalRepository {
    pool: SqlitePool,
}

impl RentalRepository {
    /// Creates a new RentalRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RentalRepository { pool }
    }

    /// Gets a rental by ID.
    pub async fn get_by_id(&self, rental_id: i64) -> DbResult<Option<Rental>> {
        let rental = sqlx::query_as::<_, Rental>(
            "SELECT id, order_item_id, user_id, book_id, rented_at, due_date, returned_at
             FROM rentals WHERE id = ?1",
        )
        .bind(rental_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rental)
    }

    /// Marks a rental returned and puts the copy back on the shelf.
    ///
    /// ## Returns
    /// * `Ok(Rental)` - Updated rental
    /// * `Err(RentalNotFound)` - No such rental
    /// * `Err(AlreadyReturned)` - `returned_at` already set; counters untouched
    /// * `Err(InventoryInvariant)` - Return would push available above total
    pub async fn mark_returned(&self, rental_id: i64) -> DbResult<Rental> {
        debug!(rental_id, "Marking rental returned");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        // Conditional write first: claims the write lock and makes a
        // concurrent second return see the committed returned_at.
        let returned = sqlx::query_as::<_, Rental>(
            "UPDATE rentals SET returned_at = ?2
             WHERE id = ?1 AND returned_at IS NULL
             RETURNING id, order_item_id, user_id, book_id, rented_at, due_date, returned_at",
        )
        .bind(rental_id)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(rental) = returned else {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM rentals WHERE id = ?1")
                .bind(rental_id)
                .fetch_optional(&mut *tx)
                .await?;
            let err = match exists {
                Some(_) => CoreError::AlreadyReturned { rental_id },
                None => CoreError::RentalNotFound(rental_id),
            };
            warn!(rental_id, error = %err, "Return rejected");
            return Err(err.into());
        };

        release_copy(&mut tx, rental.book_id).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(rental_id, book_id = rental.book_id, "Rental returned");
        Ok(rental)
    }

    /// Creates a rental outside of any order (manager desk).
    ///
    /// ## Arguments
    /// * `user_id` - Customer taking the book
    /// * `book_id` - Book rented
    /// * `due_date` - Calendar date the copy is due back (midnight UTC)
    ///
    /// ## Returns
    /// * `Ok(Rental)` - With `order_item_id: None`
    /// * `Err(BookNotFound)` / `Err(NotFound)` - Unknown book or customer
    /// * `Err(OutOfStock)` - No available copy
    pub async fn create_manual(
        &self,
        user_id: i64,
        book_id: i64,
        due_date: NaiveDate,
    ) -> DbResult<Rental> {
        debug!(user_id, book_id, %due_date, "Creating manual rental");

        let title: Option<String> = sqlx::query_scalar("SELECT title FROM books WHERE id = ?1")
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;
        let title = title.ok_or(CoreError::BookNotFound(book_id))?;

        let customer: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        if customer.is_none() {
            return Err(DbError::not_found("User", user_id));
        }

        let now = Utc::now();
        let due = Rental::due_on(due_date);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        // Write first so the stock read below runs under the write lock.
        let rental_id = sqlx::query(
            "INSERT INTO rentals (order_item_id, user_id, book_id, rented_at, due_date)
             VALUES (NULL, ?1, ?2, ?3, ?4)",
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(due)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        if let Err(err) = take_copy(&mut tx, book_id, &title, AcquisitionType::Rent).await {
            warn!(book_id, error = %err, "Manual rental rejected");
            return Err(err);
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(rental_id, user_id, book_id, "Manual rental created");
        Ok(Rental {
            id: rental_id,
            order_item_id: None,
            user_id,
            book_id,
            rented_at: now,
            due_date: due,
            returned_at: None,
        })
    }

    /// Lists a customer's rentals with book titles, newest first.
    pub async fn list_for_customer(&self, user_id: i64) -> DbResult<Vec<RentalView>> {
        let rentals = sqlx::query_as::<_, RentalView>(
            "SELECT r.id, r.order_item_id, r.user_id, r.book_id,
                    r.rented_at, r.due_date, r.returned_at, b.title
             FROM rentals r
             JOIN books b ON b.id = r.book_id
             WHERE r.user_id = ?1
             ORDER BY r.rented_at DESC, r.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rentals)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
