//! # Inventory Repository
//!
//! The Inventory Ledger: per-book `total_copies` / `available_copies`.
//!
//! ## Two Entry Points
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Ledger functions (crate-internal, run on the caller's transaction)    │
//! │  ├── lock_available(conn, book)   read under the held write lock       │
//! │  ├── take_copy(conn, book, type)  rent: avail -1                       │
//! │  │                                buy:  total -1, avail -1             │
//! │  └── release_copy(conn, book)     avail +1, guarded by avail < total   │
//! │                                                                         │
//! │  InventoryRepository (pool, manager operations)                        │
//! │  ├── get(book)                                                         │
//! │  ├── restock(book, n)             total +n, avail +n                   │
//! │  └── set_counts(book, t, a)       validated absolute values            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! SQLite locks the whole database for writing, not single rows. Callers
//! of the ledger functions have already executed a write in the same
//! transaction, so the write lock is held and no other transaction can
//! change a counter between `lock_available` and the decrement.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use bookstore_core::validation::{validate_inventory_counts, validate_restock_increment};
use bookstore_core::{AcquisitionType, CoreError, InventoryRecord};

// =============================================================================
// Ledger Functions
// =============================================================================

/// Reads the inventory row for a book inside the caller's transaction.
pub(crate) async fn lock_available(
    conn: &mut SqliteConnection,
    book_id: i64,
) -> DbResult<Option<InventoryRecord>> {
    let record = sqlx::query_as::<_, InventoryRecord>(
        "SELECT book_id, total_copies, available_copies FROM inventory WHERE book_id = ?1",
    )
    .bind(book_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(record)
}

/// Takes one copy of a book for a buy or rent line.
///
/// ## Returns
/// * `Ok(())` - Counters decremented
/// * `Err(OutOfStock)` - No inventory row or `available_copies <= 0`
pub(crate) async fn take_copy(
    conn: &mut SqliteConnection,
    book_id: i64,
    title: &str,
    acquisition_type: AcquisitionType,
) -> DbResult<()> {
    let out_of_stock = || {
        DbError::from(CoreError::OutOfStock {
            book_id,
            title: title.to_string(),
        })
    };

    let record = lock_available(conn, book_id)
        .await?
        .ok_or_else(out_of_stock)?;
    record.check_available(title)?;

    let sql = match acquisition_type {
        AcquisitionType::Rent => {
            "UPDATE inventory
             SET available_copies = available_copies - 1
             WHERE book_id = ?1 AND available_copies > 0"
        }
        AcquisitionType::Buy => {
            "UPDATE inventory
             SET total_copies = total_copies - 1,
                 available_copies = available_copies - 1
             WHERE book_id = ?1 AND available_copies > 0"
        }
    };

    let result = sqlx::query(sql).bind(book_id).execute(&mut *conn).await?;
    if result.rows_affected() == 0 {
        return Err(out_of_stock());
    }

    debug!(
        book_id,
        kind = acquisition_type.as_str(),
        available_before = record.available_copies,
        "Took copy"
    );
    Ok(())
}

/// Puts one rented copy back on the shelf.
///
/// The update only matches while `available_copies < total_copies`; a
/// return that would exceed the total fails with `InventoryInvariant`.
pub(crate) async fn release_copy(conn: &mut SqliteConnection, book_id: i64) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE inventory
         SET available_copies = available_copies + 1
         WHERE book_id = ?1 AND available_copies < total_copies",
    )
    .bind(book_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        debug!(book_id, "Released copy");
        return Ok(());
    }

    let err = match lock_available(conn, book_id).await? {
        Some(record) => CoreError::InventoryInvariant {
            book_id,
            total_copies: record.total_copies,
            available_copies: record.available_copies + 1,
        },
        None => CoreError::BookNotFound(book_id),
    };
    warn!(book_id, error = %err, "Rejected inventory increment");
    Err(err.into())
}

/// Overwrites both counters.
///
/// Fails with `InventoryInvariant` and leaves the row untouched when the
/// record has `available_copies` outside `0..=total_copies`.
pub(crate) async fn write_counts(
    conn: &mut SqliteConnection,
    record: InventoryRecord,
) -> DbResult<()> {
    record.check_consistent()?;

    sqlx::query(
        "INSERT INTO inventory (book_id, total_copies, available_copies)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(book_id) DO UPDATE SET
             total_copies = excluded.total_copies,
             available_copies = excluded.available_copies",
    )
    .bind(record.book_id)
    .bind(record.total_copies)
    .bind(record.available_copies)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Inventory Repository
// =============================================================================

/// Repository for manager-side inventory operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Gets the inventory record for a book.
    pub async fn get(&self, book_id: i64) -> DbResult<Option<InventoryRecord>> {
        let record = sqlx::query_as::<_, InventoryRecord>(
            "SELECT book_id, total_copies, available_copies FROM inventory WHERE book_id = ?1",
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Adds `increment` copies to both counters.
    ///
    /// ## Arguments
    /// * `book_id` - Book to restock
    /// * `increment` - Copies received (must be positive)
    ///
    /// ## Returns
    /// The updated record, or `NotFound` when the book has no inventory row.
    pub async fn restock(&self, book_id: i64, increment: i64) -> DbResult<InventoryRecord> {
        validate_restock_increment(increment).map_err(CoreError::from)?;

        debug!(book_id, increment, "Restocking");

        let record = sqlx::query_as::<_, InventoryRecord>(
            "UPDATE inventory
             SET total_copies = total_copies + ?2,
                 available_copies = available_copies + ?2
             WHERE book_id = ?1
             RETURNING book_id, total_copies, available_copies",
        )
        .bind(book_id)
        .bind(increment)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Inventory", book_id))?;

        info!(
            book_id,
            total = record.total_copies,
            available = record.available_copies,
            "Inventory restocked"
        );
        Ok(record)
    }

    /// Sets absolute counter values for a book.
    ///
    /// Rejects negative counts and `available > total`.
    pub async fn set_counts(
        &self,
        book_id: i64,
        total_copies: i64,
        available_copies: i64,
    ) -> DbResult<InventoryRecord> {
        validate_inventory_counts(total_copies, available_copies).map_err(CoreError::from)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = ?1")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(CoreError::BookNotFound(book_id).into());
        }

        let record = InventoryRecord {
            book_id,
            total_copies,
            available_copies,
        };
        write_counts(&mut tx, record).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(book_id, total_copies, available_copies, "Inventory counts set");
        Ok(record)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
