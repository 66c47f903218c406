//! # Book Repository
//!
//! Catalog reads (the Catalog Reader used by the Order Engine) and manager
//! maintenance of book rows.
//!
//! ## Key Operations
//! - Customer keyword search (title/author)
//! - Manager search with genre/year filters and rating stats
//! - Book details with inventory counts and the viewer's own review
//! - Insert (with its inventory row) and update
//!
//! ## Search Matching
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  keyword "herb"                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  title LIKE '%herb%' OR author LIKE '%herb%'   (ASCII case-insensitive) │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  "Dune" by Frank Herbert  ← match on author                             │
//! │                                                                         │
//! │  keyword ""  →  first 100 titles alphabetically                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::inventory::write_counts;
use bookstore_core::validation::{
    validate_author, validate_inventory_counts, validate_price_cents, validate_publication_year,
    validate_search_query, validate_title,
};
use bookstore_core::{
    Book, CoreError, InventoryRecord, Review, DEFAULT_LISTING_LIMIT, DEFAULT_STOCK_COPIES,
};

const BOOK_COLUMNS: &str = "b.id, b.title, b.author, b.genre, b.publication_year, \
                            b.price_buy_cents, b.price_rent_cents, b.created_at";

// =============================================================================
// Inputs & Views
// =============================================================================

/// Fields for a new catalog entry.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub publication_year: Option<i64>,
    pub price_buy_cents: i64,
    pub price_rent_cents: i64,
}

impl NewBook {
    fn validate(&self) -> Result<(), CoreError> {
        validate_title(&self.title)?;
        validate_author(&self.author)?;
        validate_price_cents("price_buy", self.price_buy_cents)?;
        validate_price_cents("price_rent", self.price_rent_cents)?;
        validate_publication_year(self.publication_year)?;
        Ok(())
    }
}

/// Full replacement of a book row plus its inventory counts.
#[derive(Debug, Clone)]
pub struct BookUpdate {
    pub book: NewBook,
    pub total_copies: i64,
    pub available_copies: i64,
}

/// A book with its inventory counts and review statistics.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct BookOverview {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub book: Book,
    pub total_copies: i64,
    pub available_copies: i64,
    pub avg_rating: Option<f64>,
    pub review_count: i64,
}

/// Book details as shown on the book page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookDetails {
    #[serde(flatten)]
    pub overview: BookOverview,
    /// The viewer's own review, if they wrote one.
    pub user_review: Option<Review>,
}

/// Manager search filters. Empty strings and `None` match everything.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub keyword: String,
    pub genre: String,
    pub year: Option<i64>,
}

fn like_pattern(value: &str) -> String {
    format!("%{}%", value.trim())
}

// =============================================================================
// Book Repository
// =============================================================================

/// Repository for catalog database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = BookRepository::new(pool);
/// let books = repo.search("dune").await?;
/// let catalog = repo.get_many(&[1, 2, 3]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Gets a book by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books b WHERE b.id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Resolves a set of book ids to current catalog rows.
    ///
    /// Missing ids are simply absent from the map; the caller decides how
    /// to report them.
    pub async fn get_many(&self, ids: &[i64]) -> DbResult<HashMap<i64, Book>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books b WHERE b.id IN ({placeholders})");

        let mut query = sqlx::query_as::<_, Book>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let books = query.fetch_all(&self.pool).await?;

        debug!(requested = ids.len(), found = books.len(), "Resolved catalog rows");
        Ok(books.into_iter().map(|b| (b.id, b)).collect())
    }

    /// Customer keyword search over title and author.
    ///
    /// ## Arguments
    /// * `keyword` - Substring to match; empty lists the first 100 titles
    ///
    /// ## Returns
    /// Books ordered by title.
    pub async fn search(&self, keyword: &str) -> DbResult<Vec<Book>> {
        validate_search_query(keyword).map_err(CoreError::from)?;
        let keyword = keyword.trim();

        debug!(keyword = %keyword, "Searching catalog");

        let books = if keyword.is_empty() {
            sqlx::query_as::<_, Book>(&format!(
                "SELECT {BOOK_COLUMNS} FROM books b ORDER BY b.title LIMIT ?1"
            ))
            .bind(DEFAULT_LISTING_LIMIT)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Book>(&format!(
                "SELECT {BOOK_COLUMNS} FROM books b
                 WHERE b.title LIKE ?1 OR b.author LIKE ?1
                 ORDER BY b.title"
            ))
            .bind(like_pattern(keyword))
            .fetch_all(&self.pool)
            .await?
        };

        Ok(books)
    }

    /// Manager search with inventory counts and rating stats, newest first.
    pub async fn search_overview(&self, filter: &BookFilter) -> DbResult<Vec<BookOverview>> {
        validate_search_query(&filter.keyword).map_err(CoreError::from)?;

        debug!(
            keyword = %filter.keyword,
            genre = %filter.genre,
            year = ?filter.year,
            "Manager catalog search"
        );

        let rows = sqlx::query_as::<_, BookOverview>(&format!(
            "SELECT {BOOK_COLUMNS},
                    COALESCE(i.total_copies, 0) AS total_copies,
                    COALESCE(i.available_copies, 0) AS available_copies,
                    AVG(r.rating) AS avg_rating,
                    COUNT(r.id) AS review_count
             FROM books b
             LEFT JOIN inventory i ON i.book_id = b.id
             LEFT JOIN reviews r ON r.book_id = b.id
             WHERE (?1 = '' OR b.title LIKE ?2 OR b.author LIKE ?2)
               AND (?3 = '' OR b.genre LIKE ?4)
               AND (?5 IS NULL OR b.publication_year = ?5)
             GROUP BY b.id
             ORDER BY b.created_at DESC, b.id DESC"
        ))
        .bind(filter.keyword.trim())
        .bind(like_pattern(&filter.keyword))
        .bind(filter.genre.trim())
        .bind(like_pattern(&filter.genre))
        .bind(filter.year)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Book with counts, stats, and optionally the viewer's review.
    ///
    /// ## Returns
    /// `None` when the book does not exist.
    pub async fn details(&self, book_id: i64, viewer_id: Option<i64>) -> DbResult<Option<BookDetails>> {
        let overview = sqlx::query_as::<_, BookOverview>(&format!(
            "SELECT {BOOK_COLUMNS},
                    COALESCE(i.total_copies, 0) AS total_copies,
                    COALESCE(i.available_copies, 0) AS available_copies,
                    (SELECT AVG(rating) FROM reviews WHERE book_id = b.id) AS avg_rating,
                    (SELECT COUNT(*) FROM reviews WHERE book_id = b.id) AS review_count
             FROM books b
             LEFT JOIN inventory i ON i.book_id = b.id
             WHERE b.id = ?1"
        ))
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(overview) = overview else {
            return Ok(None);
        };

        let user_review = match viewer_id {
            Some(user_id) => {
                sqlx::query_as::<_, Review>(
                    "SELECT id, user_id, book_id, rating, review_text, created_at
                     FROM reviews WHERE user_id = ?1 AND book_id = ?2",
                )
                .bind(user_id)
                .bind(book_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => None,
        };

        Ok(Some(BookDetails {
            overview,
            user_review,
        }))
    }

    /// Adds a book with the default stock (10 total, 10 available).
    pub async fn insert(&self, new_book: &NewBook) -> DbResult<Book> {
        self.insert_with_stock(new_book, DEFAULT_STOCK_COPIES).await
    }

    /// Adds a book and its inventory row in one transaction.
    ///
    /// ## Arguments
    /// * `new_book` - Validated catalog fields
    /// * `copies` - Initial total and available copies
    pub async fn insert_with_stock(&self, new_book: &NewBook, copies: i64) -> DbResult<Book> {
        new_book.validate()?;
        validate_inventory_counts(copies, copies).map_err(CoreError::from)?;

        debug!(title = %new_book.title, copies, "Inserting book");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO books (
                 title, author, genre, publication_year,
                 price_buy_cents, price_rent_cents, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, title, author, genre, publication_year,
                       price_buy_cents, price_rent_cents, created_at",
        )
        .bind(new_book.title.trim())
        .bind(new_book.author.trim())
        .bind(new_book.genre.as_deref())
        .bind(new_book.publication_year)
        .bind(new_book.price_buy_cents)
        .bind(new_book.price_rent_cents)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        write_counts(
            &mut tx,
            InventoryRecord {
                book_id: book.id,
                total_copies: copies,
                available_copies: copies,
            },
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(book_id = book.id, title = %book.title, "Book added");
        Ok(book)
    }

    /// Replaces a book's fields and inventory counts.
    ///
    /// ## Returns
    /// * `Ok(Book)` - Updated row
    /// * `Err(BookNotFound)` - No such book
    /// * `Err(Validation)` - Bad fields or `total < available`
    pub async fn update(&self, book_id: i64, update: &BookUpdate) -> DbResult<Book> {
        update.book.validate()?;
        validate_inventory_counts(update.total_copies, update.available_copies)
            .map_err(CoreError::from)?;

        debug!(book_id, "Updating book");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let book = sqlx::query_as::<_, Book>(
            "UPDATE books
             SET title = ?2, author = ?3, genre = ?4, publication_year = ?5,
                 price_buy_cents = ?6, price_rent_cents = ?7
             WHERE id = ?1
             RETURNING id, title, author, genre, publication_year,
                       price_buy_cents, price_rent_cents, created_at",
        )
        .bind(book_id)
        .bind(update.book.title.trim())
        .bind(update.book.author.trim())
        .bind(update.book.genre.as_deref())
        .bind(update.book.publication_year)
        .bind(update.book.price_buy_cents)
        .bind(update.book.price_rent_cents)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::BookNotFound(book_id))?;

        write_counts(
            &mut tx,
            InventoryRecord {
                book_id,
                total_copies: update.total_copies,
                available_copies: update.available_copies,
            },
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(book_id, "Book updated");
        Ok(book)
    }

    /// Counts catalog entries (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{seed_book, seed_customer, test_db};

    fn new_book(title: &str, author: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            genre: Some("Classic".to_string()),
            publication_year: Some(1813),
            price_buy_cents: 899,
            price_rent_cents: 199,
        }
    }

    #[tokio::test]
    async fn test_insert_creates_default_inventory() {
        let db = test_db().await;
        let book = db
            .books()
            .insert(&new_book("Pride and Prejudice", "Jane Austen"))
            .await
            .unwrap();

        let inv = db.inventory().get(book.id).await.unwrap().unwrap();
        assert_eq!(inv.total_copies, DEFAULT_STOCK_COPIES);
        assert_eq!(inv.available_copies, DEFAULT_STOCK_COPIES);
    }

    #[tokio::test]
    async fn test_insert_requires_title() {
        let db = test_db().await;
        let err = db.books().insert(&new_book("  ", "Someone")).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        assert_eq!(db.books().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_title_and_author() {
        let db = test_db().await;
        db.books().insert(&new_book("Emma", "Jane Austen")).await.unwrap();
        db.books().insert(&new_book("Dune", "Frank Herbert")).await.unwrap();
        db.books().insert(&new_book("Persuasion", "Jane Austen")).await.unwrap();

        let austen = db.books().search("austen").await.unwrap();
        let titles: Vec<_> = austen.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Emma", "Persuasion"]);

        let all = db.books().search("").await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].title, "Dune");
    }

    #[tokio::test]
    async fn test_get_many_skips_missing() {
        let db = test_db().await;
        let a = seed_book(&db, "A", 1).await;
        let b = seed_book(&db, "B", 1).await;

        let found = db.books().get_many(&[a.id, b.id, 999]).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[&a.id].title, "A");
        assert!(!found.contains_key(&999));
    }

    #[tokio::test]
    async fn test_search_overview_filters_and_stats() {
        let db = test_db().await;
        let emma = db.books().insert(&new_book("Emma", "Jane Austen")).await.unwrap();
        let mut scifi = new_book("Dune", "Frank Herbert");
        scifi.genre = Some("Science Fiction".to_string());
        scifi.publication_year = Some(1965);
        db.books().insert(&scifi).await.unwrap();

        let reader = seed_customer(&db, "reader").await;
        db.reviews()
            .submit(reader.id, emma.id, 4, Some("Witty"))
            .await
            .unwrap();

        let by_genre = db
            .books()
            .search_overview(&BookFilter {
                genre: "science".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_genre.len(), 1);
        assert_eq!(by_genre[0].book.title, "Dune");
        assert_eq!(by_genre[0].review_count, 0);
        assert_eq!(by_genre[0].avg_rating, None);

        let by_year = db
            .books()
            .search_overview(&BookFilter {
                year: Some(1813),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_year.len(), 1);
        assert_eq!(by_year[0].review_count, 1);
        assert_eq!(by_year[0].avg_rating, Some(4.0));
        assert_eq!(by_year[0].total_copies, DEFAULT_STOCK_COPIES);
    }

    #[tokio::test]
    async fn test_details_with_viewer_review() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 3).await;
        let reader = seed_customer(&db, "reader").await;
        db.reviews().submit(reader.id, book.id, 5, None).await.unwrap();

        let details = db.books().details(book.id, Some(reader.id)).await.unwrap().unwrap();
        assert_eq!(details.overview.available_copies, 3);
        assert_eq!(details.overview.review_count, 1);
        assert_eq!(details.user_review.map(|r| r.rating), Some(5));

        let anonymous = db.books().details(book.id, None).await.unwrap().unwrap();
        assert!(anonymous.user_review.is_none());

        assert!(db.books().details(999, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_book_and_counts() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 3).await;

        let mut fields = new_book("Dune (Deluxe)", "Frank Herbert");
        fields.price_buy_cents = 2999;
        let updated = db
            .books()
            .update(
                book.id,
                &BookUpdate {
                    book: fields.clone(),
                    total_copies: 6,
                    available_copies: 5,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Dune (Deluxe)");
        assert_eq!(updated.price_buy_cents, 2999);

        let inv = db.inventory().get(book.id).await.unwrap().unwrap();
        assert_eq!((inv.total_copies, inv.available_copies), (6, 5));

        let err = db
            .books()
            .update(
                book.id,
                &BookUpdate {
                    book: fields.clone(),
                    total_copies: 1,
                    available_copies: 2,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let err = db
            .books()
            .update(
                999,
                &BookUpdate {
                    book: fields,
                    total_copies: 1,
                    available_copies: 1,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
