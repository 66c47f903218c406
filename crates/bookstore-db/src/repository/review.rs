//! # Review Repository
//!
//! Review upsert keyed by (user, book) and review listings.
//!
//! A second submission for the same pair replaces rating, text and
//! timestamp in place. No history is kept.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use bookstore_core::validation::{validate_rating, validate_review_text};
use bookstore_core::{CoreError, Review};

/// A review joined with its author's username.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct BookReview {
    pub id: i64,
    pub rating: i64,
    pub review_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub username: String,
}

/// A customer's review joined with the reviewed book's title.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CustomerReview {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub review: Review,
    pub title: String,
}

/// Repository for review database operations.
#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    /// Creates a new ReviewRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReviewRepository { pool }
    }

    /// Inserts or replaces the caller's review of a book.
    ///
    /// ## Arguments
    /// * `user_id` - Reviewer
    /// * `book_id` - Reviewed book
    /// * `rating` - Integer 1 to 5
    /// * `text` - Optional review body
    ///
    /// ## Returns
    /// The stored review. Unknown book → `BookNotFound`.
    pub async fn submit(
        &self,
        user_id: i64,
        book_id: i64,
        rating: i64,
        text: Option<&str>,
    ) -> DbResult<Review> {
        validate_rating(rating).map_err(CoreError::from)?;
        validate_review_text(text).map_err(CoreError::from)?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = ?1")
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(CoreError::BookNotFound(book_id).into());
        }

        debug!(user_id, book_id, rating, "Submitting review");

        let review = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (user_id, book_id, rating, review_text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, book_id) DO UPDATE SET
                 rating = excluded.rating,
                 review_text = excluded.review_text,
                 created_at = excluded.created_at
             RETURNING id, user_id, book_id, rating, review_text, created_at",
        )
        .bind(user_id)
        .bind(book_id)
        .bind(rating)
        .bind(text.map(str::trim))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(review_id = review.id, user_id, book_id, "Review stored");
        Ok(review)
    }

    /// Gets one user's review of a book.
    pub async fn get_for_user(&self, user_id: i64, book_id: i64) -> DbResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(
            "SELECT id, user_id, book_id, rating, review_text, created_at
             FROM reviews WHERE user_id = ?1 AND book_id = ?2",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    /// Lists a book's reviews with reviewer usernames, newest first.
    pub async fn list_for_book(&self, book_id: i64) -> DbResult<Vec<BookReview>> {
        let reviews = sqlx::query_as::<_, BookReview>(
            "SELECT r.id, r.rating, r.review_text, r.created_at, u.username
             FROM reviews r
             JOIN users u ON u.id = r.user_id
             WHERE r.book_id = ?1
             ORDER BY r.created_at DESC, r.id DESC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    /// Lists a customer's reviews with book titles, newest first.
    pub async fn list_for_customer(&self, user_id: i64) -> DbResult<Vec<CustomerReview>> {
        let reviews = sqlx::query_as::<_, CustomerReview>(
            "SELECT r.id, r.user_id, r.book_id, r.rating, r.review_text, r.created_at, b.title
             FROM reviews r
             JOIN books b ON b.id = r.book_id
             WHERE r.user_id = ?1
             ORDER BY r.created_at DESC, r.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::test_support::{seed_book, seed_customer, test_db};

    #[tokio::test]
    async fn test_second_submission_replaces_first() {
        let db = test_db().await;
        let reader = seed_customer(&db, "reader").await;
        let book = seed_book(&db, "Dune", 1).await;

        let first = db
            .reviews()
            .submit(reader.id, book.id, 2, Some("Slow start"))
            .await
            .unwrap();
        let second = db
            .reviews()
            .submit(reader.id, book.id, 5, Some("Masterpiece"))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let reviews = db.reviews().list_for_book(book.id).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].rating, 5);
        assert_eq!(reviews[0].review_text.as_deref(), Some("Masterpiece"));
        assert_eq!(reviews[0].username, "reader");
    }

    #[tokio::test]
    async fn test_rating_out_of_range() {
        let db = test_db().await;
        let reader = seed_customer(&db, "reader").await;
        let book = seed_book(&db, "Dune", 1).await;

        for rating in [0, 6] {
            let err = db
                .reviews()
                .submit(reader.id, book.id, rating, None)
                .await
                .unwrap_err();
            assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        }
        assert!(db.reviews().get_for_user(reader.id, book.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_review_unknown_book() {
        let db = test_db().await;
        let reader = seed_customer(&db, "reader").await;
        let err = db.reviews().submit(reader.id, 31, 3, None).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::BookNotFound(31))));
    }

    #[tokio::test]
    async fn test_customer_reviews_carry_titles() {
        let db = test_db().await;
        let reader = seed_customer(&db, "reader").await;
        let other = seed_customer(&db, "other").await;
        let book = seed_book(&db, "Dune", 1).await;

        db.reviews().submit(reader.id, book.id, 4, None).await.unwrap();
        db.reviews().submit(other.id, book.id, 1, None).await.unwrap();

        let mine = db.reviews().list_for_customer(reader.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "Dune");
        assert_eq!(mine[0].review.rating, 4);
        assert_eq!(db.reviews().list_for_book(book.id).await.unwrap().len(), 2);
    }
}
