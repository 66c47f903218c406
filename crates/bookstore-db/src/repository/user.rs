//! # User Repository
//!
//! Accounts, credential checks, and customer-facing lookups.
//!
//! ## Credential Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register("alice", "alice@example.com", "pw")                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Argon2 (random salt) → "$argon2id$v=19$m=...$salt$hash"               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  users.password_hash  (plain password never stored)                    │
//! │                                                                         │
//! │  authenticate("alice", "pw")                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load hash by username → verify → Some(Account) | None                  │
//! │  (unknown user and wrong password both give None)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::rental::{RentalRepository, RentalView};
use crate::repository::review::{CustomerReview, ReviewRepository};
use bookstore_core::validation::{validate_email, validate_password, validate_username};
use bookstore_core::{Account, CoreError, PaymentStatus, UserRole};

// =============================================================================
// Views
// =============================================================================

/// A bought book from one of the customer's orders.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Purchase {
    pub order_id: i64,
    pub book_id: i64,
    pub title: String,
    pub author: String,
    pub price_cents: i64,
    pub payment_status: PaymentStatus,
    pub ordered_at: DateTime<Utc>,
}

/// Everything a customer has done with the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerHistory {
    pub purchases: Vec<Purchase>,
    pub current_rentals: Vec<RentalView>,
    pub past_rentals: Vec<RentalView>,
    pub reviews: Vec<CustomerReview>,
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    account: Account,
    password_hash: String,
}

// =============================================================================
// Password Hashing
// =============================================================================

fn hash_password(password: &str) -> DbResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Argon2 is CPU-bound and runs on the blocking pool.
async fn hash_password_blocking(password: &str) -> DbResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| DbError::Internal(format!("Password hashing task failed: {}", e)))?
}

async fn verify_password_blocking(password: &str, hash: String) -> DbResult<bool> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| DbError::Internal(format!("Password verification task failed: {}", e)))
}

// =============================================================================
// User Repository
// =============================================================================

/// Repository for account database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers a customer account.
    ///
    /// ## Returns
    /// * `Ok(Account)` - New customer
    /// * `Err(UniqueViolation)` - Username or email already taken
    /// * `Err(Validation)` - Missing field or malformed email
    pub async fn register(&self, username: &str, email: &str, password: &str) -> DbResult<Account> {
        self.register_with_role(username, email, password, UserRole::Customer)
            .await
    }

    /// Registers an account with an explicit role (seed tool, tests).
    pub async fn register_with_role(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> DbResult<Account> {
        validate_username(username).map_err(CoreError::from)?;
        validate_email(email).map_err(CoreError::from)?;
        validate_password(password).map_err(CoreError::from)?;

        let username = username.trim();
        let email = email.trim();

        debug!(username = %username, ?role, "Registering account");

        let taken: Option<(String, String)> = sqlx::query_as(
            "SELECT username, email FROM users WHERE username = ?1 OR email = ?2 LIMIT 1",
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        if let Some((existing_username, _)) = taken {
            return Err(if existing_username == username {
                DbError::duplicate("username", username)
            } else {
                DbError::duplicate("email", email)
            });
        }

        let password_hash = hash_password_blocking(password).await?;

        let account = sqlx::query_as::<_, Account>(
            "INSERT INTO users (username, email, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, username, email, role, created_at",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(user_id = account.id, username = %account.username, "Account registered");
        Ok(account)
    }

    /// Checks a username/password pair.
    ///
    /// ## Returns
    /// `Some(Account)` on a match, `None` for an unknown user or a wrong
    /// password.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<Account>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, username, email, role, created_at, password_hash
             FROM users WHERE username = ?1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        let mut account = None;
        if let Some(row) = row {
            if verify_password_blocking(password, row.password_hash).await? {
                account = Some(row.account);
            }
        }

        debug!(username = %username.trim(), ok = account.is_some(), "Authentication attempt");
        Ok(account)
    }

    /// Gets any account by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, username, email, role, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Gets a customer account by ID (managers are not returned).
    pub async fn get_customer(&self, id: i64) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, username, email, role, created_at
             FROM users WHERE id = ?1 AND role = 'customer'",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Searches customers by username or email substring, newest first.
    pub async fn search_customers(&self, keyword: &str) -> DbResult<Vec<Account>> {
        let keyword = keyword.trim();

        let customers = sqlx::query_as::<_, Account>(
            "SELECT id, username, email, role, created_at
             FROM users
             WHERE role = 'customer'
               AND (?1 = '' OR username LIKE ?2 OR email LIKE ?2)
             ORDER BY created_at DESC, id DESC",
        )
        .bind(keyword)
        .bind(format!("%{keyword}%"))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Collects a customer's purchases, rentals and reviews.
    pub async fn history(&self, user_id: i64) -> DbResult<CustomerHistory> {
        if self.get_by_id(user_id).await?.is_none() {
            return Err(DbError::not_found("User", user_id));
        }

        let purchases = sqlx::query_as::<_, Purchase>(
            "SELECT o.id AS order_id, oi.book_id, b.title, b.author, oi.price_cents,
                    o.payment_status, o.created_at AS ordered_at
             FROM order_items oi
             JOIN orders o ON o.id = oi.order_id
             JOIN books b ON b.id = oi.book_id
             WHERE o.user_id = ?1 AND oi.acquisition_type = 'buy'
             ORDER BY o.created_at DESC, oi.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let (past_rentals, current_rentals): (Vec<_>, Vec<_>) =
            RentalRepository::new(self.pool.clone())
                .list_for_customer(user_id)
                .await?
                .into_iter()
                .partition(|r| r.rental.is_returned());

        let reviews = ReviewRepository::new(self.pool.clone())
            .list_for_customer(user_id)
            .await?;

        Ok(CustomerHistory {
            purchases,
            current_rentals,
            past_rentals,
            reviews,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{seed_book, seed_customer, test_db};
    use bookstore_core::{AcquisitionType, OrderLine};

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_password_hashing_on_blocking_pool() {
        let hash = hash_password_blocking("tr0ub4dor").await.unwrap();
        assert!(verify_password_blocking("tr0ub4dor", hash.clone()).await.unwrap());
        assert!(!verify_password_blocking("tr0ub4dor&3", hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let db = test_db().await;
        let account = db
            .users()
            .register("alice", "alice@example.com", "s3cret")
            .await
            .unwrap();
        assert_eq!(account.role, UserRole::Customer);

        let ok = db.users().authenticate("alice", "s3cret").await.unwrap();
        assert_eq!(ok.map(|a| a.id), Some(account.id));

        assert!(db.users().authenticate("alice", "nope").await.unwrap().is_none());
        assert!(db.users().authenticate("nobody", "s3cret").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let db = test_db().await;
        seed_customer(&db, "alice").await;

        let err = db
            .users()
            .register("alice", "other@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "username"));

        let err = db
            .users()
            .register("alice2", "alice@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_register_requires_fields() {
        let db = test_db().await;
        assert!(db.users().register("", "a@b.c", "pw").await.is_err());
        assert!(db.users().register("bob", "", "pw").await.is_err());
        assert!(db.users().register("bob", "b@example.com", "").await.is_err());
    }

    #[tokio::test]
    async fn test_customer_lookups_exclude_managers() {
        let db = test_db().await;
        let manager = db
            .users()
            .register_with_role("boss", "boss@example.com", "pw", UserRole::Manager)
            .await
            .unwrap();
        let customer = seed_customer(&db, "carol").await;

        assert!(db.users().get_customer(manager.id).await.unwrap().is_none());
        assert!(db.users().get_customer(customer.id).await.unwrap().is_some());

        let found = db.users().search_customers("").await.unwrap();
        assert_eq!(found.len(), 1);
        let found = db.users().search_customers("example").await.unwrap();
        assert_eq!(found[0].username, "carol");
        assert!(db.users().search_customers("zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_groups_activity() {
        let db = test_db().await;
        let customer = seed_customer(&db, "dana").await;
        let bought = seed_book(&db, "Bought", 3).await;
        let rented = seed_book(&db, "Rented", 3).await;

        db.orders()
            .place_order(
                customer.id,
                &[
                    OrderLine::new(bought.id, AcquisitionType::Buy),
                    OrderLine::new(rented.id, AcquisitionType::Rent),
                    OrderLine::new(rented.id, AcquisitionType::Rent),
                ],
            )
            .await
            .unwrap();
        let rentals = db.rentals().list_for_customer(customer.id).await.unwrap();
        db.rentals().mark_returned(rentals[0].rental.id).await.unwrap();
        db.reviews()
            .submit(customer.id, bought.id, 5, Some("Great"))
            .await
            .unwrap();

        let history = db.users().history(customer.id).await.unwrap();
        assert_eq!(history.purchases.len(), 1);
        assert_eq!(history.purchases[0].title, "Bought");
        assert_eq!(history.current_rentals.len(), 1);
        assert_eq!(history.past_rentals.len(), 1);
        assert_eq!(history.reviews.len(), 1);

        assert!(db.users().history(4242).await.unwrap_err().is_not_found());
    }
}
