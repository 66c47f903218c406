//! # Validation Module
//!
//! Input validation for everything that crosses the HTTP boundary.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request body (serde)                                         │
//! │  ├── Types and enum values ("buy" | "rent")                            │
//! │  └── Missing fields                                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required strings, lengths, ranges                                 │
//! │  └── Inventory count relationships                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on counters and ratings                         │
//! │  └── UNIQUE (user_id, book_id) on reviews                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bookstore_core::validation::{validate_rating, validate_title};
//!
//! assert!(validate_title("Dune").is_ok());
//! assert!(validate_rating(6).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_ORDER_LINES, MAX_RATING, MIN_RATING};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_TITLE_LEN: usize = 255;
const MAX_AUTHOR_LEN: usize = 255;
const MAX_USERNAME_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 254;
const MAX_REVIEW_LEN: usize = 2000;
const MAX_SEARCH_LEN: usize = 100;

/// $1,000,000.00
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

fn required<'a>(field: &str, value: &'a str) -> ValidationResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(value)
}

fn max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a book title.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - At most 255 characters
pub fn validate_title(title: &str) -> ValidationResult<()> {
    let title = required("title", title)?;
    max_len("title", title, MAX_TITLE_LEN)
}

/// Validates an author name. Same rules as the title.
pub fn validate_author(author: &str) -> ValidationResult<()> {
    let author = required("author", author)?;
    max_len("author", author, MAX_AUTHOR_LEN)
}

/// Validates a price in cents. Zero is allowed (free titles).
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Validates an optional publication year.
pub fn validate_publication_year(year: Option<i64>) -> ValidationResult<()> {
    match year {
        Some(y) if !(0..=9999).contains(&y) => Err(ValidationError::OutOfRange {
            field: "publication_year".to_string(),
            min: 0,
            max: 9999,
        }),
        _ => Ok(()),
    }
}

/// Validates manager-entered inventory counts.
///
/// ## Rules
/// - Both counts non-negative
/// - `total_copies >= available_copies`
///
/// ## Example
/// ```rust
/// use bookstore_core::validation::validate_inventory_counts;
///
/// assert!(validate_inventory_counts(5, 3).is_ok());
/// assert!(validate_inventory_counts(3, 5).is_err());
/// assert!(validate_inventory_counts(-1, 0).is_err());
/// ```
pub fn validate_inventory_counts(total_copies: i64, available_copies: i64) -> ValidationResult<()> {
    if total_copies < 0 {
        return Err(ValidationError::OutOfRange {
            field: "total_copies".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    if available_copies < 0 || available_copies > total_copies {
        return Err(ValidationError::OutOfRange {
            field: "available_copies".to_string(),
            min: 0,
            max: total_copies,
        });
    }
    Ok(())
}

/// Validates a restock increment.
pub fn validate_restock_increment(increment: i64) -> ValidationResult<()> {
    if increment <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "increment".to_string(),
        });
    }
    Ok(())
}

/// Validates a search keyword. Empty is allowed and means "everything".
pub fn validate_search_query(query: &str) -> ValidationResult<()> {
    max_len("q", query.trim(), MAX_SEARCH_LEN)
}

// =============================================================================
// Review Validators
// =============================================================================

/// Validates a review rating (integer 1 to 5).
pub fn validate_rating(rating: i64) -> ValidationResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: MIN_RATING,
            max: MAX_RATING,
        });
    }
    Ok(())
}

/// Validates optional review text.
pub fn validate_review_text(text: Option<&str>) -> ValidationResult<()> {
    match text {
        Some(t) => max_len("review_text", t, MAX_REVIEW_LEN),
        None => Ok(()),
    }
}

// =============================================================================
// Order Validators
// =============================================================================

/// Validates the number of lines in an order.
///
/// ## Rules
/// - At least one line
/// - At most `MAX_ORDER_LINES`
pub fn validate_order_size(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }
    if lines > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Account Validators
// =============================================================================

/// Validates a username.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = required("username", username)?;
    max_len("username", username, MAX_USERNAME_LEN)
}

/// Validates an email address.
///
/// Only a shape check: one `@` with text on both sides.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = required("email", email)?;
    max_len("email", email, MAX_EMAIL_LEN)?;

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected name@domain".to_string(),
        }),
    }
}

/// Validates a password. Only presence is enforced.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    Ok(())
}

/// Parses a payment status sent by a manager.
pub fn parse_payment_status(value: &str) -> ValidationResult<crate::PaymentStatus> {
    match value {
        "Pending" => Ok(crate::PaymentStatus::Pending),
        "Paid" => Ok(crate::PaymentStatus::Paid),
        _ => Err(ValidationError::NotAllowed {
            field: "payment_status".to_string(),
            allowed: vec!["Paid".to_string(), "Pending".to_string()],
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PaymentStatus;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Dune").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price_cents("price_buy", 0).is_ok());
        assert!(validate_price_cents("price_buy", 1999).is_ok());
        assert!(validate_price_cents("price_buy", -1).is_err());
        assert!(validate_price_cents("price_buy", MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents("price_buy", MAX_PRICE_CENTS + 1).is_err());
        assert!(validate_price_cents("price_buy", i64::MAX / 2 + 1).is_err());
    }

    #[test]
    fn test_validate_inventory_counts() {
        assert!(validate_inventory_counts(0, 0).is_ok());
        assert!(validate_inventory_counts(10, 10).is_ok());
        assert!(validate_inventory_counts(10, 11).is_err());
        assert!(validate_inventory_counts(10, -1).is_err());
    }

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_validate_order_size() {
        assert!(validate_order_size(1).is_ok());
        assert!(matches!(
            validate_order_size(0),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_order_size(MAX_ORDER_LINES + 1).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("reader@example.com").is_ok());
        assert!(validate_email("reader").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn test_account_fields_required() {
        assert!(validate_username("").is_err());
        assert!(validate_password("").is_err());
        assert!(validate_password("secret").is_ok());
    }

    #[test]
    fn test_parse_payment_status() {
        assert_eq!(parse_payment_status("Paid").unwrap(), PaymentStatus::Paid);
        assert_eq!(
            parse_payment_status("Pending").unwrap(),
            PaymentStatus::Pending
        );
        assert!(parse_payment_status("Refunded").is_err());
    }
}
