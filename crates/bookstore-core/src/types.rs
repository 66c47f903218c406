//! # Domain Types
//!
//! Core domain types used throughout the bookstore.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Book       │   │ InventoryRecord │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  book_id        │   │  id             │       │
//! │  │  title, author  │   │  total_copies   │   │  user_id        │       │
//! │  │  price_buy      │   │  available      │   │  total_price    │       │
//! │  │  price_rent     │   └─────────────────┘   │  payment_status │       │
//! │  └─────────────────┘                         └────────┬────────┘       │
//! │           ▲                                           │ owns (cascade) │
//! │           │            ┌─────────────────┐   ┌────────▼────────┐       │
//! │           └────────────│     Rental      │──►│   OrderItem     │       │
//! │                        │  ─────────────  │   │  ─────────────  │       │
//! │                        │  order_item_id? │   │  type buy|rent  │       │
//! │                        │  due_date       │   │  price snapshot │       │
//! │                        │  returned_at?   │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Money Columns
//! Persisted rows carry prices as `*_cents: i64`. Values leaving the Order
//! Engine (the [`Bill`]) use [`Money`].

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Money;
use crate::RENTAL_PERIOD_DAYS;

// =============================================================================
// Acquisition Type
// =============================================================================

/// How a customer acquires a book on an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionType {
    /// Permanent purchase: removes a copy from stock for good.
    Buy,
    /// Loan: takes an available copy until the rental is returned.
    Rent,
}

impl AcquisitionType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AcquisitionType::Buy => "buy",
            AcquisitionType::Rent => "rent",
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Payment state of an order. Orders start `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
        }
    }
}

// =============================================================================
// User Role
// =============================================================================

/// Account role. Managers see the back-office routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Customer,
    Manager,
}

// =============================================================================
// Book
// =============================================================================

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub publication_year: Option<i64>,

    /// Purchase price in cents.
    pub price_buy_cents: i64,

    /// Rental price in cents.
    pub price_rent_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Current unit price for the given acquisition type.
    ///
    /// ## Example
    /// ```rust
    /// use bookstore_core::{AcquisitionType, Book};
    /// use chrono::Utc;
    ///
    /// let book = Book {
    ///     id: 1,
    ///     title: "Dune".into(),
    ///     author: "Frank Herbert".into(),
    ///     genre: None,
    ///     publication_year: None,
    ///     price_buy_cents: 1999,
    ///     price_rent_cents: 399,
    ///     created_at: Utc::now(),
    /// };
    /// assert_eq!(book.price_for(AcquisitionType::Rent).cents(), 399);
    /// ```
    pub fn price_for(&self, acquisition_type: AcquisitionType) -> Money {
        match acquisition_type {
            AcquisitionType::Buy => Money::from_cents(self.price_buy_cents),
            AcquisitionType::Rent => Money::from_cents(self.price_rent_cents),
        }
    }
}

// =============================================================================
// Inventory Record
// =============================================================================

/// Copy counts for one book.
///
/// ## Invariant
/// `0 <= available_copies <= total_copies`
///
/// ```text
///   total_copies ─────────────────────────┐
///   ├── available_copies  (on the shelf)  │
///   └── on_loan           (rented out)    │
///   buy:     total -1, available -1       │
///   rent:    available -1                 │
///   return:  available +1 (never > total) │
///   restock: total +n, available +n ─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryRecord {
    pub book_id: i64,
    pub total_copies: i64,
    pub available_copies: i64,
}

impl InventoryRecord {
    /// Copies currently out on rental.
    pub const fn on_loan(&self) -> i64 {
        self.total_copies - self.available_copies
    }

    /// Checks the counter invariant.
    pub fn check_consistent(&self) -> Result<(), CoreError> {
        if self.available_copies < 0 || self.available_copies > self.total_copies {
            return Err(CoreError::InventoryInvariant {
                book_id: self.book_id,
                total_copies: self.total_copies,
                available_copies: self.available_copies,
            });
        }
        Ok(())
    }

    /// Fails with `OutOfStock` when no copy can be taken.
    pub fn check_available(&self, title: &str) -> Result<(), CoreError> {
        if self.available_copies <= 0 {
            return Err(CoreError::OutOfStock {
                book_id: self.book_id,
                title: title.to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Order & Order Item
// =============================================================================

/// A placed order. Immutable except for `payment_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub total_price_cents: i64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// One line of an order.
///
/// `price_cents` is the unit price at order time; later catalog price
/// changes never touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub book_id: i64,
    #[serde(rename = "type")]
    pub acquisition_type: AcquisitionType,
    pub price_cents: i64,
}

// =============================================================================
// Rental
// =============================================================================

/// A loan of one copy.
///
/// `order_item_id` is `None` for rentals created by a manager.
/// `returned_at` is written exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Rental {
    pub id: i64,
    pub order_item_id: Option<i64>,
    pub user_id: i64,
    pub book_id: i64,
    pub rented_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Rental {
    /// Due date for a rental starting at `rented_at`.
    pub fn due_from(rented_at: DateTime<Utc>) -> DateTime<Utc> {
        rented_at + Duration::days(RENTAL_PERIOD_DAYS)
    }

    /// Due date for a manually entered calendar date (midnight UTC).
    pub fn due_on(date: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
    }

    pub fn is_returned(&self) -> bool {
        self.returned_at.is_some()
    }
}

// =============================================================================
// Review
// =============================================================================

/// A customer's rating of a book. At most one per (user, book).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Review {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub rating: i64,
    pub review_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Account
// =============================================================================

/// A registered user, without credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Bill
// =============================================================================

/// One priced line of a [`Bill`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub book_id: i64,
    pub title: String,
    pub author: String,
    #[serde(rename = "type")]
    pub acquisition_type: AcquisitionType,
    pub price: Money,
}

/// Result of a successful order placement.
///
/// ## JSON Shape
/// ```text
/// {
///   "order_id": 12, "user_id": 3,
///   "items": [{"book_id": 1, "title": "...", "author": "...",
///              "type": "rent", "price": 399}],
///   "total_price": 399,
///   "payment_status": "Pending"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub order_id: i64,
    pub user_id: i64,
    pub items: Vec<BillItem>,
    pub total_price: Money,
    pub payment_status: PaymentStatus,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Book {
        Book {
            id: 1,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: Some("Science Fiction".to_string()),
            publication_year: Some(1965),
            price_buy_cents: 1999,
            price_rent_cents: 399,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_for_acquisition_type() {
        let b = book();
        assert_eq!(b.price_for(AcquisitionType::Buy), Money::from_cents(1999));
        assert_eq!(b.price_for(AcquisitionType::Rent), Money::from_cents(399));
    }

    #[test]
    fn test_inventory_checks() {
        let inv = InventoryRecord {
            book_id: 1,
            total_copies: 3,
            available_copies: 0,
        };
        assert_eq!(inv.on_loan(), 3);
        assert!(inv.check_consistent().is_ok());
        assert!(matches!(
            inv.check_available("Dune"),
            Err(CoreError::OutOfStock { book_id: 1, .. })
        ));

        let broken = InventoryRecord {
            book_id: 1,
            total_copies: 3,
            available_copies: 4,
        };
        assert!(matches!(
            broken.check_consistent(),
            Err(CoreError::InventoryInvariant { .. })
        ));
    }

    #[test]
    fn test_rental_due_dates() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        let due = Rental::due_from(start);
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap());

        let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        assert_eq!(
            Rental::due_on(date),
            Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&AcquisitionType::Rent).unwrap(),
            "\"rent\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Pending).unwrap(),
            "\"Pending\""
        );
        assert_eq!(serde_json::to_string(&UserRole::Manager).unwrap(), "\"manager\"");
    }

    #[test]
    fn test_bill_serialization() {
        let bill = Bill {
            order_id: 12,
            user_id: 3,
            items: vec![BillItem {
                book_id: 1,
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                acquisition_type: AcquisitionType::Rent,
                price: Money::from_cents(399),
            }],
            total_price: Money::from_cents(399),
            payment_status: PaymentStatus::Pending,
        };

        let json = serde_json::to_value(&bill).unwrap();
        assert_eq!(json["items"][0]["type"], "rent");
        assert_eq!(json["items"][0]["price"], 399);
        assert_eq!(json["total_price"], 399);
        assert_eq!(json["payment_status"], "Pending");
    }
}
