//! # Order Pricing
//!
//! Pure part of the Order Engine: validates the cart and prices it against
//! current catalog rows. Stock checks and writes live in `bookstore-db`.
//!
//! ## Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  lines: [(1, buy), (2, rent), (1, rent)]                                │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  distinct_book_ids → {1, 2}  ──► catalog lookup (db)                    │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  price_order(lines, catalog)                                            │
//! │    (1, buy)  → price_buy  of book 1                                     │
//! │    (2, rent) → price_rent of book 2                                     │
//! │    (1, rent) → price_rent of book 1                                     │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  PricedOrder { lines (submission order), total }                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{AcquisitionType, BillItem, Book};
use crate::validation::validate_order_size;

/// One requested line of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub book_id: i64,
    #[serde(rename = "type")]
    pub acquisition_type: AcquisitionType,
}

impl OrderLine {
    pub const fn new(book_id: i64, acquisition_type: AcquisitionType) -> Self {
        OrderLine {
            book_id,
            acquisition_type,
        }
    }
}

/// A cart priced against the catalog, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder {
    /// One entry per requested line, in submission order.
    pub lines: Vec<BillItem>,
    pub total: Money,
}

/// Distinct book ids referenced by the cart, in first-seen order.
pub fn distinct_book_ids(lines: &[OrderLine]) -> Vec<i64> {
    let mut ids: Vec<i64> = Vec::with_capacity(lines.len());
    for line in lines {
        if !ids.contains(&line.book_id) {
            ids.push(line.book_id);
        }
    }
    ids
}

/// Prices a cart.
///
/// ## Arguments
/// * `lines` - Requested lines, in submission order
/// * `catalog` - Current book rows keyed by id
///
/// ## Returns
/// Priced lines and the total, or `BookNotFound` naming the first missing
/// id. An empty or oversized cart fails validation, as does a total that
/// does not fit in an `i64` of cents.
pub fn price_order(lines: &[OrderLine], catalog: &HashMap<i64, Book>) -> CoreResult<PricedOrder> {
    validate_order_size(lines.len())?;

    let mut priced = Vec::with_capacity(lines.len());
    let mut total = Money::zero();

    for line in lines {
        let book = catalog
            .get(&line.book_id)
            .ok_or(CoreError::BookNotFound(line.book_id))?;

        let price = book.price_for(line.acquisition_type);
        total = total
            .checked_add(price)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "total_price".to_string(),
                min: 0,
                max: i64::MAX,
            })?;

        priced.push(BillItem {
            book_id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            acquisition_type: line.acquisition_type,
            price,
        });
    }

    Ok(PricedOrder {
        lines: priced,
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn catalog() -> HashMap<i64, Book> {
        let mut books = HashMap::new();
        for (id, title, buy, rent) in [(1, "Dune", 1999, 399), (2, "Emma", 899, 199)] {
            books.insert(
                id,
                Book {
                    id,
                    title: title.to_string(),
                    author: "Author".to_string(),
                    genre: None,
                    publication_year: None,
                    price_buy_cents: buy,
                    price_rent_cents: rent,
                    created_at: Utc::now(),
                },
            );
        }
        books
    }

    #[test]
    fn test_price_mixed_cart() {
        let lines = [
            OrderLine::new(1, AcquisitionType::Buy),
            OrderLine::new(2, AcquisitionType::Rent),
            OrderLine::new(1, AcquisitionType::Rent),
        ];
        let priced = price_order(&lines, &catalog()).unwrap();

        assert_eq!(priced.lines.len(), 3);
        assert_eq!(priced.lines[0].price.cents(), 1999);
        assert_eq!(priced.lines[1].price.cents(), 199);
        assert_eq!(priced.lines[2].price.cents(), 399);
        assert_eq!(priced.lines[2].title, "Dune");
        assert_eq!(priced.total.cents(), 1999 + 199 + 399);
    }

    #[test]
    fn test_price_total_overflow_is_rejected() {
        let mut books = catalog();
        if let Some(book) = books.get_mut(&1) {
            book.price_buy_cents = i64::MAX / 2 + 1;
        }
        let lines = [
            OrderLine::new(1, AcquisitionType::Buy),
            OrderLine::new(1, AcquisitionType::Buy),
        ];

        let err = price_order(&lines, &books).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "total_price"
        ));
    }

    #[test]
    fn test_price_unknown_book() {
        let lines = [
            OrderLine::new(1, AcquisitionType::Buy),
            OrderLine::new(42, AcquisitionType::Rent),
        ];
        let err = price_order(&lines, &catalog()).unwrap_err();
        assert!(matches!(err, CoreError::BookNotFound(42)));
    }

    #[test]
    fn test_price_empty_cart() {
        let err = price_order(&[], &catalog()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_distinct_book_ids_keeps_first_seen_order() {
        let lines = [
            OrderLine::new(2, AcquisitionType::Rent),
            OrderLine::new(1, AcquisitionType::Buy),
            OrderLine::new(2, AcquisitionType::Rent),
        ];
        assert_eq!(distinct_book_ids(&lines), vec![2, 1]);
    }

    #[test]
    fn test_order_line_wire_shape() {
        let line: OrderLine = serde_json::from_str(r#"{"book_id": 3, "type": "rent"}"#).unwrap();
        assert_eq!(line, OrderLine::new(3, AcquisitionType::Rent));

        let bad = serde_json::from_str::<OrderLine>(r#"{"book_id": 3, "type": "lend"}"#);
        assert!(bad.is_err());
    }
}
