//! # Order Repository
//!
//! The Order Engine plus manager views over orders.
//!
//! ## place_order Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Order Placement                                     │
//! │                                                                         │
//! │  Outside the transaction (pool reads)                                  │
//! │  ├── buyer exists?                                   → NotFound         │
//! │  ├── catalog rows for distinct book ids              → BookNotFound     │
//! │  └── price_order(): per-line unit price + total                         │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │  ├── INSERT orders (Pending, total)     ← first write: takes write lock │
//! │  ├── for each line, in submission order:                                │
//! │  │     INSERT order_items (price snapshot)                              │
//! │  │     read inventory, available <= 0   → OutOfStock (ROLLBACK all)    │
//! │  │     rent: available -1, INSERT rentals (due = now + 14 days)        │
//! │  │     buy:  total -1, available -1                                     │
//! │  └── COMMIT                                                             │
//! │                                                                         │
//! │  → Bill { order_id, user_id, items, total_price, payment_status }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error between BEGIN and COMMIT drops the transaction, which rolls
//! back the order row, its items, its rentals and every counter change.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::book::BookRepository;
use crate::repository::inventory::take_copy;
use bookstore_core::order::distinct_book_ids;
use bookstore_core::{
    price_order, AcquisitionType, Bill, CoreError, Order, OrderItem, OrderLine, PaymentStatus,
    PricedOrder, Rental,
};

// =============================================================================
// Views
// =============================================================================

/// An order line joined with its book, as listed to managers.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct OrderLineView {
    #[serde(skip)]
    pub order_id: i64,
    pub book_id: i64,
    pub title: String,
    pub author: String,
    #[serde(rename = "type")]
    pub acquisition_type: AcquisitionType,
    pub price_cents: i64,
}

/// An order with its buyer's username and its lines.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub order: Order,
    pub customer_username: String,
    #[sqlx(skip)]
    pub items: Vec<OrderLineView>,
}

// =============================================================================
// Order Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Places an order: prices the cart, takes stock, creates rentals.
    ///
    /// ## Arguments
    /// * `user_id` - Buyer
    /// * `lines` - Requested (book, buy|rent) lines in submission order
    ///
    /// ## Returns
    /// * `Ok(Bill)` - Everything committed; status `Pending`
    /// * `Err(NotFound)` - Unknown buyer or book
    /// * `Err(OutOfStock)` - Some line found no available copy; nothing written
    /// * `Err(Validation)` - Empty or oversized cart
    pub async fn place_order(&self, user_id: i64, lines: &[OrderLine]) -> DbResult<Bill> {
        debug!(user_id, lines = lines.len(), "Placing order");

        let buyer: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        if buyer.is_none() {
            return Err(DbError::not_found("User", user_id));
        }

        let catalog = BookRepository::new(self.pool.clone())
            .get_many(&distinct_book_ids(lines))
            .await?;
        let priced = price_order(lines, &catalog)?;

        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let order_id = match write_order(&mut tx, user_id, &priced, now).await {
            Ok(id) => id,
            Err(err) => {
                warn!(user_id, error = %err, "Order rolled back");
                return Err(err);
            }
        };

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id,
            user_id,
            total_cents = priced.total.cents(),
            lines = priced.lines.len(),
            "Order placed"
        );

        Ok(Bill {
            order_id,
            user_id,
            items: priced.lines,
            total_price: priced.total,
            payment_status: PaymentStatus::Pending,
        })
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, order_id: i64) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT id, user_id, total_price_cents, payment_status, created_at
             FROM orders WHERE id = ?1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets the stored lines of an order.
    pub async fn get_items(&self, order_id: i64) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, book_id, acquisition_type, price_cents
             FROM order_items WHERE order_id = ?1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists every order with buyer username and lines, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<OrderSummary>> {
        let mut orders = sqlx::query_as::<_, OrderSummary>(
            "SELECT o.id, o.user_id, o.total_price_cents, o.payment_status, o.created_at,
                    u.username AS customer_username
             FROM orders o
             JOIN users u ON u.id = o.user_id
             ORDER BY o.created_at DESC, o.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let lines = sqlx::query_as::<_, OrderLineView>(
            "SELECT oi.order_id, oi.book_id, b.title, b.author,
                    oi.acquisition_type, oi.price_cents
             FROM order_items oi
             JOIN books b ON b.id = oi.book_id
             ORDER BY oi.order_id, oi.id",
        )
        .fetch_all(&self.pool)
        .await?;

        for line in lines {
            if let Some(order) = orders.iter_mut().find(|o| o.order.id == line.order_id) {
                order.items.push(line);
            }
        }

        debug!(count = orders.len(), "Listed orders");
        Ok(orders)
    }

    /// Lists one customer's orders, newest first.
    pub async fn list_for_customer(&self, user_id: i64) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT id, user_id, total_price_cents, payment_status, created_at
             FROM orders WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Sets an order's payment status.
    pub async fn update_payment_status(&self, order_id: i64, status: PaymentStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE orders SET payment_status = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::OrderNotFound(order_id).into());
        }

        info!(order_id, status = status.as_str(), "Payment status updated");
        Ok(())
    }
}

/// Writes the order, its lines, rentals and counter changes on `conn`.
async fn write_order(
    conn: &mut SqliteConnection,
    user_id: i64,
    priced: &PricedOrder,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    let order_id = sqlx::query(
        "INSERT INTO orders (user_id, total_price_cents, payment_status, created_at)
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(user_id)
    .bind(priced.total.cents())
    .bind(PaymentStatus::Pending)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for line in &priced.lines {
        let order_item_id = sqlx::query(
            "INSERT INTO order_items (order_id, book_id, acquisition_type, price_cents)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(order_id)
        .bind(line.book_id)
        .bind(line.acquisition_type)
        .bind(line.price.cents())
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        take_copy(conn, line.book_id, &line.title, line.acquisition_type).await?;

        if line.acquisition_type == AcquisitionType::Rent {
            sqlx::query(
                "INSERT INTO rentals (order_item_id, user_id, book_id, rented_at, due_date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(order_item_id)
            .bind(user_id)
            .bind(line.book_id)
            .bind(now)
            .bind(Rental::due_from(now))
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(order_id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::book::{BookUpdate, NewBook};
    use crate::repository::test_support::{seed_book, seed_customer, test_db};
    use crate::Database;
    use chrono::Duration;

    async fn row_count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_two_rent_lines_one_copy_rolls_back() {
        let db = test_db().await;
        let buyer = seed_customer(&db, "alice").await;
        let book = seed_book(&db, "Dune", 1).await;

        let lines = [
            OrderLine::new(book.id, AcquisitionType::Rent),
            OrderLine::new(book.id, AcquisitionType::Rent),
        ];
        let err = db.orders().place_order(buyer.id, &lines).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::OutOfStock { book_id, .. }) if book_id == book.id
        ));

        let inv = db.inventory().get(book.id).await.unwrap().unwrap();
        assert_eq!(inv.available_copies, 1);
        assert_eq!(row_count(&db, "orders").await, 0);
        assert_eq!(row_count(&db, "order_items").await, 0);
        assert_eq!(row_count(&db, "rentals").await, 0);
    }

    #[tokio::test]
    async fn test_buy_reduces_total_and_available() {
        let db = test_db().await;
        let buyer = seed_customer(&db, "bob").await;
        let book = seed_book(&db, "Emma", 5).await;

        let bill = db
            .orders()
            .place_order(buyer.id, &[OrderLine::new(book.id, AcquisitionType::Buy)])
            .await
            .unwrap();

        assert_eq!(bill.total_price.cents(), book.price_buy_cents);
        assert_eq!(bill.payment_status, PaymentStatus::Pending);
        assert_eq!(bill.items.len(), 1);
        assert_eq!(bill.items[0].title, "Emma");

        let inv = db.inventory().get(book.id).await.unwrap().unwrap();
        assert_eq!((inv.total_copies, inv.available_copies), (4, 4));
        assert_eq!(row_count(&db, "rentals").await, 0);
    }

    #[tokio::test]
    async fn test_rent_creates_rental_due_in_fourteen_days() {
        let db = test_db().await;
        let buyer = seed_customer(&db, "carol").await;
        let book = seed_book(&db, "Solaris", 3).await;

        let bill = db
            .orders()
            .place_order(buyer.id, &[OrderLine::new(book.id, AcquisitionType::Rent)])
            .await
            .unwrap();
        assert_eq!(bill.total_price.cents(), book.price_rent_cents);

        let inv = db.inventory().get(book.id).await.unwrap().unwrap();
        assert_eq!((inv.total_copies, inv.available_copies), (3, 2));

        let rentals = db.rentals().list_for_customer(buyer.id).await.unwrap();
        assert_eq!(rentals.len(), 1);
        let rental = &rentals[0].rental;
        assert_eq!(rental.due_date - rental.rented_at, Duration::days(14));
        assert!(rental.returned_at.is_none());

        let items = db.orders().get_items(bill.order_id).await.unwrap();
        assert_eq!(rental.order_item_id, Some(items[0].id));
    }

    #[tokio::test]
    async fn test_later_line_shortage_discards_earlier_lines() {
        let db = test_db().await;
        let buyer = seed_customer(&db, "dave").await;
        let plenty = seed_book(&db, "Plenty", 5).await;
        let scarce = seed_book(&db, "Scarce", 0).await;

        let lines = [
            OrderLine::new(plenty.id, AcquisitionType::Buy),
            OrderLine::new(plenty.id, AcquisitionType::Rent),
            OrderLine::new(scarce.id, AcquisitionType::Buy),
        ];
        assert!(db.orders().place_order(buyer.id, &lines).await.is_err());

        let inv = db.inventory().get(plenty.id).await.unwrap().unwrap();
        assert_eq!((inv.total_copies, inv.available_copies), (5, 5));
        assert_eq!(row_count(&db, "orders").await, 0);
        assert_eq!(row_count(&db, "rentals").await, 0);
    }

    #[tokio::test]
    async fn test_unknown_book_and_buyer() {
        let db = test_db().await;
        let buyer = seed_customer(&db, "erin").await;
        let book = seed_book(&db, "Dune", 2).await;

        let err = db
            .orders()
            .place_order(buyer.id, &[OrderLine::new(404, AcquisitionType::Buy)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::BookNotFound(404))));

        let err = db
            .orders()
            .place_order(9999, &[OrderLine::new(book.id, AcquisitionType::Buy)])
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = db.orders().place_order(buyer.id, &[]).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_price_snapshot_survives_catalog_change() {
        let db = test_db().await;
        let buyer = seed_customer(&db, "frank").await;
        let book = seed_book(&db, "Dune", 5).await;

        let bill = db
            .orders()
            .place_order(buyer.id, &[OrderLine::new(book.id, AcquisitionType::Buy)])
            .await
            .unwrap();

        db.books()
            .update(
                book.id,
                &BookUpdate {
                    book: NewBook {
                        title: book.title.clone(),
                        author: book.author.clone(),
                        genre: book.genre.clone(),
                        publication_year: book.publication_year,
                        price_buy_cents: 5000,
                        price_rent_cents: 900,
                    },
                    total_copies: 4,
                    available_copies: 4,
                },
            )
            .await
            .unwrap();

        let items = db.orders().get_items(bill.order_id).await.unwrap();
        assert_eq!(items[0].price_cents, book.price_buy_cents);
        let order = db.orders().get_by_id(bill.order_id).await.unwrap().unwrap();
        assert_eq!(order.total_price_cents, book.price_buy_cents);
    }

    #[tokio::test]
    async fn test_manager_order_views() {
        let db = test_db().await;
        let buyer = seed_customer(&db, "gina").await;
        let a = seed_book(&db, "A", 5).await;
        let b = seed_book(&db, "B", 5).await;

        let first = db
            .orders()
            .place_order(
                buyer.id,
                &[
                    OrderLine::new(a.id, AcquisitionType::Buy),
                    OrderLine::new(b.id, AcquisitionType::Rent),
                ],
            )
            .await
            .unwrap();
        let second = db
            .orders()
            .place_order(buyer.id, &[OrderLine::new(b.id, AcquisitionType::Buy)])
            .await
            .unwrap();

        let all = db.orders().list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].order.id, second.order_id);
        assert_eq!(all[0].customer_username, "gina");
        assert_eq!(all[1].items.len(), 2);
        assert_eq!(all[1].items[1].acquisition_type, AcquisitionType::Rent);

        let mine = db.orders().list_for_customer(buyer.id).await.unwrap();
        assert_eq!(mine.len(), 2);

        db.orders()
            .update_payment_status(first.order_id, PaymentStatus::Paid)
            .await
            .unwrap();
        let order = db.orders().get_by_id(first.order_id).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);

        let err = db
            .orders()
            .update_payment_status(999, PaymentStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::OrderNotFound(999))));
    }
}
