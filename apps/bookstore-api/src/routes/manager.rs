//! Back-office routes. Every handler requires [`ManagerUser`].
//!
//! ```text
//! Orders     GET   /api/manager/orders
//!            PATCH /api/manager/orders/:id/status          {payment_status}
//! Books      GET   /api/manager/books?keyword=&genre=&year=
//!            POST  /api/manager/books                      new book, 10 copies
//!            GET   /api/manager/books/:id/details
//!            GET   /api/manager/books/:id/reviews
//!            PUT   /api/manager/books/:id                  fields + counts
//!            PATCH /api/manager/books/:id/inventory        {increment}
//! Customers  GET   /api/manager/customers?q=
//!            GET   /api/manager/customers/:id
//!            GET   /api/manager/customers/:id/orders
//!            GET   /api/manager/customers/:id/history
//!            GET   /api/manager/customers/:id/rentals
//!            POST  /api/manager/customers/:id/rentals      {book_id, due_date}
//! Rentals    PATCH /api/manager/rentals/:id/return
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, put};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use bookstore_core::validation::parse_payment_status;
use bookstore_core::{Account, Book, CoreError, InventoryRecord, Order, Rental};
use bookstore_db::{
    BookDetails, BookFilter, BookOverview, BookReview, BookUpdate, CustomerHistory, DbError,
    NewBook, OrderSummary, RentalView,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::MessageResponse;
use crate::auth::ManagerUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/manager/orders", get(list_orders))
        .route("/api/manager/orders/:order_id/status", patch(update_payment_status))
        .route("/api/manager/books", get(search_books).post(add_book))
        .route("/api/manager/books/:book_id", put(update_book))
        .route("/api/manager/books/:book_id/details", get(book_details))
        .route("/api/manager/books/:book_id/reviews", get(book_reviews))
        .route("/api/manager/books/:book_id/inventory", patch(restock))
        .route("/api/manager/customers", get(search_customers))
        .route("/api/manager/customers/:customer_id", get(get_customer))
        .route("/api/manager/customers/:customer_id/orders", get(customer_orders))
        .route("/api/manager/customers/:customer_id/history", get(customer_history))
        .route(
            "/api/manager/customers/:customer_id/rentals",
            get(customer_rentals).post(create_rental),
        )
        .route("/api/manager/rentals/:rental_id/return", patch(mark_returned))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusRequest {
    pub payment_status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookSearchQuery {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub genre: String,
    pub year: Option<i64>,
}

/// Book fields as sent by the client. Prices are in cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRequest {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i64>,
    pub price_buy_cents: i64,
    pub price_rent_cents: i64,
}

impl From<BookRequest> for NewBook {
    fn from(request: BookRequest) -> Self {
        NewBook {
            title: request.title,
            author: request.author,
            genre: request.genre.filter(|g| !g.trim().is_empty()),
            publication_year: request.publication_year,
            price_buy_cents: request.price_buy_cents,
            price_rent_cents: request.price_rent_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookUpdateRequest {
    #[serde(flatten)]
    pub book: BookRequest,
    pub total_copies: i64,
    pub available_copies: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestockRequest {
    pub increment: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerSearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualRentalRequest {
    pub book_id: i64,
    /// Calendar date, `YYYY-MM-DD`.
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalResponse {
    pub message: String,
    pub rental: Rental,
}

// =============================================================================
// Orders
// =============================================================================

async fn list_orders(
    State(state): State<AppState>,
    _manager: ManagerUser,
) -> ApiResult<Json<Vec<OrderSummary>>> {
    Ok(Json(state.db.orders().list_all().await?))
}

async fn update_payment_status(
    State(state): State<AppState>,
    ManagerUser(manager): ManagerUser,
    Path(order_id): Path<i64>,
    WithRejection(Json(request), _): WithRejection<Json<PaymentStatusRequest>, ApiError>,
) -> ApiResult<Json<MessageResponse>> {
    let status = parse_payment_status(&request.payment_status)?;
    state.db.orders().update_payment_status(order_id, status).await?;

    info!(order_id, status = status.as_str(), manager_id = manager.id(), "Payment status updated");
    Ok(Json(MessageResponse::new("Payment status updated")))
}

// =============================================================================
// Books
// =============================================================================

async fn search_books(
    State(state): State<AppState>,
    _manager: ManagerUser,
    Query(query): Query<BookSearchQuery>,
) -> ApiResult<Json<Vec<BookOverview>>> {
    let filter = BookFilter {
        keyword: query.keyword,
        genre: query.genre,
        year: query.year,
    };
    Ok(Json(state.db.books().search_overview(&filter).await?))
}

async fn add_book(
    State(state): State<AppState>,
    _manager: ManagerUser,
    WithRejection(Json(request), _): WithRejection<Json<BookRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    let book = state.db.books().insert(&NewBook::from(request)).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn book_details(
    State(state): State<AppState>,
    _manager: ManagerUser,
    Path(book_id): Path<i64>,
) -> ApiResult<Json<BookDetails>> {
    let details = state
        .db
        .books()
        .details(book_id, None)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::BookNotFound(book_id)))?;
    Ok(Json(details))
}

async fn book_reviews(
    State(state): State<AppState>,
    _manager: ManagerUser,
    Path(book_id): Path<i64>,
) -> ApiResult<Json<Vec<BookReview>>> {
    Ok(Json(state.db.reviews().list_for_book(book_id).await?))
}

async fn update_book(
    State(state): State<AppState>,
    _manager: ManagerUser,
    Path(book_id): Path<i64>,
    WithRejection(Json(request), _): WithRejection<Json<BookUpdateRequest>, ApiError>,
) -> ApiResult<Json<Book>> {
    let update = BookUpdate {
        book: NewBook::from(request.book),
        total_copies: request.total_copies,
        available_copies: request.available_copies,
    };
    Ok(Json(state.db.books().update(book_id, &update).await?))
}

async fn restock(
    State(state): State<AppState>,
    _manager: ManagerUser,
    Path(book_id): Path<i64>,
    WithRejection(Json(request), _): WithRejection<Json<RestockRequest>, ApiError>,
) -> ApiResult<Json<InventoryRecord>> {
    let record = state
        .db
        .inventory()
        .restock(book_id, request.increment)
        .await?;
    Ok(Json(record))
}

// =============================================================================
// Customers
// =============================================================================

async fn search_customers(
    State(state): State<AppState>,
    _manager: ManagerUser,
    Query(query): Query<CustomerSearchQuery>,
) -> ApiResult<Json<Vec<Account>>> {
    Ok(Json(state.db.users().search_customers(&query.q).await?))
}

async fn find_customer(state: &AppState, customer_id: i64) -> ApiResult<Account> {
    state
        .db
        .users()
        .get_customer(customer_id)
        .await?
        .ok_or_else(|| ApiError::from(DbError::not_found("Customer", customer_id)))
}

async fn get_customer(
    State(state): State<AppState>,
    _manager: ManagerUser,
    Path(customer_id): Path<i64>,
) -> ApiResult<Json<Account>> {
    Ok(Json(find_customer(&state, customer_id).await?))
}

async fn customer_orders(
    State(state): State<AppState>,
    _manager: ManagerUser,
    Path(customer_id): Path<i64>,
) -> ApiResult<Json<Vec<Order>>> {
    find_customer(&state, customer_id).await?;
    Ok(Json(state.db.orders().list_for_customer(customer_id).await?))
}

async fn customer_history(
    State(state): State<AppState>,
    _manager: ManagerUser,
    Path(customer_id): Path<i64>,
) -> ApiResult<Json<CustomerHistory>> {
    find_customer(&state, customer_id).await?;
    Ok(Json(state.db.users().history(customer_id).await?))
}

async fn customer_rentals(
    State(state): State<AppState>,
    _manager: ManagerUser,
    Path(customer_id): Path<i64>,
) -> ApiResult<Json<Vec<RentalView>>> {
    find_customer(&state, customer_id).await?;
    Ok(Json(state.db.rentals().list_for_customer(customer_id).await?))
}

async fn create_rental(
    State(state): State<AppState>,
    ManagerUser(manager): ManagerUser,
    Path(customer_id): Path<i64>,
    WithRejection(Json(request), _): WithRejection<Json<ManualRentalRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<RentalResponse>)> {
    find_customer(&state, customer_id).await?;

    let rental = state
        .db
        .rentals()
        .create_manual(customer_id, request.book_id, request.due_date)
        .await?;

    info!(rental_id = rental.id, manager_id = manager.id(), "Manual rental created");
    Ok((
        StatusCode::CREATED,
        Json(RentalResponse {
            message: "Rental created".to_string(),
            rental,
        }),
    ))
}

// =============================================================================
// Rentals
// =============================================================================

async fn mark_returned(
    State(state): State<AppState>,
    ManagerUser(manager): ManagerUser,
    Path(rental_id): Path<i64>,
) -> ApiResult<Json<RentalResponse>> {
    let rental = state.db.rentals().mark_returned(rental_id).await?;

    info!(rental_id, manager_id = manager.id(), "Rental returned via API");
    Ok(Json(RentalResponse {
        message: "Rental marked as returned".to_string(),
        rental,
    }))
}
