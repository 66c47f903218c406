//! Customer-facing routes: catalog, ordering, reviews and history.
//!
//! ```text
//! GET  /api/books?q=             keyword search (title/author)
//! GET  /api/books/:id            details + the caller's own review
//! POST /api/books/:id/reviews    insert-or-replace the caller's review
//! POST /api/orders               place an order → Bill
//! GET  /api/history              purchases, rentals, reviews
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use bookstore_core::{Bill, Book, CoreError, OrderLine, Review};
use bookstore_db::{BookDetails, CustomerHistory};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthorizedUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/books", get(search_books))
        .route("/api/books/:book_id", get(book_details))
        .route("/api/books/:book_id/reviews", post(submit_review))
        .route("/api/orders", post(place_order))
        .route("/api/history", get(history))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub rating: i64,
    #[serde(default)]
    pub review_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub review: Review,
}

// =============================================================================
// Handlers
// =============================================================================

async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Book>>> {
    let books = state.db.books().search(&query.q).await?;
    Ok(Json(books))
}

async fn book_details(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Path(book_id): Path<i64>,
) -> ApiResult<Json<BookDetails>> {
    let details = state
        .db
        .books()
        .details(book_id, Some(user.id()))
        .await?
        .ok_or_else(|| ApiError::from(CoreError::BookNotFound(book_id)))?;
    Ok(Json(details))
}

async fn submit_review(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Path(book_id): Path<i64>,
    WithRejection(Json(request), _): WithRejection<Json<ReviewRequest>, ApiError>,
) -> ApiResult<Json<ReviewResponse>> {
    let review = state
        .db
        .reviews()
        .submit(
            user.id(),
            book_id,
            request.rating,
            request.review_text.as_deref(),
        )
        .await?;

    Ok(Json(ReviewResponse {
        success: true,
        review,
    }))
}

async fn place_order(
    State(state): State<AppState>,
    user: AuthorizedUser,
    WithRejection(Json(request), _): WithRejection<Json<PlaceOrderRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<Bill>)> {
    let bill = state.db.orders().place_order(user.id(), &request.items).await?;

    info!(
        order_id = bill.order_id,
        user_id = bill.user_id,
        total = %bill.total_price,
        "Order placed via API"
    );
    Ok((StatusCode::CREATED, Json(bill)))
}

async fn history(
    State(state): State<AppState>,
    user: AuthorizedUser,
) -> ApiResult<Json<CustomerHistory>> {
    let history = state.db.users().history(user.id()).await?;
    Ok(Json(history))
}
