//! Registration, login and logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use bookstore_core::UserRole;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::MessageResponse;
use crate::auth::AuthorizedUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
    pub token: String,
}

// =============================================================================
// Handlers
// =============================================================================

async fn register(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let account = state
        .db
        .users()
        .register(&request.username, &request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: account.id,
            username: account.username,
            email: account.email,
            role: account.role,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<Json<LoginResponse>> {
    let username = request.username.trim();
    if username.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let Some(account) = state
        .db
        .users()
        .authenticate(username, &request.password)
        .await?
    else {
        warn!(username = %username, "Login rejected");
        return Err(ApiError::InvalidCredentials);
    };

    let token = state.sessions.create(&account).await;
    info!(user_id = account.id, role = ?account.role, "User logged in");

    Ok(Json(LoginResponse {
        user_id: account.id,
        username: account.username,
        role: account.role,
        token,
    }))
}

async fn logout(
    State(state): State<AppState>,
    user: AuthorizedUser,
) -> Json<MessageResponse> {
    state.sessions.revoke(&user.token).await;
    info!(user_id = user.id(), "User logged out");
    Json(MessageResponse::new("Logged out successfully"))
}
