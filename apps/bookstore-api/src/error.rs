//! Error types for the HTTP layer.
//!
//! Every handler returns [`ApiResult`]. Failures leave the server as a JSON
//! body with a machine-readable code:
//!
//! ```text
//! HTTP/1.1 409 Conflict
//! {"code": "OUT_OF_STOCK", "message": "'Dune' (book 3) is out of stock"}
//! ```
//!
//! ## Status Mapping
//! ```text
//! NotFound family                  → 404 NOT_FOUND
//! OutOfStock                       → 409 OUT_OF_STOCK
//! AlreadyReturned                  → 409 ALREADY_RETURNED
//! UniqueViolation                  → 409 CONFLICT
//! Validation / malformed body      → 400 INVALID_INPUT
//! Missing or expired token         → 401 UNAUTHENTICATED
//! Wrong username or password       → 401 INVALID_CREDENTIALS
//! Customer on a manager route      → 403 FORBIDDEN
//! InventoryInvariant               → 500 INVENTORY_INVARIANT
//! Storage failures                 → 500 STORAGE_FAILURE
//! ```

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bookstore_core::{CoreError, ValidationError};
use bookstore_db::DbError;
use serde::{Deserialize, Serialize};

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Manager access required")]
    Forbidden,

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        ApiError::Db(DbError::Domain(error))
    }
}

/// Malformed or mistyped request bodies, e.g. `"type": "lease"`.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::from(CoreError::Validation(error))
    }
}

impl ApiError {
    /// HTTP status and machine code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Db(DbError::NotFound { .. }) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Db(DbError::UniqueViolation { .. }) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Db(DbError::ForeignKeyViolation { .. }) => {
                (StatusCode::BAD_REQUEST, "INVALID_REFERENCE")
            }
            ApiError::Db(DbError::Domain(core)) => match core {
                CoreError::BookNotFound(_)
                | CoreError::OrderNotFound(_)
                | CoreError::RentalNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CoreError::OutOfStock { .. } => (StatusCode::CONFLICT, "OUT_OF_STOCK"),
                CoreError::AlreadyReturned { .. } => (StatusCode::CONFLICT, "ALREADY_RETURNED"),
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                CoreError::InventoryInvariant { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INVENTORY_INVARIANT")
                }
            },
            ApiError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILURE"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            ApiError::Db(e) if e.is_storage_failure() => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Unexpected storage error"
                );
                "Internal storage error".to_string()
            }
            e if status.is_server_error() => {
                tracing::error!(error.message = %e, code, "Request failed");
                e.to_string()
            }
            e => e.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                code: code.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let out_of_stock = ApiError::from(CoreError::OutOfStock {
            book_id: 3,
            title: "Dune".to_string(),
        });
        assert_eq!(
            out_of_stock.status_and_code(),
            (StatusCode::CONFLICT, "OUT_OF_STOCK")
        );

        let returned = ApiError::from(CoreError::AlreadyReturned { rental_id: 9 });
        assert_eq!(returned.status_and_code().0, StatusCode::CONFLICT);

        let missing = ApiError::from(CoreError::RentalNotFound(9));
        assert_eq!(missing.status_and_code().0, StatusCode::NOT_FOUND);

        let invalid = ApiError::from(ValidationError::MustBePositive {
            field: "increment".to_string(),
        });
        assert_eq!(invalid.status_and_code(), (StatusCode::BAD_REQUEST, "INVALID_INPUT"));
    }

    #[test]
    fn test_db_errors_map_to_statuses() {
        let dup = ApiError::from(DbError::duplicate("username", "ann"));
        assert_eq!(dup.status_and_code(), (StatusCode::CONFLICT, "CONFLICT"));

        let missing = ApiError::from(DbError::not_found("User", 4));
        assert_eq!(missing.status_and_code().0, StatusCode::NOT_FOUND);

        let storage = ApiError::from(DbError::QueryFailed("disk I/O error".to_string()));
        assert_eq!(
            storage.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILURE")
        );
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(ApiError::Unauthenticated.status_and_code().0, StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidCredentials.status_and_code().0, StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status_and_code().0, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_storage_message_is_generic() {
        let response = ApiError::from(DbError::Internal("secret path".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
