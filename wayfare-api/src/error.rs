use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use wayfare_booking::{BookingError, StoreError};
use wayfare_catalog::CatalogError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Gone(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Gone(msg) => (StatusCode::GONE, msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match &err {
            BookingError::InvalidGuestCount(_) | BookingError::InvalidServiceReference(_) => {
                ApiError::BadRequest(err.to_string())
            }
            BookingError::InsufficientCapacity { .. } => ApiError::Conflict(err.to_string()),
            BookingError::NotFound(_) => ApiError::NotFound(err.to_string()),
            BookingError::BookingCancelled(_) | BookingError::InvalidState(_) => {
                ApiError::Conflict(err.to_string())
            }
            BookingError::Persistence(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::Duplicate(_)
            | StoreError::Conflict(_)
            | StoreError::InsufficientCapacity { .. } => ApiError::Conflict(err.to_string()),
            StoreError::Persistence(_) => ApiError::Internal(err.to_string()),
        }
    }
}
