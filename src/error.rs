//! Service error type and its HTTP mapping.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use thiserror::Error;
use crate::domain::aggregates::OrderError;
use crate::domain::value_objects::QuantityError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Admin access required")]
    Forbidden,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Duplicate(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Order creation failed: {0}")]
    OrderCreation(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::EmptyCart | Self::InvalidInput(_) | Self::InvalidState(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Duplicate(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::OrderCreation(_) | Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            match self {
                Self::OrderCreation(_) => "Failed to create order".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(e: validator::ValidationErrors) -> Self { StoreError::InvalidInput(e.to_string()) }
}

impl From<JsonRejection> for StoreError {
    fn from(e: JsonRejection) -> Self { StoreError::InvalidInput(e.body_text()) }
}

impl From<PathRejection> for StoreError {
    fn from(e: PathRejection) -> Self { StoreError::InvalidInput(e.body_text()) }
}

impl From<QueryRejection> for StoreError {
    fn from(e: QueryRejection) -> Self { StoreError::InvalidInput(e.body_text()) }
}

impl From<QuantityError> for StoreError {
    fn from(e: QuantityError) -> Self { StoreError::InvalidInput(e.to_string()) }
}

impl From<OrderError> for StoreError {
    fn from(e: OrderError) -> Self { StoreError::InvalidState(e.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(StoreError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(StoreError::EmptyCart.status(), StatusCode::BAD_REQUEST);
        assert_eq!(StoreError::NotFound("Product".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(StoreError::Duplicate("Wishlist item".into()).status(), StatusCode::CONFLICT);
        assert_eq!(StoreError::OrderCreation(sqlx::Error::PoolClosed).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_server_errors_hide_cause() {
        let resp = StoreError::Internal("disk on fire".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
