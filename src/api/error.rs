use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

use crate::herd::HerdError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".to_string())
    }
}

impl From<HerdError> for ApiError {
    fn from(err: HerdError) -> Self {
        match err {
            HerdError::NotFound(msg) => ApiError::NotFound(msg),
            HerdError::Validation(msg) => ApiError::Validation(msg),
            HerdError::Retrieval(e) => ApiError::Database(e),
        }
    }
}

/// Unique-constraint violations, as reported by Postgres and SQLite.
pub fn is_unique_violation(err: &DbErr) -> bool {
    let msg = err.to_string();
    msg.contains("duplicate key value violates unique constraint")
        || msg.contains("UNIQUE constraint failed")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Storage details stay in the logs.
        let message = match &self {
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                tracing::Span::current().record("error", tracing::field::display(e));
                "Failed to retrieve records".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                tracing::Span::current().record("error", msg.as_str());
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
