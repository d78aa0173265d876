use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::notice::Notice;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Listing could not be published: {0}")]
    PublishFailed(String),

    #[error("Listing could not be deleted: {0}")]
    DeleteFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let notice = match &self {
            Error::PublishFailed(_) => Some(Notice::publish_failed()),
            Error::DeleteFailed(_) => Some(Notice::delete_failed()),
            _ => None,
        };

        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Token(_) => (StatusCode::UNAUTHORIZED, "invalid_token".to_string()),
            Error::PublishFailed(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "listing_publish_failed".to_string(),
            ),
            Error::DeleteFailed(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "listing_delete_failed".to_string(),
            ),
            Error::Database(err) => {
                tracing::error!(error = ?err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = match notice {
            Some(notice) => Json(json!({ "error": error_message, "notice": notice })),
            None => Json(json!({ "error": error_message })),
        };
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}
